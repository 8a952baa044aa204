use std::collections::HashMap;

use brine_fields_schema::{is_reserved_name, PrimitiveType};

use crate::{
    error::CompileError,
    types::{FieldClause, FieldDescriptor, FieldKind},
};

/// Checks every clause in declaration order and resolves it into a
/// descriptor. The first failing clause decides the error.
///
/// Per clause: reserved name, then duplicate name, then the type/count
/// shape. A second token that is not a registry type becomes a
/// variable-length reference; whether it names an earlier field is left to
/// the engine.
pub fn verify_definition(clauses: &[FieldClause]) -> Result<Vec<FieldDescriptor>, CompileError> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut fields = Vec::with_capacity(clauses.len());

    for clause in clauses {
        // 1) Reserved names
        if is_reserved_name(&clause.name) {
            return Err(CompileError::ReservedFieldName {
                name:   clause.name.clone(),
                column: clause.column,
            });
        }

        // 2) Duplicates
        if let Some(&first_column) = seen.get(clause.name.as_str()) {
            return Err(CompileError::DuplicateFieldName {
                name: clause.name.clone(),
                column: clause.column,
                first_column,
            });
        }
        seen.insert(&clause.name, clause.column);

        // 3) Kind
        let kind = match &clause.count {
            Some(count) => {
                let count = parse_count(count).ok_or_else(|| CompileError::InvalidFieldFormat {
                    clause: clause.render(),
                    column: clause.column,
                    reason: format!("array count {:?} is not a positive integer", count),
                })?;
                let ty = PrimitiveType::from_name(&clause.second).ok_or_else(|| {
                    CompileError::UnsupportedType {
                        type_name: clause.second.clone(),
                        clause:    clause.render(),
                        column:    clause.column,
                    }
                })?;
                if ty.width().checked_mul(count).is_none() {
                    return Err(CompileError::InvalidFieldFormat {
                        clause: clause.render(),
                        column: clause.column,
                        reason: format!("array of {} {} values is too large", count, ty),
                    });
                }
                FieldKind::Array { ty, count }
            }
            None => match PrimitiveType::from_name(&clause.second) {
                Some(ty) => FieldKind::Scalar { ty },
                None => FieldKind::Variable {
                    reference: clause.second.clone(),
                },
            },
        };

        fields.push(FieldDescriptor {
            name: clause.name.clone(),
            kind,
            column: clause.column,
        });
    }

    Ok(fields)
}

fn parse_count(text: &str) -> Option<usize> {
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<usize>().ok().filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(name: &str, second: &str, count: Option<&str>, column: usize) -> FieldClause {
        FieldClause {
            name: name.to_string(),
            second: second.to_string(),
            count: count.map(str::to_string),
            column,
        }
    }

    #[test]
    fn resolves_kinds() {
        let fields = verify_definition(&[
            clause("len", "ushort", None, 1),
            clause("data", "len", None, 13),
            clause("xs", "double", Some("4"), 24),
        ])
        .unwrap();
        assert_eq!(fields[0].kind, FieldKind::Scalar { ty: PrimitiveType::UShort });
        assert_eq!(
            fields[1].kind,
            FieldKind::Variable { reference: "len".to_string() }
        );
        assert_eq!(
            fields[2].kind,
            FieldKind::Array { ty: PrimitiveType::Double, count: 4 }
        );
        assert_eq!(fields[2].column, 24);
    }

    #[test]
    fn reserved_name() {
        let err = verify_definition(&[clause("int", "int", None, 1)]).unwrap_err();
        assert_eq!(
            err,
            CompileError::ReservedFieldName { name: "int".to_string(), column: 1 }
        );
    }

    #[test]
    fn first_duplicate_is_reported() {
        let err = verify_definition(&[
            clause("a", "int", None, 1),
            clause("b", "int", None, 8),
            clause("a", "byte", None, 15),
            clause("b", "byte", None, 23),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            CompileError::DuplicateFieldName {
                name: "a".to_string(),
                column: 15,
                first_column: 1,
            }
        );
    }

    #[test]
    fn bad_counts() {
        for count in ["0", "-1", "+3", "abc", "1.5", "99999999999999999999999"] {
            let err = verify_definition(&[clause("xs", "int", Some(count), 1)]).unwrap_err();
            assert!(
                matches!(err, CompileError::InvalidFieldFormat { .. }),
                "{} gave {:?}",
                count,
                err
            );
        }
    }

    #[test]
    fn array_of_reference_is_unsupported() {
        let err = verify_definition(&[
            clause("len", "int", None, 1),
            clause("xs", "len", Some("2"), 10),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedType { column: 10, .. }));
    }

    #[test]
    fn clauses_are_checked_in_order() {
        // The bad count in the first clause wins over the later duplicate.
        let err = verify_definition(&[
            clause("a", "int", Some("0"), 1),
            clause("a", "int", None, 10),
        ])
        .unwrap_err();
        assert!(matches!(err, CompileError::InvalidFieldFormat { .. }));
    }
}
