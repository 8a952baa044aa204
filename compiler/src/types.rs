use brine_fields_schema::PrimitiveType;
use serde::Serialize;
use std::fmt;

/// A raw `[...]` clause as cut out of the definition text by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The clause body, without the enclosing brackets.
    pub text:   String,
    pub column: usize,
}

/// A clause split into its `name:second[:count]` parts by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldClause {
    pub name:   String,
    pub second: String,
    pub count:  Option<String>,
    pub column: usize,
}

impl FieldClause {
    /// Renders the clause back to `[name:second]` / `[name:second:count]`.
    pub fn render(&self) -> String {
        match &self.count {
            Some(count) => format!("[{}:{}:{}]", self.name, self.second, count),
            None => format!("[{}:{}]", self.name, self.second),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// One registry scalar.
    Scalar {
        #[serde(rename = "type")]
        ty: PrimitiveType,
    },
    /// A raw byte buffer whose length is the value of an earlier field.
    Variable { reference: String },
    /// `count` contiguous scalars of one registry type.
    Array {
        #[serde(rename = "type")]
        ty:    PrimitiveType,
        count: usize,
    },
}

/// One compiled field. Produced by [`crate::compile_definition`] and never
/// modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name:   String,
    pub kind:   FieldKind,
    pub column: usize,
}

impl FieldDescriptor {
    pub fn scalar(name: &str, ty: PrimitiveType) -> FieldDescriptor {
        FieldDescriptor {
            name:   name.to_string(),
            kind:   FieldKind::Scalar { ty },
            column: 0,
        }
    }

    pub fn variable(name: &str, reference: &str) -> FieldDescriptor {
        FieldDescriptor {
            name:   name.to_string(),
            kind:   FieldKind::Variable {
                reference: reference.to_string(),
            },
            column: 0,
        }
    }

    pub fn array(name: &str, ty: PrimitiveType, count: usize) -> FieldDescriptor {
        FieldDescriptor {
            name:   name.to_string(),
            kind:   FieldKind::Array { ty, count },
            column: 0,
        }
    }

    /// Encoded size in bytes, when it does not depend on earlier values.
    pub fn fixed_width(&self) -> Option<usize> {
        match self.kind {
            FieldKind::Scalar { ty } => Some(ty.width()),
            FieldKind::Array { ty, count } => Some(ty.width() * count),
            FieldKind::Variable { .. } => None,
        }
    }

    /// The name of the field this one takes its length from.
    pub fn reference(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Variable { reference } => Some(reference),
            _ => None,
        }
    }

    /// Human-readable type: `int`, `short[3]`, or `byte[]` for variable fields.
    pub fn type_name(&self) -> String {
        match self.kind {
            FieldKind::Scalar { ty } => ty.name().to_string(),
            FieldKind::Array { ty, count } => format!("{}[{}]", ty, count),
            FieldKind::Variable { .. } => "byte[]".to_string(),
        }
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FieldKind::Scalar { ty } => write!(f, "[{}:{}]", self.name, ty),
            FieldKind::Variable { reference } => write!(f, "[{}:{}]", self.name, reference),
            FieldKind::Array { ty, count } => write!(f, "[{}:{}:{}]", self.name, ty, count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_and_widths() {
        let id = FieldDescriptor::scalar("id", PrimitiveType::Int);
        let xs = FieldDescriptor::array("xs", PrimitiveType::Short, 3);
        let data = FieldDescriptor::variable("data", "len");

        assert_eq!(id.to_string(), "[id:int]");
        assert_eq!(xs.to_string(), "[xs:short:3]");
        assert_eq!(data.to_string(), "[data:len]");

        assert_eq!(id.fixed_width(), Some(4));
        assert_eq!(xs.fixed_width(), Some(6));
        assert_eq!(data.fixed_width(), None);

        assert_eq!(xs.type_name(), "short[3]");
        assert_eq!(data.type_name(), "byte[]");
        assert_eq!(data.reference(), Some("len"));
        assert_eq!(id.reference(), None);
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(FieldDescriptor::array("xs", PrimitiveType::Short, 3)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "xs",
                "kind": { "kind": "array", "type": "short", "count": 3 },
                "column": 0
            })
        );
    }
}
