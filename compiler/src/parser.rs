use crate::{
    error::CompileError,
    tokenizer::stray_text,
    types::{FieldClause, Token},
};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CLAUSE: Regex = Regex::new(
        r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*:\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?::\s*([^:\s]+)\s*)?$"
    )
    .unwrap();
}

/// Splits each token into a [`FieldClause`].
///
/// Fails with `NoValidFieldPatterns` when no token has the
/// `name:type[:count]` shape at all, and with `InvalidFieldFormat` for the
/// first token that does not (or for stray text outside the brackets) when
/// some do.
pub fn parse_definition(text: &str, tokens: &[Token]) -> Result<Vec<FieldClause>, CompileError> {
    let parsed: Vec<Option<FieldClause>> = tokens.iter().map(parse_clause).collect();

    if parsed.iter().all(Option::is_none) {
        return Err(CompileError::NoValidFieldPatterns);
    }

    if let Some((token, _)) = tokens.iter().zip(&parsed).find(|(_, clause)| clause.is_none()) {
        return Err(CompileError::InvalidFieldFormat {
            clause: format!("[{}]", token.text),
            column: token.column,
            reason: "expected [name:type], [name:reference] or [name:type:count]".to_string(),
        });
    }

    if let Some((stray, column)) = stray_text(text) {
        return Err(CompileError::InvalidFieldFormat {
            clause: stray,
            column,
            reason: "text outside of a bracketed clause".to_string(),
        });
    }

    Ok(parsed.into_iter().flatten().collect())
}

fn parse_clause(token: &Token) -> Option<FieldClause> {
    let caps = CLAUSE.captures(&token.text)?;
    Some(FieldClause {
        name:   caps[1].to_string(),
        second: caps[2].to_string(),
        count:  caps.get(3).map(|m| m.as_str().to_string()),
        column: token.column,
    })
}
