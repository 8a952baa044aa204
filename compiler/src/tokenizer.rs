use crate::{error::CompileError, types::Token};

/// Cuts the definition text into bracketed clauses.
///
/// Checks run over the whole text in this order: empty text, bracket
/// balance, empty field names, then empty types/lengths. Text between
/// clauses is left for the parser to reject (see [`stray_text`]).
pub fn tokenize_definition(text: &str) -> Result<Vec<Token>, CompileError> {
    if text.trim().is_empty() {
        return Err(CompileError::EmptyDefinition);
    }

    let opens = text.matches('[').count();
    let closes = text.matches(']').count();
    if opens != closes {
        return Err(CompileError::MismatchedBrackets {
            msg:    format!("{} opening and {} closing brackets", opens, closes),
            column: 1,
        });
    }

    let mut tokens = Vec::new();
    let mut open_at: Option<(usize, usize)> = None; // (byte offset after '[', column)

    for (column, (offset, c)) in text.char_indices().enumerate() {
        let column = column + 1;
        match c {
            '[' => {
                if let Some((_, outer)) = open_at {
                    return Err(CompileError::MismatchedBrackets {
                        msg:    format!("nested '[' inside the clause opened at column {}", outer),
                        column,
                    });
                }
                open_at = Some((offset + 1, column));
            }
            ']' => match open_at.take() {
                Some((start, open_column)) => tokens.push(Token {
                    text:   text[start..offset].to_string(),
                    column: open_column,
                }),
                None => {
                    return Err(CompileError::MismatchedBrackets {
                        msg: "']' without a matching '['".to_string(),
                        column,
                    })
                }
            },
            _ => {}
        }
    }

    // Equal counts and no early ']' means every '[' was closed.
    debug_assert!(open_at.is_none());

    for token in &tokens {
        if token.text.split(':').next().unwrap_or("").trim().is_empty() {
            return Err(CompileError::EmptyFieldName {
                clause: format!("[{}]", token.text),
                column: token.column,
            });
        }
    }

    for token in &tokens {
        if token.text.split(':').skip(1).any(|part| part.trim().is_empty()) {
            return Err(CompileError::EmptyTypeOrLength {
                clause: format!("[{}]", token.text),
                column: token.column,
            });
        }
    }

    Ok(tokens)
}

/// Returns the first run of non-whitespace text outside any clause, with its
/// 1-based column.
pub fn stray_text(text: &str) -> Option<(String, usize)> {
    let mut depth = 0usize;
    let mut stray: Option<(String, usize)> = None;
    for (column, c) in text.chars().enumerate() {
        match c {
            '[' => {
                if stray.is_some() {
                    break;
                }
                depth += 1;
            }
            ']' => depth = depth.saturating_sub(1),
            c if depth == 0 && !c.is_whitespace() => {
                stray
                    .get_or_insert_with(|| (String::new(), column + 1))
                    .0
                    .push(c);
            }
            _ if stray.is_some() => break,
            _ => {}
        }
    }
    stray
}
