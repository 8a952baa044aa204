use crate::{
    error::CompileError,
    parser::parse_definition,
    tokenizer::tokenize_definition,
    types::FieldDescriptor,
    verifier::verify_definition,
};

/// Compile a textual field definition into its ordered descriptors.
/// Returns `Err(CompileError)` if tokenization/parsing/verification fails.
/// Never touches a stream.
pub fn compile_definition(text: &str) -> Result<Vec<FieldDescriptor>, CompileError> {
    let tokens = tokenize_definition(text)?;
    let clauses = parse_definition(text, &tokens)?;
    verify_definition(&clauses)
}

/// Renders descriptors back into canonical definition text, one clause after
/// another with no separators.
pub fn render_definition(fields: &[FieldDescriptor]) -> String {
    fields.iter().map(ToString::to_string).collect()
}

/// Sum of the fields' encoded widths, or `None` if any field is variable-length
/// or the total does not fit in a `usize`.
pub fn fixed_size(fields: &[FieldDescriptor]) -> Option<usize> {
    fields
        .iter()
        .try_fold(0usize, |total, field| total.checked_add(field.fixed_width()?))
}
