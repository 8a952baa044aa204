use std::collections::HashMap;

use brine_fields_schema::Value;

/// Values decoded so far in one pass, in field order. Only ever appended to;
/// later variable-length fields look their length up here by name.
#[derive(Debug, Default)]
pub(crate) struct ParsedValues {
    index:  HashMap<String, usize>,
    values: Vec<Value>,
}

impl ParsedValues {
    pub fn with_capacity(capacity: usize) -> ParsedValues {
        ParsedValues {
            index:  HashMap::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Appends `value` under `name`. Field names are unique per definition,
    /// so a name is never inserted twice.
    pub fn push(&mut self, name: &str, value: Value) {
        debug_assert!(!self.index.contains_key(name), "{} decoded twice", name);
        self.index.insert(name.to_string(), self.values.len());
        self.values.push(value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&i| &self.values[i])
    }

    pub fn into_parts(self) -> (Vec<Value>, HashMap<String, usize>) {
        (self.values, self.index)
    }
}
