//! Assigning service-template outputs (`properties.tosca.outputs`).

use serde_json::{Number, Value};

use crate::{Graph, Payload};

/// Primitive output types that get coerced from text on assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Boolean,
    Integer,
    Float,
}

impl OutputType {
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(OutputType::Boolean),
            "integer" => Some(OutputType::Integer),
            "float" => Some(OutputType::Float),
            _ => None,
        }
    }

    /// Coerce output text into this type.
    ///
    /// Booleans are `true` only for the exact text `"true"`. Numbers accept
    /// the longest numeric prefix (`"3 replicas"` is `3`); text without one
    /// yields `None`. Integer prefixes beyond `i64`/`u64` become the nearest
    /// float, and only prefixes too long for a finite float are rejected.
    pub fn coerce(self, text: &str) -> Option<Value> {
        match self {
            OutputType::Boolean => Some(Value::Bool(text == "true")),
            OutputType::Integer => parse_int_prefix(text).map(Value::Number),
            OutputType::Float => parse_float_prefix(text)
                .and_then(Number::from_f64)
                .map(Value::Number),
        }
    }
}

/// The declared type name of an output (`$type.type.name`).
fn declared_type_name(output: &Payload) -> Option<&str> {
    output
        .get("$type")?
        .get("type")?
        .get("name")?
        .as_str()
}

impl Graph {
    /// The output named `name`, if the graph has a TOSCA output namespace.
    pub fn output(&self, name: &str) -> Option<&Payload> {
        self.properties
            .get("tosca")?
            .get("outputs")?
            .get(name)?
            .as_object()
    }

    /// Set `$value` of an output from text.
    ///
    /// Returns `false` when the graph has no TOSCA outputs, the output does not
    /// exist, or the text cannot be coerced into the declared primitive type.
    pub fn set_output_value(&mut self, name: &str, value: &str) -> bool {
        let Some(output) = self
            .properties
            .get_mut("tosca")
            .and_then(Value::as_object_mut)
            .and_then(|tosca| tosca.get_mut("outputs"))
            .and_then(Value::as_object_mut)
            .and_then(|outputs| outputs.get_mut(name))
            .and_then(Value::as_object_mut)
        else {
            return false;
        };

        let coerced = match declared_type_name(output).and_then(OutputType::from_type_name) {
            Some(output_type) => match output_type.coerce(value) {
                Some(coerced) => coerced,
                None => {
                    tracing::warn!(
                        output = name,
                        value,
                        ?output_type,
                        "output value cannot be coerced to its declared type"
                    );
                    return false;
                }
            },
            None => Value::String(value.to_string()),
        };

        output.insert("$value".to_string(), coerced);
        true
    }
}

fn parse_int_prefix(text: &str) -> Option<Number> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    let digits = &text[..end];
    if let Ok(n) = digits.parse::<i64>() {
        return Some(n.into());
    }
    if let Ok(n) = digits.parse::<u64>() {
        return Some(n.into());
    }
    digits.parse::<f64>().ok().and_then(Number::from_f64)
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim();
    // Shrink from the right until a prefix parses; numeric prefixes are short.
    let mut end = text
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    while end > 0 {
        if let Ok(value) = text[..end].parse::<f64>() {
            return value.is_finite().then_some(value);
        }
        end -= 1;
    }
    None
}
