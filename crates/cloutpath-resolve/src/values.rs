//! Value utilities: comparable projection, length, ordering and equality over
//! the tagged values stored in the graph.
//!
//! Coerced clout values wrap scalars in objects such as
//! `{"$number": 1073741824, "$string": "1 GiB"}`, optionally naming a
//! `$comparer` scriptlet. [`TaggedValue`] is the closed view over those
//! shapes; the rest of this module works from it.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

use crate::error::{HostError, Result};
use crate::host::{ScriptHost, COMPARE_METHOD};

/// Classification of a stored value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaggedValue<'a> {
    /// Carries `$comparer`: ordering is delegated to the script host.
    Delegated { comparer: &'a str, value: &'a Value },
    /// A plain number or a `$number` wrapper.
    Number(&'a Number),
    /// A plain string or a `$string` wrapper.
    Text(&'a str),
    /// Any other object.
    Structured(&'a Map<String, Value>),
    Sequence(&'a [Value]),
    /// `null` or a boolean.
    Opaque(&'a Value),
}

/// The comparable projection of a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar<'a> {
    Boolean(bool),
    Number(&'a Number),
    Text(&'a str),
    Sequence(&'a [Value]),
    Structured(&'a Map<String, Value>),
}

impl<'a> TaggedValue<'a> {
    /// Classify `value`; `$comparer` wins over `$number`, which wins over `$string`.
    pub fn classify(value: &'a Value) -> Self {
        if let Value::Object(map) = value {
            if let Some(Value::String(comparer)) = map.get("$comparer") {
                return TaggedValue::Delegated { comparer, value };
            }
        }
        Self::classify_untagged(value)
    }

    fn classify_untagged(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(Value::Number(number)) = map.get("$number") {
                    return TaggedValue::Number(number);
                }
                if let Some(Value::String(text)) = map.get("$string") {
                    return TaggedValue::Text(text);
                }
                TaggedValue::Structured(map)
            }
            Value::Number(number) => TaggedValue::Number(number),
            Value::String(text) => TaggedValue::Text(text),
            Value::Array(items) => TaggedValue::Sequence(items),
            Value::Null | Value::Bool(_) => TaggedValue::Opaque(value),
        }
    }

    pub fn comparer(&self) -> Option<&'a str> {
        match *self {
            TaggedValue::Delegated { comparer, .. } => Some(comparer),
            _ => None,
        }
    }

    /// Project into a comparable scalar; `None` for `null`.
    pub fn project(&self) -> Option<Scalar<'a>> {
        match *self {
            TaggedValue::Delegated { value, .. } => Self::classify_untagged(value).project(),
            TaggedValue::Number(number) => Some(Scalar::Number(number)),
            TaggedValue::Text(text) => Some(Scalar::Text(text)),
            TaggedValue::Structured(map) => Some(Scalar::Structured(map)),
            TaggedValue::Sequence(items) => Some(Scalar::Sequence(items)),
            TaggedValue::Opaque(Value::Bool(flag)) => Some(Scalar::Boolean(*flag)),
            TaggedValue::Opaque(_) => None,
        }
    }
}

impl Scalar<'_> {
    fn rank(&self) -> u8 {
        match self {
            Scalar::Boolean(_) => 0,
            Scalar::Number(_) => 1,
            Scalar::Text(_) => 2,
            Scalar::Sequence(_) => 3,
            Scalar::Structured(_) => 4,
        }
    }
}

/// `$number`, else `$string`, else the value itself; `None` for `null`.
pub fn comparable(value: &Value) -> Option<Scalar<'_>> {
    TaggedValue::classify(value).project()
}

/// Length of a value: its `$string`, else the text/sequence length, else the
/// number of keys. Text length counts Unicode scalar values; other scalars
/// measure 0.
pub fn length(value: &Value) -> usize {
    match value {
        Value::Object(map) => match map.get("$string") {
            Some(Value::String(text)) => text.chars().count(),
            _ => map.len(),
        },
        Value::String(text) => text.chars().count(),
        Value::Array(items) => items.len(),
        Value::Null | Value::Bool(_) | Value::Number(_) => 0,
    }
}

/// Order two values.
///
/// If either carries `$comparer` (left first), the host's `compare` method
/// decides and the sign of its numeric result is the ordering. Otherwise the
/// comparable projections are ordered: `null` first, then booleans, numbers,
/// text, sequences and objects; values of the same kind compare naturally.
/// Sequences and objects compare structurally (elements in order, objects
/// by sorted keys), so two of them are `Equal` exactly when [`deep_equal`].
pub fn compare(host: &(impl ScriptHost + ?Sized), left: &Value, right: &Value) -> Result<Ordering> {
    let left_tag = TaggedValue::classify(left);
    let right_tag = TaggedValue::classify(right);

    if let Some(comparer) = left_tag.comparer().or_else(|| right_tag.comparer()) {
        tracing::debug!(comparer, "delegating comparison to script host");
        let returned = host.call(comparer, COMPARE_METHOD, &[left.clone(), right.clone()])?;
        return ordering_of(comparer, &returned);
    }

    Ok(compare_projections(left_tag.project(), right_tag.project()))
}

fn ordering_of(comparer: &str, returned: &Value) -> Result<Ordering> {
    let Some(sign) = returned.as_f64() else {
        return Err(HostError::NonNumericComparison {
            target: comparer.to_string(),
            returned: returned.to_string(),
        }
        .into());
    };
    Ok(sign.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
}

fn compare_projections(left: Option<Scalar<'_>>, right: Option<Scalar<'_>>) -> Ordering {
    let (left, right) = match (left, right) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(left), Some(right)) => (left, right),
    };

    match (left, right) {
        (Scalar::Boolean(a), Scalar::Boolean(b)) => a.cmp(&b),
        (Scalar::Number(a), Scalar::Number(b)) => compare_numbers(a, b),
        (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
        (Scalar::Sequence(a), Scalar::Sequence(b)) => compare_sequences(a, b),
        (Scalar::Structured(a), Scalar::Structured(b)) => compare_maps(a, b),
        (left, right) => left.rank().cmp(&right.rank()),
    }
}

/// Structural ordering of raw values, consistent with [`deep_equal`]:
/// `null < boolean < number < text < sequence < object`.
fn compare_structure(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => compare_sequences(a, b),
        (Value::Object(a), Value::Object(b)) => compare_maps(a, b),
        (a, b) => rank(a).cmp(&rank(b)),
    }
}

/// Element by element, then by length.
fn compare_sequences(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| compare_structure(x, y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Sorted `(key, value)` pairs, compared like sequences.
fn compare_maps(a: &Map<String, Value>, b: &Map<String, Value>) -> Ordering {
    fn sorted(map: &Map<String, Value>) -> Vec<(&String, &Value)> {
        let mut entries: Vec<_> = map.iter().collect();
        entries.sort_by(|x, y| x.0.cmp(y.0));
        entries
    }
    let (a, b) = (sorted(a), sorted(b));
    a.iter()
        .zip(&b)
        .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare_structure(va, vb)))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

fn as_integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

/// Exact numeric ordering, including integers beyond `f64` precision.
fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    let float = |n: &Number| n.as_f64().unwrap_or(f64::NAN);
    match (as_integer(a), as_integer(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(a), None) => compare_integer_float(a, float(b)),
        (None, Some(b)) => compare_integer_float(b, float(a)).reverse(),
        (None, None) => float(a).partial_cmp(&float(b)).unwrap_or(Ordering::Equal),
    }
}

fn compare_integer_float(integer: i128, float: f64) -> Ordering {
    match (integer as f64).partial_cmp(&float) {
        // Equal after rounding means `float` is integral and in range.
        Some(Ordering::Equal) => integer.cmp(&(float as i128)),
        Some(ordering) => ordering,
        None => Ordering::Equal,
    }
}

/// Structural equality.
///
/// Primitives compare by value (numbers numerically). Objects need the same
/// number of keys and every key of `left` present in `right` with a deeply
/// equal value. Sequences compare element-wise. An object never equals a
/// sequence or a primitive.
pub fn deep_equal(left: &Value, right: &Value) -> bool {
    if std::ptr::eq(left, right) {
        return true;
    }
    match (left, right) {
        (Value::Object(a), Value::Object(b)) => maps_equal(a, b),
        (Value::Array(a), Value::Array(b)) => sequences_equal(a, b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Ordering::Equal,
        (Value::Object(_) | Value::Array(_), _) | (_, Value::Object(_) | Value::Array(_)) => false,
        (a, b) => a == b,
    }
}

fn maps_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .all(|(key, value)| b.get(key).is_some_and(|other| deep_equal(value, other)))
}

fn sequences_equal(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| deep_equal(x, y))
}

/// `lower <= value <= upper` under [`compare`].
pub fn in_range(
    host: &(impl ScriptHost + ?Sized),
    value: &Value,
    lower: &Value,
    upper: &Value,
) -> Result<bool> {
    Ok(compare(host, value, lower)? != Ordering::Less
        && compare(host, value, upper)? != Ordering::Greater)
}
