//! The script-host seam: delegated method calls and value coercion.
//!
//! In a running deployment these are served by the evaluation runtime that
//! owns the graph. The engine only needs two entry points: `call` (used for
//! `$comparer` delegation) and `coerce` (applied once to a resolved value).

use std::cmp::Ordering;
use std::fmt;

use ahash::AHashMap;
use serde_json::Value;

use crate::error::HostError;

/// Method name used for delegated comparisons.
pub const COMPARE_METHOD: &str = "compare";

/// Name of the built-in TOSCA version comparer.
pub const VERSION_COMPARER: &str = "tosca.comparer.version";

pub trait ScriptHost {
    /// Invoke `method` on the scriptlet named `target`.
    fn call(&self, target: &str, method: &str, args: &[Value]) -> Result<Value, HostError>;

    /// Normalize a resolved value. Must not mutate the graph.
    fn coerce(&self, value: &Value) -> Result<Value, HostError> {
        Ok(value.clone())
    }
}

impl<H: ScriptHost + ?Sized> ScriptHost for &H {
    fn call(&self, target: &str, method: &str, args: &[Value]) -> Result<Value, HostError> {
        (**self).call(target, method, args)
    }

    fn coerce(&self, value: &Value) -> Result<Value, HostError> {
        (**self).coerce(value)
    }
}

/// A host with no callable methods and identity coercion.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughHost;

impl ScriptHost for PassthroughHost {
    fn call(&self, target: &str, method: &str, _args: &[Value]) -> Result<Value, HostError> {
        Err(HostError::UnknownMethod {
            target: target.to_string(),
            method: method.to_string(),
        })
    }
}

type CompareFn = dyn Fn(&Value, &Value) -> Result<Ordering, HostError> + Send + Sync;

/// A host serving `compare` from comparers registered in Rust.
#[derive(Default)]
pub struct ComparerRegistry {
    comparers: AHashMap<String, Box<CompareFn>>,
}

impl ComparerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in TOSCA version comparer.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(VERSION_COMPARER, compare_versions);
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, compare: F)
    where
        F: Fn(&Value, &Value) -> Result<Ordering, HostError> + Send + Sync + 'static,
    {
        self.comparers.insert(name.into(), Box::new(compare));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.comparers.contains_key(name)
    }
}

impl fmt::Debug for ComparerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.comparers.keys().collect();
        names.sort();
        f.debug_struct("ComparerRegistry")
            .field("comparers", &names)
            .finish()
    }
}

impl ScriptHost for ComparerRegistry {
    fn call(&self, target: &str, method: &str, args: &[Value]) -> Result<Value, HostError> {
        let unknown = || HostError::UnknownMethod {
            target: target.to_string(),
            method: method.to_string(),
        };
        if method != COMPARE_METHOD {
            return Err(unknown());
        }
        let compare = self.comparers.get(target).ok_or_else(unknown)?;
        let [left, right] = args else {
            return Err(HostError::CallFailed {
                target: target.to_string(),
                method: method.to_string(),
                message: format!("expected 2 arguments, got {}", args.len()),
            });
        };
        let ordering = compare(left, right)?;
        Ok(Value::from(ordering as i8))
    }
}

// ============================================================================
// TOSCA versions
// ============================================================================

/// `<major>.<minor>[.<fix>[.<qualifier>[-<build>]]]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToscaVersion {
    pub major: u64,
    pub minor: u64,
    pub fix: u64,
    pub qualifier: String,
    pub build: u64,
}

impl ToscaVersion {
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.splitn(4, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let fix = match parts.next() {
            Some(fix) => fix.parse().ok()?,
            None => 0,
        };
        let (qualifier, build) = match parts.next() {
            None => (String::new(), 0),
            Some(rest) => match rest.split_once('-') {
                Some((qualifier, build)) => (qualifier.to_string(), build.parse().ok()?),
                None => (rest.to_string(), 0),
            },
        };
        if !qualifier.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        Some(Self {
            major,
            minor,
            fix,
            qualifier,
            build,
        })
    }

    /// Read a version from a coerced clout value (fields or `$string`) or text.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Self::parse(text),
            Value::Object(map) => {
                if let Some(Value::String(text)) = map.get("$string") {
                    return Self::parse(text);
                }
                let field = |name: &str| map.get(name).and_then(Value::as_u64);
                Some(Self {
                    major: field("major")?,
                    minor: field("minor")?,
                    fix: field("fix").unwrap_or(0),
                    qualifier: map
                        .get("qualifier")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    build: field("build").unwrap_or(0),
                })
            }
            _ => None,
        }
    }
}

fn compare_versions(left: &Value, right: &Value) -> Result<Ordering, HostError> {
    let parse = |value: &Value| {
        ToscaVersion::from_value(value).ok_or_else(|| HostError::CallFailed {
            target: VERSION_COMPARER.to_string(),
            method: COMPARE_METHOD.to_string(),
            message: format!("not a version: {value}"),
        })
    };
    Ok(parse(left)?.cmp(&parse(right)?))
}
