/// Errors surfaced by resolution. None are retried internally.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Malformed call, e.g. a path with fewer than two segments.
    #[error("{0}")]
    Argument(String),

    /// `SELF`, `SOURCE`, `TARGET` or `HOST` used without the required context.
    #[error("{entity:?} cannot be used in this context")]
    Context { entity: String },

    /// An entity, host, selector or nested key could not be located.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Host(#[from] HostError),
}

impl ResolveError {
    pub(crate) fn context(entity: impl Into<String>) -> Self {
        ResolveError::Context {
            entity: entity.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        ResolveError::NotFound(message.into())
    }
}

/// Errors raised by the script host behind `call` and `coerce`.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("unknown method {method:?} on {target:?}")]
    UnknownMethod { target: String, method: String },

    #[error("{target:?}.{method} failed: {message}")]
    CallFailed {
        target: String,
        method: String,
        message: String,
    },

    #[error("comparer {target:?} returned {returned}, expected a number")]
    NonNumericComparison { target: String, returned: String },

    #[error("cannot coerce value: {0}")]
    Coerce(String),
}

pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
