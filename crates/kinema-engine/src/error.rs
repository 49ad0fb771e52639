//! Engine-level error types.

use std::error::Error;
use std::fmt;

use kinema_core::{ConsistencyError, MotivatorType, PoolError};
use kinema_pool::ConfigError;

/// Errors from the processor registry, engine, and motivator handles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineError {
    /// No factory is registered for the type tag.
    UnknownType {
        /// The requested tag.
        type_tag: MotivatorType,
    },
    /// A factory is already registered for the type tag.
    DuplicateType {
        /// The contested tag.
        type_tag: MotivatorType,
    },
    /// The init parameters are not the type the processor expects.
    InitMismatch {
        /// The processor that rejected them.
        type_tag: MotivatorType,
    },
    /// The init parameters ask for more slots than one motivator may span.
    InitTooWide {
        /// The processor that rejected them.
        type_tag: MotivatorType,
        /// Requested slot count.
        requested: usize,
    },
    /// The processor does not expose scalar slot queries.
    NotScalar {
        /// The processor that was queried.
        type_tag: MotivatorType,
    },
    /// The motivator is not bound to any processor.
    Unbound,
    /// A pool operation failed.
    Pool {
        /// The processor whose pool failed.
        type_tag: MotivatorType,
        /// The underlying pool error.
        source: PoolError,
    },
    /// A pool failed its consistency check.
    Consistency {
        /// The processor whose pool is inconsistent.
        type_tag: MotivatorType,
        /// The violated invariant.
        source: ConsistencyError,
    },
    /// The engine configuration is invalid.
    Config(ConfigError),
}

impl EngineError {
    pub(crate) fn pool(type_tag: MotivatorType) -> impl FnOnce(PoolError) -> Self {
        move |source| Self::Pool { type_tag, source }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType { type_tag } => {
                write!(f, "no processor registered for type '{type_tag}'")
            }
            Self::DuplicateType { type_tag } => {
                write!(f, "processor type '{type_tag}' is already registered")
            }
            Self::InitMismatch { type_tag } => {
                write!(f, "init parameters do not match processor '{type_tag}'")
            }
            Self::InitTooWide {
                type_tag,
                requested,
            } => write!(
                f,
                "processor '{type_tag}': {requested} slots requested, at most {} allowed",
                u16::MAX
            ),
            Self::NotScalar { type_tag } => {
                write!(f, "processor '{type_tag}' has no scalar interface")
            }
            Self::Unbound => write!(f, "motivator is not initialized"),
            Self::Pool { type_tag, source } => {
                write!(f, "processor '{type_tag}': {source}")
            }
            Self::Consistency { type_tag, source } => {
                write!(f, "processor '{type_tag}' is inconsistent: {source}")
            }
            Self::Config(e) => write!(f, "invalid engine config: {e}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Pool { source, .. } => Some(source),
            Self::Consistency { source, .. } => Some(source),
            Self::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
