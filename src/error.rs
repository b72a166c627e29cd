use thiserror::Error;

use crate::parse::ParseError;
use crate::CompileError;

/// Unified error type covering parsing, compilation, and I/O.
///
/// Returned by the loaders on [`RuleSet`](crate::RuleSet), such as
/// [`from_dsl()`](crate::RuleSet::from_dsl) and
/// [`from_file()`](crate::RuleSet::from_file).
#[derive(Debug, Error)]
pub enum OfferError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("invalid rule config: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
