//! Provides the error type that is used
//! throughout this crate.

use thiserror::Error;

/// The error type that is used
/// throughout this crate
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    // Emission errors
    #[error("JSON does not have {0}")]
    JsonFeatureUnsupported(&'static str),
    #[error("output buffer too small: {needed} bytes required")]
    EmitBufferTooSmall { needed: usize },
    // Resolution errors
    #[error("anchor does not exist: '{0}'")]
    AnchorNotFound(String),
    // Storage errors
    #[error("arena reservation exceeded: {needed} bytes requested, {available} left")]
    ArenaTooSmall { needed: usize, available: usize },
    // Path lookup errors
    #[error("invalid index in lookup path at byte {0}")]
    PathIndexInvalid(usize),
}

/// Shorthand used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, TreeError>;
