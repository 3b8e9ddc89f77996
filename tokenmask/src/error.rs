//! Error taxonomy for registration and masking calls.

use thiserror::Error;

/// Errors returned by registry and masking operations.
///
/// Soft conditions are deliberately not here: a JWT-shaped input that does
/// not split into three segments degrades to standard masking with a
/// diagnostic, and validation warnings are advisory. Masking fails closed
/// with a masked result, or with one of these errors for calls that are
/// clearly misconfigured — it never fails open by returning the secret.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaskError {
    /// A registration argument was empty or otherwise unusable.
    ///
    /// No partial registration occurs when this is returned.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A preset name was not found in the preset table.
    ///
    /// A caller asking for a named security policy that does not exist must
    /// not silently fall back to weaker masking, so this is fatal to the
    /// call and no masking is performed.
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
}
