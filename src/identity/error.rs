//! Error types for release identity validation.
//!
//! Each variant names the rejected input and the accepted values so the
//! operator can correct the invocation without consulting the help text.

use thiserror::Error;

/// Errors arising from invalid release identity components.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The platform is not one of the published release platforms.
    #[error("unsupported platform \"{value}\"; expected one of: {expected}")]
    UnsupportedPlatform {
        /// The rejected platform string.
        value: String,
        /// Comma-separated list of accepted platforms.
        expected: String,
    },

    /// The architecture is not one of the published release architectures.
    #[error("unsupported architecture \"{value}\"; expected one of: {expected}")]
    UnsupportedArchitecture {
        /// The rejected architecture string.
        value: String,
        /// Comma-separated list of accepted architectures.
        expected: String,
    },

    /// The version string is empty or whitespace.
    #[error("release version must not be empty")]
    EmptyVersion,
}

/// Result type alias using [`IdentityError`].
pub type Result<T> = std::result::Result<T, IdentityError>;
