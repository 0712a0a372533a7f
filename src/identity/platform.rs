//! Platform and architecture validation for published release binaries.
//!
//! Only the platforms and architectures the release pipeline publishes are
//! accepted. Anything else is rejected at construction time, before any
//! network activity takes place.

use super::error::{IdentityError, Result};
use serde::Serialize;
use std::fmt;

/// Operating system a release binary is built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux.
    #[default]
    Linux,
    /// macOS. Published under the `mac` alias.
    Darwin,
    /// Windows.
    Windows,
}

impl Platform {
    /// Every supported platform, in help-text order.
    pub const ALL: [Self; 3] = [Self::Linux, Self::Darwin, Self::Windows];

    /// Return the platform as the operator spells it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Darwin => "darwin",
            Self::Windows => "windows",
        }
    }

    /// Return the segment used for this platform inside artifact names.
    ///
    /// Darwin releases are published as `mac`; every other platform uses its
    /// own name.
    ///
    /// # Examples
    ///
    /// ```
    /// use caddy_verify::identity::Platform;
    ///
    /// assert_eq!(Platform::Darwin.artifact_segment(), "mac");
    /// assert_eq!(Platform::Linux.artifact_segment(), "linux");
    /// ```
    #[must_use]
    pub const fn artifact_segment(self) -> &'static str {
        match self {
            Self::Darwin => "mac",
            other => other.as_str(),
        }
    }

    fn expected() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl TryFrom<&str> for Platform {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|platform| platform.as_str() == value)
            .ok_or_else(|| IdentityError::UnsupportedPlatform {
                value: value.to_owned(),
                expected: Self::expected(),
            })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture a release binary is built for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// 64-bit x86.
    #[default]
    Amd64,
    /// 64-bit ARM.
    Arm64,
    /// 32-bit ARM.
    Arm,
}

impl Architecture {
    /// Every supported architecture, in help-text order.
    pub const ALL: [Self; 3] = [Self::Amd64, Self::Arm64, Self::Arm];

    /// Return the architecture as it appears in artifact names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::Arm => "arm",
        }
    }

    fn expected() -> String {
        Self::ALL.map(Self::as_str).join(", ")
    }
}

impl TryFrom<&str> for Architecture {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str() == value)
            .ok_or_else(|| IdentityError::UnsupportedArchitecture {
                value: value.to_owned(),
                expected: Self::expected(),
            })
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
