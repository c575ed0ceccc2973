// SPDX-License-Identifier: Apache-2.0
//! Supported OCPP protocol versions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An OCPP protocol version.
///
/// The set is closed: an unsupported version string fails to parse, so
/// downstream code never has to re-validate a `Version` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Version {
    /// OCPP 1.5.
    #[serde(rename = "1.5")]
    V15,
    /// OCPP 1.6.
    #[serde(rename = "1.6")]
    V16,
    /// OCPP 2.0 / 2.0.1.
    #[serde(rename = "2.0")]
    V20,
    /// OCPP 2.1.
    #[serde(rename = "2.1")]
    V21,
}

impl Version {
    /// Every supported version, oldest first.
    pub const ALL: [Version; 4] = [Version::V15, Version::V16, Version::V20, Version::V21];

    /// The newest supported version. SEND and CALLRESULTERROR frames are
    /// only legal under this version.
    pub const NEWEST: Version = Version::V21;

    /// The wire/CLI spelling of this version.
    pub fn as_str(self) -> &'static str {
        match self {
            Version::V15 => "1.5",
            Version::V16 => "1.6",
            Version::V20 => "2.0",
            Version::V21 => "2.1",
        }
    }

    /// Whether this is the newest supported version.
    pub fn is_newest(self) -> bool {
        self == Self::NEWEST
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a version string is not a supported OCPP version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported OCPP version: {0}")]
pub struct VersionParseError(pub String);

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.5" => Ok(Version::V15),
            "1.6" => Ok(Version::V16),
            // 2.0.1 is the errata release of 2.0; same schema set.
            "2.0" | "2.0.1" => Ok(Version::V20),
            "2.1" => Ok(Version::V21),
            other => Err(VersionParseError(other.to_string())),
        }
    }
}
