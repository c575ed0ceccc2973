// SPDX-License-Identifier: Apache-2.0
//! CALLERROR code catalogue.

use crate::Version;
use std::fmt;

/// The fixed set of CALLERROR codes across OCPP versions.
///
/// Two codes exist in version-specific spellings: OCPP 1.6 ships with the
/// misspelled `FormationViolation` and `OccurenceConstraintViolation`;
/// OCPP 2.x uses the corrected forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Requested action is not known by the receiver.
    NotImplemented,
    /// Requested action is recognized but not supported by the receiver.
    NotSupported,
    /// An internal error occurred while processing the action.
    InternalError,
    /// A message type number was received that this endpoint does not support.
    MessageTypeNotSupported,
    /// Payload for the action is incomplete.
    ProtocolError,
    /// A security issue prevented the receiver from completing the action.
    SecurityError,
    /// Payload is syntactically correct but a field holds an invalid value.
    PropertyConstraintViolation,
    /// A field violates occurrence constraints (OCPP 2.x spelling).
    OccurrenceConstraintViolation,
    /// A field violates occurrence constraints (OCPP 1.6 typo spelling).
    OccurenceConstraintViolation,
    /// A field violates data type constraints.
    TypeConstraintViolation,
    /// Any error not covered by the other codes.
    GenericError,
    /// Payload is syntactically incorrect (OCPP 2.x spelling).
    FormatViolation,
    /// Payload is syntactically incorrect (OCPP 1.6 spelling).
    FormationViolation,
}

impl ErrorCode {
    /// Every known code, in catalogue order.
    pub const ALL: [ErrorCode; 13] = [
        ErrorCode::NotImplemented,
        ErrorCode::NotSupported,
        ErrorCode::InternalError,
        ErrorCode::MessageTypeNotSupported,
        ErrorCode::ProtocolError,
        ErrorCode::SecurityError,
        ErrorCode::PropertyConstraintViolation,
        ErrorCode::OccurrenceConstraintViolation,
        ErrorCode::OccurenceConstraintViolation,
        ErrorCode::TypeConstraintViolation,
        ErrorCode::GenericError,
        ErrorCode::FormatViolation,
        ErrorCode::FormationViolation,
    ];

    /// The wire spelling of this code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::NotImplemented => "NotImplemented",
            ErrorCode::NotSupported => "NotSupported",
            ErrorCode::InternalError => "InternalError",
            ErrorCode::MessageTypeNotSupported => "MessageTypeNotSupported",
            ErrorCode::ProtocolError => "ProtocolError",
            ErrorCode::SecurityError => "SecurityError",
            ErrorCode::PropertyConstraintViolation => "PropertyConstraintViolation",
            ErrorCode::OccurrenceConstraintViolation => "OccurrenceConstraintViolation",
            ErrorCode::OccurenceConstraintViolation => "OccurenceConstraintViolation",
            ErrorCode::TypeConstraintViolation => "TypeConstraintViolation",
            ErrorCode::GenericError => "GenericError",
            ErrorCode::FormatViolation => "FormatViolation",
            ErrorCode::FormationViolation => "FormationViolation",
        }
    }

    /// The format-violation code in the spelling `version` uses.
    pub fn format_violation(version: Version) -> ErrorCode {
        match version {
            Version::V15 | Version::V16 => ErrorCode::FormationViolation,
            Version::V20 | Version::V21 => ErrorCode::FormatViolation,
        }
    }

    /// The occurrence-constraint code in the spelling `version` uses.
    pub fn occurrence_constraint_violation(version: Version) -> ErrorCode {
        match version {
            Version::V15 | Version::V16 => ErrorCode::OccurenceConstraintViolation,
            Version::V20 | Version::V21 => ErrorCode::OccurrenceConstraintViolation,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `code` is a known CALLERROR code in any supported version.
pub fn is_known_error_code(code: &str) -> bool {
    ErrorCode::ALL.iter().any(|c| c.as_str() == code)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn recognises_catalogue_codes() {
        assert!(is_known_error_code("NotImplemented"));
        assert!(is_known_error_code("GenericError"));
        // Both spellings of the 1.6 typo'd codes are accepted.
        assert!(is_known_error_code("FormationViolation"));
        assert!(is_known_error_code("FormatViolation"));
        assert!(is_known_error_code("OccurenceConstraintViolation"));
        assert!(is_known_error_code("OccurrenceConstraintViolation"));
    }

    #[test]
    fn rejects_unknown_codes() {
        assert!(!is_known_error_code("SomethingElse"));
        assert!(!is_known_error_code(""));
    }

    #[test]
    fn version_directed_spellings() {
        assert_eq!(
            ErrorCode::format_violation(Version::V16),
            ErrorCode::FormationViolation
        );
        assert_eq!(
            ErrorCode::format_violation(Version::V21),
            ErrorCode::FormatViolation
        );
        assert_eq!(
            ErrorCode::occurrence_constraint_violation(Version::V16),
            ErrorCode::OccurenceConstraintViolation
        );
        assert_eq!(
            ErrorCode::occurrence_constraint_violation(Version::V20),
            ErrorCode::OccurrenceConstraintViolation
        );
    }
}
