// SPDX-License-Identifier: Apache-2.0
//! Per-message schema and structural validation.

use joule_ocpp::{is_known_error_code, Message, Version};
use joule_registry::SchemaRegistry;
use serde_json::Value;
use tracing::debug;

/// Diagnostic for a missing payload.
pub const PAYLOAD_EMPTY: &str = "payload is empty";
/// Diagnostic for a missing action name.
pub const ACTION_EMPTY: &str = "action is empty";
/// Diagnostic for a missing correlation id.
pub const UNIQUE_ID_EMPTY: &str = "unique id is empty";
/// Diagnostic for a CALLRESULT whose action could not be resolved from a
/// matched request or an explicit default.
pub const RESPONSE_TYPE_UNRESOLVED: &str = "unable to determine response type for message";

/// The outcome of validating one message.
///
/// Shares the monotonic `add_error` contract of
/// [`crate::ParseResult`] but is produced by the validator, independent of
/// decode results; an exchange's final validity is the AND of both.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    /// A valid, empty result.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Record a violation and mark the result invalid.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(error.into());
    }

    /// Whether no violations have been recorded.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Recorded violations, in call order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Hard validation failures, distinct from accumulated schema violations.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    /// No schema is registered for the resolved action key.
    #[error("no schema found for action {action} in OCPP version {version}")]
    SchemaNotFound {
        /// The registry lookup key (action + suffix).
        action: String,
        /// The version bucket that was searched.
        version: Version,
    },
}

/// Validates decoded messages against a schema registry.
pub struct Validator<R> {
    registry: R,
}

impl<R: SchemaRegistry> Validator<R> {
    /// A validator looking schemas up in `registry`.
    pub fn new(registry: R) -> Self {
        Self { registry }
    }

    /// Validate one message under `version`.
    ///
    /// Schema violations accumulate in the returned result; only an
    /// unresolvable schema is a hard error.
    pub fn validate_message(
        &self,
        version: Version,
        message: &Message,
    ) -> Result<ValidationResult, ValidateError> {
        debug!(action = message.action(), %version, "validating message");
        let mut result = ValidationResult::new();

        if message.unique_id().is_empty() {
            result.add_error(UNIQUE_ID_EMPTY);
        }

        match message {
            Message::Call {
                action, payload, ..
            } => {
                self.validate_request(version, action, payload, &mut result)?;
            }
            Message::Send {
                action, payload, ..
            } => {
                if !version.is_newest() {
                    result.add_error("SEND messages are only supported in OCPP 2.1");
                    return Ok(result);
                }
                self.validate_request(version, action, payload, &mut result)?;
            }
            Message::CallResult {
                action, payload, ..
            } => {
                if action.is_empty() {
                    result.add_error(RESPONSE_TYPE_UNRESOLVED);
                } else {
                    let key = format!("{action}{}", joule_registry::RESPONSE_SUFFIX);
                    self.validate_payload(version, &key, payload, &mut result)?;
                }
            }
            // Error frames are not schema-bound; only the declared code is
            // checked against the catalogue.
            Message::CallError { error_code, .. } => {
                check_error_code(error_code, &mut result);
            }
            Message::CallResultError { error_code, .. } => {
                if !version.is_newest() {
                    result.add_error("CALLRESULTERROR messages are only supported in OCPP 2.1");
                    return Ok(result);
                }
                check_error_code(error_code, &mut result);
            }
        }

        Ok(result)
    }

    fn validate_request(
        &self,
        version: Version,
        action: &str,
        payload: &Value,
        result: &mut ValidationResult,
    ) -> Result<(), ValidateError> {
        if action.is_empty() {
            result.add_error(ACTION_EMPTY);
            return Ok(());
        }
        let key = format!("{action}{}", joule_registry::REQUEST_SUFFIX);
        self.validate_payload(version, &key, payload, result)
    }

    fn validate_payload(
        &self,
        version: Version,
        action_key: &str,
        payload: &Value,
        result: &mut ValidationResult,
    ) -> Result<(), ValidateError> {
        if payload.is_null() {
            result.add_error(PAYLOAD_EMPTY);
            return Ok(());
        }

        let schema = self.registry.get_schema(version, action_key).ok_or_else(|| {
            ValidateError::SchemaNotFound {
                action: action_key.to_string(),
                version,
            }
        })?;

        for violation in schema.iter_errors(payload) {
            result.add_error(violation.to_string());
        }
        Ok(())
    }
}

fn check_error_code(error_code: &str, result: &mut ValidationResult) {
    if !is_known_error_code(error_code) {
        result.add_error(format!("invalid error code: {error_code}"));
    }
}
