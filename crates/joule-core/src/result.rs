// SPDX-License-Identifier: Apache-2.0
//! Per-slot decode outcome.

use joule_ocpp::Message;

/// The outcome of decoding one message slot of an exchange.
///
/// A fresh result is valid with no errors. [`ParseResult::add_error`] is
/// monotonic: once invalid, a result never reverts, and errors keep their
/// insertion order (no deduplication, no reordering).
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    message: Option<Message>,
    is_valid: bool,
    errors: Vec<String>,
}

impl Default for ParseResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseResult {
    /// A valid, empty result.
    pub fn new() -> Self {
        Self {
            message: None,
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Record a diagnostic and mark the result invalid.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(error.into());
    }

    /// Whether no errors have been recorded.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Recorded diagnostics, in call order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// The decoded message, if one was successfully built for this slot.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub(crate) fn set_message(&mut self, message: Message) {
        self.message = Some(message);
    }

    pub(crate) fn message_mut(&mut self) -> Option<&mut Message> {
        self.message.as_mut()
    }
}
