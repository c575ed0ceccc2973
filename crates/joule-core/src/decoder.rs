// SPDX-License-Identifier: Apache-2.0
//! Frame decoder and correlator.
//!
//! Turns an ordered list of raw text lines into a map of correlation id →
//! [`Exchange`], plus a separate bucket of lines that never yielded a
//! usable correlation id. A malformed line never aborts the batch.

use crate::result::ParseResult;
use crate::validator::UNIQUE_ID_EMPTY;
use joule_ocpp::{Message, MessageType};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// A correlated request/response/response-error triple sharing one
/// correlation id.
///
/// Slots are created lazily on first reference by either half of the
/// exchange and mutated in place; arrival order between the halves is
/// never assumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exchange {
    /// The CALL or SEND half.
    pub request: ParseResult,
    /// The CALLRESULT half.
    pub response: ParseResult,
    /// The CALLERROR or CALLRESULTERROR half.
    pub response_error: ParseResult,
}

impl Exchange {
    /// Whether every populated slot decoded cleanly.
    pub fn is_valid(&self) -> bool {
        self.request.is_valid() && self.response.is_valid() && self.response_error.is_valid()
    }
}

/// Everything one decode pass produced.
///
/// Every input line lands in exactly one place: an [`Exchange`] slot, or
/// `non_parsable` keyed by the synthetic `"line <n>"` key.
#[derive(Debug, Default, PartialEq)]
pub struct ParseOutcome {
    /// Correlated exchanges, keyed by correlation id.
    pub exchanges: BTreeMap<String, Exchange>,
    /// Lines with no recoverable correlation id, keyed by `"line <n>"`
    /// (or by correlation id for unknown-type frames).
    pub non_parsable: BTreeMap<String, ParseResult>,
}

/// Single-pass decoder over captured OCPP-J lines.
///
/// The decoder exclusively owns its maps during the scan; `parse`
/// consumes it and hands the finished maps to the caller read-only.
#[derive(Debug, Default)]
pub struct Decoder {
    default_response_action: Option<String>,
    exchanges: BTreeMap<String, Exchange>,
    non_parsable: BTreeMap<String, ParseResult>,
}

impl Decoder {
    /// A decoder that leaves orphaned responses unresolved.
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder that assumes `action` for any CALLRESULT whose request
    /// was never seen.
    ///
    /// Only meaningful for single-message input, or captures where every
    /// orphaned response answers the same action.
    pub fn with_default_response_action(action: impl Into<String>) -> Self {
        Self {
            default_response_action: Some(action.into()),
            ..Self::default()
        }
    }

    /// Decode `lines` into correlated exchanges and non-parsable diagnostics.
    ///
    /// Infallible by design: malformed lines are routed to the
    /// non-parsable bucket or recorded as slot-scoped errors, never
    /// propagated.
    pub fn parse<S: AsRef<str>>(mut self, lines: &[S]) -> ParseOutcome {
        if lines.is_empty() {
            debug!("no lines to decode");
            return ParseOutcome::default();
        }

        for (i, line) in lines.iter().enumerate() {
            self.decode_line(i + 1, line.as_ref());
        }

        ParseOutcome {
            exchanges: self.exchanges,
            non_parsable: self.non_parsable,
        }
    }

    fn decode_line(&mut self, ordinal: usize, raw: &str) {
        debug!(line = ordinal, "decoding frame");
        let line_key = format!("line {ordinal}");

        let Ok(elements) = serde_json::from_str::<Vec<Value>>(raw) else {
            let mut result = ParseResult::new();
            result.add_error("Message is not a valid OCPP message");
            self.non_parsable.insert(line_key, result);
            return;
        };

        self.dispatch(line_key, &elements);
    }

    /// Structural checks and type dispatch for one JSON array frame.
    fn dispatch(&mut self, line_key: String, elements: &[Value]) {
        let mut result = ParseResult::new();

        if elements.len() < 3 {
            result.add_error(format!(
                "Expected at least 3 elements in the message, got {}",
                elements.len()
            ));
            self.non_parsable.insert(line_key, result);
            return;
        }

        let Some(raw_type_id) = elements[0].as_f64() else {
            result.add_error("Expected first element to be a number (message type ID)");
            self.non_parsable.insert(line_key, result);
            return;
        };
        let type_id = raw_type_id as i64;

        let Some(unique_id) = elements[1].as_str() else {
            result.add_error("Expected second element to be a string (unique ID)");
            self.non_parsable.insert(line_key, result);
            return;
        };

        // An empty correlation id is a soft failure: substitute the line
        // key so the frame still correlates, and keep the diagnostic.
        let mut missing_id = false;
        let key = if unique_id.is_empty() {
            missing_id = true;
            line_key
        } else {
            unique_id.to_string()
        };

        match MessageType::from_id(type_id) {
            Some(MessageType::Call) => self.decode_request(key, missing_id, elements, false),
            Some(MessageType::Send) => self.decode_request(key, missing_id, elements, true),
            Some(MessageType::CallResult) => self.decode_response(key, missing_id, elements),
            Some(MessageType::CallError) => self.decode_error(key, missing_id, elements, false),
            Some(MessageType::CallResultError) => self.decode_error(key, missing_id, elements, true),
            None => {
                if missing_id {
                    result.add_error(UNIQUE_ID_EMPTY);
                }
                result.add_error(format!("Unknown message type: {type_id}"));
                self.non_parsable.insert(key, result);
            }
        }
    }

    /// CALL (`[2, id, action, payload]`) and SEND (`[6, ...]`) frames.
    fn decode_request(&mut self, key: String, missing_id: bool, elements: &[Value], send: bool) {
        let exchange = self.exchanges.entry(key.clone()).or_default();
        if missing_id {
            exchange.request.add_error(UNIQUE_ID_EMPTY);
        }

        if elements.len() != 4 {
            exchange.request.add_error(format!(
                "Expected 4 elements in the message, got {}",
                elements.len()
            ));
            return;
        }

        let Some(action) = elements[2].as_str() else {
            exchange
                .request
                .add_error("Expected third element to be a string (action)");
            return;
        };

        let message = if send {
            Message::Send {
                unique_id: key.clone(),
                action: action.to_string(),
                payload: elements[3].clone(),
            }
        } else {
            Message::Call {
                unique_id: key.clone(),
                action: action.to_string(),
                payload: elements[3].clone(),
            }
        };
        exchange.request.set_message(message);

        // A response decoded before its request was stored with an empty
        // action, or with the decoder default. The matched request is
        // authoritative either way, so arrival order cannot change the
        // final exchange.
        if let Some(Message::CallResult { action: response_action, .. }) =
            exchange.response.message_mut()
        {
            *response_action = action.to_string();
        }
    }

    /// CALLRESULT (`[3, id, payload]`) frames.
    ///
    /// No action travels on the wire: it is inherited from the matched
    /// request, then the decoder default, else left empty for the
    /// validator to flag.
    fn decode_response(&mut self, key: String, missing_id: bool, elements: &[Value]) {
        let exchange = self.exchanges.entry(key.clone()).or_default();
        if missing_id {
            exchange.response.add_error(UNIQUE_ID_EMPTY);
        }

        let action = exchange
            .request
            .message()
            .map(|request| request.action().to_string())
            .or_else(|| self.default_response_action.clone())
            .unwrap_or_default();

        exchange.response.set_message(Message::CallResult {
            unique_id: key,
            action,
            payload: elements[2].clone(),
        });
    }

    /// CALLERROR (`[4, id, code, description, details?]`) and
    /// CALLRESULTERROR (`[5, id, code, description]`) frames.
    fn decode_error(&mut self, key: String, missing_id: bool, elements: &[Value], result_error: bool) {
        let exchange = self.exchanges.entry(key.clone()).or_default();
        if missing_id {
            exchange.response_error.add_error(UNIQUE_ID_EMPTY);
        }

        if elements.len() < 4 {
            exchange.response_error.add_error(format!(
                "Invalid Call Error message. Expected array length >= 4, got {}",
                elements.len()
            ));
            return;
        }

        // A mistyped error code is diagnosed but does not abort the line.
        let error_code = match elements[2].as_str() {
            Some(code) => code.to_string(),
            None => {
                exchange.response_error.add_error(format!(
                    "Invalid element {} at 2, expected error code (string)",
                    elements[2]
                ));
                String::new()
            }
        };
        let error_description = elements[3].as_str().unwrap_or_default().to_string();

        let message = if result_error {
            Message::CallResultError {
                unique_id: key,
                error_code,
                error_description,
            }
        } else {
            Message::CallError {
                unique_id: key,
                error_code,
                error_description,
                error_details: elements.get(4).cloned(),
            }
        };
        exchange.response_error.set_message(message);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use super::*;
    use serde_json::json;

    fn parse(lines: &[&str]) -> ParseOutcome {
        Decoder::new().parse(lines)
    }

    #[test]
    fn empty_input_yields_empty_outcome() {
        let outcome = Decoder::new().parse::<&str>(&[]);
        assert!(outcome.exchanges.is_empty());
        assert!(outcome.non_parsable.is_empty());
    }

    #[test]
    fn correlates_a_request_response_pair() {
        let outcome = parse(&[
            r#"[2,"1234","BootNotification",{"chargePointVendor":"V","chargePointModel":"M"}]"#,
            r#"[3,"1234",{"status":"Accepted"}]"#,
        ]);

        assert!(outcome.non_parsable.is_empty());
        assert_eq!(outcome.exchanges.len(), 1);
        let exchange = &outcome.exchanges["1234"];
        assert!(exchange.is_valid());

        let request = exchange.request.message().unwrap();
        assert_eq!(request.action(), "BootNotification");

        // The response inherits the request's action.
        let response = exchange.response.message().unwrap();
        assert_eq!(response.action(), "BootNotification");
        assert_eq!(response.payload(), Some(&json!({"status": "Accepted"})));
    }

    #[test]
    fn arrival_order_does_not_change_the_exchange() {
        let request = r#"[2,"77","Heartbeat",{}]"#;
        let response = r#"[3,"77",{"currentTime":"2027-01-01T00:00:00Z"}]"#;

        let forward = parse(&[request, response]);
        let reversed = parse(&[response, request]);

        assert_eq!(forward.exchanges, reversed.exchanges);
        assert_eq!(
            forward.exchanges["77"].response.message().unwrap().action(),
            "Heartbeat"
        );
    }

    #[test]
    fn matched_request_overrides_the_default_response_action() {
        let request =
            r#"[2,"9","BootNotification",{"chargePointVendor":"V","chargePointModel":"M"}]"#;
        let response = r#"[3,"9",{"status":"Accepted"}]"#;

        let forward =
            Decoder::with_default_response_action("Heartbeat").parse(&[request, response]);
        let reversed =
            Decoder::with_default_response_action("Heartbeat").parse(&[response, request]);

        // The default only covers responses whose request never shows up;
        // once the request is in the capture it wins in either order.
        assert_eq!(forward.exchanges, reversed.exchanges);
        assert_eq!(
            reversed.exchanges["9"].response.message().unwrap().action(),
            "BootNotification"
        );
    }

    #[test]
    fn invalid_json_goes_to_non_parsable() {
        let outcome = parse(&[r#"{"invalid":"json"}"#]);
        assert!(outcome.exchanges.is_empty());
        assert_eq!(
            outcome.non_parsable["line 1"].errors(),
            ["Message is not a valid OCPP message"]
        );
    }

    #[test]
    fn too_few_elements_goes_to_non_parsable() {
        let outcome = parse(&[r#"[2,"1"]"#]);
        assert_eq!(
            outcome.non_parsable["line 1"].errors(),
            ["Expected at least 3 elements in the message, got 2"]
        );
    }

    #[test]
    fn non_numeric_type_id_goes_to_non_parsable() {
        let outcome = parse(&[r#"["2","1","Heartbeat",{}]"#]);
        assert_eq!(
            outcome.non_parsable["line 1"].errors(),
            ["Expected first element to be a number (message type ID)"]
        );
    }

    #[test]
    fn non_string_unique_id_goes_to_non_parsable() {
        let outcome = parse(&[r#"[2,42,"Heartbeat",{}]"#]);
        assert_eq!(
            outcome.non_parsable["line 1"].errors(),
            ["Expected second element to be a string (unique ID)"]
        );
    }

    #[test]
    fn empty_unique_id_gets_surrogate_key_and_diagnostic() {
        let outcome = parse(&[r#"[2,"","BootNotification",{"chargePointVendor":"V"}]"#]);

        assert!(outcome.non_parsable.is_empty());
        let exchange = &outcome.exchanges["line 1"];
        assert!(!exchange.request.is_valid());
        assert_eq!(exchange.request.errors(), [crate::UNIQUE_ID_EMPTY]);
        // The frame still decoded past the diagnostic.
        assert!(exchange.request.message().is_some());
    }

    #[test]
    fn call_with_wrong_arity_keeps_the_exchange() {
        let outcome = parse(&[r#"[2,"9","Heartbeat"]"#]);
        let exchange = &outcome.exchanges["9"];
        assert!(!exchange.request.is_valid());
        assert_eq!(
            exchange.request.errors(),
            ["Expected 4 elements in the message, got 3"]
        );
        assert!(exchange.request.message().is_none());
    }

    #[test]
    fn call_with_non_string_action_records_error() {
        let outcome = parse(&[r#"[2,"9",17,{}]"#]);
        assert_eq!(
            outcome.exchanges["9"].request.errors(),
            ["Expected third element to be a string (action)"]
        );
    }

    #[test]
    fn call_error_decodes_with_optional_details() {
        let outcome = parse(&[
            r#"[4,"5","NotImplemented","unknown action",{"hint":"check the action"}]"#,
        ]);
        let exchange = &outcome.exchanges["5"];
        assert!(exchange.response_error.is_valid());
        let Some(Message::CallError {
            error_code,
            error_description,
            error_details,
            ..
        }) = exchange.response_error.message()
        else {
            panic!("expected a CallError");
        };
        assert_eq!(error_code, "NotImplemented");
        assert_eq!(error_description, "unknown action");
        assert_eq!(error_details, &Some(json!({"hint": "check the action"})));
    }

    #[test]
    fn call_error_too_short_records_error() {
        let outcome = parse(&[r#"[4,"5","NotImplemented"]"#]);
        assert_eq!(
            outcome.exchanges["5"].response_error.errors(),
            ["Invalid Call Error message. Expected array length >= 4, got 3"]
        );
    }

    #[test]
    fn call_error_with_non_string_code_is_diagnosed_but_kept() {
        let outcome = parse(&[r#"[4,"5",12,"desc"]"#]);
        let slot = &outcome.exchanges["5"].response_error;
        assert_eq!(
            slot.errors(),
            ["Invalid element 12 at 2, expected error code (string)"]
        );
        assert!(slot.message().is_some());
    }

    #[test]
    fn send_and_call_result_error_fill_their_slots() {
        let outcome = parse(&[
            r#"[6,"n1","NotifyPeriodicEventStream",{"data":[]}]"#,
            r#"[5,"n2","GenericError","stream rejected"]"#,
        ]);

        let send = outcome.exchanges["n1"].request.message().unwrap();
        assert_eq!(send.message_type(), MessageType::Send);

        let rerr = outcome.exchanges["n2"].response_error.message().unwrap();
        assert_eq!(rerr.message_type(), MessageType::CallResultError);
    }

    #[test]
    fn unknown_type_id_is_diagnosed_without_an_exchange() {
        let outcome = parse(&[r#"[9,"77","Whatever",{}]"#]);
        assert!(outcome.exchanges.is_empty());
        assert_eq!(
            outcome.non_parsable["77"].errors(),
            ["Unknown message type: 9"]
        );
    }

    #[test]
    fn orphaned_response_uses_the_decoder_default_action() {
        let outcome = Decoder::with_default_response_action("Heartbeat")
            .parse(&[r#"[3,"55",{"currentTime":"2027-01-01T00:00:00Z"}]"#]);
        assert_eq!(
            outcome.exchanges["55"].response.message().unwrap().action(),
            "Heartbeat"
        );
    }

    #[test]
    fn orphaned_response_without_default_stays_unresolved() {
        let outcome = parse(&[r#"[3,"55",{"status":"Accepted"}]"#]);
        let response = outcome.exchanges["55"].response.message().unwrap();
        assert_eq!(response.action(), "");
        // Still structurally valid; the validator owns the policy here.
        assert!(outcome.exchanges["55"].response.is_valid());
    }

    #[test]
    fn every_line_lands_exactly_once() {
        let outcome = parse(&[
            r#"[2,"a","Heartbeat",{}]"#,
            "garbage",
            r#"[3,"a",{}]"#,
            r#"[1,"b","x",{}]"#,
        ]);
        assert_eq!(outcome.exchanges.len(), 1);
        assert_eq!(outcome.non_parsable.len(), 2);
        assert!(outcome.non_parsable.contains_key("line 2"));
        assert!(outcome.non_parsable.contains_key("b"));
    }
}
