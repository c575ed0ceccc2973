// SPDX-License-Identifier: Apache-2.0
//! Frame kinds of the OCPP-J wire protocol.

use serde_json::Value;

/// Numeric message type id, the first element of every OCPP-J array frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// A request (`[2, id, action, payload]`).
    Call,
    /// A successful response (`[3, id, payload]`).
    CallResult,
    /// An error response (`[4, id, code, description, details?]`).
    CallError,
    /// An error response to a CALLRESULT (`[5, id, code, description]`, OCPP 2.1).
    CallResultError,
    /// A fire-and-forget request (`[6, id, action, payload]`, OCPP 2.1).
    Send,
}

impl MessageType {
    /// Map a wire type id to a known message type.
    pub fn from_id(id: i64) -> Option<MessageType> {
        match id {
            2 => Some(MessageType::Call),
            3 => Some(MessageType::CallResult),
            4 => Some(MessageType::CallError),
            5 => Some(MessageType::CallResultError),
            6 => Some(MessageType::Send),
            _ => None,
        }
    }

    /// The wire type id of this message type.
    pub fn id(self) -> i64 {
        match self {
            MessageType::Call => 2,
            MessageType::CallResult => 3,
            MessageType::CallError => 4,
            MessageType::CallResultError => 5,
            MessageType::Send => 6,
        }
    }
}

/// A decoded OCPP-J frame.
///
/// The union is closed and matched exhaustively; an unrecognised type id
/// never constructs a `Message` (the decoder routes it to the
/// non-parsable bucket instead).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A CALL frame: a request invoking `action`.
    Call {
        /// Correlation id pairing this request with its response.
        unique_id: String,
        /// The invoked operation name.
        action: String,
        /// The request payload.
        payload: Value,
    },
    /// A CALLRESULT frame: a successful response.
    CallResult {
        /// Correlation id of the request being answered.
        unique_id: String,
        /// Action inherited from the matched request; empty when the
        /// request was never seen and no default was supplied.
        action: String,
        /// The response payload.
        payload: Value,
    },
    /// A CALLERROR frame: an error response.
    CallError {
        /// Correlation id of the request being answered.
        unique_id: String,
        /// Declared error code (see [`crate::ErrorCode`]).
        error_code: String,
        /// Human-readable description, may be empty.
        error_description: String,
        /// Optional free-form details object.
        error_details: Option<Value>,
    },
    /// A CALLRESULTERROR frame (OCPP 2.1 only).
    CallResultError {
        /// Correlation id of the exchange.
        unique_id: String,
        /// Declared error code.
        error_code: String,
        /// Human-readable description, may be empty.
        error_description: String,
    },
    /// A SEND frame: a fire-and-forget request (OCPP 2.1 only).
    Send {
        /// Correlation id of the frame.
        unique_id: String,
        /// The invoked operation name.
        action: String,
        /// The request payload.
        payload: Value,
    },
}

impl Message {
    /// The message type of this frame.
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Call { .. } => MessageType::Call,
            Message::CallResult { .. } => MessageType::CallResult,
            Message::CallError { .. } => MessageType::CallError,
            Message::CallResultError { .. } => MessageType::CallResultError,
            Message::Send { .. } => MessageType::Send,
        }
    }

    /// The correlation id carried by this frame.
    pub fn unique_id(&self) -> &str {
        match self {
            Message::Call { unique_id, .. }
            | Message::CallResult { unique_id, .. }
            | Message::CallError { unique_id, .. }
            | Message::CallResultError { unique_id, .. }
            | Message::Send { unique_id, .. } => unique_id,
        }
    }

    /// The action name of this frame.
    ///
    /// Error frames expose their error code here for logging and
    /// classification only; the code is never used to select a schema.
    pub fn action(&self) -> &str {
        match self {
            Message::Call { action, .. }
            | Message::CallResult { action, .. }
            | Message::Send { action, .. } => action,
            Message::CallError { error_code, .. }
            | Message::CallResultError { error_code, .. } => error_code,
        }
    }

    /// The payload of this frame, if it carries one.
    ///
    /// For CALLERROR this is the optional details object; CALLRESULTERROR
    /// carries no payload.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Message::Call { payload, .. }
            | Message::CallResult { payload, .. }
            | Message::Send { payload, .. } => Some(payload),
            Message::CallError { error_details, .. } => error_details.as_ref(),
            Message::CallResultError { .. } => None,
        }
    }
}
