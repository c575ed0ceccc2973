// SPDX-License-Identifier: Apache-2.0
//! OCPP-J protocol model.
//!
//! The wire format is a JSON array: `[<type id>, "<unique id>", ...]`.
//! This crate defines the closed set of frame kinds ([`Message`]), the
//! supported protocol versions ([`Version`]) and the CallError code
//! catalogue ([`ErrorCode`]). It carries no decoding or validation logic;
//! that lives in `joule-core`.

mod error_code;
mod message;
mod version;

pub use error_code::{is_known_error_code, ErrorCode};
pub use message::{Message, MessageType};
pub use version::{Version, VersionParseError};
