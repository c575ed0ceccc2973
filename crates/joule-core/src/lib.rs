// SPDX-License-Identifier: Apache-2.0
//! Offline validation of captured OCPP-J frames.
//!
//! Pipeline: raw lines → [`Decoder`] (correlates frames into exchanges,
//! diverting unparsable lines) → [`Validator`] (per-message schema and
//! structural checks against a [`joule_registry::SchemaRegistry`]) →
//! [`Aggregator`] (folds both outcome kinds into an immutable [`Report`]
//! with [`Statistics`]). Everything is synchronous, single-pass batch
//! processing; only the registry is shared across runs.

mod decoder;
mod report;
mod result;
mod stats;
mod validator;

pub use decoder::{Decoder, Exchange, ParseOutcome};
pub use report::{Aggregator, Direction, Report};
pub use result::ParseResult;
pub use stats::Statistics;
pub use validator::{
    ValidateError, ValidationResult, Validator, ACTION_EMPTY, PAYLOAD_EMPTY,
    RESPONSE_TYPE_UNRESOLVED, UNIQUE_ID_EMPTY,
};
