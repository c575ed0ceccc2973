// SPDX-License-Identifier: Apache-2.0
//! Schema registries: versioned, action-keyed stores of compiled JSON schemas.
//!
//! The [`SchemaRegistry`] trait decouples payload validation from schema
//! storage. Two implementations ship here: [`LocalSchemaRegistry`], an
//! in-process map, and [`RemoteSchemaRegistry`], a Confluent-style HTTP
//! registry client with a TTL cache. The validator only ever sees
//! `(compiled schema, found)`.

mod local;
mod remote;

pub use local::LocalSchemaRegistry;
pub use remote::{RemoteAuth, RemoteRegistryConfig, RemoteSchemaRegistry};

use joule_ocpp::Version;
use std::sync::Arc;

/// Registry lookup keys must end in one of these suffixes.
pub const REQUEST_SUFFIX: &str = "Request";
/// See [`REQUEST_SUFFIX`].
pub const RESPONSE_SUFFIX: &str = "Response";

/// Errors produced by schema registration and retrieval.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The action key is missing the `Request`/`Response` suffix.
    #[error("action must end with 'Request' or 'Response': {0}")]
    InvalidActionSuffix(String),
    /// A schema is already registered for this (version, action) pair.
    #[error("schema for action {action} already exists for OCPP version {version}")]
    AlreadyRegistered {
        /// The action key that collided.
        action: String,
        /// The version bucket it collided in.
        version: Version,
    },
    /// The raw bytes did not compile as a JSON schema document.
    #[error("failed to compile schema: {0}")]
    SchemaCompile(String),
    /// A remote request failed before producing a status code.
    #[error("registry request failed: {0}")]
    Transport(String),
    /// A remote request produced an unexpected HTTP status.
    #[error("unexpected status {status} from registry for subject {subject}")]
    UnexpectedStatus {
        /// The HTTP status code received.
        status: u16,
        /// The registry subject being accessed.
        subject: String,
    },
}

/// Options for a single `register_schema` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOptions {
    /// Replace an existing (version, action) entry instead of failing with
    /// [`RegistryError::AlreadyRegistered`].
    pub overwrite: bool,
}

impl RegisterOptions {
    /// Options that silently replace an existing entry.
    pub fn overwrite() -> Self {
        Self { overwrite: true }
    }
}

/// Capability over versioned, action-keyed compiled schemas.
///
/// Implementations must tolerate concurrent calls: reads may proceed in
/// parallel, writes are serialized against reads and other writes.
pub trait SchemaRegistry: Send + Sync {
    /// Compile `raw_schema` and store it under `(version, action)`.
    ///
    /// `action` must end in `Request` or `Response`. Without
    /// `opts.overwrite`, an existing entry is an error.
    fn register_schema(
        &self,
        version: Version,
        action: &str,
        raw_schema: &[u8],
        opts: RegisterOptions,
    ) -> Result<(), RegistryError>;

    /// Look up the compiled schema for `(version, action)`.
    ///
    /// Never errors: an unknown version and an unknown action within a
    /// known version both yield `None`.
    fn get_schema(&self, version: Version, action: &str) -> Option<Arc<jsonschema::Validator>>;

    /// Capability tag ("local", "remote", ...) callers may branch on.
    fn kind(&self) -> &'static str;
}

impl<R: SchemaRegistry + ?Sized> SchemaRegistry for &R {
    fn register_schema(
        &self,
        version: Version,
        action: &str,
        raw_schema: &[u8],
        opts: RegisterOptions,
    ) -> Result<(), RegistryError> {
        (**self).register_schema(version, action, raw_schema, opts)
    }

    fn get_schema(&self, version: Version, action: &str) -> Option<Arc<jsonschema::Validator>> {
        (**self).get_schema(version, action)
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

impl<R: SchemaRegistry + ?Sized> SchemaRegistry for Box<R> {
    fn register_schema(
        &self,
        version: Version,
        action: &str,
        raw_schema: &[u8],
        opts: RegisterOptions,
    ) -> Result<(), RegistryError> {
        (**self).register_schema(version, action, raw_schema, opts)
    }

    fn get_schema(&self, version: Version, action: &str) -> Option<Arc<jsonschema::Validator>> {
        (**self).get_schema(version, action)
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

impl<R: SchemaRegistry + ?Sized> SchemaRegistry for Arc<R> {
    fn register_schema(
        &self,
        version: Version,
        action: &str,
        raw_schema: &[u8],
        opts: RegisterOptions,
    ) -> Result<(), RegistryError> {
        (**self).register_schema(version, action, raw_schema, opts)
    }

    fn get_schema(&self, version: Version, action: &str) -> Option<Arc<jsonschema::Validator>> {
        (**self).get_schema(version, action)
    }

    fn kind(&self) -> &'static str {
        (**self).kind()
    }
}

/// Whether `action` carries a valid registry suffix.
pub(crate) fn has_valid_suffix(action: &str) -> bool {
    action.ends_with(REQUEST_SUFFIX) || action.ends_with(RESPONSE_SUFFIX)
}

/// Parse and compile raw schema bytes, mapping both failure modes to
/// [`RegistryError::SchemaCompile`].
pub(crate) fn compile_schema(raw: &[u8]) -> Result<jsonschema::Validator, RegistryError> {
    let value: serde_json::Value =
        serde_json::from_slice(raw).map_err(|e| RegistryError::SchemaCompile(e.to_string()))?;
    jsonschema::Validator::new(&value).map_err(|e| RegistryError::SchemaCompile(e.to_string()))
}
