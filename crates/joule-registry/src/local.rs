// SPDX-License-Identifier: Apache-2.0
//! In-process schema registry.

use crate::{compile_schema, has_valid_suffix, RegisterOptions, RegistryError, SchemaRegistry};
use joule_ocpp::Version;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Map-backed schema registry.
///
/// Schemas are compiled eagerly at registration and shared via `Arc`, so
/// lookups are lock-for-clone only. The compiler is owned per instance;
/// there is no process-global compiler state.
#[derive(Default)]
pub struct LocalSchemaRegistry {
    schemas: RwLock<HashMap<Version, HashMap<String, Arc<jsonschema::Validator>>>>,
}

impl LocalSchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaRegistry for LocalSchemaRegistry {
    fn register_schema(
        &self,
        version: Version,
        action: &str,
        raw_schema: &[u8],
        opts: RegisterOptions,
    ) -> Result<(), RegistryError> {
        debug!(%version, action, overwrite = opts.overwrite, "registering schema");

        if !has_valid_suffix(action) {
            return Err(RegistryError::InvalidActionSuffix(action.to_string()));
        }

        // Compile outside the write lock; only the insert is serialized.
        let compiled = Arc::new(compile_schema(raw_schema)?);

        let mut schemas = self.schemas.write().unwrap_or_else(|e| e.into_inner());
        let bucket = schemas.entry(version).or_default();

        if !opts.overwrite && bucket.contains_key(action) {
            return Err(RegistryError::AlreadyRegistered {
                action: action.to_string(),
                version,
            });
        }

        bucket.insert(action.to_string(), compiled);
        Ok(())
    }

    fn get_schema(&self, version: Version, action: &str) -> Option<Arc<jsonschema::Validator>> {
        let schemas = self.schemas.read().unwrap_or_else(|e| e.into_inner());
        schemas.get(&version)?.get(action).cloned()
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use serde_json::json;

    const VENDOR_SCHEMA: &str = r#"{
        "type": "object",
        "properties": { "vendor": { "type": "string" } },
        "required": ["vendor"],
        "additionalProperties": false
    }"#;

    #[test]
    fn register_then_get() {
        let registry = LocalSchemaRegistry::new();
        registry
            .register_schema(
                Version::V16,
                "BootNotificationRequest",
                VENDOR_SCHEMA.as_bytes(),
                RegisterOptions::default(),
            )
            .unwrap();

        let schema = registry
            .get_schema(Version::V16, "BootNotificationRequest")
            .expect("schema should be registered");
        assert!(schema.is_valid(&json!({"vendor": "v"})));
        assert!(!schema.is_valid(&json!({"vendor": 3})));
    }

    #[test]
    fn absent_version_and_absent_action_both_miss() {
        let registry = LocalSchemaRegistry::new();
        registry
            .register_schema(
                Version::V16,
                "HeartbeatRequest",
                b"{}",
                RegisterOptions::default(),
            )
            .unwrap();

        assert!(registry.get_schema(Version::V20, "HeartbeatRequest").is_none());
        assert!(registry.get_schema(Version::V16, "ResetRequest").is_none());
    }

    #[test]
    fn rejects_missing_suffix() {
        let registry = LocalSchemaRegistry::new();
        let err = registry
            .register_schema(
                Version::V16,
                "BootNotification",
                b"{}",
                RegisterOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidActionSuffix(_)));
    }

    #[test]
    fn rejects_invalid_schema_document() {
        let registry = LocalSchemaRegistry::new();
        let err = registry
            .register_schema(
                Version::V16,
                "HeartbeatRequest",
                b"not json",
                RegisterOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::SchemaCompile(_)));
    }

    #[test]
    fn duplicate_registration_requires_overwrite() {
        let registry = LocalSchemaRegistry::new();
        let first = r#"{ "type": "object" }"#;
        let second = r#"{ "type": "array" }"#;

        registry
            .register_schema(
                Version::V16,
                "HeartbeatRequest",
                first.as_bytes(),
                RegisterOptions::default(),
            )
            .unwrap();

        let err = registry
            .register_schema(
                Version::V16,
                "HeartbeatRequest",
                second.as_bytes(),
                RegisterOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered { .. }));

        registry
            .register_schema(
                Version::V16,
                "HeartbeatRequest",
                second.as_bytes(),
                RegisterOptions::overwrite(),
            )
            .unwrap();

        // Subsequent lookups see the newer compiled schema.
        let schema = registry
            .get_schema(Version::V16, "HeartbeatRequest")
            .unwrap();
        assert!(schema.is_valid(&json!([])));
        assert!(!schema.is_valid(&json!({})));
    }

    #[test]
    fn concurrent_reads_and_writes() {
        let registry = LocalSchemaRegistry::new();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let registry = &registry;
                scope.spawn(move || {
                    let action = format!("Action{i}Request");
                    registry
                        .register_schema(
                            Version::V20,
                            &action,
                            b"{}",
                            RegisterOptions::default(),
                        )
                        .unwrap();
                    for j in 0..8 {
                        let _ = registry.get_schema(Version::V20, &format!("Action{j}Request"));
                    }
                });
            }
        });

        for i in 0..8 {
            assert!(registry
                .get_schema(Version::V20, &format!("Action{i}Request"))
                .is_some());
        }
    }
}
