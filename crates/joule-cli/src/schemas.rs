// SPDX-License-Identifier: Apache-2.0
//! Built-in schema bundles and directory loading.
//!
//! The binary embeds a starter set of message schemas so `joule validate`
//! works out of the box. A `--schemas` directory layers user-provided
//! schemas on top, overriding any built-in with the same action name.

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use joule_ocpp::Version;
use joule_registry::{RegisterOptions, SchemaRegistry};

/// A schema compiled into the binary.
struct BuiltinSchema {
    action: &'static str,
    raw: &'static str,
}

macro_rules! builtin {
    ($dir:literal, $action:literal) => {
        BuiltinSchema {
            action: $action,
            raw: include_str!(concat!("../schemas/", $dir, "/", $action, ".json")),
        }
    };
}

const OCPP16: &[BuiltinSchema] = &[
    builtin!("ocpp16", "AuthorizeRequest"),
    builtin!("ocpp16", "AuthorizeResponse"),
    builtin!("ocpp16", "BootNotificationRequest"),
    builtin!("ocpp16", "BootNotificationResponse"),
    builtin!("ocpp16", "HeartbeatRequest"),
    builtin!("ocpp16", "HeartbeatResponse"),
    builtin!("ocpp16", "StatusNotificationRequest"),
    builtin!("ocpp16", "StatusNotificationResponse"),
];

const OCPP20: &[BuiltinSchema] = &[
    builtin!("ocpp20", "BootNotificationRequest"),
    builtin!("ocpp20", "BootNotificationResponse"),
    builtin!("ocpp20", "HeartbeatRequest"),
    builtin!("ocpp20", "HeartbeatResponse"),
];

fn builtin_set(version: Version) -> &'static [BuiltinSchema] {
    match version {
        Version::V16 => OCPP16,
        // The 2.0.1 schemas remain valid for 2.1 actions they cover.
        Version::V20 | Version::V21 => OCPP20,
        Version::V15 => &[],
    }
}

/// Registers the embedded schema bundle for `version` into `registry`.
pub fn register_builtins<R: SchemaRegistry>(registry: &R, version: Version) -> anyhow::Result<()> {
    for schema in builtin_set(version) {
        registry
            .register_schema(
                version,
                schema.action,
                schema.raw.as_bytes(),
                RegisterOptions::default(),
            )
            .with_context(|| format!("registering built-in schema {}", schema.action))?;
    }
    Ok(())
}

/// Registers every `*.json` file under `dir` into `registry`, using the file
/// stem as the action name. Returns the number of schemas registered.
///
/// Existing registrations are overwritten, so a user directory shadows the
/// built-in bundle.
pub fn register_schema_dir<R: SchemaRegistry>(
    registry: &R,
    version: Version,
    dir: &Path,
) -> anyhow::Result<usize> {
    let mut count = 0;
    let entries =
        fs::read_dir(dir).with_context(|| format!("reading schema directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }
        let Some(action) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let raw = fs::read(&path)
            .with_context(|| format!("reading schema file {}", path.display()))?;
        registry
            .register_schema(version, action, &raw, RegisterOptions::overwrite())
            .with_context(|| format!("registering schema {}", path.display()))?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use joule_registry::LocalSchemaRegistry;

    #[test]
    fn builtins_register_for_each_version() {
        for version in [Version::V16, Version::V20, Version::V21] {
            let registry = LocalSchemaRegistry::new();
            register_builtins(&registry, version).unwrap();
            assert!(registry.get_schema(version, "BootNotificationRequest").is_some());
            assert!(registry.get_schema(version, "HeartbeatResponse").is_some());
        }
    }

    #[test]
    fn builtin_boot_notification_accepts_minimal_payload() {
        let registry = LocalSchemaRegistry::new();
        register_builtins(&registry, Version::V16).unwrap();
        let schema = registry
            .get_schema(Version::V16, "BootNotificationRequest")
            .unwrap();
        let payload = serde_json::json!({
            "chargePointVendor": "VendorX",
            "chargePointModel": "SingleSocketCharger",
        });
        assert!(schema.is_valid(&payload));
        assert!(!schema.is_valid(&serde_json::json!({})));
    }

    #[test]
    fn directory_schemas_shadow_builtins() {
        let registry = LocalSchemaRegistry::new();
        register_builtins(&registry, Version::V16).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let replacement = r#"{"type": "object", "required": ["vendorId"]}"#;
        std::fs::write(dir.path().join("BootNotificationRequest.json"), replacement).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let count = register_schema_dir(&registry, Version::V16, dir.path()).unwrap();
        assert_eq!(count, 1);

        let schema = registry
            .get_schema(Version::V16, "BootNotificationRequest")
            .unwrap();
        assert!(schema.is_valid(&serde_json::json!({"vendorId": "x"})));
        assert!(!schema.is_valid(&serde_json::json!({
            "chargePointVendor": "VendorX",
            "chargePointModel": "SingleSocketCharger",
        })));
    }
}
