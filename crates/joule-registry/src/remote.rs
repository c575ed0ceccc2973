// SPDX-License-Identifier: Apache-2.0
//! HTTP-backed schema registry client.
//!
//! Speaks the Confluent-style subject API: one subject per
//! `(version, action)` pair, named `ocpp-{version}-{action}` with dots
//! replaced by dashes. Compiled schemas are cached with a refresh TTL so
//! repeated validation runs do not re-fetch.

use crate::{compile_schema, has_valid_suffix, RegisterOptions, RegistryError, SchemaRegistry};
use base64::prelude::*;
use joule_ocpp::Version;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Authentication applied to every outbound registry request.
#[derive(Debug, Clone, Default)]
pub enum RemoteAuth {
    /// No authentication headers.
    #[default]
    None,
    /// HTTP basic auth.
    Basic {
        /// Account name.
        username: String,
        /// Account password.
        password: String,
    },
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// API key in a configurable header (defaults to `X-API-Key`).
    ApiKey {
        /// The key value.
        key: String,
        /// The header name carrying the key.
        header: String,
    },
    /// An arbitrary fixed header.
    Custom {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
}

impl RemoteAuth {
    /// API key auth with the default `X-API-Key` header.
    pub fn api_key(key: impl Into<String>) -> Self {
        RemoteAuth::ApiKey {
            key: key.into(),
            header: "X-API-Key".to_string(),
        }
    }

    /// The header this auth mode contributes, if any.
    fn header(&self) -> Option<(String, String)> {
        match self {
            RemoteAuth::None => None,
            RemoteAuth::Basic { username, password } => {
                let credentials = BASE64_STANDARD.encode(format!("{username}:{password}"));
                Some(("Authorization".to_string(), format!("Basic {credentials}")))
            }
            RemoteAuth::Bearer(token) => {
                Some(("Authorization".to_string(), format!("Bearer {token}")))
            }
            RemoteAuth::ApiKey { key, header } => Some((header.clone(), key.clone())),
            RemoteAuth::Custom { name, value } => Some((name.clone(), value.clone())),
        }
    }
}

/// Tunables for [`RemoteSchemaRegistry`].
#[derive(Debug, Clone)]
pub struct RemoteRegistryConfig {
    /// How long a fetched schema stays fresh in the cache.
    pub cache_refresh: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Outbound authentication.
    pub auth: RemoteAuth,
}

impl Default for RemoteRegistryConfig {
    fn default() -> Self {
        Self {
            cache_refresh: Duration::from_secs(10 * 60),
            timeout: Duration::from_secs(5),
            auth: RemoteAuth::None,
        }
    }
}

struct CachedSchema {
    schema: Arc<jsonschema::Validator>,
    cached_at: Instant,
}

/// Schema registry backed by a remote HTTP service.
///
/// `get_schema` never errors: any transport, status, or compile failure
/// is logged and reported as a miss, matching the trait contract.
pub struct RemoteSchemaRegistry {
    agent: ureq::Agent,
    base_url: String,
    config: RemoteRegistryConfig,
    cache: RwLock<HashMap<Version, HashMap<String, CachedSchema>>>,
}

impl RemoteSchemaRegistry {
    /// Create a client for the registry at `base_url`.
    pub fn new(base_url: impl Into<String>, config: RemoteRegistryConfig) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self {
            agent,
            base_url,
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = format!("{}{path}", self.base_url);
        let mut req = self.agent.request(method, &url).set(
            "Accept",
            "application/vnd.schemaregistry.v1+json, application/json",
        );
        if let Some((name, value)) = self.config.auth.header() {
            req = req.set(&name, &value);
        }
        req
    }

    /// Highest registered version number for `subject`.
    fn latest_version(&self, subject: &str) -> Result<u64, RegistryError> {
        let path = format!("subjects/{subject}/versions");
        let response = self.request("GET", &path).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => RegistryError::UnexpectedStatus {
                status,
                subject: subject.to_string(),
            },
            ureq::Error::Transport(t) => RegistryError::Transport(t.to_string()),
        })?;
        let versions: Vec<u64> = response
            .into_json()
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        versions
            .into_iter()
            .max()
            .ok_or_else(|| RegistryError::Transport(format!("no versions found for subject {subject}")))
    }

    /// Fetch the raw schema text for `subject` at `version`.
    ///
    /// The endpoint may answer with `{"schema": "..."}`, a bare JSON
    /// string, or the schema document itself; all three are accepted.
    fn fetch_schema(&self, subject: &str, version: u64) -> Result<String, RegistryError> {
        let path = format!("subjects/{subject}/versions/{version}/schema");
        let response = self.request("GET", &path).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => RegistryError::UnexpectedStatus {
                status,
                subject: subject.to_string(),
            },
            ureq::Error::Transport(t) => RegistryError::Transport(t.to_string()),
        })?;
        let body = response
            .into_string()
            .map_err(|e| RegistryError::Transport(e.to_string()))?;

        #[derive(serde::Deserialize)]
        struct SchemaResponse {
            schema: String,
        }
        if let Ok(structured) = serde_json::from_str::<SchemaResponse>(&body) {
            return Ok(structured.schema);
        }
        if let Ok(bare) = serde_json::from_str::<String>(&body) {
            return Ok(bare);
        }
        Ok(body)
    }

    fn cached(&self, version: Version, action: &str) -> Option<Arc<jsonschema::Validator>> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        let entry = cache.get(&version)?.get(action)?;
        if entry.cached_at.elapsed() < self.config.cache_refresh {
            Some(Arc::clone(&entry.schema))
        } else {
            None
        }
    }

    fn store(&self, version: Version, action: &str, schema: Arc<jsonschema::Validator>) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.entry(version).or_default().insert(
            action.to_string(),
            CachedSchema {
                schema,
                cached_at: Instant::now(),
            },
        );
    }

    fn invalidate(&self, version: Version, action: &str) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        if let Some(bucket) = cache.get_mut(&version) {
            bucket.remove(action);
        }
    }
}

/// Registry subject for a `(version, action)` pair: `ocpp-1-6-BootNotificationRequest`.
fn subject_name(version: Version, action: &str) -> String {
    format!("ocpp-{}-{action}", version.as_str().replace('.', "-"))
}

impl SchemaRegistry for RemoteSchemaRegistry {
    /// `opts` is ignored here: the subject API always appends a new
    /// subject version, so overwrite is the server's default behavior.
    /// A 409 from the server maps to `AlreadyRegistered` regardless.
    fn register_schema(
        &self,
        version: Version,
        action: &str,
        raw_schema: &[u8],
        _opts: RegisterOptions,
    ) -> Result<(), RegistryError> {
        if !has_valid_suffix(action) {
            return Err(RegistryError::InvalidActionSuffix(action.to_string()));
        }

        // Compile locally first so a broken schema never reaches the wire.
        compile_schema(raw_schema)?;

        // Re-serialize compactly: strips formatting and escaping noise the
        // registry would otherwise store verbatim.
        let value: serde_json::Value = serde_json::from_slice(raw_schema)
            .map_err(|e| RegistryError::SchemaCompile(e.to_string()))?;
        let normalized =
            serde_json::to_string(&value).map_err(|e| RegistryError::SchemaCompile(e.to_string()))?;

        let subject = subject_name(version, action);
        debug!(subject, "registering schema with remote registry");

        let path = format!("subjects/{subject}/versions");
        let body = json!({ "schema": normalized, "schemaType": "JSONSCHEMA" });
        let result = self
            .request("POST", &path)
            .set("Content-Type", "application/json")
            .send_json(body);

        match result {
            Ok(_) => {
                // The remote now holds a newer version than our cache.
                self.invalidate(version, action);
                Ok(())
            }
            Err(ureq::Error::Status(409, _)) => Err(RegistryError::AlreadyRegistered {
                action: action.to_string(),
                version,
            }),
            Err(ureq::Error::Status(status, _)) => {
                Err(RegistryError::UnexpectedStatus { status, subject })
            }
            Err(ureq::Error::Transport(t)) => Err(RegistryError::Transport(t.to_string())),
        }
    }

    fn get_schema(&self, version: Version, action: &str) -> Option<Arc<jsonschema::Validator>> {
        if !has_valid_suffix(action) {
            return None;
        }

        if let Some(schema) = self.cached(version, action) {
            return Some(schema);
        }

        let subject = subject_name(version, action);
        let fetched = self
            .latest_version(&subject)
            .and_then(|latest| self.fetch_schema(&subject, latest))
            .and_then(|raw| compile_schema(raw.as_bytes()));

        match fetched {
            Ok(schema) => {
                let schema = Arc::new(schema);
                self.store(version, action, Arc::clone(&schema));
                Some(schema)
            }
            Err(err) => {
                warn!(subject, %err, "remote schema lookup failed");
                None
            }
        }
    }

    fn kind(&self) -> &'static str {
        "remote"
    }
}
