// SPDX-License-Identifier: Apache-2.0
//! `joule` — validate captured OCPP-J traffic offline, push schemas to a
//! remote registry.

mod output;
mod schemas;
mod service;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use joule_ocpp::Version;
use joule_registry::{
    LocalSchemaRegistry, RegisterOptions, RegistryError, RemoteAuth, RemoteRegistryConfig,
    RemoteSchemaRegistry, SchemaRegistry,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "joule", version, about = "Offline OCPP-J capture validator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a capture file (one OCPP-J frame per line).
    Validate(ValidateArgs),
    /// Push a directory of JSON schemas to a remote registry.
    Register(RegisterArgs),
}

#[derive(Args)]
struct ValidateArgs {
    /// Path to the capture file, or a single frame with --inline.
    input: String,

    /// OCPP version the capture speaks.
    #[arg(short, long, default_value = "1.6")]
    protocol: Version,

    /// Directory of extra schemas, shadowing the built-in bundle.
    /// File stems name the action ("BootNotificationRequest.json").
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// Write the report to this file (.json/.csv/.txt by extension)
    /// instead of logging it.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Treat INPUT as a single frame instead of a file path.
    #[arg(long)]
    inline: bool,

    /// Action assumed for responses whose request is not in the capture.
    #[arg(long)]
    response_action: Option<String>,
}

#[derive(Args)]
struct RegisterArgs {
    /// Base URL of the schema registry.
    #[arg(long)]
    url: String,

    /// OCPP version the schemas belong to.
    #[arg(short, long, default_value = "1.6")]
    protocol: Version,

    /// Directory of JSON schema files to register.
    #[arg(long)]
    schemas: PathBuf,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 5)]
    timeout: u64,

    /// Basic auth username (requires --password).
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Basic auth password.
    #[arg(long, requires = "username")]
    password: Option<String>,

    /// Bearer token for the Authorization header.
    #[arg(long, conflicts_with_all = ["username", "api_key"])]
    bearer_token: Option<String>,

    /// API key, sent in the X-API-Key header.
    #[arg(long, conflicts_with = "username")]
    api_key: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Validate(args) => validate(args),
        Command::Register(args) => register(args),
    }
}

fn validate(args: ValidateArgs) -> anyhow::Result<()> {
    let registry = LocalSchemaRegistry::new();
    schemas::register_builtins(&registry, args.protocol)?;
    if let Some(dir) = &args.schemas {
        let count = schemas::register_schema_dir(&registry, args.protocol, dir)?;
        info!(count, dir = %dir.display(), "registered schemas from directory");
    }

    let lines = if args.inline {
        vec![args.input.clone()]
    } else {
        read_capture(&args.input)?
    };

    let service = service::Service::new(&registry);
    let report = service.validate_lines(args.protocol, &lines, args.response_action.as_deref());

    match &args.output {
        Some(path) => {
            output::write_report_file(path, &report)?;
            info!(path = %path.display(), "report written");
        }
        None => service::log_report(&report),
    }
    Ok(())
}

/// Reads a capture file, skipping blank lines.
fn read_capture(path: &str) -> anyhow::Result<Vec<String>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading capture file {path}"))?;
    Ok(contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

fn register(args: RegisterArgs) -> anyhow::Result<()> {
    let auth = if let Some(username) = args.username {
        RemoteAuth::Basic {
            username,
            password: args.password.unwrap_or_default(),
        }
    } else if let Some(token) = args.bearer_token {
        RemoteAuth::Bearer(token)
    } else if let Some(key) = args.api_key {
        RemoteAuth::api_key(key)
    } else {
        RemoteAuth::None
    };

    let config = RemoteRegistryConfig {
        timeout: Duration::from_secs(args.timeout),
        auth,
        ..RemoteRegistryConfig::default()
    };
    let registry = RemoteSchemaRegistry::new(args.url, config);

    let entries = fs::read_dir(&args.schemas)
        .with_context(|| format!("reading schema directory {}", args.schemas.display()))?;
    let mut registered = 0;
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

        match registry.register_schema(args.protocol, action, &raw, RegisterOptions::default()) {
            Ok(()) => {
                info!(action, "schema registered");
                registered += 1;
            }
            Err(RegistryError::AlreadyRegistered { action, version }) => {
                warn!(%action, %version, "schema already registered, skipping");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("registering schema {}", path.display()));
            }
        }
    }
    info!(registered, "registration complete");
    Ok(())
}
