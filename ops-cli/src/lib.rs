//! `authzctl`: operator commands against the relation tuple store
//!
//! Commands map one to one onto [`AuthorizationEngine`] operations. Output is
//! human readable by default and JSON with `--json`.
//!
//! Exit codes: `0` success, `1` error, `2` when `check` denies.
//!
//! ```bash
//! authzctl grant post p1 owner u1
//! authzctl grant post p1 viewer '*'
//! authzctl check u2 post p1 viewer --trace
//! authzctl list u1 post owner --json
//! authzctl set-role u9 moderator
//! authzctl --config authz.yaml init-schema
//! ```

use anyhow::{Context, Result};
use auth_zanzibar::repository::{InMemoryTupleRepository, PostgresTupleRepository};
use auth_zanzibar::{
    AuthorizationEngine, GrantOutcome, Namespace, Relation, SubjectType, SystemRole,
    ZanzibarError,
};
use clap::{Parser, Subcommand};
use config_engine::{AuthzConfig, ConfigEngine, ConfigError, StoreBackend};
use error_common::{codes, ErrorBody, ErrorKind};
use logger_redacted::{init_logging, LogRedactor};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const EXIT_OK: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_DENIED: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "authzctl", version, about = "Manage relation tuples and check permissions")]
pub struct Cli {
    /// YAML or TOML configuration file
    #[arg(short, long, global = true, env = "AUTHZCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Grant a relation on an object
    Grant {
        namespace: Namespace,
        object_id: String,
        relation: Relation,
        subject_id: String,
        #[arg(long, default_value = "user")]
        subject_type: SubjectType,
    },
    /// Revoke a single relation tuple
    Revoke {
        namespace: Namespace,
        object_id: String,
        relation: Relation,
        subject_id: String,
        #[arg(long, default_value = "user")]
        subject_type: SubjectType,
    },
    /// Remove every tuple on an object
    RevokeAll {
        namespace: Namespace,
        object_id: String,
    },
    /// Check whether a user holds a relation
    Check {
        user_id: String,
        namespace: Namespace,
        object_id: String,
        relation: Relation,
        /// Report which rule decided
        #[arg(long)]
        trace: bool,
    },
    /// List objects on which the user holds a direct relation
    List {
        user_id: String,
        namespace: Namespace,
        relation: Relation,
    },
    /// Set a user's platform role
    SetRole { user_id: String, role: SystemRole },
    /// Create the tuple table (postgres backend only)
    InitSchema,
}

/// Engine plus the concrete store behind it
pub struct Store {
    pub engine: AuthorizationEngine,
    postgres: Option<PostgresTupleRepository>,
}

impl Store {
    pub fn memory(redactor: LogRedactor) -> Self {
        let engine = AuthorizationEngine::new(Arc::new(InMemoryTupleRepository::new()))
            .with_redactor(redactor);
        Self {
            engine,
            postgres: None,
        }
    }

    pub async fn connect(config: &AuthzConfig) -> Result<Self> {
        let redactor = LogRedactor::from_enabled(config.logging.redaction_enabled);

        match config.store.backend {
            StoreBackend::Memory => Ok(Self::memory(redactor)),
            StoreBackend::Postgres => {
                let url = config
                    .store
                    .database_url
                    .as_deref()
                    .context("store.database_url is not set")?;
                let repository = PostgresTupleRepository::connect(
                    url,
                    config.store.max_connections,
                    Duration::from_secs(config.store.acquire_timeout_secs),
                )
                .await?;

                let engine = AuthorizationEngine::new(Arc::new(repository.clone()))
                    .with_redactor(redactor);
                Ok(Self {
                    engine,
                    postgres: Some(repository),
                })
            }
        }
    }
}

/// Load configuration, start logging, connect and execute
pub async fn run(cli: Cli) -> Result<u8> {
    let mut loader = ConfigEngine::new();
    if let Some(ref path) = cli.config {
        loader = loader.with_file(path);
    }
    let config = loader.load().context("Failed to load configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!(backend = %config.store.backend, "authzctl starting");

    let store = Store::connect(&config).await?;
    let mut stdout = std::io::stdout().lock();
    execute(&store, &cli.command, cli.json, &mut stdout).await
}

/// Run one command and write its result to `out`
pub async fn execute<W: Write>(
    store: &Store,
    command: &Command,
    json: bool,
    out: &mut W,
) -> Result<u8> {
    let engine = &store.engine;

    match command {
        Command::Grant {
            namespace,
            object_id,
            relation,
            subject_id,
            subject_type,
        } => {
            let outcome = engine
                .grant(*namespace, object_id, *relation, *subject_type, subject_id)
                .await?;
            if json {
                writeln!(out, "{}", serde_json::to_string(&outcome)?)?;
            } else {
                match outcome {
                    GrantOutcome::Created(tuple) => writeln!(out, "created {}", tuple)?,
                    GrantOutcome::AlreadyExists => writeln!(out, "already exists")?,
                }
            }
        }
        Command::Revoke {
            namespace,
            object_id,
            relation,
            subject_id,
            subject_type,
        } => {
            let removed = engine
                .revoke(*namespace, object_id, *relation, *subject_type, subject_id)
                .await?;
            report_removed(out, json, removed)?;
        }
        Command::RevokeAll {
            namespace,
            object_id,
        } => {
            let removed = engine.revoke_all(*namespace, object_id).await?;
            report_removed(out, json, removed)?;
        }
        Command::Check {
            user_id,
            namespace,
            object_id,
            relation,
            trace,
        } => {
            let decision = engine
                .check_with_trace(user_id, *namespace, object_id, *relation)
                .await?;
            if json {
                writeln!(out, "{}", serde_json::to_string(&decision)?)?;
            } else if *trace {
                let verdict = if decision.allowed { "allowed" } else { "denied" };
                writeln!(out, "{} ({})", verdict, decision.reason)?;
            } else {
                writeln!(out, "{}", if decision.allowed { "allowed" } else { "denied" })?;
            }

            if !decision.allowed {
                return Ok(EXIT_DENIED);
            }
        }
        Command::List {
            user_id,
            namespace,
            relation,
        } => {
            let object_ids = engine.list_accessible(user_id, *namespace, *relation).await?;
            if json {
                writeln!(out, "{}", serde_json::to_string(&object_ids)?)?;
            } else {
                for object_id in object_ids {
                    writeln!(out, "{}", object_id)?;
                }
            }
        }
        Command::SetRole { user_id, role } => {
            engine.set_system_role(user_id, *role).await?;
            let effective = engine.system_role(user_id).await?;
            if json {
                writeln!(out, "{}", json!({ "user_id": user_id, "role": effective }))?;
            } else {
                writeln!(out, "{} is now {}", user_id, effective)?;
            }
        }
        Command::InitSchema => match store.postgres {
            Some(ref repository) => {
                repository.ensure_schema().await?;
                writeln!(out, "schema ready")?;
            }
            None => {
                writeln!(out, "memory store has no schema")?;
            }
        },
    }

    Ok(EXIT_OK)
}

/// Classify a failed command; errors from outside the engine and config
/// layers count as internal
pub fn error_body(error: &anyhow::Error) -> ErrorBody {
    let mut body = if let Some(e) = error.downcast_ref::<ZanzibarError>() {
        ErrorBody::from_error(e)
    } else if let Some(e) = error.downcast_ref::<ConfigError>() {
        ErrorBody::from_error(e)
    } else {
        ErrorBody {
            code: codes::server::INTERNAL.to_string(),
            kind: ErrorKind::ServerError,
            message: String::new(),
        }
    };
    body.message = format!("{:#}", error);
    body
}

/// Render a failed command the way `--json` asks for
pub fn render_error(error: &anyhow::Error, json: bool) -> String {
    if json {
        error_body(error).to_json().to_string()
    } else {
        format!("error: {:#}", error)
    }
}

fn report_removed<W: Write>(out: &mut W, json: bool, removed: u64) -> Result<()> {
    if json {
        writeln!(out, "{}", json!({ "removed": removed }))?;
    } else {
        writeln!(out, "removed {}", removed)?;
    }
    Ok(())
}
