#![allow(missing_docs)]

//! Tarpit — scam-engagement honeypot engine.
//!
//! `tarpit serve` reads one JSON engagement request per stdin line and
//! writes one reply envelope per stdout line; a host web layer speaks
//! this interface or links the library directly. `tarpit probe` runs a
//! single turn for manual testing.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use tarpit::config::{config_dir, load_config, TarpitConfig};
use tarpit::engage::sanitizer::GREETING_REPLY;
use tarpit::engage::wire::{EngageReply, EngageRequest, MessageField};
use tarpit::engage::EngagementController;
use tarpit::generator::{ChatGenerator, DisabledGenerator, Generator};
use tarpit::logging;
use tarpit::patterns::PatternLibrary;
use tarpit::report::{HttpReporter, LogReporter, Reporter};
use tarpit::session::SessionStore;

#[derive(Parser)]
#[command(name = "tarpit", version, about = "Scam-engagement honeypot engine")]
struct Cli {
    /// Path to config.toml (default: ~/.tarpit/config.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the engagement loop: one JSON request per stdin line, one
    /// reply envelope per stdout line.
    Serve,

    /// Process a single message and print the reply envelope.
    Probe {
        /// Session identifier to use.
        #[arg(long, default_value = "probe")]
        session: String,

        /// The correspondent message to process.
        #[arg(long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve => {
            let logs_dir = config_dir()?.join("logs");
            let _guard = logging::init_serve(&logs_dir)?;
            let controller = build_controller(&config)?;
            serve(controller).await
        }
        Command::Probe { session, message } => {
            logging::init_cli();
            let controller = build_controller(&config)?;
            let reply = controller
                .handle(EngageRequest {
                    session_id: Some(session),
                    message: Some(MessageField::Text(message)),
                    conversation_history: Vec::new(),
                })
                .await;
            println!("{}", serde_json::to_string_pretty(&reply)?);
            Ok(())
        }
    }
}

/// Load config from the given path, `~/.tarpit/config.toml` when present,
/// or defaults.
fn resolve_config(path: Option<&std::path::Path>) -> Result<TarpitConfig> {
    if let Some(path) = path {
        return load_config(path).context("failed to load configuration");
    }
    let default_path = config_dir()?.join("config.toml");
    if default_path.exists() {
        return load_config(&default_path).context("failed to load configuration");
    }
    Ok(TarpitConfig::default())
}

/// Assemble the engagement controller from config.
///
/// A missing generator API key degrades to the fallback rotation; a
/// missing report endpoint logs reports locally. Neither fails startup.
fn build_controller(config: &TarpitConfig) -> Result<EngagementController> {
    let patterns = Arc::new(PatternLibrary::new()?);

    let generator: Arc<dyn Generator> = match std::env::var(&config.generator.api_key_env) {
        Ok(key) if !key.trim().is_empty() => {
            info!(model = %config.generator.model, "dialogue generator configured");
            Arc::new(ChatGenerator::new(&config.generator, key)?)
        }
        _ => {
            warn!(
                env = %config.generator.api_key_env,
                "no generator API key; replies come from the fallback rotation"
            );
            Arc::new(DisabledGenerator)
        }
    };

    let reporter: Arc<dyn Reporter> = match config.report.endpoint_url()? {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "report endpoint configured");
            Arc::new(HttpReporter::new(endpoint, config.report.timeout_seconds)?)
        }
        None => {
            warn!("no report endpoint; reports are logged locally");
            Arc::new(LogReporter)
        }
    };

    Ok(EngagementController::new(
        patterns,
        config.detection.clone(),
        config.engagement.clone(),
        Arc::new(SessionStore::new()),
        generator,
        reporter,
    ))
}

/// Line-delimited JSON loop over stdin/stdout.
///
/// An unparsable line gets the neutral greeting envelope; the
/// correspondent-facing surface never emits an error. Shuts down
/// cleanly on ctrl-c or stdin EOF.
async fn serve(controller: EngagementController) -> Result<()> {
    info!("tarpit serving on stdin/stdout");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    info!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let reply = match serde_json::from_str::<EngageRequest>(&line) {
                    Ok(request) => controller.handle(request).await,
                    Err(e) => {
                        warn!(error = %e, "unparsable request; returning safe envelope");
                        EngageReply::safe_default(GREETING_REPLY)
                    }
                };
                let mut out = serde_json::to_string(&reply)?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }
    }

    let sessions = controller.store().len().await;
    info!(sessions, "tarpit shut down");
    Ok(())
}
