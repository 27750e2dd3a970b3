//! `fluency` command-line entry point: run the proxy or drive the generator.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fluency_rs::config::{FluencyConfig, TransportMode};
use fluency_rs::core::{Orchestrator, build_default_stores};
use fluency_rs::protocol::{CefrLevel, Skill, Subject};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;

/// Command-line options for the Fluency CLI.
#[derive(Parser)]
#[command(name = "fluency", version)]
struct Cli {
    /// Optional path to a fluency.json5 config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the completion proxy
    Serve {
        /// Listen port (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Listen host
        #[arg(long)]
        host: Option<String>,
    },
    /// Return a test for a catalog slot, generating one if needed
    Generate {
        #[command(flatten)]
        slot: Slot,
        /// Number of questions (defaults to generation.question_count)
        #[arg(long)]
        count: Option<usize>,
        /// Owner of the generated test; enables reuse of unattempted tests
        #[arg(long)]
        user: Option<String>,
        /// Skip reuse and cache lookups
        #[arg(long)]
        force: bool,
        /// Call the provider directly instead of the proxy
        #[arg(long)]
        direct: bool,
    },
    /// Show the oldest stored test the user has not attempted
    Next {
        #[command(flatten)]
        slot: Slot,
        #[arg(long)]
        user: String,
    },
    /// List a user's attempts, newest first
    Attempts {
        #[arg(long)]
        user: String,
    },
}

#[derive(Args)]
struct Slot {
    /// CEFR level (A1..C2)
    #[arg(long)]
    level: CefrLevel,
    /// reading, writing, listening, or speaking
    #[arg(long)]
    skill: Skill,
    /// english, math, science, history, bahasa, or mandarin
    #[arg(long, default_value = "english")]
    subject: Subject,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fluency_rs::init_logging();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    config
        .apply_env_overrides()
        .context("invalid environment override")?;

    match cli.command {
        Command::Serve { port, host } => {
            if let Some(port) = port {
                config.proxy.port = port;
            }
            if let Some(host) = host {
                config.proxy.host = host;
            }
            fluency_rs::server::serve(&config.proxy).await
        }
        Command::Generate {
            slot,
            count,
            user,
            force,
            direct,
        } => {
            if direct {
                config.generation.transport = TransportMode::Direct;
            }
            let orchestrator = build_orchestrator(&config)?;
            let mut request = orchestrator
                .request(slot.level, slot.skill, slot.subject)
                .force(force);
            if let Some(count) = count {
                request = request.with_question_count(count);
            }
            if let Some(user) = user {
                request = request.for_user(user);
            }
            let test = orchestrator
                .generate_test(request)
                .await
                .context("test generation failed")?;
            print_json(&test)
        }
        Command::Next { slot, user } => {
            let orchestrator = build_orchestrator(&config)?;
            let test = orchestrator
                .next_available_test(&user, slot.subject, slot.skill, slot.level)
                .await
                .context("lookup failed")?;
            print_json(&test)
        }
        Command::Attempts { user } => {
            let orchestrator = build_orchestrator(&config)?;
            let attempts = orchestrator
                .user_attempts(&user)
                .await
                .context("failed to list attempts")?;
            print_json(&attempts)
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<FluencyConfig> {
    if let Some(path) = path {
        info!("loading config from path: {}", path.display());
        return FluencyConfig::load_from_path(path).context("failed to load config");
    }
    let cwd = std::env::current_dir().context("cwd")?;
    let layered = FluencyConfig::load_layered(&cwd).context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

fn build_orchestrator(config: &FluencyConfig) -> anyhow::Result<Orchestrator> {
    let stores = build_default_stores(&config.store).context("failed to open stores")?;
    Orchestrator::new(config, stores.tests, stores.quota, None, None)
        .context("failed to build orchestrator")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_parses_catalog_values() {
        let cli = Cli::try_parse_from([
            "fluency", "generate", "--level", "b2", "--skill", "writing", "--subject", "bahasa",
            "--count", "3", "--force",
        ])
        .expect("parse");
        match cli.command {
            Command::Generate {
                slot, count, force, ..
            } => {
                assert_eq!(slot.level, CefrLevel::B2);
                assert_eq!(slot.skill, Skill::Writing);
                assert_eq!(slot.subject, Subject::Bahasa);
                assert_eq!(count, Some(3));
                assert!(force);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(
            Cli::try_parse_from(["fluency", "next", "--level", "D1", "--skill", "reading", "--user", "u"])
                .is_err()
        );
    }
}
