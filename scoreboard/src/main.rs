//! Scoreboard CLI.
//!
//! Registers participants, claims points and inspects the leaderboard and
//! award ledger stored under the configured data directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use scoreboard::claim::ClaimOutcome;
use scoreboard::core::invariants::VerifyReport;
use scoreboard::core::types::{ParticipantId, RankedView};
use scoreboard::io::config::{DEFAULT_CONFIG_FILE, ScoreboardConfig, load_config, write_config};
use scoreboard::ledger::AwardHistory;
use scoreboard::{Error, Scoreboard, exit_codes, logging};

#[derive(Parser)]
#[command(
    name = "scoreboard",
    version,
    about = "Claim-based leaderboard with an auditable award ledger"
)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override `storage.data_dir` from the config file.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file if missing.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
    },
    /// Register a new participant.
    Register { name: String },
    /// Award random points (1-10) to a participant.
    Claim { id: String },
    /// Print all participants in rank order.
    Leaderboard,
    /// Print a participant's awards, most recent first.
    History { id: String },
    /// Check every score against the award ledger.
    Verify,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let json = cli.json;
    match cli.command {
        Command::Init { force } => return cmd_init(&cli.config, cli.data_dir, force),
        Command::Register { name } => {
            let board = open_board(&cli.config, cli.data_dir)?;
            let participant = board.register(&name)?;
            emit(json, &participant, || {
                format!("registered {} ({})", participant.name, participant.id)
            })?;
        }
        Command::Claim { id } => {
            let id = parse_id(&id)?;
            let board = open_board(&cli.config, cli.data_dir)?;
            let outcome = board.claim(&id)?;
            emit(json, &outcome, || render_claim(&outcome))?;
        }
        Command::Leaderboard => {
            let board = open_board(&cli.config, cli.data_dir)?;
            let leaderboard = board.leaderboard();
            emit(json, &leaderboard, || render_leaderboard(&leaderboard))?;
        }
        Command::History { id } => {
            let id = parse_id(&id)?;
            let board = open_board(&cli.config, cli.data_dir)?;
            let history = board.history(&id)?;
            emit(json, &history.entries(), || render_history(&history))?;
        }
        Command::Verify => {
            let board = open_board(&cli.config, cli.data_dir)?;
            let report = board.verify();
            emit(json, &report, || render_report(&report))?;
            if !report.is_consistent() {
                return Ok(exit_codes::INCONSISTENT);
            }
        }
    }
    Ok(exit_codes::OK)
}

/// Load config (applying the `--data-dir` override) and open the journal.
fn open_board(config_path: &Path, data_dir: Option<PathBuf>) -> Result<Scoreboard> {
    let mut config = load_config(config_path)?;
    if let Some(data_dir) = data_dir {
        config.storage.data_dir = data_dir;
    }
    let board = Scoreboard::open(&config.storage).with_context(|| {
        format!("open scoreboard at {}", config.storage.data_dir.display())
    })?;
    Ok(board)
}

fn cmd_init(config_path: &Path, data_dir: Option<PathBuf>, force: bool) -> Result<i32> {
    if !force && config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(exit_codes::OK);
    }
    let mut config = ScoreboardConfig::default();
    if let Some(data_dir) = data_dir {
        config.storage.data_dir = data_dir;
    }
    write_config(config_path, &config)?;
    println!("wrote {}", config_path.display());
    Ok(exit_codes::OK)
}

/// Id argument that is not 24 hex characters.
#[derive(Debug, thiserror::Error)]
#[error("malformed participant id '{0}'")]
struct MalformedId(String);

fn parse_id(raw: &str) -> Result<ParticipantId> {
    ParticipantId::parse(raw).ok_or_else(|| MalformedId(raw.to_string()).into())
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<MalformedId>().is_some() {
        return exit_codes::REJECTED;
    }
    match err.downcast_ref::<Error>() {
        Some(Error::NotFound(_)) => exit_codes::NOT_FOUND,
        Some(Error::InvalidName | Error::DuplicateName(_)) => exit_codes::REJECTED,
        _ => exit_codes::FAILED,
    }
}

/// Print `value` as pretty JSON, or the text rendering.
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        let payload = serde_json::to_string_pretty(value).context("serialize json")?;
        println!("{payload}");
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn render_claim(outcome: &ClaimOutcome) -> String {
    let claimant = &outcome.participant;
    format!(
        "{} +{} -> {} points (rank {})\n\n{}",
        claimant.participant.name,
        outcome.amount,
        claimant.participant.score,
        claimant.rank,
        render_leaderboard(&outcome.leaderboard)
    )
}

fn render_leaderboard(leaderboard: &RankedView) -> String {
    if leaderboard.is_empty() {
        return "no participants".to_string();
    }
    leaderboard
        .iter()
        .map(|entry| {
            format!(
                "{:>3}. {:<24} {:>6}  {}",
                entry.rank, entry.participant.name, entry.participant.score, entry.participant.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_history(history: &AwardHistory) -> String {
    let participant = history.participant();
    let mut lines = vec![format!(
        "{} ({}): {} awards, {} points",
        participant.name,
        participant.id,
        history.len(),
        participant.score
    )];
    lines.extend(history.iter().map(|event| {
        format!(
            "  {}  +{:<2}  {}",
            event.awarded_at.to_rfc3339(),
            event.amount.get(),
            event.id
        )
    }));
    lines.join("\n")
}

fn render_report(report: &VerifyReport) -> String {
    let mut lines = vec![format!(
        "checked {} participants, {} awards",
        report.participants_checked, report.awards_checked
    )];
    if report.is_consistent() {
        lines.push("ok: every score matches its ledger".to_string());
    }
    lines.extend(report.mismatches.iter().map(|mismatch| {
        format!(
            "mismatch: {} ({}) score {} != ledger {} ({} foreign events)",
            mismatch.name,
            mismatch.participant_id,
            mismatch.score,
            mismatch.ledger_total,
            mismatch.foreign_events
        )
    }));
    lines.join("\n")
}
