// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Argument parsing and command dispatch.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use parallax_config::{game_prefs_key, ConfigService, VrPrefs, PREFS_KEY};
use parallax_config_fs::FsConfigStore;
use parallax_core::TitleProfile;

use crate::trace::{replay, ReplayOptions, Trace};

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(name = "parallax")]
#[command(about = "Stereoscopic VR retrofit tooling")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Read and write prefs under this directory instead of the platform config dir
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,
    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay a recorded draw-call trace and print per-batch results
    Replay {
        /// Path to a trace .json file
        trace: PathBuf,
        /// Force a title profile instead of deriving it from the game id
        #[arg(long)]
        title: Option<String>,
        /// Replay with a stationary headset attached
        #[arg(long)]
        hmd: bool,
        /// Emit one JSON object per batch
        #[arg(long)]
        json: bool,
    },
    /// List the built-in title profiles
    Titles,
    /// Inspect or reset stored VR prefs
    Prefs {
        /// Work on one title's overrides instead of the global prefs
        #[arg(long)]
        game: Option<String>,
        /// Prefs operation.
        #[command(subcommand)]
        action: PrefsAction,
    },
}

/// Prefs subcommands.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum PrefsAction {
    /// Print the effective prefs as JSON (global prefs plus the title's overrides)
    Show,
    /// Delete stored prefs so the next layer down applies again
    Reset,
    /// Print where prefs are stored
    Path,
}

/// Parses arguments, installs logging and runs the command against stdout.
pub fn entrypoint() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install logger")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)
}

fn store(config_dir: Option<PathBuf>) -> Result<FsConfigStore> {
    let store = match config_dir {
        Some(dir) => FsConfigStore::with_base(dir)?,
        None => FsConfigStore::new()?,
    };
    Ok(store)
}

/// Runs a parsed command, writing results to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Replay {
            trace,
            title,
            hmd,
            json,
        } => {
            let service = ConfigService::new(store(cli.config_dir)?);
            let title = title.map(|t| t.parse::<TitleProfile>()).transpose()?;
            let loaded = Trace::load(&trace)?;
            let prefs = VrPrefs::load_for_game(&service, &loaded.game_id)?;
            info!(
                game_id = %loaded.game_id,
                frames = loaded.frames.len(),
                batches = loaded.batch_count(),
                "replaying trace"
            );
            let records = replay(&loaded, prefs, &ReplayOptions { title, hmd })?;
            for record in &records {
                if json {
                    serde_json::to_writer(&mut *out, record)?;
                    writeln!(out)?;
                } else {
                    writeln!(out, "{}", record.describe())?;
                }
            }
            if !json {
                let hidden = records.iter().filter(|r| r.output.matrices.is_hidden()).count();
                writeln!(
                    out,
                    "{} frames, {} batches, {} hidden",
                    loaded.frames.len(),
                    records.len(),
                    hidden
                )?;
            }
        }
        Commands::Titles => {
            for profile in TitleProfile::ALL {
                writeln!(out, "{:<16} {}", profile.name(), profile.game_id_prefix().unwrap_or("*"))?;
            }
        }
        Commands::Prefs { game, action } => {
            let service = ConfigService::new(store(cli.config_dir)?);
            let game = game.unwrap_or_default();
            let key = if game.is_empty() {
                PREFS_KEY.to_owned()
            } else {
                game_prefs_key(&game)
            };
            match action {
                PrefsAction::Show => {
                    let prefs = VrPrefs::load_for_game(&service, &game)?;
                    serde_json::to_writer_pretty(&mut *out, &prefs)?;
                    writeln!(out)?;
                }
                PrefsAction::Reset => {
                    service.reset(&key)?;
                    info!(key = %key, "prefs reset");
                }
                PrefsAction::Path => {
                    writeln!(out, "{}", service.store().path_for(&key).display())?;
                }
            }
        }
    }
    out.flush()?;
    Ok(())
}
