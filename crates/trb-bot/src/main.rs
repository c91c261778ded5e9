use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use trb_core::{config, logging};

mod bot;

/// TRB: auto-rename bot. Fetches a file or link sent over Telegram, renames
/// it per the current settings, and sends it back.
#[derive(Debug, Parser)]
#[command(name = "trb")]
#[command(about = "TRB: Telegram auto-rename bot", long_about = None)]
struct Args {
    /// Bot token (overrides TRB_TOKEN and the config file).
    #[arg(long)]
    token: Option<String>,

    /// Bot API base URL (overrides the config file; useful for testing).
    #[arg(long)]
    api_base: Option<String>,

    /// Directory downloads are staged and renamed in.
    #[arg(long)]
    storage_root: Option<PathBuf>,
}

fn main() {
    // Initialize logging as early as possible; fall back to stderr when the
    // state dir is unusable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = run() {
        eprintln!("trb error: {:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let mut cfg = config::load_or_init()?;
    tracing::debug!("loaded config: {:?}", cfg.api_base);

    if let Some(api_base) = args.api_base {
        cfg.api_base = api_base;
    }
    if let Some(storage_root) = args.storage_root {
        cfg.storage_root = Some(storage_root);
    }
    let token = args
        .token
        .or_else(|| std::env::var("TRB_TOKEN").ok().filter(|t| !t.is_empty()))
        .or_else(|| cfg.token.clone())
        .context("no bot token: pass --token, set TRB_TOKEN, or add token to the config file")?;

    bot::run(cfg, token)
}
