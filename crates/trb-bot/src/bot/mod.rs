//! Long-poll loop: fetch updates, dispatch each one, repeat.
//!
//! Updates are processed sequentially; a transfer runs to completion
//! (including cleanup) before the next update is looked at. Poll failures
//! are logged and retried, they never take the process down.

mod api;
mod commands;
mod handler;
mod types;

use anyhow::Result;
use std::thread;
use std::time::Duration;

use trb_core::config::{self, SettingsStore, TrbConfig};
use trb_core::resolver::FileApiResolver;
use trb_core::storage::StorageRoot;

use api::BotApi;
use handler::BotContext;

/// Pause after a failed poll before trying again.
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

pub fn run(cfg: TrbConfig, token: String) -> Result<()> {
    let storage_dir = match cfg.storage_root {
        Some(dir) => dir,
        None => config::default_storage_root()?,
    };
    let storage = StorageRoot::open(&storage_dir)?;
    tracing::info!(storage = %storage_dir.display(), api_base = %cfg.api_base, "trb bot starting");

    let ctx = BotContext {
        api: BotApi::new(&cfg.api_base, &token, cfg.http),
        settings: SettingsStore::new(cfg.transfer),
        storage,
        resolver: FileApiResolver::new(&cfg.api_base, &token, cfg.http),
        http: cfg.http,
    };

    let mut offset: i64 = 0;
    loop {
        let updates = match ctx.api.get_updates(offset) {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = ?err, "getUpdates failed, retrying");
                thread::sleep(POLL_RETRY_DELAY);
                continue;
            }
        };
        for update in updates {
            offset = offset.max(update.update_id + 1);
            handler::handle_update(&ctx, update);
        }
    }
}
