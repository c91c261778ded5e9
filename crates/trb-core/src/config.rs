use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// How the final file name is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameMode {
    /// The user's requested name wins; the staged extension is preserved.
    #[default]
    Manual,
    /// The original name, wrapped in the configured prefix/suffix.
    Auto,
}

/// Which sink receives the finished file. Only the binary-document sink is
/// in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadType {
    #[default]
    Media,
}

/// Rename/upload policy shared across transfers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransferSettings {
    #[serde(default)]
    pub rename_mode: RenameMode,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub upload_type: UploadType,
}

/// Network-layer bounds applied to every HTTP call (lookup, download,
/// transport traffic).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HttpOptions {
    /// Seconds allowed for connection establishment.
    pub connect_timeout_secs: u64,
    /// Hard cap on a whole request, in seconds.
    pub request_timeout_secs: u64,
    /// Abort when the transfer stays under 1 KiB/s for this many seconds.
    pub stall_timeout_secs: u64,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            request_timeout_secs: 3600,
            stall_timeout_secs: 60,
        }
    }
}

/// Global configuration loaded from `~/.config/trb/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrbConfig {
    /// Base URL of the transport's HTTP API.
    pub api_base: String,
    /// Bot credential. Usually supplied via flag or `TRB_TOKEN` instead of
    /// being written to disk.
    #[serde(default)]
    pub token: Option<String>,
    /// Directory downloads are staged and renamed in. Defaults to the XDG
    /// data dir when absent.
    #[serde(default)]
    pub storage_root: Option<PathBuf>,
    #[serde(default)]
    pub http: HttpOptions,
    /// Initial rename/upload settings; `/settings` commands change them at
    /// runtime without touching this file.
    #[serde(default)]
    pub transfer: TransferSettings,
}

impl Default for TrbConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            token: None,
            storage_root: None,
            http: HttpOptions::default(),
            transfer: TransferSettings::default(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("trb")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TrbConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TrbConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: TrbConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Default storage root under the XDG data directory.
pub fn default_storage_root() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("trb")?;
    Ok(xdg_dirs.get_data_home().join("downloads"))
}

/// Shared settings with copy-on-write updates.
///
/// Readers take one immutable snapshot per transfer; writers publish a whole
/// new value, so a transfer never observes a half-updated configuration.
#[derive(Debug)]
pub struct SettingsStore {
    inner: RwLock<Arc<TransferSettings>>,
}

impl SettingsStore {
    pub fn new(initial: TransferSettings) -> Self {
        Self {
            inner: RwLock::new(Arc::new(initial)),
        }
    }

    /// The current settings value. The returned `Arc` stays stable while the
    /// store moves on.
    pub fn snapshot(&self) -> Arc<TransferSettings> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock still holds a valid value.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Publishes a new settings value derived from the current one.
    pub fn update(&self, apply: impl FnOnce(&mut TransferSettings)) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut next = (**guard).clone();
        apply(&mut next);
        *guard = Arc::new(next);
    }
}
