//! Settings commands: parsing and replies.
//!
//! Commands mutate the shared [`SettingsStore`] by publishing a new snapshot;
//! in-flight transfers keep the one they started with.

use trb_core::config::{RenameMode, SettingsStore, TransferSettings, UploadType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Settings,
    RenameMode(Option<String>),
    Prefix(Option<String>),
    Suffix(Option<String>),
}

/// Parses a chat message into a command. Unknown or non-command text yields
/// `None` and flows on to transfer handling. The command token tolerates a
/// `@botname` suffix.
pub fn parse(text: &str) -> Option<Command> {
    let trimmed = text.trim();
    if !trimmed.starts_with('/') {
        return None;
    }
    let (head, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, Some(rest)),
        None => (trimmed, None),
    };
    let name = &head[1..];
    let name = name.split_once('@').map(|(n, _)| n).unwrap_or(name);
    let arg = rest
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    match name {
        "start" => Some(Command::Start),
        "settings" => Some(Command::Settings),
        "rename_mode" => Some(Command::RenameMode(arg)),
        "prefix" => Some(Command::Prefix(arg)),
        "suffix" => Some(Command::Suffix(arg)),
        _ => None,
    }
}

pub fn welcome_text() -> &'static str {
    "Hi! I'm an Auto Rename Bot.\n\n\
     Send me a file or a download link, and I'll rename and send it back to you.\n\n\
     You can use /settings to see your current settings and modify rename mode.\n\
     To rename with manual rename mode, just add the new file name after the file \
     or the link, separated by a space."
}

fn mode_name(mode: RenameMode) -> &'static str {
    match mode {
        RenameMode::Manual => "manual",
        RenameMode::Auto => "auto",
    }
}

fn upload_type_name(upload_type: UploadType) -> &'static str {
    match upload_type {
        UploadType::Media => "media",
    }
}

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        "None"
    } else {
        value
    }
}

pub fn settings_text(settings: &TransferSettings) -> String {
    format!(
        "Current Settings:\n\n\
         Rename Mode: {}\n\
         Prefix: {}\n\
         Suffix: {}\n\
         Upload Type: {}\n\n\
         Use /rename_mode to change rename mode.",
        mode_name(settings.rename_mode),
        or_none(&settings.prefix),
        or_none(&settings.suffix),
        upload_type_name(settings.upload_type),
    )
}

/// Applies a command to the settings store and returns the reply text.
pub fn apply(store: &SettingsStore, command: Command) -> String {
    match command {
        Command::Start => welcome_text().to_string(),
        Command::Settings => settings_text(&store.snapshot()),
        Command::RenameMode(arg) => match arg.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("manual") => {
                store.update(|s| s.rename_mode = RenameMode::Manual);
                "Rename mode set to manual.".to_string()
            }
            Some("auto") => {
                store.update(|s| s.rename_mode = RenameMode::Auto);
                "Rename mode set to auto.".to_string()
            }
            _ => "Invalid rename mode. Use /rename_mode manual or /rename_mode auto".to_string(),
        },
        Command::Prefix(arg) => {
            let value = arg.unwrap_or_default();
            store.update(|s| s.prefix = value.clone());
            if value.is_empty() {
                "Prefix cleared.".to_string()
            } else {
                format!("Prefix set to {}.", value)
            }
        }
        Command::Suffix(arg) => {
            let value = arg.unwrap_or_default();
            store.update(|s| s.suffix = value.clone());
            if value.is_empty() {
                "Suffix cleared.".to_string()
            } else {
                format!("Suffix set to {}.", value)
            }
        }
    }
}
