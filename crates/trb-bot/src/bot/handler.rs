//! Per-update dispatch: settings commands, transfer requests, user replies.

use std::path::Path;

use trb_core::config::{HttpOptions, SettingsStore};
use trb_core::format::format_size;
use trb_core::progress::{ProgressSink, ProgressUpdate};
use trb_core::resolver::FileApiResolver;
use trb_core::storage::StorageRoot;
use trb_core::transfer::{run_transfer, InboundEvent, TransferRequest};
use trb_core::upload::{UploadError, UploadSink};

use super::api::BotApi;
use super::commands;
use super::types::{Message, Update};

const UNSUPPORTED_REPLY: &str = "Please send a file or a valid download link.";

/// Everything the dispatcher needs, built once at startup.
pub struct BotContext {
    pub api: BotApi,
    pub settings: SettingsStore,
    pub storage: StorageRoot,
    pub resolver: FileApiResolver,
    pub http: HttpOptions,
}

pub fn handle_update(ctx: &BotContext, update: Update) {
    let Some(message) = update.message else {
        return;
    };
    let chat_id = message.chat.id;

    if let Some(text) = message.text.as_deref() {
        if let Some(command) = commands::parse(text) {
            let reply = commands::apply(&ctx.settings, command);
            reply_best_effort(ctx, chat_id, &reply);
            return;
        }
    }

    let Some(event) = event_from_message(&message) else {
        reply_best_effort(ctx, chat_id, UNSUPPORTED_REPLY);
        return;
    };
    let request = match TransferRequest::from_event(event) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(chat_id, error = %err, "unusable inbound event");
            reply_best_effort(ctx, chat_id, UNSUPPORTED_REPLY);
            return;
        }
    };

    // One settings snapshot per request; mid-transfer /prefix etc. changes
    // apply to the next request only.
    let settings = ctx.settings.snapshot();
    let staging_token = update.update_id.to_string();
    let uploader = BotUploader {
        api: &ctx.api,
        chat_id,
    };
    let mut progress = EditingProgress {
        api: &ctx.api,
        chat_id,
        message_id: None,
    };

    match run_transfer(
        &request,
        &settings,
        &ctx.resolver,
        &ctx.storage,
        &ctx.http,
        &uploader,
        &mut progress,
        &staging_token,
    ) {
        Ok(outcome) => {
            tracing::info!(chat_id, file = %outcome.file_name, bytes = outcome.bytes, "request served");
        }
        Err(err) => {
            tracing::error!(chat_id, source = ?request.source, error = %err, "transfer failed");
            reply_best_effort(ctx, chat_id, err.user_message());
        }
    }
}

/// Classifies a message into an inbound event, or `None` when it carries
/// neither a document nor text.
fn event_from_message(message: &Message) -> Option<InboundEvent> {
    if let Some(document) = &message.document {
        return Some(InboundEvent::Blob {
            blob_id: document.file_id.clone(),
            display_name: document.file_name.clone(),
            trailing_text: caption_trailing_text(
                message.caption.as_deref(),
                document.file_name.as_deref(),
            ),
        });
    }
    message.text.as_ref().map(|text| InboundEvent::Text {
        content: text.clone(),
    })
}

/// The caption carries a requested name only when it differs from the
/// document's own file name; the portion after the first whitespace run is
/// the name.
fn caption_trailing_text(caption: Option<&str>, file_name: Option<&str>) -> Option<String> {
    let caption = caption?.trim();
    if caption.is_empty() || Some(caption) == file_name {
        return None;
    }
    caption
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
}

fn reply_best_effort(ctx: &BotContext, chat_id: i64, text: &str) {
    if let Err(err) = ctx.api.send_message(chat_id, text) {
        tracing::warn!(chat_id, error = ?err, "failed to send reply");
    }
}

/// Upload sink backed by `sendDocument`.
struct BotUploader<'a> {
    api: &'a BotApi,
    chat_id: i64,
}

impl UploadSink for BotUploader<'_> {
    fn send_document(&self, file_name: &str, path: &Path) -> Result<(), UploadError> {
        self.api
            .send_document(self.chat_id, path, file_name)
            .map_err(UploadError::new)
    }
}

/// Progress sink that maintains one editable chat message per transfer.
/// Messaging failures are logged, never fatal to the transfer.
struct EditingProgress<'a> {
    api: &'a BotApi,
    chat_id: i64,
    message_id: Option<i64>,
}

impl ProgressSink for EditingProgress<'_> {
    fn started(&mut self, file_name: &str, total_bytes: Option<u64>) {
        let mut text = format!("Downloading {}...", file_name);
        if let Some(total) = total_bytes {
            text.push_str(&format!("\nSize: {}", format_size(total)));
        }
        match self.api.send_message(self.chat_id, &text) {
            Ok(message) => self.message_id = Some(message.message_id),
            Err(err) => {
                tracing::warn!(chat_id = self.chat_id, error = ?err, "failed to send progress message");
            }
        }
    }

    fn progressed(&mut self, update: &ProgressUpdate) {
        if let Some(message_id) = self.message_id {
            if let Err(err) = self
                .api
                .edit_message_text(self.chat_id, message_id, &update.text)
            {
                tracing::warn!(chat_id = self.chat_id, error = ?err, "failed to edit progress message");
            }
        }
    }

    fn finished(&mut self) {
        if let Some(message_id) = self.message_id.take() {
            if let Err(err) = self.api.delete_message(self.chat_id, message_id) {
                tracing::warn!(chat_id = self.chat_id, error = ?err, "failed to delete progress message");
            }
        }
    }
}
