//! Blocking Bot API client over libcurl.
//!
//! One Easy handle per call; JSON envelopes are parsed with the minimal
//! structures in [`super::types`]. Every response goes through the
//! `{ ok, result, description }` envelope check.

use anyhow::{bail, Context, Result};
use curl::easy::{Easy, Form};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use trb_core::config::HttpOptions;

use super::types::{Message, Update};

/// Seconds the server may hold a getUpdates long poll open.
pub const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct BotApi {
    api_base: String,
    token: String,
    http: HttpOptions,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
struct ApiEnvelope<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

fn parse_envelope<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let envelope: ApiEnvelope<T> =
        serde_json::from_slice(body).context("malformed Bot API response")?;
    if !envelope.ok {
        bail!(
            "{}",
            envelope
                .description
                .unwrap_or_else(|| "request was not ok".to_string())
        );
    }
    envelope.result.context("Bot API response missing result")
}

impl BotApi {
    pub fn new(api_base: &str, token: &str, http: HttpOptions) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Performs the prepared request and returns the raw response body.
    fn execute(&self, easy: &mut Easy, deadline_secs: u64) -> Result<Vec<u8>> {
        easy.connect_timeout(Duration::from_secs(self.http.connect_timeout_secs))?;
        easy.timeout(Duration::from_secs(deadline_secs))?;
        let mut body = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        Ok(body)
    }

    fn call<T: DeserializeOwned>(&self, method: &str, form: Form) -> Result<T> {
        let mut easy = Easy::new();
        easy.url(&self.method_url(method))?;
        easy.httppost(form)?;
        let body = self.execute(&mut easy, self.http.request_timeout_secs.min(120))?;
        parse_envelope(&body).with_context(|| format!("Bot API {} failed", method))
    }

    /// Long-polls for new updates starting at `offset`.
    pub fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let mut easy = Easy::new();
        let url = format!(
            "{}?timeout={}&offset={}",
            self.method_url("getUpdates"),
            POLL_TIMEOUT_SECS,
            offset
        );
        easy.url(&url)?;
        // The whole-request deadline must outlast the server-side hold.
        let body = self.execute(&mut easy, POLL_TIMEOUT_SECS + 30)?;
        parse_envelope(&body).context("Bot API getUpdates failed")
    }

    pub fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        let chat = chat_id.to_string();
        let mut form = Form::new();
        form.part("chat_id").contents(chat.as_bytes()).add()?;
        form.part("text").contents(text.as_bytes()).add()?;
        self.call("sendMessage", form)
    }

    pub fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let chat = chat_id.to_string();
        let message = message_id.to_string();
        let mut form = Form::new();
        form.part("chat_id").contents(chat.as_bytes()).add()?;
        form.part("message_id").contents(message.as_bytes()).add()?;
        form.part("text").contents(text.as_bytes()).add()?;
        let _: serde_json::Value = self.call("editMessageText", form)?;
        Ok(())
    }

    pub fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let chat = chat_id.to_string();
        let message = message_id.to_string();
        let mut form = Form::new();
        form.part("chat_id").contents(chat.as_bytes()).add()?;
        form.part("message_id").contents(message.as_bytes()).add()?;
        let _: serde_json::Value = self.call("deleteMessage", form)?;
        Ok(())
    }

    /// Uploads the file at `path` as a document named `file_name`.
    pub fn send_document(&self, chat_id: i64, path: &Path, file_name: &str) -> Result<()> {
        let chat = chat_id.to_string();
        let mut form = Form::new();
        form.part("chat_id").contents(chat.as_bytes()).add()?;
        form.part("document")
            .file(path)
            .filename(file_name)
            .add()?;
        let _: serde_json::Value = self.call("sendDocument", form)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success() {
        let body = br#"{"ok":true,"result":[{"update_id":3}]}"#;
        let updates: Vec<Update> = parse_envelope(body).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 3);
    }

    #[test]
    fn envelope_failure_carries_description() {
        let body = br#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let err = parse_envelope::<Vec<Update>>(body).unwrap_err();
        assert!(err.to_string().contains("Unauthorized"));
    }

    #[test]
    fn envelope_rejects_garbage() {
        assert!(parse_envelope::<Vec<Update>>(b"<html>").is_err());
    }

    #[test]
    fn method_url_shape() {
        let api = BotApi::new("https://api.example.org/", "TOKEN", HttpOptions::default());
        assert_eq!(
            api.method_url("sendMessage"),
            "https://api.example.org/botTOKEN/sendMessage"
        );
    }
}
