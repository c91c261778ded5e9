//! Minimal Bot API structures: only the fields the bot reads.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub document: Option<Document>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Document {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_with_document_parses() {
        let json = r#"{
            "update_id": 42,
            "message": {
                "message_id": 7,
                "date": 1700000000,
                "chat": {"id": 1001, "type": "private"},
                "caption": "invoice.pdf renamed.pdf",
                "document": {"file_id": "BQAD", "file_name": "invoice.pdf", "mime_type": "application/pdf"}
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 42);
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 1001);
        assert_eq!(message.caption.as_deref(), Some("invoice.pdf renamed.pdf"));
        let document = message.document.unwrap();
        assert_eq!(document.file_id, "BQAD");
        assert_eq!(document.file_name.as_deref(), Some("invoice.pdf"));
    }

    #[test]
    fn update_without_message_parses() {
        let update: Update = serde_json::from_str(r#"{"update_id": 1}"#).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn text_message_parses() {
        let json = r#"{
            "message_id": 9,
            "chat": {"id": 5},
            "text": "https://example.com/file.zip"
        }"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.text.as_deref(), Some("https://example.com/file.zip"));
        assert!(message.document.is_none());
    }
}
