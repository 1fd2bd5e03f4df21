//! Support-chat transcript model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One message in the support-chat transcript. `sender` is either `"user"`
/// or `"bot"`; the answering service itself lives behind the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub sender: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            content: content.into(),
        }
    }
}
