use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Body of `POST /api/generate`.
#[derive(Debug, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub stream: bool,
}

/// Partial message carried by a streamed chat line. Role is usually present
/// but not needed to rebuild the text.
#[derive(Debug, Deserialize, Default)]
pub struct ChunkMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// One line of a streamed response body.
#[derive(Debug, Deserialize, Default)]
pub struct StreamChunk {
    #[serde(default)]
    pub model: Option<String>,
    /// Fragment from `/api/generate`.
    #[serde(default)]
    pub response: Option<String>,
    /// Fragment from `/api/chat`.
    #[serde(default)]
    pub message: Option<ChunkMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub done_reason: Option<String>,
    #[serde(default)]
    pub eval_count: Option<u64>,
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StreamChunk {
    /// Decode one body line. Only a JSON object is accepted; a derived
    /// `Deserialize` alone would also take an array as positional fields.
    pub fn from_line(line: &[u8]) -> serde_json::Result<Self> {
        let object: Map<String, Value> = serde_json::from_slice(line)?;
        serde_json::from_value(Value::Object(object))
    }

    /// Text carried by this line, empty when the line has none.
    pub fn fragment(&self) -> &str {
        self.response
            .as_deref()
            .or_else(|| self.message.as_ref().and_then(|m| m.content.as_deref()))
            .unwrap_or("")
    }
}
