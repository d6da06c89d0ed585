use std::time::Duration;

use futures_util::Stream;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{map_reqwest_error, Error, Result};
use crate::models::{ChatRequest, GenerateRequest, StreamChunk};
use crate::stream::json_lines;

pub const DEFAULT_HOST: &str = "http://localhost:11434";

const GENERATE_PATH: &str = "/api/generate";
const CHAT_PATH: &str = "/api/chat";

/// Client for a local Ollama server.
pub struct Ollama {
    client: Client,
    base_url: String,
}

impl Ollama {
    pub fn new(base_url: &str) -> Self {
        Ollama {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Complete `request` in one response and return its `response` text.
    pub async fn generate(&self, request: &GenerateRequest, timeout: Duration) -> Result<String> {
        let body = self.post_json(GENERATE_PATH, request, timeout).await?;
        field(&body, "/response")
    }

    /// Complete `request` in one response and return the assistant's content.
    pub async fn chat(&self, request: &ChatRequest, timeout: Duration) -> Result<String> {
        let body = self.post_json(CHAT_PATH, request, timeout).await?;
        field(&body, "/message/content")
    }

    pub async fn generate_stream(
        &self,
        request: &GenerateRequest,
        idle: Duration,
    ) -> Result<impl Stream<Item = Result<StreamChunk>>> {
        self.open_stream(GENERATE_PATH, request, idle).await
    }

    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        idle: Duration,
    ) -> Result<impl Stream<Item = Result<StreamChunk>>> {
        self.open_stream(CHAT_PATH, request, idle).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T, timeout: Duration) -> Result<Value> {
        let url = self.url(path);
        debug!(%url, ?timeout, "sending request");

        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;

        let response = check_status(response).await?;
        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, timeout))?;
        debug!(bytes = text.len(), "response received");

        Ok(serde_json::from_str(&text)?)
    }

    /// The idle window bounds the wait for the response head and then each
    /// body read; the stream as a whole may run longer.
    async fn open_stream<T: Serialize>(
        &self,
        path: &str,
        body: &T,
        idle: Duration,
    ) -> Result<impl Stream<Item = Result<StreamChunk>>> {
        let url = self.url(path);
        debug!(%url, ?idle, "opening stream");

        let send = self.client.post(&url).json(body).send();
        let response = tokio::time::timeout(idle, send)
            .await
            .map_err(|_| Error::Timeout(idle))??;

        let response = check_status(response).await?;
        Ok(json_lines(Box::pin(response.bytes_stream()), idle))
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, %status, "failed to read error body");
            format!("<unreadable body: {e}>")
        }
    };
    Err(Error::Status {
        status: status.as_u16(),
        body,
    })
}

fn field(body: &Value, pointer: &str) -> Result<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| Error::MissingField(pointer.to_string()))
}
