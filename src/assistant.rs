//! # Hosted Assistant Client
//!
//! Thin client for the hosted conversational-assistant API backing the
//! site's chat widget. A conversation is a *thread*; each user message is
//! appended to the thread and answered by starting a *run* of the
//! configured assistant, which is then polled until it completes.

use crate::error::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Poll interval while a run is in flight.
const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Maximum number of polls before giving up (~30s).
const MAX_POLL_ATTEMPTS: u32 = 30;
/// Cap on assistant reply length, in completion tokens.
const MAX_COMPLETION_TOKENS: u32 = 250;

#[derive(Debug, Deserialize)]
struct ThreadObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    value: String,
}

/// Client for one configured assistant.
#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    assistant_id: String,
}

impl AssistantClient {
    pub fn new(base_url: &str, api_key: &str, assistant_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            assistant_id: assistant_id.to_string(),
        }
    }

    /// Send one user message and wait for the assistant's reply.
    ///
    /// Creates a new thread when `thread_id` is `None`. Returns the thread
    /// id (so the client can continue the conversation) and the reply text.
    ///
    /// ## Errors
    /// - Timeout (408): the run didn't complete within the polling budget
    /// - Internal (500): the run ended `failed`/`cancelled`/`expired`
    /// - Upstream (500): transport or HTTP errors from the assistant API
    pub async fn send_message(
        &self,
        thread_id: Option<String>,
        message: &str,
    ) -> AppResult<(String, String)> {
        let thread_id = match thread_id {
            Some(id) => id,
            None => self.create_thread().await?,
        };

        self.add_user_message(&thread_id, message).await?;

        let run = self.create_run(&thread_id).await?;

        let mut status = run.status;
        let mut attempts = 0;
        while status != "completed" && attempts < MAX_POLL_ATTEMPTS {
            tokio::time::sleep(POLL_INTERVAL).await;
            status = self.run_status(&thread_id, &run.id).await?;
            attempts += 1;
            tracing::debug!(attempts, %status, "Polling assistant run");

            if matches!(status.as_str(), "failed" | "cancelled" | "expired") {
                tracing::error!(%status, "Assistant run did not complete");
                return Err(AppError::Internal(format!(
                    "Assistant run ended with status: {}",
                    status
                )));
            }
        }

        if status != "completed" {
            return Err(AppError::Timeout("Request timeout".to_string()));
        }

        let reply = self.latest_assistant_reply(&thread_id).await?;

        Ok((thread_id, reply))
    }

    async fn create_thread(&self) -> AppResult<String> {
        let thread: ThreadObject = self
            .http
            .post(format!("{}/threads", self.base_url))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .json(&json!({}))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(thread.id)
    }

    async fn add_user_message(&self, thread_id: &str, content: &str) -> AppResult<()> {
        self.http
            .post(format!("{}/threads/{}/messages", self.base_url, thread_id))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .json(&json!({ "role": "user", "content": content }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn create_run(&self, thread_id: &str) -> AppResult<RunObject> {
        let run: RunObject = self
            .http
            .post(format!("{}/threads/{}/runs", self.base_url, thread_id))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .json(&json!({
                "assistant_id": self.assistant_id,
                "max_completion_tokens": MAX_COMPLETION_TOKENS,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(run)
    }

    async fn run_status(&self, thread_id: &str, run_id: &str) -> AppResult<String> {
        let run: RunObject = self
            .http
            .get(format!(
                "{}/threads/{}/runs/{}",
                self.base_url, thread_id, run_id
            ))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(run.status)
    }

    /// Most recent assistant message in the thread, as plain text.
    async fn latest_assistant_reply(&self, thread_id: &str) -> AppResult<String> {
        let messages: MessageList = self
            .http
            .get(format!("{}/threads/{}/messages", self.base_url, thread_id))
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .query(&[("order", "desc")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let reply = messages
            .data
            .iter()
            .find(|m| m.role == "assistant")
            .ok_or_else(|| AppError::Internal("No assistant reply in thread".to_string()))?;

        let text = reply
            .content
            .iter()
            .find(|part| part.kind == "text")
            .and_then(|part| part.text.as_ref())
            .map(|t| t.value.clone())
            .unwrap_or_else(|| "Received an unsupported content type.".to_string());

        Ok(text)
    }
}
