//! Client for the backend assistant endpoint
//!
//! Failures never escape this module: any transport error, non-success
//! status or malformed body is turned into a fixed spoken apology.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::memory::ConversationTurn;

/// Reply used whenever the backend cannot be reached
pub const APOLOGY: &str = "I could not reach our cloud assistant right now, but in short: AI agents are simulated players that analyse games so product and analytics teams can move faster.";

/// Errors from a single assistant round trip
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server error ({status})")]
    ServerError { status: u16 },

    #[error("invalid response from server: {0}")]
    InvalidResponse(String),
}

/// Request body for `POST /api/assistant`
#[derive(Debug, Serialize)]
struct AssistantRequest<'a> {
    message: &'a str,
}

/// Response body from `POST /api/assistant`
#[derive(Debug, Deserialize)]
struct AssistantResponse {
    #[serde(default)]
    reply: Option<String>,
}

/// Remote fallback for utterances no local rule answers
#[derive(Clone)]
pub struct AssistantClient {
    endpoint: String,
    client: reqwest::Client,
}

impl AssistantClient {
    /// Create a client with a bounded wait per request
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()
            .context("Failed to create HTTP client for AssistantClient")?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Ask the backend, absorbing every failure into the apology
    ///
    /// Returns `None` only when the backend answered successfully without a
    /// reply.
    #[instrument(skip(self, utterance, recent), fields(context_turns = recent.len()))]
    pub async fn ask(&self, utterance: &str, recent: &[ConversationTurn]) -> Option<String> {
        let message = context_message(utterance, recent);

        match self.send(&message).await {
            Ok(Some(reply)) => {
                info!(chars = reply.len(), "assistant replied");
                Some(reply)
            }
            Ok(None) => {
                warn!("assistant response carried no reply");
                None
            }
            Err(e) => {
                warn!(error = %e, "assistant call failed, using apology");
                Some(APOLOGY.to_string())
            }
        }
    }

    async fn send(&self, message: &str) -> Result<Option<String>, RemoteError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AssistantRequest { message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: AssistantResponse = serde_json::from_str(&body)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;

        Ok(parsed.reply.filter(|reply| !reply.is_empty()))
    }
}

/// Prefix the utterance with recent turns, oldest first
pub fn context_message(utterance: &str, recent: &[ConversationTurn]) -> String {
    if recent.is_empty() {
        return utterance.to_string();
    }

    let history = recent
        .iter()
        .map(|turn| format!("User: {}\nAssistant: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{history}\n\nUser: {utterance}")
}
