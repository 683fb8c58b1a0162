//! Outbound message types and wire payload construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied message body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    /// Plain text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Rich embed objects, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Value>>,
}

impl WebhookMessage {
    /// Creates a text message.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: None,
        }
    }

    /// Sets the embeds.
    pub fn embeds(mut self, embeds: Vec<Value>) -> Self {
        self.embeds = Some(embeds);
        self
    }
}

/// Per-send presentation overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendOptions {
    /// Display name override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Avatar URL override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Text-to-speech flag. Unset means false on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tts: Option<bool>,
}

impl SendOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the display name override.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the avatar URL override.
    pub fn avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Sets the text-to-speech flag.
    pub fn tts(mut self, tts: bool) -> Self {
        self.tts = Some(tts);
        self
    }
}

/// JSON body posted to the remote endpoint.
///
/// Unset fields are skipped entirely; receivers reject explicit nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embeds: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub tts: bool,
}

impl WebhookPayload {
    /// Builds the wire payload from a message and its options.
    pub fn build(message: &WebhookMessage, options: &SendOptions) -> Self {
        Self {
            content: message.content.clone(),
            embeds: message.embeds.clone(),
            username: options.username.clone(),
            avatar_url: options.avatar_url.clone(),
            tts: options.tts.unwrap_or(false),
        }
    }

    /// Serializes into a JSON value.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
