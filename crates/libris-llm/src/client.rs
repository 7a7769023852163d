use anyhow::{anyhow, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::warn;

use libris_core::settings::LlmSettings;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

pub struct ChatClient {
    client: Client,
    settings: LlmSettings,
}

impl ChatClient {
    pub fn new(settings: LlmSettings) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_millis(settings.timeout_ms)).build()?;
        Ok(Self { client, settings })
    }

    /// One chat turn; returns the assistant message text.
    pub async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}{}", self.settings.api_base, self.settings.path);
        let body = serde_json::json!({
            "model": self.settings.model,
            "temperature": self.settings.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let mut req = self.client.post(url).json(&body);
        if !self.settings.api_key.is_empty() { req = req.bearer_auth(&self.settings.api_key); }
        let json: Value = req.send().await?.error_for_status()?.json().await?;
        completion_content(&json)
    }

    /// Chat turn whose reply must be JSON. Retried up to `max_attempts` times,
    /// backing off exponentially when the service answers 429.
    pub async fn complete_json(&self, prompt: &str) -> Result<Value> {
        let attempts = self.settings.max_attempts.max(1);
        let mut backoff = INITIAL_BACKOFF;
        let mut last_err = anyhow!("no attempt made");
        for attempt in 1..=attempts {
            match self.complete(prompt).await.and_then(|text| parse_json_content(&text)) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt, error = %e, "reasoning call failed");
                    if is_rate_limited(&e) && attempt < attempts {
                        tokio::time::sleep(backoff).await;
                        backoff *= 2;
                    }
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }
}

fn is_rate_limited(err: &anyhow::Error) -> bool {
    err.downcast_ref::<reqwest::Error>().and_then(reqwest::Error::status) == Some(StatusCode::TOO_MANY_REQUESTS)
}

pub fn completion_content(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Completion response is missing message content."))
}

/// Parses model output as JSON, tolerating a surrounding markdown code fence.
pub fn parse_json_content(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim()).map_err(|e| anyhow!("Model reply is not valid JSON: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_first_choice() {
        let json = serde_json::json!({ "choices": [{ "message": { "content": "hilbert spaces" } }] });
        assert_eq!(completion_content(&json).expect("content"), "hilbert spaces");
        assert!(completion_content(&serde_json::json!({})).is_err());
    }

    #[test]
    fn strips_code_fences() {
        let v = parse_json_content("```json\n[{\"id\": 3}]\n```").expect("fenced");
        assert_eq!(v, serde_json::json!([{ "id": 3 }]));
        let v = parse_json_content(" {\"a\": 1} ").expect("bare");
        assert_eq!(v["a"], 1);
        assert!(parse_json_content("not json").is_err());
    }
}
