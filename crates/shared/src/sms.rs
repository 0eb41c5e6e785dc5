//! SMS transport over the Vonage REST API.
//!
//! Sending never fails: every problem is reported through [`SmsOutcome`].

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SmsConfig;

/// Result of an SMS attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsOutcome {
    /// Whether the provider accepted the message.
    pub ok: bool,
    /// Provider message or the reason nothing was sent.
    pub detail: String,
}

impl SmsOutcome {
    fn sent(detail: impl Into<String>) -> Self {
        Self {
            ok: true,
            detail: detail.into(),
        }
    }

    fn not_sent(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: detail.into(),
        }
    }
}

/// Normalizes a phone number to E.164.
///
/// Spaces and hyphens are removed. A leading `+` is kept as is, a leading
/// `00` becomes `+`, and anything else gets `default_cc` prepended. The last
/// rule also applies to numbers that are not domestic mobiles, so the result
/// is only shaped like E.164, not validated.
#[must_use]
pub fn normalize_phone(raw: &str, default_cc: &str) -> Option<String> {
    let n: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();
    if n.is_empty() {
        return None;
    }

    if n.starts_with('+') {
        return Some(n);
    }

    if let Some(rest) = n.strip_prefix("00") {
        return Some(format!("+{rest}"));
    }

    // Domestic mobile: nine digits starting with 9.
    if n.len() == 9 && n.starts_with('9') {
        return Some(format!("{default_cc}{n}"));
    }

    Some(format!("{default_cc}{n}"))
}

#[derive(Debug, Deserialize)]
struct VonageResponse {
    #[serde(default)]
    messages: Vec<VonageMessage>,
}

#[derive(Debug, Deserialize)]
struct VonageMessage {
    status: String,
    #[serde(rename = "error-text")]
    error_text: Option<String>,
    #[serde(rename = "message-id")]
    message_id: Option<String>,
}

/// SMS service backed by Vonage.
#[derive(Clone)]
pub struct SmsService {
    config: SmsConfig,
    client: reqwest::Client,
}

impl SmsService {
    /// Creates a new SMS service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SmsConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Sends `text` to `to`.
    pub async fn send_sms(&self, to: &str, text: &str) -> SmsOutcome {
        if !self.config.enabled {
            return SmsOutcome::not_sent("SMS disabled by configuration");
        }

        let Some((api_key, api_secret, from)) = self.config.credentials() else {
            return SmsOutcome::not_sent("incomplete SMS provider credentials");
        };

        let Some(number) = normalize_phone(to, &self.config.default_country_code) else {
            return SmsOutcome::not_sent("invalid destination number");
        };

        let params = [
            ("api_key", api_key),
            ("api_secret", api_secret),
            ("from", from),
            ("to", number.trim_start_matches('+')),
            ("text", text),
        ];

        let response = match self
            .client
            .post(&self.config.api_url)
            .form(&params)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
        {
            Ok(response) => response,
            Err(e) => {
                warn!(to = %number, error = %e, "SMS request failed");
                return SmsOutcome::not_sent(e.to_string());
            }
        };

        match response.json::<VonageResponse>().await {
            Ok(body) => Self::interpret(&number, &body),
            Err(e) => {
                warn!(to = %number, error = %e, "SMS provider returned an unreadable body");
                SmsOutcome::not_sent(e.to_string())
            }
        }
    }

    fn interpret(number: &str, body: &VonageResponse) -> SmsOutcome {
        let Some(first) = body.messages.first() else {
            return SmsOutcome::not_sent("empty provider response");
        };

        if first.status == "0" {
            debug!(to = %number, message_id = ?first.message_id, "SMS sent");
            SmsOutcome::sent("SMS sent")
        } else {
            let detail = first
                .error_text
                .clone()
                .unwrap_or_else(|| format!("provider status {}", first.status));
            warn!(to = %number, status = %first.status, detail = %detail, "SMS rejected");
            SmsOutcome::not_sent(detail)
        }
    }
}
