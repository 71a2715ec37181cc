use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NotifyError;
use crate::recipient::Recipient;

/// Acknowledgement from the messaging provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageReceipt {
    /// Provider-side message id, when the provider returned one.
    pub message_id: Option<String>,
}

/// Delivers one message to one recipient.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Send `body` to `recipient`. Exactly one attempt; no retries.
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<MessageReceipt, NotifyError>;
}

/// Twilio account settings.
#[derive(Clone)]
pub struct TwilioConfig {
    /// Account SID (`TWILIO_ACCOUNT_SID`).
    pub account_sid: Option<String>,
    /// Auth token (`TWILIO_AUTH_TOKEN`).
    pub auth_token: Option<String>,
    /// Sender address, e.g. `whatsapp:+14155238886`.
    pub from: String,
    /// Prepended to each recipient number to form the `To` address.
    pub channel_prefix: String,
    /// API origin, overridable for tests.
    pub api_base: String,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from: "whatsapp:+14155238886".to_string(),
            channel_prefix: "whatsapp:".to_string(),
            api_base: "https://api.twilio.com".to_string(),
        }
    }
}

impl TwilioConfig {
    /// True when both credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.account_sid.as_deref().is_some_and(|s| !s.is_empty())
            && self.auth_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .field("channel_prefix", &self.channel_prefix)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Sends messages through the Twilio Messages API.
#[derive(Debug, Clone)]
pub struct TwilioSender {
    client: reqwest::Client,
    cfg: TwilioConfig,
}

impl TwilioSender {
    /// Builds a sender whose requests give up after `timeout`.
    pub fn new(cfg: TwilioConfig, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self { client, cfg })
    }

    fn messages_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{account_sid}/Messages.json",
            self.cfg.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl MessageSender for TwilioSender {
    async fn send(&self, recipient: &Recipient, body: &str) -> Result<MessageReceipt, NotifyError> {
        let (Some(sid), Some(token)) = (self.cfg.account_sid.as_deref(), self.cfg.auth_token.as_deref())
        else {
            return Err(NotifyError::NotConfigured {
                reason: "TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN are required".to_string(),
            });
        };

        let to = format!("{}{}", self.cfg.channel_prefix, recipient.as_str());
        let form = [("From", self.cfg.from.as_str()), ("To", to.as_str()), ("Body", body)];

        let response = self
            .client
            .post(self.messages_url(sid))
            .basic_auth(sid, Some(token))
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        // Twilio answers with JSON on success and failure; anything else is opaque.
        let payload: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .or_else(|| status.canonical_reason())
                .unwrap_or("unknown error")
                .to_string();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(MessageReceipt {
            message_id: payload.get("sid").and_then(Value::as_str).map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_the_auth_token() {
        let cfg = TwilioConfig {
            account_sid: Some("AC123".to_string()),
            auth_token: Some("super-secret".to_string()),
            ..TwilioConfig::default()
        };
        let debug = format!("{cfg:?}");
        assert!(debug.contains("AC123"));
        assert!(!debug.contains("super-secret"));
        assert!(cfg.is_configured());
    }

    #[test]
    fn messages_url_ignores_trailing_slash() {
        let sender = TwilioSender::new(
            TwilioConfig {
                api_base: "http://127.0.0.1:9/".to_string(),
                ..TwilioConfig::default()
            },
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            sender.messages_url("AC1"),
            "http://127.0.0.1:9/2010-04-01/Accounts/AC1/Messages.json"
        );
    }

    #[tokio::test]
    async fn send_without_credentials_fails_fast() {
        let sender = TwilioSender::new(TwilioConfig::default(), Duration::from_secs(1)).unwrap();
        let err = sender
            .send(&Recipient::parse("+111").unwrap(), "hola")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured { .. }));
    }
}
