use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::config::EmailConfig;
use crate::services::email::{MailError, Mailer, OutboundEmail};

#[derive(Debug, Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
    to: [Address<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    personalizations: [Personalization<'a>; 1],
    from: Address<'a>,
    subject: &'a str,
    content: [Content<'a>; 1],
}

/// `SendGrid` v3 mail API client.
#[derive(Clone)]
pub struct SendGridMailer {
    client: Client,
    api_key: String,
    endpoint: String,
    from_address: String,
}

impl SendGridMailer {
    pub fn new(api_key: &str, config: &EmailConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| MailError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            endpoint: format!("{}/v3/mail/send", config.api_base_url.trim_end_matches('/')),
            from_address: config.from_address.clone(),
        })
    }

    /// Builds a mailer when an API key is configured.
    pub fn from_config(config: &EmailConfig) -> Result<Option<Self>, MailError> {
        config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .map(|key| Self::new(key, config))
            .transpose()
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let body = SendRequest {
            personalizations: [Personalization {
                to: [Address { email: &email.to }],
            }],
            from: Address {
                email: &self.from_address,
            },
            subject: &email.subject,
            content: [Content {
                kind: "text/html",
                value: &email.html,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "SendGrid accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let body = SendRequest {
            personalizations: [Personalization {
                to: [Address {
                    email: "a@college.example",
                }],
            }],
            from: Address {
                email: "noreply@college.example",
            },
            subject: "Hello",
            content: [Content {
                kind: "text/html",
                value: "<p>Hi</p>",
            }],
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "a@college.example");
        assert_eq!(json["content"][0]["type"], "text/html");
    }

    #[test]
    fn test_from_config_requires_key() {
        let mut config = EmailConfig::default();
        assert!(SendGridMailer::from_config(&config).unwrap().is_none());

        config.api_key = Some("SG.key".to_string());
        let mailer = SendGridMailer::from_config(&config).unwrap().unwrap();
        assert_eq!(mailer.endpoint, "https://api.sendgrid.com/v3/mail/send");
    }
}
