//! Outbound email: the [`Mailer`] seam and the message templates.

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::borrow::Cow;
use thiserror::Error;

const SITE_NAME: &str = "College of Art and Design";

const FRAME_OPEN: &str = r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; border: 1px solid #eaeaea; border-radius: 5px;">"#;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Email transport failed: {0}")]
    Transport(String),

    #[error("Email provider rejected the message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Email delivery is not configured")]
    NotConfigured,
}

impl MailError {
    /// Transport failures, throttling and provider-side errors may succeed later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::NotConfigured => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers a single message. One call is one delivery attempt.
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailKind {
    Welcome {
        name: Option<String>,
    },
    /// `content` is admin-authored HTML and is inserted verbatim.
    Newsletter {
        subject: String,
        content: String,
        unsubscribe_url: String,
    },
    UnsubscribeConfirmation,
}

impl EmailKind {
    #[must_use]
    pub fn subject(&self) -> String {
        match self {
            Self::Welcome { .. } => format!("Welcome to the {SITE_NAME} newsletter"),
            Self::Newsletter { subject, .. } => subject.clone(),
            Self::UnsubscribeConfirmation => {
                format!("You have been unsubscribed from the {SITE_NAME} newsletter")
            }
        }
    }

    #[must_use]
    pub fn render_html(&self) -> String {
        match self {
            Self::Welcome { name } => {
                let greeting: Cow<'_, str> = name
                    .as_deref()
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .map_or(Cow::Borrowed("there"), |n| encode_text(n));
                format!(
                    "{FRAME_OPEN}\
                     <h1 style=\"color: #4f46e5; text-align: center;\">Welcome to the {SITE_NAME} Newsletter</h1>\
                     <p>Hello {greeting},</p>\
                     <p>Thank you for subscribing. You will hear from us about upcoming exhibitions and events, \
                     new courses and programs, student and alumni news, and campus announcements.</p>\
                     <p>Every email we send includes a link to unsubscribe.</p>\
                     <p>Best regards,<br>The {SITE_NAME} Team</p>\
                     </div>"
                )
            }
            Self::Newsletter {
                subject,
                content,
                unsubscribe_url,
            } => {
                let heading: Cow<'_, str> = if subject.trim().is_empty() {
                    "Latest Updates".into()
                } else {
                    encode_text(subject)
                };
                let link = encode_double_quoted_attribute(unsubscribe_url);
                format!(
                    "{FRAME_OPEN}\
                     <h1 style=\"color: #4f46e5; text-align: center;\">{SITE_NAME} Newsletter</h1>\
                     <h2>{heading}</h2>\
                     {content}\
                     <div style=\"margin-top: 30px; padding-top: 20px; border-top: 1px solid #eaeaea; font-size: 12px; color: #666;\">\
                     <p>You are receiving this email because you subscribed to the {SITE_NAME} newsletter.</p>\
                     <p>If you no longer wish to receive these emails, you can <a href=\"{link}\">unsubscribe here</a>.</p>\
                     </div></div>"
                )
            }
            Self::UnsubscribeConfirmation => format!(
                "{FRAME_OPEN}\
                 <h1 style=\"color: #4f46e5; text-align: center;\">Unsubscribe Confirmation</h1>\
                 <p>Hello,</p>\
                 <p>You have been unsubscribed from the {SITE_NAME} newsletter.</p>\
                 <p>If this was a mistake, you can subscribe again from our website.</p>\
                 <p>Best regards,<br>The {SITE_NAME} Team</p>\
                 </div>"
            ),
        }
    }

    #[must_use]
    pub fn to_email(&self, to: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.to_string(),
            subject: self.subject(),
            html: self.render_html(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_escapes_name() {
        let html = EmailKind::Welcome {
            name: Some("<script>x</script>".to_string()),
        }
        .render_html();

        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_welcome_without_name() {
        let html = EmailKind::Welcome { name: None }.render_html();
        assert!(html.contains("Hello there,"));
    }

    #[test]
    fn test_newsletter_keeps_body_html_and_link() {
        let email = EmailKind::Newsletter {
            subject: "Spring <Show>".to_string(),
            content: "<p>See you there</p>".to_string(),
            unsubscribe_url: "http://localhost:5000/api/unsubscribe/abc".to_string(),
        }
        .to_email("reader@college.example");

        assert_eq!(email.subject, "Spring <Show>");
        assert!(email.html.contains("<p>See you there</p>"));
        assert!(email.html.contains("Spring &lt;Show&gt;"));
        assert!(email.html.contains("href=\"http://localhost:5000/api/unsubscribe/abc\""));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(MailError::Transport("timeout".into()).is_retryable());
        assert!(
            MailError::Rejected {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !MailError::Rejected {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
    }
}
