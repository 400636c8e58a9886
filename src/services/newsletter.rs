//! Newsletter fan-out across subscribers with per-recipient accounting.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::db::Store;
use crate::models::subscriber::Subscriber;
use crate::services::email::{EmailKind, Mailer};

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Email delivery is not configured")]
    DependencyUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for NewsletterError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterRequest {
    pub subject: String,
    /// HTML body
    pub content: String,
    /// Explicit recipients. Empty or absent means every active subscriber.
    #[serde(default, alias = "recipientIds")]
    pub recipient_ids: Option<Vec<i32>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<DeliveryFailure>,
}

pub struct NewsletterDispatcher {
    store: Store,
    mailer: Option<Arc<dyn Mailer>>,
    email: EmailConfig,
    concurrency: usize,
}

impl NewsletterDispatcher {
    #[must_use]
    pub fn new(
        store: Store,
        mailer: Option<Arc<dyn Mailer>>,
        email: EmailConfig,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            mailer,
            email,
            concurrency: concurrency.max(1),
        }
    }

    /// Sends one newsletter pass. Every recipient gets exactly one delivery
    /// attempt; a failed recipient is recorded in the report and never stops
    /// the others.
    pub async fn send(&self, request: &NewsletterRequest) -> Result<DispatchReport, NewsletterError> {
        if request.subject.trim().is_empty() || request.content.trim().is_empty() {
            return Err(NewsletterError::BadRequest(
                "Subject and content are required".to_string(),
            ));
        }

        let Some(mailer) = self.mailer.clone() else {
            return Err(NewsletterError::DependencyUnavailable);
        };

        let recipients = self
            .recipients(request.recipient_ids.as_deref().unwrap_or_default())
            .await?;
        if recipients.is_empty() {
            return Err(NewsletterError::BadRequest(
                "No active subscribers found".to_string(),
            ));
        }

        let total = recipients.len();
        info!(total, concurrency = self.concurrency, "Dispatching newsletter");

        let subject: Arc<str> = Arc::from(request.subject.as_str());
        let content: Arc<str> = Arc::from(request.content.as_str());
        let jobs: Vec<(Subscriber, Option<String>)> = recipients
            .into_iter()
            .map(|subscriber| {
                let url = subscriber
                    .unsubscribe_token
                    .as_deref()
                    .map(|token| self.email.unsubscribe_url(token));
                (subscriber, url)
            })
            .collect();

        let outcomes: Vec<Result<(), DeliveryFailure>> = stream::iter(jobs)
            .map(|(subscriber, unsubscribe_url)| {
                deliver(
                    Arc::clone(&mailer),
                    Arc::clone(&subject),
                    Arc::clone(&content),
                    subscriber,
                    unsubscribe_url,
                )
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = DispatchReport {
            total,
            ..DispatchReport::default()
        };
        for outcome in outcomes {
            match outcome {
                Ok(()) => report.sent += 1,
                Err(failure) => {
                    report.failed += 1;
                    report.errors.push(failure);
                }
            }
        }

        info!(
            total = report.total,
            sent = report.sent,
            failed = report.failed,
            "Newsletter dispatch finished"
        );
        Ok(report)
    }

    /// Explicit ids are narrowed to active subscribers.
    async fn recipients(&self, ids: &[i32]) -> Result<Vec<Subscriber>, NewsletterError> {
        let repo = self.store.subscriber_repo();
        if ids.is_empty() {
            return Ok(repo.list_active().await?);
        }

        let mut picked = repo.list_by_ids(ids).await?;
        picked.retain(|s| s.is_active);
        Ok(picked)
    }
}

async fn deliver(
    mailer: Arc<dyn Mailer>,
    subject: Arc<str>,
    content: Arc<str>,
    subscriber: Subscriber,
    unsubscribe_url: Option<String>,
) -> Result<(), DeliveryFailure> {
    let Some(unsubscribe_url) = unsubscribe_url else {
        metrics::counter!("newsletter_deliveries_total", "outcome" => "skipped").increment(1);
        return Err(DeliveryFailure {
            email: subscriber.email,
            reason: "Subscriber has no unsubscribe token".to_string(),
        });
    };

    let email = EmailKind::Newsletter {
        subject: subject.to_string(),
        content: content.to_string(),
        unsubscribe_url,
    }
    .to_email(&subscriber.email);

    match mailer.send(&email).await {
        Ok(()) => {
            metrics::counter!("newsletter_deliveries_total", "outcome" => "sent").increment(1);
            Ok(())
        }
        Err(e) => {
            metrics::counter!("newsletter_deliveries_total", "outcome" => "failed").increment(1);
            warn!(subscriber_id = subscriber.id, error = %e, "Newsletter delivery failed");
            Err(DeliveryFailure {
                email: subscriber.email,
                reason: e.to_string(),
            })
        }
    }
}
