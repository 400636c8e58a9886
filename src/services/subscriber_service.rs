//! Domain service for newsletter subscriptions.

use serde::Serialize;
use thiserror::Error;

use crate::models::subscriber::{Subscriber, SubscriberProfile};

#[derive(Debug, Error)]
pub enum SubscriberError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Email is already subscribed")]
    AlreadySubscribed,

    #[error("Already unsubscribed")]
    AlreadyUnsubscribed,

    #[error("Invalid unsubscribe token")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for SubscriberError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscribeOutcome {
    Created,
    Reactivated,
}

#[async_trait::async_trait]
pub trait SubscriberService: Send + Sync {
    /// Creates a subscription, or reactivates a previously cancelled one in
    /// place with the new profile.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriberError::AlreadySubscribed`] when an active
    /// subscription exists for the address.
    async fn subscribe(
        &self,
        email: &str,
        profile: SubscriberProfile,
    ) -> Result<(Subscriber, SubscribeOutcome), SubscriberError>;

    /// Deactivates the subscriber holding `token`.
    async fn unsubscribe(&self, token: &str) -> Result<Subscriber, SubscriberError>;

    async fn list_all(&self) -> Result<Vec<Subscriber>, SubscriberError>;
}
