//! `SeaORM` implementation of the `SubscriberService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::db::Store;
use crate::models::subscriber::{Subscriber, SubscriberProfile, normalize_email};
use crate::models::validation::is_valid_email;
use crate::services::subscriber_service::{SubscribeOutcome, SubscriberError, SubscriberService};

pub struct SeaOrmSubscriberService {
    store: Store,
}

impl SeaOrmSubscriberService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

/// 32 random bytes from the OS-seeded CSPRNG, hex encoded.
#[must_use]
pub fn generate_unsubscribe_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[async_trait]
impl SubscriberService for SeaOrmSubscriberService {
    async fn subscribe(
        &self,
        email: &str,
        profile: SubscriberProfile,
    ) -> Result<(Subscriber, SubscribeOutcome), SubscriberError> {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(SubscriberError::InvalidEmail);
        }

        let repo = self.store.subscriber_repo();
        let token = generate_unsubscribe_token();

        if let Some(subscriber) = repo.reactivate(&email, &profile, &token).await? {
            info!(subscriber_id = subscriber.id, "Subscription reactivated");
            return Ok((subscriber, SubscribeOutcome::Reactivated));
        }

        if let Some(subscriber) = repo.insert(&email, &profile, &token).await? {
            info!(subscriber_id = subscriber.id, "Subscription created");
            return Ok((subscriber, SubscribeOutcome::Created));
        }

        // Lost a race with an unsubscribe of the same address.
        if let Some(subscriber) = repo.reactivate(&email, &profile, &token).await? {
            info!(subscriber_id = subscriber.id, "Subscription reactivated");
            return Ok((subscriber, SubscribeOutcome::Reactivated));
        }

        Err(SubscriberError::AlreadySubscribed)
    }

    async fn unsubscribe(&self, token: &str) -> Result<Subscriber, SubscriberError> {
        if token.trim().is_empty() {
            return Err(SubscriberError::NotFound);
        }

        let repo = self.store.subscriber_repo();
        let changed = repo.deactivate_by_token(token).await?;

        match repo.get_by_token(token).await? {
            Some(subscriber) if changed => {
                info!(subscriber_id = subscriber.id, "Unsubscribed");
                Ok(subscriber)
            }
            Some(_) => Err(SubscriberError::AlreadyUnsubscribed),
            None => Err(SubscriberError::NotFound),
        }
    }

    async fn list_all(&self) -> Result<Vec<Subscriber>, SubscriberError> {
        Ok(self.store.subscriber_repo().list_all().await?)
    }
}
