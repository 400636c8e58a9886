use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{Checks, FieldError, Validate};
use crate::entities::subscribers;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscriber {
    pub id: i32,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub interests: Vec<String>,
    pub is_active: bool,
    #[serde(skip_serializing)]
    pub unsubscribe_token: Option<String>,
    pub subscription_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<subscribers::Model> for Subscriber {
    fn from(model: subscribers::Model) -> Self {
        let interests = model
            .interests
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        Self {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            interests,
            is_active: model.is_active,
            unsubscribe_token: model.unsubscribe_token,
            subscription_date: model.subscription_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Optional details supplied with a subscription.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriberProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
}

impl SubscriberProfile {
    #[must_use]
    pub fn encoded_interests(&self) -> Option<String> {
        if self.interests.is_empty() {
            None
        } else {
            serde_json::to_string(&self.interests).ok()
        }
    }
}

/// Lower-cased, trimmed form used for storage and lookups.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
    #[serde(flatten)]
    pub profile: SubscriberProfile,
}

impl Validate for SubscribeRequest {
    fn validate(&self) -> Vec<FieldError> {
        Checks::new()
            .email("email", &self.email)
            .max_len("first_name", self.profile.first_name.as_deref(), 100)
            .max_len("last_name", self.profile.last_name.as_deref(), 100)
            .check(
                "interests",
                self.profile.interests.len() <= 20,
                "must list at most 20 interests",
            )
            .finish()
    }
}
