use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::is_unique_violation;
use crate::entities::{prelude::*, subscribers};
use crate::models::subscriber::{Subscriber, SubscriberProfile};

pub struct SubscriberRepository {
    conn: DatabaseConnection,
}

impl SubscriberRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let row = Subscribers::find()
            .filter(subscribers::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query subscriber by email")?;

        Ok(row.map(Subscriber::from))
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<Subscriber>> {
        let row = Subscribers::find()
            .filter(subscribers::Column::UnsubscribeToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query subscriber by token")?;

        Ok(row.map(Subscriber::from))
    }

    /// Flips an inactive row for `email` back to active in one statement,
    /// replacing its profile. `fallback_token` is only stored when the row
    /// has no token yet. Returns `None` when no inactive row matched.
    pub async fn reactivate(
        &self,
        email: &str,
        profile: &SubscriberProfile,
        fallback_token: &str,
    ) -> Result<Option<Subscriber>> {
        let token: SimpleExpr = Func::coalesce([
            SimpleExpr::from(Expr::col(subscribers::Column::UnsubscribeToken)),
            Expr::val(fallback_token).into(),
        ])
        .into();

        let result = Subscribers::update_many()
            .col_expr(subscribers::Column::IsActive, Expr::value(true))
            .col_expr(
                subscribers::Column::FirstName,
                Expr::value(profile.first_name.clone()),
            )
            .col_expr(
                subscribers::Column::LastName,
                Expr::value(profile.last_name.clone()),
            )
            .col_expr(
                subscribers::Column::Interests,
                Expr::value(profile.encoded_interests()),
            )
            .col_expr(subscribers::Column::UnsubscribeToken, token)
            .col_expr(subscribers::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(subscribers::Column::Email.eq(email))
            .filter(subscribers::Column::IsActive.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to reactivate subscriber")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        self.get_by_email(email).await
    }

    /// Inserts an active subscriber. Returns `None` when the email is already taken.
    pub async fn insert(
        &self,
        email: &str,
        profile: &SubscriberProfile,
        token: &str,
    ) -> Result<Option<Subscriber>> {
        let now = Utc::now();
        let active = subscribers::ActiveModel {
            email: Set(email.to_string()),
            first_name: Set(profile.first_name.clone()),
            last_name: Set(profile.last_name.clone()),
            interests: Set(profile.encoded_interests()),
            subscription_date: Set(now),
            is_active: Set(true),
            unsubscribe_token: Set(Some(token.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(Subscriber::from(model))),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e).context("Failed to insert subscriber"),
        }
    }

    /// Deactivates the active subscriber holding `token`. Returns false when
    /// nothing changed, either because the token is unknown or the row is
    /// already inactive.
    pub async fn deactivate_by_token(&self, token: &str) -> Result<bool> {
        let result = Subscribers::update_many()
            .col_expr(subscribers::Column::IsActive, Expr::value(false))
            .col_expr(subscribers::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(subscribers::Column::UnsubscribeToken.eq(token))
            .filter(subscribers::Column::IsActive.eq(true))
            .exec(&self.conn)
            .await
            .context("Failed to deactivate subscriber")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_active(&self) -> Result<Vec<Subscriber>> {
        let rows = Subscribers::find()
            .filter(subscribers::Column::IsActive.eq(true))
            .order_by_asc(subscribers::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list active subscribers")?;

        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    pub async fn list_by_ids(&self, ids: &[i32]) -> Result<Vec<Subscriber>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = Subscribers::find()
            .filter(subscribers::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(subscribers::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query subscribers by IDs")?;

        Ok(rows.into_iter().map(Subscriber::from).collect())
    }

    pub async fn list_all(&self) -> Result<Vec<Subscriber>> {
        let rows = Subscribers::find()
            .order_by_desc(subscribers::Column::SubscriptionDate)
            .all(&self.conn)
            .await
            .context("Failed to list subscribers")?;

        Ok(rows.into_iter().map(Subscriber::from).collect())
    }
}
