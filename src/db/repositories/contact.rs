use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{contact_messages, prelude::*};
use crate::models::content::NewContactMessage;

/// Messages submitted through the public contact form.
pub struct ContactRepository {
    conn: DatabaseConnection,
}

impl ContactRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(&self, input: NewContactMessage) -> Result<contact_messages::Model> {
        contact_messages::ActiveModel {
            name: Set(input.name),
            email: Set(input.email.trim().to_string()),
            category: Set(input.category),
            subject: Set(input.subject),
            message: Set(input.message),
            is_read: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert contact message")
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<contact_messages::Model>> {
        ContactMessages::find()
            .order_by_desc(contact_messages::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list contact messages")
    }

    /// Returns false when no message has that id.
    pub async fn mark_read(&self, id: i32) -> Result<bool> {
        let result = ContactMessages::update_many()
            .col_expr(contact_messages::Column::IsRead, Expr::value(true))
            .filter(contact_messages::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to mark contact message read")?;

        Ok(result.rows_affected > 0)
    }
}
