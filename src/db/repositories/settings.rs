use anyhow::{Context, Result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::entities::{prelude::*, settings};

pub const LOGO_URL_KEY: &str = "logo_url";

/// Key/value site settings.
pub struct SettingsRepository {
    conn: DatabaseConnection,
}

impl SettingsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = Settings::find_by_id(key.to_string())
            .one(&self.conn)
            .await
            .with_context(|| format!("Failed to read setting {key}"))?;

        Ok(row.and_then(|r| r.value))
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let model = settings::ActiveModel {
            key: Set(key.to_string()),
            value: Set(Some(value.to_string())),
        };

        Settings::insert(model)
            .on_conflict(
                OnConflict::column(settings::Column::Key)
                    .update_column(settings::Column::Value)
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .with_context(|| format!("Failed to write setting {key}"))?;

        Ok(())
    }
}
