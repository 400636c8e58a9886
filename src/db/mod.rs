use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::contact::ContactRepository;
pub use repositories::content::ContentRepository;
pub use repositories::settings::SettingsRepository;
pub use repositories::subscriber::SubscriberRepository;
pub use repositories::user::UserRepository;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = sqlite_file_path(db_url);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to an in-memory database would otherwise
        // see its own empty schema.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn subscriber_repo(&self) -> SubscriberRepository {
        SubscriberRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn content_repo(&self) -> ContentRepository {
        ContentRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn contact_repo(&self) -> ContactRepository {
        ContactRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn settings_repo(&self) -> SettingsRepository {
        SettingsRepository::new(self.conn.clone())
    }
}

/// Strips the scheme and any query string from a sqlite URL.
fn sqlite_file_path(db_url: &str) -> &str {
    let path = db_url
        .strip_prefix("sqlite://")
        .or_else(|| db_url.strip_prefix("sqlite:"))
        .unwrap_or(db_url);

    path.split_once('?').map_or(path, |(file, _)| file)
}

/// True when the database rejected a write because of a unique index.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
