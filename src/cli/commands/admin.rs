//! Admin provisioning command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, Provisioned, SeaOrmAuthService};

pub async fn cmd_create_admin(config: &Config, username: &str, password: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let auth = SeaOrmAuthService::new(store, config.security.clone());

    match auth.ensure_admin(username, password).await {
        Ok(Provisioned::Created) => println!("✓ Admin account '{username}' created."),
        Ok(Provisioned::AlreadyPresent) => {
            println!("User '{username}' already exists, nothing changed.");
        }
        Err(e) => anyhow::bail!("Failed to create admin: {e}"),
    }

    Ok(())
}
