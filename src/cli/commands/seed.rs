//! Demo content command handler

use crate::config::Config;
use crate::db::Store;
use crate::services::seed_demo_content;

pub async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;

    if seed_demo_content(&store).await? {
        println!("✓ Demo content added.");
    } else {
        println!("Content already present, nothing seeded.");
    }

    Ok(())
}
