use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::sendgrid::SendGridMailer;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, Mailer, NewsletterDispatcher, Outbox, RetryPolicy, SeaOrmAuthService,
    SeaOrmSubscriberService, SubscriberService,
};

/// Services shared by the HTTP layer and the CLI.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub subscriber_service: Arc<dyn SubscriberService>,

    pub newsletter: Arc<NewsletterDispatcher>,

    /// Transactional email queue, absent when no mailer is configured.
    pub outbox: Option<Outbox>,
}

impl SharedState {
    /// Builds the state with the `SendGrid` mailer described by `config.email`.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer = SendGridMailer::from_config(&config.email)
            .map_err(|e| anyhow::anyhow!("Failed to build mail client: {e}"))?
            .map(|m| Arc::new(m) as Arc<dyn Mailer>);

        if mailer.is_none() {
            warn!("No email API key configured, outgoing email is disabled");
        }

        Self::with_mailer(config, mailer).await
    }

    /// Builds the state around an explicit mailer.
    pub async fn with_mailer(
        config: Config,
        mailer: Option<Arc<dyn Mailer>>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        ));
        let subscriber_service: Arc<dyn SubscriberService> =
            Arc::new(SeaOrmSubscriberService::new(store.clone()));

        let newsletter = Arc::new(NewsletterDispatcher::new(
            store.clone(),
            mailer.clone(),
            config.email.clone(),
            config.newsletter.concurrency,
        ));

        let outbox = mailer.map(|mailer| {
            let (outbox, _worker) = Outbox::spawn(
                mailer,
                RetryPolicy::from_config(&config.email),
                config.email.outbox_capacity,
            );
            info!("Email outbox started");
            outbox
        });

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            subscriber_service,
            newsletter,
            outbox,
        })
    }
}
