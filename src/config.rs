use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Secret used when none is configured. Only acceptable in development mode.
pub const DEV_SESSION_SECRET: &str = "collegecms-development-session-secret";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub email: EmailConfig,

    pub newsletter: NewsletterConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Development,
    #[default]
    Production,
}

impl RunMode {
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Development mode enables the plaintext-password and bootstrap-admin
    /// escape hatches. Never run production traffic with it.
    pub mode: RunMode,

    /// Argon2 memory cost in KiB
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    /// Credentials accepted without a database row in development mode.
    pub bootstrap_admin: BootstrapAdminConfig,

    /// Admin account created (hashed) at startup when it does not exist yet.
    pub initial_admin: Option<InitialAdminConfig>,

    /// Minimum accepted length for new passwords
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub password: String,
}

impl Default for BootstrapAdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialAdminConfig {
    pub username: String,
    pub password: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::Production,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            bootstrap_admin: BootstrapAdminConfig::default(),
            initial_admin: None,
            min_password_length: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Emit logs as JSON lines instead of the human readable format
    pub json_logs: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            json_logs: false,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Sessions expire after this many minutes without activity
    pub session_ttl_minutes: i64,

    /// Signs the session cookie. Required (at least 32 chars) in production.
    pub session_secret: Option<String>,

    /// How often expired sessions are purged from the database
    pub session_cleanup_interval_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
            ],
            secure_cookies: true,
            session_ttl_minutes: 60 * 24 * 7,
            session_secret: None,
            session_cleanup_interval_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads, 0 uses the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,

    /// Populate empty content tables with demo records on startup
    pub seed_demo_content: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/collegecms.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
            seed_demo_content: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// `SendGrid` API key. Without it no email is sent and newsletter
    /// dispatch is refused.
    pub api_key: Option<String>,

    pub from_address: String,

    pub api_base_url: String,

    /// Base used to build the public unsubscribe links
    pub public_base_url: String,

    pub request_timeout_seconds: u64,

    /// Delivery attempts per queued transactional email
    pub max_attempts: u32,

    pub retry_base_delay_ms: u64,

    pub outbox_capacity: usize,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from_address: "noreply@college.example".to_string(),
            api_base_url: "https://api.sendgrid.com".to_string(),
            public_base_url: "http://localhost:5000".to_string(),
            request_timeout_seconds: 15,
            max_attempts: 3,
            retry_base_delay_ms: 500,
            outbox_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsletterConfig {
    /// Deliveries in flight at once. 1 sends strictly one after another.
    pub concurrency: usize,
}

impl Default for NewsletterConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        for path in &Self::config_paths() {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Environment variables win over the config file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Some(secret) = lookup("SESSION_SECRET") {
            self.server.session_secret = Some(secret);
        }
        if let Some(key) = lookup("SENDGRID_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.email.api_key = Some(key);
        }
        if let Some(from) = lookup("EMAIL_FROM") {
            self.email.from_address = from;
        }
        if let Some(public_url) = lookup("PUBLIC_URL") {
            self.email.public_base_url = public_url;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %port, "Ignoring invalid PORT"),
            }
        }
        if let Some(mode) = lookup("APP_ENV") {
            match RunMode::parse(&mode) {
                Some(mode) => self.security.mode = mode,
                None => warn!(value = %mode, "Ignoring unknown APP_ENV"),
            }
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("collegecms").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".collegecms").join("config.toml"));
        }

        paths
    }

    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            Self::default().save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.email.public_base_url).with_context(|| {
            format!(
                "email.public_base_url is not a valid URL: {}",
                self.email.public_base_url
            )
        })?;

        if self.newsletter.concurrency == 0 {
            anyhow::bail!("newsletter.concurrency must be at least 1");
        }

        if self.server.session_ttl_minutes <= 0 {
            anyhow::bail!("server.session_ttl_minutes must be positive");
        }

        if !self.security.mode.is_development() {
            match self.server.session_secret.as_deref() {
                Some(secret) if secret.len() >= 32 => {}
                _ => anyhow::bail!(
                    "A session secret of at least 32 characters is required in production"
                ),
            }
        }

        Ok(())
    }

    /// The configured session secret, falling back to a fixed development value.
    #[must_use]
    pub fn session_secret(&self) -> &str {
        self.server
            .session_secret
            .as_deref()
            .unwrap_or(DEV_SESSION_SECRET)
    }

    /// Public unsubscribe link for a subscriber token.
    #[must_use]
    pub fn unsubscribe_url(&self, token: &str) -> String {
        self.email.unsubscribe_url(token)
    }
}

impl EmailConfig {
    #[must_use]
    pub fn unsubscribe_url(&self, token: &str) -> String {
        format!(
            "{}/api/unsubscribe/{token}",
            self.public_base_url.trim_end_matches('/')
        )
    }
}
