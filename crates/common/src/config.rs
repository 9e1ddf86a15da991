//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Outgoing e-mail configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Notification fan-out limits.
    #[serde(default)]
    pub notification: NotificationConfig,
    /// In-process job queue sizing.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Admin dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this site, used in outgoing links.
    pub url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis keys.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Where cached values live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Shared Redis instance.
    #[default]
    Redis,
    /// Process memory; only for single-node setups and tests.
    Memory,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: CacheBackend,
    /// TTL of cached site-info rows.
    #[serde(default = "default_site_info_ttl")]
    pub site_info_ttl_secs: u64,
    /// TTL of the dashboard statistics block.
    #[serde(default = "default_dashboard_ttl")]
    pub dashboard_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            site_info_ttl_secs: default_site_info_ttl(),
            dashboard_ttl_secs: default_dashboard_ttl(),
        }
    }
}

impl CacheConfig {
    /// Site-info TTL as a [`Duration`].
    #[must_use]
    pub const fn site_info_ttl(&self) -> Duration {
        Duration::from_secs(self.site_info_ttl_secs)
    }

    /// Dashboard TTL as a [`Duration`].
    #[must_use]
    pub const fn dashboard_ttl(&self) -> Duration {
        Duration::from_secs(self.dashboard_ttl_secs)
    }
}

/// How rendered mails leave the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailDeliveryMode {
    /// Send over SMTP from the notification worker.
    #[default]
    Inline,
    /// Push onto the durable Redis job queue.
    Redis,
}

/// Outgoing e-mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP host. Mail is disabled when unset.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// Sender address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// SMTP timeout in seconds.
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
    /// Delivery mode.
    #[serde(default)]
    pub delivery: MailDeliveryMode,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            from_address: default_from_address(),
            from_name: default_from_name(),
            timeout_secs: default_smtp_timeout(),
            delivery: MailDeliveryMode::default(),
        }
    }
}

impl EmailConfig {
    /// Whether an SMTP server is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.smtp_host.as_deref().is_some_and(|h| !h.is_empty())
    }
}

/// Notification fan-out limits.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// New-question mails a user may receive per window.
    #[serde(default = "default_new_question_limit")]
    pub new_question_limit: i64,
    /// Length of the rate limit window in seconds.
    #[serde(default = "default_new_question_window")]
    pub new_question_window_secs: u64,
    /// Lifetime of unsubscribe codes in seconds.
    #[serde(default = "default_unsubscribe_ttl")]
    pub unsubscribe_ttl_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            new_question_limit: default_new_question_limit(),
            new_question_window_secs: default_new_question_window(),
            unsubscribe_ttl_secs: default_unsubscribe_ttl(),
        }
    }
}

/// In-process job queue sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Jobs processed concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Channel capacity; producers wait when full.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            capacity: default_capacity(),
        }
    }
}

/// Admin dashboard settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardConfig {
    /// Endpoint returning the latest released version.
    #[serde(default = "default_version_check_url")]
    pub version_check_url: String,
    /// Timeout for the version check in seconds.
    #[serde(default = "default_version_check_timeout")]
    pub version_check_timeout_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            version_check_url: default_version_check_url(),
            version_check_timeout_secs: default_version_check_timeout(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_max_connections() -> u32 {
    50
}

const fn default_min_connections() -> u32 {
    5
}

fn default_redis_prefix() -> String {
    "agora".to_string()
}

const fn default_site_info_ttl() -> u64 {
    60 * 60
}

const fn default_dashboard_ttl() -> u64 {
    60
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "noreply@localhost".to_string()
}

fn default_from_name() -> String {
    "Agora".to_string()
}

const fn default_smtp_timeout() -> u64 {
    10
}

const fn default_new_question_limit() -> i64 {
    3
}

const fn default_new_question_window() -> u64 {
    7 * 24 * 60 * 60
}

const fn default_unsubscribe_ttl() -> u64 {
    24 * 60 * 60
}

const fn default_workers() -> usize {
    4
}

const fn default_capacity() -> usize {
    1000
}

fn default_version_check_url() -> String {
    "https://getlatest.answer.dev/".to_string()
}

const fn default_version_check_timeout() -> u64 {
    15
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `AGORA_ENV`)
    /// 4. Environment variables with `AGORA__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("AGORA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AGORA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("AGORA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
