use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors
///
/// These are the only failures that stop the process at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// API credentials exchanged for an access token every cycle
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields present
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Agent configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | BASE_URL | (required) | Backend base URL |
/// | AUTH_URL | {BASE_URL}/api/token/ | Credential exchange endpoint |
/// | ORDERS_URL | {BASE_URL}/api/orders/unprinted/ | Pending orders endpoint |
/// | UPDATE_ORDER_URL | {BASE_URL}/api/orders/printed/ | Acknowledge prefix, order id appended |
/// | SERVER_HEALTH_URL | {BASE_URL}/api/health/ | Backend reachability probe |
/// | CHECK_INTERNET_URL | https://www.google.com | Internet reachability probe |
/// | PRINTER_IP | (required) | Printer IP address or host name |
/// | PRINTER_PORT | 9100 | Printer raw TCP port |
/// | API_USERNAME / API_PASSWORD | empty | Backend credentials |
/// | MAX_ATTEMPTS | 3 | Retry budget for auth, print and acknowledge |
/// | RETRY_DELAY | 2 | Seconds between retries |
/// | LINE_WIDTH | 48 | Receipt width in characters |
/// | POLL_INTERVAL | 20 | Seconds between cycles |
/// | REQUEST_TIMEOUT | 10 | HTTP timeout in seconds |
/// | STOP_TIMEOUT | 5 | Seconds to wait for the worker on stop |
/// | RECEIPT_TITLE | Rodízio Ementa Digital | Receipt title suffix |
/// | LOG_LEVEL | info | Log filter when RUST_LOG is unset |
/// | LOG_JSON | false | JSON console output |
/// | LOG_DIR | (unset) | Directory for the daily log file |
/// | LOG_RETENTION_DAYS | 14 | Days of log files kept |
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub auth_url: String,
    pub orders_url: String,
    pub update_order_url: String,
    pub server_health_url: String,
    pub internet_check_url: String,

    pub printer_host: String,
    pub printer_port: u16,

    pub credentials: Credentials,

    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub line_width: usize,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub stop_timeout: Duration,
    /// Pause between alert pulses
    pub alert_interval: Duration,

    pub receipt_title: String,

    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub log_retention_days: u64,
}

impl Config {
    /// Defaults for everything except the two required values
    pub fn new(base_url: impl Into<String>, printer_host: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            auth_url: format!("{}/api/token/", base_url),
            orders_url: format!("{}/api/orders/unprinted/", base_url),
            update_order_url: format!("{}/api/orders/printed/", base_url),
            server_health_url: format!("{}/api/health/", base_url),
            internet_check_url: "https://www.google.com".into(),
            base_url,
            printer_host: printer_host.into(),
            printer_port: 9100,
            credentials: Credentials::default(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
            line_width: 48,
            poll_interval: Duration::from_secs(20),
            request_timeout: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(5),
            alert_interval: Duration::from_millis(500),
            receipt_title: "Rodízio Ementa Digital".into(),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            log_retention_days: 14,
        }
    }

    /// Load configuration from environment variables
    ///
    /// Call `dotenv::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("BASE_URL").ok_or(ConfigError::Missing("BASE_URL"))?;
        let printer_host = get("PRINTER_IP").ok_or(ConfigError::Missing("PRINTER_IP"))?;
        let mut config = Self::new(base_url, printer_host);

        if let Some(v) = get("AUTH_URL") {
            config.auth_url = v;
        }
        if let Some(v) = get("ORDERS_URL") {
            config.orders_url = v;
        }
        if let Some(v) = get("UPDATE_ORDER_URL") {
            config.update_order_url = v;
        }
        if let Some(v) = get("SERVER_HEALTH_URL") {
            config.server_health_url = v;
        }
        if let Some(v) = get("CHECK_INTERNET_URL") {
            config.internet_check_url = v;
        }
        if let Some(v) = get("RECEIPT_TITLE") {
            config.receipt_title = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v;
        }
        config.log_dir = get("LOG_DIR");

        config.credentials = Credentials::new(
            get("API_USERNAME").unwrap_or_default(),
            get("API_PASSWORD").unwrap_or_default(),
        );

        config.log_json = parse_or(&get, "LOG_JSON", config.log_json)?;
        config.printer_port = parse_or(&get, "PRINTER_PORT", config.printer_port)?;
        config.max_attempts = parse_or(&get, "MAX_ATTEMPTS", config.max_attempts)?;
        config.line_width = parse_or(&get, "LINE_WIDTH", config.line_width)?;
        config.log_retention_days =
            parse_or(&get, "LOG_RETENTION_DAYS", config.log_retention_days)?;
        config.retry_delay = secs_or(&get, "RETRY_DELAY", config.retry_delay)?;
        config.poll_interval = secs_or(&get, "POLL_INTERVAL", config.poll_interval)?;
        config.request_timeout = secs_or(&get, "REQUEST_TIMEOUT", config.request_timeout)?;
        config.stop_timeout = secs_or(&get, "STOP_TIMEOUT", config.stop_timeout)?;

        if config.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_ATTEMPTS",
                value: "0".into(),
            });
        }
        if config.line_width < 16 {
            return Err(ConfigError::Invalid {
                key: "LINE_WIDTH",
                value: config.line_width.to_string(),
            });
        }

        Ok(config)
    }
}

fn parse_or<T, F>(get: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
        }),
        None => Ok(default),
    }
}

fn secs_or<F>(get: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite() && *s >= 0.0)
            .map(Duration::from_secs_f64)
            .ok_or(ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
