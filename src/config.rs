//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `5000` |
//! | `SLOTWATCH_BIND_HOST` | `0.0.0.0` |
//! | `SLOTWATCH_TARGET_URL` | the parish appointments page |
//! | `SLOTWATCH_POLL_INTERVAL_SECS` | `300` |
//! | `SLOTWATCH_FETCH_TIMEOUT_SECS` | `15` |
//! | `SLOTWATCH_DATA_DIR` | `.` |
//! | `SLOTWATCH_ADMIN_KEY` | unset (admin endpoints closed) |
//! | `SLOTWATCH_TEST_RECIPIENT` | unset (`/test` answers 503) |
//! | `SLOTWATCH_ALERT_MESSAGE` | Spanish alert with the target URL |
//! | `SLOTWATCH_START_PAUSED`, `SLOTWATCH_START_SIMULATION`, `SLOTWATCH_LOG_JSON` | `false` |
//! | `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` | unset |
//! | `TWILIO_FROM`, `TWILIO_CHANNEL_PREFIX`, `TWILIO_API_BASE` | WhatsApp sandbox values |

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::control::bool_word;
use crate::error::ConfigError;
use crate::monitor::DEFAULT_POLL_INTERVAL;
use crate::notify::TwilioConfig;
use crate::recipient::Recipient;

/// Page polled for open slots when `SLOTWATCH_TARGET_URL` is unset.
pub const DEFAULT_TARGET_URL: &str = "https://www.natividad.org.ar/turnos_enfermos.php";

/// Default port, matching the hosting platform's `PORT` convention.
pub const DEFAULT_PORT: u16 = 5000;

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// Alert body pointing at `target_url`.
#[must_use]
pub fn default_alert_message(target_url: &str) -> String {
    format!("¡Hay turnos! Entrá ya a la web con el siguiente link {target_url}")
}

/// Resolved server configuration.
#[allow(missing_docs)]
#[derive(Clone)]
pub struct Config {
    pub bind_host: String,
    pub port: u16,
    pub target_url: String,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub data_dir: PathBuf,
    pub admin_key: Option<String>,
    pub test_recipient: Option<Recipient>,
    pub alert_message: String,
    pub start_paused: bool,
    pub start_simulation: bool,
    pub log_json: bool,
    pub twilio: TwilioConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            target_url: DEFAULT_TARGET_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            data_dir: PathBuf::from("."),
            admin_key: None,
            test_recipient: None,
            alert_message: default_alert_message(DEFAULT_TARGET_URL),
            start_paused: false,
            start_simulation: false,
            log_json: false,
            twilio: TwilioConfig::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("target_url", &self.target_url)
            .field("poll_interval", &self.poll_interval)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("data_dir", &self.data_dir)
            .field("admin_key", &self.admin_key.as_ref().map(|_| "<redacted>"))
            .field("test_recipient", &self.test_recipient.as_ref().map(Recipient::fingerprint))
            .field("start_paused", &self.start_paused)
            .field("start_simulation", &self.start_simulation)
            .field("log_json", &self.log_json)
            .field("twilio", &self.twilio)
            .finish_non_exhaustive()
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.string(key) else {
            return Ok(default);
        };
        bool_word(&raw).ok_or_else(|| ConfigError::invalid(key, format!("expected a boolean, got '{raw}'")))
    }

    fn number(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        self.string(key).map_or(Ok(default), |raw| {
            raw.parse::<u64>()
                .map_err(|_| ConfigError::invalid(key, format!("expected a non-negative integer, got '{raw}'")))
        })
    }
}

impl Config {
    /// Read the process environment.
    ///
    /// # Errors
    /// Any unparseable or out-of-range value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup` instead of the process
    /// environment. Blank values count as unset.
    ///
    /// # Errors
    /// Any unparseable or out-of-range value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup };
        let defaults = Self::default();
        let twilio_defaults = TwilioConfig::default();

        let port = env.number("PORT", u64::from(DEFAULT_PORT))?;
        let port = u16::try_from(port).map_err(|_| ConfigError::invalid("PORT", format!("{port} is out of range")))?;

        let target_url = env.string("SLOTWATCH_TARGET_URL").unwrap_or(defaults.target_url);
        let alert_message = env
            .string("SLOTWATCH_ALERT_MESSAGE")
            .unwrap_or_else(|| default_alert_message(&target_url));

        let test_recipient = env
            .string("SLOTWATCH_TEST_RECIPIENT")
            .map(|raw| Recipient::parse(&raw))
            .transpose()
            .map_err(|e| ConfigError::invalid("SLOTWATCH_TEST_RECIPIENT", e.to_string()))?;

        let config = Self {
            bind_host: env.string("SLOTWATCH_BIND_HOST").unwrap_or(defaults.bind_host),
            port,
            target_url,
            poll_interval: Duration::from_secs(
                env.number("SLOTWATCH_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL.as_secs())?,
            ),
            fetch_timeout: Duration::from_secs(
                env.number("SLOTWATCH_FETCH_TIMEOUT_SECS", DEFAULT_FETCH_TIMEOUT_SECS)?,
            ),
            data_dir: env.string("SLOTWATCH_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            admin_key: env.string("SLOTWATCH_ADMIN_KEY"),
            test_recipient,
            alert_message,
            start_paused: env.flag("SLOTWATCH_START_PAUSED", false)?,
            start_simulation: env.flag("SLOTWATCH_START_SIMULATION", false)?,
            log_json: env.flag("SLOTWATCH_LOG_JSON", false)?,
            twilio: TwilioConfig {
                account_sid: env.string("TWILIO_ACCOUNT_SID"),
                auth_token: env.string("TWILIO_AUTH_TOKEN"),
                from: env.string("TWILIO_FROM").unwrap_or(twilio_defaults.from),
                channel_prefix: env
                    .string("TWILIO_CHANNEL_PREFIX")
                    .unwrap_or(twilio_defaults.channel_prefix),
                api_base: env.string("TWILIO_API_BASE").unwrap_or(twilio_defaults.api_base),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    /// A poll interval under one second or a zero fetch timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval < Duration::from_secs(1) {
            return Err(ConfigError::invalid(
                "SLOTWATCH_POLL_INTERVAL_SECS",
                "must be at least 1 second",
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "SLOTWATCH_FETCH_TIMEOUT_SECS",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Socket address the HTTP server binds.
    ///
    /// # Errors
    /// If the host and port do not form a valid socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = &self.bind_host;
        let joined = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]:{}", self.port)
        } else {
            format!("{host}:{}", self.port)
        };
        joined
            .parse()
            .map_err(|_| ConfigError::invalid("SLOTWATCH_BIND_HOST", format!("'{host}' is not an IP address")))
    }
}
