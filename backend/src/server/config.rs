//! Server settings loaded via OrthoConfig and the assembled server
//! configuration.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use chrono_tz::Tz;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;
use crm_backend::domain::{QuietHours, QuietHoursError, ReviewPolicy};
use crm_backend::inbound::http::session_config::SessionSettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_ZONE: &str = "UTC";
const DEFAULT_QUIET_START: &str = "21:00";
const DEFAULT_QUIET_END: &str = "08:00";
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Errors raised while interpreting [`ServerSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// No database URL configured.
    #[error("CRM_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    /// Bind address does not parse.
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// Quiet-hours window is invalid.
    #[error("invalid quiet hours: {0}")]
    QuietHours(#[from] QuietHoursError),
    /// Webhook URL does not parse.
    #[error("invalid webhook URL '{value}': {source}")]
    WebhookUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    /// Numeric setting must be above zero.
    #[error("{name} must be positive, got {value}")]
    NonPositive {
        /// Variable name.
        name: &'static str,
        /// Rejected value.
        value: i64,
    },
}

/// Runtime settings. Every field can come from a `CRM_*` environment
/// variable, a configuration file or a command-line flag.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CRM")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub db_pool_size: Option<u32>,
    /// Bearer secret for `/api/v1/cron/*`; cron endpoints answer 503 without it.
    pub cron_secret: Option<String>,
    /// IANA zone used for customers without their own.
    pub default_zone: Option<String>,
    /// Start of the quiet-hours window, `HH:MM` local.
    pub quiet_start: Option<String>,
    /// End of the quiet-hours window, `HH:MM` local.
    pub quiet_end: Option<String>,
    /// Relay endpoint for outbound messages. Messages are only logged when
    /// unset.
    pub webhook_url: Option<String>,
    /// Bearer token presented to the relay.
    pub webhook_token: Option<String>,
    /// Relay request timeout in seconds.
    pub webhook_timeout_secs: Option<u64>,
    /// How far ahead of a visit the reminder goes out.
    pub reminder_lead_hours: Option<i64>,
    /// Days until an invoice falls due.
    pub payment_terms_days: Option<i64>,
    /// Hours after job completion before the first review request.
    pub review_delay_hours: Option<i64>,
    /// Days between review reminders.
    pub review_reminder_days: Option<i64>,
    /// Reminders sent before a review request expires.
    pub review_max_reminders: Option<i32>,
    /// Serve the Prometheus endpoint when built with `metrics`.
    #[ortho_config(default = true)]
    pub metrics_enabled: bool,
}

fn positive(name: &'static str, value: Option<i64>) -> Result<Option<i64>, SettingsError> {
    match value {
        Some(value) if value <= 0 => Err(SettingsError::NonPositive { name, value }),
        other => Ok(other),
    }
}

impl ServerSettings {
    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Configured database URL; blank values count as missing.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Pool size, defaulting to ten connections.
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size.unwrap_or(DEFAULT_POOL_SIZE)
    }

    /// Quiet-hours window in the default zone.
    pub fn quiet_hours(&self) -> Result<QuietHours, SettingsError> {
        Ok(QuietHours::parse(
            self.quiet_start.as_deref().unwrap_or(DEFAULT_QUIET_START),
            self.quiet_end.as_deref().unwrap_or(DEFAULT_QUIET_END),
            self.default_zone.as_deref().unwrap_or(DEFAULT_ZONE),
        )?)
    }

    /// Zone used for customers without their own.
    pub fn default_zone(&self) -> Result<Tz, SettingsError> {
        Ok(self.quiet_hours()?.zone())
    }

    /// `None` selects the logging sender.
    pub fn webhook_url(&self) -> Result<Option<Url>, SettingsError> {
        self.webhook_url
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(|value| {
                Url::parse(value).map_err(|source| SettingsError::WebhookUrl {
                    value: value.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    /// Relay request timeout.
    pub fn webhook_timeout(&self) -> StdDuration {
        StdDuration::from_secs(
            self.webhook_timeout_secs
                .unwrap_or(DEFAULT_WEBHOOK_TIMEOUT_SECS),
        )
    }

    /// Reminder lead time override.
    pub fn reminder_lead(&self) -> Result<Option<Duration>, SettingsError> {
        Ok(positive("CRM_REMINDER_LEAD_HOURS", self.reminder_lead_hours)?.map(Duration::hours))
    }

    /// Payment terms override.
    pub fn payment_terms(&self) -> Result<Option<Duration>, SettingsError> {
        Ok(positive("CRM_PAYMENT_TERMS_DAYS", self.payment_terms_days)?.map(Duration::days))
    }

    /// Review sequencing with any overrides applied to the defaults.
    pub fn review_policy(&self) -> Result<ReviewPolicy, SettingsError> {
        let mut policy = ReviewPolicy::default();
        if let Some(hours) = positive("CRM_REVIEW_DELAY_HOURS", self.review_delay_hours)? {
            policy.initial_delay = Duration::hours(hours);
        }
        if let Some(days) = positive("CRM_REVIEW_REMINDER_DAYS", self.review_reminder_days)? {
            policy.reminder_interval = Duration::days(days);
        }
        if let Some(max) = self.review_max_reminders {
            policy.max_reminders = max.max(0);
        }
        Ok(policy)
    }
}

/// Everything [`super::create_server`] needs besides the application state.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Settings without a metrics handle.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}

#[cfg(test)]
mod tests {
    //! Settings defaults, environment overrides and validation.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 8] = [
        "CRM_BIND_ADDR",
        "CRM_DATABASE_URL",
        "CRM_DEFAULT_ZONE",
        "CRM_QUIET_START",
        "CRM_QUIET_END",
        "CRM_WEBHOOK_URL",
        "CRM_REVIEW_DELAY_HOURS",
        "CRM_CRON_SECRET",
    ];

    fn load_with(overrides: &[(&str, &str)]) -> ServerSettings {
        let vars = VARS.map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned());
            (name, value)
        });
        let _guard = lock_env(vars);
        ServerSettings::load_from_iter([OsString::from("crm-server")])
            .expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let settings = load_with(&[]);
        assert_eq!(
            settings.bind_addr().expect("default bind"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert!(matches!(
            settings.database_url(),
            Err(SettingsError::MissingDatabaseUrl)
        ));
        let quiet = settings.quiet_hours().expect("default window");
        assert_eq!(quiet, QuietHours::evening_to_morning(chrono_tz::UTC));
        assert!(settings.webhook_url().expect("no webhook").is_none());
        assert!(settings.cron_secret.is_none());
        assert_eq!(
            settings.review_policy().expect("policy"),
            ReviewPolicy::default()
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let settings = load_with(&[
            ("CRM_BIND_ADDR", "127.0.0.1:9000"),
            ("CRM_DATABASE_URL", "postgres://localhost/crm"),
            ("CRM_DEFAULT_ZONE", "Europe/London"),
            ("CRM_QUIET_START", "22:30"),
            ("CRM_WEBHOOK_URL", "https://relay.example.com/outbound"),
            ("CRM_REVIEW_DELAY_HOURS", "6"),
            ("CRM_CRON_SECRET", "s3cret"),
        ]);
        assert_eq!(
            settings.bind_addr().expect("bind").port(),
            9000
        );
        assert_eq!(
            settings.database_url().expect("url"),
            "postgres://localhost/crm"
        );
        assert_eq!(
            settings.default_zone().expect("zone"),
            chrono_tz::Europe::London
        );
        assert_eq!(
            settings.quiet_hours().expect("window").start().format("%H:%M").to_string(),
            "22:30"
        );
        assert!(settings.webhook_url().expect("webhook").is_some());
        assert_eq!(
            settings.review_policy().expect("policy").initial_delay,
            Duration::hours(6)
        );
        assert_eq!(settings.cron_secret.as_deref(), Some("s3cret"));
    }

    #[rstest]
    #[case("CRM_BIND_ADDR", "not-an-address")]
    #[case("CRM_DEFAULT_ZONE", "Mars/Olympus")]
    #[case("CRM_QUIET_START", "25:00")]
    #[case("CRM_WEBHOOK_URL", "relay without scheme")]
    #[case("CRM_REVIEW_DELAY_HOURS", "0")]
    fn malformed_values_are_rejected(#[case] name: &str, #[case] value: &str) {
        let settings = load_with(&[(name, value)]);
        let failed = settings.bind_addr().is_err()
            || settings.quiet_hours().is_err()
            || settings.webhook_url().is_err()
            || settings.review_policy().is_err();
        assert!(failed, "{name}={value} should be rejected");
    }
}
