//! Application configuration management.

use serde::Deserialize;

use crate::rates::RateApi;
use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Outbound mail configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// SMS provider configuration.
    #[serde(default)]
    pub sms: SmsConfig,
    /// Exchange-rate provider configuration.
    #[serde(default)]
    pub rates: RatesConfig,
    /// Alert scheduler configuration.
    #[serde(default)]
    pub alerts: AlertsConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// SMTP configuration for payment reminders.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "no-reply@example.com".to_string()
}

fn default_from_name() -> String {
    "Prestamos".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

/// Vonage SMS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// Master switch; when off every send returns "not sent".
    #[serde(default)]
    pub enabled: bool,
    /// Vonage API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Vonage API secret.
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Sender number or alphanumeric id.
    #[serde(default)]
    pub from_number: Option<String>,
    /// Country code prepended to domestic numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
    /// SMS endpoint.
    #[serde(default = "default_sms_api_url")]
    pub api_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_sms_timeout")]
    pub timeout_secs: u64,
}

fn default_country_code() -> String {
    "+51".to_string()
}

fn default_sms_api_url() -> String {
    "https://rest.nexmo.com/sms/json".to_string()
}

fn default_sms_timeout() -> u64 {
    10
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            api_secret: None,
            from_number: None,
            default_country_code: default_country_code(),
            api_url: default_sms_api_url(),
            timeout_secs: default_sms_timeout(),
        }
    }
}

impl SmsConfig {
    /// Returns `(api_key, api_secret, from_number)` when all three are set and non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        let key = self.api_key.as_deref().filter(|s| !s.is_empty())?;
        let secret = self.api_secret.as_deref().filter(|s| !s.is_empty())?;
        let from = self.from_number.as_deref().filter(|s| !s.is_empty())?;
        Some((key, secret, from))
    }
}

/// Exchange-rate provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Providers in the order they are tried.
    #[serde(default = "default_providers")]
    pub providers: Vec<RateApi>,
    /// Timeout applied to each provider attempt, in seconds.
    #[serde(default = "default_rates_timeout")]
    pub timeout_secs: u64,
}

fn default_providers() -> Vec<RateApi> {
    vec![RateApi::ExchangeRateHost, RateApi::Frankfurter, RateApi::OpenErApi]
}

fn default_rates_timeout() -> u64 {
    8
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            timeout_secs: default_rates_timeout(),
        }
    }
}

/// Alert scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AlertsConfig {
    /// Lead days used when a profile has no usable preference.
    #[serde(default = "default_lead_days")]
    pub default_lead_days: u32,
    /// Display currency for profiles without a preference.
    #[serde(default)]
    pub default_currency: Currency,
    /// IANA timezone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_lead_days() -> u32 {
    3
}

fn default_timezone() -> String {
    "America/Lima".to_string()
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            default_lead_days: default_lead_days(),
            default_currency: Currency::default(),
            timezone: default_timezone(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones win: `config/default`, `config/{RUN_MODE}`,
    /// then `PRESTAMOS__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("PRESTAMOS")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_env() {
        temp_env::with_vars(
            [
                ("PRESTAMOS__DATABASE__URL", Some("postgres://localhost/prestamos")),
                ("PRESTAMOS__ALERTS__DEFAULT_LEAD_DAYS", Some("5")),
                ("PRESTAMOS__SMS__ENABLED", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/prestamos");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.alerts.default_lead_days, 5);
                assert!(config.sms.enabled);
                assert_eq!(config.sms.default_country_code, "+51");
                assert_eq!(config.rates.timeout_secs, 8);
                assert_eq!(config.rates.providers.len(), 3);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_var_unset("PRESTAMOS__DATABASE__URL", || {
            assert!(AppConfig::load().is_err());
        });
    }

    #[test]
    fn test_sms_credentials_require_all_fields() {
        let mut sms = SmsConfig {
            api_key: Some("key".into()),
            api_secret: Some("secret".into()),
            ..SmsConfig::default()
        };
        assert!(sms.credentials().is_none());

        sms.from_number = Some(String::new());
        assert!(sms.credentials().is_none());

        sms.from_number = Some("PRESTAMOS".into());
        assert_eq!(sms.credentials(), Some(("key", "secret", "PRESTAMOS")));
    }

    #[test]
    fn test_defaults() {
        let alerts = AlertsConfig::default();
        assert_eq!(alerts.default_lead_days, 3);
        assert_eq!(alerts.default_currency, Currency::Pen);
        assert_eq!(alerts.timezone, "America/Lima");

        let rates = RatesConfig::default();
        assert_eq!(rates.providers[0], RateApi::ExchangeRateHost);
        assert_eq!(rates.providers[2], RateApi::OpenErApi);
    }
}
