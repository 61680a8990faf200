use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{pipeline::MalformedPolicy, schedule::DailySchedule};

pub const DEFAULT_CITY: &str = "Pretoria";
pub const DEFAULT_ARCHIVE_PATH: &str = "weather_data.csv";
pub const DEFAULT_DAILY_AT: &str = "08:00";
pub const DEFAULT_PROVIDER_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "WEATHER_REPORT_CONFIG";

/// Settings for one process lifetime. Built once in `main`, then only borrowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather `appid`. Not validated; a bad key shows up as a fetch failure.
    pub api_key: String,
    pub city: String,
    pub archive_path: PathBuf,
    /// Daily trigger, `HH:MM` or `HH:MM:SS` local time.
    pub daily_at: String,
    pub provider_url: String,
    /// Unset means the provider call may block indefinitely.
    pub http_timeout_secs: Option<u64>,
    pub on_malformed: MalformedPolicy,
    pub email: EmailConfig,
}

/// Example TOML:
/// [email]
/// sender = "me@example.com"
/// password = "app-password"
/// receiver = "you@example.com"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub sender: Option<String>,
    pub password: Option<String>,
    pub receiver: Option<String>,
    pub smtp_host: String,
}

/// Sender identity, present only when both address and password are configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderCredentials {
    pub address: String,
    pub password: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            city: DEFAULT_CITY.to_string(),
            archive_path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            daily_at: DEFAULT_DAILY_AT.to_string(),
            provider_url: DEFAULT_PROVIDER_URL.to_string(),
            http_timeout_secs: None,
            on_malformed: MalformedPolicy::default(),
            email: EmailConfig::default(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sender: None,
            password: None,
            receiver: None,
            smtp_host: DEFAULT_SMTP_HOST.to_string(),
        }
    }
}

impl EmailConfig {
    pub fn credentials(&self) -> Option<SenderCredentials> {
        match (&self.sender, &self.password) {
            (Some(address), Some(password)) => Some(SenderCredentials {
                address: address.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    /// Falls back to the sender, so an unset receiver mails the report to oneself.
    pub fn recipient(&self) -> Option<&str> {
        self.receiver.as_deref().or(self.sender.as_deref())
    }
}

impl Config {
    /// Defaults, then the config file if one exists, then the process environment.
    pub fn load() -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();

        let path = match env(CONFIG_PATH_VAR).filter(|v| !v.is_empty()) {
            Some(explicit) => Some(PathBuf::from(explicit)),
            None => Self::config_file_path().ok(),
        };

        let mut cfg = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        cfg.apply_env(env)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Overlay values from an environment-like lookup. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("API_KEY") {
            self.api_key = v;
        }
        if let Some(v) = get("WEATHER_CITY") {
            self.city = v;
        }
        if let Some(v) = get("WEATHER_ARCHIVE_PATH") {
            self.archive_path = PathBuf::from(v);
        }
        if let Some(v) = get("WEATHER_DAILY_AT") {
            self.daily_at = v;
        }
        if let Some(v) = get("WEATHER_PROVIDER_URL") {
            self.provider_url = v;
        }
        if let Some(v) = get("WEATHER_HTTP_TIMEOUT_SECS") {
            let secs = v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("WEATHER_HTTP_TIMEOUT_SECS must be whole seconds, got '{v}'"))?;
            self.http_timeout_secs = Some(secs);
        }
        if let Some(v) = get("WEATHER_ON_MALFORMED") {
            self.on_malformed = MalformedPolicy::try_from(v.as_str())?;
        }
        if let Some(v) = get("SENDER_EMAIL") {
            self.email.sender = Some(v);
        }
        if let Some(v) = get("SENDER_PASSWORD") {
            self.email.password = Some(v);
        }
        if let Some(v) = get("RECEIVER_EMAIL") {
            self.email.receiver = Some(v);
        }
        if let Some(v) = get("SMTP_HOST") {
            self.email.smtp_host = v;
        }

        Ok(())
    }

    /// Reject values that would only fail later, mid-run.
    pub fn validate(&self) -> Result<()> {
        self.schedule()?;
        if self.city.trim().is_empty() {
            return Err(anyhow!("City must not be empty"));
        }
        Ok(())
    }

    pub fn schedule(&self) -> Result<DailySchedule> {
        DailySchedule::parse(&self.daily_at)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    /// Path to the platform config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-report", "weather-report")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_pretoria_at_eight() {
        let cfg = Config::default();

        assert_eq!(cfg.city, "Pretoria");
        assert_eq!(cfg.archive_path, PathBuf::from("weather_data.csv"));
        assert_eq!(cfg.daily_at, "08:00");
        assert_eq!(cfg.on_malformed, MalformedPolicy::Fatal);
        assert!(cfg.http_timeout().is_none());
        assert!(cfg.email.credentials().is_none());
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn env_overrides_credentials_and_location() {
        let mut cfg = Config::default();
        cfg.apply_env(env_of(&[
            ("API_KEY", "KEY"),
            ("WEATHER_CITY", "Durban"),
            ("SENDER_EMAIL", "me@example.com"),
            ("SENDER_PASSWORD", "secret"),
            ("RECEIVER_EMAIL", "you@example.com"),
            ("WEATHER_HTTP_TIMEOUT_SECS", "15"),
            ("WEATHER_ON_MALFORMED", "skip"),
        ]))
        .unwrap();

        assert_eq!(cfg.api_key, "KEY");
        assert_eq!(cfg.city, "Durban");
        assert_eq!(cfg.http_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(cfg.on_malformed, MalformedPolicy::Skip);
        assert_eq!(
            cfg.email.credentials(),
            Some(SenderCredentials {
                address: "me@example.com".into(),
                password: "secret".into(),
            })
        );
        assert_eq!(cfg.email.recipient(), Some("you@example.com"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.apply_env(env_of(&[("SENDER_EMAIL", ""), ("WEATHER_CITY", "  ")]))
            .unwrap();

        assert!(cfg.email.sender.is_none());
        assert_eq!(cfg.city, "Pretoria");
    }

    #[test]
    fn sender_without_password_disables_credentials() {
        let mut cfg = Config::default();
        cfg.apply_env(env_of(&[("SENDER_EMAIL", "me@example.com")])).unwrap();

        assert!(cfg.email.credentials().is_none());
    }

    #[test]
    fn recipient_falls_back_to_sender() {
        let mut cfg = Config::default();
        cfg.apply_env(env_of(&[
            ("SENDER_EMAIL", "me@example.com"),
            ("SENDER_PASSWORD", "secret"),
        ]))
        .unwrap();

        assert_eq!(cfg.email.recipient(), Some("me@example.com"));
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env(env_of(&[("WEATHER_HTTP_TIMEOUT_SECS", "soon")]))
            .unwrap_err();

        assert!(err.to_string().contains("WEATHER_HTTP_TIMEOUT_SECS"));
    }

    #[test]
    fn bad_trigger_time_fails_validation() {
        let mut cfg = Config::default();
        cfg.apply_env(env_of(&[("WEATHER_DAILY_AT", "25:00")])).unwrap();

        assert!(cfg.validate().is_err());
    }

    #[test]
    fn toml_file_fills_unspecified_fields_with_defaults() {
        let cfg = Config::from_toml(
            r#"
            api_key = "FILE_KEY"
            daily_at = "06:30"
            on_malformed = "skip"

            [email]
            sender = "me@example.com"
            password = "pw"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_key, "FILE_KEY");
        assert_eq!(cfg.daily_at, "06:30");
        assert_eq!(cfg.city, "Pretoria");
        assert_eq!(cfg.on_malformed, MalformedPolicy::Skip);
        assert_eq!(cfg.email.smtp_host, "smtp.gmail.com");
        assert!(cfg.email.credentials().is_some());
    }

    #[test]
    fn env_wins_over_file() {
        let mut cfg = Config::from_toml(r#"city = "Cape Town""#).unwrap();
        cfg.apply_env(env_of(&[("WEATHER_CITY", "Johannesburg")])).unwrap();

        assert_eq!(cfg.city, "Johannesburg");
    }
}
