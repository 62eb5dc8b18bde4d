//! TOML-based application configuration.
//!
//! Stores:
//! - Working hours used for day windows
//! - The organizer timezone (Graph name + fixed UTC offset)
//! - Meeting duration policy
//! - Microsoft Graph connection settings
//!
//! Configuration is stored at `~/.config/meetbook/config.toml`. The Graph
//! client secret is never written to this file.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::availability::window::{clamp_hours, parse_offset, DEFAULT_END_HOUR, DEFAULT_START_HOUR};
use crate::error::ConfigError;

/// Working-hour bounds applied when a request does not name its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingHours {
    #[serde(default = "default_start_hour")]
    pub start_hour: i32,
    #[serde(default = "default_end_hour")]
    pub end_hour: i32,
}

/// Organizer timezone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimezoneConfig {
    /// Name sent to the calendar service (Windows zone id).
    #[serde(default = "default_tz_name")]
    pub name: String,
    /// Offset every computation runs in, e.g. "+04:00".
    #[serde(default = "default_tz_offset")]
    pub utc_offset: String,
}

/// Meeting duration policy and upstream failure handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    #[serde(default = "default_duration")]
    pub default_duration: i64,
    #[serde(default = "default_min_duration")]
    pub min_duration: i64,
    #[serde(default = "default_max_duration")]
    pub max_duration: i64,
    /// Treat an unreachable calendar as an empty one. Can overbook.
    #[serde(default = "default_true")]
    pub assume_free_on_upstream_error: bool,
}

/// Microsoft Graph connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    /// Mailbox whose calendar is read and written.
    #[serde(default)]
    pub organizer_upn: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_authority")]
    pub authority: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// From `AZURE_CLIENT_SECRET` or the OS keyring only.
    #[serde(skip)]
    pub client_secret: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/meetbook/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub working_hours: WorkingHours,
    #[serde(default)]
    pub timezone: TimezoneConfig,
    #[serde(default)]
    pub availability: AvailabilityConfig,
    #[serde(default)]
    pub graph: GraphConfig,
}

// Default functions
fn default_start_hour() -> i32 {
    DEFAULT_START_HOUR
}
fn default_end_hour() -> i32 {
    DEFAULT_END_HOUR
}
fn default_tz_name() -> String {
    "Arabian Standard Time".into()
}
fn default_tz_offset() -> String {
    "+04:00".into()
}
fn default_duration() -> i64 {
    30
}
fn default_min_duration() -> i64 {
    15
}
fn default_max_duration() -> i64 {
    240
}
fn default_true() -> bool {
    true
}
fn default_api_base() -> String {
    "https://graph.microsoft.com/v1.0".into()
}
fn default_authority() -> String {
    "https://login.microsoftonline.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
        }
    }
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            name: default_tz_name(),
            utc_offset: default_tz_offset(),
        }
    }
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            min_duration: default_min_duration(),
            max_duration: default_max_duration(),
            assume_free_on_upstream_error: true,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            organizer_upn: String::new(),
            api_base: default_api_base(),
            authority: default_authority(),
            timeout_secs: default_timeout_secs(),
            client_secret: None,
        }
    }
}

impl GraphConfig {
    /// Names of settings still missing for the Graph client.
    pub fn missing(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.tenant_id.trim().is_empty() {
            missing.push("graph.tenant_id".to_string());
        }
        if self.client_id.trim().is_empty() {
            missing.push("graph.client_id".to_string());
        }
        if self.organizer_upn.trim().is_empty() {
            missing.push("graph.organizer_upn".to_string());
        }
        if self.client_secret.as_deref().map_or(true, |s| s.is_empty()) {
            missing.push("AZURE_CLIENT_SECRET".to_string());
        }
        missing
    }
}

impl AvailabilityConfig {
    /// Clamp a requested duration into `[min_duration, max_duration]`.
    pub fn clamp_duration(&self, minutes: i64) -> i64 {
        minutes.clamp(self.min_duration, self.max_duration)
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::MissingKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<i64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as integer")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/meetbook"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. The updated config must still validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result is not a valid configuration.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let mut updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.graph.client_secret = self.graph.client_secret.take();
        if let Err(err) = updated.validate() {
            self.graph.client_secret = updated.graph.client_secret.take();
            return Err(err);
        }
        *self = updated;
        Ok(())
    }

    /// Apply process environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Unparsable numeric values are ignored
    /// with a warning.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("AZURE_TENANT_ID") {
            self.graph.tenant_id = v;
        }
        if let Some(v) = non_empty("AZURE_CLIENT_ID") {
            self.graph.client_id = v;
        }
        if let Some(v) = non_empty("AZURE_CLIENT_SECRET") {
            self.graph.client_secret = Some(v);
        }
        if let Some(v) = non_empty("ORGANIZER_UPN") {
            self.graph.organizer_upn = v;
        }
        if let Some(v) = non_empty("DEFAULT_TZ") {
            self.timezone.name = v;
        }
        if let Some(v) = non_empty("DEFAULT_TZ_OFFSET") {
            self.timezone.utc_offset = v;
        }
        for (key, slot) in [
            ("WORKING_START_HOUR", &mut self.working_hours.start_hour),
            ("WORKING_END_HOUR", &mut self.working_hours.end_hour),
        ] {
            if let Some(v) = non_empty(key) {
                match v.trim().parse::<i32>() {
                    Ok(hour) => *slot = hour,
                    Err(_) => tracing::warn!(key, value = %v, "ignoring non-numeric override"),
                }
            }
        }
    }

    /// The fixed offset all computations run in.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_offset(&self.timezone.utc_offset).ok_or_else(|| ConfigError::InvalidValue {
            key: "timezone.utc_offset".into(),
            message: format!("'{}' is not an offset like +04:00", self.timezone.utc_offset),
        })
    }

    /// Check hour ranges, duration bounds and the offset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (start, end) = clamp_hours(self.working_hours.start_hour, self.working_hours.end_hour);
        if start as i32 != self.working_hours.start_hour {
            return Err(invalid(
                "working_hours.start_hour",
                format!("{} is outside 0-23", self.working_hours.start_hour),
            ));
        }
        if end as i32 != self.working_hours.end_hour {
            return Err(invalid(
                "working_hours.end_hour",
                format!(
                    "{} must be after start hour {} and at most 23",
                    self.working_hours.end_hour, self.working_hours.start_hour
                ),
            ));
        }

        let a = &self.availability;
        if a.min_duration < 1 {
            return Err(invalid("availability.min_duration", "must be positive".into()));
        }
        if a.max_duration < a.min_duration {
            return Err(invalid(
                "availability.max_duration",
                format!("{} is below min_duration {}", a.max_duration, a.min_duration),
            ));
        }
        if !(a.min_duration..=a.max_duration).contains(&a.default_duration) {
            return Err(invalid(
                "availability.default_duration",
                format!(
                    "{} is outside {}-{}",
                    a.default_duration, a.min_duration, a.max_duration
                ),
            ));
        }

        if self.timezone.name.trim().is_empty() {
            return Err(invalid("timezone.name", "must not be empty".into()));
        }
        self.offset()?;

        for (key, value) in [
            ("graph.api_base", &self.graph.api_base),
            ("graph.authority", &self.graph.authority),
        ] {
            url::Url::parse(value).map_err(|e| invalid(key, format!("'{value}': {e}")))?;
        }
        if self.graph.timeout_secs == 0 {
            return Err(invalid("graph.timeout_secs", "must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.working_hours.start_hour, 9);
        assert_eq!(parsed.availability.max_duration, 240);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn secret_is_never_serialized() {
        let mut cfg = Config::default();
        cfg.graph.client_secret = Some("hunter2".into());
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        assert!(!toml_str.contains("hunter2"));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[working_hours]\nstart_hour = 8\n").unwrap();
        assert_eq!(cfg.working_hours.start_hour, 8);
        assert_eq!(cfg.working_hours.end_hour, 18);
        assert_eq!(cfg.timezone.name, "Arabian Standard Time");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("working_hours.end_hour").as_deref(), Some("18"));
        assert_eq!(cfg.get("timezone.utc_offset").as_deref(), Some("+04:00"));
        assert_eq!(
            cfg.get("availability.assume_free_on_upstream_error").as_deref(),
            Some("true")
        );
        assert!(cfg.get("graph.client_secret").is_none());
        assert!(cfg.get("working_hours.missing").is_none());
    }

    #[test]
    fn set_updates_and_validates() {
        let mut cfg = Config::default();
        cfg.set("working_hours.start_hour", "8").unwrap();
        assert_eq!(cfg.working_hours.start_hour, 8);

        cfg.set("graph.organizer_upn", "rooms@contoso.com").unwrap();
        assert_eq!(cfg.graph.organizer_upn, "rooms@contoso.com");

        cfg.set("availability.assume_free_on_upstream_error", "false").unwrap();
        assert!(!cfg.availability.assume_free_on_upstream_error);
    }

    #[test]
    fn set_rejects_bad_input() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.set("ui.dark_mode", "true"), Err(ConfigError::MissingKey(_))));
        assert!(cfg.set("working_hours.start_hour", "nine").is_err());
        assert!(cfg.set("working_hours.end_hour", "7").is_err());
        assert!(cfg.set("timezone.utc_offset", "Asia/Dubai").is_err());
        assert!(cfg.set("graph.api_base", "graph.microsoft.com").is_err());
        assert_eq!(cfg.working_hours.end_hour, 18);
        assert_eq!(cfg.timezone.utc_offset, "+04:00");
    }

    #[test]
    fn set_keeps_secret() {
        let mut cfg = Config::default();
        cfg.graph.client_secret = Some("s3cret".into());
        cfg.set("working_hours.end_hour", "17").unwrap();
        assert_eq!(cfg.graph.client_secret.as_deref(), Some("s3cret"));
        assert!(cfg.set("working_hours.end_hour", "3").is_err());
        assert_eq!(cfg.graph.client_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AZURE_TENANT_ID", "tenant"),
            ("AZURE_CLIENT_ID", "client"),
            ("AZURE_CLIENT_SECRET", "secret"),
            ("ORGANIZER_UPN", "boss@contoso.com"),
            ("DEFAULT_TZ", "UTC"),
            ("DEFAULT_TZ_OFFSET", "+00:00"),
            ("WORKING_START_HOUR", "10"),
            ("WORKING_END_HOUR", "not-a-number"),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env_with(|k| env.get(k).map(|v| v.to_string()));

        assert!(cfg.graph.missing().is_empty());
        assert_eq!(cfg.timezone.name, "UTC");
        assert_eq!(cfg.working_hours.start_hour, 10);
        assert_eq!(cfg.working_hours.end_hour, 18);
        assert_eq!(cfg.offset().unwrap(), FixedOffset::east_opt(0).unwrap());
    }

    #[test]
    fn missing_graph_settings_are_listed() {
        let cfg = Config::default();
        assert_eq!(
            cfg.graph.missing(),
            vec![
                "graph.tenant_id",
                "graph.client_id",
                "graph.organizer_upn",
                "AZURE_CLIENT_SECRET"
            ]
        );
    }

    #[test]
    fn clamp_duration_uses_policy() {
        let policy = AvailabilityConfig::default();
        assert_eq!(policy.clamp_duration(5), 15);
        assert_eq!(policy.clamp_duration(45), 45);
        assert_eq!(policy.clamp_duration(600), 240);
    }

    #[test]
    fn load_from_creates_defaults_then_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.working_hours.start_hour, 9);

        let mut cfg = cfg;
        cfg.set("working_hours.start_hour", "7").unwrap();
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().working_hours.start_hour, 7);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "working_hours = 12").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }
}
