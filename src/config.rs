use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const REGION_ENV: &str = "LOLSTALK_REGION";
const TIMEZONE_ENV: &str = "LOLSTALK_TIMEZONE";

/// Read-only settings shared by every task of a dispatch.
///
/// A `Config` is loaded once and handed around as an `Arc<Config>` snapshot.
/// Changing a setting means building a new snapshot with one of the
/// `with_*` builders; running tasks keep the snapshot they started with.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ladder region used for rank lookups and op.gg links, e.g. `EUW`.
    pub region: String,
    /// IANA timezone tournament start times are localized to.
    pub timezone: String,
    /// Schedule sources that are switched on, e.g. `BATTLEFY`.
    pub websites: Vec<String>,
    /// Regions the schedule scrapers iterate over.
    pub regions: Vec<String>,
    /// Battlefy browse page per schedule region.
    pub battlefy_urls: HashMap<String, String>,
    /// Slots of the shared worker pool.
    pub max_concurrency: usize,
    /// Per-request HTTP timeout; unset means no timeout.
    pub request_timeout_secs: Option<u64>,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: "EUW".to_string(),
            timezone: "Europe/Berlin".to_string(),
            websites: vec!["BATTLEFY".to_string()],
            regions: vec!["EU".to_string()],
            battlefy_urls: HashMap::from([(
                "EU".to_string(),
                "https://battlefy.com/browse/league-of-legends?region=EU%20West&type=Any%20Format"
                    .to_string(),
            )]),
            max_concurrency: 20,
            request_timeout_secs: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load a config from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let cfg = Self::from_toml(&raw)?;
        info!(path = %path.display(), "loaded config");
        Ok(cfg.with_env_overrides())
    }

    /// Load `./config.toml` if present, otherwise fall back to defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            Self::load(local)
        } else {
            debug!("no config.toml found, using defaults");
            Ok(Self::default().with_env_overrides())
        }
    }

    /// Parse a config from TOML text, rejecting unknown timezones.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(raw)?;
        cfg.timezone()?;
        Ok(cfg)
    }

    fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `LOLSTALK_REGION` and `LOLSTALK_TIMEZONE` as read by `var`.
    /// Blank regions and unknown zones are ignored.
    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var(REGION_ENV) {
            if !v.trim().is_empty() {
                self.region = v.trim().to_string();
            }
        }
        if let Some(v) = var(TIMEZONE_ENV) {
            if Tz::from_str(v.trim()).is_ok() {
                self.timezone = v.trim().to_string();
            } else {
                warn!(timezone = %v, "ignoring invalid LOLSTALK_TIMEZONE");
            }
        }
        self
    }

    /// The ladder region; errors when it is blank.
    pub fn region(&self) -> Result<&str, ConfigError> {
        let region = self.region.trim();
        if region.is_empty() {
            return Err(missing("GENERAL", "REGION"));
        }
        Ok(region)
    }

    /// The configured timezone as a [`Tz`].
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        Tz::from_str(self.timezone.trim())
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// The Battlefy browse page for a schedule region.
    pub fn battlefy_url(&self, region: &str) -> Result<&str, ConfigError> {
        self.battlefy_urls
            .get(region)
            .map(String::as_str)
            .ok_or_else(|| missing("BATTLEFY", &format!("{region}_URL")))
    }

    /// Whether a schedule source is switched on, ignoring case.
    pub fn website_enabled(&self, website: &str) -> bool {
        self.websites.iter().any(|w| w.eq_ignore_ascii_case(website))
    }

    /// A new snapshot with another ladder region.
    pub fn with_region(mut self, region: impl Into<String>) -> Result<Self, ConfigError> {
        let region = region.into();
        if region.trim().is_empty() {
            return Err(missing("GENERAL", "REGION"));
        }
        self.region = region;
        Ok(self)
    }

    /// A new snapshot with another timezone, which must be a known zone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Result<Self, ConfigError> {
        let timezone = timezone.into();
        Tz::from_str(&timezone).map_err(|_| ConfigError::InvalidTimezone(timezone.clone()))?;
        self.timezone = timezone;
        Ok(self)
    }
}

fn missing(section: &str, option: &str) -> ConfigError {
    ConfigError::MissingOption {
        section: section.to_string(),
        option: option.to_string(),
    }
}
