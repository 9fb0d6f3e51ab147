use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Refuses to start
    Error,
    /// Logged, then ignored
    Warning,
}

/// One problem found in a loaded configuration
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub field: &'static str,
    pub message: String,
}

impl ConfigIssue {
    fn error(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            field,
            message: message.into(),
        }
    }

    fn warning(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Ensemble forecast API settings
    #[serde(default)]
    pub forecast: ForecastConfig,

    /// Fallback location used when no place is given or lookup fails
    #[serde(default)]
    pub location: LocationConfig,

    /// Nominatim settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Timeouts and retry policy shared by the HTTP clients
    #[serde(default)]
    pub http: HttpConfig,

    /// On-disk response cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Trained model artifacts
    #[serde(default)]
    pub models: ModelsConfig,

    /// Historical observations
    #[serde(default)]
    pub dataset: DatasetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Ensemble endpoint
    pub api_url: String,

    /// Ensemble model identifiers sent as `models`
    pub models: Vec<String>,

    /// Forecast horizon in days
    pub forecast_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            api_url: "https://ensemble-api.open-meteo.com/v1/ensemble".to_string(),
            models: vec!["icon_seamless".to_string()],
            forecast_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    pub default_latitude: f64,
    pub default_longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        // Puducherry
        Self {
            default_latitude: 11.9338,
            default_longitude: 79.8298,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Nominatim base URL (search and reverse live under it)
    pub base_url: String,

    /// Nominatim rejects requests without a user agent
    pub user_agent: String,

    #[serde(default = "default_geocoding_timeout")]
    pub timeout_secs: u64,
}

fn default_geocoding_timeout() -> u64 {
    10
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: format!("weatherwave/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: default_geocoding_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Re-attempts after the first request
    pub retries: u32,

    /// First backoff delay; doubles on every retry
    pub backoff_factor_ms: u64,

    /// Upper bound for a single backoff delay
    pub max_backoff_ms: u64,

    /// Status codes that trigger a retry
    pub retry_statuses: Vec<u16>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 5,
            backoff_factor_ms: 200,
            max_backoff_ms: 120_000,
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,

    /// Cache directory; defaults to `<config_dir>/cache` when unset
    pub dir: Option<PathBuf>,

    /// Entry lifetime in seconds
    pub expire_after_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            expire_after_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding the exported model artifacts
    pub dir: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Daily observations CSV
    pub path: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dataset/data.csv"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            forecast: ForecastConfig::default(),
            location: LocationConfig::default(),
            geocoding: GeocodingConfig::default(),
            http: HttpConfig::default(),
            cache: CacheConfig::default(),
            models: ModelsConfig::default(),
            dataset: DatasetConfig::default(),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("weatherwave")
}

impl Config {
    /// Load from `path`, or from the per-user config file, then validate.
    ///
    /// Warnings are logged; any error-level issue fails the load.
    pub fn load_validated(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load_from(&default_config_dir().join("config.toml"))?,
        };

        let (errors, warnings): (Vec<_>, Vec<_>) = config
            .validate()
            .into_iter()
            .partition(|i| i.severity == Severity::Error);
        for w in &warnings {
            tracing::warn!("Config warning: {}", w);
        }
        if !errors.is_empty() {
            let summary: Vec<String> = errors.iter().map(ToString::to_string).collect();
            return Err(ConfigError::Invalid(summary.join("; ")));
        }
        Ok(config)
    }

    /// Read a config file, writing the defaults there first if it is missing
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let mut config = Self::default();
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let contents = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, contents).map_err(|e| io_error(path, e))
    }

    /// Every issue across all sections, errors and warnings interleaved
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut out = Vec::new();
        self.forecast.issues(&mut out);
        self.location.issues(&mut out);
        self.geocoding.issues(&mut out);
        self.http.issues(&mut out);
        self.cache.issues(&mut out);
        self.models.issues(&mut out);
        self.dataset.issues(&mut out);
        out
    }

    /// Directory used by the response cache
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("cache"))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// http(s) with a host and a non-zero port
fn check_url(field: &'static str, raw: &str, out: &mut Vec<ConfigIssue>) {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            out.push(ConfigIssue::error(field, format!("Invalid URL: {}", e)));
            return;
        }
    };
    if !matches!(url.scheme(), "http" | "https") {
        out.push(ConfigIssue::error(
            field,
            format!("URL must use http or https scheme, got: {}", url.scheme()),
        ));
    }
    if url.host().is_none() {
        out.push(ConfigIssue::error(field, "URL must have a host"));
    }
    if url.port() == Some(0) {
        out.push(ConfigIssue::error(field, "Port cannot be 0"));
    }
}

impl ForecastConfig {
    fn issues(&self, out: &mut Vec<ConfigIssue>) {
        check_url("forecast.api_url", &self.api_url, out);

        if self.models.is_empty() {
            out.push(ConfigIssue::error(
                "forecast.models",
                "At least one ensemble model is required",
            ));
        } else if self.models.iter().any(|m| m.trim().is_empty()) {
            out.push(ConfigIssue::error(
                "forecast.models",
                "Model identifiers cannot be empty",
            ));
        }

        match self.forecast_days {
            0 | 36.. => out.push(ConfigIssue::error(
                "forecast.forecast_days",
                format!(
                    "Forecast days must be between 1 and 35, got {}",
                    self.forecast_days
                ),
            )),
            1 => out.push(ConfigIssue::warning(
                "forecast.forecast_days",
                "A one-day horizon never includes tomorrow",
            )),
            _ => {}
        }
    }
}

impl LocationConfig {
    fn issues(&self, out: &mut Vec<ConfigIssue>) {
        let lat = self.default_latitude;
        if !(-90.0..=90.0).contains(&lat) {
            out.push(ConfigIssue::error(
                "location.default_latitude",
                format!("Latitude must be within [-90, 90], got {}", lat),
            ));
        }
        let lon = self.default_longitude;
        if !(-180.0..=180.0).contains(&lon) {
            out.push(ConfigIssue::error(
                "location.default_longitude",
                format!("Longitude must be within [-180, 180], got {}", lon),
            ));
        }
    }
}

impl GeocodingConfig {
    fn issues(&self, out: &mut Vec<ConfigIssue>) {
        check_url("geocoding.base_url", &self.base_url, out);
        if self.user_agent.trim().is_empty() {
            out.push(ConfigIssue::error(
                "geocoding.user_agent",
                "Nominatim requires a non-empty user agent",
            ));
        }
    }
}

impl HttpConfig {
    fn issues(&self, out: &mut Vec<ConfigIssue>) {
        if self.timeout_secs == 0 {
            out.push(ConfigIssue::error(
                "http.timeout_secs",
                "Timeout must be greater than 0",
            ));
        }
        if self.retries > 10 {
            out.push(ConfigIssue::warning(
                "http.retries",
                "More than 10 retries is unusually many",
            ));
        }
        if self.backoff_factor_ms > self.max_backoff_ms {
            out.push(ConfigIssue::warning(
                "http.backoff_factor_ms",
                "Backoff factor exceeds the maximum backoff; every delay will be capped",
            ));
        }
        if let Some(bad) = self.retry_statuses.iter().find(|s| !(100..=599).contains(*s)) {
            out.push(ConfigIssue::error(
                "http.retry_statuses",
                format!("Not an HTTP status code: {}", bad),
            ));
        }
    }
}

impl CacheConfig {
    fn issues(&self, out: &mut Vec<ConfigIssue>) {
        if self.enabled && self.expire_after_secs == 0 {
            out.push(ConfigIssue::warning(
                "cache.expire_after_secs",
                "Cache entries expire immediately (0 seconds)",
            ));
        }
    }
}

impl ModelsConfig {
    fn issues(&self, out: &mut Vec<ConfigIssue>) {
        if !self.dir.exists() {
            out.push(ConfigIssue::warning(
                "models.dir",
                format!("Path does not exist: {}", self.dir.display()),
            ));
        } else if !self.dir.is_dir() {
            out.push(ConfigIssue::error(
                "models.dir",
                format!("Path is not a directory: {}", self.dir.display()),
            ));
        }
    }
}

impl DatasetConfig {
    fn issues(&self, out: &mut Vec<ConfigIssue>) {
        if !self.path.is_file() {
            out.push(ConfigIssue::warning(
                "dataset.path",
                format!("File does not exist: {}", self.path.display()),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors_for(config: &Config) -> Vec<&'static str> {
        config
            .validate()
            .into_iter()
            .filter(|i| i.severity == Severity::Error)
            .map(|i| i.field)
            .collect()
    }

    #[test]
    fn test_default_config_has_no_errors() {
        // Missing models/dataset paths are warnings only
        let config = Config::default();
        assert!(errors_for(&config).is_empty(), "{:?}", config.validate());
    }

    #[test]
    fn test_invalid_url() {
        let mut config = Config::default();
        config.forecast.api_url = "not-a-url".to_string();
        assert_eq!(errors_for(&config), vec!["forecast.api_url"]);
    }

    #[test]
    fn test_invalid_url_scheme() {
        let mut config = Config::default();
        config.geocoding.base_url = "ftp://localhost:8080".to_string();
        let issues = config.validate();
        assert!(issues
            .iter()
            .any(|i| i.field == "geocoding.base_url" && i.message.contains("http or https")));
    }

    #[test]
    fn test_forecast_days_out_of_range() {
        let mut config = Config::default();
        config.forecast.forecast_days = 0;
        assert_eq!(errors_for(&config), vec!["forecast.forecast_days"]);

        config.forecast.forecast_days = 36;
        assert_eq!(errors_for(&config), vec!["forecast.forecast_days"]);

        config.forecast.forecast_days = 1;
        assert!(errors_for(&config).is_empty());
        assert!(config.validate().iter().any(|i| {
            i.severity == Severity::Warning && i.field == "forecast.forecast_days"
        }));
    }

    #[test]
    fn test_empty_models_rejected() {
        let mut config = Config::default();
        config.forecast.models.clear();
        assert_eq!(errors_for(&config), vec!["forecast.models"]);
    }

    #[test]
    fn test_coordinates_out_of_range() {
        let mut config = Config::default();
        config.location.default_latitude = 91.0;
        config.location.default_longitude = f64::NAN;
        assert_eq!(
            errors_for(&config),
            vec!["location.default_latitude", "location.default_longitude"]
        );
    }

    #[test]
    fn test_bad_retry_status() {
        let mut config = Config::default();
        config.http.retry_statuses.push(42);
        assert_eq!(errors_for(&config), vec!["http.retry_statuses"]);
    }

    #[test]
    fn test_cache_dir_defaults_under_config_dir() {
        let mut config = Config::default();
        config.config_dir = PathBuf::from("/tmp/ww");
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/ww/cache"));

        config.cache.dir = Some(PathBuf::from("/var/cache/ww"));
        assert_eq!(config.cache_dir(), PathBuf::from("/var/cache/ww"));
    }

    #[test]
    fn test_load_from_creates_default_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let created = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created.config_dir, dir.path());

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.forecast.forecast_days, 7);
        assert_eq!(loaded.http.retry_statuses, vec![429, 500, 502, 503, 504]);
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "config_dir = \"/tmp/ww\"\n\n[forecast]\napi_url = \"http://localhost:9000/v1/ensemble\"\nmodels = [\"gfs_seamless\"]\nforecast_days = 3\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.forecast.models, vec!["gfs_seamless".to_string()]);
        assert_eq!(config.cache.expire_after_secs, 3600);
        assert_eq!(config.location.default_latitude, 11.9338);
    }

    #[test]
    fn test_unparseable_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[forecast\n").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_validated_joins_every_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.forecast.models.clear();
        config.http.timeout_secs = 0;
        config.save_to(&path).unwrap();

        match Config::load_validated(Some(&path)) {
            Err(ConfigError::Invalid(summary)) => {
                assert!(summary.contains("forecast.models"));
                assert!(summary.contains("http.timeout_secs"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }
}
