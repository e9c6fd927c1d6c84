//! Configuration for the telemetry shipper

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Fallback collector base URL when `GAVLIK_API_URL` is unset.
pub const DEFAULT_COLLECTOR_URL: &str = "http://localhost:3001";

/// Path appended to the collector base URL.
pub const DEFAULT_COLLECTOR_PATH: &str = "/api/logs";

/// Default period of the background flush timer.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Environment variable holding the collector base URL.
pub const ENV_API_URL: &str = "GAVLIK_API_URL";

/// Environment variable selecting the build environment.
pub const ENV_ENVIRONMENT: &str = "GAVLIK_ENV";

/// Build environment the shipper runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development: debug entries are recorded and entries echo locally.
    Development,
    /// Anything else.
    Production,
}

impl Environment {
    /// Environment implied by the compilation profile.
    #[must_use]
    pub const fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    /// Whether this is a development environment.
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" | "staging" | "test" => Ok(Self::Production),
            other => Err(Error::Configuration(format!(
                "unknown environment {other:?}"
            ))),
        }
    }
}

/// Configuration for the telemetry shipper
#[derive(Debug, Clone)]
pub struct ShipperConfig {
    /// Collector base URL
    pub collector_url: Url,
    /// Path appended to the base URL
    pub collector_path: String,
    /// Period of the background flush timer
    pub flush_interval: Duration,
    /// Build environment
    pub environment: Environment,
    /// Echo every recorded entry to the local `tracing` sink
    pub echo_to_console: bool,
    /// Per-request timeout; `None` leaves it to the transport
    pub request_timeout: Option<Duration>,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        let environment = Environment::from_build();
        Self {
            collector_url: default_collector_url(),
            collector_path: DEFAULT_COLLECTOR_PATH.to_string(),
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            environment,
            echo_to_console: environment.is_development(),
            request_timeout: None,
        }
    }
}

impl ShipperConfig {
    /// Create a builder with default values
    #[must_use]
    pub fn builder() -> ShipperConfigBuilder {
        ShipperConfigBuilder::new()
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if `GAVLIK_API_URL` is not a valid URL or `GAVLIK_ENV` names an
    /// unknown environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ShipperConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();

        if let Some(url) = lookup(ENV_API_URL).filter(|url| !url.trim().is_empty()) {
            builder = builder.collector_url(Url::parse(url.trim())?);
        }

        if let Some(environment) = lookup(ENV_ENVIRONMENT) {
            let environment: Environment = environment.parse()?;
            builder = builder
                .environment(environment)
                .echo_to_console(environment.is_development());
        }

        Ok(builder.build())
    }

    /// Full collector endpoint: base URL with the path appended verbatim.
    ///
    /// # Errors
    ///
    /// Fails if the combined string is not a valid URL.
    pub fn endpoint(&self) -> Result<Url> {
        let base = self.collector_url.as_str().trim_end_matches('/');
        let path = self.collector_path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

/// Builder for [`ShipperConfig`]
#[derive(Debug, Clone, Default)]
pub struct ShipperConfigBuilder {
    config: ShipperConfig,
}

impl ShipperConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ShipperConfig::default(),
        }
    }

    /// Set the collector base URL
    #[must_use]
    pub fn collector_url(mut self, url: Url) -> Self {
        self.config.collector_url = url;
        self
    }

    /// Set the path appended to the collector base URL
    #[must_use]
    pub fn collector_path(mut self, path: impl Into<String>) -> Self {
        self.config.collector_path = path.into();
        self
    }

    /// Set the background flush period
    #[must_use]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Set the build environment
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    /// Set whether entries are echoed to the local `tracing` sink
    #[must_use]
    pub fn echo_to_console(mut self, echo: bool) -> Self {
        self.config.echo_to_console = echo;
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> ShipperConfig {
        self.config
    }
}

fn default_collector_url() -> Url {
    Url::parse(DEFAULT_COLLECTOR_URL).expect("default collector url is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ShipperConfig::default();

        assert_eq!(config.flush_interval, Duration::from_secs(5));
        assert_eq!(config.collector_path, "/api/logs");
        assert_eq!(config.request_timeout, None);
        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "http://localhost:3001/api/logs"
        );
    }

    #[test]
    fn test_endpoint_appends_to_base_path() {
        let config = ShipperConfig::builder()
            .collector_url(Url::parse("https://api.gavlik.example/v2/").unwrap())
            .build();

        assert_eq!(
            config.endpoint().unwrap().as_str(),
            "https://api.gavlik.example/v2/api/logs"
        );
    }

    #[test]
    fn test_from_lookup_falls_back() {
        let config = ShipperConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.collector_url.as_str(), "http://localhost:3001/");
        assert_eq!(config.environment, Environment::from_build());
    }

    #[test]
    fn test_from_lookup_reads_variables() {
        let config = ShipperConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://collector.gavlik.example"),
            (ENV_ENVIRONMENT, "production"),
        ]))
        .unwrap();

        assert_eq!(config.collector_url.host_str(), Some("collector.gavlik.example"));
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.echo_to_console);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert!(matches!(
            ShipperConfig::from_lookup(lookup(&[(ENV_API_URL, "not a url")])),
            Err(Error::InvalidUrl(_))
        ));
        assert!(matches!(
            ShipperConfig::from_lookup(lookup(&[(ENV_ENVIRONMENT, "moon")])),
            Err(Error::Configuration(_))
        ));
    }
}
