use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Longest finished-job retention accepted, ten years.
pub const MAX_RETENTION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
    pub resolver: ResolverConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub chrome_path: Option<String>,
    pub launch_retry_attempts: usize,
    pub launch_retry_delay_ms: u64,
    pub navigation_timeout_secs: u64,
    pub element_timeout_secs: u64,
    pub result_timeout_secs: u64,
    /// Pause after interactions so the vendor's page scripts can catch up.
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub extra_trims: usize,
    pub too_broad_retry_delay_ms: u64,
    pub too_broad_threshold: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub max_concurrent_jobs: usize,
    pub retention_secs: Option<u64>,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    pub directory: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub result_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            request_timeout: 30,
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            launch_retry_attempts: 2,
            launch_retry_delay_ms: 1000,
            navigation_timeout_secs: 60,
            element_timeout_secs: 30,
            result_timeout_secs: 15,
            settle_delay_ms: 1000,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extra_trims: 3,
            too_broad_retry_delay_ms: 2000,
            too_broad_threshold: 50_000,
        }
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            retention_secs: None,
            sweep_interval_secs: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "socket_finder=info,tower_http=info".to_string(),
            directory: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            result_file: "search_results.txt".to_string(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_secs(self.result_timeout_secs)
    }

    /// The settle pause scaled by `factor`; vendors wait longer after heavy interactions.
    pub fn settle(&self, factor: u32) -> Duration {
        Duration::from_millis(self.settle_delay_ms) * factor
    }
}

impl ResolverConfig {
    pub fn too_broad_retry_delay(&self) -> Duration {
        Duration::from_millis(self.too_broad_retry_delay_ms)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Built-in defaults so the binary runs without any config files
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("SOCKET_FINDER").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }

        // Hosting platforms hand the port over in PORT
        if let Ok(port) = env::var("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Message(format!("PORT is not a valid port: {}", port)))?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if self.server.request_timeout == 0 {
            return Err(ConfigError::Message("Server request_timeout must be greater than 0".into()));
        }

        if self.browser.navigation_timeout_secs == 0
            || self.browser.element_timeout_secs == 0
            || self.browser.result_timeout_secs == 0
        {
            return Err(ConfigError::Message("Browser timeouts must be greater than 0".into()));
        }

        if !(1..=8).contains(&self.resolver.extra_trims) {
            return Err(ConfigError::Message("Resolver extra_trims must be between 1 and 8".into()));
        }

        if self.resolver.too_broad_threshold == 0 {
            return Err(ConfigError::Message("Resolver too_broad_threshold must be greater than 0".into()));
        }

        if self.jobs.max_concurrent_jobs == 0 {
            return Err(ConfigError::Message("Jobs max_concurrent_jobs must be greater than 0".into()));
        }

        if self.jobs.retention_secs == Some(0) {
            return Err(ConfigError::Message("Jobs retention_secs must be greater than 0 when set".into()));
        }

        if self.jobs.retention_secs.is_some_and(|secs| secs > MAX_RETENTION_SECS) {
            return Err(ConfigError::Message(format!(
                "Jobs retention_secs must be at most {}",
                MAX_RETENTION_SECS
            )));
        }

        if self.jobs.sweep_interval_secs == 0 {
            return Err(ConfigError::Message("Jobs sweep_interval_secs must be greater than 0".into()));
        }

        if self.output.result_file.trim().is_empty() {
            return Err(ConfigError::Message("Output result_file must not be empty".into()));
        }

        Ok(())
    }
}
