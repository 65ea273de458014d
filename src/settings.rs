use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Which storage adapter backs the image repository.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryBackend {
    Postgres,
    Memory,
}

impl FromStr for RepositoryBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(RepositoryBackend::Postgres),
            "memory" => Ok(RepositoryBackend::Memory),
            _ => Err(ConfigError::Message(format!("Invalid repository backend: {}", s))),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_backend")]
    pub repository_backend: RepositoryBackend,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_save_retry_attempts")]
    pub save_retry_attempts: u32,

    #[serde(default)]
    pub console_username: String,

    #[serde(default)]
    pub console_password: String,

    /// Comma separated list of allowed origins for the `/images` scope.
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: String,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Image-Board".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_backend() -> RepositoryBackend {
    RepositoryBackend::Postgres
}
fn default_max_connections() -> u32 {
    20
}
fn default_request_timeout() -> u64 {
    10
}
fn default_save_retry_attempts() -> u32 {
    3
}
fn default_cors_origins() -> String {
    "*".to_string()
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(Environment::with_prefix("APP").try_parsing(true).ignore_empty(true));

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        if config.repository_backend == RepositoryBackend::Postgres {
            config.database_url = fill_or_env(config.database_url, "DATABASE_URL")?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests and local experiments: in-memory storage, ephemeral port.
    pub fn for_testing() -> Self {
        AppConfig {
            env: AppEnvironment::Testing,
            name: "Image-Board Test".to_string(),
            port: 0,
            host: "127.0.0.1".to_string(),
            worker_count: 1,
            repository_backend: RepositoryBackend::Memory,
            database_url: String::new(),
            max_connections: 5,
            request_timeout_secs: 5,
            save_retry_attempts: default_save_retry_attempts(),
            console_username: "operator".to_string(),
            console_password: "operator-secret".to_string(),
            cors_allowed_origins: default_cors_origins(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.repository_backend == RepositoryBackend::Postgres && self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty when the postgres backend is selected");
        }
        if self.request_timeout_secs == 0 {
            errors.push("REQUEST_TIMEOUT_SECS must be greater than zero");
        }
        if self.worker_count == 0 {
            errors.push("WORKER_COUNT must be greater than zero");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }
        if self.is_production() && !self.console_enabled() {
            errors.push("CONSOLE_USERNAME and CONSOLE_PASSWORD must be set in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn console_enabled(&self) -> bool {
        !self.console_username.is_empty() && !self.console_password.is_empty()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for RepositoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RepositoryBackend::Postgres => "postgres",
            RepositoryBackend::Memory => "memory",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("repository_backend", &self.repository_backend)
            .field("database_url", &self.database_url.redact())
            .field("max_connections", &self.max_connections)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("save_retry_attempts", &self.save_retry_attempts)
            .field("console_username", &self.console_username)
            .field("console_password", &self.console_password.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish()
    }
}
