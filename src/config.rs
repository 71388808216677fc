use std::{env, fmt, net::IpAddr, str::FromStr};

use dotenvy::dotenv;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::{errors::ConfigError, store::StoreBackend, utils::code_generator::CodeFormat};

// Server-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub workers: usize,
}

// Application-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub log_level: String,
}

// Environment enum for different deployment environments
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

// Implement FromStr trait for Environment enum to enable parsing from string
impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!(
                "Invalid environment: {}. Must be one of: development, testing, production",
                s
            )),
        }
    }
}

// Result type for configuration functions
type ConfigResult<T> = Result<T, ConfigError>;

/// Key-value store selection
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
}

/// Fixed-window rate limiting parameters
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_seconds: u64,
    pub max_requests: u32,
    /// Lower bound on the TTL written when an open window is rewritten
    pub ttl_floor_seconds: u64,
    /// Request header carrying the client address
    pub identity_header: String,
    /// Identity used when the header is missing
    pub fallback_identity: String,
}

/// Link allocation and resolution parameters
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub ttl_seconds: u64,
    pub code_format: CodeFormat,
    pub max_attempts: u32,
    pub uppercase_fallback: bool,
    pub cache_max_age_seconds: u64,
}

impl LinkConfig {
    /// Cache hint for resolved links, never longer than the link lifetime.
    pub fn effective_cache_max_age(&self) -> u64 {
        self.cache_max_age_seconds.min(self.ttl_seconds)
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    /// Checks an origin against the configured patterns. A trailing `*`
    /// matches any suffix, so `http://localhost:*` admits every local port.
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|pattern| {
            if pattern == "*" {
                return true;
            }
            match pattern.strip_suffix('*') {
                Some(prefix) => origin.starts_with(prefix),
                None => pattern == origin,
            }
        })
    }
}

#[derive(Clone, Default)]
pub struct AdminConfig {
    pub secret: Option<String>,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
    pub links: LinkConfig,
    pub cors: CorsConfig,
    pub admin: AdminConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_seconds: 60,
            max_requests: 10,
            ttl_floor_seconds: 60,
            identity_header: "cf-connecting-ip".to_string(),
            fallback_identity: "global".to_string(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            code_format: CodeFormat::Compact,
            max_attempts: 16,
            uppercase_fallback: true,
            cache_max_age_seconds: 300,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:*".to_string(),
                "https://timed.cc".to_string(),
            ],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: IpAddr::from([127, 0, 0, 1]),
                port: 8000,
                workers: 4,
            },
            app: AppConfig {
                name: "timed-links".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                environment: Environment::Development,
                log_level: "info".to_string(),
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                redis_url: "redis://127.0.0.1:6379".to_string(),
            },
            rate_limit: RateLimitConfig::default(),
            links: LinkConfig::default(),
            cors: CorsConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl Config {
    // Load configuration from environment variables
    pub fn load() -> ConfigResult<Self> {
        // Load .env file if it exists
        match dotenv() {
            Ok(_) => debug!(".env file loaded successfully"),
            Err(e) => warn!("Could not load .env file: {}", e),
        }

        // Create the server config
        let server = ServerConfig {
            host: get_env_or_default("SERVER_HOST", "127.0.0.1")?,
            port: get_env_or_default("SERVER_PORT", "8000")?,
            workers: get_env_or_default("SERVER_WORKERS", "4")?,
        };

        // Get version from Cargo.toml or environment
        let version = env!("CARGO_PKG_VERSION").to_string();

        // Create the app config
        let app = AppConfig {
            name: get_env_or_default("APP_NAME", "timed-links")?,
            version: env::var("APP_VERSION").unwrap_or(version),
            environment: get_env_or_default("APP_ENVIRONMENT", "development")?,
            log_level: get_env_or_default("RUST_LOG", "info")?,
        };

        let store = StoreConfig {
            backend: get_env_or_default("STORE_BACKEND", "memory")?,
            redis_url: get_env_or_default("REDIS_URL", "redis://127.0.0.1:6379")?,
        };

        let rate_limit = RateLimitConfig {
            window_seconds: get_env_or_default("RATE_LIMIT_WINDOW_SECONDS", "60")?,
            max_requests: get_env_or_default("RATE_LIMIT_MAX_REQUESTS", "10")?,
            ttl_floor_seconds: get_env_or_default("RATE_LIMIT_TTL_FLOOR_SECONDS", "60")?,
            identity_header: get_env_or_default("RATE_LIMIT_IDENTITY_HEADER", "cf-connecting-ip")?,
            fallback_identity: get_env_or_default("RATE_LIMIT_FALLBACK_IDENTITY", "global")?,
        };

        let code_format = match get_optional_env("LINK_CODE_SEPARATOR")? {
            Some(separator) => CodeFormat::Separated(parse_separator(&separator)?),
            None => CodeFormat::Compact,
        };

        let links = LinkConfig {
            ttl_seconds: get_env_or_default("LINK_TTL_SECONDS", "300")?,
            code_format,
            max_attempts: get_env_or_default("LINK_MAX_ATTEMPTS", "16")?,
            uppercase_fallback: get_env_or_default("LINK_UPPERCASE_FALLBACK", "true")?,
            cache_max_age_seconds: get_env_or_default("LINK_CACHE_MAX_AGE_SECONDS", "300")?,
        };

        let cors = CorsConfig {
            allowed_origins: parse_list(&get_env_or_default::<String>(
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:*,https://timed.cc",
            )?),
        };

        let admin = AdminConfig {
            secret: get_optional_env("ADMIN_SECRET")?,
        };
        if admin.secret.is_none() {
            warn!("ADMIN_SECRET not set, admin listing is disabled");
        }

        let config = Config {
            server,
            app,
            store,
            rate_limit,
            links,
            cors,
            admin,
        };
        config.validate()?;

        info!("Configuration loaded successfully");
        debug!("Loaded config: {:?}", config);

        Ok(config)
    }

    /// Rejects values the store cannot honour (zero TTLs) or that would make
    /// every request fail.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.rate_limit.window_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_WINDOW_SECONDS must be positive".to_string(),
            ));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::InvalidValue(
                "RATE_LIMIT_MAX_REQUESTS must be positive".to_string(),
            ));
        }
        if self.links.ttl_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "LINK_TTL_SECONDS must be positive".to_string(),
            ));
        }
        if self.links.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "LINK_MAX_ATTEMPTS must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Helper function to get an env variable with a default value
fn get_env_or_default<T: FromStr>(key: &str, default: &str) -> ConfigResult<T>
where
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(format!("Could not parse {}: {}", key, e))),
        Err(env::VarError::NotPresent) => {
            debug!("{} not set, using default: {}", key, default);
            default.parse::<T>().map_err(|e| {
                ConfigError::ParseError(format!("Could not parse default for {}: {}", key, e))
            })
        }
        Err(e) => Err(ConfigError::EnvVarError(e)),
    }
}

/// Like `get_env_or_default` but for settings without a default; blank
/// values count as unset.
fn get_optional_env(key: &str) -> ConfigResult<Option<String>> {
    match env::var(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvVarError(e)),
    }
}

fn parse_separator(value: &str) -> ConfigResult<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::ParseError(format!(
            "LINK_CODE_SEPARATOR must be a single character, got '{}'",
            value
        ))),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
