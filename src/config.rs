use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CLEANUP_DELAY_SECS: u64 = 5 * 60; // 5 minutes
const DEFAULT_SESSION_TTL_SECS: u64 = 24 * 60 * 60; // 24 hours
const DEFAULT_UPLOAD_LIMIT_MB: usize = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Server configuration
///
/// Read from environment variables by [`Config::from_env`]; every setting has
/// a default so the server starts with no environment at all.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to (`HOST`, `PORT`)
    pub bind_addr: SocketAddr,

    /// Where uploads are kept until filtered or expired (`UPLOAD_DIR`)
    pub upload_dir: PathBuf,

    /// Directory served under `/static` (`STATIC_DIR`)
    pub static_dir: PathBuf,

    /// Secret used to sign session cookies (`SECRET_KEY`)
    pub secret_key: Option<String>,

    /// Delay before an upload is deleted if never filtered (`CLEANUP_DELAY_SECS`)
    pub cleanup_delay: Duration,

    /// Lifetime of a session (`SESSION_TTL_SECS`)
    pub session_ttl: Duration,

    /// Maximum request body size in bytes (`UPLOAD_LIMIT_MB`)
    pub upload_limit_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            upload_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("public"),
            secret_key: None,
            cleanup_delay: Duration::from_secs(DEFAULT_CLEANUP_DELAY_SECS),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_MB * 1024 * 1024,
        }
    }
}

impl Config {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable, or `None` when unset
    ///
    /// # Returns
    /// * `Result<Config, ConfigError>` - The configuration or the first invalid variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let host: IpAddr = parse_or(&lookup, "HOST", defaults.bind_addr.ip())?;
        let port: u16 = parse_or(&lookup, "PORT", defaults.bind_addr.port())?;
        let cleanup_secs = parse_or(&lookup, "CLEANUP_DELAY_SECS", DEFAULT_CLEANUP_DELAY_SECS)?;
        let ttl_secs = parse_or(&lookup, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let limit_mb: usize = parse_or(&lookup, "UPLOAD_LIMIT_MB", DEFAULT_UPLOAD_LIMIT_MB)?;

        Ok(Config {
            bind_addr: SocketAddr::new(host, port),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            secret_key: lookup("SECRET_KEY").filter(|key| !key.is_empty()),
            cleanup_delay: Duration::from_secs(cleanup_secs),
            session_ttl: Duration::from_secs(ttl_secs),
            upload_limit_bytes: limit_mb.saturating_mul(1024 * 1024),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.cleanup_delay, Duration::from_secs(300));
        assert_eq!(config.upload_limit_bytes, 50 * 1024 * 1024);
        assert_eq!(config.secret_key, None);
    }

    #[test]
    fn variables_override_defaults() {
        let config = config_from(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("UPLOAD_DIR", "/tmp/up"),
            ("SECRET_KEY", "s3cret"),
            ("CLEANUP_DELAY_SECS", "10"),
            ("SESSION_TTL_SECS", "60"),
            ("UPLOAD_LIMIT_MB", "1"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/up"));
        assert_eq!(config.secret_key.as_deref(), Some("s3cret"));
        assert_eq!(config.cleanup_delay, Duration::from_secs(10));
        assert_eq!(config.session_ttl, Duration::from_secs(60));
        assert_eq!(config.upload_limit_bytes, 1024 * 1024);
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();

        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn empty_secret_counts_as_unset() {
        let config = config_from(&[("SECRET_KEY", "")]).unwrap();
        assert_eq!(config.secret_key, None);
    }
}
