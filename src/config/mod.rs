//! Configuration management
//!
//! This module handles loading and parsing configuration for the coursedeck server.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// CMS backend configuration
    #[serde(default)]
    pub cms: CmsConfig,
    /// Session cookie configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Page navigation guard configuration
    #[serde(default)]
    pub guard: GuardConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origin (for cookie-based auth)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Directory holding the built frontend
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

/// CMS backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// Base URL of the CMS REST API, e.g. `http://cms:1337/api`
    #[serde(default = "default_cms_url")]
    pub url: String,
    /// Only URLs under this origin may pass through the media relay
    #[serde(default = "default_media_origin")]
    pub media_origin: String,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            url: default_cms_url(),
            media_origin: default_media_origin(),
        }
    }
}

fn default_cms_url() -> String {
    "http://localhost:1337/api".to_string()
}

fn default_media_origin() -> String {
    "http://54.38.138.75:1337/".to_string()
}

impl CmsConfig {
    /// API base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Media origin, always ending with exactly one `/`
    ///
    /// The trailing slash keeps `http://host:1337.evil.com/` from matching
    /// an origin of `http://host:1337`.
    pub fn media_origin(&self) -> String {
        format!("{}/", self.media_origin.trim_end_matches('/'))
    }
}

/// Session cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie name
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// HMAC key for cookie signatures; generated at startup when absent
    #[serde(default)]
    pub secret: Option<String>,
    /// Cookie lifetime in seconds
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
    /// Whether the cookie carries the `Secure` attribute
    #[serde(default = "default_secure")]
    pub secure: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secret: None,
            max_age_secs: default_max_age(),
            secure: default_secure(),
        }
    }
}

fn default_cookie_name() -> String {
    "token".to_string()
}

fn default_max_age() -> u64 {
    60 * 60 * 24 * 7 // 7 days
}

fn default_secure() -> bool {
    true
}

/// Page navigation guard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Paths under these prefixes require a session
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,
    /// Paths that signed-in users are sent away from
    #[serde(default = "default_guest_only_exact")]
    pub guest_only_exact: Vec<String>,
    /// Prefixes that signed-in users are sent away from
    #[serde(default = "default_guest_only_prefixes")]
    pub guest_only_prefixes: Vec<String>,
    /// Where signed-in users land
    #[serde(default = "default_home_path")]
    pub home_path: String,
    /// Where anonymous users land
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: default_protected_prefixes(),
            guest_only_exact: default_guest_only_exact(),
            guest_only_prefixes: default_guest_only_prefixes(),
            home_path: default_home_path(),
            login_path: default_login_path(),
        }
    }
}

fn default_protected_prefixes() -> Vec<String> {
    ["/home", "/discover", "/teachers", "/create", "/course"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_guest_only_exact() -> Vec<String> {
    vec!["/".to_string()]
}

fn default_guest_only_prefixes() -> Vec<String> {
    ["/mission-pl", "/mission-en", "/auth"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_home_path() -> String {
    "/home".to_string()
}

fn default_login_path() -> String {
    "/auth".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - COURSEDECK_SERVER_HOST
    /// - COURSEDECK_SERVER_PORT
    /// - COURSEDECK_SERVER_CORS_ORIGIN
    /// - COURSEDECK_SERVER_STATIC_DIR
    /// - COURSEDECK_CMS_URL (falls back to STRAPI_URL)
    /// - COURSEDECK_CMS_MEDIA_ORIGIN
    /// - COURSEDECK_SESSION_SECRET
    /// - COURSEDECK_SESSION_SECURE
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        // Server configuration
        if let Ok(host) = std::env::var("COURSEDECK_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("COURSEDECK_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(cors_origin) = std::env::var("COURSEDECK_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = cors_origin;
        }
        if let Ok(dir) = std::env::var("COURSEDECK_SERVER_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }

        // CMS configuration
        if let Ok(url) = std::env::var("COURSEDECK_CMS_URL").or_else(|_| std::env::var("STRAPI_URL")) {
            self.cms.url = url;
        }
        if let Ok(origin) = std::env::var("COURSEDECK_CMS_MEDIA_ORIGIN") {
            self.cms.media_origin = origin;
        }

        // Session configuration
        if let Ok(secret) = std::env::var("COURSEDECK_SESSION_SECRET") {
            self.session.secret = Some(secret);
        }
        if let Ok(secure) = std::env::var("COURSEDECK_SESSION_SECURE") {
            match secure.to_lowercase().as_str() {
                "true" | "1" | "yes" => self.session.secure = true,
                "false" | "0" | "no" => self.session.secure = false,
                _ => {} // Ignore invalid values
            }
        }
    }

    /// Reject configurations the server cannot run with
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [("cms.url", &self.cms.url), ("cms.media_origin", &self.cms.media_origin)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "session.cookie_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for all config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
const ENV_KEYS: &[&str] = &[
    "COURSEDECK_SERVER_HOST",
    "COURSEDECK_SERVER_PORT",
    "COURSEDECK_SERVER_CORS_ORIGIN",
    "COURSEDECK_SERVER_STATIC_DIR",
    "COURSEDECK_CMS_URL",
    "COURSEDECK_CMS_MEDIA_ORIGIN",
    "COURSEDECK_SESSION_SECRET",
    "COURSEDECK_SESSION_SECURE",
    "STRAPI_URL",
];

#[cfg(test)]
fn clear_env() {
    for key in ENV_KEYS {
        std::env::remove_var(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        super::CONFIG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let path = std::path::Path::new("nonexistent_config.yml");
        let config = Config::load(path).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.static_dir, PathBuf::from("public"));
        assert_eq!(config.cms.url, "http://localhost:1337/api");
        assert_eq!(config.cms.media_origin(), "http://54.38.138.75:1337/");
        assert_eq!(config.session.cookie_name, "token");
        assert_eq!(config.session.max_age_secs, 604800);
        assert!(config.session.secure);
        assert!(config.session.secret.is_none());
        assert_eq!(config.guard.home_path, "/home");
        assert_eq!(config.guard.login_path, "/auth");
    }

    #[test]
    fn test_load_empty_file_returns_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: 8080\n").unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.session.cookie_name, "token");
        assert_eq!(config.guard.protected_prefixes.len(), 5);
    }

    #[test]
    fn test_load_full_config() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"
server:
  host: "127.0.0.1"
  port: 9000
  cors_origin: "https://courses.example.com"
  static_dir: "dist"
cms:
  url: "https://cms.example.com/api/"
  media_origin: "https://cms.example.com"
session:
  cookie_name: "sid"
  secret: "s3cret"
  max_age_secs: 3600
  secure: false
guard:
  protected_prefixes: ["/dashboard"]
  guest_only_exact: ["/"]
  guest_only_prefixes: ["/login"]
  home_path: "/dashboard"
  login_path: "/login"
"#).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.cors_origin, "https://courses.example.com");
        assert_eq!(config.server.static_dir, PathBuf::from("dist"));
        assert_eq!(config.cms.base_url(), "https://cms.example.com/api");
        assert_eq!(config.cms.media_origin(), "https://cms.example.com/");
        assert_eq!(config.session.cookie_name, "sid");
        assert_eq!(config.session.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.session.max_age_secs, 3600);
        assert!(!config.session.secure);
        assert_eq!(config.guard.protected_prefixes, vec!["/dashboard".to_string()]);
        assert_eq!(config.guard.login_path, "/login");
    }

    #[test]
    fn test_load_invalid_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  port: not_a_number\n").unwrap();

        let result = Config::load(file.path());

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("parse") || err_msg.contains("invalid"));
    }

    #[test]
    fn test_load_malformed_yaml_returns_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: [invalid yaml").unwrap();

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_load_rejects_non_http_cms_url() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "cms:\n  url: \"ftp://cms\"\n").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("cms.url"));
    }

    #[test]
    fn test_media_origin_normalization() {
        let mut cms = CmsConfig::default();
        cms.media_origin = "http://media.local:1337///".to_string();
        assert_eq!(cms.media_origin(), "http://media.local:1337/");
        cms.media_origin = "http://media.local:1337".to_string();
        assert_eq!(cms.media_origin(), "http://media.local:1337/");
    }

    #[test]
    fn test_env_override_server_and_cms_config() {
        let _guard = lock_env();
        clear_env();

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "server:\n  host: \"0.0.0.0\"\n  port: 3000\n").unwrap();

        std::env::set_var("COURSEDECK_SERVER_HOST", "192.168.1.1");
        std::env::set_var("COURSEDECK_SERVER_PORT", "9999");
        std::env::set_var("COURSEDECK_CMS_URL", "http://cms.internal/api");
        std::env::set_var("COURSEDECK_SESSION_SECURE", "false");

        let config = Config::load_with_env(file.path()).unwrap();

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.cms.url, "http://cms.internal/api");
        assert!(!config.session.secure);

        clear_env();
    }

    #[test]
    fn test_env_strapi_url_fallback() {
        let _guard = lock_env();
        clear_env();

        std::env::set_var("STRAPI_URL", "http://strapi:1337/api");
        let config = Config::load_with_env(std::path::Path::new("nonexistent.yml")).unwrap();
        assert_eq!(config.cms.url, "http://strapi:1337/api");

        std::env::set_var("COURSEDECK_CMS_URL", "http://preferred/api");
        let config = Config::load_with_env(std::path::Path::new("nonexistent.yml")).unwrap();
        assert_eq!(config.cms.url, "http://preferred/api");

        clear_env();
    }

    #[test]
    fn test_env_override_invalid_values_ignored() {
        let _guard = lock_env();
        clear_env();

        std::env::set_var("COURSEDECK_SERVER_PORT", "not_a_port");
        std::env::set_var("COURSEDECK_SESSION_SECURE", "maybe");

        let config = Config::load_with_env(std::path::Path::new("nonexistent.yml")).unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.session.secure);

        clear_env();
    }
}
