use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use axum_crud_panel::{Identity, Role};

pub const CONFIG_PATH_VAR: &str = "CRUD_PANEL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "panel.toml";

const MAX_PAGE_SIZE: u64 = 500;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidOverride { name: &'static str, value: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub server: ServerConfig,
    pub log: LogConfig,
    pub panel: PanelSettings,
    pub users: Vec<UserConfig>,
    pub connections: Vec<ConnectionConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub base_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            base_path: "/panel".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub page_size: u64,
    /// Seconds a table session may sit unused before it is dropped
    pub session_idle_secs: u64,
    pub max_sessions_per_user: usize,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            page_size: axum_crud_panel::layer::DEFAULT_PAGE_SIZE,
            session_idle_secs: axum_crud_panel::session::DEFAULT_IDLE_TIMEOUT.as_secs(),
            max_sessions_per_user: axum_crud_panel::session::DEFAULT_MAX_SESSIONS_PER_USER,
        }
    }
}

/// A bearer token and the identity it authenticates as
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub tenant: String,
    pub role: Role,
}

impl UserConfig {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            tenant: self.tenant.clone(),
            role: self.role,
        }
    }
}

/// A connection registered for a tenant at start-up
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub tenant: String,
    pub name: String,
    pub url: String,
}

impl PanelConfig {
    /// Path of the config file: `$CRUD_PANEL_CONFIG` or `panel.toml`
    pub fn config_path() -> PathBuf {
        env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Loads the config file, applies environment overrides and validates.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(&Self::config_path())?;
        config.apply_overrides(|name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a config file.
    ///
    /// A missing file yields `PanelConfig::default()`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(PanelConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Applies `CRUD_PANEL_BIND`, `CRUD_PANEL_BASE_PATH` and
    /// `CRUD_PANEL_LOG_JSON` from `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(bind) = lookup("CRUD_PANEL_BIND") {
            self.server.bind = bind;
        }
        if let Some(base_path) = lookup("CRUD_PANEL_BASE_PATH") {
            self.server.base_path = base_path;
        }
        if let Some(value) = lookup("CRUD_PANEL_LOG_JSON") {
            self.log.json = match value.as_str() {
                "1" | "true" | "TRUE" | "yes" | "YES" => true,
                "0" | "false" | "FALSE" | "no" | "NO" => false,
                _ => {
                    return Err(ConfigError::InvalidOverride {
                        name: "CRUD_PANEL_LOG_JSON",
                        value,
                    })
                }
            };
        }
        Ok(())
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The base path is empty or starts with `/` without a trailing `/`
    /// - Page size is between 1 and 500
    /// - Session idle timeout and per-user cap are non-zero
    /// - Tokens are non-empty and unique
    /// - Every pre-registered connection belongs to a tenant with a user
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_path = &self.server.base_path;
        if !base_path.is_empty() && (!base_path.starts_with('/') || base_path.ends_with('/')) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Base path '{}' must start with '/' and must not end with '/'",
                    base_path
                ),
            });
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.panel.page_size) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Page size {} is outside 1..={}",
                    self.panel.page_size, MAX_PAGE_SIZE
                ),
            });
        }

        if self.panel.session_idle_secs == 0 || self.panel.max_sessions_per_user == 0 {
            return Err(ConfigError::ValidationError {
                message: "Session idle timeout and per-user session cap must be non-zero"
                    .to_string(),
            });
        }

        let mut tokens = HashSet::new();
        for user in &self.users {
            if user.token.is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("User '{}' has an empty token", user.user_id),
                });
            }
            if !tokens.insert(user.token.as_str()) {
                return Err(ConfigError::ValidationError {
                    message: format!("User '{}' reuses another user's token", user.user_id),
                });
            }
        }

        for connection in &self.connections {
            if !self.users.iter().any(|u| u.tenant == connection.tenant) {
                return Err(ConfigError::ValidationError {
                    message: format!(
                        "Connection '{}' belongs to tenant '{}' which has no users",
                        connection.name, connection.tenant
                    ),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[server]
bind = "0.0.0.0:8080"
base_path = "/admin"

[log]
json = true

[panel]
page_size = 25
session_idle_secs = 600
max_sessions_per_user = 4

[[users]]
token = "t-ada"
user_id = "u1"
email = "ada@example.com"
tenant = "acme"
role = "ADMIN"

[[users]]
token = "t-bob"
user_id = "u2"
email = "bob@example.com"
tenant = "acme"
role = "VIEWER"

[[connections]]
tenant = "acme"
name = "main"
url = "postgres://panel@localhost/acme"
"#;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_full_file() {
        let file = write_config(SAMPLE);
        let config = PanelConfig::from_file(file.path()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.base_path, "/admin");
        assert!(config.log.json);
        assert_eq!(config.panel.page_size, 25);
        assert_eq!(config.panel.session_idle_secs, 600);
        assert_eq!(config.panel.max_sessions_per_user, 4);
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[1].role, Role::Viewer);
        assert_eq!(config.users[0].identity().tenant, "acme");
        assert_eq!(config.connections[0].name, "main");
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PanelConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.server.base_path, "/panel");
        assert!(!config.log.json);
        assert_eq!(config.panel.page_size, 50);
        assert_eq!(config.panel.session_idle_secs, 1800);
        assert_eq!(config.panel.max_sessions_per_user, 16);
        config.validate().unwrap();
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let file = write_config("[server\nbind = 1");
        let err = PanelConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn unknown_role_is_parse_error() {
        let file = write_config(
            "[[users]]\ntoken = \"t\"\nuser_id = \"u\"\nemail = \"e\"\ntenant = \"x\"\nrole = \"ROOT\"\n",
        );
        let err = PanelConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn overrides_replace_file_values() {
        let file = write_config(SAMPLE);
        let mut config = PanelConfig::from_file(file.path()).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("CRUD_PANEL_BIND", "127.0.0.1:9000"),
            ("CRUD_PANEL_BASE_PATH", "/ops"),
            ("CRUD_PANEL_LOG_JSON", "no"),
        ]);
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.base_path, "/ops");
        assert!(!config.log.json);
    }

    #[test]
    fn bad_log_override_is_rejected() {
        let mut config = PanelConfig::default();
        let err = config
            .apply_overrides(|name| (name == "CRUD_PANEL_LOG_JSON").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
    }

    #[test]
    fn rejects_trailing_slash_base_path() {
        let mut config = PanelConfig::default();
        config.server.base_path = "/panel/".to_string();
        assert!(config.validate().is_err());

        config.server.base_path = "panel".to_string();
        assert!(config.validate().is_err());

        config.server.base_path = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        let mut config = PanelConfig::default();
        config.panel.page_size = 0;
        assert!(config.validate().is_err());
        config.panel.page_size = 501;
        assert!(config.validate().is_err());
        config.panel.page_size = 500;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_session_limits() {
        let mut config = PanelConfig::default();
        config.panel.session_idle_secs = 0;
        assert!(config.validate().is_err());

        let mut config = PanelConfig::default();
        config.panel.max_sessions_per_user = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_tokens() {
        let file = write_config(&SAMPLE.replace("t-bob", "t-ada"));
        let config = PanelConfig::from_file(file.path()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("u2"));
    }

    #[test]
    fn rejects_connection_for_tenant_without_users() {
        let file = write_config(&SAMPLE.replace("tenant = \"acme\"\nname", "tenant = \"globex\"\nname"));
        let config = PanelConfig::from_file(file.path()).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("globex"));
    }
}
