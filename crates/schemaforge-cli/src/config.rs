use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;
use thiserror::Error;

use schemaforge_core::ExtractOptions;
use schemaforge_introspect::IntrospectOptions;

/// Environment variable that overrides `connection.password`.
pub const PASSWORD_ENV: &str = "SCHEMAFORGE_PASSWORD";

const REDACTED: &str = "***";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config has no [connection] section")]
    MissingConnection,
}

/// Contents of `schemaforge.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub connection: Option<ConnectionConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    pub database: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    pub schema_json: Option<PathBuf>,
    pub ddl_dir: Option<PathBuf>,
    pub seed_dir: Option<PathBuf>,
    pub patch_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub include_views: bool,
    pub include_procedures: bool,
    pub tables: Option<Vec<String>>,
    #[serde(flatten)]
    pub build: ExtractOptions,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            include_views: true,
            include_procedures: true,
            tables: None,
            build: ExtractOptions::default(),
        }
    }
}

impl ExtractConfig {
    pub fn introspect_options(&self) -> IntrospectOptions {
        IntrospectOptions {
            include_views: self.include_views,
            include_procedures: self.include_procedures,
            tables: self.tables.clone(),
        }
    }
}

/// Connection details safe to persist in run artifacts.
#[derive(Debug, Clone, Serialize)]
pub struct RedactedConnection {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply_password_override(std::env::var(PASSWORD_ENV).ok());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn apply_password_override(&mut self, password: Option<String>) {
        if let (Some(connection), Some(password)) = (self.connection.as_mut(), password) {
            connection.password = Some(password);
        }
    }

    pub fn connection(&self) -> Result<&ConnectionConfig, ConfigError> {
        self.connection.as_ref().ok_or(ConfigError::MissingConnection)
    }
}

impl ConnectionConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }

    pub fn redacted(&self) -> RedactedConnection {
        RedactedConnection {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.as_ref().map(|_| REDACTED.to_string()),
            database: self.database.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[connection]
user = "root"
password = "secret"
database = "shop"

[output]
schema_json = "out/schema.json"
ddl_dir = "sql"

[extract]
include_views = false
include_raw_column_metadata = true
procedure_delimiter = "//"
"#;

    #[test]
    fn parses_sections_with_defaults() {
        let config = Config::parse(SAMPLE).expect("config parses");
        let connection = config.connection().expect("connection present");
        assert_eq!(connection.host, "localhost");
        assert_eq!(connection.port, 3306);
        assert_eq!(connection.database, "shop");

        assert_eq!(config.output.ddl_dir, Some(PathBuf::from("sql")));
        assert!(config.output.seed_dir.is_none());

        assert!(!config.extract.include_views);
        assert!(config.extract.include_procedures);
        assert!(config.extract.build.include_raw_column_metadata);
        assert!(config.extract.build.emit_ddl_files);
        assert_eq!(config.extract.build.procedure_delimiter, "//");
        assert!(!config.extract.introspect_options().include_views);
    }

    #[test]
    fn password_override_and_redaction() {
        let mut config = Config::parse(SAMPLE).expect("config parses");
        config.apply_password_override(Some("from-env".to_string()));
        let connection = config.connection().expect("connection present");
        assert_eq!(connection.password.as_deref(), Some("from-env"));

        let redacted = connection.redacted();
        assert_eq!(redacted.password.as_deref(), Some("***"));
        let json = serde_json::to_string(&redacted).expect("serialize");
        assert!(!json.contains("from-env"));
    }

    #[test]
    fn missing_connection_is_reported() {
        let config = Config::parse("[output]\nddl_dir = \"sql\"\n").expect("config parses");
        assert!(matches!(
            config.connection(),
            Err(ConfigError::MissingConnection)
        ));
    }
}
