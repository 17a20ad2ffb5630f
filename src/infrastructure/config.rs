use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::reconcile::KeylessPolicy;
use crate::domain::scope::ScopeSelector;
use crate::domain::value_objects::Side;

/// Prefix of the environment variables that override the config file,
/// e.g. `SCHEMADIFF_DB_A__PASSWORD` for `db_a.password`.
pub const ENV_PREFIX: &str = "SCHEMADIFF";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub db_a: DbConfig,
    pub db_b: DbConfig,
    #[serde(default)]
    pub scope: ScopeSelector,
    #[serde(default)]
    pub compare: CompareConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DbConfig {
    /// Database driver: "postgres" (default), "mysql", "mariadb", or "sqlite".
    pub driver: String,
    pub host: String,
    /// Defaults to the driver's standard port.
    pub port: Option<u16>,
    /// Database name, or the file path for sqlite.
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Full connection URL; when set, the fields above are ignored.
    pub url: Option<String>,
    pub max_connections: u32,
    /// Pool acquire timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            driver: "postgres".to_string(),
            host: "localhost".to_string(),
            port: None,
            dbname: String::new(),
            user: String::new(),
            password: String::new(),
            url: None,
            max_connections: 5,
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CompareConfig {
    /// What to do with catalog records that have no usable key.
    pub keyless: KeylessPolicy,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: "./output".to_string(),
        }
    }
}

impl DbConfig {
    /// Build a sqlx-compatible connection URL from this config.
    pub fn url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        match self.driver.as_str() {
            "mysql" | "mariadb" => format!(
                "mysql://{}:{}@{}:{}/{}",
                self.user,
                self.password,
                self.host,
                self.port(),
                self.dbname
            ),
            "sqlite" => format!("sqlite://{}", self.dbname),
            _ => format!(
                "postgres://{}:{}@{}:{}/{}",
                self.user,
                self.password,
                self.host,
                self.port(),
                self.dbname
            ),
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(match self.driver.as_str() {
            "mysql" | "mariadb" => 3306,
            _ => 5432,
        })
    }

    /// `host/dbname`, for logs and messages. Never includes credentials.
    pub fn display_name(&self) -> String {
        match self.driver.as_str() {
            "sqlite" => self.dbname.clone(),
            _ => format!("{}/{}", self.host, self.dbname),
        }
    }
}

impl AppConfig {
    /// Load from `path` when given, otherwise from the first default location
    /// that exists. Environment variables override file values.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_path().context(
                "No config file found (tried ./schemadiff.toml and the user config directory)",
            )?,
        };
        Self::load_with(&path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with(path: &Path, env: Environment) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// `./schemadiff.toml`, else `<config_dir>/schemadiff/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from("schemadiff.toml");
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("schemadiff").join("config.toml"))
            .filter(|p| p.is_file())
    }

    pub fn db(&self, side: Side) -> &DbConfig {
        match side {
            Side::A => &self.db_a,
            Side::B => &self.db_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[db_a]
driver = "postgres"
host = "db-a.internal"
dbname = "shop"
user = "reader"
password = "secret"

[db_b]
driver = "mysql"
host = "db-b.internal"
port = 3307
dbname = "shop"
user = "reader"
password = "secret"
max_connections = 2
timeout_secs = 10

[scope]
tables = true
fields = true
primary_keys = true
stored_procedures = true

[compare]
keyless = "synthesize"

[output]
dir = "./reports"
"#;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn no_env() -> Environment {
        Environment::with_prefix(ENV_PREFIX).source(Some(config::Map::new()))
    }

    #[test]
    fn loads_full_file() {
        let file = write_config(SAMPLE);
        let cfg = AppConfig::load_with(file.path(), no_env()).unwrap();

        assert_eq!(cfg.db_a.host, "db-a.internal");
        assert_eq!(cfg.db_a.port(), 5432);
        assert_eq!(cfg.db_a.max_connections, 5);
        assert_eq!(cfg.db(Side::B).port(), 3307);
        assert_eq!(cfg.db_b.timeout_secs, Some(10));
        assert!(cfg.scope.fields && cfg.scope.primary_keys && cfg.scope.stored_procedures);
        assert!(!cfg.scope.triggers);
        assert_eq!(cfg.compare.keyless, KeylessPolicy::Synthesize);
        assert_eq!(cfg.output.dir, "./reports");
    }

    #[test]
    fn optional_sections_default() {
        let file = write_config(
            r#"
[db_a]
driver = "sqlite"
dbname = "a.db"

[db_b]
driver = "sqlite"
dbname = "b.db"
"#,
        );
        let cfg = AppConfig::load_with(file.path(), no_env()).unwrap();
        assert_eq!(cfg.db_a.url(), "sqlite://a.db");
        assert_eq!(cfg.db_b.display_name(), "b.db");
        assert_eq!(cfg.scope, ScopeSelector::default());
        assert_eq!(cfg.compare.keyless, KeylessPolicy::Drop);
        assert_eq!(cfg.output.dir, "./output");
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_config(SAMPLE);
        let mut vars = config::Map::new();
        vars.insert("SCHEMADIFF_DB_A__PASSWORD".to_string(), "from-env".to_string());
        vars.insert("SCHEMADIFF_DB_B__PORT".to_string(), "3310".to_string());
        let env = Environment::with_prefix(ENV_PREFIX).source(Some(vars));

        let cfg = AppConfig::load_with(file.path(), env).unwrap();
        assert_eq!(cfg.db_a.password, "from-env");
        assert_eq!(cfg.db_b.port(), 3310);
    }

    #[test]
    fn missing_side_is_an_error() {
        let file = write_config("[db_a]\ndbname = \"shop\"\n");
        let err = AppConfig::load_with(file.path(), no_env()).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let err = AppConfig::load(Some("/nonexistent/schemadiff.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to read config file"));
    }

    #[test]
    fn urls_per_driver() {
        let mut cfg = DbConfig {
            host: "h".into(),
            dbname: "d".into(),
            user: "u".into(),
            password: "p".into(),
            ..DbConfig::default()
        };
        assert_eq!(cfg.url(), "postgres://u:p@h:5432/d");
        cfg.driver = "mariadb".into();
        assert_eq!(cfg.url(), "mysql://u:p@h:3306/d");
        cfg.url = Some("mysql://other".into());
        assert_eq!(cfg.url(), "mysql://other");
        assert_eq!(cfg.display_name(), "h/d");
    }
}
