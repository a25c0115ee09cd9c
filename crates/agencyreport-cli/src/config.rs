use agencyreport_core::{CompilerOptions, MAX_LIMIT};
use agencyreport_db_postgres::{PostgresConfig, TenantDatabaseConfig};
use serde::{Deserialize, Serialize};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "agencyreport.toml";

/// Prefix for environment overrides, e.g. `AGENCYREPORT__POSTGRES__POOL_SIZE=8`.
pub const ENV_PREFIX: &str = "AGENCYREPORT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub postgres: PostgresConfig,
    pub tenants: TenantDatabaseConfig,
    pub compiler: CompilerOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        if self.compiler.max_limit == 0 || self.compiler.max_limit > MAX_LIMIT {
            return Err(format!("compiler.max_limit must be within 1..={MAX_LIMIT}"));
        }
        self.postgres
            .validate()
            .map_err(|e| format!("postgres: {e}"))?;
        self.tenants
            .validate()
            .map_err(|e| format!("tenants: {e}"))?;
        Ok(())
    }
}

pub mod loader {
    use super::{AppConfig, DEFAULT_CONFIG_FILE, ENV_PREFIX};
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    /// Loads the config file (if present) layered with environment overrides.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load_config(path: Option<&Path>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(format!("config file not found: {}", p.display()));
                }
                builder = builder.add_source(File::from(p.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::loader::load_config;
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_validate() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.compiler.max_limit, MAX_LIMIT);
        assert!(!cfg.compiler.strict_operators);
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            r#"
[logging]
level = "debug"

[postgres]
pool_size = 3
connect_timeout_ms = 2500

[tenants]
url_template = "postgres://report:secret@db:5432/{database}"
database_prefix = "ag_"
allowed_tenants = ["north", "south"]

[compiler]
strict_operators = true
max_limit = 500
"#,
        );

        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.postgres.pool_size, 3);
        assert_eq!(cfg.postgres.connect_timeout_ms, 2500);
        assert_eq!(cfg.postgres.idle_timeout_ms, Some(300_000));
        assert_eq!(cfg.tenants.database_prefix, "ag_");
        assert_eq!(cfg.tenants.allowed_tenants, vec!["north", "south"]);
        assert!(cfg.compiler.strict_operators);
        assert_eq!(cfg.compiler.max_limit, 500);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.contains("config file not found"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = write_config("[logging]\nlevel = \"loud\"\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.contains("logging.level"));

        let file = write_config("[compiler]\nmax_limit = 20000\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.contains("compiler.max_limit"));

        let file = write_config("[tenants]\nurl_template = \"postgres://localhost/shared\"\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.starts_with("tenants:"));
    }
}
