//! Configuration loader and validator for the portfolio sync pipeline.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::model::Language;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    pub notion: Notion,
    #[serde(default)]
    pub sync: Sync,
}

/// App-level settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    /// Root for snapshot JSON files (`projects-{lang}.json`, `content/`).
    pub data_dir: String,
    /// Root for localized media (`projects/content|files|videos`).
    pub public_dir: String,
}

/// Notion API settings and per-language database ids.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notion {
    pub token: String,
    pub version: String,
    pub databases: Databases,
}

/// One database per language; the two databases are unrelated remotes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Databases {
    pub zh: String,
    pub en: String,
}

/// Retry tuning for the top-level page fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sync {
    pub max_retries: u32,
    pub retry_base_ms: u64,
}

impl Default for Sync {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_base_ms: 2000,
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates data/public dirs if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if !self.app.data_dir.trim().is_empty() {
            fs::create_dir_all(&self.app.data_dir)?;
        }
        if !self.app.public_dir.trim().is_empty() {
            fs::create_dir_all(&self.app.public_dir)?;
        }
        Ok(())
    }

    /// Database id for the given language's content source.
    pub fn database_id(&self, language: Language) -> &str {
        match language {
            Language::Zh => &self.notion.databases.zh,
            Language::En => &self.notion.databases.en,
        }
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    if cfg.app.public_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.public_dir must be non-empty"));
    }

    if cfg.notion.token.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.token must be non-empty"));
    }
    if cfg.notion.version.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.version must be non-empty"));
    }
    if cfg.notion.databases.zh.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.databases.zh must be non-empty"));
    }
    if cfg.notion.databases.en.trim().is_empty() {
        return Err(ConfigError::Invalid("notion.databases.en must be non-empty"));
    }

    if cfg.sync.max_retries == 0 {
        return Err(ConfigError::Invalid("sync.max_retries must be > 0"));
    }

    Ok(())
}

/// Returns an example YAML config matching the schema above.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"
  public_dir: "./public"

notion:
  token: "YOUR_NOTION_INTEGRATION_TOKEN"
  version: "2022-06-28"

  databases:
    zh: "NOTION_DATABASE_ID_ZH"
    en: "NOTION_DATABASE_ID_EN"

sync:
  max_retries: 3
  retry_base_ms: 2000
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.sync.max_retries, 3);
        assert_eq!(cfg.database_id(Language::Zh), "NOTION_DATABASE_ID_ZH");
        assert_eq!(cfg.database_id(Language::En), "NOTION_DATABASE_ID_EN");
    }

    #[test]
    fn sync_section_defaults_when_absent() {
        let yaml = r#"
app:
  data_dir: "./data"
  public_dir: "./public"
notion:
  token: "t"
  version: "2022-06-28"
  databases:
    zh: "db-zh"
    en: "db-en"
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.sync, Sync::default());
    }

    #[test]
    fn invalid_token() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.notion.token = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("notion.token")),
            _ => panic!("wrong error"),
        }
    }

    #[test]
    fn invalid_database_ids() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.notion.databases.zh = "".into();
        let err = validate(&cfg).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("databases.zh")),
            _ => panic!("wrong error"),
        }

        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.notion.databases.en = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_retry_count() {
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.sync.max_retries = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn ensure_dirs_creates_roots() {
        let td = tempdir().unwrap();
        let mut cfg: Config = serde_yaml::from_str(example()).unwrap();
        cfg.app.data_dir = td.path().join("data").to_string_lossy().into_owned();
        cfg.app.public_dir = td.path().join("public").to_string_lossy().into_owned();
        cfg.ensure_dirs().unwrap();
        assert!(td.path().join("data").exists());
        assert!(td.path().join("public").exists());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.notion.version, "2022-06-28");
    }
}
