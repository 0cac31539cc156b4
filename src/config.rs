//! Configuration for estatepin.
//!
//! Configuration sources (highest priority first):
//! 1. CLI flags (applied by the `cli` module)
//! 2. Environment variables (ESTATEPIN_*)
//! 3. Config file (.estatepin/config.yaml)
//! 4. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .estatepin/config.yaml
//! - `output_dir` in the config file is relative to the project root
//!   (the directory containing .estatepin/)
//!
//! Configuration is resolved once at process start and passed around as a
//! value; nothing here is global.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::adapters::{attom, pinata};
use crate::core::DEFAULT_GATEWAY;
use crate::domain::PropertyQuery;

pub const CONFIG_DIR: &str = ".estatepin";
pub const CONFIG_FILE: &str = "config.yaml";

pub const ENV_ATTOM_API_KEY: &str = "ESTATEPIN_ATTOM_API_KEY";
pub const ENV_PINATA_API_KEY: &str = "ESTATEPIN_PINATA_API_KEY";
pub const ENV_PINATA_SECRET_KEY: &str = "ESTATEPIN_PINATA_SECRET_KEY";
pub const ENV_OUTPUT_DIR: &str = "ESTATEPIN_OUTPUT_DIR";
pub const ENV_POSTAL_CODE: &str = "ESTATEPIN_POSTAL_CODE";

const DEFAULT_OUTPUT_DIR: &str = "out";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub attom: AttomConfig,
    #[serde(default)]
    pub pinata: PinataConfig,
    /// Image CIDs assigned to properties by position
    #[serde(default)]
    pub images: Vec<String>,
    /// Output directory (relative to the project root)
    pub output_dir: Option<String>,
    /// Per-request deadline for both external services
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryConfig {
    pub postal_code: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttomConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinataConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub secret_key: Option<String>,
    pub gateway: Option<String>,
}

/// Values read from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub attom_api_key: Option<String>,
    pub pinata_api_key: Option<String>,
    pub pinata_secret_key: Option<String>,
    pub output_dir: Option<String>,
    pub postal_code: Option<String>,
}

impl EnvOverrides {
    /// Read ESTATEPIN_* variables; empty values count as unset
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            attom_api_key: var(ENV_ATTOM_API_KEY),
            pinata_api_key: var(ENV_PINATA_API_KEY),
            pinata_secret_key: var(ENV_PINATA_SECRET_KEY),
            output_dir: var(ENV_OUTPUT_DIR),
            postal_code: var(ENV_POSTAL_CODE),
        }
    }
}

#[derive(Clone)]
pub struct AttomSettings {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Clone)]
pub struct PinataSettings {
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
    pub gateway: String,
}

impl fmt::Debug for AttomSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttomSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &mask(&self.api_key))
            .finish()
    }
}

impl fmt::Debug for PinataSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinataSettings")
            .field("api_url", &self.api_url)
            .field("api_key", &mask(&self.api_key))
            .field("secret_key", &mask(&self.secret_key))
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// What the orchestrator needs from configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub query: PropertyQuery,
    pub gateway: String,
    pub image_refs: Vec<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub query: PropertyQuery,
    pub attom: AttomSettings,
    pub pinata: PinataSettings,
    pub image_refs: Vec<String>,
    pub output_dir: PathBuf,
    pub timeout: Duration,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the current directory and environment
    pub fn load() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to determine current directory")?;
        let config_path = find_config_file(&cwd);
        Self::resolve(config_path.as_deref(), &EnvOverrides::from_env())
    }

    /// Merge an optional config file with environment overrides and defaults
    pub fn resolve(config_path: Option<&Path>, env: &EnvOverrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => load_config_file(path)?,
            None => ConfigFile::default(),
        };

        // Project root is the parent of .estatepin/
        let project_root = config_path
            .and_then(Path::parent)
            .and_then(Path::parent)
            .map(Path::to_path_buf);

        let defaults = PropertyQuery::default();
        let query = PropertyQuery {
            postal_code: env
                .postal_code
                .clone()
                .or(file.query.postal_code)
                .unwrap_or(defaults.postal_code),
            page: file.query.page.unwrap_or(defaults.page),
            page_size: file.query.page_size.unwrap_or(defaults.page_size),
        };

        let attom = AttomSettings {
            base_url: file
                .attom
                .base_url
                .unwrap_or_else(|| attom::DEFAULT_BASE_URL.to_string()),
            api_key: env
                .attom_api_key
                .clone()
                .or(file.attom.api_key)
                .unwrap_or_default(),
        };

        let pinata = PinataSettings {
            api_url: file
                .pinata
                .api_url
                .unwrap_or_else(|| pinata::DEFAULT_API_URL.to_string()),
            api_key: env
                .pinata_api_key
                .clone()
                .or(file.pinata.api_key)
                .unwrap_or_default(),
            secret_key: env
                .pinata_secret_key
                .clone()
                .or(file.pinata.secret_key)
                .unwrap_or_default(),
            gateway: file
                .pinata
                .gateway
                .unwrap_or_else(|| DEFAULT_GATEWAY.to_string()),
        };

        let output_dir = match (&env.output_dir, &file.output_dir, &project_root) {
            (Some(dir), _, _) => PathBuf::from(dir),
            (None, Some(dir), Some(root)) => resolve_path(root, dir),
            (None, Some(dir), None) => PathBuf::from(dir),
            (None, None, _) => PathBuf::from(DEFAULT_OUTPUT_DIR),
        };

        if query.page == 0 {
            anyhow::bail!("query.page must be at least 1");
        }
        if query.page_size == 0 {
            anyhow::bail!("query.page_size must be at least 1");
        }

        Ok(Self {
            query,
            attom,
            pinata,
            image_refs: file.images,
            output_dir,
            timeout: Duration::from_secs(file.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS)),
            config_file: config_path.map(Path::to_path_buf),
        })
    }

    /// Settings handed to the orchestrator
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            query: self.query.clone(),
            gateway: self.pinata.gateway.clone(),
            image_refs: self.image_refs.clone(),
        }
    }
}

/// Find config file by searching `start` and its parents
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
        .find(|path| path.exists())
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Hide all but the last four characters of a secret
pub fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(root: &Path, yaml: &str) -> PathBuf {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", yaml).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_file() {
        let config = Config::resolve(None, &EnvOverrides::default()).unwrap();

        assert_eq!(config.query, PropertyQuery::default());
        assert_eq!(config.query.postal_code, "03110");
        assert_eq!(config.attom.base_url, attom::DEFAULT_BASE_URL);
        assert_eq!(config.pinata.gateway, DEFAULT_GATEWAY);
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.image_refs.is_empty());
        assert!(config.config_file.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            r#"
version: "1.0"
query:
  postal_code: "10001"
  page: 2
  page_size: 50
attom:
  api_key: file-attom-key
pinata:
  api_key: file-pinata-key
  secret_key: file-pinata-secret
  gateway: https://ipfs.io/ipfs/
images:
  - QmFirst
  - QmSecond
output_dir: artifacts
timeout_seconds: 5
"#,
        );

        let config = Config::resolve(Some(&path), &EnvOverrides::default()).unwrap();
        assert_eq!(config.query.postal_code, "10001");
        assert_eq!(config.query.page, 2);
        assert_eq!(config.query.page_size, 50);
        assert_eq!(config.attom.api_key, "file-attom-key");
        assert_eq!(config.pinata.secret_key, "file-pinata-secret");
        assert_eq!(config.image_refs, vec!["QmFirst", "QmSecond"]);
        assert_eq!(config.output_dir, temp.path().join("artifacts"));
        assert_eq!(config.timeout, Duration::from_secs(5));

        let settings = config.pipeline_settings();
        assert_eq!(settings.gateway, "https://ipfs.io/ipfs/");
        assert_eq!(settings.image_refs.len(), 2);
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = TempDir::new().unwrap();
        let path = write_config(
            temp.path(),
            "attom:\n  api_key: from-file\nquery:\n  postal_code: \"10001\"\n",
        );
        let env = EnvOverrides {
            attom_api_key: Some("from-env".to_string()),
            postal_code: Some("03110".to_string()),
            output_dir: Some("/tmp/estatepin-out".to_string()),
            ..Default::default()
        };

        let config = Config::resolve(Some(&path), &env).unwrap();
        assert_eq!(config.attom.api_key, "from-env");
        assert_eq!(config.query.postal_code, "03110");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/estatepin-out"));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "query:\n  page_size: 0\n");
        assert!(Config::resolve(Some(&path), &EnvOverrides::default()).is_err());
    }

    #[test]
    fn test_find_config_file_in_parent() {
        let temp = TempDir::new().unwrap();
        let path = write_config(temp.path(), "images: []");
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config_file(&nested), Some(path));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./out"),
            PathBuf::from("/home/user/project/./out")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }

    #[test]
    fn test_mask_and_debug_hide_secrets() {
        assert_eq!(mask(""), "<unset>");
        assert_eq!(mask("abc"), "****");
        assert_eq!(mask("supersecret"), "****cret");

        let settings = PinataSettings {
            api_url: pinata::DEFAULT_API_URL.to_string(),
            api_key: "pinata-key-1234".to_string(),
            secret_key: "pinata-secret-9876".to_string(),
            gateway: DEFAULT_GATEWAY.to_string(),
        };
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("pinata-secret"));
        assert!(debug.contains("****9876"));
    }
}
