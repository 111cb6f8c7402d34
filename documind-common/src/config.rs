//! Configuration loading
//!
//! Every setting resolves with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (a `.env` file in the working directory is loaded first)
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The TOML file is optional. A missing or unparsable file is logged and treated as
//! empty so the binaries always start.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "DOCUMIND_CONFIG";

/// Config file name below `<config_dir>/documind/`
pub const CONFIG_FILE_NAME: &str = "documind.toml";

/// Contents of `documind.toml`
///
/// ```toml
/// [server]
/// port = 8000
/// output_dir = "output"
///
/// [logging]
/// level = "debug"
///
/// [openai]
/// api_key = "sk-..."
///
/// [sanity]
/// project_id = "abc123"
/// dataset = "production"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub openai: OpenAiSection,
    #[serde(default)]
    pub deepgram: DeepgramSection,
    #[serde(default)]
    pub foxit: FoxitSection,
    #[serde(default)]
    pub sanity: SanitySection,
}

/// `[server]`: documind-api bootstrap settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Directory generated PDFs are written to and served from
    pub output_dir: Option<PathBuf>,
    /// Largest accepted audio upload in bytes
    pub max_upload_bytes: Option<usize>,
    /// Deployment name ("development", "production")
    pub environment: Option<String>,
}

/// `[logging]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[client]`: documind command-line settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSection {
    /// Base URL of documind-api
    pub api_url: Option<String>,
    /// Directory downloaded artifacts are written to
    pub download_dir: Option<PathBuf>,
}

/// `[openai]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenAiSection {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// `[deepgram]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeepgramSection {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// `[foxit]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoxitSection {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: Option<String>,
}

/// `[sanity]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SanitySection {
    pub project_id: Option<String>,
    pub dataset: Option<String>,
    pub token: Option<String>,
    /// Overrides `https://<project_id>.api.sanity.io`
    pub base_url: Option<String>,
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the config file if there is one, otherwise defaults
    ///
    /// `explicit` (from the command line) wins over [`config_file_path`].
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = match explicit.map(Path::to_path_buf).or_else(config_file_path) {
            Some(path) => path,
            None => {
                debug!("No config directory available, using defaults");
                return Self::default();
            }
        };

        if !path.exists() {
            if explicit.is_some() {
                warn!("Config file {} not found, using defaults", path.display());
            } else {
                debug!("No config file at {}, using defaults", path.display());
            }
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; continuing with defaults", e);
                Self::default()
            }
        }
    }

    /// Write the config atomically (temp file + rename)
    pub fn write(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Default config file location
///
/// `$DOCUMIND_CONFIG` if set, else `<config_dir>/documind/documind.toml`
/// (`~/.config/documind/documind.toml` on Linux).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::config_dir().map(|dir| dir.join("documind").join(CONFIG_FILE_NAME))
}

/// Load `.env` from the working directory into the process environment
///
/// Variables already set in the environment are not overridden.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
}

/// Validate a credential (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Read a non-blank environment variable
pub fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| is_valid_key(v))
}

/// Resolve an optional string setting: CLI → ENV → TOML
///
/// Blank values at any tier count as absent.
pub fn resolve_string(
    cli: Option<&str>,
    env_var: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    if let Some(value) = cli.filter(|v| is_valid_key(v)) {
        return Some(value.to_string());
    }
    if let Some(value) = env_value(env_var) {
        return Some(value);
    }
    toml_value
        .filter(|v| is_valid_key(v))
        .map(str::to_string)
}

/// Resolve a parsed setting: CLI → ENV → TOML → default
///
/// An environment value that does not parse is reported and skipped.
pub fn resolve_parsed<T>(cli: Option<T>, env_var: &str, toml_value: Option<T>, default: T) -> T
where
    T: FromStr,
{
    if let Some(value) = cli {
        return value;
    }
    if let Some(raw) = env_value(env_var) {
        match raw.trim().parse::<T>() {
            Ok(value) => return value,
            Err(_) => warn!("Ignoring unparsable {}={}", env_var, raw),
        }
    }
    toml_value.unwrap_or(default)
}
