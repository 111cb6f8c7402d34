//! Configuration resolution for documind-api
//!
//! Server settings resolve CLI/ENV (via clap) → TOML → compiled default. Vendor
//! credentials use the vendors' conventional variable names and resolve ENV → TOML.
//! A vendor without credentials is reported as `disconnected` and replaced by its
//! offline stand-in (see [`crate::services`]).

use documind_common::api::{IntegrationState, IntegrationStatus};
use documind_common::config::{resolve_string, TomlConfig};
use std::path::PathBuf;
use tracing::{info, warn};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_ENVIRONMENT: &str = "development";

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o";
pub const DEEPGRAM_BASE_URL: &str = "https://api.deepgram.com/v1";
pub const FOXIT_BASE_URL: &str = "https://services.foxit.com/api";
pub const SANITY_API_VERSION: &str = "v2021-06-07";
pub const SANITY_DEFAULT_DATASET: &str = "production";

/// Server settings already merged from CLI and ENV by clap
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub output_dir: Option<PathBuf>,
    pub max_upload_bytes: Option<usize>,
    pub environment: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Generated PDFs are written to and served from here
    pub output_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub environment: String,
    pub vendors: VendorConfig,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct DeepgramConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct FoxitConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct SanityConfig {
    pub project_id: Option<String>,
    pub dataset: String,
    pub token: Option<String>,
    /// Explicit API root; derived from the project id when absent
    pub base_url: Option<String>,
}

/// Credentials and endpoints of every vendor integration
#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub openai: OpenAiConfig,
    pub deepgram: DeepgramConfig,
    pub foxit: FoxitConfig,
    pub sanity: SanityConfig,
}

impl ApiConfig {
    pub fn resolve(overrides: ServerOverrides, toml: &TomlConfig) -> Self {
        let server = &toml.server;
        Self {
            host: overrides
                .host
                .or_else(|| server.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(server.port).unwrap_or(DEFAULT_PORT),
            output_dir: overrides
                .output_dir
                .or_else(|| server.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            max_upload_bytes: overrides
                .max_upload_bytes
                .or(server.max_upload_bytes)
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            environment: overrides
                .environment
                .or_else(|| server.environment.clone())
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            vendors: VendorConfig::resolve(toml),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl VendorConfig {
    /// Resolve vendor settings: ENV → TOML → default
    pub fn resolve(toml: &TomlConfig) -> Self {
        Self {
            openai: OpenAiConfig {
                api_key: resolve_string(None, "OPENAI_API_KEY", toml.openai.api_key.as_deref()),
                model: resolve_string(None, "OPENAI_MODEL", toml.openai.model.as_deref())
                    .unwrap_or_else(|| OPENAI_DEFAULT_MODEL.to_string()),
                base_url: resolve_string(None, "OPENAI_BASE_URL", toml.openai.base_url.as_deref())
                    .unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            },
            deepgram: DeepgramConfig {
                api_key: resolve_string(
                    None,
                    "DEEPGRAM_API_KEY",
                    toml.deepgram.api_key.as_deref(),
                ),
                base_url: resolve_string(
                    None,
                    "DEEPGRAM_BASE_URL",
                    toml.deepgram.base_url.as_deref(),
                )
                .unwrap_or_else(|| DEEPGRAM_BASE_URL.to_string()),
            },
            foxit: FoxitConfig {
                client_id: resolve_string(None, "FOXIT_CLIENT_ID", toml.foxit.client_id.as_deref()),
                client_secret: resolve_string(
                    None,
                    "FOXIT_CLIENT_SECRET",
                    toml.foxit.client_secret.as_deref(),
                ),
                base_url: resolve_string(None, "FOXIT_BASE_URL", toml.foxit.base_url.as_deref())
                    .unwrap_or_else(|| FOXIT_BASE_URL.to_string()),
            },
            sanity: SanityConfig {
                project_id: resolve_string(
                    None,
                    "SANITY_PROJECT_ID",
                    toml.sanity.project_id.as_deref(),
                ),
                dataset: resolve_string(None, "SANITY_DATASET", toml.sanity.dataset.as_deref())
                    .unwrap_or_else(|| SANITY_DEFAULT_DATASET.to_string()),
                token: resolve_string(None, "SANITY_TOKEN", toml.sanity.token.as_deref()),
                base_url: resolve_string(None, "SANITY_BASE_URL", toml.sanity.base_url.as_deref()),
            },
        }
    }

    /// Configured-or-not report served by `GET /api/integrations/status`
    pub fn integration_status(&self) -> IntegrationStatus {
        let state = |configured: bool| {
            if configured {
                IntegrationState::Connected
            } else {
                IntegrationState::Disconnected
            }
        };

        IntegrationStatus {
            openai: state(self.openai.api_key.is_some()),
            deepgram: state(self.deepgram.api_key.is_some()),
            foxit: state(self.foxit.credentials().is_some()),
            sanity: state(self.sanity.is_configured()),
        }
    }

    /// Log which integrations run against the vendor and which run offline
    pub fn log_summary(&self) {
        let status = self.integration_status();
        for (label, _, state) in status.rows() {
            match state {
                IntegrationState::Connected => info!("✓ {} configured", label),
                _ => warn!("{} not configured; running without it", label),
            }
        }
    }
}

impl FoxitConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl SanityConfig {
    pub fn is_configured(&self) -> bool {
        self.token.is_some() && (self.project_id.is_some() || self.base_url.is_some())
    }

    /// `https://<project>.api.sanity.io/<version>` unless overridden
    pub fn api_root(&self) -> Option<String> {
        if let Some(base) = &self.base_url {
            return Some(base.trim_end_matches('/').to_string());
        }
        self.project_id
            .as_ref()
            .map(|project| format!("https://{}.api.sanity.io/{}", project, SANITY_API_VERSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendors_with(openai: Option<&str>, foxit_secret: Option<&str>) -> VendorConfig {
        VendorConfig {
            openai: OpenAiConfig {
                api_key: openai.map(str::to_string),
                model: OPENAI_DEFAULT_MODEL.to_string(),
                base_url: OPENAI_BASE_URL.to_string(),
            },
            deepgram: DeepgramConfig {
                api_key: None,
                base_url: DEEPGRAM_BASE_URL.to_string(),
            },
            foxit: FoxitConfig {
                client_id: Some("client".to_string()),
                client_secret: foxit_secret.map(str::to_string),
                base_url: FOXIT_BASE_URL.to_string(),
            },
            sanity: SanityConfig {
                project_id: Some("abc123".to_string()),
                dataset: SANITY_DEFAULT_DATASET.to_string(),
                token: Some("token".to_string()),
                base_url: None,
            },
        }
    }

    #[test]
    fn test_integration_status_reflects_credentials() {
        let status = vendors_with(Some("sk-1"), None).integration_status();
        assert_eq!(status.openai, IntegrationState::Connected);
        assert_eq!(status.deepgram, IntegrationState::Disconnected);
        // Foxit needs both halves of the client credentials
        assert_eq!(status.foxit, IntegrationState::Disconnected);
        assert_eq!(status.sanity, IntegrationState::Connected);

        let status = vendors_with(None, Some("secret")).integration_status();
        assert_eq!(status.openai, IntegrationState::Disconnected);
        assert_eq!(status.foxit, IntegrationState::Connected);
    }

    #[test]
    fn test_sanity_api_root() {
        let vendors = vendors_with(None, None);
        assert_eq!(
            vendors.sanity.api_root().as_deref(),
            Some("https://abc123.api.sanity.io/v2021-06-07")
        );

        let overridden = SanityConfig {
            base_url: Some("http://127.0.0.1:9999/".to_string()),
            ..vendors.sanity
        };
        assert_eq!(overridden.api_root().as_deref(), Some("http://127.0.0.1:9999"));
    }

    #[test]
    fn test_server_overrides_beat_toml() {
        let mut toml = TomlConfig::default();
        toml.server.port = Some(9000);
        toml.server.host = Some("127.0.0.1".to_string());

        let config = ApiConfig::resolve(
            ServerOverrides {
                port: Some(9100),
                ..Default::default()
            },
            &toml,
        );
        assert_eq!(config.port, 9100);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.bind_address(), "127.0.0.1:9100");
    }
}
