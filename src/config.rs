use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for deee-certify
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CertifyConfig {
    /// Workflow engine settings
    pub workflow: WorkflowConfig,
    /// Law and form catalog settings
    pub catalog: CatalogConfig,
    /// Request store settings
    pub storage: StorageConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Upper bound on any single collaborator call
    pub collaborator_timeout_ms: u64,
    /// Number of lock stripes serializing operations per request
    pub lock_stripes: usize,
    /// Validity of issued certificates
    pub certificate_validity_days: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// TOML catalog file; the bundled catalog is used when unset
    pub path: Option<PathBuf>,
    /// How long a law list stays cached
    pub cache_ttl_seconds: u64,
    /// Maximum cached treatment types
    pub cache_capacity: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON state file used by the command line tool
    pub state_file_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout_ms: 10_000,
            lock_stripes: 64,
            certificate_validity_days: 365,
        }
    }
}

impl WorkflowConfig {
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: None,
            cache_ttl_seconds: 300,
            cache_capacity: 64,
        }
    }
}

impl CatalogConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file_path: PathBuf::from(".deee-certify/state.json"),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl CertifyConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (deee-certify.toml, .deee-certify-rc)
    /// 3. Environment variables (prefixed with DEEE_CERTIFY_, sections split by `__`)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("deee-certify.toml").exists() {
            builder = builder.add_source(File::with_name("deee-certify"));
        }

        if Path::new(".deee-certify-rc").exists() {
            builder = builder.add_source(
                File::with_name(".deee-certify-rc").format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("DEEE_CERTIFY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let certify_config: CertifyConfig = config.try_deserialize()?;
        Ok(certify_config)
    }

    /// Load from an explicit TOML file, still honouring environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).format(config::FileFormat::Toml))
            .add_source(
                Environment::with_prefix("DEEE_CERTIFY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<CertifyConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = CertifyConfig::load_env_file();
        CertifyConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static CertifyConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
