//! Application configuration, read from a TOML file.
//!
//! Every section has defaults, so a missing file or a partial file is fine;
//! [`AppConfig::validate`] rejects values that would make the engine misbehave.

use crate::{ConfigError, CoreError, UserPreference};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable consulted for the config path when none is given.
pub const CONFIG_ENV_VAR: &str = "SHOPREC_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub recommender: RecommenderConfig,
    pub evaluation: EvaluationConfig,
    pub reranker: RerankerConfig,
    pub logging: LoggingConfig,
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub catalog_path: PathBuf,
    pub interactions_path: PathBuf,
    pub feedback_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("data/products.json"),
            interactions_path: PathBuf::from("data/interactions.json"),
            feedback_path: PathBuf::from("data/explanation_feedback.json"),
        }
    }
}

/// Synthetic users for the `generate` command, one `[[generation.users]]`
/// table each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub users: Vec<UserPreference>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            users: vec![
                UserPreference::new("u1", ["laptopuri", "telefoane-mobile", "perii-par-electrice"]),
                UserPreference::new(
                    "u2",
                    ["televizoare", "casti-bluetooth-telefoane", "jocuri-consola-pc"],
                ),
                UserPreference::new("u3", ["espressoare", "friteuze", "blendere----tocatoare"]),
                UserPreference::new("u4", ["masini-spalat-rufe", "frigidere", "roboti-bucatarie"]),
                UserPreference::new("u5", ["smartwatch", "periute-dinti-electrice", "epilatoare"]),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub default_k: usize,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self { default_k: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub k: usize,
    /// Fixed seed for reproducible splits; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { k: 5, seed: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    /// How many baseline recommendations are offered to the re-ranker.
    pub candidate_pool: usize,
    pub evaluation_max_users: usize,
    pub evaluation_pause_ms: u64,
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 60,
            candidate_pool: 6,
            evaluation_max_users: 5,
            evaluation_pause_ms: 1500,
        }
    }
}

impl RerankerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn evaluation_pause(&self) -> Duration {
        Duration::from_millis(self.evaluation_pause_ms)
    }

    pub fn parsed_base_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "reranker.base_url".to_string(),
            value: format!("{} ({})", self.base_url, e),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "shoprec=info,catalog=info,embedding_engine=info,recommender=info,evaluation_harness=info,llm_interface=info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let config: AppConfig = toml::from_str(raw).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a config file.
    pub async fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        };
        let config = Self::from_toml_str(&raw)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Explicit path first, then `SHOPREC_CONFIG`, then built-in defaults.
    pub async fn resolve(explicit: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = explicit {
            return Self::load(path).await;
        }
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(&path)).await,
            _ => {
                debug!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recommender.default_k == 0 {
            return Err(invalid("recommender.default_k", "0"));
        }
        if self.evaluation.k == 0 {
            return Err(invalid("evaluation.k", "0"));
        }
        if self.reranker.timeout_secs == 0 {
            return Err(invalid("reranker.timeout_secs", "0"));
        }
        if self.reranker.candidate_pool == 0 {
            return Err(invalid("reranker.candidate_pool", "0"));
        }
        if self.reranker.model.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "reranker.model".to_string(),
            });
        }
        if self.data.catalog_path == self.data.interactions_path {
            return Err(ConfigError::ValidationFailed {
                reason: "data.catalog_path and data.interactions_path point to the same file"
                    .to_string(),
            });
        }
        self.reranker.parsed_base_url()?;
        Ok(())
    }
}

fn invalid(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}
