//! Configuration manager for loading and saving bridge configuration

use std::path::{Path, PathBuf};

use super::BridgeConfig;

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error in {path:?}: {message}")]
    Deserialize { path: PathBuf, message: String },
}

/// Loads and saves a [`BridgeConfig`] as RON
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    config: BridgeConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from a file; a missing file yields defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = ron::from_str(&content).map_err(|e| ConfigError::Deserialize {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                tracing::info!("Loaded config from {:?}", path);
                config
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {:?}, using defaults", path);
                BridgeConfig::default()
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Save the configuration to the path it was loaded from, or `path`
    pub fn save(&self, path: Option<&Path>) -> Result<(), ConfigError> {
        let Some(path) = path.or(self.config_path.as_deref()) else {
            return Err(ConfigError::Serialize("no config path".to_string()));
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let content = ron::ser::to_string_pretty(&self.config, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(path, &content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut BridgeConfig {
        &mut self.config
    }

    pub fn into_config(self) -> BridgeConfig {
        self.config
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
