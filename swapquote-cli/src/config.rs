use std::{fs, io::ErrorKind};

use swapquote_core::EngineConfig;
use tracing::{debug, info};

use crate::errors::CliError;

/// Loads the engine configuration from a YAML file.
///
/// A file that does not exist yields the defaults so the tool works without any setup.
pub fn load_config(path: &str) -> Result<EngineConfig, CliError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            debug!(path, "LoadingEngineConfig");
            parse_config(&contents)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path, "EngineConfigNotFound, using defaults");
            Ok(EngineConfig::default())
        }
        Err(err) => Err(CliError::io(path, err)),
    }
}

pub fn parse_config(contents: &str) -> Result<EngineConfig, CliError> {
    let config: EngineConfig = serde_yaml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}
