// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SitepipeError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_paths(cfg)?;
    validate_server(cfg)?;
    validate_deploy(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.queue_length == 0 {
        return Err(SitepipeError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let paths = &cfg.paths;
    if paths.src.as_os_str().is_empty() || paths.dest.as_os_str().is_empty() {
        return Err(SitepipeError::ConfigError(
            "[paths].src and [paths].dest must not be empty".to_string(),
        ));
    }
    // Transforms write beneath `dest` while the watcher reads beneath `src`;
    // nesting one in the other would feed outputs back in as inputs.
    if paths.src.starts_with(&paths.dest) || paths.dest.starts_with(&paths.src) {
        return Err(SitepipeError::ConfigError(format!(
            "[paths].src ({:?}) and [paths].dest ({:?}) must not contain each other",
            paths.src, paths.dest
        )));
    }
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.port == 0 {
        return Err(SitepipeError::ConfigError(
            "[server].port must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_deploy(cfg: &RawConfigFile) -> Result<()> {
    if cfg.deploy.branch.trim().is_empty() {
        return Err(SitepipeError::ConfigError(
            "[deploy].branch must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn zero_queue_length_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.config.queue_length = 0;
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(SitepipeError::ConfigError(msg)) if msg.contains("queue_length")
        ));
    }

    #[test]
    fn nested_dest_is_rejected() {
        let mut raw = RawConfigFile::default();
        raw.paths.dest = PathBuf::from("src/out");
        assert!(ConfigFile::try_from(raw).is_err());
    }

    #[test]
    fn defaults_are_valid() {
        assert!(ConfigFile::try_from(RawConfigFile::default()).is_ok());
    }
}
