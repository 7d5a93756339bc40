// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CronchainError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CronchainError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.workflow))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_workflows(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.poll_interval_secs == 0 {
        return Err(CronchainError::ConfigError(
            "[config].poll_interval_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.refresh_interval_secs == 0 {
        return Err(CronchainError::ConfigError(
            "[config].refresh_interval_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.history_limit == 0 {
        return Err(CronchainError::ConfigError(
            "[config].history_limit must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.store.as_os_str().is_empty() {
        return Err(CronchainError::ConfigError(
            "[config].store must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_workflows(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for workflow in &cfg.workflow {
        if workflow.id.trim().is_empty() {
            return Err(CronchainError::ConfigError(format!(
                "workflow '{}' has an empty id",
                workflow.name
            )));
        }
        if workflow.name.trim().is_empty() {
            return Err(CronchainError::ConfigError(format!(
                "workflow '{}' has an empty name",
                workflow.id
            )));
        }
        if !seen.insert(workflow.id.as_str()) {
            return Err(CronchainError::ConfigError(format!(
                "workflow id '{}' is listed more than once",
                workflow.id
            )));
        }
    }
    Ok(())
}
