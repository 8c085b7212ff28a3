//! Loader configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the loader's worker pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Number of worker threads.
    pub workers: usize,

    /// Worker thread names are `{prefix}-{n}`.
    pub thread_name_prefix: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            thread_name_prefix: "par-loader".to_string(),
        }
    }
}

impl LoaderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `PAR_LOADER_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("PAR_LOADER_WORKERS") {
            if let Ok(workers) = val.parse() {
                self.workers = workers;
            }
        }

        if let Ok(val) = std::env::var("PAR_LOADER_THREAD_PREFIX") {
            self.thread_name_prefix = val;
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("workers must be > 0".to_string());
        }

        if self.thread_name_prefix.trim().is_empty() {
            return Err("thread_name_prefix must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LoaderConfig::default();
        assert!(config.workers >= 1);
        assert_eq!(config.thread_name_prefix, "par-loader");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("PAR_LOADER_WORKERS", "3");
        std::env::set_var("PAR_LOADER_THREAD_PREFIX", "scan-io");
        let config = LoaderConfig::from_env();
        std::env::remove_var("PAR_LOADER_WORKERS");
        std::env::remove_var("PAR_LOADER_THREAD_PREFIX");

        assert_eq!(config.workers, 3);
        assert_eq!(config.thread_name_prefix, "scan-io");
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = LoaderConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
