//! Viewer configuration.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! environment variables, then command-line flags (applied by `main`).
//!
//! ```yaml
//! loader:
//!   workers: 4
//! playback:
//!   tick_interval_ms: 500
//! discovery:
//!   scan_prefix: scan_
//!   data_subfolder: MATLAB
//! color_scales: config/colors.yaml
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use radar_common::ColorScales;
use scan_index::DiscoveryConfig;
use serde::{Deserialize, Serialize};
use volume_loader::LoaderConfig;

use playback::PlaybackConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub loader: LoaderConfig,
    pub playback: PlaybackConfig,
    pub discovery: DiscoveryConfig,
    /// YAML file with color scale overrides.
    pub color_scales: Option<PathBuf>,
}

impl ViewerConfig {
    /// Defaults, overlaid with `path` (if given) and then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config from {:?}", path))?;
                Self::from_yaml_str(&text)
                    .with_context(|| format!("Failed to parse config from {:?}", path))?
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.loader = self.loader.with_env_overrides();
        self.playback = self.playback.with_env_overrides();
        self.discovery = self.discovery.with_env_overrides();
        if let Ok(val) = std::env::var("PAR_COLOR_SCALES") {
            self.color_scales = Some(PathBuf::from(val));
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.loader
            .validate()
            .map_err(|e| anyhow!("loader: {}", e))?;
        self.playback
            .validate()
            .map_err(|e| anyhow!("playback: {}", e))?;
        self.discovery
            .validate()
            .map_err(|e| anyhow!("discovery: {}", e))?;
        Ok(())
    }

    /// The configured color scales, or the defaults.
    pub fn color_scales(&self) -> Result<ColorScales> {
        match &self.color_scales {
            Some(path) => ColorScales::from_yaml_file(path)
                .with_context(|| format!("Failed to load color scales from {:?}", path)),
            None => Ok(ColorScales::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_common::Product;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ViewerConfig::from_yaml_str(
            "loader:\n  workers: 2\nplayback:\n  tick_interval_ms: 250\n",
        )
        .unwrap();

        assert_eq!(config.loader.workers, 2);
        assert_eq!(config.loader.thread_name_prefix, "par-loader");
        assert_eq!(config.playback.tick_interval_ms, 250);
        assert_eq!(config.discovery, DiscoveryConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let config = ViewerConfig::from_yaml_str("playback:\n  tick_interval_ms: 0\n").unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.starts_with("playback:"), "{}", err);
    }

    #[test]
    fn test_color_scale_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colors.yaml");
        std::fs::write(
            &path,
            "V:\n  label: Velocity (m/s)\n  units: m/s\n  min: -30\n  max: 30\n  colors: [blue, white, red]\n",
        )
        .unwrap();

        let config = ViewerConfig {
            color_scales: Some(path),
            ..Default::default()
        };
        let scales = config.color_scales().unwrap();
        assert_eq!(scales.get(Product::Velocity).domain(), (-30.0, 30.0));
        assert_eq!(scales.get(Product::Reflectivity).domain(), (-10.0, 70.0));
    }

    #[test]
    fn test_missing_config_file() {
        let result = ViewerConfig::load(Some(Path::new("/no/such/viewer.yaml")));
        assert!(result.is_err());
    }
}
