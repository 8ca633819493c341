use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Sensitivity used when the config leaves it out or sets it to exactly 0.
pub const DEFAULT_SENSITIVITY: f64 = 0.9;
/// Largest morphology kernel side length (radius must fit in a `u8`).
pub const MAX_KERNEL_SIZE: u32 = 511;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub camera: CameraConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,
    #[serde(default)]
    pub min_box_size: i64,
    #[serde(default = "default_denoise_kernel")]
    pub denoise_kernel: u32,
    #[serde(default = "default_close_kernel")]
    pub close_kernel: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            min_box_size: 0,
            denoise_kernel: default_denoise_kernel(),
            close_kernel: default_close_kernel(),
        }
    }
}

impl DetectorConfig {
    /// Sensitivity actually used for detection. A configured 0 means "unset".
    pub fn effective_sensitivity(&self) -> f64 {
        if self.sensitivity == 0.0 {
            DEFAULT_SENSITIVITY
        } else {
            self.sensitivity
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
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

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config = Self::parse(&content)?;
        debug!(path = %path.display(), camera = config.camera.name, "config loaded");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Checks the attribute ranges a host must enforce before building a detector.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.name.trim().is_empty() {
            return Err(ConfigError::Invalid("camera name must not be empty".into()));
        }
        let detector = &self.detector;
        if detector.min_box_size < 0 {
            return Err(ConfigError::Invalid(
                "minimum bounding box size should be a positive integer".into(),
            ));
        }
        if !(0.0..=1.0).contains(&detector.sensitivity) {
            return Err(ConfigError::Invalid(
                "sensitivity should be a number between 0 and 1".into(),
            ));
        }
        validate_kernel("denoise_kernel", detector.denoise_kernel)?;
        validate_kernel("close_kernel", detector.close_kernel)?;
        Ok(())
    }
}

fn validate_kernel(field: &str, size: u32) -> Result<(), ConfigError> {
    if size == 0 || size % 2 == 0 || size > MAX_KERNEL_SIZE {
        return Err(ConfigError::Invalid(format!(
            "{field} must be an odd number between 1 and {MAX_KERNEL_SIZE}, got {size}"
        )));
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// Default value functions
fn default_sensitivity() -> f64 {
    DEFAULT_SENSITIVITY
}
fn default_denoise_kernel() -> u32 {
    3
}
fn default_close_kernel() -> u32 {
    15
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse("[camera]\nname = \"cam\"\n").unwrap();
        assert_eq!(config.camera.name, "cam");
        assert_eq!(config.detector.sensitivity, 0.9);
        assert_eq!(config.detector.min_box_size, 0);
        assert_eq!(config.detector.denoise_kernel, 3);
        assert_eq!(config.detector.close_kernel, 15);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn full_config_parses() {
        let config = Config::parse(
            r#"
            [camera]
            name = "front-door"

            [detector]
            sensitivity = 0.75
            min_box_size = 1000
            denoise_kernel = 5
            close_kernel = 21

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.detector.sensitivity, 0.75);
        assert_eq!(config.detector.min_box_size, 1000);
        assert_eq!(config.detector.denoise_kernel, 5);
        assert_eq!(config.detector.close_kernel, 21);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_camera_is_parse_error() {
        let result = Config::parse("[detector]\nsensitivity = 0.5\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn zero_sensitivity_falls_back_to_default() {
        let config = Config::parse("[camera]\nname = \"cam\"\n[detector]\nsensitivity = 0.0\n").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.detector.effective_sensitivity(), DEFAULT_SENSITIVITY);
    }

    #[test]
    fn out_of_range_values_rejected() {
        let cases = [
            "[camera]\nname = \"cam\"\n[detector]\nsensitivity = 1.5\n",
            "[camera]\nname = \"cam\"\n[detector]\nsensitivity = -0.1\n",
            "[camera]\nname = \"cam\"\n[detector]\nmin_box_size = -1\n",
            "[camera]\nname = \"cam\"\n[detector]\ndenoise_kernel = 4\n",
            "[camera]\nname = \"cam\"\n[detector]\nclose_kernel = 0\n",
            "[camera]\nname = \"cam\"\n[detector]\nclose_kernel = 513\n",
            "[camera]\nname = \"  \"\n",
        ];
        for case in cases {
            let config = Config::parse(case).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "expected invalid: {case}"
            );
        }
    }
}
