//! Registry configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Default capacity of the broadcast event stream.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Device registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Capacity of the broadcast stream returned by
    /// [`DeviceRegistry::events`](crate::DeviceRegistry::events).
    pub event_capacity: usize,
    /// Emit a `debug!` record for every notification.
    pub log_notifications: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            log_notifications: true,
        }
    }
}

impl RegistryConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.event_capacity == 0 {
            return Err(RegistryError::invalid_configuration(
                "event_capacity must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Create a configuration builder.
    #[must_use]
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json_str(json: &str) -> RegistryResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or the values are invalid.
    pub fn from_yaml_str(yaml: &str) -> RegistryResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. `.yaml` and `.yml` files are parsed as
    /// YAML, anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::config(format!("{}: {e}", path.display())))?;
        if is_yaml_path(path) {
            Self::from_yaml_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }
}

/// Returns `true` if the path has a YAML extension.
#[must_use]
pub fn is_yaml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Builder for `RegistryConfig`.
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// Set the broadcast event stream capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Enable or disable per-notification debug logging.
    #[must_use]
    pub fn log_notifications(mut self, enabled: bool) -> Self {
        self.config.log_notifications = enabled;
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> RegistryResult<RegistryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
