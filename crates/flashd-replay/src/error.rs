//! Scenario loading errors.

use thiserror::Error;

/// Why a scenario could not be loaded.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// The file could not be read.
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid YAML or JSON for a scenario.
    #[error("cannot parse scenario: {0}")]
    Parse(String),

    /// Two devices share an id.
    #[error("device {0} is declared more than once")]
    DuplicateDevice(String),

    /// A device descriptor is invalid.
    #[error("invalid device: {0}")]
    Device(#[from] flashd_device::DeviceError),

    /// A step names a device that was never declared.
    #[error("step {step} refers to undefined device {device}")]
    UndefinedDevice {
        /// Zero-based step index.
        step: usize,
        /// The undeclared id.
        device: String,
    },

    /// A step lacks the field its action needs.
    #[error("step {step} ({action}) needs a `{field}` field")]
    MissingField {
        /// Zero-based step index.
        step: usize,
        /// The step's action.
        action: &'static str,
        /// The missing field.
        field: &'static str,
    },
}

impl From<serde_json::Error> for ScenarioError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

impl From<serde_yaml::Error> for ScenarioError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
