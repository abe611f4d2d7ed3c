//! Error types for device construction.

use thiserror::Error;

/// Errors raised while building a [`Device`](crate::Device).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The primary identifier was empty.
    #[error("device ID must not be empty")]
    EmptyId,

    /// A GUID was empty after trimming.
    #[error("GUID for device {0} must not be empty")]
    EmptyGuid(String),
}

impl DeviceError {
    /// Create an empty GUID error for the given device id.
    #[must_use]
    pub fn empty_guid(device_id: impl Into<String>) -> Self {
        Self::EmptyGuid(device_id.into())
    }
}

/// A specialized `Result` type for device construction.
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;
