//! Error types for registry lookups and setup.
//!
//! Lookup failures are ordinary runtime conditions: hardware comes and goes,
//! so a caller asking for a device that just vanished is expected. Nothing in
//! this module is fatal.

use thiserror::Error;

/// Broad classification of a [`RegistryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Nothing matched the GUID or id.
    NotFound,
    /// An abbreviated id matched more than one device.
    Ambiguous,
    /// No async runtime was available for timers.
    Runtime,
    /// Configuration was invalid or could not be loaded.
    Configuration,
}

/// Errors returned by the device registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No tracked device exposes the GUID.
    #[error("GUID {guid} was not found")]
    GuidNotFound {
        /// The GUID that was looked up.
        guid: String,
    },

    /// No tracked device id starts with the given id.
    #[error("device ID {id} was not found")]
    IdNotFound {
        /// The id or id prefix that was looked up.
        id: String,
    },

    /// The abbreviated id matched several devices.
    #[error("device ID {id} was not unique ({matches} devices matched)")]
    AmbiguousId {
        /// The id prefix that was looked up.
        id: String,
        /// Number of distinct devices that matched.
        matches: usize,
    },

    /// The tokio timer service was created outside a runtime.
    #[error("no tokio runtime available for removal timers")]
    NoRuntime,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuration could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    Config(String),
}

impl RegistryError {
    /// Create a GUID not found error.
    #[must_use]
    pub fn guid_not_found(guid: impl Into<String>) -> Self {
        Self::GuidNotFound { guid: guid.into() }
    }

    /// Create an id not found error.
    #[must_use]
    pub fn id_not_found(id: impl Into<String>) -> Self {
        Self::IdNotFound { id: id.into() }
    }

    /// Create an ambiguous id error.
    #[must_use]
    pub fn ambiguous_id(id: impl Into<String>, matches: usize) -> Self {
        Self::AmbiguousId {
            id: id.into(),
            matches,
        }
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }

    /// Create a configuration load error.
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::GuidNotFound { .. } | Self::IdNotFound { .. } => ErrorKind::NotFound,
            Self::AmbiguousId { .. } => ErrorKind::Ambiguous,
            Self::NoRuntime => ErrorKind::Runtime,
            Self::InvalidConfiguration(_) | Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Returns `true` for lookups that matched nothing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Returns `true` for abbreviated ids that matched several devices.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        self.kind() == ErrorKind::Ambiguous
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for RegistryError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// A specialized `Result` type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RegistryError::guid_not_found("2082b5e0-7a64-478a-b1b2-e3404fab6dad");
        assert!(err.to_string().contains("2082b5e0"));

        let err = RegistryError::ambiguous_id("abcdef", 2);
        assert!(err.to_string().contains("not unique"));
        assert!(err.to_string().contains('2'));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(RegistryError::guid_not_found("g").kind(), ErrorKind::NotFound);
        assert_eq!(RegistryError::id_not_found("i").kind(), ErrorKind::NotFound);
        assert_eq!(RegistryError::ambiguous_id("i", 3).kind(), ErrorKind::Ambiguous);
        assert_eq!(RegistryError::NoRuntime.kind(), ErrorKind::Runtime);
        assert_eq!(
            RegistryError::invalid_configuration("x").kind(),
            ErrorKind::Configuration
        );
        assert_eq!(RegistryError::config("x").kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_error_predicates() {
        assert!(RegistryError::id_not_found("abc").is_not_found());
        assert!(!RegistryError::id_not_found("abc").is_ambiguous());
        assert!(RegistryError::ambiguous_id("abc", 2).is_ambiguous());
        assert!(!RegistryError::NoRuntime.is_not_found());
    }
}
