//! Serializable device description.
//!
//! Used by configuration and scenario files to declare devices without
//! writing builder code.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::device::{Device, DeviceBuilder};
use crate::error::DeviceResult;

/// Declarative form of a [`Device`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Primary identifier.
    pub id: String,
    /// Alternate identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equivalent_id: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// GUIDs, or instance ids to hash into GUIDs.
    #[serde(default)]
    pub guids: Vec<String>,
    /// Bus instance ids; each contributes a derived GUID.
    #[serde(default)]
    pub instance_ids: Vec<String>,
    /// Removal grace period in milliseconds.
    #[serde(default)]
    pub remove_delay_ms: u64,
}

impl DeviceDescriptor {
    /// Convert into a builder.
    #[must_use]
    pub fn to_builder(&self) -> DeviceBuilder {
        let mut builder = Device::builder(self.id.clone())
            .remove_delay(Duration::from_millis(self.remove_delay_ms));
        if let Some(equivalent_id) = &self.equivalent_id {
            builder = builder.equivalent_id(equivalent_id.clone());
        }
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        for guid in &self.guids {
            builder = builder.guid(guid);
        }
        for instance_id in &self.instance_ids {
            builder = builder.instance_id(instance_id);
        }
        builder
    }

    /// Build the described device.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor has an empty id.
    pub fn build(&self) -> DeviceResult<Device> {
        self.to_builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceError;
    use crate::ids::{guid_from_instance_id, is_guid};

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_minimal_json() -> TestResult {
        let descriptor: DeviceDescriptor = serde_json::from_str(r#"{ "id": "001" }"#)?;
        let device = descriptor.build()?;
        assert_eq!(device.id(), "001");
        assert_eq!(device.remove_delay(), Duration::ZERO);
        assert!(device.guids().is_empty());
        Ok(())
    }

    #[test]
    fn test_full_json() -> TestResult {
        let descriptor: DeviceDescriptor = serde_json::from_str(
            r#"{
                "id": "aa11",
                "equivalent_id": "bb22",
                "name": "Dock",
                "guids": ["2082b5e0-7a64-478a-b1b2-e3404fab6dad"],
                "instance_ids": ["USB\\VID_17EF&PID_3083"],
                "remove_delay_ms": 500
            }"#,
        )?;
        let device = descriptor.build()?;
        assert_eq!(device.equivalent_id(), Some("bb22"));
        assert_eq!(device.name(), Some("Dock"));
        assert_eq!(device.remove_delay(), Duration::from_millis(500));
        assert!(device.has_guid("2082b5e0-7a64-478a-b1b2-e3404fab6dad"));
        assert!(device.has_guid(&guid_from_instance_id("USB\\VID_17EF&PID_3083")));
        assert!(device.guids().iter().all(|g| is_guid(g)));
        Ok(())
    }

    #[test]
    fn test_empty_id_fails() -> TestResult {
        let descriptor: DeviceDescriptor = serde_json::from_str(r#"{ "id": "" }"#)?;
        assert_eq!(descriptor.build().err(), Some(DeviceError::EmptyId));
        Ok(())
    }
}
