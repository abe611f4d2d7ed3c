//! Convenience re-exports for device types.

pub use crate::TrackedDevice;
pub use crate::descriptor::DeviceDescriptor;
pub use crate::device::{Device, DeviceBuilder};
pub use crate::error::{DeviceError, DeviceResult};
pub use crate::ids::{derive_device_id, guid_from_instance_id, guid_from_string, is_guid};
