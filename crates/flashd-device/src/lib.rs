//! Device identity and presence types for the flashd registry.
//!
//! The registry never constructs devices. Bus plugins build a [`Device`]
//! (or their own type implementing [`TrackedDevice`]), keep the resulting
//! `Arc` for as long as the hardware may come back, and hand that same
//! `Arc` to the registry on every add and remove. The registry recognizes a
//! returning device by instance identity, not by comparing ids.
//!
//! ```rust
//! use flashd_device::prelude::*;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), DeviceError> {
//! let device = Device::builder(derive_device_id("usb:02:00:01"))
//!     .name("ColorHug2")
//!     .instance_id("USB\\VID_273F&PID_1004")
//!     .remove_delay(Duration::from_millis(500))
//!     .build_shared()?;
//!
//! assert!(device.is_available());
//! assert_eq!(device.guids().len(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::fmt::Debug;
use std::time::Duration;

pub mod descriptor;
pub mod device;
pub mod error;
pub mod ids;
pub mod prelude;

pub use descriptor::DeviceDescriptor;
pub use device::{Device, DeviceBuilder};
pub use error::{DeviceError, DeviceResult};
pub use ids::{derive_device_id, guid_from_instance_id, guid_from_string, is_guid};

/// What the registry needs from a device.
///
/// Implementations must be cheap to query; the registry calls these while
/// holding its internal lock.
pub trait TrackedDevice: Debug + Send + Sync + 'static {
    /// Stable primary identifier.
    fn id(&self) -> &str;

    /// Alternate identifier kept across a re-enumeration that changed the
    /// primary id.
    fn equivalent_id(&self) -> Option<&str>;

    /// GUID membership test.
    fn has_guid(&self, guid: &str) -> bool;

    /// Grace period before a removal becomes final. Zero removes at once.
    fn remove_delay(&self) -> Duration;

    /// Current availability.
    fn is_available(&self) -> bool;

    /// Set availability; cleared while a removal is pending.
    fn set_available(&self, available: bool);

    /// Returns `true` if `prefix` abbreviates the primary or equivalent id.
    fn matches_id_prefix(&self, prefix: &str) -> bool {
        self.id().starts_with(prefix)
            || self
                .equivalent_id()
                .is_some_and(|equivalent| equivalent.starts_with(prefix))
    }
}
