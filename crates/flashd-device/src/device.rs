//! Concrete device handle shared between bus plugins and the registry.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{DeviceError, DeviceResult};
use crate::ids::{guid_from_instance_id, guid_from_string};
use crate::TrackedDevice;

/// A firmware-updatable device as seen by the daemon.
///
/// Identity fields are fixed at construction. The remove delay and the
/// availability flag are interior-mutable so a plugin can adjust them on a
/// shared `Arc<Device>` without giving up the instance the registry tracks.
#[derive(Debug)]
pub struct Device {
    id: String,
    equivalent_id: Option<String>,
    name: Option<String>,
    guids: Vec<String>,
    remove_delay_ns: AtomicU64,
    available: AtomicBool,
}

impl Device {
    /// Start building a device with the given primary id.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> DeviceBuilder {
        DeviceBuilder::new(id)
    }

    /// Primary identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Alternate identifier, if any.
    #[must_use]
    pub fn equivalent_id(&self) -> Option<&str> {
        self.equivalent_id.as_deref()
    }

    /// Human-readable name, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// GUIDs in the order they were added.
    #[must_use]
    pub fn guids(&self) -> &[String] {
        &self.guids
    }

    /// Returns `true` if the device exposes `guid`.
    #[must_use]
    pub fn has_guid(&self, guid: &str) -> bool {
        self.guids.iter().any(|g| g == guid)
    }

    /// Grace period before a removal becomes final.
    #[must_use]
    pub fn remove_delay(&self) -> Duration {
        Duration::from_nanos(self.remove_delay_ns.load(Ordering::Acquire))
    }

    /// Change the grace period used by the next removal.
    pub fn set_remove_delay(&self, delay: Duration) {
        self.remove_delay_ns
            .store(duration_to_nanos(delay), Ordering::Release);
    }

    /// Whether the device can currently be used.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    /// Set the availability flag.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }
}

impl TrackedDevice for Device {
    fn id(&self) -> &str {
        Device::id(self)
    }

    fn equivalent_id(&self) -> Option<&str> {
        Device::equivalent_id(self)
    }

    fn has_guid(&self, guid: &str) -> bool {
        Device::has_guid(self, guid)
    }

    fn remove_delay(&self) -> Duration {
        Device::remove_delay(self)
    }

    fn is_available(&self) -> bool {
        Device::is_available(self)
    }

    fn set_available(&self, available: bool) {
        Device::set_available(self, available);
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} [{}]", self.id),
            None => f.write_str(&self.id),
        }
    }
}

// Saturates at roughly 584 years.
fn duration_to_nanos(delay: Duration) -> u64 {
    u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX)
}

/// Builder for [`Device`].
#[derive(Debug, Clone, Default)]
pub struct DeviceBuilder {
    id: String,
    equivalent_id: Option<String>,
    name: Option<String>,
    guids: Vec<String>,
    remove_delay: Duration,
}

impl DeviceBuilder {
    /// Create a builder for a device with the given primary id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the alternate identifier.
    #[must_use]
    pub fn equivalent_id(mut self, id: impl Into<String>) -> Self {
        self.equivalent_id = Some(id.into());
        self
    }

    /// Set the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a GUID. Non-GUID strings are hashed as instance ids.
    #[must_use]
    pub fn guid(mut self, guid: impl AsRef<str>) -> Self {
        self.guids.push(guid_from_string(guid.as_ref().trim()));
        self
    }

    /// Add a GUID verbatim, without normalization.
    #[must_use]
    pub fn raw_guid(mut self, guid: impl Into<String>) -> Self {
        self.guids.push(guid.into());
        self
    }

    /// Add the GUID derived from a bus instance id.
    #[must_use]
    pub fn instance_id(mut self, instance_id: impl AsRef<str>) -> Self {
        self.guids.push(guid_from_instance_id(instance_id.as_ref()));
        self
    }

    /// Set the removal grace period.
    #[must_use]
    pub fn remove_delay(mut self, delay: Duration) -> Self {
        self.remove_delay = delay;
        self
    }

    /// Build the device.
    ///
    /// Duplicate GUIDs are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::EmptyId`] if the id is empty and
    /// [`DeviceError::EmptyGuid`] if a verbatim GUID is empty.
    pub fn build(self) -> DeviceResult<Device> {
        if self.id.is_empty() {
            return Err(DeviceError::EmptyId);
        }
        if self.guids.iter().any(String::is_empty) {
            return Err(DeviceError::empty_guid(self.id));
        }

        let mut guids: Vec<String> = Vec::with_capacity(self.guids.len());
        for guid in self.guids {
            if !guids.contains(&guid) {
                guids.push(guid);
            }
        }

        Ok(Device {
            id: self.id,
            equivalent_id: self.equivalent_id,
            name: self.name,
            guids,
            remove_delay_ns: AtomicU64::new(duration_to_nanos(self.remove_delay)),
            available: AtomicBool::new(true),
        })
    }

    /// Build the device behind an `Arc`, ready to hand to the registry.
    ///
    /// # Errors
    ///
    /// Same as [`DeviceBuilder::build`].
    pub fn build_shared(self) -> DeviceResult<Arc<Device>> {
        self.build().map(Arc::new)
    }
}
