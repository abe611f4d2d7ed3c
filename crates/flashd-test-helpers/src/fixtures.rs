//! Device and registry fixtures.
//!
//! Fixture constructors panic on invalid input; they are for tests only.

use std::sync::Arc;
use std::time::Duration;

use flashd_device::{Device, derive_device_id};
use flashd_registry::{DeviceRegistry, ManualTimerService, TimerService};

use crate::must::must;

/// Grace period used by fixtures that model a device rebooting into its
/// bootloader.
pub const REPLUG_DELAY: Duration = Duration::from_millis(500);

/// A device with no remove delay.
pub fn device(id: &str) -> Arc<Device> {
    must(Device::builder(id).build_shared())
}

/// A device that waits `delay_ms` before its removal becomes final.
pub fn delayed_device(id: &str, delay_ms: u64) -> Arc<Device> {
    must(
        Device::builder(id)
            .remove_delay(Duration::from_millis(delay_ms))
            .build_shared(),
    )
}

/// A device with a primary and an equivalent id.
pub fn device_with_equivalent(id: &str, equivalent_id: &str) -> Arc<Device> {
    must(
        Device::builder(id)
            .equivalent_id(equivalent_id)
            .build_shared(),
    )
}

/// A device exposing the given verbatim GUIDs.
pub fn device_with_guids(id: &str, guids: &[&str]) -> Arc<Device> {
    let builder = guids
        .iter()
        .fold(Device::builder(id), |builder, guid| builder.raw_guid(*guid));
    must(builder.build_shared())
}

/// A USB colorimeter the way a plugin would build it: hashed physical id,
/// instance-id GUID and the replug grace period.
pub fn colorhug() -> Arc<Device> {
    must(
        Device::builder(derive_device_id("usb:02:00:01"))
            .name("ColorHug2")
            .instance_id("USB\\VID_273F&PID_1004")
            .remove_delay(REPLUG_DELAY)
            .build_shared(),
    )
}

/// A registry driven by a virtual clock, plus that clock.
pub fn manual_registry() -> (Arc<ManualTimerService>, Arc<DeviceRegistry>) {
    let timers = Arc::new(ManualTimerService::new());
    let registry = DeviceRegistry::new(Arc::clone(&timers) as Arc<dyn TimerService>);
    (timers, registry)
}
