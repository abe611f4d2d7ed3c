//! # flashd-registry
//!
//! The authoritative list of devices known to the firmware-update daemon.
//!
//! Bus plugins report hardware arriving and leaving; the registry turns
//! those reports into `added`, `removed` and `changed` notifications for
//! the rest of the daemon. Devices that may briefly vanish while switching
//! into a bootloader carry a remove delay. Their removal is held back for
//! that long, and a device that returns in time produces a single `changed`
//! notification instead of a remove/add pair.
//!
//! ## Architecture
//!
//! - [`registry`] - Tracking, debounce and notification dispatch
//! - [`lookup`] - Queries by GUID and by id prefix
//! - [`notify`] - Ordered synchronous subscribers plus a broadcast stream
//! - [`timer`] - Cancellable one-shot timers (tokio or virtual clock)
//! - [`config`] - Registry configuration
//! - [`error`] - Registry error types
//!
//! ## Example
//!
//! ```rust
//! use flashd_registry::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let timers = Arc::new(ManualTimerService::new());
//! let registry: Arc<DeviceRegistry> = DeviceRegistry::new(timers.clone());
//!
//! let device = Device::builder("4a1f0c9d")
//!     .remove_delay(Duration::from_millis(500))
//!     .build_shared()?;
//!
//! registry.add(device.clone());
//! registry.remove(&device);
//! assert!(!device.is_available());
//!
//! // Back before the grace period ran out.
//! registry.add(device.clone());
//! assert!(device.is_available());
//! assert!(registry.find_by_id("4a1f")?.id() == "4a1f0c9d");
//!
//! registry.remove(&device);
//! timers.advance(Duration::from_millis(500));
//! assert!(registry.is_empty());
//! # Ok(())
//! # }
//! ```

#![deny(
    unsafe_op_in_unsafe_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::panic,
    missing_docs,
    missing_debug_implementations
)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod config;
pub mod error;
pub mod item;
pub mod lookup;
pub mod notify;
pub mod registry;
pub mod timer;

pub mod prelude;

pub use config::{RegistryConfig, RegistryConfigBuilder};
pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use item::ItemState;
pub use notify::{DeviceEvent, DeviceEventKind, SubscriptionId};
pub use registry::DeviceRegistry;
pub use timer::{ManualTimerService, TimerHandle, TimerService, TokioTimerService};
