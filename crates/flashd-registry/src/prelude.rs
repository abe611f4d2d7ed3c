//! Prelude for flashd-registry.
//!
//! Re-exports the registry, its timers and the device types it tracks.
//!
//! ```rust
//! use flashd_registry::prelude::*;
//! use std::sync::Arc;
//!
//! let registry: Arc<DeviceRegistry> = DeviceRegistry::new(Arc::new(ManualTimerService::new()));
//! assert!(registry.find_by_guid("not-a-guid").is_err_and(|e| e.is_not_found()));
//! ```

pub use crate::config::{RegistryConfig, RegistryConfigBuilder};
pub use crate::error::{ErrorKind, RegistryError, RegistryResult};
pub use crate::item::ItemState;
pub use crate::notify::{DeviceEvent, DeviceEventKind, Subscriber, SubscriptionId};
pub use crate::registry::DeviceRegistry;
pub use crate::timer::{ManualTimerService, TimerHandle, TimerService, TokioTimerService};
pub use flashd_device::{Device, DeviceBuilder, DeviceError, TrackedDevice};
