//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use flashd_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_recv, must_some, must_with};

#[cfg(feature = "recorder")]
pub use crate::recorder::{EventRecorder, RecordedEvent};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{
    REPLUG_DELAY, colorhug, delayed_device, device, device_with_equivalent, device_with_guids,
    manual_registry,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
