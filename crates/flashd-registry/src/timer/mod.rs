//! One-shot, cancellable timers used for delayed removal.
//!
//! The registry never sleeps itself. It asks a [`TimerService`] to run a
//! callback later and cancels that request if the device comes back. Two
//! implementations ship with the crate:
//!
//! - [`TokioTimerService`] spawns a sleeping task per timer on a tokio
//!   runtime and aborts it on cancel.
//! - [`ManualTimerService`] keeps a virtual clock that the owner advances
//!   explicitly; it is deterministic and suits tests and hand-driven loops.

use std::fmt;
use std::time::Duration;

mod manual;
mod tokio_timer;

pub use manual::ManualTimerService;
pub use tokio_timer::TokioTimerService;

/// Callback run when a timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Opaque handle identifying a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a raw timer id. Ids must be unique per timer service.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw timer id.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// Schedules one-shot callbacks.
///
/// `schedule` must never invoke the callback before returning; the registry
/// relies on this to finish its own bookkeeping first. After `cancel`
/// returns `true` the callback must never run.
pub trait TimerService: Send + Sync {
    /// Run `callback` once after `delay`.
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Disarm a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    fn cancel(&self, handle: TimerHandle) -> bool;
}
