use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use super::{TimerCallback, TimerHandle, TimerService};
use crate::error::{RegistryError, RegistryResult};

#[derive(Default)]
struct TimerTable {
    next_id: u64,
    tasks: HashMap<u64, JoinHandle<()>>,
}

/// Timer service backed by tokio tasks.
///
/// Each timer is a task that sleeps for the delay, claims its slot in the
/// table and then runs the callback. Cancelling removes the slot and aborts
/// the task, so a cancelled timer never reaches its callback.
pub struct TokioTimerService {
    runtime: Handle,
    table: Arc<Mutex<TimerTable>>,
}

impl TokioTimerService {
    /// Create a timer service that spawns onto `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            table: Arc::new(Mutex::new(TimerTable::default())),
        }
    }

    /// Create a timer service on the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn from_current() -> RegistryResult<Self> {
        match Handle::try_current() {
            Ok(runtime) => Ok(Self::new(runtime)),
            Err(e) => {
                debug!(error = %e, "cannot create tokio timer service");
                Err(RegistryError::NoRuntime)
            }
        }
    }

    /// Number of timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.table.lock().tasks.len()
    }
}

impl TimerService for TokioTimerService {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        // The table lock is held across spawn so the task cannot look for
        // its slot before it has been inserted.
        let mut table = self.table.lock();
        table.next_id = table.next_id.wrapping_add(1);
        let id = table.next_id;

        let shared = Arc::clone(&self.table);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if shared.lock().tasks.remove(&id).is_none() {
                trace!(timer = id, "timer slot already released");
                return;
            }
            trace!(timer = id, "timer fired");
            callback();
        });
        table.tasks.insert(id, task);

        trace!(timer = id, delay_ms = delay.as_millis(), "timer scheduled");
        TimerHandle::from_raw(id)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let task = self.table.lock().tasks.remove(&handle.as_raw());
        match task {
            Some(task) => {
                task.abort();
                trace!(timer = handle.as_raw(), "timer cancelled");
                true
            }
            None => false,
        }
    }
}

impl Drop for TokioTimerService {
    fn drop(&mut self) {
        for (_, task) in self.table.lock().tasks.drain() {
            task.abort();
        }
    }
}

impl fmt::Debug for TokioTimerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioTimerService")
            .field("pending", &self.pending())
            .finish()
    }
}
