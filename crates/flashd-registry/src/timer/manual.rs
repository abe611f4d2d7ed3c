use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use super::{TimerCallback, TimerHandle, TimerService};

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    queue: BTreeMap<(Duration, u64), TimerCallback>,
    deadlines: HashMap<u64, Duration>,
}

impl ManualState {
    /// Pop the earliest timer due at or before `limit`.
    fn pop_due(&mut self, limit: Duration) -> Option<(u64, Duration, TimerCallback)> {
        let (&(deadline, id), _) = self.queue.first_key_value()?;
        if deadline > limit {
            return None;
        }
        let callback = self.queue.remove(&(deadline, id))?;
        self.deadlines.remove(&id);
        Some((id, deadline, callback))
    }
}

/// Timer service driven by an explicit virtual clock.
///
/// Nothing fires until the owner calls [`advance`](Self::advance). Due
/// timers fire in deadline order, ties in scheduling order, and callbacks
/// run without the internal lock held so they may schedule or cancel
/// further timers. Timers scheduled by a callback that fall due within the
/// same advance also fire.
#[derive(Default)]
pub struct ManualTimerService {
    state: Mutex<ManualState>,
}

impl ManualTimerService {
    /// Create a timer service with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Deadline of the earliest armed timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.state
            .lock()
            .queue
            .first_key_value()
            .map(|(&(deadline, _), _)| deadline)
    }

    /// Move the clock forward by `by`, firing every timer that falls due.
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.state.lock().now.saturating_add(by);
        let mut fired: usize = 0;

        loop {
            let due = {
                let mut state = self.state.lock();
                let due = state.pop_due(target);
                if let Some((_, deadline, _)) = &due {
                    state.now = *deadline;
                }
                due
            };
            let Some((id, deadline, callback)) = due else {
                break;
            };
            trace!(timer = id, at_ms = deadline.as_millis(), "manual timer fired");
            callback();
            fired = fired.saturating_add(1);
        }

        self.state.lock().now = target;
        fired
    }

    /// Jump to the earliest deadline and fire everything due there.
    ///
    /// Returns `false` if no timer was armed.
    pub fn advance_to_next(&self) -> bool {
        let Some(deadline) = self.next_deadline() else {
            return false;
        };
        let now = self.now();
        self.advance(deadline.saturating_sub(now));
        true
    }
}

impl TimerService for ManualTimerService {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut state = self.state.lock();
        state.next_id = state.next_id.wrapping_add(1);
        let id = state.next_id;
        let deadline = state.now.saturating_add(delay);
        state.queue.insert((deadline, id), callback);
        state.deadlines.insert(id, deadline);
        TimerHandle::from_raw(id)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut state = self.state.lock();
        match state.deadlines.remove(&handle.as_raw()) {
            Some(deadline) => state.queue.remove(&(deadline, handle.as_raw())).is_some(),
            None => false,
        }
    }
}

impl fmt::Debug for ManualTimerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualTimerService")
            .field("now", &state.now)
            .field("pending", &state.queue.len())
            .finish()
    }
}
