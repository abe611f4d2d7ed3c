//! The device registry and its removal debounce.
//!
//! A bus plugin keeps one `Arc` per physical device and passes that same
//! `Arc` to [`DeviceRegistry::add`] and [`DeviceRegistry::remove`] every
//! time the hardware appears or disappears. When a device with a non-zero
//! remove delay disappears, the registry marks it unavailable and starts a
//! timer instead of evicting it. If the same instance is added back before
//! the timer fires, subscribers see a single `changed` notification rather
//! than `removed` followed by `added`.
//!
//! # Thread Safety
//!
//! All state lives behind one re-entrant lock. Every operation, including
//! the timer-driven eviction, runs inside it, so cancelling one timer and
//! scheduling the next cannot interleave with a timer firing. Notifications
//! are delivered while the lock is held but after the item state is
//! released; a subscriber may therefore call back into the registry from
//! the same thread.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use flashd_device::{Device, TrackedDevice};
use parking_lot::ReentrantMutex;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::config::RegistryConfig;
use crate::error::RegistryResult;
use crate::item::{ItemState, PendingRemoval, RegistryItem};
use crate::notify::{DeviceEvent, DeviceEventKind, Notifier, SubscriptionId};
use crate::timer::{TimerHandle, TimerService, TokioTimerService};

struct RegistryState<D> {
    items: Vec<RegistryItem<D>>,
    next_generation: u64,
}

impl<D> RegistryState<D> {
    fn position_of(&self, device: &Arc<D>) -> Option<usize> {
        self.items.iter().position(|item| item.is_instance(device))
    }

    fn next_generation(&mut self) -> u64 {
        self.next_generation = self.next_generation.wrapping_add(1);
        self.next_generation
    }
}

/// Authoritative collection of currently known devices.
///
/// Create one per daemon with [`DeviceRegistry::new`] and share the
/// returned `Arc`.
pub struct DeviceRegistry<D: TrackedDevice = Device> {
    state: ReentrantMutex<RefCell<RegistryState<D>>>,
    notifier: Notifier<D>,
    timers: Arc<dyn TimerService>,
    config: RegistryConfig,
    this: Weak<Self>,
}

impl<D: TrackedDevice> DeviceRegistry<D> {
    /// Create a registry with the default configuration.
    #[must_use]
    pub fn new(timers: Arc<dyn TimerService>) -> Arc<Self> {
        Self::build(timers, RegistryConfig::default())
    }

    /// Create a registry with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(
        timers: Arc<dyn TimerService>,
        config: RegistryConfig,
    ) -> RegistryResult<Arc<Self>> {
        config.validate()?;
        Ok(Self::build(timers, config))
    }

    /// Create a registry whose removal timers run on the current tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime or if the
    /// configuration is invalid.
    pub fn with_tokio_timers(config: RegistryConfig) -> RegistryResult<Arc<Self>> {
        let timers = TokioTimerService::from_current()?;
        Self::with_config(Arc::new(timers), config)
    }

    fn build(timers: Arc<dyn TimerService>, config: RegistryConfig) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            state: ReentrantMutex::new(RefCell::new(RegistryState {
                items: Vec::new(),
                next_generation: 0,
            })),
            notifier: Notifier::new(config.event_capacity),
            timers,
            config,
            this: this.clone(),
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Track `device`, or report that a tracked device came back.
    ///
    /// A new instance is appended and announced with `added`. An instance
    /// that is already tracked gets a `changed` notification instead; if its
    /// removal was pending, the timer is cancelled and the device is marked
    /// available again.
    pub fn add(&self, device: Arc<D>) {
        let guard = self.state.lock();
        let kind = {
            let mut state = guard.borrow_mut();
            let existing = state
                .items
                .iter_mut()
                .find(|item| item.is_instance(&device));

            match existing {
                Some(item) => {
                    debug!(device_id = %device.id(), "found existing device, reusing item");
                    if let Some(pending) = item.pending_removal.take() {
                        self.cancel_removal(pending);
                    }
                    item.device.set_available(true);
                    DeviceEventKind::Changed
                }
                None => {
                    device.set_available(true);
                    state.items.push(RegistryItem::new(Arc::clone(&device)));
                    DeviceEventKind::Added
                }
            }
        };
        self.emit(kind, &device);
        drop(guard);
    }

    /// Report that `device` disappeared.
    ///
    /// Untracked devices are ignored. Any pending removal is cancelled
    /// first. With a zero remove delay the device is evicted and `removed`
    /// is emitted before this returns; otherwise the device is marked
    /// unavailable and evicted when the delay elapses, unless it is added
    /// back first.
    pub fn remove(&self, device: &Arc<D>) {
        let guard = self.state.lock();
        let evicted = {
            let mut state = guard.borrow_mut();
            let Some(index) = state.position_of(device) else {
                debug!(device_id = %device.id(), "device not found");
                return;
            };
            let generation = state.next_generation();

            // Guard against a changed remove delay or a duplicate remove.
            if let Some(pending) = state
                .items
                .get_mut(index)
                .and_then(|item| item.pending_removal.take())
            {
                self.cancel_removal(pending);
            }

            let delay = device.remove_delay();
            if delay.is_zero() {
                Some(state.items.remove(index).device)
            } else {
                device.set_available(false);
                debug!(
                    device_id = %device.id(),
                    ?delay,
                    "waiting for device removal"
                );
                let timer = self.schedule_removal(delay, generation);
                if let Some(item) = state.items.get_mut(index) {
                    item.pending_removal = Some(PendingRemoval { timer, generation });
                }
                None
            }
        };

        if let Some(device) = evicted {
            self.emit(DeviceEventKind::Removed, &device);
        }
        drop(guard);
    }

    /// Snapshot of every tracked device in insertion order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<D>> {
        self.with_items(|items| items.iter().map(|item| Arc::clone(&item.device)).collect())
    }

    /// Number of tracked devices, including those pending removal.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_items(<[RegistryItem<D>]>::len)
    }

    /// Returns `true` if no device is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if this exact instance is tracked.
    #[must_use]
    pub fn contains(&self, device: &Arc<D>) -> bool {
        self.state_of(device) != ItemState::Absent
    }

    /// Removal state of this exact instance.
    #[must_use]
    pub fn state_of(&self, device: &Arc<D>) -> ItemState {
        self.with_items(|items| {
            items
                .iter()
                .find(|item| item.is_instance(device))
                .map_or(ItemState::Absent, RegistryItem::state)
        })
    }

    /// Number of devices waiting for their removal timer.
    #[must_use]
    pub fn pending_removals(&self) -> usize {
        self.with_items(|items| {
            items
                .iter()
                .filter(|item| item.pending_removal.is_some())
                .count()
        })
    }

    /// Register a synchronous callback for one kind of notification.
    pub fn subscribe<F>(&self, kind: DeviceEventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&Arc<D>) + Send + Sync + 'static,
    {
        self.notifier.subscribe(kind, callback)
    }

    /// Remove a subscription.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// A receiver that sees every notification emitted from now on.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent<D>> {
        self.notifier.events()
    }

    pub(crate) fn with_items<R>(&self, f: impl FnOnce(&[RegistryItem<D>]) -> R) -> R {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state.items)
    }

    fn emit(&self, kind: DeviceEventKind, device: &Arc<D>) {
        if self.config.log_notifications {
            debug!(device_id = %device.id(), "::{kind}");
        }
        self.notifier.emit(kind, device);
    }

    fn schedule_removal(&self, delay: Duration, generation: u64) -> TimerHandle {
        let registry = self.this.clone();
        self.timers.schedule(
            delay,
            Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.complete_removal(generation);
                }
            }),
        )
    }

    fn cancel_removal(&self, pending: PendingRemoval) {
        if !self.timers.cancel(pending.timer) {
            trace!(timer = %pending.timer, "removal timer already released");
        }
    }

    fn complete_removal(&self, generation: u64) {
        let guard = self.state.lock();
        let evicted = {
            let mut state = guard.borrow_mut();
            let position = state
                .items
                .iter()
                .position(|item| item.is_pending_generation(generation));
            match position {
                Some(index) => state.items.remove(index).device,
                None => {
                    trace!(generation, "stale removal timer ignored");
                    return;
                }
            }
        };
        debug!(device_id = %evicted.id(), "doing delayed removal");
        self.emit(DeviceEventKind::Removed, &evicted);
        drop(guard);
    }
}

impl<D: TrackedDevice> Drop for DeviceRegistry<D> {
    fn drop(&mut self) {
        let state = self.state.get_mut().get_mut();
        for item in &mut state.items {
            if let Some(pending) = item.pending_removal.take() {
                self.timers.cancel(pending.timer);
            }
        }
    }
}

impl<D: TrackedDevice> fmt::Debug for DeviceRegistry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceRegistry")
            .field("config", &self.config)
            .field("devices", &self.len())
            .field("pending_removals", &self.pending_removals())
            .field("notifier", &self.notifier)
            .finish()
    }
}
