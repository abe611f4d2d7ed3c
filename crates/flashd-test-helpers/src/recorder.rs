//! Subscribers that record registry notifications.

use std::sync::Arc;

use flashd_device::TrackedDevice;
use flashd_registry::{DeviceEventKind, DeviceRegistry, SubscriptionId};
use parking_lot::Mutex;

/// A recorded notification: kind plus the device's primary id.
pub type RecordedEvent = (DeviceEventKind, String);

/// Records every notification a registry emits, in order.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    log: Arc<Mutex<Vec<RecordedEvent>>>,
    subscriptions: Vec<SubscriptionId>,
}

impl EventRecorder {
    /// Subscribe to all event kinds on `registry`.
    pub fn attach<D: TrackedDevice>(registry: &DeviceRegistry<D>) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let subscriptions = DeviceEventKind::all()
            .into_iter()
            .map(|kind| {
                let log = Arc::clone(&log);
                registry.subscribe(kind, move |device: &Arc<D>| {
                    log.lock().push((kind, device.id().to_string()));
                })
            })
            .collect();
        Self { log, subscriptions }
    }

    /// Unsubscribe from `registry`. Recorded events are kept.
    pub fn detach<D: TrackedDevice>(&mut self, registry: &DeviceRegistry<D>) {
        for id in self.subscriptions.drain(..) {
            registry.unsubscribe(id);
        }
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log.lock().clone()
    }

    /// Just the kinds, in order.
    pub fn kinds(&self) -> Vec<DeviceEventKind> {
        self.log.lock().iter().map(|(kind, _)| *kind).collect()
    }

    /// How many events of `kind` were recorded.
    pub fn count(&self, kind: DeviceEventKind) -> usize {
        self.log.lock().iter().filter(|(k, _)| *k == kind).count()
    }

    /// Recorded events for one device id.
    pub fn for_device(&self, id: &str) -> Vec<DeviceEventKind> {
        self.log
            .lock()
            .iter()
            .filter(|(_, device)| device == id)
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}
