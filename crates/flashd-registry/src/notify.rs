//! Lifecycle notifications.
//!
//! Subscribers register per event kind and are called synchronously, in
//! registration order, on the thread that performed the registry operation.
//! Every emission is mirrored to a tokio broadcast stream for consumers that
//! prefer to `await` events.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Kind of lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceEventKind {
    /// A device instance started being tracked.
    Added,
    /// A device instance was evicted.
    Removed,
    /// A tracked device was added again, possibly cancelling a pending
    /// removal.
    Changed,
}

impl DeviceEventKind {
    /// All event kinds.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Added, Self::Removed, Self::Changed]
    }

    /// Signal-style name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Changed => "changed",
        }
    }
}

impl fmt::Display for DeviceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A notification together with the device it concerns.
#[derive(Debug)]
pub struct DeviceEvent<D> {
    /// What happened.
    pub kind: DeviceEventKind,
    /// The device instance.
    pub device: Arc<D>,
}

impl<D> Clone for DeviceEvent<D> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            device: Arc::clone(&self.device),
        }
    }
}

/// Subscriber callback.
pub type Subscriber<D> = Arc<dyn Fn(&Arc<D>) + Send + Sync>;

/// Identifies a subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Ordered, synchronous notification dispatch.
pub struct Notifier<D> {
    subscribers: RwLock<HashMap<DeviceEventKind, Vec<(SubscriptionId, Subscriber<D>)>>>,
    next_id: AtomicU64,
    stream: broadcast::Sender<DeviceEvent<D>>,
}

impl<D: Send + Sync + 'static> Notifier<D> {
    /// Create a notifier whose broadcast stream holds `capacity` events.
    /// A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (stream, _) = broadcast::channel(capacity.max(1));
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            stream,
        }
    }

    /// Register `callback` for events of `kind`.
    pub fn subscribe<F>(&self, kind: DeviceEventKind, callback: F) -> SubscriptionId
    where
        F: Fn(&Arc<D>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        for list in subscribers.values_mut() {
            if let Some(pos) = list.iter().position(|(sub, _)| *sub == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of subscribers for `kind`.
    #[must_use]
    pub fn subscriber_count(&self, kind: DeviceEventKind) -> usize {
        self.subscribers.read().get(&kind).map_or(0, Vec::len)
    }

    /// A new receiver on the broadcast stream.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<DeviceEvent<D>> {
        self.stream.subscribe()
    }

    /// Deliver an event to every subscriber of `kind`, then to the stream.
    ///
    /// The subscriber list is snapshotted first, so callbacks may subscribe
    /// or unsubscribe; changes apply from the next emission.
    pub fn emit(&self, kind: DeviceEventKind, device: &Arc<D>) {
        let callbacks: Vec<Subscriber<D>> = self
            .subscribers
            .read()
            .get(&kind)
            .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in &callbacks {
            callback(device);
        }

        let event = DeviceEvent {
            kind,
            device: Arc::clone(device),
        };
        if let Err(e) = self.stream.send(event) {
            trace!(kind = %e.0.kind, "no stream receivers");
        }
    }
}

impl<D> fmt::Debug for Notifier<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.read();
        f.debug_struct("Notifier")
            .field(
                "subscribers",
                &subscribers.values().map(Vec::len).sum::<usize>(),
            )
            .field("stream_receivers", &self.stream.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_subscribers_called_in_registration_order() {
        let notifier: Notifier<String> = Notifier::new(4);
        let log = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            notifier.subscribe(DeviceEventKind::Added, move |device: &Arc<String>| {
                log.lock().push(format!("{label}:{device}"));
            });
        }

        notifier.emit(DeviceEventKind::Added, &Arc::new("dev".to_string()));
        assert_eq!(
            *log.lock(),
            vec!["first:dev", "second:dev", "third:dev"]
        );
    }

    #[test]
    fn test_only_matching_kind_is_called() {
        let notifier: Notifier<String> = Notifier::new(4);
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        notifier.subscribe(DeviceEventKind::Removed, move |_: &Arc<String>| {
            sink.lock().push("removed");
        });

        let device = Arc::new("dev".to_string());
        notifier.emit(DeviceEventKind::Added, &device);
        notifier.emit(DeviceEventKind::Changed, &device);
        assert!(log.lock().is_empty());

        notifier.emit(DeviceEventKind::Removed, &device);
        assert_eq!(*log.lock(), vec!["removed"]);
    }

    #[test]
    fn test_unsubscribe() {
        let notifier: Notifier<String> = Notifier::new(4);
        let id = notifier.subscribe(DeviceEventKind::Changed, |_: &Arc<String>| {});
        assert_eq!(notifier.subscriber_count(DeviceEventKind::Changed), 1);

        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        assert_eq!(notifier.subscriber_count(DeviceEventKind::Changed), 0);
    }

    #[test]
    fn test_stream_mirrors_emissions() -> TestResult {
        let notifier: Notifier<String> = Notifier::new(4);
        let mut rx = notifier.events();
        let device = Arc::new("dev".to_string());

        notifier.emit(DeviceEventKind::Added, &device);
        notifier.emit(DeviceEventKind::Removed, &device);

        let first = rx.try_recv()?;
        assert_eq!(first.kind, DeviceEventKind::Added);
        assert!(Arc::ptr_eq(&first.device, &device));
        assert_eq!(rx.try_recv()?.kind, DeviceEventKind::Removed);
        Ok(())
    }

    #[test]
    fn test_emit_without_receivers_is_fine() {
        let notifier: Notifier<String> = Notifier::new(1);
        let device = Arc::new("dev".to_string());
        for _ in 0..4 {
            notifier.emit(DeviceEventKind::Changed, &device);
        }
    }

    #[test]
    fn test_kind_names() {
        let names: Vec<&str> = DeviceEventKind::all()
            .into_iter()
            .map(DeviceEventKind::as_str)
            .collect();
        assert_eq!(names, vec!["added", "removed", "changed"]);
        assert_eq!(DeviceEventKind::Changed.to_string(), "changed");
    }
}
