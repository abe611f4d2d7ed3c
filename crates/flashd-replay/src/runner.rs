//! Drives a scenario against a registry on tokio timers.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use flashd_device::Device;
use flashd_registry::{DeviceEventKind, DeviceRegistry, RegistryConfig, RegistryResult};
use tokio::sync::Notify;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

use crate::scenario::{Command, Scenario};

#[derive(Debug, Default)]
struct Counters {
    added: AtomicUsize,
    removed: AtomicUsize,
    changed: AtomicUsize,
}

impl Counters {
    fn slot(&self, kind: DeviceEventKind) -> &AtomicUsize {
        match kind {
            DeviceEventKind::Added => &self.added,
            DeviceEventKind::Removed => &self.removed,
            DeviceEventKind::Changed => &self.changed,
        }
    }
}

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub lookups_ok: usize,
    pub lookups_failed: usize,
    /// Devices still tracked after all removals settled.
    pub remaining: Vec<String>,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "notifications: added={} removed={} changed={}",
            self.added, self.removed, self.changed
        )?;
        writeln!(
            f,
            "lookups: ok={} failed={}",
            self.lookups_ok, self.lookups_failed
        )?;
        if self.remaining.is_empty() {
            write!(f, "devices: none")
        } else {
            write!(f, "devices: {}", self.remaining.join(", "))
        }
    }
}

/// Run `scenario` on the current tokio runtime.
///
/// # Errors
///
/// Returns an error if the registry cannot be created.
pub async fn run(scenario: &Scenario, config: RegistryConfig) -> RegistryResult<Summary> {
    let registry: Arc<DeviceRegistry> = DeviceRegistry::with_tokio_timers(config)?;
    let counters = Arc::new(Counters::default());
    for kind in DeviceEventKind::all() {
        let counters = Arc::clone(&counters);
        registry.subscribe(kind, move |device: &Arc<Device>| {
            counters.slot(kind).fetch_add(1, Ordering::Relaxed);
            info!(device = %device, available = device.is_available(), "{kind}");
        });
    }

    // A stored permit covers a removal landing between the check and the wait.
    let settled = Arc::new(Notify::new());
    let signal = Arc::clone(&settled);
    registry.subscribe(DeviceEventKind::Removed, move |_: &Arc<Device>| {
        signal.notify_one();
    });

    let mut summary = Summary::default();
    let start = Instant::now();
    for (at_ms, command) in &scenario.steps {
        sleep_until(start + Duration::from_millis(*at_ms)).await;
        match command {
            Command::Add(device) => registry.add(Arc::clone(device)),
            Command::Remove(device) => registry.remove(device),
            Command::LookupId(key) => record_lookup(&mut summary, key, registry.find_by_id(key)),
            Command::LookupGuid(key) => {
                record_lookup(&mut summary, key, registry.find_by_guid(key));
            }
        }
    }

    while registry.pending_removals() > 0 {
        settled.notified().await;
    }

    summary.added = counters.added.load(Ordering::Relaxed);
    summary.removed = counters.removed.load(Ordering::Relaxed);
    summary.changed = counters.changed.load(Ordering::Relaxed);
    summary.remaining = registry
        .get_all()
        .iter()
        .map(|device| device.id().to_string())
        .collect();
    Ok(summary)
}

fn record_lookup(summary: &mut Summary, key: &str, result: RegistryResult<Arc<Device>>) {
    match result {
        Ok(device) => {
            summary.lookups_ok = summary.lookups_ok.saturating_add(1);
            info!(key, device = %device, "lookup resolved");
        }
        Err(e) => {
            summary.lookups_failed = summary.lookups_failed.saturating_add(1);
            warn!(key, error = %e, "lookup failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Format;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[tokio::test(start_paused = true)]
    async fn test_replug_within_window() -> TestResult {
        let scenario = Scenario::parse(
            r#"
devices:
  - { id: "001", remove_delay_ms: 500 }
steps:
  - { at_ms: 0, action: add, device: "001" }
  - { at_ms: 100, action: remove, device: "001" }
  - { at_ms: 300, action: add, device: "001" }
  - { at_ms: 400, action: lookup_id, key: "0" }
"#,
            Format::Yaml,
        )?;

        let summary = run(&scenario, RegistryConfig::default()).await?;
        assert_eq!(
            summary,
            Summary {
                added: 1,
                removed: 0,
                changed: 1,
                lookups_ok: 1,
                lookups_failed: 0,
                remaining: vec!["001".to_string()],
            }
        );
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_pending_removals() -> TestResult {
        let scenario = Scenario::parse(
            r#"{
                "devices": [{ "id": "001", "remove_delay_ms": 2000 }],
                "steps": [
                    { "at_ms": 0, "action": "add", "device": "001" },
                    { "at_ms": 10, "action": "remove", "device": "001" },
                    { "at_ms": 20, "action": "lookup_guid", "key": "missing" }
                ]
            }"#,
            Format::Json,
        )?;

        let start = Instant::now();
        let summary = run(&scenario, RegistryConfig::default()).await?;
        assert!(start.elapsed() >= Duration::from_millis(2010));
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.lookups_failed, 1);
        assert!(summary.remaining.is_empty());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_as_soon_as_last_removal_fires() -> TestResult {
        let scenario = Scenario::parse(
            r#"
devices:
  - { id: "001", remove_delay_ms: 500 }
  - { id: "002", remove_delay_ms: 2005 }
steps:
  - { at_ms: 0, action: add, device: "001" }
  - { at_ms: 0, action: add, device: "002" }
  - { at_ms: 10, action: remove, device: "001" }
  - { at_ms: 10, action: remove, device: "002" }
"#,
            Format::Yaml,
        )?;

        let start = Instant::now();
        let summary = run(&scenario, RegistryConfig::default()).await?;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(2015));
        assert!(elapsed < Duration::from_millis(2020));
        assert_eq!(summary.removed, 2);
        assert!(summary.remaining.is_empty());
        Ok(())
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary {
            added: 2,
            changed: 1,
            remaining: vec!["a".to_string(), "b".to_string()],
            ..Summary::default()
        };
        assert_eq!(
            summary.to_string(),
            "notifications: added=2 removed=0 changed=1\nlookups: ok=0 failed=0\ndevices: a, b"
        );
    }
}
