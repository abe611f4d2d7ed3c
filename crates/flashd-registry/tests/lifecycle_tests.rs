//! Add/remove lifecycle and removal debounce, driven by a virtual clock.

use std::sync::Arc;
use std::time::Duration;

use flashd_registry::prelude::*;
use flashd_test_helpers::prelude::*;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

#[test]
fn test_replug_within_window_is_one_changed_event() -> TestResult {
    let (timers, registry) = manual_registry();
    let recorder = EventRecorder::attach(&*registry);
    let dev = delayed_device("001", 500);

    registry.add(Arc::clone(&dev));
    assert_eq!(registry.get_all().len(), 1);
    assert_eq!(recorder.kinds(), vec![DeviceEventKind::Added]);
    recorder.clear();

    registry.remove(&dev);
    assert!(registry.contains(&dev));
    assert!(!dev.is_available());
    assert!(recorder.events().is_empty());

    timers.advance(ms(200));
    registry.add(Arc::clone(&dev));
    assert_eq!(recorder.kinds(), vec![DeviceEventKind::Changed]);
    assert!(dev.is_available());
    assert_eq!(registry.state_of(&dev), ItemState::Present);

    timers.advance(ms(1_000));
    assert_eq!(recorder.kinds(), vec![DeviceEventKind::Changed]);
    let all = registry.get_all();
    assert_eq!(all.len(), 1);
    let only = must_some(all.first(), "device should still be tracked");
    assert!(Arc::ptr_eq(only, &dev));
    Ok(())
}

#[test]
fn test_removal_fires_no_earlier_than_delay() -> TestResult {
    let (timers, registry) = manual_registry();
    let recorder = EventRecorder::attach(&*registry);
    let dev = delayed_device("001", 500);

    registry.add(Arc::clone(&dev));
    registry.remove(&dev);

    timers.advance(ms(499));
    assert!(registry.contains(&dev));
    assert_eq!(recorder.count(DeviceEventKind::Removed), 0);

    timers.advance(ms(1));
    assert!(!registry.contains(&dev));
    assert_eq!(recorder.count(DeviceEventKind::Removed), 1);
    assert_eq!(registry.state_of(&dev), ItemState::Absent);

    timers.advance(ms(5_000));
    assert_eq!(recorder.count(DeviceEventKind::Removed), 1);
    Ok(())
}

#[test]
fn test_zero_delay_removes_synchronously() -> TestResult {
    let (timers, registry) = manual_registry();
    let recorder = EventRecorder::attach(&*registry);
    let dev = device("001");

    registry.add(Arc::clone(&dev));
    registry.remove(&dev);

    assert!(registry.is_empty());
    assert_eq!(timers.pending(), 0);
    assert_eq!(
        recorder.events(),
        vec![
            (DeviceEventKind::Added, "001".to_string()),
            (DeviceEventKind::Removed, "001".to_string()),
        ]
    );
    Ok(())
}

#[test]
fn test_sub_millisecond_delay_still_defers_removal() -> TestResult {
    let (timers, registry) = manual_registry();
    let recorder = EventRecorder::attach(&*registry);
    let dev = Device::builder("001")
        .remove_delay(Duration::from_micros(500))
        .build_shared()?;

    registry.add(Arc::clone(&dev));
    registry.remove(&dev);

    assert!(registry.contains(&dev));
    assert!(!dev.is_available());
    assert_eq!(registry.pending_removals(), 1);
    assert_eq!(timers.pending(), 1);
    assert_eq!(recorder.kinds(), vec![DeviceEventKind::Added]);

    timers.advance(Duration::from_micros(499));
    assert!(registry.contains(&dev));

    timers.advance(Duration::from_micros(1));
    assert!(!registry.contains(&dev));
    assert_eq!(
        recorder.kinds(),
        vec![DeviceEventKind::Added, DeviceEventKind::Removed]
    );
    Ok(())
}

#[test]
fn test_repeated_add_never_duplicates() -> TestResult {
    let (_timers, registry) = manual_registry();
    let dev = delayed_device("001", 100);

    for _ in 0..5 {
        registry.add(Arc::clone(&dev));
    }
    registry.remove(&dev);
    registry.add(Arc::clone(&dev));

    assert_eq!(registry.len(), 1);
    Ok(())
}

#[test]
fn test_get_all_preserves_insertion_order() -> TestResult {
    let (_timers, registry) = manual_registry();
    let ids = ["c", "a", "b"];
    for id in ids {
        registry.add(device(id));
    }

    let seen: Vec<String> = registry
        .get_all()
        .iter()
        .map(|dev| dev.id().to_string())
        .collect();
    assert_eq!(seen, ids);
    Ok(())
}

#[test]
fn test_readd_after_final_removal_is_added_again() -> TestResult {
    let (timers, registry) = manual_registry();
    let recorder = EventRecorder::attach(&*registry);
    let dev = delayed_device("001", 50);

    registry.add(Arc::clone(&dev));
    registry.remove(&dev);
    timers.advance(ms(50));
    registry.add(Arc::clone(&dev));

    assert_eq!(
        recorder.kinds(),
        vec![
            DeviceEventKind::Added,
            DeviceEventKind::Removed,
            DeviceEventKind::Added
        ]
    );
    Ok(())
}

#[test]
fn test_independent_timers_per_device() -> TestResult {
    let (timers, registry) = manual_registry();
    let recorder = EventRecorder::attach(&*registry);
    let fast = delayed_device("fast", 100);
    let slow = delayed_device("slow", 300);

    registry.add(Arc::clone(&fast));
    registry.add(Arc::clone(&slow));
    registry.remove(&fast);
    registry.remove(&slow);
    assert_eq!(registry.pending_removals(), 2);

    timers.advance(ms(100));
    assert_eq!(recorder.for_device("fast").last(), Some(&DeviceEventKind::Removed));
    assert!(registry.contains(&slow));

    registry.add(Arc::clone(&slow));
    timers.advance(ms(500));
    assert_eq!(recorder.for_device("slow"), vec![DeviceEventKind::Added, DeviceEventKind::Changed]);
    assert_eq!(registry.len(), 1);
    Ok(())
}

#[test]
fn test_removed_subscriber_sees_device_already_gone() -> TestResult {
    let (timers, registry) = manual_registry();
    let dev = delayed_device("001", 10);
    let observed = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let weak = Arc::downgrade(&registry);
    let sink = Arc::clone(&observed);
    registry.subscribe(DeviceEventKind::Removed, move |device: &Arc<Device>| {
        if let Some(registry) = weak.upgrade() {
            sink.lock().push(registry.contains(device));
        }
    });

    registry.add(Arc::clone(&dev));
    registry.remove(&dev);
    timers.advance(ms(10));

    assert_eq!(*observed.lock(), vec![false]);
    Ok(())
}

#[test]
fn test_subscriber_can_readd_from_removed_callback() -> TestResult {
    let (_timers, registry) = manual_registry();
    let recorder = EventRecorder::attach(&*registry);
    let weak = Arc::downgrade(&registry);
    let readded = Arc::new(parking_lot::Mutex::new(false));
    let flag = Arc::clone(&readded);
    registry.subscribe(DeviceEventKind::Removed, move |device: &Arc<Device>| {
        let mut done = flag.lock();
        if !*done {
            *done = true;
            if let Some(registry) = weak.upgrade() {
                registry.add(Arc::clone(device));
            }
        }
    });

    let dev = device("001");
    registry.add(Arc::clone(&dev));
    registry.remove(&dev);

    assert!(registry.contains(&dev));
    assert_eq!(
        recorder.kinds(),
        vec![
            DeviceEventKind::Added,
            DeviceEventKind::Removed,
            DeviceEventKind::Added
        ]
    );
    Ok(())
}

#[test]
fn test_unsubscribed_callback_is_not_called() -> TestResult {
    let (_timers, registry) = manual_registry();
    let calls = Arc::new(parking_lot::Mutex::new(0_u32));
    let sink = Arc::clone(&calls);
    let id = registry.subscribe(DeviceEventKind::Added, move |_: &Arc<Device>| {
        *sink.lock() += 1;
    });

    registry.add(device("001"));
    assert!(registry.unsubscribe(id));
    registry.add(device("002"));

    assert_eq!(*calls.lock(), 1);
    Ok(())
}

#[test]
fn test_detached_recorder_misses_later_removal() -> TestResult {
    let (timers, registry) = manual_registry();
    let mut recorder = EventRecorder::attach(&*registry);
    let dev = delayed_device("001", 500);

    registry.add(Arc::clone(&dev));
    registry.remove(&dev);
    recorder.detach(&*registry);
    timers.advance(ms(500));

    assert!(!registry.contains(&dev));
    assert_eq!(recorder.kinds(), vec![DeviceEventKind::Added]);
    Ok(())
}
