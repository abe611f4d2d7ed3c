//! Unwrap helpers with good error messages.
//!
//! These replace `unwrap()` and `expect()` in test code and report the
//! caller's location through `#[track_caller]`.

use std::fmt::Debug;
use std::time::Duration;

use flashd_registry::DeviceEvent;
use tokio::sync::broadcast;

/// Unwrap a `Result`, panicking with context on error.
///
/// ```rust
/// use flashd_test_helpers::must;
///
/// let result: Result<i32, &str> = Ok(42);
/// assert_eq!(must(result), 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`, with a message including the error value.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with a custom message if `None`.
///
/// # Panics
///
/// Panics if the option is `None`, with the provided message.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap a `Result` with a custom context message.
///
/// # Panics
///
/// Panics if the result is `Err`, with the context and error value.
#[track_caller]
pub fn must_with<T, E: Debug>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must_with: {context}: {e:?}"),
    }
}

/// Wait for the next event on a registry stream.
///
/// Under a paused tokio clock the timeout auto-advances, so a missing
/// event fails fast instead of hanging the test.
///
/// # Panics
///
/// Panics if no event arrives within `within`, or if the stream closed or
/// lagged.
pub async fn must_recv<D: Send + Sync + 'static>(
    events: &mut broadcast::Receiver<DeviceEvent<D>>,
    within: Duration,
) -> DeviceEvent<D> {
    match tokio::time::timeout(within, events.recv()).await {
        Ok(Ok(event)) => event,
        Ok(Err(e)) => panic!("must_recv: stream error: {e}"),
        Err(_) => panic!("must_recv: no event within {within:?}"),
    }
}
