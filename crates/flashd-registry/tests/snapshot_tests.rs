//! Snapshot tests for user-facing messages and serialized forms.

use flashd_registry::prelude::*;
use insta::assert_snapshot;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[test]
fn test_guid_not_found_message() {
    assert_snapshot!(
        RegistryError::guid_not_found("2082b5e0-7a64-478a-b1b2-e3404fab6dad").to_string(),
        @"GUID 2082b5e0-7a64-478a-b1b2-e3404fab6dad was not found"
    );
}

#[test]
fn test_id_not_found_message() {
    assert_snapshot!(
        RegistryError::id_not_found("abc").to_string(),
        @"device ID abc was not found"
    );
}

#[test]
fn test_ambiguous_id_message() {
    assert_snapshot!(
        RegistryError::ambiguous_id("abcdef", 2).to_string(),
        @"device ID abcdef was not unique (2 devices matched)"
    );
}

#[test]
fn test_no_runtime_message() {
    assert_snapshot!(
        RegistryError::NoRuntime.to_string(),
        @"no tokio runtime available for removal timers"
    );
}

#[test]
fn test_default_config_json() -> TestResult {
    let json = serde_json::to_string_pretty(&RegistryConfig::default())?;
    assert_snapshot!(json, @r#"
    {
      "event_capacity": 64,
      "log_notifications": true
    }
    "#);
    Ok(())
}

#[test]
fn test_state_and_kind_names() -> TestResult {
    let states = serde_json::to_string(&[
        ItemState::Absent,
        ItemState::Present,
        ItemState::PendingRemoval,
    ])?;
    assert_snapshot!(states, @r#"["absent","present","pending_removal"]"#);

    let kinds = serde_json::to_string(&DeviceEventKind::all())?;
    assert_snapshot!(kinds, @r#"["added","removed","changed"]"#);
    Ok(())
}
