//! Identifier helpers.
//!
//! Device ids are content-derived: a bus plugin hashes the physical location
//! (or another stable string) so the same hardware always gets the same id.
//! GUIDs follow the RFC 4122 version-5 scheme in the DNS namespace, which is
//! how firmware metadata maps instance ids like `USB\VID_273F&PID_1004` to
//! hardware GUIDs.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Length of a hyphenated GUID string.
const GUID_STRING_LEN: usize = 36;

/// Derive a stable device id from a physical id.
///
/// Returns the lowercase hex SHA-256 digest of the input.
#[must_use]
pub fn derive_device_id(physical_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(physical_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns `true` if `value` is a hyphenated GUID such as
/// `2082b5e0-7a64-478a-b1b2-e3404fab6dad`.
#[must_use]
pub fn is_guid(value: &str) -> bool {
    value.len() == GUID_STRING_LEN && Uuid::try_parse(value).is_ok()
}

/// Map an instance id to its hardware GUID.
#[must_use]
pub fn guid_from_instance_id(instance_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, instance_id.as_bytes())
        .hyphenated()
        .to_string()
}

/// Normalize a GUID-or-instance-id string.
///
/// Valid GUIDs are lowercased; anything else is treated as an instance id
/// and hashed.
#[must_use]
pub fn guid_from_string(value: &str) -> String {
    if is_guid(value) {
        value.to_ascii_lowercase()
    } else {
        guid_from_instance_id(value)
    }
}
