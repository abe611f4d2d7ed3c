//! Identity queries.
//!
//! Callers address devices by GUID or by id. Ids are usually long hashes,
//! so any prefix is accepted as long as it picks out exactly one device.
//! GUID queries are normalized the way [`DeviceBuilder::guid`] normalizes
//! its input, so a mixed-case GUID or an instance id finds the device it
//! was built from.
//!
//! [`DeviceBuilder::guid`]: flashd_device::DeviceBuilder::guid

use std::sync::Arc;

use flashd_device::{TrackedDevice, guid_from_string};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::DeviceRegistry;

/// The query as given plus its normalized form, for devices that stored
/// either one.
struct GuidQuery<'a> {
    verbatim: &'a str,
    normalized: String,
}

impl<'a> GuidQuery<'a> {
    fn new(guid: &'a str) -> Self {
        Self {
            verbatim: guid,
            normalized: guid_from_string(guid.trim()),
        }
    }

    fn matches<D: TrackedDevice>(&self, device: &D) -> bool {
        device.has_guid(self.verbatim) || device.has_guid(&self.normalized)
    }
}

impl<D: TrackedDevice> DeviceRegistry<D> {
    /// First device, in insertion order, that exposes `guid`.
    ///
    /// The query matches a GUID stored verbatim or its normalized form.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::GuidNotFound`] if no tracked device has the
    /// GUID.
    pub fn find_by_guid(&self, guid: &str) -> RegistryResult<Arc<D>> {
        let query = GuidQuery::new(guid);
        let found = self.with_items(|items| {
            items
                .iter()
                .find(|item| query.matches(&*item.device))
                .map(|item| Arc::clone(&item.device))
        });
        found.ok_or_else(|| {
            debug!(guid, "GUID was not found");
            RegistryError::guid_not_found(guid)
        })
    }

    /// Every device that exposes `guid`, in insertion order.
    #[must_use]
    pub fn find_all_by_guid(&self, guid: &str) -> Vec<Arc<D>> {
        let query = GuidQuery::new(guid);
        self.with_items(|items| {
            items
                .iter()
                .filter(|item| query.matches(&*item.device))
                .map(|item| Arc::clone(&item.device))
                .collect()
        })
    }

    /// The device whose primary or equivalent id starts with `id`.
    ///
    /// A device matching through both of its ids still counts once.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::IdNotFound`] if nothing matches and
    /// [`RegistryError::AmbiguousId`] if more than one device matches.
    pub fn find_by_id(&self, id: &str) -> RegistryResult<Arc<D>> {
        let matches: Vec<Arc<D>> = self.with_items(|items| {
            items
                .iter()
                .filter(|item| item.device.matches_id_prefix(id))
                .map(|item| Arc::clone(&item.device))
                .collect()
        });

        match matches.as_slice() {
            [] => {
                debug!(device_id = id, "device ID was not found");
                Err(RegistryError::id_not_found(id))
            }
            [device] => Ok(Arc::clone(device)),
            many => {
                debug!(device_id = id, matches = many.len(), "device ID was not unique");
                Err(RegistryError::ambiguous_id(id, many.len()))
            }
        }
    }
}
