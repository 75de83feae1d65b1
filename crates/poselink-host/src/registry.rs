use std::collections::HashSet;

use poselink_catalog::{Catalog, DeviceSerial};
use tracing::{debug, info};

use crate::events::DeviceHost;

/// Tracks which device serials are live and which are parked.
///
/// A catalogue replacement never destroys a device: serials that drop out
/// are powered off and parked, and a later catalogue that reintroduces the
/// same serial gets the same identity back. Serials present both before
/// and after a replacement are left completely alone, so a no-op
/// replacement is invisible to the collaborator.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    active: Vec<DeviceSerial>,
    parked: Vec<DeviceSerial>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile the registry with a new catalogue, emitting add/park/resume
    /// events for exactly the serials whose state changes.
    pub fn sync(&mut self, catalog: &Catalog, events: &mut dyn DeviceHost) {
        let target = catalog.serials();
        let target_set: HashSet<DeviceSerial> = target.iter().copied().collect();
        let previously_active: HashSet<DeviceSerial> = self.active.iter().copied().collect();

        // Park what dropped out of the catalogue.
        for serial in std::mem::take(&mut self.active) {
            if target_set.contains(&serial) {
                continue;
            }
            debug!(%serial, "parking device");
            events.device_parked(serial);
            self.parked.push(serial);
        }

        // Walk the new catalogue in order: keep, resume, or create.
        for serial in &target {
            if previously_active.contains(serial) {
                continue;
            }
            if let Some(at) = self.parked.iter().position(|p| p == serial) {
                self.parked.swap_remove(at);
                debug!(%serial, "resuming parked device");
                events.device_resumed(*serial);
            } else {
                debug!(%serial, "adding device");
                events.device_added(*serial);
            }
        }

        self.active = target;
        info!(
            active = self.active.len(),
            parked = self.parked.len(),
            "device registry synced"
        );
    }

    /// Serials currently receiving frames, in catalogue order.
    pub fn active(&self) -> &[DeviceSerial] {
        &self.active
    }

    /// Serials retained from earlier catalogues.
    pub fn parked(&self) -> &[DeviceSerial] {
        &self.parked
    }
}
