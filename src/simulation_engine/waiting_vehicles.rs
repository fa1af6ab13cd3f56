use crate::data_structures::VehicleId;
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// One-shot signal fired when a waiting vehicle is granted entry.
pub type EntryPermit = oneshot::Sender<()>;

/// A vehicle waiting to enter, paired with the signal that lets it in.
#[derive(Debug)]
struct AdmissionRequest {
    vehicle: VehicleId,
    permit: EntryPermit,
}

/// FIFO queue of vehicles waiting for entry into an intersection.
///
/// The queue has no lock of its own. It lives inside the intersection's
/// admission state so that it and the occupied gate are always changed under
/// the same mutex.
#[derive(Debug, Default)]
pub struct WaitingVehicles {
    requests: VecDeque<AdmissionRequest>,
}

impl WaitingVehicles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, vehicle: VehicleId, permit: EntryPermit) {
        self.requests.push_back(AdmissionRequest { vehicle, permit });
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Vehicle ids in the order they will be admitted.
    pub fn waiting(&self) -> Vec<VehicleId> {
        self.requests.iter().map(|request| request.vehicle).collect()
    }

    /// Removes the head of the queue and fires its permit.
    ///
    /// Returns the admitted vehicle, or `None` if that vehicle stopped waiting
    /// (its receiver was dropped) and so could not be admitted.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty. Callers check `len()` first.
    pub fn permit_entry_to_first_in_queue(&mut self) -> Option<VehicleId> {
        let Some(AdmissionRequest { vehicle, permit }) = self.requests.pop_front() else {
            panic!("permit_entry_to_first_in_queue called on an empty queue");
        };
        match permit.send(()) {
            Ok(()) => Some(vehicle),
            Err(()) => {
                log::warn!("Vehicle {} stopped waiting before it was admitted", vehicle);
                None
            }
        }
    }

    /// Drops every pending request. Their waiters observe a closed permit.
    pub fn clear(&mut self) -> usize {
        let dropped = self.requests.len();
        self.requests.clear();
        dropped
    }
}
