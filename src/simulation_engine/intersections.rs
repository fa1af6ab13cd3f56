use crate::control_system::traffic_light_controller::TrafficLight;
use crate::data_structures::{IntersectionId, LightState, Street, StreetId, VehicleId};
use crate::error::{SimError, SimResult};
use crate::shared_data::{IntersectionStatus, TimingConfig};
use crate::simulation_engine::waiting_vehicles::WaitingVehicles;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Queue and gate, always mutated together.
#[derive(Debug, Default)]
struct AdmissionState {
    waiting: WaitingVehicles,
    /// The vehicle holding the intersection, if any.
    occupant: Option<VehicleId>,
}

/// Represents a traffic intersection (node) shared by many vehicle tasks.
///
/// Vehicles call [`request_entry`](Self::request_entry) and are admitted one at
/// a time in arrival order. An admitted vehicle holds the intersection until it
/// calls [`notify_departure`](Self::notify_departure).
///
/// A vehicle that is admitted and never departs stalls the intersection for
/// good. That is a caller bug; the intersection does not time it out.
pub struct Intersection {
    pub id: IntersectionId,
    /// Streets meeting at this intersection.
    streets: Mutex<Vec<Arc<Street>>>,
    state: Mutex<AdmissionState>,
    /// Wakes the admission loop on enqueue and on departure.
    wake: Notify,
    traffic_light: Arc<TrafficLight>,
    shutdown: CancellationToken,
    started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Intersection {
    /// Fails if `timing` is invalid, so a light that could never cycle is
    /// rejected here rather than inside its task.
    pub fn new(id: IntersectionId, timing: TimingConfig) -> SimResult<Self> {
        Ok(Self {
            id,
            streets: Mutex::new(Vec::new()),
            state: Mutex::new(AdmissionState::default()),
            wake: Notify::new(),
            traffic_light: Arc::new(TrafficLight::new(id, timing)?),
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn add_street(&self, street: Arc<Street>) {
        lock(&self.streets).push(street);
    }

    /// All streets leaving this intersection except the one the caller came in on.
    pub fn query_adjacent_streets(&self, incoming: StreetId) -> Vec<Arc<Street>> {
        lock(&self.streets)
            .iter()
            .filter(|street| street.id != incoming)
            .cloned()
            .collect()
    }

    pub fn streets(&self) -> Vec<Arc<Street>> {
        lock(&self.streets).clone()
    }

    pub fn traffic_light(&self) -> &Arc<TrafficLight> {
        &self.traffic_light
    }

    pub fn traffic_light_is_green(&self) -> bool {
        self.traffic_light.is_green()
    }

    /// Adds a vehicle to the end of the waiting line and returns once it may
    /// cross: it has been admitted and the light is green.
    ///
    /// Fails only if the intersection is shut down first. After `Ok(())` the
    /// vehicle holds the intersection until it calls `notify_departure`.
    ///
    /// Cancel safe: if the returned future is dropped, or fails, after the
    /// vehicle was admitted, the intersection is released for the next vehicle.
    pub async fn request_entry(&self, vehicle: VehicleId) -> SimResult<()> {
        log::debug!("Intersection {}: vehicle {} joined the queue", self.id, vehicle);

        let (permit, admitted) = oneshot::channel();
        {
            let mut state = self.state();
            if self.shutdown.is_cancelled() {
                return Err(SimError::AdmissionAborted {
                    intersection: self.id,
                    vehicle,
                });
            }
            state.waiting.push_back(vehicle, permit);
        }
        self.wake.notify_one();

        // Armed before awaiting the permit: the grant can land after this
        // future stops being polled.
        let guard = AdmissionGuard {
            intersection: self,
            vehicle,
            armed: true,
        };

        admitted.await.map_err(|_| SimError::AdmissionAborted {
            intersection: self.id,
            vehicle,
        })?;
        log::info!("Intersection {}: vehicle {} is granted entry", self.id, vehicle);

        if self.traffic_light.current_phase() == LightState::Red {
            tokio::select! {
                _ = self.traffic_light.wait_for_green() => {}
                _ = self.shutdown.cancelled() => return Err(SimError::LightStopped(self.id)),
            }
        }
        guard.disarm();
        Ok(())
    }

    /// Releases the intersection so the next queued vehicle can be admitted.
    pub fn notify_departure(&self, vehicle: VehicleId) -> SimResult<()> {
        {
            let mut state = self.state();
            if state.occupant != Some(vehicle) {
                return Err(SimError::NotOccupant {
                    intersection: self.id,
                    vehicle,
                    occupant: state.occupant,
                });
            }
            state.occupant = None;
        }
        log::debug!("Intersection {}: vehicle {} has left, unblocked", self.id, vehicle);
        self.wake.notify_one();
        Ok(())
    }

    pub fn queue_depth(&self) -> usize {
        self.state().waiting.len()
    }

    pub fn is_occupied(&self) -> bool {
        self.state().occupant.is_some()
    }

    pub fn occupant(&self) -> Option<VehicleId> {
        self.state().occupant
    }

    pub fn status(&self) -> IntersectionStatus {
        let state = self.state();
        IntersectionStatus {
            id: self.id,
            queue_depth: state.waiting.len(),
            occupant: state.occupant,
            phase: self.traffic_light.current_phase(),
        }
    }

    /// Starts the traffic light and the admission loop. Only the first call
    /// has any effect.
    pub fn simulate(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::AcqRel) {
            log::warn!("Intersection {}: simulate called more than once", self.id);
            return;
        }

        let light_task = self.traffic_light.simulate(self.shutdown.child_token());
        let this = Arc::clone(self);
        let cancel = self.shutdown.child_token();
        let admission_task = tokio::spawn(async move { this.process_vehicle_queue(cancel).await });

        lock(&self.tasks).extend([light_task, admission_task]);
    }

    /// Stops both loops and waits for them to finish. Vehicles still queued
    /// receive `AdmissionAborted`.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            if let Err(e) = task.await {
                log::error!("Intersection {}: task ended abnormally: {}", self.id, e);
            }
        }
        // Covers the case where simulate was never called.
        self.abort_waiting();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    async fn process_vehicle_queue(&self, cancel: CancellationToken) {
        log::debug!("Intersection {}: admission loop started", self.id);
        loop {
            let notified = self.wake.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            self.admit_next();

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = notified => {}
            }
        }
        self.abort_waiting();
        log::debug!("Intersection {}: admission loop stopped", self.id);
    }

    // Checking the gate, marking it occupied and granting the head of the
    // queue all happen under one lock, so no second grant can slip in.
    fn admit_next(&self) {
        let mut state = self.state();
        while state.occupant.is_none() && !state.waiting.is_empty() {
            if let Some(vehicle) = state.waiting.permit_entry_to_first_in_queue() {
                state.occupant = Some(vehicle);
                log::debug!("Intersection {}: blocked by vehicle {}", self.id, vehicle);
            }
        }
    }

    // Frees the gate held by a vehicle whose `request_entry` never returned `Ok`.
    fn release_abandoned(&self, vehicle: VehicleId) {
        {
            let mut state = self.state();
            if state.occupant != Some(vehicle) {
                return;
            }
            state.occupant = None;
        }
        log::warn!(
            "Intersection {}: vehicle {} gave up after admission, unblocked",
            self.id,
            vehicle
        );
        self.wake.notify_one();
    }

    fn abort_waiting(&self) {
        let dropped = self.state().waiting.clear();
        if dropped > 0 {
            log::info!(
                "Intersection {}: dropped {} waiting vehicle(s) on shutdown",
                self.id,
                dropped
            );
        }
    }

    fn state(&self) -> MutexGuard<'_, AdmissionState> {
        lock(&self.state)
    }
}

/// Releases the intersection if `request_entry` does not complete successfully.
struct AdmissionGuard<'a> {
    intersection: &'a Intersection,
    vehicle: VehicleId,
    armed: bool,
}

impl AdmissionGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AdmissionGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.intersection.release_abandoned(self.vehicle);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
