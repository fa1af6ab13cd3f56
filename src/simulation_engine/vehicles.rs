use crate::data_structures::{IntersectionId, Street, StreetId, VehicleId};
use crate::error::{SimError, SimResult};
use crate::simulation_engine::grid::RoadNetwork;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// A vehicle driving around the road network as its own task.
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    /// The intersection the vehicle is approaching.
    pub position: IntersectionId,
    /// The street it is arriving on.
    pub incoming: StreetId,
    /// Time spent inside an intersection.
    pub crossing_time: Duration,
    /// Time spent driving along a street.
    pub travel_time: Duration,
}

/// What a vehicle did before it stopped.
#[derive(Debug, Clone, Default)]
pub struct Journey {
    pub crossed: Vec<IntersectionId>,
    /// The vehicle was still waiting at an intersection when it shut down.
    pub aborted: bool,
}

impl Vehicle {
    /// Places a vehicle on `street`, heading towards its `to` end.
    pub fn new(id: VehicleId, street: &Street, crossing_time: Duration, travel_time: Duration) -> Self {
        Self {
            id,
            position: street.to,
            incoming: street.id,
            crossing_time,
            travel_time,
        }
    }

    /// Drives from intersection to intersection until `cancel` fires or the
    /// intersection it waits at shuts down.
    ///
    /// Every admitted crossing is paired with a departure, including the one
    /// interrupted by cancellation.
    pub async fn drive(mut self, network: Arc<RoadNetwork>, cancel: CancellationToken) -> SimResult<Journey> {
        let mut journey = Journey::default();

        while !cancel.is_cancelled() {
            let intersection = network
                .intersection(self.position)
                .ok_or(SimError::UnknownIntersection(self.position))?;

            if let Err(e) = intersection.request_entry(self.id).await {
                log::debug!("Vehicle {} stopped waiting: {}", self.id, e);
                journey.aborted = true;
                break;
            }

            let interrupted = pause(self.crossing_time, &cancel).await;
            let next = choose_next_street(&intersection.query_adjacent_streets(self.incoming))
                .or_else(|| intersection.streets().into_iter().find(|s| s.id == self.incoming));
            intersection.notify_departure(self.id)?;
            journey.crossed.push(self.position);

            let Some(next) = next else {
                log::warn!("Vehicle {}: intersection {} has no streets", self.id, self.position);
                break;
            };
            if interrupted {
                break;
            }

            log::debug!(
                "Vehicle {} left intersection {} on street {}",
                self.id,
                self.position,
                next.id
            );
            self.position = next.other_end(self.position);
            self.incoming = next.id;

            if pause(self.travel_time, &cancel).await {
                break;
            }
        }
        Ok(journey)
    }
}

// Random outgoing street. `None` at a dead end.
fn choose_next_street(options: &[Arc<Street>]) -> Option<Arc<Street>> {
    options.choose(&mut rand::rng()).cloned()
}

// Sleeps for `duration`; returns true if cancelled first.
async fn pause(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = sleep(duration) => false,
    }
}
