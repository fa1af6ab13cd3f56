use crate::data_structures::{IntersectionId, VehicleId};
use crate::shared_data::IntersectionStatus;
use crate::simulation_engine::intersections::Intersection;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Flags intersections held by the same vehicle for too long.
///
/// A vehicle that never reports its departure blocks its intersection forever
/// and looks exactly like a slow one. This makes the difference visible.
#[derive(Debug)]
pub struct StallDetector {
    threshold: Duration,
    held_since: HashMap<IntersectionId, (VehicleId, Instant)>,
}

impl StallDetector {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            held_since: HashMap::new(),
        }
    }

    /// Records a status sample. Returns how long the current occupant has held
    /// the intersection if that exceeds the threshold.
    pub fn observe(&mut self, status: &IntersectionStatus, now: Instant) -> Option<Duration> {
        let Some(occupant) = status.occupant else {
            self.held_since.remove(&status.id);
            return None;
        };

        let entry = self.held_since.entry(status.id).or_insert((occupant, now));
        if entry.0 != occupant {
            *entry = (occupant, now);
        }

        let held = now.saturating_duration_since(entry.1);
        (held >= self.threshold).then_some(held)
    }
}

// Periodically logs every intersection's queue depth, occupant and phase.
pub fn spawn_status_reporter(
    intersections: Vec<Arc<Intersection>>,
    period: Duration,
    stall_threshold: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut detector = StallDetector::new(stall_threshold);
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let now = Instant::now();
            for intersection in &intersections {
                let status = intersection.status();
                match serde_json::to_string(&status) {
                    Ok(json) => log::info!("[Status] {}", json),
                    Err(e) => log::error!("[Status] failed to serialize status: {}", e),
                }
                if let Some(held) = detector.observe(&status, now) {
                    log::warn!(
                        "[Status] Intersection {} held by vehicle {:?} for {:.1}s with {} waiting",
                        status.id,
                        status.occupant,
                        held.as_secs_f64(),
                        status.queue_depth
                    );
                }
            }
        }
    })
}
