use crate::communication::messages::PhaseBroadcastChannel;
use crate::data_structures::{IntersectionId, LightState};
use crate::error::SimResult;
use crate::shared_data::TimingConfig;
use rand::Rng;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// A traffic light that toggles between red and green on a randomized schedule.
///
/// The current phase is written only by the light's own cycle task and can be
/// read from anywhere without locking. Every change is also broadcast on a
/// [`PhaseBroadcastChannel`] so waiters can sleep until the light turns green.
pub struct TrafficLight {
    intersection: IntersectionId,
    current_phase: AtomicU8,
    queue: PhaseBroadcastChannel,
    timing: TimingConfig,
}

impl TrafficLight {
    /// Fails if `timing` has an empty or zero-length phase range.
    pub fn new(intersection: IntersectionId, timing: TimingConfig) -> SimResult<Self> {
        timing.validate()?;
        Ok(Self {
            intersection,
            current_phase: AtomicU8::new(LightState::Red.as_u8()),
            queue: PhaseBroadcastChannel::with_send_delay(timing.send_delay()),
            timing,
        })
    }

    pub fn current_phase(&self) -> LightState {
        LightState::from_u8(self.current_phase.load(Ordering::Acquire))
    }

    pub fn is_green(&self) -> bool {
        self.current_phase() == LightState::Green
    }

    // Waits for a green broadcast. Stale messages that piled up while nobody
    // was listening are skipped: a green only counts if the light is still green.
    pub async fn wait_for_green(&self) {
        loop {
            let phase = self.queue.receive().await;
            if phase == LightState::Green && self.is_green() {
                return;
            }
        }
    }

    /// Number of broadcasts nobody has received yet.
    pub fn pending_broadcasts(&self) -> usize {
        self.queue.len()
    }

    // Starts the phase cycle as its own task. The task runs until `cancel` fires.
    pub fn simulate(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let light = Arc::clone(self);
        tokio::spawn(async move { light.cycle_through_phases(cancel).await })
    }

    async fn cycle_through_phases(&self, cancel: CancellationToken) {
        log::debug!("Traffic light {}: cycle started", self.intersection);
        loop {
            let phase_duration = self.random_phase_duration();
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(phase_duration) => {}
            }

            let phase = self.toggle_phase();
            log::info!("Traffic light {}: switched to {}", self.intersection, phase);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.queue.send(phase) => {}
            }
        }
        log::debug!("Traffic light {}: cycle stopped", self.intersection);
    }

    fn toggle_phase(&self) -> LightState {
        let next = self.current_phase().toggled();
        self.current_phase.store(next.as_u8(), Ordering::Release);
        next
    }

    fn random_phase_duration(&self) -> Duration {
        let millis = rand::rng().random_range(self.timing.phase_min_ms..=self.timing.phase_max_ms);
        Duration::from_millis(millis)
    }
}
