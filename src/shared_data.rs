// src/shared_data.rs

use crate::data_structures::{IntersectionId, LightState, VehicleId};
use crate::error::{SimError, SimResult};
use crate::global_variables::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Timing of a traffic light and its phase broadcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Shortest phase duration in milliseconds.
    pub phase_min_ms: u64,
    /// Longest phase duration in milliseconds (inclusive).
    pub phase_max_ms: u64,
    /// Delay before a broadcast phase becomes visible to receivers.
    pub send_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            phase_min_ms: PHASE_MIN_MS,
            phase_max_ms: PHASE_MAX_MS,
            send_delay_ms: PHASE_SEND_DELAY_MS,
        }
    }
}

impl TimingConfig {
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.phase_min_ms == 0 {
            return Err(SimError::Config("phase_min_ms must be positive".into()));
        }
        if self.phase_min_ms > self.phase_max_ms {
            return Err(SimError::Config(format!(
                "phase_min_ms ({}) exceeds phase_max_ms ({})",
                self.phase_min_ms, self.phase_max_ms
            )));
        }
        Ok(())
    }
}

/// Settings for a full simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub timing: TimingConfig,
    pub grid_rows: u32,
    pub grid_cols: u32,
    pub vehicles: usize,
    /// Time a vehicle spends inside an intersection.
    pub crossing_ms: u64,
    /// Time a vehicle spends driving along a street.
    pub travel_ms: u64,
    pub run_seconds: u64,
    pub status_interval_ms: u64,
    pub stall_threshold_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timing: TimingConfig::default(),
            grid_rows: DEFAULT_GRID_ROWS,
            grid_cols: DEFAULT_GRID_COLS,
            vehicles: DEFAULT_VEHICLE_COUNT,
            crossing_ms: DEFAULT_CROSSING_MS,
            travel_ms: DEFAULT_TRAVEL_MS,
            run_seconds: DEFAULT_RUN_SECONDS,
            status_interval_ms: STATUS_REPORT_INTERVAL_MS,
            stall_threshold_ms: STALL_THRESHOLD_MS,
        }
    }
}

impl SimulationConfig {
    /// Loads a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> SimResult<Self> {
        let config: SimulationConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.timing.validate()?;
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(SimError::Config("grid must have at least one intersection".into()));
        }
        // Street ids need room for twice the intersection count.
        match self
            .grid_rows
            .checked_mul(self.grid_cols)
            .filter(|count| count.checked_mul(2).is_some())
        {
            None => {
                return Err(SimError::Config(format!(
                    "grid of {} x {} intersections is too large",
                    self.grid_rows, self.grid_cols
                )))
            }
            Some(count) if count < 2 => {
                return Err(SimError::Config("grid needs at least two intersections to form a street".into()));
            }
            Some(_) => {}
        }
        if self.vehicles == 0 {
            return Err(SimError::Config("at least one vehicle is required".into()));
        }
        if self.status_interval_ms == 0 {
            return Err(SimError::Config("status_interval_ms must be positive".into()));
        }
        Ok(())
    }
}

/// Point-in-time view of an intersection, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionStatus {
    pub id: IntersectionId,
    pub queue_depth: usize,
    pub occupant: Option<VehicleId>,
    pub phase: LightState,
}

/// Outcome of a finished simulation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationReport {
    pub crossings: BTreeMap<IntersectionId, u64>,
    pub aborted_vehicles: usize,
}

impl SimulationReport {
    pub fn total_crossings(&self) -> u64 {
        self.crossings.values().sum()
    }
}
