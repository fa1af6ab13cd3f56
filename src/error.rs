//! Error type shared by the whole crate.
//!
//! Only conditions a caller can react to are represented here. Breaking the
//! admission queue's own preconditions is a bug and panics instead.

use thiserror::Error;

use crate::data_structures::{IntersectionId, VehicleId};

#[derive(Debug, Error)]
pub enum SimError {
    #[error("intersection {intersection} shut down before vehicle {vehicle} was admitted")]
    AdmissionAborted {
        intersection: IntersectionId,
        vehicle: VehicleId,
    },

    #[error("traffic light at intersection {0} stopped before turning green")]
    LightStopped(IntersectionId),

    #[error("vehicle {vehicle} left intersection {intersection} it does not occupy (occupant: {occupant:?})")]
    NotOccupant {
        intersection: IntersectionId,
        vehicle: VehicleId,
        occupant: Option<VehicleId>,
    },

    #[error("intersection {0} is not part of the road network")]
    UnknownIntersection(IntersectionId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
