use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique identifier for an intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntersectionId(pub u32);

/// A unique identifier for a street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreetId(pub u32);

/// A unique identifier for a vehicle actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub u64);

impl fmt::Display for IntersectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for StreetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The possible states for a traffic light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightState {
    Red,
    Green,
}

impl LightState {
    /// The phase the light switches to next.
    pub fn toggled(self) -> Self {
        match self {
            LightState::Red => LightState::Green,
            LightState::Green => LightState::Red,
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            LightState::Red => 0,
            LightState::Green => 1,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => LightState::Green,
            _ => LightState::Red,
        }
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LightState::Red => write!(f, "red"),
            LightState::Green => write!(f, "green"),
        }
    }
}

/// A street joining two intersections (an edge of the road network).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Street {
    pub id: StreetId,
    pub from: IntersectionId,
    pub to: IntersectionId,
}

impl Street {
    pub fn new(id: StreetId, from: IntersectionId, to: IntersectionId) -> Self {
        Self { id, from, to }
    }

    /// The end of the street opposite to `here`.
    ///
    /// Streets are two-way, so a vehicle leaving `here` along this street
    /// arrives at the other endpoint.
    pub fn other_end(&self, here: IntersectionId) -> IntersectionId {
        if self.from == here {
            self.to
        } else {
            self.from
        }
    }
}
