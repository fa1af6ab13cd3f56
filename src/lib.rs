//! Concurrent intersection simulation.
//!
//! Vehicles run as independent tokio tasks and must be admitted by an
//! [`Intersection`](simulation_engine::intersections::Intersection) before
//! crossing. Admission is strictly FIFO, one vehicle at a time, and gated on
//! the intersection's [`TrafficLight`](control_system::traffic_light_controller::TrafficLight)
//! being green.

pub mod communication;
pub mod control_system;
pub mod data_structures;
pub mod error;
pub mod global_variables;
pub mod monitoring;
pub mod shared_data;
pub mod simulation_engine;
