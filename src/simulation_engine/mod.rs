// simulation_engine/mod.rs
pub mod grid;
pub mod intersections;
pub mod simulation;
pub mod vehicles;
pub mod waiting_vehicles;
