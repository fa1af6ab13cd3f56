// simulation.rs
use crate::data_structures::VehicleId;
use crate::error::SimResult;
use crate::monitoring::traffic_monitoring_system::spawn_status_reporter;
use crate::shared_data::{SimulationConfig, SimulationReport};
use crate::simulation_engine::grid::RoadNetwork;
use crate::simulation_engine::vehicles::Vehicle;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Builds the road network, starts every intersection, and lets the vehicles
/// drive until the configured run time elapses or `stop` is cancelled.
///
/// Vehicles are stopped before the intersections shut down, so every vehicle
/// that was crossing releases its intersection first.
pub async fn run_simulation(config: SimulationConfig, stop: CancellationToken) -> SimResult<SimulationReport> {
    config.validate()?;

    let network = Arc::new(RoadNetwork::grid(config.grid_rows, config.grid_cols, config.timing)?);
    log::info!(
        "Starting simulation: {} intersections, {} streets, {} vehicles",
        network.intersections.len(),
        network.streets.len(),
        config.vehicles
    );
    network.simulate();

    let vehicles_stop = stop.child_token();
    let reporter = spawn_status_reporter(
        network.intersections.values().cloned().collect(),
        Duration::from_millis(config.status_interval_ms),
        Duration::from_millis(config.stall_threshold_ms),
        stop.child_token(),
    );

    // Spread vehicles over the streets, round robin.
    let mut drivers = Vec::with_capacity(config.vehicles);
    for n in 0..config.vehicles {
        let street = &network.streets[n % network.streets.len()];
        let vehicle = Vehicle::new(
            VehicleId(n as u64 + 1),
            street,
            Duration::from_millis(config.crossing_ms),
            Duration::from_millis(config.travel_ms),
        );
        log::info!("Spawned vehicle {} heading to intersection {}", vehicle.id, vehicle.position);
        drivers.push(tokio::spawn(vehicle.drive(Arc::clone(&network), vehicles_stop.clone())));
    }

    tokio::select! {
        _ = stop.cancelled() => log::info!("Simulation stopped early"),
        _ = sleep(Duration::from_secs(config.run_seconds)) => {}
    }

    vehicles_stop.cancel();
    network.shutdown().await;
    stop.cancel();

    let mut report = SimulationReport::default();
    for intersection in network.intersections.keys() {
        report.crossings.insert(*intersection, 0);
    }
    for driver in drivers {
        match driver.await {
            Ok(Ok(journey)) => {
                if journey.aborted {
                    report.aborted_vehicles += 1;
                }
                for intersection in journey.crossed {
                    *report.crossings.entry(intersection).or_default() += 1;
                }
            }
            Ok(Err(e)) => log::error!("Vehicle failed: {}", e),
            Err(e) => log::error!("Vehicle task panicked: {}", e),
        }
    }
    if let Err(e) = reporter.await {
        log::error!("Status reporter ended abnormally: {}", e);
    }

    log::info!("Simulation finished with {} crossings", report.total_crossings());
    Ok(report)
}
