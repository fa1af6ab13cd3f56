// simulation_main.rs
use clap::Parser;
use intersection_sim::shared_data::SimulationConfig;
use intersection_sim::simulation_engine::simulation::run_simulation;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "simulation_main")]
#[command(about = "Vehicles sharing traffic-light controlled intersections")]
struct Cli {
    /// JSON config file; missing fields use defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of vehicles to spawn
    #[arg(long)]
    vehicles: Option<usize>,

    /// How long to run, in seconds
    #[arg(long)]
    seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => match SimulationConfig::from_json_file(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Could not load {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => SimulationConfig::default(),
    };
    if let Some(vehicles) = cli.vehicles {
        config.vehicles = vehicles;
    }
    if let Some(seconds) = cli.seconds {
        config.run_seconds = seconds;
    }

    let stop = CancellationToken::new();
    let ctrl_c = {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop.cancel();
            }
        })
    };

    let result = run_simulation(config, stop).await;
    ctrl_c.abort();

    match result {
        Ok(report) => {
            for (intersection, count) in &report.crossings {
                println!("Intersection {}: {} crossings", intersection, count);
            }
            println!(
                "Total: {} crossings, {} vehicle(s) still waiting at shutdown",
                report.total_crossings(),
                report.aborted_vehicles
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Simulation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
