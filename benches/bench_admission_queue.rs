// benches/bench_admission_queue.rs

use criterion::{black_box, criterion_group, criterion_main, AxisScale, Criterion, PlotConfiguration};
use intersection_sim::data_structures::VehicleId;
use intersection_sim::simulation_engine::waiting_vehicles::WaitingVehicles;
use std::time::Duration;
use tokio::sync::oneshot;

// Fills the queue with `size` requests, then grants every one of them in order.
fn fill_and_drain(size: u64) {
    let mut queue = WaitingVehicles::new();
    let mut receivers = Vec::with_capacity(size as usize);
    for id in 0..size {
        let (tx, rx) = oneshot::channel();
        queue.push_back(VehicleId(id), tx);
        receivers.push(rx);
    }
    while !queue.is_empty() {
        black_box(queue.permit_entry_to_first_in_queue());
    }
    black_box(receivers);
}

fn bench_admission_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("admission_queue");

    group.sample_size(100);
    group.measurement_time(Duration::from_secs(5));
    group.warm_up_time(Duration::from_secs(2));
    group.plot_config(PlotConfiguration::default().summary_scale(AxisScale::Linear));

    for &size in [50, 100, 200].iter() {
        group.bench_function(format!("size_{}", size), |b| {
            b.iter(|| fill_and_drain(size));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_admission_queue);
criterion_main!(benches);
