use intersection_sim::control_system::traffic_light_controller::TrafficLight;
use intersection_sim::data_structures::{IntersectionId, LightState, VehicleId};
use intersection_sim::shared_data::TimingConfig;
use intersection_sim::simulation_engine::intersections::Intersection;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

fn timing(phase_min_ms: u64, phase_max_ms: u64) -> TimingConfig {
    TimingConfig {
        phase_min_ms,
        phase_max_ms,
        send_delay_ms: 0,
    }
}

fn new_intersection(timing: TimingConfig) -> Arc<Intersection> {
    Arc::new(Intersection::new(IntersectionId(1), timing).unwrap())
}

async fn wait_for_queue_depth(intersection: &Intersection, depth: usize) {
    timeout(Duration::from_secs(1), async {
        while intersection.queue_depth() != depth {
            sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("queue never reached the expected depth");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn entry_is_granted_in_arrival_order() {
    let intersection = new_intersection(timing(10, 20));
    let order = Arc::new(Mutex::new(Vec::new()));

    // Queue everyone before the admission loop starts so arrival order is fixed.
    let mut vehicles = Vec::new();
    for n in 1..=6u64 {
        let vehicle_intersection = Arc::clone(&intersection);
        let order = Arc::clone(&order);
        vehicles.push(tokio::spawn(async move {
            let id = VehicleId(n);
            vehicle_intersection.request_entry(id).await.unwrap();
            order.lock().unwrap().push(id);
            sleep(Duration::from_millis(2)).await;
            vehicle_intersection.notify_departure(id).unwrap();
        }));
        wait_for_queue_depth(&intersection, n as usize).await;
    }

    intersection.simulate();
    for vehicle in vehicles {
        timeout(Duration::from_secs(5), vehicle).await.unwrap().unwrap();
    }

    let expected: Vec<_> = (1..=6).map(VehicleId).collect();
    assert_eq!(*order.lock().unwrap(), expected);
    intersection.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn vehicles_arriving_while_occupied_are_granted_in_arrival_order() {
    let intersection = new_intersection(timing(10, 20));
    intersection.simulate();

    let first = VehicleId(1);
    timeout(Duration::from_secs(1), intersection.request_entry(first))
        .await
        .unwrap()
        .unwrap();

    // Arrive one at a time while the admission loop is live and the gate is held.
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut vehicles = Vec::new();
    for n in 2..=6u64 {
        let intersection_for_task = Arc::clone(&intersection);
        let order = Arc::clone(&order);
        vehicles.push(tokio::spawn(async move {
            let id = VehicleId(n);
            intersection_for_task.request_entry(id).await.unwrap();
            order.lock().unwrap().push(id);
            sleep(Duration::from_millis(2)).await;
            intersection_for_task.notify_departure(id).unwrap();
        }));
        wait_for_queue_depth(&intersection, (n - 1) as usize).await;
        assert_eq!(intersection.occupant(), Some(first));
    }

    intersection.notify_departure(first).unwrap();
    for vehicle in vehicles {
        timeout(Duration::from_secs(5), vehicle).await.unwrap().unwrap();
    }

    let expected: Vec<_> = (2..=6).map(VehicleId).collect();
    assert_eq!(*order.lock().unwrap(), expected);
    intersection.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn at_most_one_vehicle_is_inside_at_a_time() {
    let intersection = new_intersection(timing(10, 20));
    intersection.simulate();
    let inside = Arc::new(AtomicUsize::new(0));

    let vehicles: Vec<_> = (1..=8u64)
        .map(|n| {
            let intersection = Arc::clone(&intersection);
            let inside = Arc::clone(&inside);
            tokio::spawn(async move {
                let id = VehicleId(n);
                intersection.request_entry(id).await.unwrap();
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0, "two vehicles admitted at once");
                assert_eq!(intersection.occupant(), Some(id));
                sleep(Duration::from_millis(3)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
                intersection.notify_departure(id).unwrap();
            })
        })
        .collect();

    for vehicle in vehicles {
        timeout(Duration::from_secs(5), vehicle).await.unwrap().unwrap();
    }
    assert!(!intersection.is_occupied());
    intersection.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn entry_is_only_granted_on_green() {
    let intersection = new_intersection(timing(40, 60));
    intersection.simulate();

    let mut red_on_entry = 0;
    for n in 1..=20u64 {
        let id = VehicleId(n);
        timeout(Duration::from_secs(2), intersection.request_entry(id))
            .await
            .unwrap()
            .unwrap();
        if !intersection.traffic_light_is_green() {
            red_on_entry += 1;
        }
        intersection.notify_departure(id).unwrap();
        // Vary where in the cycle the next request lands.
        sleep(Duration::from_millis(n * 7 % 50)).await;
    }

    // Tolerates the light flipping right after a return.
    assert!(red_on_entry <= 1, "entered on red {} times", red_on_entry);
    intersection.shutdown().await;
}

#[tokio::test]
async fn waiter_wakes_once_the_light_turns_green() {
    let light = Arc::new(TrafficLight::new(IntersectionId(9), timing(100, 100)).unwrap());
    assert_eq!(light.current_phase(), LightState::Red);

    let cancel = CancellationToken::new();
    let started = Instant::now();
    let cycle = light.simulate(cancel.clone());

    timeout(Duration::from_secs(1), light.wait_for_green())
        .await
        .expect("missed the green broadcast");
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert_eq!(light.current_phase(), LightState::Green);

    cancel.cancel();
    cycle.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_request_completes_when_vehicles_depart() {
    let intersection = new_intersection(timing(10, 20));
    intersection.simulate();

    let vehicles: Vec<_> = (1..=3u64)
        .map(|n| {
            let intersection = Arc::clone(&intersection);
            tokio::spawn(async move {
                let id = VehicleId(n);
                intersection.request_entry(id).await.unwrap();
                sleep(Duration::from_millis(50)).await;
                intersection.notify_departure(id).unwrap();
            })
        })
        .collect();

    timeout(Duration::from_secs(1), async {
        for vehicle in vehicles {
            vehicle.await.unwrap();
        }
    })
    .await
    .expect("a vehicle was never admitted");
    assert_eq!(intersection.queue_depth(), 0);
    intersection.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn vehicle_that_never_departs_starves_the_queue() {
    let intersection = new_intersection(timing(10, 20));
    intersection.simulate();

    let a = VehicleId(1);
    timeout(Duration::from_secs(1), intersection.request_entry(a))
        .await
        .unwrap()
        .unwrap();
    // `a` never calls notify_departure.

    let mut b = {
        let intersection = Arc::clone(&intersection);
        tokio::spawn(async move { intersection.request_entry(VehicleId(2)).await })
    };
    wait_for_queue_depth(&intersection, 1).await;
    let status = intersection.status();
    assert_eq!(status.occupant, Some(a));
    assert_eq!(status.queue_depth, 1);

    assert!(timeout(Duration::from_secs(2), &mut b).await.is_err());
    assert_eq!(intersection.occupant(), Some(a));

    b.abort();
    intersection.shutdown().await;
}
