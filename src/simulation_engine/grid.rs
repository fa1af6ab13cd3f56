use crate::data_structures::{IntersectionId, Street, StreetId};
use crate::error::{SimError, SimResult};
use crate::shared_data::TimingConfig;
use crate::simulation_engine::intersections::Intersection;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A rows x cols grid of intersections joined by two-way streets.
pub struct RoadNetwork {
    /// Stores all intersections by id. Row-major: id = row * cols + col.
    pub intersections: BTreeMap<IntersectionId, Arc<Intersection>>,
    pub streets: Vec<Arc<Street>>,
}

impl RoadNetwork {
    /// Fails if `timing` is invalid or the grid has more intersections than
    /// fit in an `IntersectionId`.
    pub fn grid(rows: u32, cols: u32, timing: TimingConfig) -> SimResult<Self> {
        // Intersection ids stay below rows * cols and street ids below twice
        // that, so once this fits the arithmetic further down cannot overflow.
        if rows.checked_mul(cols).and_then(|count| count.checked_mul(2)).is_none() {
            return Err(SimError::Config(format!(
                "grid of {} x {} intersections is too large",
                rows, cols
            )));
        }

        let mut intersections = BTreeMap::new();
        let mut streets = Vec::new();

        for row in 0..rows {
            for col in 0..cols {
                let id = IntersectionId(row * cols + col);
                intersections.insert(id, Arc::new(Intersection::new(id, timing)?));
            }
        }

        let mut next_street = 0;
        let mut connect = |from: IntersectionId, to: IntersectionId| {
            let street = Arc::new(Street::new(StreetId(next_street), from, to));
            next_street += 1;
            streets.push(street);
        };

        // Horizontal streets: (row, col) <-> (row, col + 1)
        for row in 0..rows {
            for col in 0..cols.saturating_sub(1) {
                connect(IntersectionId(row * cols + col), IntersectionId(row * cols + col + 1));
            }
        }
        // Vertical streets: (row, col) <-> (row + 1, col)
        for row in 0..rows.saturating_sub(1) {
            for col in 0..cols {
                connect(IntersectionId(row * cols + col), IntersectionId((row + 1) * cols + col));
            }
        }

        for street in &streets {
            for end in [street.from, street.to] {
                if let Some(intersection) = intersections.get(&end) {
                    intersection.add_street(Arc::clone(street));
                }
            }
        }

        Ok(Self {
            intersections,
            streets,
        })
    }

    pub fn intersection(&self, id: IntersectionId) -> Option<&Arc<Intersection>> {
        self.intersections.get(&id)
    }

    pub fn simulate(&self) {
        for intersection in self.intersections.values() {
            intersection.simulate();
        }
    }

    pub async fn shutdown(&self) {
        for intersection in self.intersections.values() {
            intersection.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_wires_every_street_to_both_ends() {
        let network = RoadNetwork::grid(2, 3, TimingConfig::default()).unwrap();
        assert_eq!(network.intersections.len(), 6);
        // 2 rows * 2 horizontal + 3 cols * 1 vertical
        assert_eq!(network.streets.len(), 7);

        let corner = network.intersection(IntersectionId(0)).unwrap();
        assert_eq!(corner.streets().len(), 2);
        let middle = network.intersection(IntersectionId(1)).unwrap();
        assert_eq!(middle.streets().len(), 3);

        for street in &network.streets {
            for end in [street.from, street.to] {
                let ids: Vec<_> = network.intersection(end).unwrap().streets().iter().map(|s| s.id).collect();
                assert!(ids.contains(&street.id));
            }
        }
    }

    #[test]
    fn oversized_grid_is_rejected() {
        assert!(matches!(
            RoadNetwork::grid(70000, 70000, TimingConfig::default()),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn single_row_grid_is_a_line() {
        let network = RoadNetwork::grid(1, 3, TimingConfig::default()).unwrap();
        assert_eq!(network.streets.len(), 2);
        let end = network.intersection(IntersectionId(2)).unwrap();
        assert_eq!(end.streets().len(), 1);
    }
}
