//! Spatial distribution of elements: spread, crowding and type mix.

use crate::config::MetricsConfig;
use crate::environment::{ElementType, Park, ParkElement};
use crate::types::{mean, std_dev};

pub struct DistributionCalculator<'a> {
    park: &'a Park,
    config: &'a MetricsConfig,
}

impl<'a> DistributionCalculator<'a> {
    pub fn new(park: &'a Park, config: &'a MetricsConfig) -> Self {
        Self { park, config }
    }

    /// Weighted blend of spread uniformity, crowding and grid coverage.
    /// Zero with fewer than two elements.
    pub fn distribution_score(&self) -> f64 {
        if self.park.len() < 2 {
            return 0.0;
        }
        self.spatial_uniformity() * 0.4 + self.clustering_score() * 0.3 + self.grid_coverage() * 0.3
    }

    /// `1 / (1 + CV)` of all pairwise distances.
    pub fn spatial_uniformity(&self) -> f64 {
        uniformity(&self.park.elements().iter().collect::<Vec<_>>())
    }

    /// One minus the fraction of element pairs closer than half a cell.
    pub fn clustering_score(&self) -> f64 {
        let elements = self.park.elements();
        if elements.len() < 2 {
            return 1.0;
        }
        let min_distance = self.park.cell_size() * 0.5;
        let (mut close, mut total) = (0usize, 0usize);
        for (i, a) in elements.iter().enumerate() {
            for b in &elements[i + 1..] {
                total += 1;
                if a.position.distance_2d(&b.position) < min_distance {
                    close += 1;
                }
            }
        }
        1.0 - close as f64 / total as f64
    }

    /// Peaks at the optimal occupancy.
    pub fn grid_coverage(&self) -> f64 {
        let optimal = self.config.optimal_occupancy;
        (1.0 - (self.park.occupancy_rate() - optimal).abs() / optimal).max(0.0)
    }

    /// Uniformity among the elements of one type. A single element scores
    /// one, none scores zero.
    pub fn type_distribution(&self, element_type: ElementType) -> f64 {
        let elements: Vec<_> = self.park.elements_by_type(element_type).collect();
        match elements.len() {
            0 => 0.0,
            1 => 1.0,
            _ => uniformity(&elements),
        }
    }

    /// Fraction of placeable types present.
    pub fn diversity(&self) -> f64 {
        let present = ElementType::ACTIVE
            .iter()
            .filter(|t| self.park.element_count(**t) > 0)
            .count();
        present as f64 / ElementType::ACTIVE.len() as f64
    }

    /// `1 / (1 + CV)` of the per-type counts of the types that are present.
    pub fn balance(&self) -> f64 {
        let counts: Vec<f64> = ElementType::ALL
            .iter()
            .map(|t| self.park.element_count(*t))
            .filter(|c| *c > 0)
            .map(|c| c as f64)
            .collect();
        if counts.is_empty() {
            return 0.0;
        }
        1.0 / (1.0 + std_dev(&counts) / mean(&counts))
    }
}

fn uniformity(elements: &[&ParkElement]) -> f64 {
    if elements.len() < 2 {
        return 0.0;
    }
    let mut distances = Vec::with_capacity(elements.len() * (elements.len() - 1) / 2);
    for (i, a) in elements.iter().enumerate() {
        for b in &elements[i + 1..] {
            distances.push(a.position.distance_2d(&b.position));
        }
    }
    let m = mean(&distances);
    if m <= 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + std_dev(&distances) / m)
}
