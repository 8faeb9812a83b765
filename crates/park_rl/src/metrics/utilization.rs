//! Space utilization: how much of the park the placed elements actually serve.

use crate::config::MetricsConfig;
use crate::environment::Park;
use serde::{Deserialize, Serialize};

/// Samples farther than this from every element count as wasted.
const WASTED_DISTANCE: f64 = 6.0;

/// Detailed utilization figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationBreakdown {
    pub overall: f64,
    pub occupancy_rate: f64,
    pub effective_space: f64,
    pub density_score: f64,
    pub wasted_space: f64,
}

pub struct UtilizationCalculator<'a> {
    park: &'a Park,
    config: &'a MetricsConfig,
}

impl<'a> UtilizationCalculator<'a> {
    pub fn new(park: &'a Park, config: &'a MetricsConfig) -> Self {
        Self { park, config }
    }

    /// Blend of raw grid occupancy and effective space usage.
    pub fn utilization(&self) -> f64 {
        self.park.occupancy_rate() * self.config.occupancy_weight
            + self.effective_space() * self.config.effective_weight
    }

    /// Fraction of sample points within the influence radius of some element.
    pub fn effective_space(&self) -> f64 {
        if self.park.is_empty() {
            return 0.0;
        }
        let radii = &self.config.influence_radii;
        let (mut influenced, mut total) = (0usize, 0usize);
        for (x, y) in self.sample_points() {
            total += 1;
            let hit = self.park.elements().iter().any(|e| {
                let dx = x - e.position.x;
                let dy = y - e.position.y;
                (dx * dx + dy * dy).sqrt() <= radii.get(e.element_type)
            });
            if hit {
                influenced += 1;
            }
        }
        (influenced as f64 / total as f64).min(1.0)
    }

    /// Peaks when the grid is filled to the optimal occupancy, zero when empty.
    pub fn density_score(&self) -> f64 {
        let ratio = self.park.occupancy_rate();
        if ratio == 0.0 {
            return 0.0;
        }
        let optimal = self.config.optimal_occupancy;
        (1.0 - (ratio - optimal).abs() / optimal).clamp(0.0, 1.0)
    }

    /// Fraction of sample points farther than a few meters from any element.
    pub fn wasted_space(&self) -> f64 {
        let (mut wasted, mut total) = (0usize, 0usize);
        for (x, y) in self.sample_points() {
            total += 1;
            let near = self.park.elements().iter().any(|e| {
                let dx = x - e.position.x;
                let dy = y - e.position.y;
                (dx * dx + dy * dy).sqrt() <= WASTED_DISTANCE
            });
            if !near {
                wasted += 1;
            }
        }
        wasted as f64 / total as f64
    }

    pub fn breakdown(&self) -> UtilizationBreakdown {
        UtilizationBreakdown {
            overall: self.utilization(),
            occupancy_rate: self.park.occupancy_rate(),
            effective_space: self.effective_space(),
            density_score: self.density_score(),
            wasted_space: self.wasted_space(),
        }
    }

    fn sample_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let resolution = self.config.utilization_resolution;
        let size = self.park.size();
        let half = size / 2.0;
        (0..resolution).flat_map(move |i| {
            (0..resolution).map(move |j| {
                (
                    j as f64 / resolution as f64 * size - half,
                    i as f64 / resolution as f64 * size - half,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ElementType;

    #[test]
    fn test_empty_park() {
        let park = Park::new(30.0, 3).unwrap();
        let config = MetricsConfig::default();
        let calc = UtilizationCalculator::new(&park, &config);
        assert_eq!(calc.utilization(), 0.0);
        assert_eq!(calc.density_score(), 0.0);
        assert_eq!(calc.wasted_space(), 1.0);
    }

    #[test]
    fn test_utilization_grows_with_elements() {
        let mut park = Park::new(30.0, 3).unwrap();
        let config = MetricsConfig::default();
        park.add_element(ElementType::Bench, 0, 0);
        let one = UtilizationCalculator::new(&park, &config).utilization();
        park.add_element(ElementType::StreetLamp, 2, 2);
        let two = UtilizationCalculator::new(&park, &config).utilization();
        assert!(one > 0.0);
        assert!(two > one);
        assert!(two <= 1.0);
    }

    #[test]
    fn test_density_peaks_near_optimal() {
        let mut park = Park::new(30.0, 10).unwrap();
        let config = MetricsConfig::default();
        let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(5);
        park.randomize(65, &mut rng);
        let peak = UtilizationCalculator::new(&park, &config).density_score();
        assert!((peak - 1.0).abs() < 1e-9);
        park.randomize(35, &mut rng);
        let full = UtilizationCalculator::new(&park, &config).density_score();
        assert!(full < peak);
    }

    #[test]
    fn test_breakdown_is_consistent() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Fountain, 1, 1);
        let config = MetricsConfig::default();
        let calc = UtilizationCalculator::new(&park, &config);
        let breakdown = calc.breakdown();
        assert_eq!(breakdown.overall, calc.utilization());
        assert!((breakdown.occupancy_rate - 1.0 / 9.0).abs() < 1e-12);
        assert!(breakdown.wasted_space < 1.0);
    }
}
