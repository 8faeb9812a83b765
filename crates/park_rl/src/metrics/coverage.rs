//! Shade and light coverage over a sampled raster of the park.

use crate::config::MetricsConfig;
use crate::environment::{ElementType, Park};

/// Target shade fraction for the balanced coverage score.
const OPTIMAL_SHADE: f64 = 0.5;
/// Light fraction at which the balanced coverage light term saturates.
const MIN_LIGHT: f64 = 0.6;

/// Computes what fraction of the park lies under tree canopies or lamp light.
pub struct CoverageCalculator<'a> {
    park: &'a Park,
    config: &'a MetricsConfig,
}

impl<'a> CoverageCalculator<'a> {
    pub fn new(park: &'a Park, config: &'a MetricsConfig) -> Self {
        Self { park, config }
    }

    pub fn shade_coverage(&self) -> f64 {
        fraction(&self.coverage_grid(ElementType::Tree))
    }

    pub fn light_coverage(&self) -> f64 {
        fraction(&self.coverage_grid(ElementType::StreetLamp))
    }

    /// Fraction of samples lit and shaded at once.
    pub fn overlap(&self) -> f64 {
        let shade = self.coverage_grid(ElementType::Tree);
        let light = self.coverage_grid(ElementType::StreetLamp);
        let both = shade.iter().zip(&light).filter(|(s, l)| **s && **l).count();
        both as f64 / shade.len() as f64
    }

    /// Fraction of samples with neither shade nor light.
    pub fn uncovered_ratio(&self) -> f64 {
        let shade = self.coverage_grid(ElementType::Tree);
        let light = self.coverage_grid(ElementType::StreetLamp);
        let neither = shade.iter().zip(&light).filter(|(s, l)| !**s && !**l).count();
        neither as f64 / shade.len() as f64
    }

    /// Rewards shade close to half the park and light above a minimum.
    pub fn balanced_coverage(&self) -> f64 {
        let shade = self.shade_coverage();
        let light = self.light_coverage();
        let shade_score = (1.0 - (shade - OPTIMAL_SHADE).abs() / OPTIMAL_SHADE).max(0.0);
        let light_score = (light / MIN_LIGHT).min(1.0);
        shade_score * 0.4 + light_score * 0.6
    }

    /// Coverage intensity: each element contributes linearly decaying
    /// intensity within its radius, summed and capped at one.
    pub fn intensity_map(&self, element_type: ElementType) -> Vec<f64> {
        let Some(radius) = self.radius(element_type) else {
            return vec![0.0; self.samples()];
        };
        let elements: Vec<_> = self.park.elements_by_type(element_type).collect();
        self.sample_points()
            .map(|(x, y)| {
                elements
                    .iter()
                    .map(|e| {
                        let d = ((x - e.position.x).powi(2) + (y - e.position.y).powi(2)).sqrt();
                        if d <= radius {
                            1.0 - d / radius
                        } else {
                            0.0
                        }
                    })
                    .sum::<f64>()
                    .min(1.0)
            })
            .collect()
    }

    /// Row-major mask of samples within reach of at least one element of
    /// the type. Only trees and lamps cover anything.
    pub fn coverage_grid(&self, element_type: ElementType) -> Vec<bool> {
        let Some(radius) = self.radius(element_type) else {
            return vec![false; self.samples()];
        };
        let elements: Vec<_> = self.park.elements_by_type(element_type).collect();
        self.sample_points()
            .map(|(x, y)| {
                elements.iter().any(|e| {
                    let dx = x - e.position.x;
                    let dy = y - e.position.y;
                    (dx * dx + dy * dy).sqrt() <= radius
                })
            })
            .collect()
    }

    fn radius(&self, element_type: ElementType) -> Option<f64> {
        match element_type {
            ElementType::Tree => Some(self.config.shade_radius),
            ElementType::StreetLamp => Some(self.config.light_radius),
            _ => None,
        }
    }

    fn samples(&self) -> usize {
        self.config.coverage_resolution * self.config.coverage_resolution
    }

    fn sample_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let resolution = self.config.coverage_resolution;
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

fn fraction(mask: &[bool]) -> f64 {
    if mask.is_empty() {
        return 0.0;
    }
    mask.iter().filter(|c| **c).count() as f64 / mask.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_park_has_no_coverage() {
        let park = Park::new(30.0, 3).unwrap();
        let config = MetricsConfig::default();
        let calc = CoverageCalculator::new(&park, &config);
        assert_eq!(calc.shade_coverage(), 0.0);
        assert_eq!(calc.light_coverage(), 0.0);
        assert_eq!(calc.uncovered_ratio(), 1.0);
        assert_eq!(calc.overlap(), 0.0);
    }

    #[test]
    fn test_lamp_covers_more_than_tree() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Tree, 0, 0);
        park.add_element(ElementType::StreetLamp, 2, 2);
        let config = MetricsConfig::default();
        let calc = CoverageCalculator::new(&park, &config);
        let shade = calc.shade_coverage();
        let light = calc.light_coverage();
        assert!(shade > 0.0 && shade < 0.1);
        assert!(light > shade);
        assert!(light < 1.0);
    }

    #[test]
    fn test_overlap_when_colocated() {
        let mut park = Park::new(30.0, 5).unwrap();
        park.add_element(ElementType::Tree, 2, 2);
        park.add_element(ElementType::StreetLamp, 2, 3);
        let config = MetricsConfig::default();
        let calc = CoverageCalculator::new(&park, &config);
        assert!(calc.overlap() > 0.0);
        let total = calc.uncovered_ratio() + calc.light_coverage() + calc.shade_coverage()
            - calc.overlap();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_intensity_is_capped() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::StreetLamp, 1, 1);
        park.add_element(ElementType::StreetLamp, 1, 2);
        let config = MetricsConfig::default();
        let map = CoverageCalculator::new(&park, &config).intensity_map(ElementType::StreetLamp);
        assert_eq!(map.len(), 2500);
        assert!(map.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(map.iter().any(|v| *v > 0.9));
    }

    #[test]
    fn test_balanced_coverage_range() {
        let mut park = Park::new(30.0, 3).unwrap();
        let config = MetricsConfig::default();
        assert_eq!(CoverageCalculator::new(&park, &config).balanced_coverage(), 0.0);
        park.add_element(ElementType::StreetLamp, 1, 1);
        let score = CoverageCalculator::new(&park, &config).balanced_coverage();
        assert!(score > 0.0 && score <= 1.0);
    }
}
