//! Composite reward: metric snapshot, temperature-dependent weights and the
//! over-capacity penalty.

use super::comfort::ComfortCalculator;
use super::coverage::CoverageCalculator;
use super::distribution::DistributionCalculator;
use super::thermal::thermal_comfort_score;
use super::utilization::{UtilizationBreakdown, UtilizationCalculator};
use crate::config::{MetricsConfig, ThermalConfig};
use crate::environment::Park;
use crate::types::lerp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-metric reward weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardWeights {
    pub comfort: f64,
    pub utilization: f64,
    pub shade_coverage: f64,
    pub light_coverage: f64,
    pub distribution: f64,
    pub thermal_comfort: f64,
    /// Added once per element beyond the capacity threshold (negative).
    pub element_penalty: f64,
}

impl Default for RewardWeights {
    fn default() -> Self {
        Self {
            comfort: 50.0,
            utilization: 30.0,
            shade_coverage: 20.0,
            light_coverage: 30.0,
            distribution: 20.0,
            thermal_comfort: 25.0,
            element_penalty: -5.0,
        }
    }
}

/// Adjusts `base` for the ambient temperature.
///
/// Inside the comfortable band the base weights are returned unchanged. Above
/// it, shade, thermal comfort and bench comfort gain weight while light loses
/// it; below it, shade loses weight while light and thermal comfort gain. Each
/// multiplier moves linearly from 1 to its configured value as the excess
/// grows to `saturation_span` degrees.
pub fn compute_weights(base: &RewardWeights, temperature: f64, thermal: &ThermalConfig) -> RewardWeights {
    let mut weights = *base;

    let heat = thermal.heat_factor(temperature);
    if heat > 0.0 {
        weights.shade_coverage *= lerp(1.0, thermal.hot_shade_multiplier, heat);
        weights.thermal_comfort *= lerp(1.0, thermal.hot_thermal_multiplier, heat);
        weights.comfort *= lerp(1.0, thermal.hot_comfort_multiplier, heat);
        weights.light_coverage *= lerp(1.0, thermal.hot_light_multiplier, heat);
    }

    let cold = thermal.cold_factor(temperature);
    if cold > 0.0 {
        weights.shade_coverage *= lerp(1.0, thermal.cold_shade_multiplier, cold);
        weights.light_coverage *= lerp(1.0, thermal.cold_light_multiplier, cold);
        weights.thermal_comfort *= lerp(1.0, thermal.cold_thermal_multiplier, cold);
    }

    weights
}

/// The six scores that make up the reward, plus context for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParkMetrics {
    pub comfort: f64,
    pub utilization: f64,
    pub shade_coverage: f64,
    pub light_coverage: f64,
    pub distribution: f64,
    pub thermal_comfort: f64,
    pub occupancy_rate: f64,
    pub element_count: usize,
    pub temperature: f64,
}

impl ParkMetrics {
    pub fn compute(park: &Park, config: &MetricsConfig) -> Self {
        let coverage = CoverageCalculator::new(park, config);
        Self {
            comfort: ComfortCalculator::new(park, config).total_comfort(),
            utilization: UtilizationCalculator::new(park, config).utilization(),
            shade_coverage: coverage.shade_coverage(),
            light_coverage: coverage.light_coverage(),
            distribution: DistributionCalculator::new(park, config).distribution_score(),
            thermal_comfort: thermal_comfort_score(park),
            occupancy_rate: park.occupancy_rate(),
            element_count: park.len(),
            temperature: park.temperature(),
        }
    }

    /// Named scalars for renderers and reports.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        [
            ("comfort", self.comfort),
            ("utilization", self.utilization),
            ("shade_coverage", self.shade_coverage),
            ("light_coverage", self.light_coverage),
            ("distribution", self.distribution),
            ("thermal_comfort", self.thermal_comfort),
            ("occupancy_rate", self.occupancy_rate),
            ("element_count", self.element_count as f64),
            ("temperature", self.temperature),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Secondary metrics that do not feed the reward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtendedMetrics {
    pub coverage_overlap: f64,
    pub uncovered_ratio: f64,
    pub balanced_coverage: f64,
    pub diversity: f64,
    pub balance: f64,
    pub utilization: UtilizationBreakdown,
    pub connectivity: f64,
    pub clusters: usize,
    pub min_effective_temperature: f64,
    pub max_effective_temperature: f64,
}

impl ExtendedMetrics {
    pub fn compute(park: &Park, config: &MetricsConfig) -> Self {
        let coverage = CoverageCalculator::new(park, config);
        let distribution = DistributionCalculator::new(park, config);
        let stats = park.grid_stats();
        let zones = park.thermal_zones();
        Self {
            coverage_overlap: coverage.overlap(),
            uncovered_ratio: coverage.uncovered_ratio(),
            balanced_coverage: coverage.balanced_coverage(),
            diversity: distribution.diversity(),
            balance: distribution.balance(),
            utilization: UtilizationCalculator::new(park, config).breakdown(),
            connectivity: stats.connectivity,
            clusters: stats.clusters,
            min_effective_temperature: zones.min_effective_temperature(),
            max_effective_temperature: zones.max_effective_temperature(),
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        [
            ("coverage_overlap", self.coverage_overlap),
            ("uncovered_ratio", self.uncovered_ratio),
            ("balanced_coverage", self.balanced_coverage),
            ("diversity", self.diversity),
            ("balance", self.balance),
            ("effective_space", self.utilization.effective_space),
            ("density_score", self.utilization.density_score),
            ("wasted_space", self.utilization.wasted_space),
            ("connectivity", self.connectivity),
            ("clusters", self.clusters as f64),
            ("min_effective_temperature", self.min_effective_temperature),
            ("max_effective_temperature", self.max_effective_temperature),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// Every metric of a park as one named-scalar map.
pub fn metrics_map(park: &Park, config: &MetricsConfig) -> BTreeMap<String, f64> {
    let mut map = ParkMetrics::compute(park, config).to_map();
    map.extend(ExtendedMetrics::compute(park, config).to_map());
    map
}

/// A reward together with the parts it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub metrics: ParkMetrics,
    pub weights: RewardWeights,
    pub penalty: f64,
    pub total: f64,
}

/// Scores a park layout.
///
/// The reward is recomputed from the full park state on every call, using the
/// weights the park derived for its current temperature.
#[derive(Debug, Clone)]
pub struct RewardCalculator {
    config: MetricsConfig,
}

impl RewardCalculator {
    pub fn new(config: MetricsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub fn calculate(&self, park: &Park) -> f64 {
        self.breakdown(park).total
    }

    pub fn breakdown(&self, park: &Park) -> RewardBreakdown {
        let metrics = ParkMetrics::compute(park, &self.config);
        let weights = *park.reward_weights();

        let weighted = metrics.comfort * weights.comfort
            + metrics.utilization * weights.utilization
            + metrics.shade_coverage * weights.shade_coverage
            + metrics.light_coverage * weights.light_coverage
            + metrics.distribution * weights.distribution
            + metrics.thermal_comfort * weights.thermal_comfort;

        let threshold = park.capacity() as f64 * self.config.capacity_threshold;
        let excess = park.len() as f64 - threshold;
        let penalty = if excess > 0.0 {
            excess * weights.element_penalty
        } else {
            0.0
        };

        RewardBreakdown {
            metrics,
            weights,
            penalty,
            total: weighted + penalty,
        }
    }
}

impl Default for RewardCalculator {
    fn default() -> Self {
        Self::new(MetricsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ElementType;

    #[test]
    fn test_weights_unchanged_in_band() {
        let base = RewardWeights::default();
        let thermal = ThermalConfig::default();
        for t in [18.0, 22.0, 26.0] {
            assert_eq!(compute_weights(&base, t, &thermal), base);
        }
    }

    #[test]
    fn test_hot_weights() {
        let base = RewardWeights::default();
        let thermal = ThermalConfig::default();

        let half = compute_weights(&base, 31.0, &thermal);
        assert!((half.shade_coverage - 30.0).abs() < 1e-9);
        assert!((half.light_coverage - 22.5).abs() < 1e-9);

        let full = compute_weights(&base, 45.0, &thermal);
        assert!((full.shade_coverage - 40.0).abs() < 1e-9);
        assert!((full.thermal_comfort - 50.0).abs() < 1e-9);
        assert!((full.comfort - 75.0).abs() < 1e-9);
        assert!((full.light_coverage - 15.0).abs() < 1e-9);
        assert_eq!(full.utilization, base.utilization);
    }

    #[test]
    fn test_cold_weights() {
        let base = RewardWeights::default();
        let thermal = ThermalConfig::default();
        let cold = compute_weights(&base, 0.0, &thermal);
        assert!((cold.shade_coverage - 10.0).abs() < 1e-9);
        assert!((cold.light_coverage - 45.0).abs() < 1e-9);
        assert!((cold.thermal_comfort - 45.0).abs() < 1e-9);
        assert_eq!(cold.comfort, base.comfort);
    }

    #[test]
    fn test_empty_park_reward_is_thermal_only() {
        let park = Park::new(30.0, 3).unwrap();
        let breakdown = RewardCalculator::default().breakdown(&park);
        assert_eq!(breakdown.penalty, 0.0);
        assert!((breakdown.total - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_over_capacity_penalty() {
        let mut park = Park::new(30.0, 3).unwrap();
        for x in 0..3 {
            for y in 0..3 {
                park.add_element(ElementType::Bench, x, y);
            }
        }
        let breakdown = RewardCalculator::default().breakdown(&park);
        // 9 elements against a threshold of 7.2.
        assert!((breakdown.penalty - (-9.0)).abs() < 1e-9);
        assert!(breakdown.total.is_finite());
    }

    #[test]
    fn test_metrics_map_names() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Tree, 1, 1);
        let map = metrics_map(&park, &MetricsConfig::default());
        for key in ["comfort", "shade_coverage", "thermal_comfort", "wasted_space", "clusters"] {
            assert!(map.contains_key(key), "missing {}", key);
        }
        assert_eq!(map["element_count"], 1.0);
    }
}
