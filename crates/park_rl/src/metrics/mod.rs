//! Layout quality metrics and the composite reward built from them.
//!
//! All calculators are read-only views over a [`Park`](crate::environment::Park)
//! and return scores in `[0, 1]` unless stated otherwise.

pub mod comfort;
pub mod coverage;
pub mod distribution;
pub mod reward;
pub mod thermal;
pub mod utilization;

pub use comfort::ComfortCalculator;
pub use coverage::CoverageCalculator;
pub use distribution::DistributionCalculator;
pub use reward::{
    compute_weights, metrics_map, ExtendedMetrics, ParkMetrics, RewardBreakdown, RewardCalculator,
    RewardWeights,
};
pub use thermal::thermal_comfort_score;
pub use utilization::{UtilizationBreakdown, UtilizationCalculator};
