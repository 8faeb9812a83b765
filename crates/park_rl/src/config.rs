//! Configuration for the park simulation and the design trainer.
//!
//! Every section carries `#[serde(default)]`, so a TOML file only has to name
//! the values it changes:
//!
//! ```toml
//! [park]
//! grid_size = 5
//!
//! [learning]
//! epsilon = 0.5
//! ```

use crate::environment::ElementType;
use crate::error::{Error, Result};
use crate::metrics::RewardWeights;
use crate::types::Range;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One `f64` per element type, used for default sizes and influence radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementValues {
    pub bench: f64,
    pub tree: f64,
    pub fountain: f64,
    pub lamp: f64,
    pub grass: f64,
    pub pathway: f64,
}

impl ElementValues {
    /// Default element diameters in meters.
    pub const SIZES: Self = Self {
        bench: 2.0,
        tree: 3.0,
        fountain: 4.0,
        lamp: 1.0,
        grass: 5.0,
        pathway: 3.0,
    };

    /// Default radii within which an element counts as "using" space.
    pub const INFLUENCE: Self = Self {
        bench: 2.0,
        tree: 4.0,
        fountain: 5.0,
        lamp: 8.0,
        grass: 3.0,
        pathway: 2.5,
    };

    pub fn get(&self, element_type: ElementType) -> f64 {
        match element_type {
            ElementType::Bench => self.bench,
            ElementType::Tree => self.tree,
            ElementType::Fountain => self.fountain,
            ElementType::StreetLamp => self.lamp,
            ElementType::GrassPatch => self.grass,
            ElementType::Pathway => self.pathway,
        }
    }

    fn all_positive(&self) -> bool {
        ElementType::ALL.iter().all(|t| self.get(*t) > 0.0)
    }
}

impl Default for ElementValues {
    fn default() -> Self {
        Self::SIZES
    }
}

/// Park geometry and ambient temperature limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkConfig {
    /// World extent of the (square) park in meters.
    pub size: f64,
    /// Number of cells along each side of the grid.
    pub grid_size: usize,
    /// Initial ambient temperature in °C.
    pub temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Element diameters in meters.
    pub element_sizes: ElementValues,
    /// Samples per side of the cached thermal field.
    pub thermal_resolution: usize,
}

impl Default for ParkConfig {
    fn default() -> Self {
        Self {
            size: 30.0,
            grid_size: 3,
            temperature: 22.0,
            min_temperature: -10.0,
            max_temperature: 45.0,
            element_sizes: ElementValues::SIZES,
            thermal_resolution: 20,
        }
    }
}

impl ParkConfig {
    /// Returns a copy with a different grid size.
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn cell_size(&self) -> f64 {
        self.size / self.grid_size.max(1) as f64
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 {
            return Err(Error::InvalidGridSize(0));
        }
        if self.size <= 0.0 {
            return Err(Error::Config("park size must be positive".into()));
        }
        if self.min_temperature > self.max_temperature {
            return Err(Error::Config(
                "min_temperature must not exceed max_temperature".into(),
            ));
        }
        if !self.element_sizes.all_positive() {
            return Err(Error::Config("element sizes must be positive".into()));
        }
        if self.thermal_resolution == 0 {
            return Err(Error::Config("thermal_resolution must be positive".into()));
        }
        Ok(())
    }
}

/// Thermal model: comfort band, amenity cooling and the temperature regimes
/// that drive reward reweighting and the training curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalConfig {
    pub comfortable: Range,
    /// Degrees outside the comfortable band at which comfort reaches zero.
    pub comfort_falloff: f64,
    /// Cooling directly under a tree.
    pub tree_cooling: f64,
    /// Added to half a tree's size to get its shade radius.
    pub shade_margin: f64,
    /// Cooling at a fountain's center.
    pub fountain_cooling: f64,
    pub fountain_cooling_radius: f64,
    /// Excess beyond the comfort band at which weight multipliers saturate.
    pub saturation_span: f64,
    pub cold_range: Range,
    pub hot_range: Range,
    pub hot_shade_multiplier: f64,
    pub hot_thermal_multiplier: f64,
    pub hot_comfort_multiplier: f64,
    pub hot_light_multiplier: f64,
    pub cold_shade_multiplier: f64,
    pub cold_light_multiplier: f64,
    pub cold_thermal_multiplier: f64,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            comfortable: Range::new(18.0, 26.0),
            comfort_falloff: 15.0,
            tree_cooling: 5.0,
            shade_margin: 1.0,
            fountain_cooling: 3.0,
            fountain_cooling_radius: 8.0,
            saturation_span: 10.0,
            cold_range: Range::new(0.0, 15.0),
            hot_range: Range::new(30.0, 40.0),
            hot_shade_multiplier: 2.0,
            hot_thermal_multiplier: 2.0,
            hot_comfort_multiplier: 1.5,
            hot_light_multiplier: 0.5,
            cold_shade_multiplier: 0.5,
            cold_light_multiplier: 1.5,
            cold_thermal_multiplier: 1.8,
        }
    }
}

impl ThermalConfig {
    /// Saturated heat factor in `[0, 1]`: zero inside the band, one at
    /// `saturation_span` degrees above it.
    pub fn heat_factor(&self, temperature: f64) -> f64 {
        let excess = temperature - self.comfortable.max;
        if excess <= 0.0 {
            0.0
        } else {
            (excess / self.saturation_span).min(1.0)
        }
    }

    /// Saturated cold factor in `[0, 1]`, mirror of [`heat_factor`](Self::heat_factor).
    pub fn cold_factor(&self, temperature: f64) -> f64 {
        let deficit = self.comfortable.min - temperature;
        if deficit <= 0.0 {
            0.0
        } else {
            (deficit / self.saturation_span).min(1.0)
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("comfortable", self.comfortable),
            ("cold_range", self.cold_range),
            ("hot_range", self.hot_range),
        ] {
            if !range.is_ordered() {
                return Err(Error::Config(format!("{} range is inverted", name)));
            }
        }
        if self.comfort_falloff <= 0.0 || self.saturation_span <= 0.0 {
            return Err(Error::Config(
                "comfort_falloff and saturation_span must be positive".into(),
            ));
        }
        if self.fountain_cooling_radius <= 0.0 {
            return Err(Error::Config("fountain_cooling_radius must be positive".into()));
        }
        Ok(())
    }
}

/// Metric calculator parameters and the base reward weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub weights: RewardWeights,
    /// Fraction of grid capacity above which each extra element is penalised.
    pub capacity_threshold: f64,
    pub bench_base_comfort: f64,
    pub comfort_tree_radius: f64,
    pub comfort_fountain_radius: f64,
    pub comfort_lamp_radius: f64,
    /// Amenity radii are widened to at least this many cell sizes.
    pub comfort_min_radius_cells: f64,
    pub coverage_resolution: usize,
    pub shade_radius: f64,
    pub light_radius: f64,
    pub utilization_resolution: usize,
    pub occupancy_weight: f64,
    pub effective_weight: f64,
    pub influence_radii: ElementValues,
    pub optimal_occupancy: f64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            weights: RewardWeights::default(),
            capacity_threshold: 0.8,
            bench_base_comfort: 0.3,
            comfort_tree_radius: 5.0,
            comfort_fountain_radius: 8.0,
            comfort_lamp_radius: 4.0,
            comfort_min_radius_cells: 1.5,
            coverage_resolution: 50,
            shade_radius: 3.0,
            light_radius: 8.0,
            utilization_resolution: 50,
            occupancy_weight: 0.4,
            effective_weight: 0.6,
            influence_radii: ElementValues::INFLUENCE,
            optimal_occupancy: 0.65,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.capacity_threshold) {
            return Err(Error::Config("capacity_threshold must be in [0, 1]".into()));
        }
        if !(0.0..=1.0).contains(&self.optimal_occupancy) {
            return Err(Error::Config("optimal_occupancy must be in [0, 1]".into()));
        }
        if self.coverage_resolution == 0 || self.utilization_resolution == 0 {
            return Err(Error::Config("sampling resolutions must be positive".into()));
        }
        if !self.influence_radii.all_positive() {
            return Err(Error::Config("influence radii must be positive".into()));
        }
        Ok(())
    }
}

/// Pedestrian behaviour parameters. Distances in meters, durations in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PedestrianConfig {
    pub speed: Range,
    pub rest_duration: Range,
    pub sit_duration: Range,
    pub tolerance: Range,

    // Stuck detection and recovery
    pub stuck_threshold: f64,
    pub stuck_epsilon: f64,
    pub teleport_radii: Vec<f64>,
    pub teleport_directions: usize,

    // Placement and collision
    pub edge_margin: f64,
    pub spawn_margin: f64,
    pub spawn_attempts: usize,
    pub emergency_inset: f64,
    pub walk_clearance: f64,
    pub spawn_clearance: f64,
    pub agent_spacing: f64,
    pub wander_attempts: usize,
    pub wander_margin: f64,
    pub corner_inset: f64,

    // Movement
    pub arrival_radius: f64,
    pub bench_arrival_radius: f64,
    pub sitting_range: f64,
    pub seat_offset: f64,
    pub seat_height: f64,
    /// Heading offsets tried, in degrees, when the direct step is blocked.
    pub avoidance_angles: Vec<f64>,
    pub avoidance_speed_factor: f64,
    pub blocked_give_up: f64,

    // Thermal behaviour
    pub shade_threshold: f64,
    pub discomfort_dwell: f64,
    pub discomfort_threshold: f64,
    pub coolness_margin: f64,
    pub coolness_discomfort: f64,
    pub coolness_arrival_radius: f64,
    pub bench_seek_base: f64,
    pub bench_seek_discomfort: f64,

    // Resting
    pub rest_probability: f64,
    pub rest_probability_hot_shaded: f64,
    pub rest_probability_cold: f64,
    pub rest_near_element_bonus: f64,
    pub near_element_radius: f64,
    pub rest_scale_hot_shaded: f64,
    pub rest_scale_cold: f64,
    pub rest_scale_shade: f64,
    pub rest_scale_fountain: f64,
    pub stand_up_discomfort: f64,
    pub min_sit_time: f64,
    pub rest_end_discomfort: f64,
    pub min_rest_time: f64,
}

impl Default for PedestrianConfig {
    fn default() -> Self {
        Self {
            speed: Range::new(0.8, 1.8),
            rest_duration: Range::new(1.5, 4.0),
            sit_duration: Range::new(5.0, 15.0),
            tolerance: Range::new(0.8, 1.2),
            stuck_threshold: 3.0,
            stuck_epsilon: 0.01,
            teleport_radii: vec![2.0, 3.0, 5.0],
            teleport_directions: 8,
            edge_margin: 2.0,
            spawn_margin: 3.0,
            spawn_attempts: 50,
            emergency_inset: 1.0,
            walk_clearance: 0.4,
            spawn_clearance: 1.5,
            agent_spacing: 1.0,
            wander_attempts: 20,
            wander_margin: 2.0,
            corner_inset: 3.0,
            arrival_radius: 0.3,
            bench_arrival_radius: 1.5,
            sitting_range: 2.5,
            seat_offset: 0.5,
            seat_height: 0.45,
            avoidance_angles: vec![30.0, -30.0, 45.0, -45.0, 60.0, -60.0, 90.0, -90.0, 120.0, -120.0],
            avoidance_speed_factor: 0.7,
            blocked_give_up: 1.0,
            shade_threshold: 28.0,
            discomfort_dwell: 2.0,
            discomfort_threshold: 0.2,
            coolness_margin: 3.0,
            coolness_discomfort: 0.6,
            coolness_arrival_radius: 3.0,
            bench_seek_base: 0.3,
            bench_seek_discomfort: 0.3,
            rest_probability: 0.2,
            rest_probability_hot_shaded: 0.5,
            rest_probability_cold: 0.1,
            rest_near_element_bonus: 0.1,
            near_element_radius: 3.0,
            rest_scale_hot_shaded: 1.5,
            rest_scale_cold: 0.6,
            rest_scale_shade: 2.0,
            rest_scale_fountain: 3.0,
            stand_up_discomfort: 0.8,
            min_sit_time: 3.0,
            rest_end_discomfort: 0.7,
            min_rest_time: 1.0,
        }
    }
}

impl PedestrianConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("speed", self.speed),
            ("rest_duration", self.rest_duration),
            ("sit_duration", self.sit_duration),
            ("tolerance", self.tolerance),
        ] {
            if !range.is_ordered() || range.min < 0.0 {
                return Err(Error::Config(format!("{} range is invalid", name)));
            }
        }
        if self.speed.max <= 0.0 {
            return Err(Error::Config("pedestrian speed must be positive".into()));
        }
        if self.tolerance.min <= 0.0 {
            return Err(Error::Config("thermal tolerance must be positive".into()));
        }
        for p in [
            self.bench_seek_base,
            self.rest_probability,
            self.rest_probability_hot_shaded,
            self.rest_probability_cold,
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::Config(format!("probability {} outside [0, 1]", p)));
            }
        }
        if self.stuck_threshold <= 0.0 || self.blocked_give_up <= 0.0 {
            return Err(Error::Config("stuck timers must be positive".into()));
        }
        Ok(())
    }
}

/// Q-learning hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Learning rate (alpha).
    pub learning_rate: f64,
    /// Discount factor (gamma).
    pub discount_factor: f64,
    /// Initial exploration rate.
    pub epsilon: f64,
    /// Floor of the exploration rate.
    pub min_epsilon: f64,
    /// Multiplicative decay applied after each episode.
    pub epsilon_decay: f64,
    pub replay_capacity: usize,
    pub batch_size: usize,
    /// Replay passes are skipped until the buffer holds this many transitions.
    pub min_replay_size: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.95,
            epsilon: 0.3,
            min_epsilon: 0.01,
            epsilon_decay: 0.995,
            replay_capacity: 10_000,
            batch_size: 32,
            min_replay_size: 32,
        }
    }
}

impl LearningConfig {
    /// Configuration that never explores, for evaluating a trained table.
    pub fn greedy() -> Self {
        Self {
            epsilon: 0.0,
            min_epsilon: 0.0,
            ..Default::default()
        }
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_discount_factor(mut self, discount_factor: f64) -> Self {
        self.discount_factor = discount_factor;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("learning_rate", self.learning_rate),
            ("discount_factor", self.discount_factor),
            ("epsilon", self.epsilon),
            ("min_epsilon", self.min_epsilon),
            ("epsilon_decay", self.epsilon_decay),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{} must be in [0, 1], got {}", name, value)));
            }
        }
        if self.min_epsilon > self.epsilon {
            return Err(Error::Config("min_epsilon must not exceed epsilon".into()));
        }
        if self.replay_capacity == 0 || self.batch_size == 0 {
            return Err(Error::Config(
                "replay_capacity and batch_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Episode loop, checkpointing and evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub max_steps: usize,
    pub episodes: usize,
    /// Resample the ambient temperature at the start of every episode.
    pub randomize_temperature: bool,
    pub checkpoint_interval: usize,
    pub max_checkpoints: usize,
    pub log_interval: usize,
    pub baseline_trials: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            episodes: 100,
            randomize_temperature: true,
            checkpoint_interval: 10,
            max_checkpoints: 5,
            log_interval: 10,
            baseline_trials: 100,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::Config("max_steps must be positive".into()));
        }
        Ok(())
    }
}

/// Top-level configuration, one section per subsystem.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub park: ParkConfig,
    pub thermal: ThermalConfig,
    pub metrics: MetricsConfig,
    pub pedestrian: PedestrianConfig,
    pub learning: LearningConfig,
    pub trainer: TrainerConfig,
}

impl SimulationConfig {
    /// Small, fast settings for tests and benchmarks.
    pub fn quick() -> Self {
        let mut config = Self::default();
        config.metrics.coverage_resolution = 20;
        config.metrics.utilization_resolution = 20;
        config.park.thermal_resolution = 10;
        config.trainer.episodes = 10;
        config.trainer.baseline_trials = 10;
        config
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<()> {
        self.park.validate()?;
        self.thermal.validate()?;
        self.metrics.validate()?;
        self.pedestrian.validate()?;
        self.learning.validate()?;
        self.trainer.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.park.grid_size, 3);
        assert_eq!(config.park.cell_size(), 10.0);
        assert_eq!(config.learning.learning_rate, 0.1);
        assert_eq!(config.trainer.max_steps, 50);
    }

    #[test]
    fn test_quick_config_is_valid() {
        assert!(SimulationConfig::quick().validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SimulationConfig::default();
        let toml = config.to_toml().unwrap();
        let parsed = SimulationConfig::from_toml(&toml).unwrap();
        assert_eq!(parsed.park.grid_size, config.park.grid_size);
        assert_eq!(parsed.pedestrian.teleport_radii, config.pedestrian.teleport_radii);
        assert_eq!(parsed.metrics.weights, config.metrics.weights);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = SimulationConfig::from_toml(
            "[park]\ngrid_size = 5\n\n[learning]\nepsilon = 0.5\n",
        )
        .unwrap();
        assert_eq!(parsed.park.grid_size, 5);
        assert_eq!(parsed.park.size, 30.0);
        assert_eq!(parsed.learning.epsilon, 0.5);
        assert_eq!(parsed.learning.discount_factor, 0.95);
    }

    #[test]
    fn test_validate_rejects_zero_grid() {
        let config = SimulationConfig {
            park: ParkConfig::default().with_grid_size(0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidGridSize(0))));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = SimulationConfig::default();
        config.thermal.comfortable = Range::new(26.0, 18.0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_probability() {
        let mut config = SimulationConfig::default();
        config.learning.epsilon = 1.5;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.pedestrian.rest_probability = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_heat_and_cold_factors() {
        let thermal = ThermalConfig::default();
        assert_eq!(thermal.heat_factor(22.0), 0.0);
        assert_eq!(thermal.cold_factor(22.0), 0.0);
        assert!((thermal.heat_factor(31.0) - 0.5).abs() < 1e-12);
        assert_eq!(thermal.heat_factor(45.0), 1.0);
        assert!((thermal.cold_factor(13.0) - 0.5).abs() < 1e-12);
        assert_eq!(thermal.cold_factor(-10.0), 1.0);
    }

    #[test]
    fn test_element_values_lookup() {
        assert_eq!(ElementValues::SIZES.get(ElementType::Tree), 3.0);
        assert_eq!(ElementValues::INFLUENCE.get(ElementType::StreetLamp), 8.0);
        assert_eq!(ElementValues::INFLUENCE.get(ElementType::Pathway), 2.5);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("park.toml");
        std::fs::write(&path, "[park]\nsize = 50.0\n").unwrap();
        let config = SimulationConfig::load(&path).unwrap();
        assert_eq!(config.park.size, 50.0);

        std::fs::write(&path, "[park]\ngrid_size = 0\n").unwrap();
        assert!(SimulationConfig::load(&path).is_err());
    }
}
