#![doc = include_str!("../README.md")]
//! # park_rl - Park Layout Design with Reinforcement Learning
//!
//! Furnishes a square urban park with benches, trees, fountains and street
//! lamps, scores the layout for comfort and coverage at a given ambient
//! temperature, and learns good layouts with tabular Q-learning.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ParkDesignTrainer                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────┐   place    ┌──────────────┐                │
//! │  │ QLearning    │──────────►│    Park      │                │
//! │  │ Agent        │            │              │                │
//! │  │ • Q-table    │            │ • N×N grid   │                │
//! │  │ • replay     │            │ • elements   │                │
//! │  │ • ε-greedy   │            │ • thermal    │                │
//! │  └──────▲───────┘            └──────┬───────┘                │
//! │         │ reward                    │                        │
//! │  ┌──────┴──────────────────────────▼───────┐                │
//! │  │            RewardCalculator              │                │
//! │  │ comfort · utilization · coverage ·       │                │
//! │  │ distribution · thermal comfort           │                │
//! │  │ (weights follow the temperature)         │                │
//! │  └──────────────────────────────────────────┘                │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//!
//!   AgentManager ── pedestrians walk, rest, sit and seek shade in the
//!                   same Park; they read it but never change it.
//! ```
//!
//! ## Quick Start
//!
//! ### Training
//!
//! ```rust,ignore
//! use park_rl::{ParkDesignTrainer, SimulationConfig};
//!
//! let mut trainer = ParkDesignTrainer::with_seed(SimulationConfig::default(), 42)?;
//! trainer.train(100, None)?;
//!
//! let baseline = trainer.test_random_baseline(100);
//! println!("best {:.1}, random {:.1} ± {:.1}",
//!     trainer.agent().best_reward(), baseline.mean, baseline.std_dev);
//!
//! trainer.apply_best_design()?;
//! ```
//!
//! ### Pedestrians
//!
//! ```rust,ignore
//! use park_rl::{AgentManager, ElementType, Park, PedestrianConfig};
//!
//! let mut park = Park::new(30.0, 3)?;
//! park.add_element(ElementType::Tree, 0, 0);
//! park.add_element(ElementType::Bench, 1, 1);
//! park.set_temperature(34.0);
//!
//! let mut people = AgentManager::new(PedestrianConfig::default());
//! people.set_agent_count(&park, 20);
//! for _ in 0..600 {
//!     people.update(&park, 0.1);
//! }
//! println!("{:?}", people.state_counts());
//! ```

pub mod config;
pub mod environment;
pub mod error;
pub mod learning;
pub mod metrics;
pub mod pedestrian;
pub mod persistence;
pub mod types;

pub use config::{
    LearningConfig, MetricsConfig, ParkConfig, PedestrianConfig, SimulationConfig, ThermalConfig,
    TrainerConfig,
};
pub use environment::{
    ElementId, ElementSnapshot, ElementType, GridStats, Park, ParkElement, ParkSnapshot,
    ThermalZones,
};
pub use error::{Error, Result};
pub use learning::{
    ActionSpace, AgentStatistics, BaselineStats, Evaluation, Experience, LoadOutcome,
    ParkDesignTrainer, PlacementAction, QLearningAgent, ReplayBuffer, ReplayStats, StateEncoder,
    StateId,
};
pub use metrics::{
    compute_weights, metrics_map, ExtendedMetrics, ParkMetrics, RewardBreakdown,
    RewardCalculator, RewardWeights,
};
pub use pedestrian::{AgentId, AgentManager, AgentState, PedestrianAgent};
pub use persistence::{
    CheckpointManager, ModelBundle, ModelHyperparameters, Persist, PersistenceOptions,
    TrainingReport,
};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Creates a trainer for a default 30 m park with the given grid size.
///
/// # Examples
///
/// ```
/// use park_rl::create_trainer;
///
/// let trainer = create_trainer(3).unwrap();
/// assert_eq!(trainer.agent().action_space().size(), 36);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidGridSize`] for a grid size of zero.
pub fn create_trainer(grid_size: usize) -> Result<ParkDesignTrainer> {
    let mut config = SimulationConfig::default();
    config.park.grid_size = grid_size;
    ParkDesignTrainer::new(config)
}
