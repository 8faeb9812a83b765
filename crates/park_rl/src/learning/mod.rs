//! Reinforcement learning for park layout design.
//!
//! A park layout is the state, placing one element on one empty cell is an
//! action, and the reward is the weighted layout score from
//! [`metrics`](crate::metrics). The agent is tabular: each distinct type
//! layout gets its own row of action values.
//!
//! ## Example
//!
//! ```rust,ignore
//! use park_rl::{ParkDesignTrainer, SimulationConfig};
//!
//! let mut trainer = ParkDesignTrainer::with_seed(SimulationConfig::default(), 7)?;
//! let rewards = trainer.train(100, None)?;
//! let baseline = trainer.test_random_baseline(100);
//! println!("best {:.1} vs random {:.1}", trainer.agent().best_reward(), baseline.mean);
//! ```

pub mod actions;
pub mod agent;
pub mod replay;
pub mod state;
pub mod trainer;

pub use actions::{ActionSpace, PlacementAction};
pub use agent::{AgentStatistics, LoadOutcome, QLearningAgent, AVERAGE_WINDOW};
pub use replay::{Experience, ReplayBuffer, ReplayStats};
pub use state::{StateEncoder, StateId};
pub use trainer::{BaselineStats, Evaluation, ParkDesignTrainer};
