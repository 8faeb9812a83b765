//! Pedestrian simulation.
//!
//! Pedestrians read the park (elements, temperature, shade) but never change
//! it. They do not take part in training; renderers and the `simulate`
//! command use them to show how a layout is used.

pub mod agent;
pub mod manager;

pub use agent::{AgentId, AgentState, BenchRef, PedestrianAgent};
pub use manager::AgentManager;
