//! Tabular Q-learning over park layouts.

use super::actions::{ActionSpace, PlacementAction};
use super::replay::{Experience, ReplayBuffer, ReplayStats};
use super::state::{StateEncoder, StateId};
use crate::config::LearningConfig;
use crate::environment::{Park, ParkSnapshot};
use crate::error::Result;
use crate::persistence::{ModelBundle, ModelHyperparameters, Persist};
use crate::types::{mean, Timestamp};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Number of recent episodes averaged in [`AgentStatistics::average_reward`].
pub const AVERAGE_WINDOW: usize = 100;

/// Summary of an agent's training progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatistics {
    pub total_episodes: u64,
    pub training_steps: u64,
    pub epsilon: f64,
    /// `None` until an episode has finished.
    pub best_reward: Option<f64>,
    /// Mean of the last [`AVERAGE_WINDOW`] episode rewards.
    pub average_reward: f64,
    pub q_table_size: usize,
    pub replay_buffer_size: usize,
}

/// Result of [`QLearningAgent::load_bundle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The model matched the current action space and was restored.
    Loaded,
    /// The model was built for a different action space. The agent was
    /// hard-reset instead.
    Reset { expected: usize, found: usize },
}

/// An epsilon-greedy tabular Q-learning agent.
///
/// Q-table rows are created lazily the first time a state is learned on; a
/// state that was never updated reads as all zeros. Rows always have exactly
/// [`ActionSpace::size`] entries.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    config: LearningConfig,
    encoder: StateEncoder,
    action_space: ActionSpace,
    q_table: HashMap<StateId, Vec<f64>>,
    replay: ReplayBuffer,
    epsilon: f64,
    episode_rewards: Vec<f64>,
    best_reward: f64,
    best_design: Option<ParkSnapshot>,
    training_step: u64,
}

impl QLearningAgent {
    pub fn new(grid_size: usize, config: LearningConfig) -> Self {
        Self {
            encoder: StateEncoder::new(grid_size),
            action_space: ActionSpace::new(grid_size),
            q_table: HashMap::new(),
            replay: ReplayBuffer::new(config.replay_capacity),
            epsilon: config.epsilon,
            episode_rewards: Vec::new(),
            best_reward: f64::NEG_INFINITY,
            best_design: None,
            training_step: 0,
            config,
        }
    }

    pub fn config(&self) -> &LearningConfig {
        &self.config
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn grid_size(&self) -> usize {
        self.action_space.grid_size()
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Overrides the exploration rate, clamped to `[min_epsilon, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon.min(1.0).max(self.config.min_epsilon);
    }

    pub fn episode_rewards(&self) -> &[f64] {
        &self.episode_rewards
    }

    /// Best episode reward so far, `-inf` before the first episode.
    pub fn best_reward(&self) -> f64 {
        self.best_reward
    }

    pub fn best_design(&self) -> Option<&ParkSnapshot> {
        self.best_design.as_ref()
    }

    pub fn training_step(&self) -> u64 {
        self.training_step
    }

    pub fn episode_count(&self) -> u64 {
        self.episode_rewards.len() as u64
    }

    pub fn q_table_size(&self) -> usize {
        self.q_table.len()
    }

    pub fn replay_buffer(&self) -> &ReplayBuffer {
        &self.replay
    }

    pub fn replay_stats(&self) -> ReplayStats {
        self.replay.stats()
    }

    pub fn encode_state(&self, park: &Park) -> StateId {
        self.encoder.encode(park)
    }

    /// The stored row for `state`, if it was ever updated.
    pub fn q_values(&self, state: &StateId) -> Option<&[f64]> {
        self.q_table.get(state).map(|row| row.as_slice())
    }

    pub fn q_value(&self, state: &StateId, action: usize) -> f64 {
        self.q_table
            .get(state)
            .and_then(|row| row.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Largest Q-value of `state` over the whole action space.
    pub fn max_q_value(&self, state: &StateId) -> f64 {
        match self.q_table.get(state) {
            Some(row) => row.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            None => 0.0,
        }
    }

    /// The valid action with the highest Q-value. Ties go to the lowest
    /// action index.
    pub fn best_action(&self, state: &StateId, valid_actions: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for &action in valid_actions {
            let value = self.q_value(state, action);
            if best.is_none_or(|(_, b)| value > b) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Picks an action for the current park. Explores with probability
    /// epsilon when `training`, otherwise acts greedily. Returns `None` when
    /// no cell is free.
    pub fn choose_action<R: Rng + ?Sized>(
        &self,
        park: &Park,
        training: bool,
        rng: &mut R,
    ) -> Option<usize> {
        let valid = self.action_space.valid_actions(park);
        if valid.is_empty() {
            return None;
        }
        if training && rng.random::<f64>() < self.epsilon {
            return valid.choose(rng).copied();
        }
        let state = self.encode_state(park);
        self.best_action(&state, &valid)
    }

    /// Like [`choose_action`](Self::choose_action) but decoded.
    pub fn choose_placement<R: Rng + ?Sized>(
        &self,
        park: &Park,
        training: bool,
        rng: &mut R,
    ) -> Option<PlacementAction> {
        self.choose_action(park, training, rng)
            .and_then(|index| self.action_space.index_to_action(index))
    }

    /// One Q-learning update:
    /// `Q(s,a) += α · (target − Q(s,a))`, with `target = r` for terminal
    /// transitions and `r + γ · max Q(s')` otherwise.
    pub fn learn(&mut self, state: &StateId, action: usize, reward: f64, next_state: &StateId, done: bool) {
        let size = self.action_space.size();
        if action >= size {
            log::warn!("Ignoring update for action {} outside space of {}", action, size);
            return;
        }

        let target = if done {
            reward
        } else {
            reward + self.config.discount_factor * self.max_q_value(next_state)
        };

        let row = self
            .q_table
            .entry(state.clone())
            .or_insert_with(|| vec![0.0; size]);
        row[action] += self.config.learning_rate * (target - row[action]);
        self.training_step += 1;
    }

    pub fn learn_from(&mut self, experience: &Experience) {
        self.learn(
            &experience.state,
            experience.action,
            experience.reward,
            &experience.next_state,
            experience.done,
        );
    }

    pub fn remember(&mut self, experience: Experience) {
        self.replay.add(experience);
    }

    /// Re-learns a random batch from the replay buffer. Does nothing until
    /// the buffer holds `min_replay_size` transitions. Returns the number of
    /// transitions replayed.
    pub fn replay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        if self.replay.len() < self.config.min_replay_size.max(1) {
            return 0;
        }
        let batch = self.replay.sample(self.config.batch_size, rng);
        for experience in &batch {
            self.learn_from(experience);
        }
        batch.len()
    }

    pub fn decay_epsilon(&mut self) {
        self.epsilon = (self.epsilon * self.config.epsilon_decay).max(self.config.min_epsilon);
    }

    /// Records a finished episode: stores its reward, keeps `park` as the
    /// best design if the reward beats every earlier one, and decays
    /// epsilon. Returns `true` on a new best.
    pub fn end_episode(&mut self, total_reward: f64, park: &Park) -> bool {
        self.episode_rewards.push(total_reward);
        let improved = total_reward > self.best_reward;
        if improved {
            self.best_reward = total_reward;
            self.best_design = Some(park.to_snapshot());
        }
        self.decay_epsilon();
        improved
    }

    /// Mean reward of the last `window` episodes, 0 with no history.
    pub fn average_reward(&self, window: usize) -> f64 {
        let start = self.episode_rewards.len().saturating_sub(window);
        mean(&self.episode_rewards[start..])
    }

    pub fn statistics(&self) -> AgentStatistics {
        AgentStatistics {
            total_episodes: self.episode_count(),
            training_steps: self.training_step,
            epsilon: self.epsilon,
            best_reward: self.best_reward.is_finite().then_some(self.best_reward),
            average_reward: self.average_reward(AVERAGE_WINDOW),
            q_table_size: self.q_table.len(),
            replay_buffer_size: self.replay.len(),
        }
    }

    /// Discards everything learned and rebuilds the action space for
    /// `grid_size`. Q-table, replay buffer, reward history and best design
    /// are dropped; epsilon returns to its configured start.
    pub fn reset(&mut self, grid_size: usize) {
        log::info!(
            "Resetting Q-learning agent for a {}x{} grid ({} states discarded)",
            grid_size,
            grid_size,
            self.q_table.len()
        );
        *self = Self::new(grid_size, self.config.clone());
    }

    /// Snapshot of the learned model.
    pub fn to_bundle(&self) -> ModelBundle {
        ModelBundle {
            format_version: ModelBundle::FORMAT_VERSION,
            saved_at: Timestamp::now(),
            q_table: self
                .q_table
                .iter()
                .map(|(state, row)| (state.as_str().to_string(), row.clone()))
                .collect(),
            epsilon: self.epsilon,
            episode_rewards: self.episode_rewards.clone(),
            best_reward: self.best_reward.is_finite().then_some(self.best_reward),
            best_design: self.best_design.clone(),
            training_step: self.training_step,
            hyperparameters: ModelHyperparameters {
                learning_rate: self.config.learning_rate,
                discount_factor: self.config.discount_factor,
                state_size: self.encoder.vector_len(),
                action_size: self.action_space.size(),
                grid_size: self.grid_size(),
            },
        }
    }

    /// Restores a saved model. A model whose action space differs from the
    /// current one is not coerced: the agent is hard-reset and
    /// [`LoadOutcome::Reset`] is returned.
    ///
    /// The hyperparameters recorded in the bundle are informational; the
    /// agent keeps its own learning rate and discount factor.
    pub fn load_bundle(&mut self, bundle: ModelBundle) -> LoadOutcome {
        let expected = self.action_space.size();
        if let Err(e) = bundle.check_compatible(expected) {
            log::warn!("{}; discarding the saved model", e);
            self.reset(self.grid_size());
            return LoadOutcome::Reset {
                expected,
                found: bundle.hyperparameters.action_size,
            };
        }

        self.q_table = bundle
            .q_table
            .into_iter()
            .map(|(state, row)| (StateId::from_string(state), row))
            .collect();
        self.epsilon = bundle.epsilon.min(1.0).max(self.config.min_epsilon);
        self.episode_rewards = bundle.episode_rewards;
        self.best_reward = bundle.best_reward.unwrap_or(f64::NEG_INFINITY);
        self.best_design = bundle.best_design;
        self.training_step = bundle.training_step;
        self.replay.clear();
        LoadOutcome::Loaded
    }

    pub fn save_model(&self, path: &Path) -> Result<()> {
        self.to_bundle().save_to_file(path)?;
        log::info!(
            "Saved Q-table with {} states to {}",
            self.q_table.len(),
            path.display()
        );
        Ok(())
    }

    /// Loads a model file. I/O and decoding failures are errors; an
    /// incompatible action space resets the agent (see
    /// [`load_bundle`](Self::load_bundle)).
    pub fn load_model(&mut self, path: &Path) -> Result<LoadOutcome> {
        let bundle = ModelBundle::load_from_file(path)?;
        let outcome = self.load_bundle(bundle);
        if outcome == LoadOutcome::Loaded {
            log::info!(
                "Loaded Q-table with {} states from {}",
                self.q_table.len(),
                path.display()
            );
        }
        Ok(outcome)
    }
}
