//! Episode loop, multi-episode training and the random-placement baseline.

use super::agent::QLearningAgent;
use super::replay::Experience;
use crate::config::SimulationConfig;
use crate::environment::{ElementType, Park};
use crate::error::{Error, Result};
use crate::metrics::{metrics_map, ParkMetrics, RewardBreakdown, RewardCalculator};
use crate::persistence::{CheckpointManager, TrainingReport};
use crate::types::{mean, std_dev, Timestamp};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Reward statistics of random layouts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    pub trials: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

/// Outcome of one greedy rollout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Sum of per-step rewards, comparable to training episode rewards.
    pub total_reward: f64,
    /// Reward of the finished layout, comparable to [`BaselineStats::mean`].
    pub final_reward: f64,
    pub placements: usize,
}

/// Trains a [`QLearningAgent`] to furnish a [`Park`].
///
/// The trainer owns the park it trains on. Every episode clears the park,
/// places up to `max_steps` elements chosen epsilon-greedily and learns from
/// each placement immediately, then replays a batch of stored transitions.
/// The reward of a step is recomputed from the whole layout after the
/// placement.
#[derive(Debug, Clone)]
pub struct ParkDesignTrainer {
    config: SimulationConfig,
    park: Park,
    agent: QLearningAgent,
    reward: RewardCalculator,
    rng: StdRng,
    training: bool,
}

impl ParkDesignTrainer {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        Self::with_rng(config, StdRng::from_rng(&mut rand::rng()))
    }

    /// A trainer whose exploration and temperature curriculum are
    /// reproducible.
    pub fn with_seed(config: SimulationConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulationConfig, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let park = Park::from_config(&config)?;
        let agent = QLearningAgent::new(park.grid_size(), config.learning.clone());
        Ok(Self {
            reward: RewardCalculator::new(config.metrics.clone()),
            config,
            park,
            agent,
            rng,
            training: false,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn park(&self) -> &Park {
        &self.park
    }

    /// Direct access to the live park for manual edits. Use
    /// [`set_grid_size`](Self::set_grid_size) to resize, so the agent is
    /// reset along with the grid.
    pub fn park_mut(&mut self) -> &mut Park {
        &mut self.park
    }

    pub fn agent(&self) -> &QLearningAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut QLearningAgent {
        &mut self.agent
    }

    pub fn reward_calculator(&self) -> &RewardCalculator {
        &self.reward
    }

    pub fn start(&mut self) {
        self.training = true;
    }

    /// Takes effect between episodes; an episode in progress always finishes.
    pub fn stop(&mut self) {
        self.training = false;
    }

    pub fn is_training(&self) -> bool {
        self.training
    }

    /// Runs one episode if training is started. For render loops that call
    /// once per tick.
    pub fn tick(&mut self) -> Option<f64> {
        if self.training {
            Some(self.train_episode())
        } else {
            None
        }
    }

    /// Reward of the live park.
    pub fn calculate_reward(&self) -> f64 {
        self.reward.calculate(&self.park)
    }

    pub fn reward_breakdown(&self) -> RewardBreakdown {
        self.reward.breakdown(&self.park)
    }

    pub fn metrics(&self) -> ParkMetrics {
        ParkMetrics::compute(&self.park, self.reward.config())
    }

    /// Runs one episode with the configured step budget and returns its total
    /// reward.
    pub fn train_episode(&mut self) -> f64 {
        self.train_episode_with(self.config.trainer.max_steps)
    }

    /// Runs one episode of at most `max_steps` placements.
    ///
    /// The episode ends early when the grid fills up; the placement that
    /// filled it is the terminal transition.
    pub fn train_episode_with(&mut self, max_steps: usize) -> f64 {
        if self.config.trainer.randomize_temperature {
            self.sample_temperature();
        }
        self.park.clear();

        let mut state = self.agent.encode_state(&self.park);
        let mut total_reward = 0.0;

        for step in 0..max_steps {
            let Some(action) = self.agent.choose_action(&self.park, true, &mut self.rng) else {
                break;
            };
            let Some(placement) = self.agent.action_space().index_to_action(action) else {
                break;
            };
            if !placement.apply(&mut self.park) {
                log::warn!("Placement {} was rejected, ending episode", placement);
                break;
            }

            let reward = self.reward.calculate(&self.park);
            total_reward += reward;
            log::debug!("Step {}: {} -> reward {:.3}", step, placement, reward);

            let next_state = self.agent.encode_state(&self.park);
            let done = step + 1 == max_steps || self.park.is_full();

            let experience = Experience::new(state, action, reward, next_state.clone(), done);
            self.agent.learn_from(&experience);
            self.agent.remember(experience);

            state = next_state;
            if done {
                break;
            }
        }

        self.agent.replay(&mut self.rng);
        if self.agent.end_episode(total_reward, &self.park) {
            log::debug!(
                "New best design: {:.2} with {} elements at {:.1}°C",
                total_reward,
                self.park.len(),
                self.park.temperature()
            );
        }
        total_reward
    }

    /// Runs `episodes` episodes and returns their rewards.
    ///
    /// Progress is logged every `log_interval` episodes. When a checkpoint
    /// manager is given, the model is saved whenever it asks for it.
    pub fn train(
        &mut self,
        episodes: usize,
        checkpoints: Option<&CheckpointManager>,
    ) -> Result<Vec<f64>> {
        let log_interval = self.config.trainer.log_interval;
        let mut rewards = Vec::with_capacity(episodes);

        for i in 0..episodes {
            let reward = self.train_episode();
            rewards.push(reward);

            let completed = self.agent.episode_count();
            if let Some(manager) = checkpoints {
                if manager.should_checkpoint(completed) {
                    manager.save_checkpoint(&self.agent, completed)?;
                }
            }

            if log_interval > 0 && (i + 1) % log_interval == 0 {
                log::info!(
                    "Episode {}/{} - Reward: {:.2} - Avg(last {}): {:.2} - Best: {:.2} - ε: {:.3}",
                    i + 1,
                    episodes,
                    reward,
                    log_interval,
                    self.agent.average_reward(log_interval),
                    self.agent.best_reward(),
                    self.agent.epsilon()
                );
            }
        }

        Ok(rewards)
    }

    /// Furnishes the park greedily with the learned policy, without learning
    /// or exploring. The resulting layout stays in the park.
    pub fn evaluate(&mut self) -> Evaluation {
        self.park.clear();
        let mut total_reward = 0.0;
        let mut placements = 0;
        for _ in 0..self.config.trainer.max_steps {
            let Some(placement) = self.agent.choose_placement(&self.park, false, &mut self.rng) else {
                break;
            };
            if !placement.apply(&mut self.park) {
                break;
            }
            placements += 1;
            total_reward += self.reward.calculate(&self.park);
        }
        Evaluation {
            total_reward,
            final_reward: self.reward.calculate(&self.park),
            placements,
        }
    }

    /// Scores `trials` random layouts at the current temperature.
    ///
    /// Each trial attempts a random number of placements (at least three,
    /// fewer than the cell count) of random active types on random cells.
    /// Attempts that hit an occupied cell are dropped, as a careless designer
    /// would. The park is left empty afterwards.
    pub fn test_random_baseline(&mut self, trials: usize) -> BaselineStats {
        let n = self.park.grid_size();
        let capacity = self.park.capacity();
        let mut rewards = Vec::with_capacity(trials);

        for _ in 0..trials {
            self.park.clear();
            let attempts = if capacity <= 3 {
                capacity
            } else {
                self.rng.random_range(3..capacity)
            };
            for _ in 0..attempts {
                let Some(element_type) = ElementType::ACTIVE.choose(&mut self.rng).copied() else {
                    break;
                };
                let x = self.rng.random_range(0..n);
                let y = self.rng.random_range(0..n);
                self.park.add_element(element_type, x, y);
            }
            rewards.push(self.reward.calculate(&self.park));
        }
        self.park.clear();

        let stats = BaselineStats {
            trials,
            mean: mean(&rewards),
            std_dev: std_dev(&rewards),
        };
        log::info!(
            "Random baseline over {} trials: {:.2} ± {:.2}",
            trials,
            stats.mean,
            stats.std_dev
        );
        stats
    }

    /// Resizes the grid. The park is cleared and the agent is hard-reset,
    /// since its Q-table is meaningless for a different action space.
    pub fn set_grid_size(&mut self, grid_size: usize) -> Result<()> {
        if grid_size == 0 {
            return Err(Error::InvalidGridSize(grid_size));
        }
        self.park.clear();
        self.park.set_grid_size(grid_size)?;
        self.config.park.grid_size = grid_size;
        self.agent.reset(grid_size);
        log::info!(
            "Grid resized to {}x{}; Q-table cleared ({} actions)",
            grid_size,
            grid_size,
            self.agent.action_space().size()
        );
        Ok(())
    }

    /// Loads the best design found so far into the live park. Returns
    /// `false` when there is none yet.
    pub fn apply_best_design(&mut self) -> Result<bool> {
        match self.agent.best_design().cloned() {
            Some(design) => {
                self.park.load_snapshot(&design)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Summary of training so far. Final metrics describe the best design,
    /// or the live park if no episode has finished.
    pub fn report(&self, baseline: Option<BaselineStats>) -> Result<TrainingReport> {
        let final_metrics = match self.agent.best_design() {
            Some(design) => {
                let park = Park::from_snapshot(design, &self.config)?;
                metrics_map(&park, self.reward.config())
            }
            None => metrics_map(&self.park, self.reward.config()),
        };
        Ok(TrainingReport {
            created_at: Timestamp::now(),
            grid_size: self.park.grid_size(),
            episode_rewards: self.agent.episode_rewards().to_vec(),
            statistics: self.agent.statistics(),
            final_metrics,
            best_design: self.agent.best_design().cloned(),
            baseline,
        })
    }

    /// Draws the episode temperature: cold, comfortable or hot with
    /// probabilities 1/4, 1/2, 1/4.
    fn sample_temperature(&mut self) {
        let thermal = self.park.thermal_config();
        let regimes = [
            thermal.cold_range,
            thermal.comfortable,
            thermal.comfortable,
            thermal.hot_range,
        ];
        if let Some(range) = regimes.choose(&mut self.rng) {
            let temperature = range.sample(&mut self.rng);
            self.park.set_temperature(temperature);
        }
    }
}
