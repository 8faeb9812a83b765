//! Saving and loading models, park layouts and training results.
//!
//! Everything is stored as JSON:
//! - [`ModelBundle`]: a learned Q-table with its training state.
//! - [`ParkSnapshot`]: a park layout.
//! - [`TrainingReport`]: rewards, statistics and final metrics of a run.
//!
//! [`CheckpointManager`] keeps a rolling window of model checkpoints during
//! long training runs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use park_rl::{Persist, QLearningAgent, LearningConfig};
//! use std::path::Path;
//!
//! let mut agent = QLearningAgent::new(3, LearningConfig::default());
//! // ... train ...
//! agent.save_model(Path::new("model.json"))?;
//! agent.load_model(Path::new("model.json"))?;
//! ```

use crate::environment::ParkSnapshot;
use crate::error::{Error, Result};
use crate::learning::{AgentStatistics, BaselineStats, QLearningAgent};
use crate::types::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Options for writing persisted files.
#[derive(Debug, Clone)]
pub struct PersistenceOptions {
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for PersistenceOptions {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl PersistenceOptions {
    /// Single-line JSON.
    pub fn compact() -> Self {
        Self { pretty: false }
    }

    /// Indented JSON.
    pub fn readable() -> Self {
        Self { pretty: true }
    }
}

/// JSON save/load for any serializable record.
pub trait Persist: Serialize + DeserializeOwned + Sized {
    fn save_to_file(&self, path: &Path) -> Result<()> {
        self.save_to_file_with_options(path, &PersistenceOptions::default())
    }

    fn save_to_file_with_options(&self, path: &Path, options: &PersistenceOptions) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = self.to_bytes_with_options(options)?;
        let mut file = fs::File::create(path)?;
        file.write_all(&bytes)?;
        log::debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let mut file = fs::File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with_options(&PersistenceOptions::default())
    }

    fn to_bytes_with_options(&self, options: &PersistenceOptions) -> Result<Vec<u8>> {
        let bytes = if options.pretty {
            serde_json::to_vec_pretty(self)?
        } else {
            serde_json::to_vec(self)?
        };
        Ok(bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Hyperparameters a model was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHyperparameters {
    pub learning_rate: f64,
    pub discount_factor: f64,
    /// Length of the one-hot state vector.
    pub state_size: usize,
    pub action_size: usize,
    pub grid_size: usize,
}

/// A persisted Q-learning model.
///
/// `best_reward` is `None` when no episode has completed, since JSON cannot
/// carry `-inf`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub saved_at: Timestamp,
    /// State key to one value per action.
    pub q_table: BTreeMap<String, Vec<f64>>,
    pub epsilon: f64,
    pub episode_rewards: Vec<f64>,
    pub best_reward: Option<f64>,
    pub best_design: Option<ParkSnapshot>,
    pub training_step: u64,
    pub hyperparameters: ModelHyperparameters,
}

impl ModelBundle {
    pub const FORMAT_VERSION: u32 = 1;

    /// Checks that the model fits an action space of `action_size`, both in
    /// its recorded hyperparameters and in every Q-table row.
    pub fn check_compatible(&self, action_size: usize) -> Result<()> {
        let found = self.hyperparameters.action_size;
        if found != action_size {
            return Err(Error::IncompatibleModel {
                expected: action_size,
                found,
            });
        }
        if let Some(row) = self.q_table.values().find(|row| row.len() != action_size) {
            return Err(Error::IncompatibleModel {
                expected: action_size,
                found: row.len(),
            });
        }
        Ok(())
    }
}

impl Persist for ModelBundle {}
impl Persist for ParkSnapshot {}

/// Results of a training run, for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub created_at: Timestamp,
    pub grid_size: usize,
    pub episode_rewards: Vec<f64>,
    pub statistics: AgentStatistics,
    /// Metrics of the best design, or of the live park if there is none.
    pub final_metrics: BTreeMap<String, f64>,
    pub best_design: Option<ParkSnapshot>,
    #[serde(default)]
    pub baseline: Option<BaselineStats>,
}

impl Persist for TrainingReport {}

/// Rolling window of model checkpoints named `checkpoint_<episode>.json`.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    checkpoint_dir: PathBuf,
    max_checkpoints: usize,
    checkpoint_interval: u64,
}

impl CheckpointManager {
    /// Keeps at most `max_checkpoints` files in `checkpoint_dir`, saving every
    /// 10 episodes unless changed with [`with_interval`](Self::with_interval).
    pub fn new(checkpoint_dir: &Path, max_checkpoints: usize) -> Self {
        Self {
            checkpoint_dir: checkpoint_dir.to_path_buf(),
            max_checkpoints,
            checkpoint_interval: 10,
        }
    }

    pub fn with_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn checkpoint_dir(&self) -> &Path {
        &self.checkpoint_dir
    }

    /// `true` when `episode` (1-based) falls on the checkpoint interval.
    pub fn should_checkpoint(&self, episode: u64) -> bool {
        self.checkpoint_interval > 0 && episode > 0 && episode % self.checkpoint_interval == 0
    }

    /// Saves the agent's model and prunes the oldest checkpoints.
    pub fn save_checkpoint(&self, agent: &QLearningAgent, episode: u64) -> Result<PathBuf> {
        fs::create_dir_all(&self.checkpoint_dir)?;
        let path = self
            .checkpoint_dir
            .join(format!("checkpoint_{}.json", episode));
        agent.to_bundle().save_to_file(&path)?;
        self.cleanup_old_checkpoints()?;
        log::info!("Saved checkpoint at episode {}", episode);
        Ok(path)
    }

    /// The newest checkpoint, or `None` if the directory holds none.
    pub fn load_latest(&self) -> Result<Option<ModelBundle>> {
        match self.list_checkpoints()?.pop() {
            Some((_, path)) => Ok(Some(ModelBundle::load_from_file(&path)?)),
            None => Ok(None),
        }
    }

    /// Checkpoint files with their episode numbers, oldest first.
    pub fn list_checkpoints(&self) -> Result<Vec<(u64, PathBuf)>> {
        if !self.checkpoint_dir.exists() {
            return Ok(Vec::new());
        }

        let mut checkpoints = Vec::new();
        for entry in fs::read_dir(&self.checkpoint_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let episode = path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|name| name.strip_prefix("checkpoint_"))
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|n| n.parse::<u64>().ok());
            if let Some(episode) = episode {
                checkpoints.push((episode, path));
            }
        }

        checkpoints.sort();
        Ok(checkpoints)
    }

    fn cleanup_old_checkpoints(&self) -> Result<()> {
        let checkpoints = self.list_checkpoints()?;
        let excess = checkpoints.len().saturating_sub(self.max_checkpoints);
        for (_, path) in checkpoints.into_iter().take(excess) {
            fs::remove_file(&path)?;
            log::debug!("Removed old checkpoint: {:?}", path);
        }
        Ok(())
    }
}
