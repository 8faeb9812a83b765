//! Experience replay.

use super::state::StateId;
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// A single `(state, action, reward, next_state, done)` transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub state: StateId,
    pub action: usize,
    pub reward: f64,
    pub next_state: StateId,
    pub done: bool,
}

impl Experience {
    pub fn new(state: StateId, action: usize, reward: f64, next_state: StateId, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Size and fill level of a [`ReplayBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplayStats {
    pub size: usize,
    pub capacity: usize,
    pub utilization: f64,
}

/// Fixed-capacity FIFO of transitions. The oldest transition is evicted
/// when a new one arrives at capacity.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    buffer: VecDeque<Experience>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn add(&mut self, experience: Experience) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(experience);
    }

    /// Draws up to `batch_size` distinct transitions uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<Experience> {
        let amount = batch_size.min(self.buffer.len());
        index::sample(rng, self.buffer.len(), amount)
            .into_iter()
            .map(|i| self.buffer[i].clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        self.buffer.iter()
    }

    pub fn stats(&self) -> ReplayStats {
        ReplayStats {
            size: self.buffer.len(),
            capacity: self.capacity,
            utilization: if self.capacity == 0 {
                0.0
            } else {
                self.buffer.len() as f64 / self.capacity as f64
            },
        }
    }
}
