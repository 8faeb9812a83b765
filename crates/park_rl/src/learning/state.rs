//! Park state encoding.

use crate::environment::{ElementType, Park};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of a Q-table row: a digest of the park's type layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StateId(String);

impl StateId {
    /// Wraps an existing key, e.g. one read back from a saved model.
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turns a park into a hashable state key or a dense feature vector.
///
/// Only the grid position and type of each element matter. Ids, colours,
/// insertion order and the ambient temperature are ignored, so two parks with
/// the same layout always encode to the same [`StateId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEncoder {
    grid_size: usize,
}

impl StateEncoder {
    /// Number of one-hot channels per cell: empty plus every element type.
    pub const CHANNELS: usize = ElementType::ALL.len() + 1;

    pub fn new(grid_size: usize) -> Self {
        Self { grid_size }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// Length of [`encode_vector`](Self::encode_vector) output.
    pub fn vector_len(&self) -> usize {
        self.grid_size * self.grid_size * Self::CHANNELS
    }

    /// Row-major `grid[x * n + y]` of type codes, 0 for an empty cell.
    pub fn layout(&self, park: &Park) -> Vec<i32> {
        let n = self.grid_size;
        let mut grid = vec![0i32; n * n];
        for element in park.elements() {
            let (x, y) = park.world_to_grid(&element.position);
            if x < n && y < n {
                grid[x * n + y] = element.element_type.state_code();
            }
        }
        grid
    }

    /// Digest of the type layout as a hex string.
    pub fn encode(&self, park: &Park) -> StateId {
        let layout = self.layout(park);
        let mut hasher = blake3::Hasher::new();
        for code in &layout {
            hasher.update(&code.to_le_bytes());
        }
        StateId(hasher.finalize().to_hex().to_string())
    }

    /// One-hot encoding, `CHANNELS` values per cell in row-major order.
    pub fn encode_vector(&self, park: &Park) -> Vec<f32> {
        let layout = self.layout(park);
        let mut vector = vec![0.0f32; self.vector_len()];
        for (cell, code) in layout.iter().enumerate() {
            vector[cell * Self::CHANNELS + *code as usize] = 1.0;
        }
        vector
    }
}
