//! Placement actions and the discrete action space.

use crate::environment::{ElementType, Park};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// "Place `element_type` on cell `(x, y)`".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementAction {
    pub x: usize,
    pub y: usize,
    pub element_type: ElementType,
}

impl PlacementAction {
    pub fn new(x: usize, y: usize, element_type: ElementType) -> Self {
        Self { x, y, element_type }
    }

    /// Applies the action to `park`. Returns `false` if the placement was
    /// rejected.
    pub fn apply(&self, park: &mut Park) -> bool {
        park.add_element(self.element_type, self.x, self.y).is_some()
    }
}

impl fmt::Display for PlacementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at ({}, {})", self.element_type, self.x, self.y)
    }
}

/// Enumerates every `(cell, type)` pair of a grid.
///
/// Index layout: `(x * grid_size + y) * types + type_index`, where the types
/// are [`ElementType::ACTIVE`] in order. Legacy element types are never part
/// of the space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpace {
    grid_size: usize,
    element_types: Vec<ElementType>,
}

impl ActionSpace {
    pub fn new(grid_size: usize) -> Self {
        Self {
            grid_size,
            element_types: ElementType::ACTIVE.to_vec(),
        }
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn element_types(&self) -> &[ElementType] {
        &self.element_types
    }

    pub fn num_positions(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Total number of actions, `grid_size² × types`.
    pub fn size(&self) -> usize {
        self.num_positions() * self.element_types.len()
    }

    /// Index of an action, or `None` if it lies outside this space.
    pub fn action_to_index(&self, action: &PlacementAction) -> Option<usize> {
        if action.x >= self.grid_size || action.y >= self.grid_size {
            return None;
        }
        let type_index = self
            .element_types
            .iter()
            .position(|t| *t == action.element_type)?;
        let position = action.x * self.grid_size + action.y;
        Some(position * self.element_types.len() + type_index)
    }

    /// Inverse of [`action_to_index`](Self::action_to_index).
    pub fn index_to_action(&self, index: usize) -> Option<PlacementAction> {
        if index >= self.size() {
            return None;
        }
        let types = self.element_types.len();
        let position = index / types;
        Some(PlacementAction {
            x: position / self.grid_size,
            y: position % self.grid_size,
            element_type: self.element_types[index % types],
        })
    }

    /// Indices of every action that targets an empty cell, in ascending order.
    pub fn valid_actions(&self, park: &Park) -> Vec<usize> {
        let types = self.element_types.len();
        let mut valid = Vec::new();
        for (x, y) in park.available_cells() {
            if x >= self.grid_size || y >= self.grid_size {
                continue;
            }
            let base = (x * self.grid_size + y) * types;
            valid.extend(base..base + types);
        }
        valid
    }

    /// A uniformly random valid action, or `None` when the grid is full.
    pub fn sample<R: Rng + ?Sized>(&self, park: &Park, rng: &mut R) -> Option<usize> {
        self.valid_actions(park).choose(rng).copied()
    }

    /// `true` for every valid action index.
    pub fn mask(&self, park: &Park) -> Vec<bool> {
        let mut mask = vec![false; self.size()];
        for index in self.valid_actions(park) {
            mask[index] = true;
        }
        mask
    }
}
