//! The park: an N×N placement grid laid over a square world centred on the origin.

use super::element::{ElementId, ElementSnapshot, ElementType, ParkElement};
use super::grid::GridStats;
use super::thermal::{self, ThermalZones};
use crate::config::{ParkConfig, SimulationConfig, ThermalConfig};
use crate::error::{Error, Result};
use crate::metrics::{compute_weights, RewardWeights};
use crate::types::{Position, Rgb};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::collections::{BTreeMap, HashSet};

/// Serialized park layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkSnapshot {
    pub size: f64,
    pub grid_size: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    pub elements: Vec<ElementSnapshot>,
    /// Redundant per-type counts, keyed by type name.
    #[serde(default)]
    pub element_counts: BTreeMap<String, usize>,
}

fn default_temperature() -> f64 {
    ParkConfig::default().temperature
}

/// The park environment.
///
/// The element list is the source of truth. The cell index and per-type
/// counters are derived from it and updated on every mutation, so at most one
/// element occupies a cell and `element_count(t)` always matches the list.
#[derive(Debug, Clone)]
pub struct Park {
    config: ParkConfig,
    thermal: ThermalConfig,
    base_weights: RewardWeights,
    reward_weights: RewardWeights,
    size: f64,
    grid_size: usize,
    cell_size: f64,
    temperature: f64,
    elements: Vec<ParkElement>,
    cells: Vec<Option<ElementId>>,
    counts: [usize; 6],
    next_id: u64,
    thermal_zones: OnceCell<ThermalZones>,
}

impl Park {
    /// Creates an empty park with default thermal and reward settings.
    pub fn new(size: f64, grid_size: usize) -> Result<Self> {
        let mut config = SimulationConfig::default();
        config.park.size = size;
        config.park.grid_size = grid_size;
        Self::from_config(&config)
    }

    /// Creates an empty park from a full simulation configuration.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        config.park.validate()?;
        config.thermal.validate()?;
        let park_config = config.park.clone();
        let grid_size = park_config.grid_size;
        let size = park_config.size;
        let temperature = park_config
            .temperature
            .clamp(park_config.min_temperature, park_config.max_temperature);
        let base_weights = config.metrics.weights;

        Ok(Self {
            reward_weights: compute_weights(&base_weights, temperature, &config.thermal),
            base_weights,
            thermal: config.thermal.clone(),
            config: park_config,
            size,
            grid_size,
            cell_size: size / grid_size as f64,
            temperature,
            elements: Vec::new(),
            cells: vec![None; grid_size * grid_size],
            counts: [0; 6],
            next_id: 0,
            thermal_zones: OnceCell::new(),
        })
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of cells, the most elements the park can hold.
    pub fn capacity(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn min_temperature(&self) -> f64 {
        self.config.min_temperature
    }

    pub fn max_temperature(&self) -> f64 {
        self.config.max_temperature
    }

    pub fn thermal_config(&self) -> &ThermalConfig {
        &self.thermal
    }

    /// Reward weights for the current ambient temperature.
    pub fn reward_weights(&self) -> &RewardWeights {
        &self.reward_weights
    }

    pub fn elements(&self) -> &[ParkElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.elements.len() >= self.capacity()
    }

    pub fn element(&self, id: ElementId) -> Option<&ParkElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// The element occupying cell `(x, y)`, if any.
    pub fn element_at(&self, x: usize, y: usize) -> Option<&ParkElement> {
        self.cell(x, y).and_then(|id| self.element(id))
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.cell(x, y).is_some()
    }

    /// Occupancy as `grid[x][y]`.
    pub fn occupancy(&self) -> Vec<Vec<bool>> {
        (0..self.grid_size)
            .map(|x| (0..self.grid_size).map(|y| self.is_occupied(x, y)).collect())
            .collect()
    }

    pub fn element_count(&self, element_type: ElementType) -> usize {
        self.counts[element_type.index()]
    }

    /// Per-type counts, including types with no elements.
    pub fn element_counts(&self) -> BTreeMap<ElementType, usize> {
        ElementType::ALL
            .iter()
            .map(|t| (*t, self.counts[t.index()]))
            .collect()
    }

    /// Places an element at the center of cell `(grid_x, grid_y)`.
    ///
    /// Returns `None` without touching the park if the cell is outside the
    /// grid or already occupied.
    pub fn add_element(
        &mut self,
        element_type: ElementType,
        grid_x: usize,
        grid_y: usize,
    ) -> Option<&ParkElement> {
        if grid_x >= self.grid_size || grid_y >= self.grid_size {
            return None;
        }
        if self.is_occupied(grid_x, grid_y) {
            return None;
        }

        let id = ElementId(self.next_id);
        self.next_id += 1;
        let element = ParkElement {
            id,
            element_type,
            position: self.grid_to_world(grid_x, grid_y),
            size: self.config.element_sizes.get(element_type),
            color: element_type.default_color(),
            is_active: true,
            metadata: BTreeMap::new(),
        };

        self.cells[grid_x * self.grid_size + grid_y] = Some(id);
        self.counts[element_type.index()] += 1;
        self.elements.push(element);
        self.invalidate_thermal();
        self.elements.last()
    }

    /// Removes an element. Returns `false` if no element has this id.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        let Some(index) = self.elements.iter().position(|e| e.id == id) else {
            return false;
        };
        let element = self.elements.remove(index);
        let (x, y) = self.world_to_grid(&element.position);
        let cell = &mut self.cells[x * self.grid_size + y];
        if *cell == Some(id) {
            *cell = None;
        }
        self.counts[element.element_type.index()] -= 1;
        self.invalidate_thermal();
        true
    }

    /// Removes every element. Size, grid size and temperature are kept.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.cells.iter_mut().for_each(|c| *c = None);
        self.counts = [0; 6];
        self.invalidate_thermal();
    }

    /// Sets the ambient temperature, clamped to the configured limits, and
    /// recomputes the reward weights for it. Returns the applied value.
    ///
    /// A NaN input leaves the temperature unchanged.
    pub fn set_temperature(&mut self, temperature: f64) -> f64 {
        if !temperature.is_nan() {
            self.temperature =
                temperature.clamp(self.config.min_temperature, self.config.max_temperature);
        }
        self.reward_weights = compute_weights(&self.base_weights, self.temperature, &self.thermal);
        self.invalidate_thermal();
        self.temperature
    }

    /// Changes the grid resolution while keeping the world size.
    ///
    /// Fails if any element is still placed.
    pub fn set_grid_size(&mut self, grid_size: usize) -> Result<()> {
        if grid_size == 0 {
            return Err(Error::InvalidGridSize(grid_size));
        }
        if !self.elements.is_empty() {
            return Err(Error::GridNotEmpty {
                elements: self.elements.len(),
            });
        }
        self.grid_size = grid_size;
        self.config.grid_size = grid_size;
        self.cell_size = self.size / grid_size as f64;
        self.cells = vec![None; grid_size * grid_size];
        self.invalidate_thermal();
        Ok(())
    }

    /// Center of a grid cell in world coordinates.
    pub fn grid_to_world(&self, grid_x: usize, grid_y: usize) -> Position {
        let half = self.size / 2.0;
        Position::new(
            (grid_x as f64 + 0.5) * self.cell_size - half,
            (grid_y as f64 + 0.5) * self.cell_size - half,
        )
    }

    /// Grid cell containing a world position, clamped onto the grid.
    pub fn world_to_grid(&self, position: &Position) -> (usize, usize) {
        (
            cell_index(position.x, self.size, self.grid_size),
            cell_index(position.y, self.size, self.grid_size),
        )
    }

    /// `true` if the position lies within the park's square extent.
    pub fn is_position_valid(&self, position: &Position) -> bool {
        let half = self.size / 2.0;
        (-half..=half).contains(&position.x) && (-half..=half).contains(&position.y)
    }

    pub fn elements_by_type(&self, element_type: ElementType) -> impl Iterator<Item = &ParkElement> {
        self.elements
            .iter()
            .filter(move |e| e.element_type == element_type)
    }

    /// Elements whose center lies within `radius` of `position` on the ground plane.
    pub fn elements_near(&self, position: &Position, radius: f64) -> Vec<&ParkElement> {
        self.elements
            .iter()
            .filter(|e| e.position.distance_2d(position) <= radius)
            .collect()
    }

    /// Closest element of a type to `position`.
    pub fn nearest_of_type(
        &self,
        position: &Position,
        element_type: ElementType,
    ) -> Option<&ParkElement> {
        self.elements_by_type(element_type).min_by(|a, b| {
            a.position
                .distance_2d(position)
                .total_cmp(&b.position.distance_2d(position))
        })
    }

    /// Empty cells in `(x, y)` lexicographic order.
    pub fn available_cells(&self) -> Vec<(usize, usize)> {
        let n = self.grid_size;
        (0..n)
            .flat_map(|x| (0..n).map(move |y| (x, y)))
            .filter(|&(x, y)| self.cells[x * n + y].is_none())
            .collect()
    }

    pub fn occupancy_rate(&self) -> f64 {
        self.elements.len() as f64 / self.capacity() as f64
    }

    pub fn grid_stats(&self) -> GridStats {
        let mask: Vec<bool> = self.cells.iter().map(Option::is_some).collect();
        GridStats::from_occupancy(&mask, self.grid_size)
    }

    pub fn effective_temperature_at(&self, position: &Position) -> f64 {
        thermal::effective_temperature(self.temperature, &self.elements, position, &self.thermal)
    }

    pub fn thermal_comfort_at(&self, position: &Position) -> f64 {
        thermal::thermal_comfort(self.effective_temperature_at(position), &self.thermal)
    }

    pub fn is_in_shade(&self, position: &Position) -> bool {
        thermal::in_shade(&self.elements, position, &self.thermal)
    }

    /// The sampled thermal field, computed on first use after a change.
    pub fn thermal_zones(&self) -> &ThermalZones {
        self.thermal_zones.get_or_init(|| {
            ThermalZones::sample(
                self.size,
                self.config.thermal_resolution,
                self.temperature,
                &self.elements,
                &self.thermal,
            )
        })
    }

    /// Places up to `count` random active elements on random empty cells.
    /// Returns the number placed.
    pub fn randomize<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> usize {
        let available = self.available_cells();
        let count = count.min(available.len());
        let chosen = rand::seq::index::sample(rng, available.len(), count);
        let mut placed = 0;
        for idx in chosen.iter() {
            let (x, y) = available[idx];
            let Some(element_type) = ElementType::ACTIVE.choose(rng).copied() else {
                break;
            };
            if self.add_element(element_type, x, y).is_some() {
                placed += 1;
            }
        }
        placed
    }

    pub fn to_snapshot(&self) -> ParkSnapshot {
        ParkSnapshot {
            size: self.size,
            grid_size: self.grid_size,
            temperature: self.temperature,
            elements: self.elements.iter().map(ParkElement::to_snapshot).collect(),
            element_counts: ElementType::ALL
                .iter()
                .map(|t| (t.as_str().to_string(), self.counts[t.index()]))
                .collect(),
        }
    }

    /// Replaces the park's contents with a snapshot.
    ///
    /// The snapshot is validated before anything changes: sizes must be
    /// positive, every element must lie inside the park and no two elements
    /// may share a cell. Ids are reassigned.
    pub fn load_snapshot(&mut self, snapshot: &ParkSnapshot) -> Result<()> {
        if snapshot.grid_size == 0 {
            return Err(Error::InvalidSnapshot("grid_size must be positive".into()));
        }
        if !(snapshot.size.is_finite() && snapshot.size > 0.0) {
            return Err(Error::InvalidSnapshot("size must be positive".into()));
        }

        let half = snapshot.size / 2.0;
        let cell_size = snapshot.size / snapshot.grid_size as f64;
        let mut seen = HashSet::new();
        let mut placements = Vec::with_capacity(snapshot.elements.len());
        for element in &snapshot.elements {
            let (x, y, _) = element.position;
            if !(x.is_finite() && y.is_finite()) || x.abs() > half || y.abs() > half {
                return Err(Error::InvalidSnapshot(format!(
                    "{} at ({}, {}) lies outside the park",
                    element.element_type, x, y
                )));
            }
            let key = (
                cell_index(x, snapshot.size, snapshot.grid_size),
                cell_index(y, snapshot.size, snapshot.grid_size),
            );
            if !seen.insert(key) {
                return Err(Error::InvalidSnapshot(format!(
                    "two elements share cell {:?}",
                    key
                )));
            }
            placements.push(key);
        }

        self.elements.clear();
        self.size = snapshot.size;
        self.config.size = snapshot.size;
        self.grid_size = snapshot.grid_size;
        self.config.grid_size = snapshot.grid_size;
        self.cell_size = cell_size;
        self.cells = vec![None; snapshot.grid_size * snapshot.grid_size];
        self.counts = [0; 6];

        for (element, (x, y)) in snapshot.elements.iter().zip(placements) {
            let id = ElementId(self.next_id);
            self.next_id += 1;
            self.cells[x * self.grid_size + y] = Some(id);
            self.counts[element.element_type.index()] += 1;
            self.elements.push(ParkElement {
                id,
                element_type: element.element_type,
                position: element.position.into(),
                size: element.size,
                color: Rgb::from(element.color),
                is_active: element.is_active,
                metadata: element.metadata.clone(),
            });
        }

        self.set_temperature(snapshot.temperature);
        Ok(())
    }

    /// Builds a new park from a snapshot using the given configuration for
    /// everything the snapshot does not carry.
    pub fn from_snapshot(snapshot: &ParkSnapshot, config: &SimulationConfig) -> Result<Self> {
        let mut park = Self::from_config(config)?;
        park.load_snapshot(snapshot)?;
        Ok(park)
    }

    fn cell(&self, x: usize, y: usize) -> Option<ElementId> {
        if x < self.grid_size && y < self.grid_size {
            self.cells[x * self.grid_size + y]
        } else {
            None
        }
    }

    fn invalidate_thermal(&mut self) {
        self.thermal_zones = OnceCell::new();
    }
}

/// Cell along one axis for a world coordinate, clamped onto the grid.
fn cell_index(v: f64, size: f64, grid_size: usize) -> usize {
    let scaled = ((v + size / 2.0) / size * grid_size as f64).floor();
    if scaled.is_nan() || scaled < 0.0 {
        0
    } else {
        (scaled as usize).min(grid_size - 1)
    }
}

impl std::fmt::Display for Park {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Park(size={}, grid={}x{}, elements={}, {:.1}°C)",
            self.size,
            self.grid_size,
            self.grid_size,
            self.elements.len(),
            self.temperature
        )
    }
}
