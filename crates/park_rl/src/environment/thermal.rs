//! Local temperature field: tree shade, fountain cooling and comfort.

use super::element::{ElementType, ParkElement};
use crate::config::ThermalConfig;
use crate::types::Position;

/// Radius of the shade cast by a tree.
pub fn shade_radius(tree: &ParkElement, config: &ThermalConfig) -> f64 {
    tree.size / 2.0 + config.shade_margin
}

/// Ambient temperature reduced by every tree and fountain within range.
///
/// Each source cools linearly from its full effect at the center to nothing
/// at its radius. Overlapping sources add up without a cap.
pub fn effective_temperature(
    ambient: f64,
    elements: &[ParkElement],
    position: &Position,
    config: &ThermalConfig,
) -> f64 {
    let mut temperature = ambient;
    for element in elements {
        let (cooling, radius) = match element.element_type {
            ElementType::Tree => (config.tree_cooling, shade_radius(element, config)),
            ElementType::Fountain => (config.fountain_cooling, config.fountain_cooling_radius),
            _ => continue,
        };
        let distance = position.distance_2d(&element.position);
        if distance < radius {
            temperature -= cooling * (1.0 - distance / radius);
        }
    }
    temperature
}

/// Comfort in `[0, 1]` for a temperature: one inside the comfortable band,
/// falling linearly to zero `comfort_falloff` degrees outside either edge.
pub fn thermal_comfort(temperature: f64, config: &ThermalConfig) -> f64 {
    let band = config.comfortable;
    let excess = if temperature < band.min {
        band.min - temperature
    } else if temperature > band.max {
        temperature - band.max
    } else {
        return 1.0;
    };
    (1.0 - excess / config.comfort_falloff).max(0.0)
}

/// `true` if `position` lies within the shade radius of any tree.
pub fn in_shade(elements: &[ParkElement], position: &Position, config: &ThermalConfig) -> bool {
    elements
        .iter()
        .filter(|e| e.element_type == ElementType::Tree)
        .any(|tree| position.distance_2d(&tree.position) <= shade_radius(tree, config))
}

/// The effective-temperature and comfort field sampled on a regular grid.
///
/// Built lazily by [`Park::thermal_zones`](super::Park::thermal_zones) and
/// discarded whenever elements or the ambient temperature change.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalZones {
    resolution: usize,
    temperatures: Vec<f64>,
    comfort: Vec<f64>,
}

impl ThermalZones {
    /// Samples the field at the centers of a `resolution × resolution` grid
    /// laid over a park of `park_size` meters centred on the origin.
    pub fn sample(
        park_size: f64,
        resolution: usize,
        ambient: f64,
        elements: &[ParkElement],
        config: &ThermalConfig,
    ) -> Self {
        let resolution = resolution.max(1);
        let step = park_size / resolution as f64;
        let half = park_size / 2.0;
        let mut temperatures = Vec::with_capacity(resolution * resolution);
        let mut comfort = Vec::with_capacity(resolution * resolution);

        for i in 0..resolution {
            for j in 0..resolution {
                let position = Position::new(
                    -half + (i as f64 + 0.5) * step,
                    -half + (j as f64 + 0.5) * step,
                );
                let t = effective_temperature(ambient, elements, &position, config);
                temperatures.push(t);
                comfort.push(thermal_comfort(t, config));
            }
        }

        Self {
            resolution,
            temperatures,
            comfort,
        }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn temperature_at(&self, i: usize, j: usize) -> Option<f64> {
        self.index(i, j).map(|idx| self.temperatures[idx])
    }

    pub fn comfort_at(&self, i: usize, j: usize) -> Option<f64> {
        self.index(i, j).map(|idx| self.comfort[idx])
    }

    /// Mean comfort over all samples.
    pub fn mean_comfort(&self) -> f64 {
        crate::types::mean(&self.comfort)
    }

    pub fn min_effective_temperature(&self) -> f64 {
        self.temperatures.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_effective_temperature(&self) -> f64 {
        self.temperatures
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Fraction of samples with full comfort.
    pub fn comfortable_fraction(&self) -> f64 {
        let comfortable = self.comfort.iter().filter(|c| **c >= 1.0).count();
        comfortable as f64 / self.comfort.len() as f64
    }

    fn index(&self, i: usize, j: usize) -> Option<usize> {
        (i < self.resolution && j < self.resolution).then(|| i * self.resolution + j)
    }
}
