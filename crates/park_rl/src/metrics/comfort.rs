//! Bench comfort, modulated by the ambient temperature.

use crate::config::MetricsConfig;
use crate::environment::{ElementType, Park, ParkElement};
use crate::types::Position;

/// Thermal regime used to pick the amenity bonus table.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Regime {
    /// Below the comfortable band, with the saturated cold factor.
    Cold(f64),
    Comfortable,
    /// Above the comfortable band, with the saturated heat factor.
    Hot(f64),
}

const TREE_BONUS_COMFORTABLE: f64 = 0.2;
const TREE_BONUS_HOT: f64 = 0.3;
const TREE_BONUS_HOT_SCALE: f64 = 0.2;
const FOUNTAIN_BONUS_COLD: f64 = 0.05;
const FOUNTAIN_BONUS_COMFORTABLE: f64 = 0.15;
const FOUNTAIN_BONUS_HOT: f64 = 0.2;
const FOUNTAIN_BONUS_HOT_SCALE: f64 = 0.15;
const LAMP_BONUS_COLD: f64 = 0.2;
const LAMP_BONUS_COLD_SCALE: f64 = 0.1;
const LAMP_BONUS_COMFORTABLE: f64 = 0.15;
const LAMP_BONUS_HOT: f64 = 0.1;
const COOLING_COMBO_BONUS: f64 = 0.1;
const SHADE_LIGHT_COMBO_BONUS: f64 = 0.05;
const FULL_SET_BONUS: f64 = 0.1;

const POINT_BASE_COMFORT: f64 = 0.2;
const POINT_AMENITY_BONUS: f64 = 0.2;
const POINT_RADIUS: f64 = 5.0;

/// Scores how pleasant each bench is given the amenities around it.
pub struct ComfortCalculator<'a> {
    park: &'a Park,
    config: &'a MetricsConfig,
}

impl<'a> ComfortCalculator<'a> {
    pub fn new(park: &'a Park, config: &'a MetricsConfig) -> Self {
        Self { park, config }
    }

    /// Mean bench comfort in `[0, 1]`, zero when there are no benches.
    pub fn total_comfort(&self) -> f64 {
        let regime = self.regime();
        let scores: Vec<f64> = self
            .park
            .elements_by_type(ElementType::Bench)
            .map(|bench| self.score_bench(bench, regime))
            .collect();
        crate::types::mean(&scores)
    }

    /// Comfort of a single bench.
    pub fn bench_comfort(&self, bench: &ParkElement) -> f64 {
        self.score_bench(bench, self.regime())
    }

    /// Amenity comfort sampled over the park, indexed `[row][column]`
    /// with rows along `y`.
    pub fn heatmap(&self, resolution: usize) -> Vec<Vec<f64>> {
        let size = self.park.size();
        (0..resolution)
            .map(|i| {
                (0..resolution)
                    .map(|j| {
                        let x = (j as f64 / resolution as f64 - 0.5) * size;
                        let y = (i as f64 / resolution as f64 - 0.5) * size;
                        self.point_comfort(&Position::new(x, y))
                    })
                    .collect()
            })
            .collect()
    }

    /// Comfort at an arbitrary point: a base value plus a bonus for each
    /// amenity type within reach.
    pub fn point_comfort(&self, position: &Position) -> f64 {
        let nearby = self.park.elements_near(position, POINT_RADIUS);
        let bonus = [
            ElementType::Tree,
            ElementType::Fountain,
            ElementType::StreetLamp,
            ElementType::Bench,
        ]
        .iter()
        .filter(|t| nearby.iter().any(|e| e.element_type == **t))
        .count() as f64
            * POINT_AMENITY_BONUS;
        (POINT_BASE_COMFORT + bonus).min(1.0)
    }

    fn regime(&self) -> Regime {
        let thermal = self.park.thermal_config();
        let temperature = self.park.temperature();
        if temperature > thermal.comfortable.max {
            Regime::Hot(thermal.heat_factor(temperature))
        } else if temperature < thermal.comfortable.min {
            Regime::Cold(thermal.cold_factor(temperature))
        } else {
            Regime::Comfortable
        }
    }

    fn radius(&self, configured: f64) -> f64 {
        configured.max(self.config.comfort_min_radius_cells * self.park.cell_size())
    }

    fn has_nearby(&self, bench: &ParkElement, element_type: ElementType, radius: f64) -> bool {
        self.park
            .elements_by_type(element_type)
            .any(|e| e.position.distance_2d(&bench.position) <= radius)
    }

    fn score_bench(&self, bench: &ParkElement, regime: Regime) -> f64 {
        let tree = self.has_nearby(
            bench,
            ElementType::Tree,
            self.radius(self.config.comfort_tree_radius),
        );
        let fountain = self.has_nearby(
            bench,
            ElementType::Fountain,
            self.radius(self.config.comfort_fountain_radius),
        );
        let lamp = self.has_nearby(
            bench,
            ElementType::StreetLamp,
            self.radius(self.config.comfort_lamp_radius),
        );

        let mut comfort = self.config.bench_base_comfort;
        if tree {
            comfort += match regime {
                Regime::Cold(_) => 0.0,
                Regime::Comfortable => TREE_BONUS_COMFORTABLE,
                Regime::Hot(h) => TREE_BONUS_HOT + TREE_BONUS_HOT_SCALE * h,
            };
        }
        if fountain {
            comfort += match regime {
                Regime::Cold(_) => FOUNTAIN_BONUS_COLD,
                Regime::Comfortable => FOUNTAIN_BONUS_COMFORTABLE,
                Regime::Hot(h) => FOUNTAIN_BONUS_HOT + FOUNTAIN_BONUS_HOT_SCALE * h,
            };
        }
        if lamp {
            comfort += match regime {
                Regime::Cold(c) => LAMP_BONUS_COLD + LAMP_BONUS_COLD_SCALE * c,
                Regime::Comfortable => LAMP_BONUS_COMFORTABLE,
                Regime::Hot(_) => LAMP_BONUS_HOT,
            };
        }

        if tree && fountain && matches!(regime, Regime::Hot(_)) {
            comfort += COOLING_COMBO_BONUS;
        }
        if tree && lamp {
            comfort += SHADE_LIGHT_COMBO_BONUS;
        }
        if tree && fountain && lamp {
            comfort += FULL_SET_BONUS;
        }

        comfort.min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comfort_of(park: &Park) -> f64 {
        let config = MetricsConfig::default();
        ComfortCalculator::new(park, &config).total_comfort()
    }

    #[test]
    fn test_no_benches_scores_zero() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Tree, 0, 0);
        assert_eq!(comfort_of(&park), 0.0);
    }

    #[test]
    fn test_lonely_bench_scores_base() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Bench, 1, 1);
        assert!((comfort_of(&park) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_shade_bonus_grows_with_heat() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Bench, 1, 1);
        park.add_element(ElementType::Tree, 0, 0);

        park.set_temperature(25.0);
        let mild = comfort_of(&park);
        park.set_temperature(35.0);
        let hot = comfort_of(&park);
        park.set_temperature(5.0);
        let cold = comfort_of(&park);

        assert!((mild - 0.5).abs() < 1e-12);
        assert!((hot - 0.78).abs() < 1e-12);
        assert!((cold - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_lamp_valued_more_when_cold() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Bench, 1, 1);
        park.add_element(ElementType::StreetLamp, 1, 2);

        park.set_temperature(22.0);
        let mild = comfort_of(&park);
        park.set_temperature(0.0);
        let cold = comfort_of(&park);
        assert!(cold > mild);
    }

    #[test]
    fn test_combination_bonuses_are_capped() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.set_temperature(40.0);
        park.add_element(ElementType::Bench, 1, 1);
        park.add_element(ElementType::Tree, 0, 1);
        park.add_element(ElementType::Fountain, 1, 0);
        park.add_element(ElementType::StreetLamp, 2, 1);
        assert_eq!(comfort_of(&park), 1.0);
    }

    #[test]
    fn test_heatmap_shape_and_range() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.add_element(ElementType::Tree, 1, 1);
        let config = MetricsConfig::default();
        let map = ComfortCalculator::new(&park, &config).heatmap(10);
        assert_eq!(map.len(), 10);
        assert!(map.iter().all(|row| row.len() == 10));
        assert!(map.iter().flatten().all(|v| (0.2..=1.0).contains(v)));
        assert!((map[5][5] - 0.4).abs() < 1e-12);
    }
}
