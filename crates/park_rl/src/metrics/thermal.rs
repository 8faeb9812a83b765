//! Park-wide thermal comfort.

use crate::environment::Park;

/// Mean thermal comfort over the park's sampled thermal field.
pub fn thermal_comfort_score(park: &Park) -> f64 {
    park.thermal_zones().mean_comfort()
}

/// Fraction of the park at full thermal comfort.
pub fn comfortable_area(park: &Park) -> f64 {
    park.thermal_zones().comfortable_fraction()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::ElementType;

    #[test]
    fn test_comfortable_day_scores_one() {
        let park = Park::new(30.0, 3).unwrap();
        assert_eq!(thermal_comfort_score(&park), 1.0);
        assert_eq!(comfortable_area(&park), 1.0);
    }

    #[test]
    fn test_amenities_improve_hot_day() {
        let mut park = Park::new(30.0, 3).unwrap();
        park.set_temperature(32.0);
        let bare = thermal_comfort_score(&park);
        park.add_element(ElementType::Fountain, 1, 1);
        park.add_element(ElementType::Tree, 0, 0);
        let cooled = thermal_comfort_score(&park);
        assert!(cooled > bare);
        assert!(cooled <= 1.0);
    }
}
