//! Park elements and their type catalogue.

use crate::types::{Position, Rgb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kinds of amenity that can occupy a grid cell.
///
/// `GrassPatch` and `Pathway` are legacy variants: they still deserialize from
/// saved parks but are never offered as placement actions or generated at
/// random.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "bench")]
    Bench,
    #[serde(rename = "tree")]
    Tree,
    #[serde(rename = "fountain")]
    Fountain,
    #[serde(rename = "lamp")]
    StreetLamp,
    #[serde(rename = "grass")]
    GrassPatch,
    #[serde(rename = "pathway")]
    Pathway,
}

impl ElementType {
    /// Every representable type, in canonical order.
    pub const ALL: [ElementType; 6] = [
        ElementType::Bench,
        ElementType::Tree,
        ElementType::Fountain,
        ElementType::StreetLamp,
        ElementType::GrassPatch,
        ElementType::Pathway,
    ];

    /// Types offered to the placement policy and to random design generation.
    pub const ACTIVE: [ElementType; 4] = [
        ElementType::Bench,
        ElementType::Tree,
        ElementType::Fountain,
        ElementType::StreetLamp,
    ];

    /// Returns `false` for the legacy variants.
    pub fn is_placeable(&self) -> bool {
        !matches!(self, ElementType::GrassPatch | ElementType::Pathway)
    }

    /// Position in [`ALL`](Self::ALL), used for per-type counters.
    pub fn index(&self) -> usize {
        match self {
            ElementType::Bench => 0,
            ElementType::Tree => 1,
            ElementType::Fountain => 2,
            ElementType::StreetLamp => 3,
            ElementType::GrassPatch => 4,
            ElementType::Pathway => 5,
        }
    }

    /// Cell code used by the state encoder; `0` is reserved for an empty cell.
    pub fn state_code(&self) -> i32 {
        self.index() as i32 + 1
    }

    /// Stable string name, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Bench => "bench",
            ElementType::Tree => "tree",
            ElementType::Fountain => "fountain",
            ElementType::StreetLamp => "lamp",
            ElementType::GrassPatch => "grass",
            ElementType::Pathway => "pathway",
        }
    }

    pub fn from_name(name: &str) -> Option<ElementType> {
        ElementType::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Display colour.
    pub fn default_color(&self) -> Rgb {
        match self {
            ElementType::Bench => Rgb(139, 69, 19),
            ElementType::Tree => Rgb(34, 139, 34),
            ElementType::Fountain => Rgb(64, 164, 223),
            ElementType::StreetLamp => Rgb(255, 223, 0),
            ElementType::GrassPatch => Rgb(124, 252, 0),
            ElementType::Pathway => Rgb(128, 128, 128),
        }
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier assigned by [`Park`](super::Park), increasing for the lifetime of the park.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An amenity placed in the park.
///
/// Elements are created only by [`Park::add_element`](super::Park::add_element)
/// and live in the park's element list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkElement {
    pub id: ElementId,
    pub element_type: ElementType,
    /// Center of the occupied cell, in world coordinates.
    pub position: Position,
    /// Diameter in meters.
    pub size: f64,
    pub color: Rgb,
    pub is_active: bool,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ParkElement {
    /// Axis-aligned bounds as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let half = self.size / 2.0;
        (
            self.position.x - half,
            self.position.y - half,
            self.position.x + half,
            self.position.y + half,
        )
    }

    pub fn contains_point(&self, point: &Position) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        (min_x..=max_x).contains(&point.x) && (min_y..=max_y).contains(&point.y)
    }

    /// Half the element's size.
    pub fn radius(&self) -> f64 {
        self.size / 2.0
    }

    pub fn to_snapshot(&self) -> ElementSnapshot {
        ElementSnapshot {
            element_type: self.element_type,
            position: self.position.to_tuple(),
            size: self.size,
            color: self.color.into(),
            is_active: self.is_active,
            metadata: self.metadata.clone(),
        }
    }
}

/// Serialized form of a [`ParkElement`]. Ids are not persisted; they are
/// reassigned when a snapshot is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub position: (f64, f64, f64),
    pub size: f64,
    pub color: (u8, u8, u8),
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_types_exclude_legacy() {
        assert_eq!(ElementType::ACTIVE.len(), 4);
        assert!(ElementType::ACTIVE.iter().all(|t| t.is_placeable()));
        assert!(!ElementType::GrassPatch.is_placeable());
        assert!(!ElementType::Pathway.is_placeable());
    }

    #[test]
    fn test_state_codes_are_distinct_and_nonzero() {
        let codes: Vec<i32> = ElementType::ALL.iter().map(|t| t.state_code()).collect();
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&ElementType::StreetLamp).unwrap(),
            "\"lamp\""
        );
        let legacy: ElementType = serde_json::from_str("\"grass\"").unwrap();
        assert_eq!(legacy, ElementType::GrassPatch);
        for t in ElementType::ALL {
            assert_eq!(ElementType::from_name(t.as_str()), Some(t));
        }
        assert_eq!(ElementType::from_name("empty"), None);
    }

    #[test]
    fn test_bounds_and_contains() {
        let element = ParkElement {
            id: ElementId(0),
            element_type: ElementType::Fountain,
            position: Position::new(5.0, -5.0),
            size: 4.0,
            color: ElementType::Fountain.default_color(),
            is_active: true,
            metadata: BTreeMap::new(),
        };
        assert_eq!(element.bounds(), (3.0, -7.0, 7.0, -3.0));
        assert!(element.contains_point(&Position::new(6.0, -4.0)));
        assert!(!element.contains_point(&Position::new(8.0, -4.0)));
    }

    #[test]
    fn test_snapshot_defaults_for_missing_fields() {
        let snapshot: ElementSnapshot = serde_json::from_str(
            r#"{"type":"pathway","position":[0.0,0.0,0.0],"size":3.0,"color":[128,128,128]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.element_type, ElementType::Pathway);
        assert!(snapshot.is_active);
        assert!(snapshot.metadata.is_empty());
    }
}
