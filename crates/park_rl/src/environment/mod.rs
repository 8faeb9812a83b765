//! The park environment: placement grid, elements and the thermal field.

pub mod element;
pub mod grid;
pub mod park;
pub mod thermal;

pub use element::{ElementId, ElementSnapshot, ElementType, ParkElement};
pub use grid::GridStats;
pub use park::{Park, ParkSnapshot};
pub use thermal::ThermalZones;
