//! Error types for the park design crate.
//!
//! Only conditions the caller has to act on are errors. Rejected placements,
//! an exhausted action space and stuck pedestrians are ordinary outcomes and
//! are reported through `Option`/`bool` returns instead.

use thiserror::Error;

/// A specialized `Result` type for park design operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error enum for all fallible operations within `park_rl`.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is out of range or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested grid size cannot hold any cell.
    #[error("Invalid grid size: {0}")]
    InvalidGridSize(usize),

    /// The grid still holds elements and cannot be resized.
    #[error("Cannot resize a populated grid ({elements} elements placed)")]
    GridNotEmpty {
        /// Number of elements still placed on the grid.
        elements: usize,
    },

    /// A persisted park snapshot is malformed.
    #[error("Invalid park snapshot: {0}")]
    InvalidSnapshot(String),

    /// A persisted model was produced for a different action space.
    #[error("Incompatible model: expected action space of {expected}, found {found}")]
    IncompatibleModel {
        /// Action space size of the current configuration.
        expected: usize,
        /// Action space size recorded in the model.
        found: usize,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TOML configuration file could not be parsed.
    #[error("Config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// A configuration could not be rendered as TOML.
    #[error("Config encode error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// Returns `true` for errors caused by reading persisted state, as opposed
    /// to a bad request from the caller.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::InvalidSnapshot(_) | Error::IncompatibleModel { .. } | Error::Io(_) | Error::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors = vec![
            (Error::Config("bad range".into()), "Configuration error: bad range"),
            (Error::InvalidGridSize(0), "Invalid grid size: 0"),
            (
                Error::GridNotEmpty { elements: 3 },
                "Cannot resize a populated grid (3 elements placed)",
            ),
            (
                Error::IncompatibleModel {
                    expected: 36,
                    found: 100,
                },
                "Incompatible model: expected action space of 36, found 100",
            ),
        ];

        for (error, expected) in errors {
            assert_eq!(format!("{}", error), expected);
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{invalid}");
        let error: Error = json_result.unwrap_err().into();
        assert!(matches!(error, Error::Json(_)));
        assert!(error.is_persistence());
    }

    #[test]
    fn test_config_error_is_not_persistence() {
        assert!(!Error::Config("x".into()).is_persistence());
        assert!(!Error::GridNotEmpty { elements: 1 }.is_persistence());
    }
}
