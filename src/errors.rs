use crate::map::Cell;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TerrapathError {
    // Field construction errors
    #[error("Invalid field dimensions: {reason}")]
    InvalidDimensions { reason: String },

    #[error("Invalid generation config: {reason}")]
    InvalidConfig { reason: String },

    // Search errors
    #[error("Cell {cell} is outside the {width}x{height} field")]
    CellOutOfBounds { cell: Cell, width: u32, height: u32 },

    #[error("{role} cell {cell} is on impassable terrain")]
    ImpassableEndpoint { role: &'static str, cell: Cell },

    #[error("No path found from {start} to {goal}")]
    NoPathFound { start: Cell, goal: Cell },

    // Config file errors
    #[error("Failed to read config file: {0}")]
    ConfigReadFailed(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParseFailed(#[from] toml::de::Error),

    #[error("Config file not found at path: {path}")]
    ConfigFileNotFound { path: PathBuf },
}

/// Result type alias for all operations
pub type TerrapathResult<T> = Result<T, TerrapathError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrapath_error_display() {
        let err = TerrapathError::NoPathFound {
            start: Cell::new(0, 0),
            goal: Cell::new(5, 5),
        };
        assert_eq!(err.to_string(), "No path found from (0, 0) to (5, 5)");

        let err = TerrapathError::CellOutOfBounds {
            cell: Cell::new(60, 2),
            width: 60,
            height: 60,
        };
        assert!(err.to_string().contains("outside the 60x60 field"));

        let err = TerrapathError::ImpassableEndpoint {
            role: "start",
            cell: Cell::new(1, 1),
        };
        assert!(err.to_string().contains("start cell (1, 1)"));
    }
}
