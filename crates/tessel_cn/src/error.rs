//! Error types for tessel_cn

use thiserror::Error;

/// Failure to start position tracking for a floating panel
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// The positioning backend refused to track
    #[error("position service unavailable: {0}")]
    Unavailable(String),
}
