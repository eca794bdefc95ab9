//! Error types for graph engine operations.
//!
//! All fallible operations return `GraphResult<T>`. Errors carry enough
//! context to tell a caller whether the input or the configuration was wrong.

use thiserror::Error;

/// Result type alias for graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Error type for graph engine operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    // ========== Configuration Errors ==========
    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========== Vector Errors ==========
    /// Vector dimension does not match the graph's fixed dimension.
    ///
    /// The dimension is fixed by the first vector inserted or loaded.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Zero-length vector.
    #[error("Empty vector: vectors must have at least one component")]
    EmptyVector,

    /// Vector contains NaN or infinite components.
    #[error("Invalid vector: component {index} is not finite ({value})")]
    NonFiniteComponent { index: usize, value: f32 },

    // ========== Graph Structure Errors ==========
    /// Node not found in graph.
    #[error("Node not found: {0}")]
    NodeNotFound(u64),
}
