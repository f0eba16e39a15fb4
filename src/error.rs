use thiserror::Error;

/// Position filter error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Degenerate interval: {dt}s since previous fix")]
    DegenerateInterval { dt: f64 },

    #[error("Innovation covariance is singular")]
    NonInvertibleInnovationCovariance,

    #[error("Invalid coordinate: {field} = {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Posterior state is not finite")]
    NonFiniteState,
}

/// Result type for filter operations
pub type Result<T> = std::result::Result<T, FilterError>;

impl FilterError {
    /// True when the fix itself was bad and the filter may keep running
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            FilterError::DegenerateInterval { .. } | FilterError::InvalidCoordinate { .. }
        )
    }
}
