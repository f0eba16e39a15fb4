//! Linear Kalman smoothing for intermittent geodetic position fixes.
//!
//! [`PositionFilter`] tracks latitude, longitude and altitude with a
//! per-axis constant-velocity model and corrects each fix as it arrives.
//! [`TrackSmoother`] wraps it for callers that start without a first fix.

pub mod config;
pub mod error;
pub mod filters;
pub mod smoothing;
pub mod types;

pub use config::{FilterConfig, IntervalPolicy};
pub use error::{FilterError, Result};
pub use filters::{FilterSnapshot, PositionFilter};
pub use smoothing::TrackSmoother;
pub use types::Fix;
