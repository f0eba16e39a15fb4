//! Linear algebra type system for the position filter
//!
//! Provides compile-time dimension checking and clean type aliases
//! for the 6-state constant-velocity model.

use nalgebra::{SMatrix, SVector};

// ===== State Dimensions =====
pub const STATE_DIM: usize = 6;
pub const AXIS_COUNT: usize = 3; // latitude, longitude, altitude

// Row of each axis' position component; velocity sits at AXIS_POS + 1
pub const LAT_POS: usize = 0;
pub const LON_POS: usize = 2;
pub const ALT_POS: usize = 4;

// ===== 6-State Filter Types =====
pub type StateVec6 = SVector<f64, STATE_DIM>;
pub type StateMat6 = SMatrix<f64, STATE_DIM, STATE_DIM>;

// H = I, so the measurement space is the state space
pub type MeasurementVec6 = StateVec6;
pub type KalmanGain6 = StateMat6;
