//! 6-State Linear Kalman Filter for geodetic position fixes
//!
//! State Vector (6D):
//! [0-1]: Latitude, latitude rate
//! [2-3]: Longitude, longitude rate
//! [4-5]: Altitude, altitude rate
//!
//! Constant-velocity model with a time-varying interval between fixes.
//! The measurement observes the full state (H = I): positions come straight
//! from the fix, rates are finite differences against the previous fix.
//! Axes are independent; A, Q, R and therefore P stay block diagonal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{FilterConfig, IntervalPolicy};
use crate::error::{FilterError, Result};
use crate::types::{
    Fix, KalmanGain6, MeasurementVec6, StateMat6, StateVec6, ALT_POS, AXIS_COUNT, LAT_POS,
    LON_POS, STATE_DIM,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterSnapshot {
    /// Filtered (lat, lon, alt)
    pub position: (f64, f64, f64),

    /// Rate proxies per axis [units/s]
    pub velocity: (f64, f64, f64),

    pub covariance_trace: f64,
    pub covariance_diagonal: [f64; STATE_DIM],

    /// Accepted fixes since initialization (the first fix not counted)
    pub updates: u64,

    /// Timestamp of the last accepted fix
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct PositionFilter {
    config: FilterConfig,

    /// State vector x [6D]
    state: StateVec6,

    /// Covariance P [6x6]
    covariance: StateMat6,

    /// Prediction matrix A from the last cycle [6x6]
    transition: StateMat6,

    /// Process noise Q from the last cycle [6x6]
    process_noise: StateMat6,

    /// Measurement noise R, fixed at construction [6x6]
    measurement_noise: StateMat6,

    /// Measurement z from the last cycle [6D]
    measurement: MeasurementVec6,

    /// Previous accepted fix; its timestamp anchors the next interval
    last_fix: Fix,

    updates: u64,
}

/// Identity with each position row coupled to its rate by `dt`
pub fn transition_matrix(dt: f64) -> StateMat6 {
    let mut a = StateMat6::identity();
    for axis in 0..AXIS_COUNT {
        a[(2 * axis, 2 * axis + 1)] = dt;
    }
    a
}

/// Discretized white-noise acceleration, one 2x2 block per axis:
/// sigma * [[dt^4/4, dt^3/2], [dt^3/2, dt^2]]
pub fn process_noise_matrix(dt: f64, sigma: f64) -> StateMat6 {
    let dt2 = dt * dt;
    let q_pos = 0.25 * dt2 * dt2 * sigma;
    let q_cross = 0.5 * dt2 * dt * sigma;
    let q_vel = dt2 * sigma;

    let mut q = StateMat6::zeros();
    for axis in 0..AXIS_COUNT {
        let p = 2 * axis;
        let v = p + 1;
        q[(p, p)] = q_pos;
        q[(p, v)] = q_cross;
        q[(v, p)] = q_cross;
        q[(v, v)] = q_vel;
    }
    q
}

pub fn measurement_noise_matrix(r: f64) -> StateMat6 {
    StateMat6::from_diagonal_element(r)
}

/// Current coordinates interleaved with (previous - current) / dt per axis.
///
/// The rate is previous minus current, the reverse of a physical velocity.
pub fn measurement_vector(previous: &Fix, current: &Fix, dt: f64) -> MeasurementVec6 {
    let prev = previous.coordinates();
    let curr = current.coordinates();
    let mut z = MeasurementVec6::zeros();
    for axis in 0..AXIS_COUNT {
        z[2 * axis] = curr[axis];
        z[2 * axis + 1] = (prev[axis] - curr[axis]) / dt;
    }
    z
}

/// x = A x, P = A P A^T + Q
fn predict(
    state: &StateVec6,
    covariance: &StateMat6,
    transition: &StateMat6,
    process_noise: &StateMat6,
) -> (StateVec6, StateMat6) {
    let x_pred = transition * state;
    let p_pred = transition * covariance * transition.transpose() + process_noise;
    (x_pred, p_pred)
}

/// Full-state update with H = I; fails without side effects when S cannot be inverted.
fn update(
    x_pred: &StateVec6,
    p_pred: &StateMat6,
    measurement: &MeasurementVec6,
    measurement_noise: &StateMat6,
) -> Result<(StateVec6, StateMat6)> {
    let s = p_pred + measurement_noise;
    let s_inv = s
        .try_inverse()
        .ok_or(FilterError::NonInvertibleInnovationCovariance)?;
    if s_inv.iter().any(|v| !v.is_finite()) {
        return Err(FilterError::NonInvertibleInnovationCovariance);
    }

    let gain: KalmanGain6 = p_pred * s_inv;
    let innovation = measurement - x_pred;
    let x_post = x_pred + gain * innovation;
    let p_post = (StateMat6::identity() - gain) * p_pred;
    Ok((x_post, p_post))
}

impl PositionFilter {
    /// Initialize from the first fix: zero rates, zero covariance.
    pub fn new(first_fix: Fix, config: FilterConfig) -> Result<Self> {
        config.validate()?;
        first_fix.validate()?;

        let state = Self::initial_state(&first_fix);
        log::info!(
            "Position filter initialized at ({:.6}, {:.6}, {:.1})",
            first_fix.latitude,
            first_fix.longitude,
            first_fix.altitude
        );

        Ok(Self {
            measurement_noise: measurement_noise_matrix(config.measurement_noise),
            config,
            state,
            covariance: StateMat6::zeros(),
            transition: StateMat6::identity(),
            process_noise: StateMat6::zeros(),
            measurement: state,
            last_fix: first_fix,
            updates: 0,
        })
    }

    fn initial_state(fix: &Fix) -> StateVec6 {
        let mut x = StateVec6::zeros();
        x[LAT_POS] = fix.latitude;
        x[LON_POS] = fix.longitude;
        x[ALT_POS] = fix.altitude;
        x
    }

    /// Restart on a new trajectory, keeping the configuration.
    pub fn reset(&mut self, first_fix: Fix) -> Result<()> {
        first_fix.validate()?;
        let state = Self::initial_state(&first_fix);
        self.state = state;
        self.covariance = StateMat6::zeros();
        self.transition = StateMat6::identity();
        self.process_noise = StateMat6::zeros();
        self.measurement = state;
        self.last_fix = first_fix;
        self.updates = 0;
        log::info!("Position filter reset");
        Ok(())
    }

    /// Interval to `fix` after applying the configured policy
    fn interval_to(&self, fix: &Fix) -> Result<f64> {
        let dt = fix.seconds_since(&self.last_fix);
        match self.config.interval_policy {
            IntervalPolicy::Reject if dt <= 0.0 => Err(FilterError::DegenerateInterval { dt }),
            IntervalPolicy::Clamp { min_interval } if dt < min_interval => {
                log::debug!("Clamping interval {:.6}s to {:.6}s", dt, min_interval);
                Ok(min_interval)
            }
            _ => Ok(dt),
        }
    }

    /// Run one predict/update cycle and return the corrected fix.
    ///
    /// Every failure is detected before the filter is touched, so on `Err`
    /// the previous state, covariance and reference fix are still in place.
    pub fn process(&mut self, fix: &Fix) -> Result<Fix> {
        fix.validate()?;
        let dt = self.interval_to(fix)?;

        let transition = transition_matrix(dt);
        let process_noise = process_noise_matrix(dt, self.config.acceleration_variance);
        let measurement = measurement_vector(&self.last_fix, fix, dt);

        let (x_pred, p_pred) = predict(&self.state, &self.covariance, &transition, &process_noise);
        let (x_post, p_post) = update(&x_pred, &p_pred, &measurement, &self.measurement_noise)?;

        if x_post.iter().chain(p_post.iter()).any(|v| !v.is_finite()) {
            return Err(FilterError::NonFiniteState);
        }

        log::debug!(
            "dt={:.3}s innovation={:.3e} trace(P)={:.4e}",
            dt,
            (measurement - x_pred).norm(),
            p_post.trace()
        );

        self.state = x_post;
        self.covariance = p_post;
        self.transition = transition;
        self.process_noise = process_noise;
        self.measurement = measurement;
        self.last_fix = fix.clone();
        self.updates += 1;

        Ok(fix.with_coordinates(x_post[LAT_POS], x_post[LON_POS], x_post[ALT_POS]))
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn state(&self) -> &StateVec6 {
        &self.state
    }

    pub fn covariance(&self) -> &StateMat6 {
        &self.covariance
    }

    pub fn transition(&self) -> &StateMat6 {
        &self.transition
    }

    pub fn process_noise(&self) -> &StateMat6 {
        &self.process_noise
    }

    pub fn measurement_noise(&self) -> &StateMat6 {
        &self.measurement_noise
    }

    pub fn measurement(&self) -> &MeasurementVec6 {
        &self.measurement
    }

    pub fn last_fix(&self) -> &Fix {
        &self.last_fix
    }

    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Filtered (lat, lon, alt)
    pub fn position(&self) -> (f64, f64, f64) {
        (self.state[LAT_POS], self.state[LON_POS], self.state[ALT_POS])
    }

    /// Rate proxies in the measurement's sign convention
    pub fn velocity(&self) -> (f64, f64, f64) {
        (
            self.state[LAT_POS + 1],
            self.state[LON_POS + 1],
            self.state[ALT_POS + 1],
        )
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        let mut covariance_diagonal = [0.0; STATE_DIM];
        for (i, slot) in covariance_diagonal.iter_mut().enumerate() {
            *slot = self.covariance[(i, i)];
        }

        FilterSnapshot {
            position: self.position(),
            velocity: self.velocity(),
            covariance_trace: self.covariance.trace(),
            covariance_diagonal,
            updates: self.updates,
            timestamp: self.last_fix.timestamp,
        }
    }
}
