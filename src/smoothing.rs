use crate::config::FilterConfig;
use crate::error::Result;
use crate::filters::PositionFilter;
use crate::types::Fix;

/// Fix-by-fix smoothing for a single trajectory
///
/// Starts uninitialized; the first valid fix seeds the filter and is returned
/// as-is, every later fix goes through a full predict/update cycle.
pub struct TrackSmoother {
    config: FilterConfig,
    filter: Option<PositionFilter>,
    accepted: u64,
    rejected: u64,
}

impl TrackSmoother {
    pub fn new(config: FilterConfig) -> Self {
        TrackSmoother {
            config,
            filter: None,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Smooth one fix. Rejected fixes leave the smoother as it was.
    pub fn apply(&mut self, fix: &Fix) -> Result<Fix> {
        let result = match self.filter.as_mut() {
            Some(filter) => filter.process(fix),
            None => match PositionFilter::new(fix.clone(), self.config.clone()) {
                Ok(filter) => {
                    self.filter = Some(filter);
                    Ok(fix.clone())
                }
                Err(e) => Err(e),
            },
        };

        match &result {
            Ok(_) => self.accepted += 1,
            Err(e) => {
                self.rejected += 1;
                log::warn!("Rejected fix at {}: {}", fix.timestamp, e);
            }
        }
        result
    }

    /// Smooth a whole track in order, dropping fixes the filter rejects
    pub fn smooth_all<'a, I>(&mut self, fixes: I) -> Vec<Fix>
    where
        I: IntoIterator<Item = &'a Fix>,
    {
        fixes
            .into_iter()
            .filter_map(|fix| self.apply(fix).ok())
            .collect()
    }

    /// Forget the trajectory; the next fix starts a new one
    pub fn reset(&mut self) {
        self.filter = None;
        self.accepted = 0;
        self.rejected = 0;
    }

    pub fn is_ready(&self) -> bool {
        self.filter.is_some()
    }

    pub fn filter(&self) -> Option<&PositionFilter> {
        self.filter.as_ref()
    }

    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    #[test]
    fn test_first_fix_initializes() {
        init_logger();
        let mut smoother = TrackSmoother::new(FilterConfig::default());
        assert!(!smoother.is_ready());

        let first = Fix::new(45.0, 15.0, 100.0, at(0)).with_speed(2.0, 0.5);
        let out = smoother.apply(&first).unwrap();
        assert_eq!(out, first);
        assert!(smoother.is_ready());
        assert_eq!(smoother.accepted(), 1);
        assert_eq!(smoother.filter().map(|f| f.update_count()), Some(0));
    }

    #[test]
    fn test_invalid_first_fix_stays_uninitialized() {
        init_logger();
        let mut smoother = TrackSmoother::new(FilterConfig::default());
        let result = smoother.apply(&Fix::new(f64::NAN, 15.0, 100.0, at(0)));

        assert!(matches!(result, Err(FilterError::InvalidCoordinate { .. })));
        assert!(!smoother.is_ready());
        assert_eq!(smoother.rejected(), 1);
    }

    #[test]
    fn test_subsequent_fixes_are_filtered() {
        init_logger();
        let mut smoother = TrackSmoother::new(FilterConfig::default());
        smoother.apply(&Fix::new(45.0, 15.0, 100.0, at(0))).unwrap();
        let out = smoother.apply(&Fix::new(45.0001, 15.0001, 101.0, at(1))).unwrap();

        // Heavily damped against the raw fix with r = 29
        assert!((out.altitude - 101.0).abs() > 0.5);
        assert_eq!(smoother.filter().map(|f| f.update_count()), Some(1));
    }

    #[test]
    fn test_smooth_all_drops_rejected() {
        init_logger();
        let track = vec![
            Fix::new(45.0, 15.0, 100.0, at(0)),
            Fix::new(45.0, 15.0, 100.0, at(1)),
            Fix::new(45.0, 15.0, 100.0, at(1)), // duplicate timestamp
            Fix::new(45.0, f64::INFINITY, 100.0, at(2)),
            Fix::new(45.0, 15.0, 100.0, at(3)),
        ];

        let mut smoother = TrackSmoother::new(FilterConfig::default());
        let smoothed = smoother.smooth_all(&track);

        assert_eq!(smoothed.len(), 3);
        assert_eq!(smoother.accepted(), 3);
        assert_eq!(smoother.rejected(), 2);
        assert_eq!(smoothed[2].timestamp, at(3));
        for fix in &smoothed {
            assert!((fix.latitude - 45.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_reset() {
        init_logger();
        let mut smoother = TrackSmoother::new(FilterConfig::default());
        smoother.apply(&Fix::new(45.0, 15.0, 100.0, at(10))).unwrap();
        smoother.reset();
        assert!(!smoother.is_ready());
        assert_eq!(smoother.accepted(), 0);

        // An earlier timestamp is fine once the trajectory is forgotten
        let out = smoother.apply(&Fix::new(10.0, 20.0, 30.0, at(0))).unwrap();
        assert_eq!(out.latitude, 10.0);
    }
}
