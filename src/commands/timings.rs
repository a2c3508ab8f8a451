use std::time::Duration;

/// Delays and failure odds of the built-in commands.
///
/// Defaults: 2s and 1s serial steps, 2s and 1s concurrent steps, a 5s legacy
/// callback, a 2s data load failing half the time, a 5s status refresh, a 2s
/// background load and a 1s count load. Use [`Timings::scaled`] to speed a
/// demo up or [`Timings::instant`] in tests.
#[derive(Clone, Debug, PartialEq)]
pub struct Timings {
    /// Duration of "Serial Task 1".
    pub serial_first: Duration,
    /// Duration of "Serial Task 2".
    pub serial_second: Duration,
    /// Duration of "Concurrent Task 1".
    pub concurrent_first: Duration,
    /// Duration of "Concurrent Task 2".
    pub concurrent_second: Duration,
    /// Delay before the legacy API calls back.
    pub legacy_fetch: Duration,
    /// Duration of the data load.
    pub load_data: Duration,
    /// Duration of the status refresh.
    pub refresh_status: Duration,
    /// Duration of the background load.
    pub background: Duration,
    /// Duration of the count load.
    pub load_count: Duration,
    /// Probability in `[0, 1]` that the data load fails.
    pub failure_rate: f64,
}

impl Timings {
    /// Every delay multiplied by `factor`.
    ///
    /// Negative and NaN factors count as zero; products too large for a
    /// [`Duration`] saturate at [`Duration::MAX`]. `failure_rate` is kept.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use tasklane::Timings;
    ///
    /// let fast = Timings::default().scaled(0.1);
    /// assert_eq!(fast.legacy_fetch, Duration::from_millis(500));
    /// assert_eq!(fast.failure_rate, 0.5);
    /// ```
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        let s = |d: Duration| scale(d, factor);
        Self {
            serial_first: s(self.serial_first),
            serial_second: s(self.serial_second),
            concurrent_first: s(self.concurrent_first),
            concurrent_second: s(self.concurrent_second),
            legacy_fetch: s(self.legacy_fetch),
            load_data: s(self.load_data),
            refresh_status: s(self.refresh_status),
            background: s(self.background),
            load_count: s(self.load_count),
            failure_rate: self.failure_rate,
        }
    }

    /// Default odds, no delays.
    pub fn instant() -> Self {
        Self::default().scaled(0.0)
    }

    /// `failure_rate` clamped to `[0, 1]`; NaN counts as 0.
    pub fn failure_probability(&self) -> f64 {
        if self.failure_rate.is_nan() {
            0.0
        } else {
            self.failure_rate.clamp(0.0, 1.0)
        }
    }
}

fn scale(d: Duration, factor: f64) -> Duration {
    if d.is_zero() || factor == 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(d.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            serial_first: Duration::from_secs(2),
            serial_second: Duration::from_secs(1),
            concurrent_first: Duration::from_secs(2),
            concurrent_second: Duration::from_secs(1),
            legacy_fetch: Duration::from_secs(5),
            load_data: Duration::from_secs(2),
            refresh_status: Duration::from_secs(5),
            background: Duration::from_secs(2),
            load_count: Duration::from_secs(1),
            failure_rate: 0.5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_factor_is_zero() {
        let t = Timings::default().scaled(-3.0);
        assert_eq!(t, Timings::instant());
        assert_eq!(t.serial_first, Duration::ZERO);
    }

    #[test]
    fn huge_factors_saturate() {
        let t = Timings::default().scaled(1e20);
        assert_eq!(t.legacy_fetch, Duration::MAX);

        let t = Timings::default().scaled(f64::INFINITY);
        assert_eq!(t.serial_first, Duration::MAX);
        assert_eq!(Timings::instant().scaled(f64::INFINITY), Timings::instant());

        assert_eq!(Timings::default().scaled(f64::NAN), Timings::instant());
    }

    #[test]
    fn failure_probability_is_clamped() {
        let mut t = Timings::default();
        t.failure_rate = 1.7;
        assert_eq!(t.failure_probability(), 1.0);
        t.failure_rate = f64::NAN;
        assert_eq!(t.failure_probability(), 0.0);
    }
}
