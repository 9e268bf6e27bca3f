use crate::utils::error::Result;
use crate::utils::validation::validate_wait_bounds;
use rand::Rng;
use std::time::Duration;

/// Think-time between two operations of the same user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    min: Duration,
    max: Duration,
}

impl WaitTime {
    pub fn between(min: Duration, max: Duration) -> Result<Self> {
        validate_wait_bounds(min, max)?;
        Ok(Self { min, max })
    }

    pub fn constant(wait: Duration) -> Self {
        Self {
            min: wait,
            max: wait,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Uniform sample in `[min, max]`, millisecond resolution.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let low = self.min.as_millis() as u64;
        let high = self.max.as_millis() as u64;
        if high <= low {
            return self.min;
        }
        Duration::from_millis(rng.gen_range(low..=high)).clamp(self.min, self.max)
    }
}

impl Default for WaitTime {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(5),
            max: Duration::from_secs(15),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_samples_stay_between_five_and_fifteen_seconds() {
        let wait = WaitTime::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut saw_low_half = false;
        let mut saw_high_half = false;

        for _ in 0..10_000 {
            let sample = wait.sample(&mut rng);
            assert!(sample >= Duration::from_secs(5));
            assert!(sample <= Duration::from_secs(15));
            saw_low_half |= sample < Duration::from_secs(10);
            saw_high_half |= sample > Duration::from_secs(10);
        }

        assert!(saw_low_half && saw_high_half);
    }

    #[test]
    fn test_between_rejects_inverted_bounds() {
        assert!(WaitTime::between(Duration::from_secs(15), Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_constant_always_returns_same_value() {
        let wait = WaitTime::constant(Duration::from_millis(250));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(wait.sample(&mut rng), Duration::from_millis(250));
        }
    }

    #[test]
    fn test_sub_millisecond_bounds_keep_min() {
        let wait = WaitTime::between(Duration::from_micros(100), Duration::from_micros(900)).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let sample = wait.sample(&mut rng);
        assert!(sample >= wait.min() && sample <= wait.max());
    }
}
