use crate::clock::ClockSource;
use crate::error::Error;
use crate::sampling;

/// Back-to-back reads averaged for the noise floor.
pub const DEFAULT_ITERATIONS: usize = 1_000_000;

/// Factor applied to the mean delta so ordinary noise stays below the
/// baseline.
pub const DEFAULT_HEADROOM: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselinePolicy {
    pub iterations: usize,
    pub headroom: f64,
}

impl Default for BaselinePolicy {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            headroom: DEFAULT_HEADROOM,
        }
    }
}

/// Noise floor for one run: `value = mean * headroom`, truncated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub mean: i64,
    pub headroom: f64,
    pub value: i64,
}

/// Mean delta over `iterations` back-to-back reads, truncated toward zero.
pub fn mean_delta(clock: &mut ClockSource, iterations: usize) -> Result<i64, Error> {
    if iterations == 0 {
        return Err(Error::InvalidArgs(
            "baseline iterations must be greater than 0".into(),
        ));
    }
    let sum: i64 = sampling::deltas(clock, iterations).fold(0i64, |acc, d| acc.wrapping_add(d));
    Ok((sum as f64 / iterations as f64) as i64)
}

pub fn estimate(clock: &mut ClockSource, policy: &BaselinePolicy) -> Result<Baseline, Error> {
    if !policy.headroom.is_finite() || policy.headroom <= 0.0 {
        return Err(Error::InvalidArgs(format!(
            "baseline headroom must be positive, got {}",
            policy.headroom
        )));
    }
    let mean = mean_delta(clock, policy.iterations)?;
    let value = (mean as f64 * policy.headroom) as i64;
    log::debug!(
        "baseline: mean {} x headroom {} = {} over {} reads",
        mean,
        policy.headroom,
        value,
        policy.iterations
    );
    Ok(Baseline {
        mean,
        headroom: policy.headroom,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restarted() -> ClockSource {
        let mut clock = ClockSource::deterministic();
        clock.restart();
        clock
    }

    #[test]
    fn test_mean_delta() {
        // 1+2+4+8+16+32+10+10+10+10 = 103
        assert_eq!(mean_delta(&mut restarted(), 10).unwrap(), 10);
        // 1+2+4+8 = 15
        assert_eq!(mean_delta(&mut restarted(), 4).unwrap(), 3);
    }

    #[test]
    fn test_headroom_applied() {
        let policy = BaselinePolicy {
            iterations: 10,
            headroom: 2.0,
        };
        let b = estimate(&mut restarted(), &policy).unwrap();
        assert_eq!(b.mean, 10);
        assert_eq!(b.value, 20);
    }

    #[test]
    fn test_raw_mean_policy() {
        let policy = BaselinePolicy {
            iterations: 10,
            headroom: 1.0,
        };
        let b = estimate(&mut restarted(), &policy).unwrap();
        assert_eq!(b.value, b.mean);
    }

    #[test]
    fn test_rejects_bad_policy() {
        let mut clock = restarted();
        let zero_iter = BaselinePolicy {
            iterations: 0,
            headroom: 2.0,
        };
        assert!(estimate(&mut clock, &zero_iter).is_err());
        let bad_headroom = BaselinePolicy {
            iterations: 10,
            headroom: f64::NAN,
        };
        assert!(estimate(&mut clock, &bad_headroom).is_err());
    }

    #[test]
    fn test_default_policy() {
        let p = BaselinePolicy::default();
        assert_eq!(p.iterations, 1_000_000);
        assert_eq!(p.headroom, 2.0);
    }

    #[test]
    fn test_default_run_on_mock() {
        // Long run is dominated by the +10 steps.
        let b = estimate(&mut restarted(), &BaselinePolicy::default()).unwrap();
        assert_eq!(b.mean, 10);
        assert_eq!(b.value, 20);
    }
}
