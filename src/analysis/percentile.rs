use crate::clock::ClockSource;
use crate::error::Error;
use crate::sampling;

/// Percentile fractions reported when none are configured.
pub const DEFAULT_FRACTIONS: [f64; 7] = [0.50, 0.9, 0.99, 0.999, 0.9999, 0.99999, 0.999999];

/// The delta at a percentile rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentile {
    pub fraction: f64,
    pub value: i64,
}

/// A run's deltas sorted ascending, plus the first few in sampling order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub first: Vec<i64>,
    pub sorted: Vec<i64>,
}

/// Samples `n` deltas and returns them sorted ascending.
pub fn collect(clock: &mut ClockSource, n: usize) -> Result<Vec<i64>, Error> {
    Ok(distribution(clock, n, 0)?.sorted)
}

/// Samples `n` deltas, keeps the first `head` in sampling order, and sorts
/// the rest once sampling is over.
pub fn distribution(clock: &mut ClockSource, n: usize, head: usize) -> Result<Distribution, Error> {
    if n == 0 {
        return Err(Error::InvalidArgs(
            "number of iterations must be greater than 0".into(),
        ));
    }
    let mut sorted = sampling::record(clock, n);
    let first = sorted[..head.min(n)].to_vec();
    sorted.sort_unstable();
    Ok(Distribution { first, sorted })
}

/// Index of `fraction` in a sorted sequence of `len` values: floor(len * p).
fn rank(len: usize, fraction: f64) -> usize {
    (len as f64 * fraction) as usize
}

/// Looks up each fraction in `sorted` by nearest-lower rank, without
/// interpolation.
pub fn extract(sorted: &[i64], fractions: &[f64]) -> Result<Vec<Percentile>, Error> {
    fractions
        .iter()
        .map(|&fraction| {
            if !(0.0..1.0).contains(&fraction) {
                return Err(Error::InvalidArgs(format!(
                    "percentile {} outside [0, 1)",
                    fraction
                )));
            }
            let idx = rank(sorted.len(), fraction);
            let value = *sorted.get(idx).ok_or_else(|| {
                Error::InvalidArgs(format!(
                    "{} iterations are too few for percentile {}",
                    sorted.len(),
                    fraction
                ))
            })?;
            Ok(Percentile { fraction, value })
        })
        .collect()
}

/// The `count` largest values of an ascending slice, largest first.
pub fn largest(sorted: &[i64], count: usize) -> Vec<i64> {
    sorted.iter().rev().take(count).copied().collect()
}
