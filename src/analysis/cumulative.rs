//! Baseline-corrected aggregation of clock jumps.
//!
//! Only steps whose delta exceeds the baseline are recorded, together with
//! the reading they started from. From those records two reports are
//! derived: the largest individual excesses, and the largest sums of excess
//! falling into a fixed-length time window.

use std::slice;

use super::baseline::{self, Baseline, BaselinePolicy};
use super::topk::TopK;
use crate::clock::ClockSource;
use crate::error::Error;
use crate::sampling::Steps;

/// A step that exceeded the baseline: where it started, and by how much the
/// delta exceeded the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CumulativeRecord {
    pub timestamp: i64,
    pub excess: i64,
}

/// Result of one cumulative pass. `records[0]` is the starting reading with
/// zero excess; the rest are the steps that exceeded `baseline`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeRun {
    pub baseline: i64,
    pub records: Vec<CumulativeRecord>,
}

impl CumulativeRun {
    /// Clock units between the first and last record.
    pub fn span(&self) -> i64 {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0,
        }
    }

    pub fn total_excess(&self) -> i64 {
        self.records.iter().map(|r| r.excess).sum()
    }

    pub fn highest_excesses(&self, k: usize) -> Result<Vec<i64>, Error> {
        highest_excesses(&self.records, k)
    }

    pub fn highest_window_sums(&self, k: usize, window: i64) -> Result<Vec<i64>, Error> {
        highest_window_sums(&self.records, k, window)
    }
}

/// Samples until `n` records exist, recording every step whose delta is
/// greater than `baseline`. Runs for as long as that takes.
pub fn aggregate(clock: &mut ClockSource, n: usize, baseline: i64) -> Result<CumulativeRun, Error> {
    if baseline <= 0 {
        return Err(Error::ZeroBaseline(baseline));
    }
    if n == 0 {
        return Err(Error::InvalidArgs(
            "number of iterations must be greater than 0".into(),
        ));
    }
    if let Some(step) = clock.steady_step() {
        if step <= baseline {
            return Err(Error::InvalidArgs(format!(
                "{} clock settles at {} per read and never exceeds baseline {}",
                clock.kind().name(),
                step,
                baseline
            )));
        }
    }

    let mut records = Vec::with_capacity(n);
    let mut steps = Steps::new(clock);
    records.push(CumulativeRecord {
        timestamp: steps.start(),
        excess: 0,
    });
    while records.len() < n {
        // Steps never ends.
        let Some(step) = steps.next() else { break };
        if step.delta > baseline {
            records.push(CumulativeRecord {
                timestamp: step.timestamp,
                excess: step.delta - baseline,
            });
        }
    }

    Ok(CumulativeRun { baseline, records })
}

/// Estimates the baseline with `policy`, then aggregates `n` records
/// against it.
pub fn run(
    clock: &mut ClockSource,
    n: usize,
    policy: &BaselinePolicy,
) -> Result<(Baseline, CumulativeRun), Error> {
    let baseline = baseline::estimate(clock, policy)?;
    let run = aggregate(clock, n, baseline.value)?;
    Ok((baseline, run))
}

/// The `k` largest excesses, ascending.
pub fn highest_excesses(records: &[CumulativeRecord], k: usize) -> Result<Vec<i64>, Error> {
    let mut top = TopK::new(k)?;
    top.extend(records.iter().map(|r| r.excess));
    Ok(top.into_vec())
}

/// Sums of excess per window, in time order, including the final partial
/// window.
pub fn window_sums(records: &[CumulativeRecord], window: i64) -> Result<Vec<i64>, Error> {
    Ok(WindowSums::new(records, window)?.collect())
}

/// The `k` largest window sums, ascending.
pub fn highest_window_sums(
    records: &[CumulativeRecord],
    k: usize,
    window: i64,
) -> Result<Vec<i64>, Error> {
    let mut top = TopK::new(k)?;
    top.extend(WindowSums::new(records, window)?);
    Ok(top.into_vec())
}

/// Partitions records into consecutive windows by timestamp.
///
/// The first window opens at the first record's timestamp. A record at or
/// past `start + window` closes the current window and opens the next one at
/// its own timestamp. Whatever is open when the records run out is yielded
/// last.
struct WindowSums<'a> {
    records: slice::Iter<'a, CumulativeRecord>,
    window: i64,
    start: i64,
    sum: i64,
    open: bool,
}

impl<'a> WindowSums<'a> {
    fn new(records: &'a [CumulativeRecord], window: i64) -> Result<Self, Error> {
        if window <= 0 {
            return Err(Error::InvalidArgs(
                "time interval must be greater than 0".into(),
            ));
        }
        Ok(Self {
            records: records.iter(),
            window,
            start: records.first().map_or(0, |r| r.timestamp),
            sum: 0,
            open: !records.is_empty(),
        })
    }
}

impl Iterator for WindowSums<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        for record in self.records.by_ref() {
            if record.timestamp - self.start >= self.window {
                let closed = self.sum;
                self.start = record.timestamp;
                self.sum = record.excess;
                return Some(closed);
            }
            self.sum += record.excess;
        }
        if self.open {
            self.open = false;
            return Some(self.sum);
        }
        None
    }
}
