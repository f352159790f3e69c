//! Back-to-back clock reads turned into a stream of deltas.
//!
//! Every analysis mode is built on [`Steps`]: one seed read at construction,
//! then each `next()` is one read and one subtraction. Nothing else happens
//! between reads, so stalls in the loop show up as large deltas.

use crate::clock::ClockSource;

/// One sampling step: the reading the step started from and the gap to the
/// following reading. `delta` is negative if the clock went backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub timestamp: i64,
    pub delta: i64,
}

/// Unbounded iterator of successive steps over a clock.
pub struct Steps<'a> {
    clock: &'a mut ClockSource,
    prev: i64,
}

impl<'a> Steps<'a> {
    /// Takes the seed reading immediately.
    pub fn new(clock: &'a mut ClockSource) -> Self {
        let prev = clock.read();
        Self { clock, prev }
    }

    /// The reading the next step will start from.
    pub fn start(&self) -> i64 {
        self.prev
    }
}

impl Iterator for Steps<'_> {
    type Item = Step;

    #[inline(always)]
    fn next(&mut self) -> Option<Step> {
        let next = self.clock.read();
        let step = Step {
            timestamp: self.prev,
            delta: next.wrapping_sub(self.prev),
        };
        self.prev = next;
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Exactly `n` deltas: one seed read plus `n` reads.
pub fn deltas(clock: &mut ClockSource, n: usize) -> impl Iterator<Item = i64> + '_ {
    Steps::new(clock).take(n).map(|s| s.delta)
}

/// Collects `n` raw deltas in sampling order.
pub fn record(clock: &mut ClockSource, n: usize) -> Vec<i64> {
    let mut out = Vec::with_capacity(n);
    out.extend(deltas(clock, n));
    out
}
