use crate::clock::ClockSource;
use crate::error::Error;
use crate::sampling;

/// The K largest values of a stream, kept in O(K) memory.
///
/// Slots start at zero, so until K values greater than zero have been seen
/// some slots stay 0. Equal values never displace each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopK {
    // Always sorted ascending; values[0] is the eviction candidate.
    values: Vec<i64>,
}

impl TopK {
    pub fn new(k: usize) -> Result<Self, Error> {
        if k == 0 {
            return Err(Error::InvalidArgs(
                "number of highest values must be greater than 0".into(),
            ));
        }
        Ok(Self { values: vec![0; k] })
    }

    /// Offers one value. Returns true if it entered the buffer.
    #[inline]
    pub fn offer(&mut self, value: i64) -> bool {
        if value <= self.values[0] {
            return false;
        }
        // Everything before `pos` is smaller than `value` and shifts down one
        // slot, pushing out the old minimum.
        let pos = self.values.partition_point(|&v| v < value);
        self.values[0] = value;
        self.values[..pos].rotate_left(1);
        true
    }

    pub fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        for v in iter {
            self.offer(v);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Current contents, ascending.
    pub fn as_slice(&self) -> &[i64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<i64> {
        self.values
    }
}

/// Samples `n` deltas from `clock` and returns the `k` largest, ascending.
pub fn track(clock: &mut ClockSource, n: usize, k: usize) -> Result<Vec<i64>, Error> {
    if n == 0 {
        return Err(Error::InvalidArgs(
            "number of iterations must be greater than 0".into(),
        ));
    }
    let mut top = TopK::new(k)?;
    let mut entered = 0usize;
    for delta in sampling::deltas(clock, n) {
        if top.offer(delta) {
            entered += 1;
        }
    }
    log::debug!(
        "{} of {} deltas entered the top {}, smallest kept {}",
        entered,
        n,
        top.len(),
        top.as_slice()[0]
    );
    Ok(top.into_vec())
}
