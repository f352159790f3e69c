/// Readings returned before the clock starts advancing linearly.
const SEQUENCE: [i64; 8] = [0, 1, 2, 4, 8, 16, 32, 64];

/// Increment per read once `SEQUENCE` is exhausted.
pub const STEP: i64 = 10;

/// Scripted clock for exercising the sampling and analysis code without
/// hardware noise. Yields 0, 1, 2, 4, ..., 64, then 74, 84, 94, ...
#[derive(Debug, Clone, Default)]
pub struct DeterministicClock {
    cursor: usize,
}

impl DeterministicClock {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    #[inline(always)]
    pub fn read(&mut self) -> i64 {
        let value = match SEQUENCE.get(self.cursor) {
            Some(&v) => v,
            None => {
                let extra = (self.cursor - (SEQUENCE.len() - 1)) as i64;
                SEQUENCE[SEQUENCE.len() - 1] + STEP * extra
            }
        };
        self.cursor = self.cursor.saturating_add(1);
        value
    }

    /// Rewinds to the start of the sequence and consumes the first reading.
    /// The next `read()` returns 1.
    pub fn restart(&mut self) -> i64 {
        self.cursor = 0;
        self.read()
    }

    /// Number of readings taken since construction or the last restart.
    #[cfg(test)]
    pub fn reads(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_then_linear() {
        let mut clock = DeterministicClock::new();
        let values: Vec<i64> = (0..11).map(|_| clock.read()).collect();
        assert_eq!(values, vec![0, 1, 2, 4, 8, 16, 32, 64, 74, 84, 94]);
    }

    #[test]
    fn test_restart_consumes_first() {
        let mut clock = DeterministicClock::new();
        for _ in 0..20 {
            clock.read();
        }
        assert_eq!(clock.restart(), 0);
        assert_eq!(clock.read(), 1);
        assert_eq!(clock.reads(), 2);
    }
}
