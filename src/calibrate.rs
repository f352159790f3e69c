use std::thread;
use std::time::Duration;

use crate::clock::{realtime, ClockKind, ClockSource};
use crate::error::Error;

/// How long calibration sleeps between its two clock pairs. Long enough that
/// the cost of the sleep call itself is negligible against a GHz counter.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// A measured nanoseconds-per-tick ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    ns_per_tick: f64,
}

impl Calibration {
    /// Builds a calibration from two (ticks, ns) pairs taken some time apart.
    pub fn from_samples(c1: i64, t1: i64, c2: i64, t2: i64) -> Result<Self, Error> {
        if c2 <= c1 {
            return Err(Error::Calibration(format!(
                "counter did not advance ({} -> {})",
                c1, c2
            )));
        }
        if t2 <= t1 {
            return Err(Error::Calibration(format!(
                "wall clock did not advance ({} -> {})",
                t1, t2
            )));
        }
        let ns_per_tick = (t2 - t1) as f64 / (c2 - c1) as f64;
        Ok(Self { ns_per_tick })
    }

    /// Reads `clock` and CLOCK_REALTIME as a pair, sleeps `interval`, reads
    /// the pair again and derives the ratio.
    pub fn measure(clock: &mut ClockSource, interval: Duration) -> Result<Self, Error> {
        let c1 = clock.read();
        let t1 = realtime::now_ns();
        thread::sleep(interval);
        let c2 = clock.read();
        let t2 = realtime::now_ns();
        Self::from_samples(c1, t1, c2, t2)
    }

    pub fn ns_per_tick(&self) -> f64 {
        self.ns_per_tick
    }
}

/// Converts between a clock's native units and nanoseconds.
///
/// Nanosecond clocks convert by identity and never calibrate. Tick clocks
/// must be calibrated once, after which the multiplier is fixed for the
/// lifetime of the calibrator. Conversions before that fail with
/// [`Error::NotCalibrated`].
#[derive(Debug, Clone)]
pub struct Calibrator {
    kind: ClockKind,
    interval: Duration,
    calibration: Option<Calibration>,
}

impl Calibrator {
    pub fn new(kind: ClockKind, interval: Duration) -> Self {
        Self {
            kind,
            interval,
            calibration: None,
        }
    }

    pub fn kind(&self) -> ClockKind {
        self.kind
    }

    /// Measures the multiplier against `clock` unless it is already known.
    /// Returns the active ns-per-tick ratio (1.0 for nanosecond clocks).
    pub fn calibrate(&mut self, clock: &mut ClockSource) -> Result<f64, Error> {
        if clock.kind() != self.kind {
            return Err(Error::InvalidArgs(format!(
                "calibrator for {} given {} clock",
                self.kind.name(),
                clock.kind().name()
            )));
        }
        if self.kind.units_are_ns() {
            return Ok(1.0);
        }
        if let Some(cal) = self.calibration {
            return Ok(cal.ns_per_tick());
        }
        let cal = Calibration::measure(clock, self.interval)?;
        log::info!(
            "calibrated {}: {:.6} ns per tick ({:.3} GHz)",
            self.kind.name(),
            cal.ns_per_tick(),
            1.0 / cal.ns_per_tick()
        );
        Ok(self.install(cal))
    }

    /// Stores `cal` if no calibration is set yet. Returns the ratio in effect
    /// afterwards, which is the first one ever installed.
    pub fn install(&mut self, cal: Calibration) -> f64 {
        self.calibration.get_or_insert(cal).ns_per_tick()
    }

    /// The calibrated multiplier, if this is a tick clock that has been
    /// calibrated.
    pub fn multiplier(&self) -> Option<f64> {
        self.calibration.map(|c| c.ns_per_tick())
    }

    pub fn to_nanoseconds(&self, ticks: i64) -> Result<i64, Error> {
        if self.kind.units_are_ns() {
            return Ok(ticks);
        }
        let cal = self.calibration.ok_or(Error::NotCalibrated)?;
        Ok((ticks as f64 * cal.ns_per_tick) as i64)
    }

    pub fn to_ticks(&self, ns: i64) -> Result<i64, Error> {
        if self.kind.units_are_ns() {
            return Ok(ns);
        }
        let cal = self.calibration.ok_or(Error::NotCalibrated)?;
        Ok((ns as f64 / cal.ns_per_tick) as i64)
    }
}
