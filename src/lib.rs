//! Measurement of jumps between consecutive reads of a clock.
//!
//! A [`clock::ClockSource`] is read back to back by [`sampling`], and the
//! resulting deltas are summarized by one of the [`analysis`] strategies.
//! Tick-based clocks are converted to nanoseconds with a
//! [`calibrate::Calibrator`].

pub mod analysis;
pub mod calibrate;
pub mod clock;
pub mod error;
pub mod sampling;

pub use error::Error;
