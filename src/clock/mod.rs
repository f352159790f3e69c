pub mod deterministic;
pub mod realtime;
pub mod tsc;

use serde::Deserialize;

use crate::error::Error;

pub use deterministic::DeterministicClock;

/// Identifier of a clock source, as given on the command line or in the
/// configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
pub enum ClockKind {
    /// POSIX clock_gettime(CLOCK_REALTIME), in nanoseconds
    #[serde(rename = "REALTIME")]
    #[value(name = "REALTIME")]
    Realtime,
    /// LFENCE + RDTSC, in TSC ticks
    #[serde(rename = "rdtsc")]
    Rdtsc,
    /// CPUID + RDTSCP, in TSC ticks
    #[serde(rename = "rdtscp")]
    Rdtscp,
    /// Scripted sequence for testing
    #[serde(rename = "mock")]
    Mock,
}

impl ClockKind {
    pub fn name(&self) -> &'static str {
        match self {
            ClockKind::Realtime => "REALTIME",
            ClockKind::Rdtsc => "rdtsc",
            ClockKind::Rdtscp => "rdtscp",
            ClockKind::Mock => "mock",
        }
    }

    /// True when readings are already nanoseconds and need no calibration.
    pub fn units_are_ns(&self) -> bool {
        match self {
            ClockKind::Realtime | ClockKind::Mock => true,
            ClockKind::Rdtsc | ClockKind::Rdtscp => false,
        }
    }
}

/// A readable clock. Dispatch is a single match per read so the sampling
/// loops stay free of indirect calls.
#[derive(Debug, Clone)]
pub enum ClockSource {
    Realtime,
    Rdtsc,
    Rdtscp,
    Deterministic(DeterministicClock),
}

impl ClockSource {
    /// Opens the clock named by `kind`, failing if this machine cannot read it.
    pub fn new(kind: ClockKind) -> Result<Self, Error> {
        match kind {
            ClockKind::Realtime => Ok(ClockSource::Realtime),
            ClockKind::Rdtsc => {
                tsc::check_rdtsc()?;
                Ok(ClockSource::Rdtsc)
            }
            ClockKind::Rdtscp => {
                tsc::check_rdtscp()?;
                Ok(ClockSource::Rdtscp)
            }
            ClockKind::Mock => Ok(ClockSource::deterministic()),
        }
    }

    pub fn deterministic() -> Self {
        ClockSource::Deterministic(DeterministicClock::new())
    }

    pub fn kind(&self) -> ClockKind {
        match self {
            ClockSource::Realtime => ClockKind::Realtime,
            ClockSource::Rdtsc => ClockKind::Rdtsc,
            ClockSource::Rdtscp => ClockKind::Rdtscp,
            ClockSource::Deterministic(_) => ClockKind::Mock,
        }
    }

    #[inline(always)]
    pub fn read(&mut self) -> i64 {
        match self {
            ClockSource::Realtime => realtime::now_ns(),
            ClockSource::Rdtsc => tsc::read_rdtsc(),
            ClockSource::Rdtscp => tsc::read_rdtscp().0,
            ClockSource::Deterministic(clock) => clock.read(),
        }
    }

    /// Reads the clock together with the processor id RDTSCP returns in
    /// IA32_TSC_AUX. Other clocks carry no id.
    pub fn read_with_aux(&mut self) -> (i64, Option<u32>) {
        match self {
            ClockSource::Rdtscp => {
                let (ticks, aux) = tsc::read_rdtscp();
                // Linux stores the cpu number in the low 12 bits of TSC_AUX.
                (ticks, Some(aux & 0xfff))
            }
            _ => (self.read(), None),
        }
    }

    /// Processor the calling thread currently runs on, for clocks that can
    /// tell. Does not touch other clocks.
    pub fn processor_id(&mut self) -> Option<u32> {
        match self {
            ClockSource::Rdtscp => self.read_with_aux().1,
            _ => None,
        }
    }

    /// The delta every read settles to, for clocks that have one. Hardware
    /// clocks return `None`.
    pub fn steady_step(&self) -> Option<i64> {
        match self {
            ClockSource::Deterministic(_) => Some(deterministic::STEP),
            _ => None,
        }
    }

    /// Rewinds a deterministic clock and returns its first reading. Hardware
    /// clocks cannot be rewound and just return a fresh reading.
    pub fn restart(&mut self) -> i64 {
        match self {
            ClockSource::Deterministic(clock) => clock.restart(),
            _ => self.read(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in [
            ClockKind::Realtime,
            ClockKind::Rdtsc,
            ClockKind::Rdtscp,
            ClockKind::Mock,
        ] {
            if let Ok(clock) = ClockSource::new(kind) {
                assert_eq!(clock.kind(), kind);
            }
        }
    }

    #[test]
    fn test_units() {
        assert!(ClockKind::Realtime.units_are_ns());
        assert!(ClockKind::Mock.units_are_ns());
        assert!(!ClockKind::Rdtsc.units_are_ns());
        assert!(!ClockKind::Rdtscp.units_are_ns());
    }

    #[test]
    fn test_names_match_config_spelling() {
        #[derive(Deserialize)]
        struct Wrapper {
            clock: ClockKind,
        }
        for kind in [
            ClockKind::Realtime,
            ClockKind::Rdtsc,
            ClockKind::Rdtscp,
            ClockKind::Mock,
        ] {
            let parsed: Wrapper = toml::from_str(&format!("clock = \"{}\"", kind.name())).unwrap();
            assert_eq!(parsed.clock, kind);
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Wrapper {
            clock: ClockKind,
        }
        assert!(toml::from_str::<Wrapper>("clock = \"hpet\"").is_err());
    }

    #[test]
    fn test_mock_clock_restart() {
        let mut clock = ClockSource::new(ClockKind::Mock).unwrap();
        assert_eq!(clock.read(), 0);
        assert_eq!(clock.read(), 1);
        assert_eq!(clock.restart(), 0);
        assert_eq!(clock.read(), 1);
        assert_eq!(clock.processor_id(), None);
        assert_eq!(clock.read(), 2);
        assert_eq!(clock.read_with_aux(), (4, None));
        assert_eq!(clock.steady_step(), Some(10));
        assert_eq!(ClockSource::Realtime.steady_step(), None);
    }

    #[test]
    fn test_realtime_monotonic_enough() {
        let mut clock = ClockSource::new(ClockKind::Realtime).unwrap();
        let a = clock.read();
        let b = clock.read();
        // REALTIME may step backwards under NTP, but not by a second here.
        assert!(b - a > -1_000_000_000);
    }
}
