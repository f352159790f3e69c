use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use clockjumps::analysis::baseline::{self, BaselinePolicy};
use clockjumps::analysis::percentile::DEFAULT_FRACTIONS;
use clockjumps::analysis::ReportKind;
use clockjumps::clock::ClockKind;
use clockjumps::Error;

const DEFAULT_CONFIG_PATH: &str = "/etc/clockjumps.toml";

/// Highest CPU number accepted for pinning.
pub const MAX_CPU: usize = 1024;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub clock: ClockKind,
    pub report: ReportKind,
    pub cpu: usize,
    pub iterations: usize,
    pub interval_ns: i64,
    pub realtime_priority: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            clock: ClockKind::Realtime,
            report: ReportKind::Percentiles,
            cpu: 1,
            iterations: 1,
            interval_ns: 1_000_000,
            realtime_priority: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub percentiles: Vec<f64>,
    pub highest: usize,
    pub baseline_iterations: usize,
    pub baseline_headroom: f64,
    pub calibration_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            percentiles: DEFAULT_FRACTIONS.to_vec(),
            highest: 10,
            baseline_iterations: baseline::DEFAULT_ITERATIONS,
            baseline_headroom: baseline::DEFAULT_HEADROOM,
            calibration_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub run: RunConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Clamps tunables to sane ranges and rejects values no run can use.
    pub fn validate(&mut self) -> Result<(), Error> {
        self.run.cpu = self.run.cpu.min(MAX_CPU);
        self.analysis.highest = self.analysis.highest.clamp(1, 1000);
        self.analysis.calibration_ms = self.analysis.calibration_ms.clamp(10, 10_000);
        self.analysis.baseline_iterations = self.analysis.baseline_iterations.max(1);

        if self.run.iterations == 0 {
            return Err(Error::InvalidArgs(
                "number of iterations must be greater than 0".into(),
            ));
        }
        if self.run.interval_ns <= 0 {
            return Err(Error::InvalidArgs(format!(
                "invalid time interval {}",
                self.run.interval_ns
            )));
        }
        if !self.analysis.baseline_headroom.is_finite() || self.analysis.baseline_headroom <= 0.0 {
            return Err(Error::InvalidArgs(format!(
                "invalid baseline headroom {}",
                self.analysis.baseline_headroom
            )));
        }
        if let Some(p) = self
            .analysis
            .percentiles
            .iter()
            .find(|p| !(0.0..1.0).contains(*p))
        {
            return Err(Error::InvalidArgs(format!("percentile {} outside [0, 1)", p)));
        }
        self.analysis.percentiles.sort_by(f64::total_cmp);
        Ok(())
    }

    pub fn baseline_policy(&self) -> BaselinePolicy {
        BaselinePolicy {
            iterations: self.analysis.baseline_iterations,
            headroom: self.analysis.baseline_headroom,
        }
    }

    pub fn calibration_interval(&self) -> Duration {
        Duration::from_millis(self.analysis.calibration_ms)
    }
}

/// Load configuration from a TOML file.
///
/// - If `explicit_path` is `Some` and the file is missing, returns an error.
/// - If `explicit_path` is `None`, tries `/etc/clockjumps.toml`; if missing, returns defaults.
pub fn load_config(explicit_path: Option<&Path>) -> Result<Config, Error> {
    let path = match explicit_path {
        Some(p) => {
            if !p.exists() {
                return Err(Error::InvalidArgs(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                return Ok(Config::default());
            }
            default.to_path_buf()
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| {
        Error::InvalidArgs(format!("failed to read config {}: {}", path.display(), e))
    })?;

    toml::from_str(&contents).map_err(|e| {
        Error::InvalidArgs(format!("failed to parse config {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.run.clock, ClockKind::Realtime);
        assert_eq!(cfg.run.report, ReportKind::Percentiles);
        assert_eq!(cfg.run.cpu, 1);
        assert_eq!(cfg.run.iterations, 1);
        assert_eq!(cfg.run.interval_ns, 1_000_000);
        assert!(cfg.run.realtime_priority);
        assert_eq!(cfg.analysis.percentiles.len(), 7);
        assert_eq!(cfg.analysis.highest, 10);
        assert_eq!(cfg.analysis.baseline_iterations, 1_000_000);
        assert_eq!(cfg.analysis.baseline_headroom, 2.0);
        assert_eq!(cfg.calibration_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_validate_clamps() {
        let mut cfg = Config::default();
        cfg.run.cpu = 5000;
        cfg.analysis.highest = 0;
        cfg.analysis.calibration_ms = 0;
        cfg.validate().unwrap();
        assert_eq!(cfg.run.cpu, MAX_CPU);
        assert_eq!(cfg.analysis.highest, 1);
        assert_eq!(cfg.analysis.calibration_ms, 10);
    }

    #[test]
    fn test_validate_rejects() {
        let mut cfg = Config::default();
        cfg.run.iterations = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.run.interval_ns = -1;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.analysis.baseline_headroom = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.analysis.percentiles = vec![0.5, 1.0];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_sorts_percentiles() {
        let mut cfg = Config::default();
        cfg.analysis.percentiles = vec![0.99, 0.5, 0.9];
        cfg.validate().unwrap();
        assert_eq!(cfg.analysis.percentiles, vec![0.5, 0.9, 0.99]);
    }

    #[test]
    fn test_toml_parsing() {
        let path = write_config(
            "clockjumps_test_config.toml",
            r#"
[run]
clock = "rdtscp"
report = "cumulative"
iterations = 5000

[analysis]
baseline_headroom = 1.0
percentiles = [0.5, 0.99]
"#,
        );
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.run.clock, ClockKind::Rdtscp);
        assert_eq!(config.run.report, ReportKind::Cumulative);
        assert_eq!(config.run.iterations, 5000);
        assert_eq!(config.analysis.baseline_headroom, 1.0);
        assert_eq!(config.analysis.percentiles, vec![0.5, 0.99]);
        // Unset fields should get defaults
        assert_eq!(config.run.cpu, 1);
        assert_eq!(config.analysis.highest, 10);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_unknown_clock_errors() {
        let path = write_config(
            "clockjumps_test_bad_clock.toml",
            "[run]\nclock = \"hpet\"\n",
        );
        let result = load_config(Some(&path));
        assert!(matches!(result, Err(Error::InvalidArgs(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_explicit_config_errors() {
        let path = std::path::Path::new("/tmp/clockjumps_nonexistent_config.toml");
        let result = load_config(Some(path));
        assert!(result.is_err());
    }

    #[test]
    fn test_baseline_policy() {
        let mut cfg = Config::default();
        cfg.analysis.baseline_iterations = 500;
        cfg.analysis.baseline_headroom = 1.5;
        let p = cfg.baseline_policy();
        assert_eq!(p.iterations, 500);
        assert_eq!(p.headroom, 1.5);
    }
}
