mod cli;
mod config;
mod logging;
mod report;
mod sched;

use std::io::{self, Write};
use std::process;

use clap::Parser;

use clockjumps::analysis::{cumulative, percentile, topk, ReportKind};
use clockjumps::calibrate::Calibrator;
use clockjumps::clock::{tsc, ClockSource};
use clockjumps::Error;

use cli::Cli;
use config::Config;
use report::CumulativeReport;
use sched::ResourceUsage;

/// Raw deltas echoed at the top of the percentile report.
const FIRST_VALUES: usize = 10;

/// Build the run configuration by layering: defaults → TOML file → CLI overrides.
fn build_config(cli: &Cli) -> Result<Config, Error> {
    let mut cfg = config::load_config(cli.config_file.as_deref())?;

    // Apply CLI overrides (only if explicitly set)
    if let Some(v) = cli.clock {
        cfg.run.clock = v;
    }
    if let Some(v) = cli.cpu {
        cfg.run.cpu = v as usize;
    }
    if let Some(v) = cli.report {
        cfg.run.report = v;
    }
    if let Some(v) = cli.interval_ns {
        cfg.run.interval_ns = v;
    }
    if let Some(v) = cli.iterations {
        cfg.run.iterations = usize::try_from(v)
            .map_err(|_| Error::InvalidArgs(format!("too many iterations: {}", v)))?;
    }
    if let Some(v) = cli.highest {
        cfg.analysis.highest = v;
    }
    if let Some(v) = cli.headroom {
        cfg.analysis.baseline_headroom = v;
    }
    if cli.no_realtime {
        cfg.run.realtime_priority = false;
    }

    cfg.validate()?;
    Ok(cfg)
}

/// Pins, calibrates and raises priority. Sampling starts right after.
fn prepare(cfg: &Config) -> Result<(ClockSource, Calibrator), Error> {
    let kind = cfg.run.clock;
    let mut clock = ClockSource::new(kind)?;

    match sched::pin_to_cpu(cfg.run.cpu) {
        Ok(()) => log::info!("pinned to CPU {}", cfg.run.cpu),
        Err(e) => log::warn!("could not pin to CPU {}: {}", cfg.run.cpu, e),
    }
    if let Some(cpu) = clock.processor_id() {
        log::info!("rdtscp reports processor {}", cpu);
        if cpu as usize != cfg.run.cpu {
            log::warn!("running on processor {}, expected {}", cpu, cfg.run.cpu);
        }
    }
    if !kind.units_are_ns() && !tsc::invariant_tsc() {
        log::warn!("TSC is not invariant; tick counts may drift with frequency changes");
    }

    let mut cal = Calibrator::new(kind, cfg.calibration_interval());
    cal.calibrate(&mut clock)?;

    if cfg.run.realtime_priority {
        match sched::elevate_priority() {
            Ok(prio) => log::info!("running SCHED_FIFO at priority {}", prio),
            Err(e) => log::warn!("could not switch to SCHED_FIFO: {}", e),
        }
    }

    Ok((clock, cal))
}

fn run(cfg: &Config) -> Result<(), Error> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    report::write_header(&mut out, &cfg.run)?;
    out.flush()?;

    let (mut clock, cal) = prepare(cfg)?;
    let n = cfg.run.iterations;
    let k = cfg.analysis.highest;

    let start = ResourceUsage::now();
    let usage = match cfg.run.report {
        ReportKind::Percentiles => {
            let dist = percentile::distribution(&mut clock, n, FIRST_VALUES)?;
            let usage = ResourceUsage::now().elapsed_since(&start);
            let percentiles = percentile::extract(&dist.sorted, &cfg.analysis.percentiles)?;
            let largest = percentile::largest(&dist.sorted, k);
            report::write_percentiles(&mut out, &dist.first, &largest, &percentiles, &cal)?;
            usage
        }
        ReportKind::Highest => {
            let highest = topk::track(&mut clock, n, k)?;
            let usage = ResourceUsage::now().elapsed_since(&start);
            report::write_highest(&mut out, &highest, &cal)?;
            usage
        }
        ReportKind::Cumulative => {
            let (baseline, jumps) = cumulative::run(&mut clock, n, &cfg.baseline_policy())?;
            let usage = ResourceUsage::now().elapsed_since(&start);
            log::info!(
                "{} records above baseline {} over a span of {}, total excess {}",
                jumps.records.len(),
                baseline.value,
                jumps.span(),
                jumps.total_excess()
            );
            let window = cal.to_ticks(cfg.run.interval_ns)?;
            let highest = jumps.highest_excesses(k)?;
            let highest_windows = jumps.highest_window_sums(k, window)?;
            let summary = CumulativeReport {
                baseline: &baseline,
                run: &jumps,
                interval_ns: cfg.run.interval_ns,
                highest: &highest,
                highest_windows: &highest_windows,
            };
            report::write_cumulative(&mut out, &summary, &cal)?;
            usage
        }
    };

    writeln!(out)?;
    report::write_usage(&mut out, &usage)?;
    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let cfg = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&cfg) {
        log::error!("{}", e);
        process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clockjumps::clock::ClockKind;

    fn write_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "{}", body).unwrap();
        path
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_unknown_clock_in_config_is_fatal() {
        let path = write_config(
            "clockjumps_main_bad_clock.toml",
            "[run]\nclock = \"hpet\"\n",
        );
        let cli = parse(&["clockjumps", "--config", path.to_str().unwrap()]);
        let result = build_config(&cli);
        assert!(matches!(result, Err(Error::InvalidArgs(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_missing_explicit_config_is_fatal() {
        let cli = parse(&[
            "clockjumps",
            "--config",
            "/nonexistent/clockjumps_missing.toml",
        ]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let path = write_config(
            "clockjumps_main_layering.toml",
            r#"
[run]
clock = "rdtscp"
report = "cumulative"
iterations = 5000
cpu = 2

[analysis]
highest = 20
baseline_headroom = 1.5
"#,
        );
        let cli = parse(&[
            "clockjumps",
            "--config",
            path.to_str().unwrap(),
            "-c",
            "mock",
            "-i",
            "7",
            "--headroom",
            "3",
            "--no-realtime",
        ]);
        let cfg = build_config(&cli).unwrap();
        // From the command line
        assert_eq!(cfg.run.clock, ClockKind::Mock);
        assert_eq!(cfg.run.iterations, 7);
        assert_eq!(cfg.analysis.baseline_headroom, 3.0);
        assert!(!cfg.run.realtime_priority);
        // From the file
        assert_eq!(cfg.run.report, ReportKind::Cumulative);
        assert_eq!(cfg.run.cpu, 2);
        assert_eq!(cfg.analysis.highest, 20);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_overrides_are_validated() {
        let path = write_config("clockjumps_main_validate.toml", "[run]\ncpu = 3\n");
        let cli = parse(&[
            "clockjumps",
            "--config",
            path.to_str().unwrap(),
            "--headroom",
            "0",
        ]);
        assert!(build_config(&cli).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
