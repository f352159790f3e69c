use std::io::{self, Write};

use clockjumps::analysis::baseline::Baseline;
use clockjumps::analysis::cumulative::CumulativeRun;
use clockjumps::analysis::percentile::Percentile;
use clockjumps::calibrate::Calibrator;
use clockjumps::clock::{realtime, ClockKind};
use clockjumps::Error;

use crate::config::RunConfig;
use crate::sched::UsageDelta;

const NS_PER_US: i64 = 1_000;
const NS_PER_MS: i64 = 1_000_000;

pub fn write_header(out: &mut dyn Write, run: &RunConfig) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Running test {} with clock {} for {} iterations while pinning to processor {}",
        run.report.name(),
        run.clock.name(),
        run.iterations,
        run.cpu
    )?;
    match run.clock {
        ClockKind::Realtime => writeln!(
            out,
            "Clock resolution for CLOCK_REALTIME is {} nanoseconds",
            realtime::resolution_ns()
        ),
        ClockKind::Rdtsc | ClockKind::Rdtscp => {
            writeln!(out, "tsc values are in units of clock ticks")
        }
        ClockKind::Mock => writeln!(out, "mock clock values are synthetic"),
    }
}

/// One value in clock units, followed by its ns conversion for tick clocks.
fn write_value(out: &mut dyn Write, value: i64, cal: &Calibrator) -> Result<(), Error> {
    if cal.kind().units_are_ns() {
        writeln!(out, "{:>10} ns", value)?;
    } else {
        writeln!(out, "{:>10} -- {:>10} ns", value, cal.to_nanoseconds(value)?)?;
    }
    Ok(())
}

/// Ascending values printed largest first.
fn write_descending(out: &mut dyn Write, ascending: &[i64], cal: &Calibrator) -> Result<(), Error> {
    for &v in ascending.iter().rev() {
        write_value(out, v, cal)?;
    }
    Ok(())
}

pub fn write_percentiles(
    out: &mut dyn Write,
    first: &[i64],
    largest: &[i64],
    percentiles: &[Percentile],
    cal: &Calibrator,
) -> Result<(), Error> {
    writeln!(out)?;
    writeln!(out, "First {} values are:", first.len())?;
    for &v in first {
        write_value(out, v, cal)?;
    }

    writeln!(out)?;
    writeln!(out, "Largest {} values are:", largest.len())?;
    for &v in largest {
        write_value(out, v, cal)?;
    }

    writeln!(out)?;
    writeln!(out, "Percentiles are:")?;
    for p in percentiles {
        write!(out, "{:.6} : ", p.fraction)?;
        write_value(out, p.value, cal)?;
    }
    Ok(())
}

pub fn write_highest(out: &mut dyn Write, ascending: &[i64], cal: &Calibrator) -> Result<(), Error> {
    writeln!(out, "Largest {} values are:", ascending.len())?;
    write_descending(out, ascending, cal)
}

/// Everything the cumulative report prints, in clock units.
pub struct CumulativeReport<'a> {
    pub baseline: &'a Baseline,
    pub run: &'a CumulativeRun,
    pub interval_ns: i64,
    pub highest: &'a [i64],
    pub highest_windows: &'a [i64],
}

fn write_ns_us(out: &mut dyn Write, ascending: &[i64], cal: &Calibrator) -> Result<(), Error> {
    for &v in ascending.iter().rev() {
        let ns = cal.to_nanoseconds(v)?;
        writeln!(out, "{:>16} ns ({:>8} us)", ns, ns / NS_PER_US)?;
    }
    Ok(())
}

pub fn write_cumulative(
    out: &mut dyn Write,
    report: &CumulativeReport,
    cal: &Calibrator,
) -> Result<(), Error> {
    let baseline_ns = cal.to_nanoseconds(report.baseline.value)?;
    writeln!(
        out,
        "Baseline for cumulative test is {} ns (mean {} x headroom {})",
        baseline_ns,
        cal.to_nanoseconds(report.baseline.mean)?,
        report.baseline.headroom
    )?;
    if let Some(m) = cal.multiplier() {
        writeln!(out, "Multiplier for cycles to ns is {}", m)?;
    }

    let span = cal.to_nanoseconds(report.run.span())?;
    let interval = report.interval_ns;
    writeln!(
        out,
        "Test span was {} ns ({} us, {} ms)",
        span,
        span / NS_PER_US,
        span / NS_PER_MS
    )?;
    writeln!(
        out,
        "There are {} intervals of length {} ns ({} us, {} ms)",
        span / interval,
        interval,
        interval / NS_PER_US,
        interval / NS_PER_MS
    )?;

    writeln!(out, "Largest {} individual values are", report.highest.len())?;
    write_ns_us(out, report.highest, cal)?;
    writeln!(out)?;

    writeln!(
        out,
        "Largest {} cumulative values within {} ns are:",
        report.highest_windows.len(),
        interval
    )?;
    write_ns_us(out, report.highest_windows, cal)
}

pub fn write_usage(out: &mut dyn Write, usage: &UsageDelta) -> io::Result<()> {
    writeln!(
        out,
        "Test run took {:4.6} s user time, {:4.6} s system time and {:4.6} s calendar time",
        usage.user.as_secs_f64(),
        usage.system.as_secs_f64(),
        usage.wall.as_secs_f64()
    )
}
