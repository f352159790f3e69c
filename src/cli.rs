use std::path::PathBuf;

use clap::Parser;

use clockjumps::analysis::ReportKind;
use clockjumps::clock::ClockKind;

use crate::logging::LogArgs;

#[derive(Debug, Parser)]
#[command(
    name = "clockjumps",
    about = "Measure jumps between consecutive clock reads"
)]
pub struct Cli {
    /// Clock to read (REALTIME is clock_gettime(CLOCK_REALTIME))
    #[arg(short = 'c', long = "clock", value_enum)]
    pub clock: Option<ClockKind>,

    /// Pin the process to this CPU (0-1024)
    #[arg(short = 'p', long = "cpu", value_parser = clap::value_parser!(u16).range(0..=1024))]
    pub cpu: Option<u16>,

    /// Report percentiles, highest, or cumulative
    #[arg(short = 'r', long = "report", value_enum)]
    pub report: Option<ReportKind>,

    /// Window length in ns for the cumulative report
    #[arg(short = 't', long = "interval", value_parser = clap::value_parser!(i64).range(1..))]
    pub interval_ns: Option<i64>,

    /// How many iterations to run
    #[arg(short = 'i', long = "iterations", value_parser = clap::value_parser!(u64).range(1..))]
    pub iterations: Option<u64>,

    /// How many of the largest values to report
    #[arg(long = "highest")]
    pub highest: Option<usize>,

    /// Multiplier applied to the mean delta to get the cumulative baseline
    #[arg(long = "headroom")]
    pub headroom: Option<f64>,

    /// Do not switch to SCHED_FIFO before sampling
    #[arg(long = "no-realtime")]
    pub no_realtime: bool,

    /// Configuration file path (default: /etc/clockjumps.toml)
    #[arg(long = "config")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub log: LogArgs,
}
