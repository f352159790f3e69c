use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Args, ValueEnum};
use log::{Level, LevelFilter, Log, Metadata, Record};

type SyslogLogger = syslog::Logger<syslog::LoggerBackend, syslog::Formatter3164>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Log level (default: warn)
    #[arg(long = "log-level", value_enum)]
    pub log_level: Option<LogLevel>,

    /// Append log messages to a file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Send log messages to syslog
    #[arg(long)]
    pub syslog: bool,
}

/// Diagnostics go to stderr, and optionally a file and syslog. Stdout is
/// reserved for the report.
struct ClockjumpsLogger {
    level: LevelFilter,
    log_file: Option<Mutex<File>>,
    syslog: Option<Mutex<SyslogLogger>>,
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug | Level::Trace => "debug",
    }
}

/// `clockjumps::analysis::cumulative` -> `cumulative`
fn short_target(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn format_line(record: &Record, with_target: bool) -> String {
    if with_target {
        format!(
            "[clockjumps] {} ({}): {}",
            level_tag(record.level()),
            short_target(record.target()),
            record.args()
        )
    } else {
        format!("[clockjumps] {}: {}", level_tag(record.level()), record.args())
    }
}

impl Log for ClockjumpsLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let msg = format_line(record, self.level >= LevelFilter::Debug);

        let _ = writeln!(std::io::stderr().lock(), "{}", msg);

        if let Some(ref file) = self.log_file {
            if let Ok(mut f) = file.lock() {
                let _ = writeln!(f, "{}", msg);
            }
        }

        if let Some(ref logger) = self.syslog {
            if let Ok(mut l) = logger.lock() {
                let text = format!("{}", record.args());
                let _ = match record.level() {
                    Level::Error => l.err(&text),
                    Level::Warn => l.warning(&text),
                    Level::Info => l.info(&text),
                    Level::Debug | Level::Trace => l.debug(&text),
                };
            }
        }
    }

    fn flush(&self) {
        if let Some(ref file) = self.log_file {
            if let Ok(mut f) = file.lock() {
                let _ = f.flush();
            }
        }
    }
}

pub fn init(args: &LogArgs) {
    let level = args.log_level.unwrap_or(LogLevel::Warn).to_level_filter();

    let mut open_error = None;
    let log_file = args.log_file.as_ref().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => Some(Mutex::new(f)),
            Err(e) => {
                open_error = Some(format!("cannot open log file {}: {}", path.display(), e));
                None
            }
        }
    });

    let syslog = if args.syslog {
        syslog::unix(syslog::Formatter3164 {
            facility: syslog::Facility::LOG_USER,
            hostname: None,
            process: "clockjumps".into(),
            pid: std::process::id(),
        })
        .ok()
        .map(Mutex::new)
    } else {
        None
    };

    let logger = ClockjumpsLogger {
        level,
        log_file,
        syslog,
    };

    let _ = log::set_boxed_logger(Box::new(logger));
    log::set_max_level(level);

    if let Some(msg) = open_error {
        log::warn!("{}", msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(LogLevel::Error.to_level_filter(), LevelFilter::Error);
        assert_eq!(LogLevel::Warn.to_level_filter(), LevelFilter::Warn);
        assert_eq!(LogLevel::Debug.to_level_filter(), LevelFilter::Debug);
        assert_eq!(LogLevel::Trace.to_level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn test_short_target() {
        assert_eq!(short_target("clockjumps::analysis::cumulative"), "cumulative");
        assert_eq!(short_target("clockjumps"), "clockjumps");
    }

    fn info_line(msg: &str, with_target: bool) -> String {
        format_line(
            &Record::builder()
                .args(format_args!("{}", msg))
                .level(Level::Info)
                .target("clockjumps::calibrate")
                .build(),
            with_target,
        )
    }

    #[test]
    fn test_format_line() {
        assert_eq!(info_line("baseline 42", false), "[clockjumps] info: baseline 42");
        assert_eq!(
            info_line("baseline 42", true),
            "[clockjumps] info (calibrate): baseline 42"
        );
    }

    #[test]
    fn test_enabled_respects_level() {
        let logger = ClockjumpsLogger {
            level: LevelFilter::Warn,
            log_file: None,
            syslog: None,
        };
        let warn = Metadata::builder().level(Level::Warn).build();
        let info = Metadata::builder().level(Level::Info).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&info));
    }
}
