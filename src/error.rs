use std::fmt;
use std::io;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    InvalidArgs(String),
    ZeroBaseline(i64),
    NotCalibrated,
    Calibration(String),
    Unsupported(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidArgs(msg) => write!(f, "invalid arguments: {}", msg),
            Error::ZeroBaseline(v) => write!(
                f,
                "baseline must be positive, got {} (clock resolution too coarse?)",
                v
            ),
            Error::NotCalibrated => write!(f, "cycles to ns conversion not calibrated"),
            Error::Calibration(msg) => write!(f, "calibration failed: {}", msg),
            Error::Unsupported(msg) => write!(f, "unsupported clock: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
