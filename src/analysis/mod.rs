//! The three ways a run's deltas are summarized.

pub mod baseline;
pub mod cumulative;
pub mod percentile;
pub mod topk;

use serde::Deserialize;

/// Which analysis a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Keep every delta and report percentiles
    Percentiles,
    /// Track only the largest deltas
    Highest,
    /// Sum deltas above a noise baseline, per time window
    Cumulative,
}

impl ReportKind {
    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::Percentiles => "percentiles",
            ReportKind::Highest => "highest",
            ReportKind::Cumulative => "cumulative",
        }
    }
}
