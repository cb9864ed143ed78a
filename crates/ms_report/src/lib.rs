//! ms_report: the standings export model plus CSV and JSON renderers.
//!
//! Rules:
//! - No I/O and no recomputation. The model is a projection of one
//!   `StandingsPass` and the competition snapshot it came from.
//! - Column order is the catalogue order of the competition's disciplines.
//! - Point values are carried as fixed two-decimal strings so renderers never
//!   format floats on their own.

#![deny(unsafe_code)]

use thiserror::Error;

pub mod structure;

#[cfg(feature = "render_csv")]
pub mod render_csv;

#[cfg(feature = "render_json")]
pub mod render_json;

pub use structure::{
    build_report, BoardEntry, BoardSection, CompletionSection, DisciplineColumn, ReportRow, ScoreCell, StandingsReport,
};

#[cfg(feature = "render_csv")]
pub use render_csv::render_csv;

#[cfg(feature = "render_json")]
pub use render_json::{render_json, render_json_string};

// ===== Errors =====
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// The pass and the snapshot disagree (e.g. a ranked id that is not a participant).
    #[error("inconsistent report input: {0}")]
    Inconsistent(String),
    #[error("report serialization failed: {0}")]
    Serialize(String),
}
