//! ms_pipeline: orchestration over `ms_io` (data) and `ms_algo` (math).
//!
//! - `store`: one cached competition snapshot + user directory, refetched
//!   after every accepted write
//! - `standings`: the full scoring pass (totals → ranking → leaderboards → completion)
//! - `intake`: result submission, edits, deletion and review confirmation
//! - `import`: pasted participant rows → duplicate review → created competitors
//!
//! Rejections are ordinary `PipelineError` values whose `Display` text is
//! meant for the person who submitted the data.

use ms_core::{CompetitorId, DisciplineRef};
use ms_io::submission_code::CodeError;
use ms_io::IoError;
use thiserror::Error;

pub mod import;
pub mod intake;
pub mod standings;
pub mod store;

pub use import::{apply_import, plan_import, ImportDecision, ImportOutcome, ImportPlan, PlannedRow, RowStatus};
pub use intake::{confirm_result, delete_result, replace_result, submit_code, submit_result, IntakePolicy};
pub use standings::{compute_standings, ordered_disciplines, DisciplineBoard, StandingRow, StandingsPass};
pub use store::CompetitionStore;

/// Single error surface for orchestration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// Local I/O or data-shape failure (files, JSON, tables).
    #[error("I/O error: {0}")]
    Io(String),
    /// The record store refused or failed the request.
    #[error("the record store rejected the request ({status}): {msg}")]
    Backend { status: u16, msg: String },
    /// The store could not be reached.
    #[error("the record store could not be reached: {0}")]
    Transport(String),

    #[error("competitor {0} is not registered for this competition")]
    NotParticipant(CompetitorId),
    #[error("discipline {0} is not part of this competition")]
    DisciplineNotInCompetition(DisciplineRef),
    /// A submission code named a discipline we cannot resolve.
    #[error("discipline \"{0}\" does not match any discipline of this competition; please consult an official")]
    UnknownDiscipline(String),
    #[error("a result for {discipline} has already been submitted; ask an official to edit it")]
    DuplicateResult { competitor: CompetitorId, discipline: DisciplineRef },
    #[error("no result of {competitor} for {discipline}")]
    ResultNotFound { competitor: CompetitorId, discipline: DisciplineRef },
    #[error("invalid score: {0}")]
    InvalidScore(String),
    #[error(transparent)]
    Code(#[from] CodeError),
}

impl PipelineError {
    /// True for rejections of user input (as opposed to I/O or backend trouble).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, PipelineError::Io(_) | PipelineError::Backend { .. } | PipelineError::Transport(_))
    }
}

impl From<IoError> for PipelineError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Backend { status, msg } => PipelineError::Backend { status, msg },
            IoError::Transport(m) => PipelineError::Transport(m),
            other => PipelineError::Io(other.to_string()),
        }
    }
}
