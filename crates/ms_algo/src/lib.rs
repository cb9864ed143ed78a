// crates/ms_algo/src/lib.rs
//! ms_algo: pure scoring algorithms over `ms_core` types.
//!
//! raw results → [`calculator`] (champion points per result)
//!             → [`aggregate`] (best attempt per group + sum)
//!             → [`rank`] (stable sort, positional ranks)
//!
//! plus [`completion`] (per-discipline completion state) and [`matcher`]
//! (duplicate detection for imported participants). No I/O, no clocks, no RNG:
//! every function is a deterministic function of its inputs.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod calculator;
pub mod completion;
pub mod rank;

#[cfg(feature = "matcher")]
pub mod countries;
#[cfg(feature = "matcher")]
pub mod matcher;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use aggregate::{aggregate, competition_totals, select_counted, CountedAttempts};
pub use calculator::{compute_points, points_for, result_points};
pub use completion::{competition_status, discipline_status, CompletionSummary, DisciplineStatus};
pub use rank::{discipline_leaderboard, rank, LeaderboardEntry, Standing};

#[cfg(feature = "matcher")]
pub use matcher::{
    find_matches, name_similarity, normalize_country, Candidate, CountryMatch, RowMatches,
    DEFAULT_COUNTRY_THRESHOLD, DEFAULT_NAME_THRESHOLD, UNRECOGNIZED_COUNTRY,
};
