//! ms_core: Core types for the memory-sports championship engine.
//!
//! This crate is **I/O-free**. It defines the stable types used across the
//! workspace (`ms_io`, `ms_algo`, `ms_pipeline`, `ms_report`, `ms_cli`).
//!
//! - Identifier tokens: `CompetitorId`, `CompetitionId`, `DisciplineRef`
//! - Discipline definitions: `ScoringFamily`, `ScoringStandard`, `Discipline`,
//!   and the static `DisciplineCatalogue`
//! - Records: `AttemptResult`, `Competitor`, `Competition`, `CompetitorTotal`,
//!   `ImportedRow`
//! - Integer-first numerics: `Points` (hundredths)
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod discipline;
pub mod entities;
pub mod errors;
pub mod ids;
pub mod points;

pub use discipline::{Discipline, DisciplineCatalogue, ScoringFamily, ScoringStandard};
pub use entities::{AttemptResult, Competition, Competitor, CompetitorTotal, ImportedRow};
pub use errors::CoreError;
pub use ids::{CompetitionId, CompetitorId, DisciplineRef};
pub use points::Points;
