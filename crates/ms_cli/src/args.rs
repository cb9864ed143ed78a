// crates/ms_cli/src/args.rs
//
// Argument surface for `ms`: one subcommand per engine operation.
// Snapshot inputs are local JSON files; only `submit --api` talks to a server.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "ms",
    disable_help_subcommand = true,
    about = "Scoring, ranking and result intake for memory-sports championships"
)]
pub struct Args {
    /// Debug-level logging on stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Overall standings: position, name, rounded and unrounded total.
    Standings(SnapshotArgs),
    /// Ranked results of one discipline.
    Leaderboard {
        #[command(flatten)]
        snapshot: SnapshotArgs,
        /// Discipline ref (e.g. 5N1) or catalogue label.
        #[arg(long)]
        discipline: String,
    },
    /// Per-discipline completion state and the competition rollup.
    Status(SnapshotArgs),
    /// Standings export as CSV or JSON.
    Export {
        #[command(flatten)]
        snapshot: SnapshotArgs,
        #[arg(long, value_enum)]
        format: ExportFormat,
        /// Output file (stdout when omitted).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Decode a submission code and check its age.
    Decode {
        /// Code file, or `-` for stdin.
        #[arg(long)]
        code: PathBuf,
        #[command(flatten)]
        intake: IntakeArgs,
    },
    /// Dry-run a participant import against the user directory.
    ImportCheck {
        /// Pasted rows (tab- or comma-separated).
        #[arg(long)]
        rows: PathBuf,
        #[arg(long)]
        users: PathBuf,
        #[arg(long, default_value_t = 0.85, value_parser = parse_threshold)]
        name_threshold: f64,
        #[arg(long, default_value_t = 0.8, value_parser = parse_threshold)]
        country_threshold: f64,
    },
    /// Submit a result from a code on behalf of a competitor.
    Submit {
        /// Directory holding `competition-<id>.json` and `users.json`.
        #[arg(long, required_unless_present = "api", conflicts_with = "api")]
        data_dir: Option<PathBuf>,
        /// Record store base URL (token from MS_API_TOKEN).
        #[arg(long)]
        api: Option<String>,
        #[arg(long)]
        competition_id: String,
        #[arg(long)]
        competitor: String,
        /// Code file, or `-` for stdin.
        #[arg(long)]
        code: PathBuf,
        #[arg(long)]
        catalogue: Option<PathBuf>,
        #[command(flatten)]
        intake: IntakeArgs,
    },
}

/// A competition snapshot plus the directory and catalogue it is read with.
#[derive(Debug, ClapArgs, Clone)]
pub struct SnapshotArgs {
    /// Competition JSON (backend wire shape).
    #[arg(long)]
    pub competition: PathBuf,
    /// User directory JSON; names fall back to ids without it.
    #[arg(long)]
    pub users: Option<PathBuf>,
    /// Discipline catalogue JSON (built-in catalogue when omitted).
    #[arg(long)]
    pub catalogue: Option<PathBuf>,
}

#[derive(Debug, ClapArgs, Clone)]
pub struct IntakeArgs {
    /// Reference time (RFC 3339); defaults to the current time.
    #[arg(long, value_parser = parse_now)]
    pub now: Option<DateTime<Utc>>,
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(i64).range(1..=525_600))]
    pub max_age_minutes: i64,
    /// Reject codes without a timestamp.
    #[arg(long)]
    pub require_timestamp: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Errors surfaced by argument validation after clap.
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            NonLocalPath(p) => write!(f, "path must be a local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

pub fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("expected RFC 3339 time: {e}"))
}

pub fn parse_threshold(s: &str) -> Result<f64, String> {
    match s.trim().parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err("threshold must be a number in 0..=1".into()),
    }
}

/// Parse then validate local input paths. Clap handles its own usage errors (exit 2).
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    validate(&args)?;
    Ok(args)
}

fn validate(args: &Args) -> Result<(), CliError> {
    for (label, p) in input_paths(args) {
        ensure_local_exists(p, label)?;
    }
    if let Command::Export { out: Some(out), .. } = &args.command {
        ensure_local_path(out)?;
    }
    if let Command::Submit { data_dir: Some(dir), .. } = &args.command {
        ensure_local_path(dir)?;
        if !dir.is_dir() {
            return Err(CliError::NotFound(format!("--data-dir {}", dir.display())));
        }
    }
    Ok(())
}

/// Every file the command reads, with its flag name. `-` (stdin) is skipped.
fn input_paths(args: &Args) -> Vec<(&'static str, &Path)> {
    let mut v: Vec<(&'static str, &Path)> = Vec::new();
    match &args.command {
        Command::Standings(s) | Command::Status(s) => push_snapshot(&mut v, s),
        Command::Leaderboard { snapshot, .. } | Command::Export { snapshot, .. } => push_snapshot(&mut v, snapshot),
        Command::Decode { code, .. } => push_code(&mut v, code),
        Command::ImportCheck { rows, users, .. } => {
            v.push(("--rows", rows.as_path()));
            v.push(("--users", users.as_path()));
        }
        Command::Submit { code, catalogue, .. } => {
            push_code(&mut v, code);
            if let Some(c) = catalogue {
                v.push(("--catalogue", c.as_path()));
            }
        }
    }
    v
}

fn push_snapshot<'a>(v: &mut Vec<(&'static str, &'a Path)>, s: &'a SnapshotArgs) {
    v.push(("--competition", s.competition.as_path()));
    if let Some(u) = &s.users {
        v.push(("--users", u.as_path()));
    }
    if let Some(c) = &s.catalogue {
        v.push(("--catalogue", c.as_path()));
    }
}

fn push_code<'a>(v: &mut Vec<(&'static str, &'a Path)>, code: &'a Path) {
    if !is_stdin(code) {
        v.push(("--code", code));
    }
}

pub fn is_stdin(p: &Path) -> bool {
    p.as_os_str() == "-"
}

/// Reject any explicit URI scheme (e.g., http://, https://, file://).
#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    if !p.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("https://example.org/c.json"));
        assert!(has_scheme("file:/tmp/x"));
        assert!(!has_scheme("data/competition.json"));
    }

    #[test]
    fn now_must_be_rfc3339() {
        assert!(parse_now("2024-06-01T12:00:00Z").is_ok());
        assert!(parse_now("2024-06-01 12:00").is_err());
    }

    #[test]
    fn thresholds_are_fractions() {
        assert_eq!(parse_threshold("0.9"), Ok(0.9));
        assert!(parse_threshold("1.5").is_err());
        assert!(parse_threshold("x").is_err());
    }

    #[test]
    fn submit_needs_a_store() {
        let r = Args::try_parse_from(["ms", "submit", "--competition-id", "c", "--competitor", "u1", "--code", "-"]);
        assert!(r.is_err());
        let r = Args::try_parse_from([
            "ms", "submit", "--data-dir", ".", "--competition-id", "c", "--competitor", "u1", "--code", "-",
        ]);
        assert!(r.is_ok());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
