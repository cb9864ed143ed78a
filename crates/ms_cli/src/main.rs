// crates/ms_cli/src/main.rs
//
// Wires up exit codes, typed error mapping, logging and the subcommands.
// Reading commands work on local snapshots; `submit` writes through a backend.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Rejected input: malformed files, bad codes, refused submissions.
    pub const VALIDATION: i32 = 2;
    /// Files, network or record store unavailable.
    pub const IO: i32 = 4;
}

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use args::{is_stdin, parse_and_validate as parse_cli, Args, Command, ExportFormat, IntakeArgs, SnapshotArgs};
use ms_core::{Competition, CompetitionId, Competitor, CompetitorId, DisciplineCatalogue};
use ms_io::backend::{ApiContext, Backend, FileBackend};
use ms_io::submission_code::{self, CodeError, CodeFormat};
use ms_io::{canonical_json, catalogue, snapshot, IoError};
use ms_pipeline::import::ImportThresholds;
use ms_pipeline::intake::resolve_discipline;
use ms_pipeline::{compute_standings, plan_import, submit_code, CompetitionStore, IntakePolicy, PipelineError, RowStatus};
use ms_report::{build_report, ReportError};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    Validation(String),
    Io(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) | MainError::Io(m) => f.write_str(m),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ms: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_logging(args.verbose);

    let rc = match run(&args) {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            eprintln!("ms: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// `RUST_LOG` wins; otherwise `warn`, or `debug` with `--verbose`. Logs go to stderr.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn map_error(e: &MainError) -> i32 {
    match e {
        MainError::Validation(_) => exitcodes::VALIDATION,
        MainError::Io(_) => exitcodes::IO,
    }
}

fn map_io_err(e: IoError) -> MainError {
    use IoError::*;
    match e {
        Json { .. } | Table { .. } | Invalid(_) => MainError::Validation(e.to_string()),
        Path(_) | Backend { .. } | Transport(_) => MainError::Io(e.to_string()),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    if e.is_rejection() {
        MainError::Validation(e.to_string())
    } else {
        MainError::Io(e.to_string())
    }
}

fn map_code_err(e: CodeError) -> MainError {
    MainError::Validation(e.to_string())
}

fn map_report_err(e: ReportError) -> MainError {
    match e {
        ReportError::Inconsistent(m) => MainError::Validation(format!("report: {m}")),
        ReportError::Serialize(m) => MainError::Io(format!("report: {m}")),
    }
}

fn run(args: &Args) -> Result<(), MainError> {
    match &args.command {
        Command::Standings(s) => standings(s),
        Command::Leaderboard { snapshot, discipline } => leaderboard(snapshot, discipline),
        Command::Status(s) => status(s),
        Command::Export { snapshot, format, out } => export(snapshot, *format, out.as_deref()),
        Command::Decode { code, intake } => decode(code, intake),
        Command::ImportCheck { rows, users, name_threshold, country_threshold } => import_check(
            rows,
            users,
            ImportThresholds { name: *name_threshold, country: *country_threshold },
        ),
        Command::Submit { data_dir, api, competition_id, competitor, code, catalogue, intake } => {
            let id: CompetitionId = competition_id.parse().map_err(|e| MainError::Validation(format!("--competition-id: {e}")))?;
            let competitor: CompetitorId =
                competitor.parse().map_err(|e| MainError::Validation(format!("--competitor: {e}")))?;
            let cat = load_catalogue(catalogue.as_deref())?;
            let text = read_code(code)?;
            let req = SubmitRequest { id, competitor, cat, text, policy: policy(intake), now: intake.now.unwrap_or_else(Utc::now) };
            match (data_dir, api) {
                (Some(dir), _) => submit(FileBackend::new(dir), ApiContext::offline(), req),
                (None, Some(url)) => submit_remote(url, req),
                (None, None) => Err(MainError::Validation("either --data-dir or --api is required".into())),
            }
        }
    }
}

/* ----------------------- inputs ----------------------- */

struct Loaded {
    competition: Competition,
    users: Vec<Competitor>,
    catalogue: DisciplineCatalogue,
}

fn load(s: &SnapshotArgs) -> Result<Loaded, MainError> {
    let competition = snapshot::load_competition(&s.competition).map_err(map_io_err)?;
    let users = match &s.users {
        Some(p) => snapshot::load_users(p).map_err(map_io_err)?,
        None => Vec::new(),
    };
    let catalogue = load_catalogue(s.catalogue.as_deref())?;
    tracing::debug!(
        disciplines = competition.disciplines.len(),
        participants = competition.participants.len(),
        results = competition.results.len(),
        "snapshot loaded"
    );
    Ok(Loaded { competition, users, catalogue })
}

fn load_catalogue(path: Option<&Path>) -> Result<DisciplineCatalogue, MainError> {
    match path {
        Some(p) => catalogue::load_catalogue(p).map_err(map_io_err),
        None => Ok(DisciplineCatalogue::builtin()),
    }
}

fn read_code(path: &Path) -> Result<String, MainError> {
    if is_stdin(path) {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s).map_err(|e| MainError::Io(format!("read stdin: {e}")))?;
        Ok(s)
    } else {
        fs::read_to_string(path).map_err(|e| MainError::Io(format!("read {}: {e}", path.display())))
    }
}

fn policy(intake: &IntakeArgs) -> IntakePolicy {
    IntakePolicy {
        max_code_age: Duration::minutes(intake.max_age_minutes),
        require_timestamp: intake.require_timestamp,
    }
}

fn emit(text: &str) -> Result<(), MainError> {
    let mut out = io::stdout().lock();
    out.write_all(text.as_bytes()).map_err(|e| MainError::Io(format!("write stdout: {e}")))
}

/* ----------------------- reading commands ----------------------- */

fn standings(s: &SnapshotArgs) -> Result<(), MainError> {
    let l = load(s)?;
    let pass = compute_standings(&l.competition, &l.users, &l.catalogue).map_err(map_pipeline_err)?;
    let mut text = String::from("position\tname\ttotal\tunrounded\n");
    for row in &pass.standings {
        text.push_str(&format!("{}\t{}\t{}\t{}\n", row.position, row.name, row.rounded_total, row.total));
    }
    emit(&text)
}

fn leaderboard(s: &SnapshotArgs, name: &str) -> Result<(), MainError> {
    let l = load(s)?;
    let discipline = resolve_discipline(&l.competition, &l.catalogue, name)
        .ok_or_else(|| MainError::Validation(format!("discipline {name:?} is not part of this competition")))?;
    let pass = compute_standings(&l.competition, &l.users, &l.catalogue).map_err(map_pipeline_err)?;
    let board = pass
        .board(&discipline)
        .ok_or_else(|| MainError::Validation(format!("no leaderboard for {discipline}")))?;

    let names = ms_pipeline::standings::display_names(&l.users);
    let mut text = format!("# {}\nposition\tname\tscore\ttime\tpoints\n", board.label);
    for e in &board.entries {
        let name = names.get(&e.competitor_id).cloned().unwrap_or_else(|| e.competitor_id.to_string());
        let time = e.time.map(|t| t.to_string()).unwrap_or_default();
        let mark = if e.provisional { "\tprovisional" } else { "" };
        text.push_str(&format!("{}\t{}\t{}\t{}\t{}{}\n", e.position, name, e.raw_score, time, e.points, mark));
    }
    emit(&text)
}

fn status(s: &SnapshotArgs) -> Result<(), MainError> {
    let l = load(s)?;
    let summary = ms_algo::competition_status(&l.competition, &l.catalogue);
    let mut text = String::new();
    for (d, st) in &summary.per_discipline {
        let label = l.catalogue.get(d).map(|x| x.label.as_str()).unwrap_or(d.as_str());
        text.push_str(&format!("{d}\t{label}\t{}\n", st.as_str()));
    }
    text.push_str(&format!("complete: {}\n", if summary.complete { "yes" } else { "no" }));
    emit(&text)
}

fn export(s: &SnapshotArgs, format: ExportFormat, out: Option<&Path>) -> Result<(), MainError> {
    let l = load(s)?;
    let pass = compute_standings(&l.competition, &l.users, &l.catalogue).map_err(map_pipeline_err)?;
    let report = build_report(&l.competition, &l.catalogue, &pass).map_err(map_report_err)?;
    let body = match format {
        ExportFormat::Csv => ms_report::render_csv(&report),
        ExportFormat::Json => ms_report::render_json_string(&report).map_err(map_report_err)?,
    };
    match out {
        Some(path) => {
            canonical_json::write_bytes_replacing(path, body.as_bytes()).map_err(map_io_err)?;
            tracing::info!(path = %path.display(), rows = report.rows.len(), "export written");
            Ok(())
        }
        None => emit(&body),
    }
}

fn decode(code: &Path, intake: &IntakeArgs) -> Result<(), MainError> {
    let text = read_code(code)?;
    let decoded = submission_code::decode(&text).map_err(map_code_err)?;
    if decoded.timestamp.is_none() && intake.require_timestamp {
        return Err(map_code_err(CodeError::MissingTimestamp));
    }
    let now = intake.now.unwrap_or_else(Utc::now);
    submission_code::check_fresh(&decoded, now, Duration::minutes(intake.max_age_minutes)).map_err(map_code_err)?;

    let format = match decoded.format {
        CodeFormat::LegacyLine => "legacy_line",
        CodeFormat::LegacyBlock => "legacy_block",
        CodeFormat::JsonV1 => "json_v1",
    };
    let v = json!({
        "discipline": decoded.discipline,
        "score": decoded.score,
        "time": decoded.time,
        "timestamp": decoded.timestamp.map(|t| t.to_rfc3339()),
        "additional_info": decoded.additional_info,
        "format": format,
    });
    let mut s = serde_json::to_string_pretty(&v).map_err(|e| MainError::Io(e.to_string()))?;
    s.push('\n');
    emit(&s)
}

fn import_check(rows: &Path, users: &Path, thresholds: ImportThresholds) -> Result<(), MainError> {
    let text = fs::read_to_string(rows).map_err(|e| MainError::Io(format!("read {}: {e}", rows.display())))?;
    let users = snapshot::load_users(users).map_err(map_io_err)?;
    let plan = plan_import(&text, &users, thresholds).map_err(map_pipeline_err)?;

    let mut out = String::new();
    for p in &plan.rows {
        let verdict = match &p.status {
            RowStatus::CreateNew => "new".to_string(),
            RowStatus::NeedsReview { candidates } => {
                let list: Vec<String> =
                    candidates.iter().map(|c| format!("{} ({:.2})", c.competitor.id, c.similarity)).collect();
                format!("review: {}", list.join(", "))
            }
            RowStatus::UnrecognizedCountry { input } => format!("unrecognized country: {input}"),
        };
        let country = p.row.country.as_deref().unwrap_or("");
        out.push_str(&format!("{}\t{}\t{}\t{}\n", p.index + 1, p.row.full_name(), country, verdict));
    }
    out.push_str(&format!("{} row(s), {} need review\n", plan.rows.len(), plan.needing_review().count()));
    emit(&out)
}

/* ----------------------- submit ----------------------- */

struct SubmitRequest {
    id: CompetitionId,
    competitor: CompetitorId,
    cat: DisciplineCatalogue,
    text: String,
    policy: IntakePolicy,
    now: chrono::DateTime<Utc>,
}

fn submit<B: Backend>(backend: B, ctx: ApiContext, req: SubmitRequest) -> Result<(), MainError> {
    let mut store = CompetitionStore::new(backend, ctx, req.id);
    let stored = submit_code(&mut store, &req.cat, &req.competitor, &req.text, req.now, &req.policy)
        .map_err(map_pipeline_err)?;
    let mut line = format!("accepted: {} {} {}", stored.competitor_id, stored.discipline_ref, stored.raw_score);
    if let Some(t) = stored.time {
        line.push_str(&format!(" time={t}"));
    }
    if stored.provisional {
        line.push_str(" (provisional, awaiting review)");
    }
    line.push('\n');
    emit(&line)
}

#[cfg(feature = "remote")]
fn submit_remote(url: &str, req: SubmitRequest) -> Result<(), MainError> {
    let ctx = ApiContext::new(url, std::env::var("MS_API_TOKEN").ok());
    if ctx.token.is_none() {
        tracing::warn!("MS_API_TOKEN is not set; sending unauthenticated requests");
    }
    submit(ms_io::remote::HttpBackend::new(), ctx, req)
}

#[cfg(not(feature = "remote"))]
fn submit_remote(_url: &str, _req: SubmitRequest) -> Result<(), MainError> {
    Err(MainError::Validation("--api needs a build with the `remote` feature".into()))
}
