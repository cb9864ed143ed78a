//! Score-submission codes.
//!
//! Competitors paste a code produced by the companion timing tool. The engine
//! receives the decrypted plaintext in one of three shapes:
//!
//! 1. legacy single line:
//!    `Discipline: 5-Minute Numbers // Score: 410 // Time:40.5 // Timestamp: 2024-05-01 10:00:00`
//!    (`Time` and `Timestamp` optional);
//! 2. legacy word-memory block: `Discipline:` line, `Score:` line, free-text
//!    additional-info lines, final `Timestamp:` line;
//! 3. versioned JSON: `{"v":1,"discipline":..,"score":..,"time":..,"timestamp":..,"info":..}`.
//!
//! Timestamps are RFC 3339, or naive `YYYY-MM-DD HH:MM:SS` read as UTC.

use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Codes older than this are rejected.
pub const DEFAULT_MAX_AGE_MINUTES: i64 = 60;

/// Clock skew tolerated between the timing tool and this host.
pub const MAX_CLOCK_SKEW_MINUTES: i64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeFormat {
    LegacyLine,
    LegacyBlock,
    JsonV1,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DecodedSubmission {
    /// Discipline name as written in the code (label or ref).
    pub discipline: String,
    pub score: f64,
    pub time: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
    pub additional_info: Option<String>,
    pub format: CodeFormat,
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CodeError {
    #[error("this code could not be processed: {0}")]
    Malformed(String),

    #[error("this code has expired ({age_minutes} minutes old, limit {max_minutes})")]
    Expired { age_minutes: i64, max_minutes: i64 },

    #[error("this code carries no timestamp")]
    MissingTimestamp,

    #[error("this code is dated {ahead_minutes} minutes in the future")]
    FromTheFuture { ahead_minutes: i64 },
}

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^discipline:\s*(?P<d>.+?)\s*//\s*score:\s*(?P<s>[-+]?[0-9]*\.?[0-9]+)\s*(?://\s*time:\s*(?P<t>[0-9]*\.?[0-9]+)\s*)?(?://\s*timestamp:\s*(?P<ts>.+?)\s*)?$",
        )
        .expect("static pattern")
    })
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(?P<k>discipline|score|timestamp):\s*(?P<v>.*?)\s*$").expect("static pattern"))
}

/// Decode plaintext into a submission. Does not check freshness.
pub fn decode(text: &str) -> Result<DecodedSubmission, CodeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CodeError::Malformed("empty code".into()));
    }
    if text.starts_with('{') {
        return decode_json(text);
    }
    if !text.contains('\n') {
        return decode_line(text);
    }
    decode_block(text)
}

fn decode_line(text: &str) -> Result<DecodedSubmission, CodeError> {
    let caps = line_re()
        .captures(text)
        .ok_or_else(|| CodeError::Malformed("unrecognized layout".into()))?;
    let time = match caps.name("t") {
        Some(t) => Some(parse_number(t.as_str())?),
        None => None,
    };
    let timestamp = match caps.name("ts") {
        Some(ts) => Some(parse_timestamp(ts.as_str())?),
        None => None,
    };
    Ok(DecodedSubmission {
        discipline: caps["d"].to_string(),
        score: parse_number(&caps["s"])?,
        time,
        timestamp,
        additional_info: None,
        format: CodeFormat::LegacyLine,
    })
}

fn decode_block(text: &str) -> Result<DecodedSubmission, CodeError> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let field = |line: &str, key: &str| -> Option<String> {
        field_re()
            .captures(line)
            .filter(|c| c["k"].eq_ignore_ascii_case(key))
            .map(|c| c["v"].to_string())
    };

    let (first, rest) = lines.split_first().ok_or_else(|| CodeError::Malformed("empty code".into()))?;
    let discipline = field(first, "discipline")
        .filter(|d| !d.is_empty())
        .ok_or_else(|| CodeError::Malformed("missing discipline line".into()))?;
    let (second, mut body) = rest
        .split_first()
        .ok_or_else(|| CodeError::Malformed("missing score line".into()))?;
    let score = field(second, "score").ok_or_else(|| CodeError::Malformed("missing score line".into()))?;
    let score = parse_number(&score)?;

    let mut timestamp = None;
    if let Some((last, head)) = body.split_last() {
        if let Some(ts) = field(last, "timestamp") {
            timestamp = Some(parse_timestamp(&ts)?);
            body = head;
        }
    }
    let info = body.join("\n");

    Ok(DecodedSubmission {
        discipline,
        score,
        time: None,
        timestamp,
        additional_info: (!info.is_empty()).then_some(info),
        format: CodeFormat::LegacyBlock,
    })
}

fn decode_json(text: &str) -> Result<DecodedSubmission, CodeError> {
    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct V1 {
        v: u32,
        discipline: String,
        score: f64,
        #[serde(default)]
        time: Option<f64>,
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        info: Option<String>,
    }
    let raw: V1 = serde_json::from_str(text).map_err(|e| CodeError::Malformed(e.to_string()))?;
    if raw.v != 1 {
        return Err(CodeError::Malformed(format!("unsupported code version {}", raw.v)));
    }
    if !raw.score.is_finite() || raw.time.is_some_and(|t| !t.is_finite()) {
        return Err(CodeError::Malformed("non-finite number".into()));
    }
    let timestamp = match raw.timestamp.as_deref() {
        Some(ts) => Some(parse_timestamp(ts)?),
        None => None,
    };
    Ok(DecodedSubmission {
        discipline: raw.discipline.trim().to_string(),
        score: raw.score,
        time: raw.time,
        timestamp,
        additional_info: raw.info.filter(|s| !s.trim().is_empty()),
        format: CodeFormat::JsonV1,
    })
}

fn parse_number(s: &str) -> Result<f64, CodeError> {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| CodeError::Malformed(format!("not a number: {s:?}")))
}

/// RFC 3339, or a naive `YYYY-MM-DD[ T]HH:MM:SS[.fff]` taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, CodeError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CodeError::Malformed(format!("bad timestamp: {s:?}")))
}

/// Reject codes older than `max_age` at `now`, or dated ahead of `now` by
/// more than [`MAX_CLOCK_SKEW_MINUTES`]. A code without a timestamp passes
/// here; whether that is acceptable is the caller's policy.
pub fn check_fresh(decoded: &DecodedSubmission, now: DateTime<Utc>, max_age: Duration) -> Result<(), CodeError> {
    let Some(ts) = decoded.timestamp else {
        tracing::warn!(discipline = %decoded.discipline, "submission code has no timestamp");
        return Ok(());
    };
    let age = now.signed_duration_since(ts);
    if age < -Duration::minutes(MAX_CLOCK_SKEW_MINUTES) {
        return Err(CodeError::FromTheFuture { ahead_minutes: -age.num_minutes() });
    }
    if age > max_age {
        return Err(CodeError::Expired { age_minutes: age.num_minutes(), max_minutes: max_age.num_minutes() });
    }
    Ok(())
}

pub fn default_max_age() -> Duration {
    Duration::minutes(DEFAULT_MAX_AGE_MINUTES)
}
