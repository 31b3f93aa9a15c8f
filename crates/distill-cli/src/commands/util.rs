//! Shared utilities for CLI commands.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use distill_core::{
    BuildOptions, InvalidRecordPolicy, KeyFields, LogStream, RawRecord, Schema, Timestamp, Window,
    default_key,
};
use serde_json::Value;

use crate::cli::InputArgs;
use crate::config::Config;

/// Reads raw records from a file, or stdin when the path is `-`.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    parse_records(&content)
}

/// Splits file content into raw records.
///
/// Content starting with `[` is a JSON array of records, and content that
/// parses as one JSON object is a single record. Anything else is JSON
/// Lines: each non-blank line is one record, left unparsed so that malformed
/// lines surface as per-record validation errors. A leading byte-order mark
/// is ignored.
pub fn parse_records(content: &str) -> Result<Vec<RawRecord>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> =
            serde_json::from_str(trimmed).context("failed to parse JSON array of records")?;
        return Ok(values.into_iter().map(RawRecord::from).collect());
    }
    if trimmed.starts_with('{') {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
            return Ok(vec![RawRecord::from(value)]);
        }
    }
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(RawRecord::from)
        .collect())
}

/// Reads `input.file` and builds a stream with the default key policy.
///
/// `--skip-invalid` overrides the configured policy. Skipped records are
/// reported on stderr.
pub fn load_stream<S>(schema: &S, input: &InputArgs, config: &Config) -> Result<LogStream<S::Payload>>
where
    S: Schema,
    S::Payload: KeyFields,
{
    let raw = read_records(&input.file)?;
    let on_invalid = if input.skip_invalid {
        InvalidRecordPolicy::Skip
    } else {
        config.on_invalid
    };

    let built = LogStream::build_with(raw, schema, default_key, BuildOptions { on_invalid })
        .with_context(|| format!("failed to load logs from {}", input.file.display()))?;

    for rejected in &built.rejected {
        eprintln!("warning: {rejected}");
    }
    Ok(built.stream)
}

/// Parses a time as epoch milliseconds or RFC 3339.
pub fn parse_time(s: &str) -> Result<Timestamp, String> {
    if let Ok(millis) = s.parse::<u64>() {
        return Ok(Timestamp::from(millis));
    }
    let dt = DateTime::parse_from_rfc3339(s).map_err(|_| {
        format!("invalid time `{s}`; use epoch milliseconds or RFC 3339 (e.g., 2026-01-15T10:30:00Z)")
    })?;
    Timestamp::from_millis(dt.timestamp_millis()).map_err(|e| format!("invalid time `{s}`: {e}"))
}

/// Parses a window given as `NAME=START..END`.
pub fn parse_window(s: &str) -> Result<Window, String> {
    let (name, range) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid window `{s}`; expected NAME=START..END"))?;
    if name.is_empty() {
        return Err(format!("invalid window `{s}`; name cannot be empty"));
    }
    let (start, end) = range
        .split_once("..")
        .ok_or_else(|| format!("invalid window `{s}`; expected NAME=START..END"))?;
    Ok(Window::new(name, parse_time(start)?, parse_time(end)?))
}

/// Parses a match value as JSON, falling back to a plain string.
pub fn parse_value(s: &str) -> Value {
    serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))
}
