//! Segment command and shared segment rendering.
//!
//! `distill segment` takes explicit windows. The `gaps` and `around`
//! commands generate windows and reuse [`print_segments`].

use std::fmt::Write;

use anyhow::{Context, Result};
use distill_core::{KeyFields, LogStream, Schema, SegmentEngine, Segments, Window};
use serde::Serialize;

use super::util::load_stream;
use crate::cli::InputArgs;
use crate::config::Config;

/// Width of a millisecond RFC 3339 time.
const TIME_WIDTH: usize = 24;

/// Segments `stream` with the configured duplicate-name policy.
pub fn segment_stream<'a, P: Sync>(
    stream: &'a LogStream<P>,
    windows: &[Window],
    config: &Config,
) -> Result<Segments<'a, P>> {
    SegmentEngine::new(config.duplicate_segment_names)
        .create_segments_from(stream, windows)
        .context("failed to segment logs")
}

/// Format segments for human-readable output.
pub fn format_segments<P>(segments: &Segments<'_, P>) -> String {
    let mut output = String::new();

    if segments.is_empty() {
        writeln!(output, "No segments.").unwrap();
        return output;
    }

    let name_width = segments
        .names()
        .map(|name| name.chars().count())
        .chain(std::iter::once("SEGMENT".len()))
        .max()
        .unwrap_or_default();

    writeln!(
        output,
        "{:<name_width$}  {:>7}  {:<TIME_WIDTH$}  END",
        "SEGMENT", "RECORDS", "START"
    )
    .unwrap();

    for segment in segments.iter() {
        let range = segment.time_range();
        writeln!(
            output,
            "{:<name_width$}  {:>7}  {:<TIME_WIDTH$}  {}",
            segment.name(),
            segment.count(),
            range.start.to_rfc3339(),
            range.end.to_rfc3339()
        )
        .unwrap();
    }

    output
}

/// Format segments as JSON, keyed by name.
pub fn format_segments_json<P: Serialize>(segments: &Segments<'_, P>) -> Result<String> {
    Ok(serde_json::to_string_pretty(segments)?)
}

/// Prints segments to stdout in the requested format.
pub fn print_segments<P: Serialize>(segments: &Segments<'_, P>, json: bool) -> Result<()> {
    if json {
        println!("{}", format_segments_json(segments)?);
    } else {
        print!("{}", format_segments(segments));
    }
    Ok(())
}

/// Runs the segment command.
pub fn run<S>(schema: &S, input: &InputArgs, windows: &[Window], config: &Config) -> Result<()>
where
    S: Schema,
    S::Payload: KeyFields,
{
    let stream = load_stream(schema, input, config)?;
    let segments = segment_stream(&stream, windows, config)?;
    tracing::debug!(
        records = stream.len(),
        segments = segments.len(),
        "segmented logs"
    );
    print_segments(&segments, input.json)
}
