//! Around command: segments the time surrounding matching records.

use anyhow::Result;
use distill_core::windows::windows_around;
use distill_core::{KeyFields, Schema};

use super::segment::{print_segments, segment_stream};
use super::util::{load_stream, parse_value};
use crate::cli::InputArgs;
use crate::config::Config;

/// Where and how wide to cut around matches.
#[derive(Debug, Clone)]
pub struct AroundOptions<'a> {
    pub field: &'a str,
    pub value: &'a str,
    pub before_ms: u64,
    pub after_ms: u64,
    pub label: &'a str,
}

/// Runs the around command.
pub fn run<S>(
    schema: &S,
    input: &InputArgs,
    options: &AroundOptions<'_>,
    config: &Config,
) -> Result<()>
where
    S: Schema,
    S::Payload: KeyFields,
{
    let stream = load_stream(schema, input, config)?;
    let value = parse_value(options.value);
    let windows = windows_around(
        &stream,
        options.field,
        &value,
        options.before_ms,
        options.after_ms,
        options.label,
    );
    tracing::debug!(field = options.field, %value, matches = windows.len(), "matched records");

    let segments = segment_stream(&stream, &windows, config)?;
    print_segments(&segments, input.json)
}
