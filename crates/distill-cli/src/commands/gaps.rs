//! Gaps command: segments the idle stretches of a stream.

use anyhow::Result;
use distill_core::windows::deadspace_windows;
use distill_core::{KeyFields, Schema};

use super::segment::{print_segments, segment_stream};
use super::util::load_stream;
use crate::cli::InputArgs;
use crate::config::Config;

/// Runs the gaps command.
pub fn run<S>(
    schema: &S,
    input: &InputArgs,
    min_gap_ms: u64,
    label: &str,
    config: &Config,
) -> Result<()>
where
    S: Schema,
    S::Payload: KeyFields,
{
    let stream = load_stream(schema, input, config)?;
    let windows = deadspace_windows(&stream, min_gap_ms, label);
    tracing::debug!(min_gap_ms, gaps = windows.len(), "found gaps");

    let segments = segment_stream(&stream, &windows, config)?;
    print_segments(&segments, input.json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use distill_core::{LogStream, UserAleSchema, default_key};
    use insta::assert_snapshot;
    use serde_json::json;

    use crate::commands::segment::format_segments;

    #[test]
    fn test_gap_segments_hold_bordering_records() {
        let records: Vec<_> = [0_i64, 100, 200, 5_200, 5_300, 20_000]
            .iter()
            .map(|t| json!({"sessionID": "s", "clientTime": t, "logType": "raw", "type": "move"}))
            .collect();
        let stream = LogStream::build(records, &UserAleSchema, default_key).unwrap();

        let windows = deadspace_windows(&stream, 1_000, "idle");
        let segments = segment_stream(&stream, &windows, &Config::default()).unwrap();

        assert_snapshot!(format_segments(&segments), @r"
        SEGMENT  RECORDS  START                     END
        idle1          2  1970-01-01T00:00:00.200Z  1970-01-01T00:00:05.200Z
        idle2          2  1970-01-01T00:00:05.300Z  1970-01-01T00:00:20.000Z
        ");
    }
}
