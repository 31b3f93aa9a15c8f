//! Window generators derived from a stream's own records.
//!
//! Both generators return plain [`Window`] lists that feed
//! [`SegmentEngine::create_segments_from`](crate::SegmentEngine::create_segments_from).
//! Names are `label` followed by a 1-based counter.

use serde::Serialize;
use serde_json::Value;

use crate::segment::Window;
use crate::stream::LogStream;

/// Windows spanning every gap of at least `min_gap_ms` between consecutive records.
///
/// Each window runs from the record before the gap to the record after it,
/// so both bordering records fall inside it.
pub fn deadspace_windows<P>(stream: &LogStream<P>, min_gap_ms: u64, label: &str) -> Vec<Window> {
    stream
        .entries()
        .windows(2)
        .filter_map(|pair| {
            let (prev, next) = (pair[0].timestamp(), pair[1].timestamp());
            (next.millis_since(prev) >= min_gap_ms).then_some((prev, next))
        })
        .enumerate()
        .map(|(i, (start, end))| Window::new(format!("{label}{}", i + 1), start, end))
        .collect()
}

/// Windows around every record whose payload has `field == value`.
///
/// Each window starts `before_ms` before the matching record and ends
/// `after_ms` after it, clamped at the epoch.
pub fn windows_around<P: Serialize>(
    stream: &LogStream<P>,
    field: &str,
    value: &Value,
    before_ms: u64,
    after_ms: u64,
    label: &str,
) -> Vec<Window> {
    stream
        .matching_field(field, value)
        .enumerate()
        .map(|(i, entry)| {
            let ts = entry.timestamp();
            Window::new(
                format!("{label}{}", i + 1),
                ts.saturating_sub_millis(before_ms),
                ts.saturating_add_millis(after_ms),
            )
        })
        .collect()
}
