//! Segmentation of a log stream into named time windows.
//!
//! # Algorithm
//!
//! 1. Validate the whole window specification (lengths, bounds, names)
//!    before touching the stream, so failures never yield partial output
//! 2. Because the stream's ordered view is sorted by timestamp, each
//!    window's members form a contiguous slice, found with two binary
//!    searches (first timestamp `>= start`, first timestamp `> end`)
//! 3. Windows are independent; they are evaluated in parallel and assembled
//!    into a map keyed by name
//!
//! Windows may overlap. A record belongs to every window whose inclusive
//! range contains its timestamp.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use rayon::prelude::*;
use serde::ser::{SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::LogRecord;
use crate::stream::{LogStream, StreamEntry};
use crate::timestamp::Timestamp;

/// Segmentation input errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// The number of names differs from the number of windows.
    #[error("{names} segment names but {windows} windows")]
    WindowSpecMismatch { names: usize, windows: usize },

    /// A window starts after it ends.
    #[error("window `{name}` starts at {start} after it ends at {end}")]
    InvalidWindow {
        name: String,
        start: Timestamp,
        end: Timestamp,
    },

    /// A name was used twice under [`DuplicateNamePolicy::Reject`].
    #[error("duplicate segment name `{name}`")]
    DuplicateSegmentName { name: String },
}

/// How repeated segment names are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateNamePolicy {
    /// Fail with [`SegmentError::DuplicateSegmentName`].
    #[default]
    Reject,
    /// The later window replaces the earlier one.
    Overwrite,
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeRange {
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Whether the two ranges share at least one instant.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// A named window specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub name: String,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Window {
    pub fn new(name: impl Into<String>, start: Timestamp, end: Timestamp) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }
}

/// The records of one window.
///
/// Borrows a contiguous slice of the stream's ordered view; the stream is
/// never copied or mutated.
#[derive(Debug)]
pub struct Segment<'a, P> {
    name: String,
    time_range: TimeRange,
    entries: &'a [StreamEntry<P>],
}

impl<P> Clone for Segment<'_, P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            time_range: self.time_range,
            entries: self.entries,
        }
    }
}

impl<'a, P> Segment<'a, P> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Number of records in the segment.
    pub const fn count(&self) -> usize {
        self.entries.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Members in stream order, with their keys.
    pub const fn entries(&self) -> &'a [StreamEntry<P>] {
        self.entries
    }

    /// Member records in stream order.
    pub fn records(&self) -> impl Iterator<Item = &'a LogRecord<P>> + use<'a, P> {
        self.entries.iter().map(StreamEntry::record)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|e| e.key().as_str() == key)
    }
}

/// Serializes as `{name, time_range, record_count, records}`.
impl<P: Serialize> Serialize for Segment<'_, P> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        struct Records<'r, P>(&'r [StreamEntry<P>]);

        impl<P: Serialize> Serialize for Records<'_, P> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
                for entry in self.0 {
                    seq.serialize_element(entry.record())?;
                }
                seq.end()
            }
        }

        let mut state = serializer.serialize_struct("Segment", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("time_range", &self.time_range)?;
        state.serialize_field("record_count", &self.count())?;
        state.serialize_field("records", &Records(self.entries))?;
        state.end()
    }
}

/// Segments keyed by name, iterated in name order.
#[derive(Debug)]
pub struct Segments<'a, P> {
    by_name: BTreeMap<String, Segment<'a, P>>,
}

impl<'a, P> Segments<'a, P> {
    pub fn get(&self, name: &str) -> Option<&Segment<'a, P>> {
        self.by_name.get(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment<'a, P>> {
        self.by_name.values()
    }

    pub fn into_map(self) -> BTreeMap<String, Segment<'a, P>> {
        self.by_name
    }
}

impl<P: Serialize> Serialize for Segments<'_, P> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_map(self.by_name.iter())
    }
}

/// Maps a log stream onto named windows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentEngine {
    duplicate_names: DuplicateNamePolicy,
}

impl SegmentEngine {
    pub const fn new(duplicate_names: DuplicateNamePolicy) -> Self {
        Self { duplicate_names }
    }

    pub const fn duplicate_names(&self) -> DuplicateNamePolicy {
        self.duplicate_names
    }

    /// Segments `stream` with parallel name and window lists.
    pub fn create_segments<'a, P, N>(
        &self,
        stream: &'a LogStream<P>,
        names: &[N],
        windows: &[(Timestamp, Timestamp)],
    ) -> Result<Segments<'a, P>, SegmentError>
    where
        P: Sync,
        N: AsRef<str>,
    {
        if names.len() != windows.len() {
            return Err(SegmentError::WindowSpecMismatch {
                names: names.len(),
                windows: windows.len(),
            });
        }
        let specs: Vec<Window> = names
            .iter()
            .zip(windows)
            .map(|(name, &(start, end))| Window {
                name: name.as_ref().to_string(),
                start,
                end,
            })
            .collect();
        self.segment_windows(stream, specs)
    }

    /// Segments `stream` with named windows.
    pub fn create_segments_from<'a, P: Sync>(
        &self,
        stream: &'a LogStream<P>,
        windows: &[Window],
    ) -> Result<Segments<'a, P>, SegmentError> {
        self.segment_windows(stream, windows.to_vec())
    }

    fn segment_windows<'a, P: Sync>(
        &self,
        stream: &'a LogStream<P>,
        windows: Vec<Window>,
    ) -> Result<Segments<'a, P>, SegmentError> {
        self.check_windows(&windows)?;

        let segments: Vec<Segment<'a, P>> = windows
            .into_par_iter()
            .map(|window| Segment {
                entries: stream.range(window.start, window.end),
                time_range: TimeRange {
                    start: window.start,
                    end: window.end,
                },
                name: window.name,
            })
            .collect();

        let mut by_name = BTreeMap::new();
        for segment in segments {
            // Input order is preserved by the parallel collect, so a later
            // window replaces an earlier one under `Overwrite`.
            by_name.insert(segment.name.clone(), segment);
        }

        tracing::debug!(
            records = stream.len(),
            segments = by_name.len(),
            "segmented log stream"
        );

        Ok(Segments { by_name })
    }

    fn check_windows(&self, windows: &[Window]) -> Result<(), SegmentError> {
        let mut seen = HashSet::with_capacity(windows.len());
        for window in windows {
            if window.start > window.end {
                return Err(SegmentError::InvalidWindow {
                    name: window.name.clone(),
                    start: window.start,
                    end: window.end,
                });
            }
            if !seen.insert(window.name.as_str()) {
                match self.duplicate_names {
                    DuplicateNamePolicy::Reject => {
                        return Err(SegmentError::DuplicateSegmentName {
                            name: window.name.clone(),
                        });
                    }
                    DuplicateNamePolicy::Overwrite => {
                        tracing::debug!(name = %window.name, "segment name reused; later window wins");
                    }
                }
            }
        }
        Ok(())
    }
}

/// Segments `stream` with the default engine (duplicate names rejected).
pub fn create_segments<'a, P, N>(
    stream: &'a LogStream<P>,
    names: &[N],
    windows: &[(Timestamp, Timestamp)],
) -> Result<Segments<'a, P>, SegmentError>
where
    P: Sync,
    N: AsRef<str>,
{
    SegmentEngine::default().create_segments(stream, names, windows)
}
