//! Log streams: uniquely keyed records with a timestamp-ordered view.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::LogError;
use crate::record::LogRecord;
use crate::schema::{KeyFields, RawRecord, Schema};
use crate::timestamp::Timestamp;
use crate::types::LogKey;

/// Default key policy: `session:client_time:log_type:seq`.
///
/// The ingestion sequence number keeps records that share every domain
/// field apart.
pub fn default_key<P: KeyFields>(payload: &P, seq: usize) -> LogKey {
    LogKey::from_non_empty(format!(
        "{}:{}:{}:{seq}",
        payload.session_id(),
        payload.client_time(),
        payload.log_type()
    ))
}

/// What a stream build does with a record that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidRecordPolicy {
    /// Abort the whole build on the first invalid record.
    #[default]
    Fail,
    /// Leave invalid records out and report them alongside the stream.
    Skip,
}

/// Options for [`LogStream::build_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub on_invalid: InvalidRecordPolicy,
}

/// A raw record that could not become part of a stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("record {index} rejected: {source}")]
pub struct StreamError {
    /// Position of the record in the input batch.
    pub index: usize,
    #[source]
    pub source: LogError,
}

/// One keyed record in a stream.
#[derive(Debug, Clone)]
pub struct StreamEntry<P> {
    key: LogKey,
    seq: usize,
    record: LogRecord<P>,
}

impl<P> StreamEntry<P> {
    pub const fn key(&self) -> &LogKey {
        &self.key
    }

    /// Position of the record in the input batch.
    pub const fn sequence(&self) -> usize {
        self.seq
    }

    pub const fn record(&self) -> &LogRecord<P> {
        &self.record
    }

    pub const fn timestamp(&self) -> Timestamp {
        self.record.timestamp()
    }
}

/// Result of a lenient build.
#[derive(Debug, Clone)]
pub struct BuiltStream<P> {
    pub stream: LogStream<P>,
    /// Records left out under [`InvalidRecordPolicy::Skip`], in input order.
    pub rejected: Vec<StreamError>,
}

/// Validated, uniquely keyed records ordered by identifier.
///
/// The ordered view sorts by identifier (canonical timestamp, then content
/// digest) and falls back to input order for identical identifiers, so it is
/// fully deterministic.
#[derive(Debug, Clone)]
pub struct LogStream<P> {
    entries: Vec<StreamEntry<P>>,
    index: HashMap<LogKey, usize>,
}

impl<P> Default for LogStream<P> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<P> LogStream<P>
where
    P: Serialize + Send + Sync,
{
    /// Builds a stream, failing on the first invalid record.
    pub fn build<S, I, F>(raw_records: I, schema: &S, key_fn: F) -> Result<Self, StreamError>
    where
        S: Schema<Payload = P>,
        I: IntoIterator,
        I::Item: Into<RawRecord>,
        F: Fn(&P, usize) -> LogKey,
    {
        Self::build_with(raw_records, schema, key_fn, BuildOptions::default())
            .map(|built| built.stream)
    }

    /// Builds a stream under the given options.
    ///
    /// Records are validated in parallel; errors and keys are resolved in
    /// input order so the outcome does not depend on scheduling. Under
    /// [`InvalidRecordPolicy::Fail`] the reported error is the one with the
    /// lowest input index.
    pub fn build_with<S, I, F>(
        raw_records: I,
        schema: &S,
        key_fn: F,
        options: BuildOptions,
    ) -> Result<BuiltStream<P>, StreamError>
    where
        S: Schema<Payload = P>,
        I: IntoIterator,
        I::Item: Into<RawRecord>,
        F: Fn(&P, usize) -> LogKey,
    {
        let raw: Vec<RawRecord> = raw_records.into_iter().map(Into::into).collect();
        let total = raw.len();

        let results: Vec<Result<LogRecord<P>, LogError>> = raw
            .into_par_iter()
            .map(|record| LogRecord::new(record, schema))
            .collect();

        let mut records = Vec::with_capacity(total);
        let mut rejected = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(record) => records.push((index, record)),
                Err(source) => match options.on_invalid {
                    InvalidRecordPolicy::Fail => return Err(StreamError { index, source }),
                    InvalidRecordPolicy::Skip => {
                        tracing::warn!(index, error = %source, "skipping invalid record");
                        rejected.push(StreamError { index, source });
                    }
                },
            }
        }

        let keyed = records.into_iter().map(|(seq, record)| {
            let key = key_fn(record.payload(), seq);
            (key, seq, record)
        });
        let stream = Self::assemble(keyed);

        tracing::debug!(
            input = total,
            records = stream.len(),
            rejected = rejected.len(),
            "built log stream"
        );

        Ok(BuiltStream { stream, rejected })
    }
}

impl<P> LogStream<P> {
    /// Builds a stream from records that are already keyed.
    ///
    /// Input position is used as the sequence number.
    pub fn from_keyed<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (LogKey, LogRecord<P>)>,
    {
        Self::assemble(
            records
                .into_iter()
                .enumerate()
                .map(|(seq, (key, record))| (key, seq, record)),
        )
    }

    fn assemble<I>(keyed: I) -> Self
    where
        I: IntoIterator<Item = (LogKey, usize, LogRecord<P>)>,
    {
        let mut by_key: HashMap<LogKey, StreamEntry<P>> = HashMap::new();
        for (key, seq, record) in keyed {
            match by_key.entry(key) {
                Entry::Occupied(mut slot) => {
                    tracing::warn!(key = %slot.key(), seq, "duplicate stream key; keeping the later record");
                    let key = slot.key().clone();
                    slot.insert(StreamEntry { key, seq, record });
                }
                Entry::Vacant(slot) => {
                    let key = slot.key().clone();
                    slot.insert(StreamEntry { key, seq, record });
                }
            }
        }

        let mut entries: Vec<StreamEntry<P>> = by_key.into_values().collect();
        entries.sort_by(|a, b| {
            a.record
                .identity_cmp(&b.record)
                .then_with(|| a.seq.cmp(&b.seq))
        });

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.key.clone(), i))
            .collect();

        Self { entries, index }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a record by key.
    pub fn get(&self, key: &str) -> Option<&LogRecord<P>> {
        self.index.get(key).map(|&i| &self.entries[i].record)
    }

    /// Entries in ascending identifier order.
    pub fn entries(&self) -> &[StreamEntry<P>] {
        &self.entries
    }

    /// Entries in ascending identifier order.
    pub fn iter(&self) -> std::slice::Iter<'_, StreamEntry<P>> {
        self.entries.iter()
    }

    /// Records in ascending identifier order.
    pub fn records(&self) -> impl Iterator<Item = &LogRecord<P>> {
        self.entries.iter().map(|entry| &entry.record)
    }

    pub fn first_timestamp(&self) -> Option<Timestamp> {
        self.entries.first().map(StreamEntry::timestamp)
    }

    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.entries.last().map(StreamEntry::timestamp)
    }

    /// Index bounds of the entries whose timestamp lies in `[start, end]`.
    ///
    /// Two binary searches over the ordered view; empty when `start > end`.
    pub fn bounds(&self, start: Timestamp, end: Timestamp) -> Range<usize> {
        if start > end {
            return 0..0;
        }
        let lo = self.entries.partition_point(|e| e.timestamp() < start);
        let hi = self.entries.partition_point(|e| e.timestamp() <= end);
        lo..hi
    }

    /// Entries whose timestamp lies in `[start, end]`.
    pub fn range(&self, start: Timestamp, end: Timestamp) -> &[StreamEntry<P>] {
        &self.entries[self.bounds(start, end)]
    }
}

impl<P: Serialize> LogStream<P> {
    /// Entries whose structured payload has `field == value` at the top level.
    pub fn matching_field<'a>(
        &'a self,
        field: &'a str,
        value: &'a Value,
    ) -> impl Iterator<Item = &'a StreamEntry<P>> + 'a {
        self.entries.iter().filter(move |entry| {
            entry
                .record
                .to_structured()
                .is_ok_and(|structured| structured.get(field) == Some(value))
        })
    }
}

impl<'a, P> IntoIterator for &'a LogStream<P> {
    type Item = &'a StreamEntry<P>;
    type IntoIter = std::slice::Iter<'a, StreamEntry<P>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
