//! Core domain logic for distill.
//!
//! This crate contains the fundamental types and logic for:
//! - Identity: deterministic, time-sortable identifiers from content digests
//! - Records and streams: validated logs in a total, timestamp-first order
//! - Segmentation: mapping a stream onto named, possibly overlapping windows
//! - Schemas: the `UserALE` log shape and a field-configured shape

mod error;
mod fields;
pub mod identity;
mod record;
mod schema;
mod segment;
mod stream;
mod timestamp;
mod types;
mod userale;
pub mod windows;

pub use error::LogError;
pub use fields::{FieldLog, FieldSchema};
pub use identity::{ContentDigest, LogId, ParseLogIdError};
pub use record::LogRecord;
pub use schema::{KeyFields, RawRecord, Schema};
pub use segment::{
    DuplicateNamePolicy, Segment, SegmentEngine, SegmentError, Segments, TimeRange, Window,
    create_segments,
};
pub use stream::{
    BuildOptions, BuiltStream, InvalidRecordPolicy, LogStream, StreamEntry, StreamError,
    default_key,
};
pub use timestamp::{TimeUnit, Timestamp};
pub use types::{LogKey, SessionId, ValidationError};
pub use userale::{UserAleLog, UserAleSchema};
