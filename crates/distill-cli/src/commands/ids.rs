//! Ids command: lists every record of a stream in order.
//!
//! This module implements `distill ids`, which prints the identifier,
//! canonical time and key of each record as the ordered view yields them.

use std::fmt::Write;

use anyhow::Result;
use distill_core::{KeyFields, LogStream, Schema, Timestamp};
use serde::Serialize;

use super::util::load_stream;
use crate::cli::InputArgs;
use crate::config::Config;

/// One listed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdEntry {
    pub id: String,
    pub key: String,
    pub timestamp: Timestamp,
    pub time: String,
}

/// Collects the listing for `stream` in stream order.
pub fn collect_ids<P>(stream: &LogStream<P>) -> Vec<IdEntry> {
    stream
        .iter()
        .map(|entry| IdEntry {
            id: entry.record().id().to_string(),
            key: entry.key().to_string(),
            timestamp: entry.timestamp(),
            time: entry.timestamp().to_rfc3339(),
        })
        .collect()
}

/// Format the listing for human-readable output.
pub fn format_ids(entries: &[IdEntry]) -> String {
    let mut output = String::new();

    if entries.is_empty() {
        writeln!(output, "No records.").unwrap();
        return output;
    }

    for entry in entries {
        writeln!(output, "{}  {}  {}", entry.id, entry.time, entry.key).unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output, "{} records", entries.len()).unwrap();

    output
}

/// Format the listing as JSON.
pub fn format_ids_json(entries: &[IdEntry]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

/// Runs the ids command.
pub fn run<S>(schema: &S, input: &InputArgs, config: &Config) -> Result<()>
where
    S: Schema,
    S::Payload: KeyFields,
{
    let stream = load_stream(schema, input, config)?;
    let entries = collect_ids(&stream);

    if input.json {
        println!("{}", format_ids_json(&entries)?);
    } else {
        print!("{}", format_ids(&entries));
    }

    Ok(())
}
