//! Traffic log parsing.
//!
//! Turns the lines written by the counter logger into typed [`Event`]s:
//!
//! ```text
//! [2024-05-01 10:00:00] System boot
//! [2024-05-01 11:00:00] Transfer bytes
//! [2024-05-01 11:00:00] <public key>,<received>,<sent>
//! ```

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::io::BufRead;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::warn;
use traffic_core::error::{Result, TrafficError};
use traffic_core::masking::MaskPolicy;
use traffic_core::models::{ByteCounts, Event, Sample, LOG_TIMESTAMP_FORMAT};

use crate::peers::PeerNameTable;

const BOOT_PAYLOAD: &str = "System boot";
const HEADER_PAYLOAD: &str = "Transfer bytes";

static LINE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\] (.*)$").expect("regex is valid")
});

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse a single log line. `line_no` is 1-based and only used for errors.
///
/// Header lines come back as [`Event::Skip`]; [`EventReader`] drops them.
pub fn parse_line(
    line: &str,
    line_no: usize,
    names: &PeerNameTable,
    mask: &MaskPolicy,
) -> Result<Event> {
    Ok(match parse_raw(line, line_no)? {
        Event::Sample(sample) => Event::Sample(Sample {
            peer_id: names.resolve(&sample.peer_id, mask),
            ..sample
        }),
        other => other,
    })
}

/// Lazy, single-pass event stream over a line source.
///
/// Yields the first error it meets and then stops. Blank or malformed
/// lines are errors; header lines are skipped silently.
///
/// Unknown keys that mask to the same identity are merged into one series;
/// the reader warns once for every extra key folded in this way.
pub struct EventReader<'a, I> {
    lines: I,
    names: &'a PeerNameTable,
    mask: MaskPolicy,
    line_no: usize,
    done: bool,
    /// Masked identity -> first raw key seen under it.
    masked_keys: HashMap<String, String>,
    collided: HashSet<String>,
}

impl<'a, I> EventReader<'a, I>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    pub fn new(lines: I, names: &'a PeerNameTable, mask: MaskPolicy) -> Self {
        Self {
            lines,
            names,
            mask,
            line_no: 0,
            done: false,
            masked_keys: HashMap::new(),
            collided: HashSet::new(),
        }
    }

    /// Number of lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line_no
    }

    /// Number of distinct raw keys merged into another key's masked identity.
    pub fn mask_collisions(&self) -> usize {
        self.collided.len()
    }

    fn resolve_peer(&mut self, key: String) -> String {
        if let Some(name) = self.names.get(&key) {
            return name.to_string();
        }
        let masked = self.mask.mask(&key);
        match self.masked_keys.entry(masked.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(key);
            }
            Entry::Occupied(first) => {
                if *first.get() != key && self.collided.insert(key) {
                    warn!(
                        "Line {}: another unknown peer key masks to {}, merging it into the same series",
                        self.line_no, masked
                    );
                }
            }
        }
        masked
    }
}

impl<'a, R: BufRead> EventReader<'a, std::io::Lines<R>> {
    /// Build a reader over an already opened buffered source.
    pub fn from_reader(reader: R, names: &'a PeerNameTable, mask: MaskPolicy) -> Self {
        Self::new(reader.lines(), names, mask)
    }
}

impl<I> Iterator for EventReader<'_, I>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            };
            self.line_no += 1;

            match parse_raw(&line, self.line_no) {
                Ok(Event::Skip { .. }) => continue,
                Ok(Event::Sample(sample)) => {
                    let peer_id = self.resolve_peer(sample.peer_id);
                    return Some(Ok(Event::Sample(Sample { peer_id, ..sample })));
                }
                Ok(event) => return Some(Ok(event)),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Parse a line, leaving the raw peer key in sample events.
fn parse_raw(line: &str, line_no: usize) -> Result<Event> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let malformed = || TrafficError::MalformedLogLine {
        line_no,
        line: line.to_string(),
    };

    let caps = LINE_PATTERN.captures(line).ok_or_else(malformed)?;
    let timestamp = NaiveDateTime::parse_from_str(&caps[1], LOG_TIMESTAMP_FORMAT)
        .map_err(|_| malformed())?;

    match &caps[2] {
        BOOT_PAYLOAD => Ok(Event::Boot { timestamp }),
        HEADER_PAYLOAD => Ok(Event::Skip { timestamp }),
        payload => {
            let sample_error = |reason: String| TrafficError::MalformedSample {
                line_no,
                line: line.to_string(),
                reason,
            };

            let fields: Vec<&str> = payload.split(',').collect();
            let [key, received, sent] = fields[..] else {
                return Err(sample_error(format!(
                    "expected 3 fields, got {}",
                    fields.len()
                )));
            };

            let received =
                parse_count(received).map_err(|e| sample_error(format!("received: {e}")))?;
            let sent = parse_count(sent).map_err(|e| sample_error(format!("sent: {e}")))?;

            Ok(Event::Sample(Sample {
                peer_id: key.to_string(),
                counts: ByteCounts::new(received, sent),
                timestamp,
            }))
        }
    }
}

fn parse_count(field: &str) -> std::result::Result<u64, std::num::ParseIntError> {
    field.trim().parse::<u64>()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
