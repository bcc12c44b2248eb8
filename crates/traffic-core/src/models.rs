use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// `strftime` pattern of the timestamps written by the traffic logger.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A pair of byte counters for one peer, as seen from the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ByteCounts {
    /// Bytes received by the server from the peer.
    pub received: u64,
    /// Bytes sent by the server to the peer.
    pub sent: u64,
}

impl ByteCounts {
    pub const ZERO: ByteCounts = ByteCounts {
        received: 0,
        sent: 0,
    };

    pub fn new(received: u64, sent: u64) -> Self {
        Self { received, sent }
    }

    /// Component-wise subtraction; `None` if either side would go negative.
    pub fn checked_sub(self, other: ByteCounts) -> Option<ByteCounts> {
        Some(ByteCounts {
            received: self.received.checked_sub(other.received)?,
            sent: self.sent.checked_sub(other.sent)?,
        })
    }

    pub fn saturating_add(self, other: ByteCounts) -> ByteCounts {
        ByteCounts {
            received: self.received.saturating_add(other.received),
            sent: self.sent.saturating_add(other.sent),
        }
    }
}

/// One cumulative counter reading for a peer, as written to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Display name or masked key of the peer.
    pub peer_id: String,
    /// Raw counters since the last service start.
    pub counts: ByteCounts,
    pub timestamp: NaiveDateTime,
}

/// A typed log event, in log order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The service restarted; every peer's raw counters start again near zero.
    Boot { timestamp: NaiveDateTime },
    /// A header line with no data (`Transfer bytes`).
    Skip { timestamp: NaiveDateTime },
    /// A per-peer counter reading.
    Sample(Sample),
}

/// A reconstructed point in a peer's traffic history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(with = "log_timestamp")]
    pub timestamp: NaiveDateTime,
    /// Lifetime totals, monotonic across service restarts.
    pub total: ByteCounts,
    /// Bytes transferred since the previous observation of the same peer.
    pub diff: ByteCounts,
}

/// The ordered observations of a single peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerSeries {
    observations: Vec<Observation>,
}

impl PeerSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    /// Latest lifetime totals, `None` for an empty series.
    pub fn last_total(&self) -> Option<ByteCounts> {
        self.observations.last().map(|o| o.total)
    }

    /// Sum of every interval delta in the series.
    pub fn diff_sum(&self) -> ByteCounts {
        self.observations
            .iter()
            .fold(ByteCounts::ZERO, |acc, o| acc.saturating_add(o.diff))
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

impl<'a> IntoIterator for &'a PeerSeries {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// Serde adapter writing timestamps in the logger's own format.
pub mod log_timestamp {
    use super::LOG_TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(LOG_TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, LOG_TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}
