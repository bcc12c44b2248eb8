//! Reconstruction of lifetime traffic totals across service restarts.
//!
//! The logger records raw cumulative counters, which restart near zero
//! every time the service comes back up. Each peer carries a baseline: the
//! lifetime total it had reached when its counters were last reset. A
//! reading is resolved as `raw + baseline`.
//!
//! A `System boot` event snapshots every known peer's latest total as its
//! new baseline. A reading that would move a total backwards without a boot
//! marker is treated as a reset the log missed, and the baseline of that
//! direction is bumped the same way.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use traffic_core::error::{Result, TrafficError};
use traffic_core::models::{ByteCounts, Event, Observation, PeerSeries, Sample};
use tracing::{debug, warn};

// ── PeerTrack ─────────────────────────────────────────────────────────────────

/// Per-peer reconstruction state.
#[derive(Debug, Default)]
struct PeerTrack {
    series: PeerSeries,
    /// Added back to every raw reading since the last reset.
    baseline: ByteCounts,
}

impl PeerTrack {
    /// Resolve raw counters into lifetime totals, direction by direction.
    ///
    /// Returns the totals and whether an unannounced reset was detected.
    fn resolve(&mut self, raw: ByteCounts) -> (ByteCounts, bool) {
        let Some(last) = self.series.last_total() else {
            return (raw.saturating_add(self.baseline), false);
        };

        let (received, rcv_reset) =
            resolve_component(raw.received, &mut self.baseline.received, last.received);
        let (sent, sent_reset) = resolve_component(raw.sent, &mut self.baseline.sent, last.sent);

        (ByteCounts::new(received, sent), rcv_reset || sent_reset)
    }
}

fn resolve_component(raw: u64, baseline: &mut u64, last_total: u64) -> (u64, bool) {
    let resolved = raw.saturating_add(*baseline);
    if resolved >= last_total {
        return (resolved, false);
    }
    *baseline = last_total;
    (raw.saturating_add(last_total), true)
}

// ── Reconciler ────────────────────────────────────────────────────────────────

/// Incremental, single-pass reconstruction of per-peer traffic series.
///
/// Events must be pushed in log order. Output keys are sorted, so identical
/// input always yields identical output.
#[derive(Debug, Default)]
pub struct Reconciler {
    peers: BTreeMap<String, PeerTrack>,
    boots: usize,
    missed_resets: usize,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event.
    pub fn push(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Boot { timestamp } => {
                self.on_boot(timestamp);
                Ok(())
            }
            Event::Skip { .. } => Ok(()),
            Event::Sample(sample) => self.on_sample(sample),
        }
    }

    /// Number of boot markers seen so far.
    pub fn boots(&self) -> usize {
        self.boots
    }

    /// Number of counter drops that had no boot marker.
    pub fn missed_resets(&self) -> usize {
        self.missed_resets
    }

    /// Series reconstructed so far for `peer`.
    pub fn series(&self, peer: &str) -> Option<&PeerSeries> {
        self.peers.get(peer).map(|track| &track.series)
    }

    /// Hand over the reconstructed series, keyed by peer.
    pub fn finish(self) -> BTreeMap<String, PeerSeries> {
        self.peers
            .into_iter()
            .map(|(peer, track)| (peer, track.series))
            .collect()
    }

    fn on_boot(&mut self, timestamp: NaiveDateTime) {
        self.boots += 1;
        let mut rebased = 0usize;
        for track in self.peers.values_mut() {
            if let Some(total) = track.series.last_total() {
                track.baseline = total;
                rebased += 1;
            }
        }
        debug!("Boot at {}: rebased {} peers", timestamp, rebased);
    }

    fn on_sample(&mut self, sample: Sample) -> Result<()> {
        let Sample {
            peer_id,
            counts,
            timestamp,
        } = sample;

        let track = self.peers.entry(peer_id.clone()).or_default();
        let previous = track.series.last_total();
        let (total, missed_reset) = track.resolve(counts);

        let diff = match previous {
            None => total,
            Some(prev) => total.checked_sub(prev).ok_or_else(|| {
                invariant(
                    peer_id.clone(),
                    format!("total moved backwards from {prev:?} to {total:?} at {timestamp}"),
                )
            })?,
        };

        track.series.push(Observation {
            timestamp,
            total,
            diff,
        });

        if missed_reset {
            warn!(
                "Counters of {} dropped at {} without a boot marker, treating as reset",
                peer_id, timestamp
            );
            self.missed_resets += 1;
        }
        Ok(())
    }
}

// ── Batch API ─────────────────────────────────────────────────────────────────

/// Reconcile a complete event stream.
///
/// Stops at the first error, whether from the reader or from the
/// reconciliation itself; no partial result is returned.
pub fn reconcile<I>(events: I) -> Result<BTreeMap<String, PeerSeries>>
where
    I: IntoIterator<Item = Result<Event>>,
{
    let mut reconciler = Reconciler::new();
    for event in events {
        reconciler.push(event?)?;
    }
    Ok(reconciler.finish())
}

/// Check that every peer's deltas add up to its final lifetime total.
pub fn verify_conservation(series: &BTreeMap<String, PeerSeries>) -> Result<()> {
    for (peer, s) in series {
        let Some(last) = s.last_total() else {
            continue;
        };
        let sum = s.diff_sum();
        if sum.received != last.received {
            return Err(invariant(
                peer.clone(),
                format!(
                    "received deltas sum to {}, final total is {}",
                    sum.received, last.received
                ),
            ));
        }
        if sum.sent != last.sent {
            return Err(invariant(
                peer.clone(),
                format!(
                    "sent deltas sum to {}, final total is {}",
                    sum.sent, last.sent
                ),
            ));
        }
    }
    Ok(())
}

fn invariant(peer: String, detail: String) -> TrafficError {
    TrafficError::InvariantViolation { peer, detail }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
