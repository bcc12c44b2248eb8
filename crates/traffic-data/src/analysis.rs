//! Top-level analysis pipeline.
//!
//! Loads the peer names, reads and reconciles the traffic log, checks the
//! result for consistency and computes the window summaries, returning a
//! [`TrafficReport`] ready for rendering.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use traffic_core::error::{Result, TrafficError};
use traffic_core::formatting::format_count;
use traffic_core::masking::MaskPolicy;
use traffic_core::models::{log_timestamp, PeerSeries};
use tracing::{debug, info};

use crate::aggregator::{summarize, PeerSummary};
use crate::peers::PeerNameTable;
use crate::plot::{plot_series, PlotSeries};
use crate::reader::EventReader;
use crate::reconciler::{verify_conservation, Reconciler};

// ── Public types ──────────────────────────────────────────────────────────────

/// Inputs of one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// WireGuard config holding `### Client <name>` annotations.
    pub peer_config: PathBuf,
    /// Traffic log to reconstruct.
    pub log_file: PathBuf,
    /// Masking applied to peers missing from the config.
    pub mask: MaskPolicy,
    /// Reference time for the trailing-window summaries.
    pub now: NaiveDateTime,
}

/// Counters describing one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    /// Log lines consumed, headers included.
    pub lines_read: usize,
    /// Distinct peers in the log.
    pub peers: usize,
    /// Observations across all peers.
    pub observations: usize,
    /// `System boot` markers seen.
    pub boots: usize,
    /// Counter drops that had no boot marker.
    pub missed_resets: usize,
    /// Unknown peer keys merged into another key's masked identity.
    pub mask_collisions: usize,
}

/// The complete output of [`analyze_traffic`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficReport {
    /// Reference time used for the summaries.
    #[serde(with = "log_timestamp")]
    pub generated_at: NaiveDateTime,
    pub metadata: AnalysisMetadata,
    /// Trailing-window sums per peer.
    pub summaries: BTreeMap<String, PeerSummary>,
    /// Reconstructed series per peer.
    pub series: BTreeMap<String, PeerSeries>,
    /// The same series as chart columns in MiB.
    pub plots: BTreeMap<String, PlotSeries>,
}

impl TrafficReport {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the pretty-printed report to `path`. The parent directory must
    /// already exist.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|source| TrafficError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over the files named in `config`.
///
/// 1. Load the peer name table.
/// 2. Stream the log through the reader and the reconciler.
/// 3. Verify that deltas and totals agree for every peer.
/// 4. Compute window summaries relative to `config.now`.
pub fn analyze_traffic(config: &AnalysisConfig) -> Result<TrafficReport> {
    let names = PeerNameTable::load(&config.peer_config)?;

    let file = std::fs::File::open(&config.log_file).map_err(|source| TrafficError::FileRead {
        path: config.log_file.clone(),
        source,
    })?;
    let reader = std::io::BufReader::new(file);

    let start = std::time::Instant::now();
    let report = analyze_log(reader, &names, config.mask, config.now)
        .map_err(|err| with_path(err, &config.log_file))?;

    info!(
        "Reconstructed {} peers from {} ({} lines, {} observations, {} boots) in {:.3}s",
        report.metadata.peers,
        config.log_file.display(),
        format_count(report.metadata.lines_read as u64),
        format_count(report.metadata.observations as u64),
        format_count(report.metadata.boots as u64),
        start.elapsed().as_secs_f64(),
    );

    Ok(report)
}

/// Same pipeline over an already opened log source.
pub fn analyze_log<R: BufRead>(
    log: R,
    names: &PeerNameTable,
    mask: MaskPolicy,
    now: NaiveDateTime,
) -> Result<TrafficReport> {
    let mut events = EventReader::from_reader(log, names, mask);
    let mut reconciler = Reconciler::new();
    for event in events.by_ref() {
        reconciler.push(event?)?;
    }

    let lines_read = events.lines_read();
    let mask_collisions = events.mask_collisions();
    let boots = reconciler.boots();
    let missed_resets = reconciler.missed_resets();
    let series = reconciler.finish();

    verify_conservation(&series)?;

    let metadata = AnalysisMetadata {
        lines_read,
        peers: series.len(),
        observations: series.values().map(PeerSeries::len).sum(),
        boots,
        missed_resets,
        mask_collisions,
    };
    debug!("Analysis metadata: {:?}", metadata);

    Ok(TrafficReport {
        generated_at: now,
        metadata,
        summaries: summarize(&series, now),
        plots: plot_series(&series),
        series,
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Attach the log path to bare I/O errors raised while streaming it.
fn with_path(err: TrafficError, path: &Path) -> TrafficError {
    match err {
        TrafficError::Io(source) => TrafficError::FileRead {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
