//! Trailing-window traffic sums.
//!
//! Sums interval deltas over the last day, week, month and year relative to
//! an explicit reference time, plus the lifetime total.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use traffic_core::models::{ByteCounts, PeerSeries};

// ── TrafficWindow ─────────────────────────────────────────────────────────────

/// A trailing time window ending at the reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficWindow {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TrafficWindow {
    /// Every window, shortest first.
    pub const ALL: [TrafficWindow; 5] = [
        TrafficWindow::Day,
        TrafficWindow::Week,
        TrafficWindow::Month,
        TrafficWindow::Year,
        TrafficWindow::All,
    ];

    /// Length of the window; `None` for the unbounded window.
    pub fn span(&self) -> Option<TimeDelta> {
        match self {
            TrafficWindow::Day => Some(TimeDelta::days(1)),
            TrafficWindow::Week => Some(TimeDelta::days(7)),
            TrafficWindow::Month => Some(TimeDelta::days(30)),
            TrafficWindow::Year => Some(TimeDelta::days(365)),
            TrafficWindow::All => None,
        }
    }

    /// Short column label.
    pub fn label(&self) -> &'static str {
        match self {
            TrafficWindow::Day => "1d",
            TrafficWindow::Week => "1w",
            TrafficWindow::Month => "1m",
            TrafficWindow::Year => "1y",
            TrafficWindow::All => "all",
        }
    }
}

impl fmt::Display for TrafficWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sum the deltas of observations strictly newer than `now - window`.
///
/// Walks the series from the newest observation backwards and stops at the
/// first one outside the window, so the series must be in log order.
pub fn sum_window(series: &PeerSeries, window: TrafficWindow, now: NaiveDateTime) -> ByteCounts {
    let cutoff = window.span().map(|span| now - span);
    series
        .observations()
        .iter()
        .rev()
        .take_while(|o| cutoff.map_or(true, |c| o.timestamp > c))
        .fold(ByteCounts::ZERO, |acc, o| acc.saturating_add(o.diff))
}

// ── PeerSummary ───────────────────────────────────────────────────────────────

/// Traffic of one peer over every [`TrafficWindow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSummary {
    pub day: ByteCounts,
    pub week: ByteCounts,
    pub month: ByteCounts,
    pub year: ByteCounts,
    pub all: ByteCounts,
}

impl PeerSummary {
    pub fn from_series(series: &PeerSeries, now: NaiveDateTime) -> Self {
        Self {
            day: sum_window(series, TrafficWindow::Day, now),
            week: sum_window(series, TrafficWindow::Week, now),
            month: sum_window(series, TrafficWindow::Month, now),
            year: sum_window(series, TrafficWindow::Year, now),
            all: sum_window(series, TrafficWindow::All, now),
        }
    }

    pub fn get(&self, window: TrafficWindow) -> ByteCounts {
        match window {
            TrafficWindow::Day => self.day,
            TrafficWindow::Week => self.week,
            TrafficWindow::Month => self.month,
            TrafficWindow::Year => self.year,
            TrafficWindow::All => self.all,
        }
    }
}

/// Summaries for every peer, in the same order as the input.
pub fn summarize(
    series: &BTreeMap<String, PeerSeries>,
    now: NaiveDateTime,
) -> BTreeMap<String, PeerSummary> {
    series
        .iter()
        .map(|(peer, s)| (peer.clone(), PeerSummary::from_series(s, now)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
