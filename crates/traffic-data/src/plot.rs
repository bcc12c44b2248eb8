//! Chart-ready columns for an external renderer.
//!
//! Each peer's series is split into parallel columns: timestamps on the x
//! axis, and per-interval and lifetime traffic in MiB for both directions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use traffic_core::formatting::bytes_to_mib;
use traffic_core::models::{PeerSeries, LOG_TIMESTAMP_FORMAT};

/// Parallel columns for one peer. All vectors have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    /// Observation timestamps in log format.
    pub x: Vec<String>,
    pub rcv_diff: Vec<f64>,
    pub sent_diff: Vec<f64>,
    pub rcv_total: Vec<f64>,
    pub sent_total: Vec<f64>,
}

impl PlotSeries {
    pub fn from_series(series: &PeerSeries) -> Self {
        let mut plot = PlotSeries::default();
        for o in series {
            plot.x.push(o.timestamp.format(LOG_TIMESTAMP_FORMAT).to_string());
            plot.rcv_diff.push(bytes_to_mib(o.diff.received));
            plot.sent_diff.push(bytes_to_mib(o.diff.sent));
            plot.rcv_total.push(bytes_to_mib(o.total.received));
            plot.sent_total.push(bytes_to_mib(o.total.sent));
        }
        plot
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Plot columns for every peer, keyed like the input.
pub fn plot_series(series: &BTreeMap<String, PeerSeries>) -> BTreeMap<String, PlotSeries> {
    series
        .iter()
        .map(|(peer, s)| (peer.clone(), PlotSeries::from_series(s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use traffic_core::models::{ByteCounts, Observation};

    fn obs(at: &str, total: (u64, u64), diff: (u64, u64)) -> Observation {
        Observation {
            timestamp: NaiveDateTime::parse_from_str(at, LOG_TIMESTAMP_FORMAT).unwrap(),
            total: ByteCounts::new(total.0, total.1),
            diff: ByteCounts::new(diff.0, diff.1),
        }
    }

    #[test]
    fn test_plot_series_columns_in_mib() {
        let mut series = PeerSeries::new();
        series.push(obs("2024-05-01 10:00:00", (1_048_576, 524_288), (1_048_576, 524_288)));
        series.push(obs("2024-05-01 11:00:00", (3_145_728, 524_288), (2_097_152, 0)));

        let plot = PlotSeries::from_series(&series);
        assert_eq!(plot.len(), 2);
        assert_eq!(plot.x, vec!["2024-05-01 10:00:00", "2024-05-01 11:00:00"]);
        assert_eq!(plot.rcv_diff, vec![1.0, 2.0]);
        assert_eq!(plot.sent_diff, vec![0.5, 0.0]);
        assert_eq!(plot.rcv_total, vec![1.0, 3.0]);
        assert_eq!(plot.sent_total, vec![0.5, 0.5]);
    }

    #[test]
    fn test_plot_series_empty_peer() {
        let map = BTreeMap::from([("phone".to_string(), PeerSeries::new())]);
        let plots = plot_series(&map);
        assert!(plots["phone"].is_empty());
    }
}
