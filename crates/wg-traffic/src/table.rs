use std::fmt::{self, Write};

use traffic_core::formatting::{format_bytes, format_count};
use traffic_data::aggregator::TrafficWindow;
use traffic_data::analysis::TrafficReport;

const PEER_HEADER: &str = "Peer";
const DIRECTION_WIDTH: usize = 4;
const CELL_WIDTH: usize = 11;

/// Render the window summaries as a fixed-width text table, one row per
/// peer and direction, followed by a one-line run summary.
pub fn render_table(report: &TrafficReport) -> String {
    let mut out = String::new();
    write_table(&mut out, report).expect("writing to a String cannot fail");
    out
}

fn write_table(out: &mut impl Write, report: &TrafficReport) -> fmt::Result {
    let peer_width = report
        .summaries
        .keys()
        .map(|k| k.chars().count())
        .chain(std::iter::once(PEER_HEADER.len()))
        .max()
        .unwrap_or(PEER_HEADER.len());

    write!(out, "{:<peer_width$}  {:<DIRECTION_WIDTH$}", PEER_HEADER, "Dir")?;
    for window in TrafficWindow::ALL {
        write!(out, " {:>CELL_WIDTH$}", window.label())?;
    }
    writeln!(out)?;

    for (peer, summary) in &report.summaries {
        for (direction, pick) in [("rcv", true), ("sent", false)] {
            let label = if pick { peer.as_str() } else { "" };
            write!(out, "{:<peer_width$}  {:<DIRECTION_WIDTH$}", label, direction)?;
            for window in TrafficWindow::ALL {
                let counts = summary.get(window);
                let bytes = if pick { counts.received } else { counts.sent };
                write!(out, " {:>CELL_WIDTH$}", format_bytes(bytes, 1))?;
            }
            writeln!(out)?;
        }
    }

    let meta = &report.metadata;
    writeln!(
        out,
        "{} peers, {} observations, {} boots, {} missed resets",
        format_count(meta.peers as u64),
        format_count(meta.observations as u64),
        format_count(meta.boots as u64),
        format_count(meta.missed_resets as u64),
    )
}
