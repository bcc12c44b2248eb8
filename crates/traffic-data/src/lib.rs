//! Traffic log ingestion and reconstruction.
//!
//! Responsible for loading peer names from the WireGuard config, parsing
//! the counter log into events, reconstructing lifetime totals across
//! service restarts, and summarising the result over trailing windows.

pub mod aggregator;
pub mod analysis;
pub mod peers;
pub mod plot;
pub mod reader;
pub mod reconciler;

pub use traffic_core as core;
