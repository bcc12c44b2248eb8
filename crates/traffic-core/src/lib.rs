//! Shared types for the WireGuard traffic reconstruction tools.
//!
//! Holds the event and observation models, the error taxonomy, byte
//! formatting helpers and the command-line settings.

pub mod error;
pub mod formatting;
pub mod masking;
pub mod models;
pub mod settings;

pub use error::{Result, TrafficError};
pub use masking::MaskPolicy;
pub use models::{ByteCounts, Event, Observation, PeerSeries, Sample};
