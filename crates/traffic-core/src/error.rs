use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while reading and reconciling a traffic log.
#[derive(Error, Debug)]
pub enum TrafficError {
    /// A log line did not have the `[YYYY-MM-DD HH:MM:SS] payload` shape.
    #[error("Invalid log format at line {line_no}: {line}")]
    MalformedLogLine { line_no: usize, line: String },

    /// A sample payload was not `peer_key,received,sent` with valid counts.
    #[error("Invalid sample at line {line_no} ({reason}): {line}")]
    MalformedSample {
        line_no: usize,
        line: String,
        reason: String,
    },

    /// Reconstructed counters are inconsistent. Always a logic defect.
    #[error("Invariant violated for peer {peer}: {detail}")]
    InvariantViolation { peer: String, detail: String },

    /// An input file could not be opened or read.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report could not be serialised.
    #[error("Failed to serialise JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the traffic crates.
pub type Result<T> = std::result::Result<T, TrafficError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_malformed_log_line() {
        let err = TrafficError::MalformedLogLine {
            line_no: 3,
            line: "garbage".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid log format at line 3: garbage");
    }

    #[test]
    fn test_error_display_malformed_sample() {
        let err = TrafficError::MalformedSample {
            line_no: 7,
            line: "[2024-01-01 00:00:00] abc,1".to_string(),
            reason: "expected 3 fields, got 2".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("expected 3 fields, got 2"));
        assert!(msg.ends_with("abc,1"));
    }

    #[test]
    fn test_error_display_invariant_violation() {
        let err = TrafficError::InvariantViolation {
            peer: "laptop".to_string(),
            detail: "received deltas sum to 10, final total is 12".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invariant violated for peer laptop: received deltas sum to 10, final total is 12"
        );
    }

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = TrafficError::FileRead {
            path: PathBuf::from("/var/log/wg-traffic.log"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/var/log/wg-traffic.log"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_file_write() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = TrafficError::FileWrite {
            path: PathBuf::from("/out/report.json"),
            source: io_err,
        };
        assert!(err.to_string().starts_with("Failed to write file /out/report.json"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: TrafficError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: TrafficError = json_err.into();
        assert!(err.to_string().contains("Failed to serialise JSON"));
    }
}
