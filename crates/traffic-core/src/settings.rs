use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::masking::MaskPolicy;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Reconstruct per-peer WireGuard traffic from a cumulative counter log
#[derive(Parser, Debug, Clone)]
#[command(
    name = "wg-traffic",
    about = "Reconstruct per-peer WireGuard traffic from a cumulative counter log",
    version
)]
pub struct Settings {
    /// WireGuard server config with `### Client <name>` headers
    pub peer_config: PathBuf,

    /// Traffic log written by the counter logger
    pub log_file: PathBuf,

    /// Where to write the JSON report (stdout when omitted)
    pub output: Option<PathBuf>,

    /// Output format [default: table, or json when an output file is given]
    #[arg(long, value_parser = ["table", "json"])]
    pub format: Option<String>,

    /// Leading characters kept when masking unnamed peer keys (1-44)
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u8).range(1..=44))]
    pub mask_chars: u8,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments and apply derived defaults.
    pub fn load() -> Self {
        Self::try_load_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }

    /// Same as [`Settings::load`] but from an explicit argument list.
    pub fn try_load_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let settings = Settings::try_parse_from(args)?;
        settings.check_format()?;
        Ok(Self::resolve(settings))
    }

    /// Masking policy for peers missing from the peer config.
    pub fn mask_policy(&self) -> MaskPolicy {
        MaskPolicy::new(usize::from(self.mask_chars))
    }

    /// `true` when a JSON report was requested, either explicitly or by
    /// naming an output file.
    pub fn wants_json(&self) -> bool {
        self.format.as_deref() == Some("json") || self.output.is_some()
    }

    /// An output file always receives JSON, so an explicit table request
    /// alongside one is rejected instead of being ignored.
    fn check_format(&self) -> Result<(), clap::Error> {
        match (&self.output, self.format.as_deref()) {
            (Some(path), Some("table")) => Err(Settings::command().error(
                ErrorKind::ArgumentConflict,
                format!(
                    "--format table cannot be combined with output file '{}'",
                    path.display()
                ),
            )),
            _ => Ok(()),
        }
    }

    /// `--debug` overrides the log level.
    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["wg-traffic", "wg0.conf", "traffic.log"]);

        assert_eq!(settings.peer_config, PathBuf::from("wg0.conf"));
        assert_eq!(settings.log_file, PathBuf::from("traffic.log"));
        assert!(settings.output.is_none());
        assert_eq!(settings.format, None);
        assert_eq!(settings.mask_chars, 5);
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.wants_json());
    }

    #[test]
    fn test_settings_output_implies_json() {
        let settings =
            Settings::parse_from(["wg-traffic", "wg0.conf", "traffic.log", "out/report.json"]);
        assert_eq!(settings.output, Some(PathBuf::from("out/report.json")));
        assert!(settings.wants_json());
    }

    #[test]
    fn test_settings_explicit_json_format() {
        let settings =
            Settings::parse_from(["wg-traffic", "--format", "json", "wg0.conf", "traffic.log"]);
        assert!(settings.wants_json());
    }

    #[test]
    fn test_settings_table_format_conflicts_with_output() {
        let err = Settings::try_load_from([
            "wg-traffic",
            "--format",
            "table",
            "wg0.conf",
            "traffic.log",
            "report.json",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_settings_json_format_with_output() {
        let settings = Settings::try_load_from([
            "wg-traffic",
            "--format",
            "json",
            "wg0.conf",
            "traffic.log",
            "report.json",
        ])
        .unwrap();
        assert!(settings.wants_json());
    }

    #[test]
    fn test_settings_explicit_table_format() {
        let settings =
            Settings::try_load_from(["wg-traffic", "--format", "table", "wg0.conf", "traffic.log"])
                .unwrap();
        assert_eq!(settings.format.as_deref(), Some("table"));
        assert!(!settings.wants_json());
    }

    #[test]
    fn test_settings_rejects_unknown_format() {
        let result =
            Settings::try_load_from(["wg-traffic", "--format", "html", "wg0.conf", "traffic.log"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_requires_both_inputs() {
        assert!(Settings::try_load_from(["wg-traffic", "wg0.conf"]).is_err());
        assert!(Settings::try_load_from(["wg-traffic"]).is_err());
    }

    #[test]
    fn test_settings_mask_chars_range() {
        let ok = Settings::try_load_from(["wg-traffic", "--mask-chars", "8", "a", "b"]).unwrap();
        assert_eq!(ok.mask_policy(), MaskPolicy::new(8));

        assert!(Settings::try_load_from(["wg-traffic", "--mask-chars", "0", "a", "b"]).is_err());
        assert!(Settings::try_load_from(["wg-traffic", "--mask-chars", "45", "a", "b"]).is_err());
    }

    #[test]
    fn test_settings_debug_overrides_log_level() {
        let settings =
            Settings::try_load_from(["wg-traffic", "--debug", "wg0.conf", "traffic.log"]).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_settings_log_level_without_debug() {
        let settings = Settings::try_load_from([
            "wg-traffic",
            "--log-level",
            "WARNING",
            "wg0.conf",
            "traffic.log",
        ])
        .unwrap();
        assert_eq!(settings.log_level, "WARNING");
    }
}
