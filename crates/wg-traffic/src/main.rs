mod bootstrap;
mod table;

use anyhow::{Context, Result};
use traffic_core::settings::Settings;
use traffic_data::analysis::{analyze_traffic, AnalysisConfig};

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("wg-traffic v{} starting", env!("CARGO_PKG_VERSION"));

    bootstrap::require_file(&settings.peer_config, "peer config")?;
    bootstrap::require_file(&settings.log_file, "log file")?;

    let config = AnalysisConfig {
        peer_config: settings.peer_config.clone(),
        log_file: settings.log_file.clone(),
        mask: settings.mask_policy(),
        now: chrono::Local::now().naive_local(),
    };

    let report = analyze_traffic(&config)
        .with_context(|| format!("failed to analyse {}", settings.log_file.display()))?;

    if !settings.wants_json() {
        print!("{}", table::render_table(&report));
        return Ok(());
    }

    match &settings.output {
        Some(path) => {
            bootstrap::ensure_parent_dir(path)?;
            report.write_json(path)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => println!("{}", report.to_json_pretty()?),
    }

    Ok(())
}
