use std::path::PathBuf;

use anyhow::{Context, Result};

use logwheel::config::LoggerConfig;
use logwheel::{diagnostics, failure, log_debug, log_info, registry, Level};

fn process_amount(amount: &str) -> Result<u32, std::num::ParseIntError> {
    amount.parse()
}

fn main() -> Result<()> {
    diagnostics::init();

    // Optional config path as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => LoggerConfig::load(&PathBuf::from(&path))
            .with_context(|| format!("Failed to load config from {}", path))?,
        None => LoggerConfig::load_default().context("Failed to load default config")?,
    };

    let logger = registry::global()
        .get_or_create(config)
        .context("Failed to create logger")?;

    if let Some(path) = logger.file_path() {
        tracing::info!("Logging to: {}", path.display());
    }

    logger.info("Starting logwheel demo...");
    log_debug!(logger, "Debug message - useful for troubleshooting");
    logger.warning("Warning - something might be wrong");

    for (i, amount) in ["99", "1000", "12x"].iter().enumerate() {
        log_info!(logger, "Processing purchase {} of amount {}", i + 1, amount);
        match process_amount(amount) {
            Ok(value) => log_info!(logger, "Processed amount {}", value),
            Err(e) => {
                let _guard = failure::capture(&e);
                logger.exception(&format!("Error processing amount '{}'", amount));
            }
        }
    }

    logger.log(Level::Critical, "Demo finished");
    registry::shutdown();
    Ok(())
}
