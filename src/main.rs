//! Binlog Store - Demo Entry Point
//!
//! Writes a batch of sample events, replays them and prints log statistics.

use binlog_store::{BinaryLogger, LogResult, StatsCollector};
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_PATH: &str = "./logs/events.bin";
const MAX_FILE_SIZE: u64 = 1000;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> LogResult<()> {
    init_tracing();

    let events = [
        "User login: user123",
        "Action performed: file_upload",
        "Data processed: 1024 bytes",
        "User logout: user123",
    ];

    let logger = BinaryLogger::new(LOG_PATH, MAX_FILE_SIZE)?;

    logger.scoped(|log| -> LogResult<()> {
        for event in events.iter().cycle().take(40) {
            log.write(event)?;
        }

        println!("Rewinding logged events:");
        for (i, record) in log.read_history(None)?.enumerate() {
            println!("({}, {:?})", i, record?);
        }

        Ok(())
    })?;

    let stats = StatsCollector::new(LOG_PATH).collect()?;
    info!("{}", stats.summary());

    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
