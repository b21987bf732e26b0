use crate::config;
use flexi_logger::{
    Cleanup, Criterion, FileSpec, FlexiLoggerError, Logger, LoggerHandle, Naming, WriteMode,
};
use std::path::Path;

pub const LEVEL_ENV: &str = "GLASSMEMO_LOG";

const LOG_FILE_BASENAME: &str = "glassmemo";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 2 * 1024 * 1024;
// The live file plus one from the previous run.
const MAX_LOG_FILES: usize = 1;

pub fn parse_level(value: Option<&str>) -> &'static str {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("off") => "off",
        Some("error") => "error",
        Some("warn") | Some("warning") => "warn",
        Some("debug") => "debug",
        Some("trace") => "trace",
        _ => "info",
    }
}

/// Starts file logging under `<home>/logs`. The file left by the previous run
/// is rotated aside on start. Returns `None` and keeps going without logs if
/// the backend cannot start.
///
/// The handle must be held until exit so buffered lines get flushed.
pub fn init() -> Option<LoggerHandle> {
    let log_dir = config::get_config_dir().join("logs");
    let level = parse_level(std::env::var(LEVEL_ENV).ok().as_deref());
    match start_at(&log_dir, level) {
        Ok(handle) => {
            log::info!(
                "logging started: level={} dir={} version={}",
                level,
                log_dir.display(),
                env!("CARGO_PKG_VERSION")
            );
            Some(handle)
        }
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    }
}

fn start_at(log_dir: &Path, level: &str) -> Result<LoggerHandle, FlexiLoggerError> {
    std::fs::create_dir_all(log_dir)?;
    Logger::try_with_str(level)?
        .log_to_file(
            FileSpec::default()
                .directory(log_dir)
                .basename(LOG_FILE_BASENAME)
                .suppress_timestamp(),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(flexi_logger::detailed_format)
        .start()
}
