use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

use crate::core::error::{CsdError, Result};
use crate::models::reader_config::ReaderConfig;

static CONFIG_CACHE: OnceLock<ReaderConfig> = OnceLock::new();

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ReaderConfig> {
    let file_path = path.as_ref();

    let data = fs::read_to_string(file_path)?;

    let config: ReaderConfig = serde_json::from_str(&data)
        .map_err(|e| CsdError::Config(format!("JSON parse error in {}: {e}", file_path.display())))?;

    config.validate()?;
    Ok(config)
}

/// Load `path` once and make it the process-wide default.
pub fn init_config<P: AsRef<Path>>(path: P) -> Result<&'static ReaderConfig> {
    let config = load_config(path)?;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| CsdError::Config("Config already initialized".to_string()))?;

    let config = get_cached_config();
    info!(
        "Config initialized: scan_chunk_size={}, max_display_points={:?}",
        config.scan_chunk_size, config.max_display_points
    );
    Ok(config)
}

/// The initialized config, or the defaults when `init_config` was never called.
pub fn get_cached_config() -> &'static ReaderConfig {
    CONFIG_CACHE.get_or_init(ReaderConfig::default)
}
