pub mod chart;
pub mod config;
pub mod log;
pub mod selection;
pub mod stock_list;
pub mod sync;

use std::path::PathBuf;

/// Path under the platform data directory where the app keeps its files
/// (config, logs). Falls back to the working directory when the platform
/// dir cannot be resolved.
pub fn data_path(file_name: Option<&str>) -> PathBuf {
    let data_dir = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    let base = data_dir.join("tickerboard");

    match file_name {
        Some(file) => base.join(file),
        None => base,
    }
}
