use std::path::PathBuf;

/// Get the bar-data root directory from environment variable or use default
pub fn get_data_root() -> PathBuf {
    std::env::var("DS_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("DS"))
}
