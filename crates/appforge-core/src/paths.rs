//! Filesystem locations for config, database, and export output

use std::path::PathBuf;

use crate::constants;

/// Config directory (`~/.appforge`)
///
/// Falls back to the current directory if the home directory cannot be
/// resolved, so the tool still works in minimal containers.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(constants::app::CONFIG_DIR_NAME)
}

/// Path of the SQLite database file
pub fn database_path() -> PathBuf {
    config_dir().join(constants::app::DATABASE_FILE_NAME)
}

/// Default directory for exported artifacts (`~/.appforge/exports`)
pub fn exports_dir() -> PathBuf {
    config_dir().join(constants::app::EXPORTS_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_is_under_config_dir() {
        assert!(database_path().starts_with(config_dir()));
    }

    #[test]
    fn test_exports_dir_is_under_config_dir() {
        assert!(exports_dir().starts_with(config_dir()));
    }
}
