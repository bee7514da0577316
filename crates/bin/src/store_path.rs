//! Default store location.

use hobart::StoreLocation;
use std::path::PathBuf;

/// Get the default data directory.
///
/// Uses platform-specific data directories:
/// - Linux: `~/.local/share/hobart/`
/// - macOS: `~/Library/Application Support/hobart/`
/// - Windows: `%APPDATA%\hobart\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hobart")
}

/// Get the default store database path.
pub(crate) fn default_store_path() -> PathBuf {
    default_data_dir().join("hobart.db")
}

/// Resolve the store location from an optional override.
pub(crate) fn resolve(store: Option<PathBuf>) -> StoreLocation {
    StoreLocation::Path(store.unwrap_or_else(default_store_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_store_path() {
        let path = default_store_path();
        assert!(path.ends_with("hobart/hobart.db"));
    }

    #[test]
    fn test_override_wins() {
        let location = resolve(Some(PathBuf::from("/tmp/custom.db")));
        assert_eq!(location, StoreLocation::Path(PathBuf::from("/tmp/custom.db")));
    }
}
