//! XDG Base Directory support.

use std::path::{Path, PathBuf};

const APP_DIR: &str = "scout";

/// XDG directory paths for scout.
#[derive(Debug, Clone, PartialEq)]
pub struct XdgDirs {
    /// Config directory (~/.config/scout or XDG_CONFIG_HOME/scout)
    pub config: PathBuf,
    /// State directory (~/.local/state/scout or XDG_STATE_HOME/scout)
    pub state: PathBuf,
}

impl XdgDirs {
    /// Get XDG directories, respecting environment variables.
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::resolve(&home, |key| std::env::var(key).ok())
    }

    /// Resolve directories from a home path and a variable lookup.
    pub fn resolve(home: &Path, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = |var: &str, fallback: &str| {
            lookup(var)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| home.join(fallback))
                .join(APP_DIR)
        };

        Self {
            config: base("XDG_CONFIG_HOME", ".config"),
            state: base("XDG_STATE_HOME", ".local/state"),
        }
    }

    /// Ensure all directories exist.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.config, &self.state] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// User-level `.env` file, loaded after the working directory's.
    pub fn env_file(&self) -> PathBuf {
        self.config.join(".env")
    }

    /// REPL line history.
    pub fn history_file(&self) -> PathBuf {
        self.state.join("history.txt")
    }
}

impl Default for XdgDirs {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_vars(_: &str) -> Option<String> {
        None
    }

    // =========================================================================
    // Path resolution
    // =========================================================================

    #[test]
    fn test_default_paths_under_home() {
        let dirs = XdgDirs::resolve(Path::new("/home/u"), no_vars);
        assert_eq!(dirs.config, PathBuf::from("/home/u/.config/scout"));
        assert_eq!(dirs.state, PathBuf::from("/home/u/.local/state/scout"));
    }

    #[test]
    fn test_env_overrides() {
        let dirs = XdgDirs::resolve(Path::new("/home/u"), |key| match key {
            "XDG_CONFIG_HOME" => Some("/cfg".to_string()),
            "XDG_STATE_HOME" => Some("/st".to_string()),
            _ => None,
        });
        assert_eq!(dirs.config, PathBuf::from("/cfg/scout"));
        assert_eq!(dirs.state, PathBuf::from("/st/scout"));
    }

    #[test]
    fn test_empty_override_is_ignored() {
        let dirs = XdgDirs::resolve(Path::new("/home/u"), |_| Some(String::new()));
        assert_eq!(dirs.config, PathBuf::from("/home/u/.config/scout"));
    }

    #[test]
    fn test_file_locations() {
        let dirs = XdgDirs::resolve(Path::new("/home/u"), no_vars);
        assert_eq!(dirs.env_file(), PathBuf::from("/home/u/.config/scout/.env"));
        assert_eq!(
            dirs.history_file(),
            PathBuf::from("/home/u/.local/state/scout/history.txt")
        );
    }

    #[test]
    fn test_new_ends_with_app_dir() {
        let dirs = XdgDirs::new();
        assert!(dirs.config.ends_with("scout"));
        assert!(dirs.state.ends_with("scout"));
    }

    // =========================================================================
    // Directory creation
    // =========================================================================

    #[test]
    fn test_ensure_dirs_creates_all() {
        let temp = TempDir::new().unwrap();
        let dirs = XdgDirs::resolve(temp.path(), no_vars);

        dirs.ensure_dirs().unwrap();

        assert!(dirs.config.is_dir());
        assert!(dirs.state.is_dir());
    }

    #[test]
    fn test_ensure_dirs_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let dirs = XdgDirs::resolve(temp.path(), no_vars);

        dirs.ensure_dirs().unwrap();
        dirs.ensure_dirs().unwrap();
        assert!(dirs.state.is_dir());
    }
}
