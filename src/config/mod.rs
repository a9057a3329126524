//! Configuration management.

mod settings;
mod xdg;

pub use settings::{Settings, SettingsError, DEFAULT_MODEL, KNOWN_MODELS};
pub use xdg::XdgDirs;
