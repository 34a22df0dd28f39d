//! Persistent settings for LinkPeek.
//!
//! [`SettingsStore`] is the raw async key/value store the browser provides.
//! [`LocalStorage`] puts the typed schema from [`schema`] on top of it, and
//! [`load_detection_config`] turns the stored behavior into a
//! [`DetectionConfig`] for a content script.
//!
//! [`lifecycle`] holds the install-time hooks of the background worker.
//!
//! [`DetectionConfig`]: linkpeek_types::config::DetectionConfig

pub mod lifecycle;
pub mod local;
pub mod schema;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use local::{LocalStorage, load_detection_config};
pub use schema::{Behavior, InstallDate, Setting, SettingKey, Theme, ThemeChoice, ThemeId};
pub use store::{MemoryStore, SettingsStore};
