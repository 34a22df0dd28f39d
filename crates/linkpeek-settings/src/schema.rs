//! The stored settings schema.
//!
//! Every setting lives under the `local:` prefix. Each key has a marker
//! type implementing [`Setting`], which ties the key to the type of its
//! value:
//!
//! | key           | marker          | value            |
//! |---------------|-----------------|------------------|
//! | `installDate` | [`InstallDate`] | `String`         |
//! | `behavior`    | [`Behavior`]    | [`TriggerMode`]  |
//! | `theme`       | [`Theme`]       | [`ThemeChoice`]  |

use std::fmt;
use std::str::FromStr;

use linkpeek_types::config::TriggerMode;
use linkpeek_types::error::{PeekError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Prefix of every key in the extension's local storage area.
pub const STORAGE_PREFIX: &str = "local:";

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    /// When the extension was installed.
    InstallDate,
    /// The preferred trigger mode.
    Behavior,
    /// The preview window theme.
    Theme,
}

impl SettingKey {
    pub const ALL: [SettingKey; 3] = [Self::InstallDate, Self::Behavior, Self::Theme];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InstallDate => "installDate",
            Self::Behavior => "behavior",
            Self::Theme => "theme",
        }
    }

    /// The full key in the store, e.g. `local:behavior`.
    pub fn storage_key(self) -> String {
        format!("{STORAGE_PREFIX}{}", self.as_str())
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = PeekError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.strip_prefix(STORAGE_PREFIX).unwrap_or(s);
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| PeekError::Settings(format!("unknown setting key: {s}")))
    }
}

/// A typed setting.
pub trait Setting {
    const KEY: SettingKey;
    type Value: Serialize + DeserializeOwned + Send;
}

/// `installDate`: when the extension was installed.
#[derive(Debug, Clone, Copy)]
pub struct InstallDate;

impl Setting for InstallDate {
    const KEY: SettingKey = SettingKey::InstallDate;
    type Value = String;
}

/// `behavior`: the user's trigger mode.
#[derive(Debug, Clone, Copy)]
pub struct Behavior;

impl Setting for Behavior {
    const KEY: SettingKey = SettingKey::Behavior;
    type Value = TriggerMode;
}

/// `theme`: the preview window theme.
#[derive(Debug, Clone, Copy)]
pub struct Theme;

impl Setting for Theme {
    const KEY: SettingKey = SettingKey::Theme;
    type Value = ThemeChoice;
}

// ---------------------------------------------------------------------------
// Themes
// ---------------------------------------------------------------------------

/// Built-in preview themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Light,
    Dark,
    Glass,
    Indigo,
    Purple,
    Bubblegum,
}

impl ThemeId {
    pub const ALL: [ThemeId; 6] = [
        Self::Light,
        Self::Dark,
        Self::Glass,
        Self::Indigo,
        Self::Purple,
        Self::Bubblegum,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Glass => "glass",
            Self::Indigo => "indigo",
            Self::Purple => "purple",
            Self::Bubblegum => "bubblegum",
        }
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = PeekError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| PeekError::Settings(format!("unknown theme: {s}")))
    }
}

/// A stored theme: one of the built-ins, or any other string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ThemeChoice {
    Builtin(ThemeId),
    Custom(String),
}

impl ThemeChoice {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Builtin(id) => id.as_str(),
            Self::Custom(name) => name,
        }
    }

    /// The built-in theme to render with. Unknown names fall back to light.
    pub fn resolved(&self) -> ThemeId {
        match self {
            Self::Builtin(id) => *id,
            Self::Custom(_) => ThemeId::Light,
        }
    }
}

impl Default for ThemeChoice {
    fn default() -> Self {
        Self::Builtin(ThemeId::default())
    }
}

impl From<ThemeId> for ThemeChoice {
    fn from(id: ThemeId) -> Self {
        Self::Builtin(id)
    }
}
