//! The preview surface contract.
//!
//! Detected URLs are not shown as-is: script URLs are refused and plain
//! HTTP is upgraded, since the preview frame lives inside an HTTPS page.

use linkpeek_settings::{ThemeChoice, ThemeId};

/// Sandbox tokens for the preview frame.
pub const SANDBOX_POLICY: &str =
    "allow-same-origin allow-scripts allow-forms allow-popups allow-popups-to-escape-sandbox";

/// A URL accepted for preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTarget {
    url: String,
}

impl PreviewTarget {
    /// Normalize a detected URL, or refuse it.
    pub fn from_detected(url: &str) -> Option<Self> {
        if url.starts_with("javascript") {
            return None;
        }
        let url = match url.strip_prefix("http://") {
            Some(rest) => format!("https://{rest}"),
            None => url.to_string(),
        };
        Some(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn sandbox(&self) -> &'static str {
        SANDBOX_POLICY
    }
}

/// The overlay that shows previews.
///
/// Only its state is modelled: which target is open and with which theme.
#[derive(Debug, Clone, Default)]
pub struct PreviewSurface {
    current: Option<PreviewTarget>,
    theme: ThemeChoice,
}

impl PreviewSurface {
    pub fn new(theme: ThemeChoice) -> Self {
        Self {
            current: None,
            theme,
        }
    }

    /// Show `url`. A refused URL leaves whatever was open untouched and
    /// returns `None`.
    pub fn open(&mut self, url: &str) -> Option<&PreviewTarget> {
        let target = PreviewTarget::from_detected(url)?;
        log::debug!("preview open: {}", target.url());
        self.current = Some(target);
        self.current.as_ref()
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&PreviewTarget> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn theme(&self) -> &ThemeChoice {
        &self.theme
    }

    /// The built-in palette to draw with.
    pub fn palette(&self) -> ThemeId {
        self.theme.resolved()
    }

    pub fn set_theme(&mut self, theme: ThemeChoice) {
        self.theme = theme;
    }
}
