//! Document location and reference resolution.

use std::fmt;

use linkpeek_types::error::{PeekError, Result};
use url::Url;

/// The URL of the document being inspected.
///
/// References resolve with WHATWG URL rules, the same way an anchor's
/// `href` property is computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    /// Parse an absolute document URL.
    pub fn parse(href: &str) -> Result<Self> {
        let url = Url::parse(href.trim())
            .map_err(|e| PeekError::Dom(format!("invalid document location {href:?}: {e}")))?;
        Ok(Self { url })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    /// Resolve `reference` against this location.
    ///
    /// Returns `None` when the reference cannot be turned into a URL.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        match self.url.join(reference) {
            Ok(resolved) => Some(resolved.into()),
            Err(e) => {
                log::trace!("cannot resolve {reference:?} against {}: {e}", self.url);
                None
            },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.href())
    }
}
