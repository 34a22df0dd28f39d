//! Link URL extraction.
//!
//! An element "is" a link if it or one of its ancestors is an `<a>` with a
//! non-empty `href`, or if it carries one of the custom link attributes.
//! The hyperlink ancestor wins when both are present.

use linkpeek_dom::{Document, Location, NodeId, Page};

/// Custom attributes checked, in order, on the target element itself.
pub const CUSTOM_LINK_ATTRIBUTES: [&str; 3] = ["data-href", "data-url", "data-link"];

/// Resolves the link an element stands for.
///
/// The gesture detector only sees this trait, so it can be driven without a
/// page in tests.
pub trait LinkResolver {
    fn resolve_link(&self, node: NodeId) -> Option<String>;
}

impl LinkResolver for Page {
    fn resolve_link(&self, node: NodeId) -> Option<String> {
        extract_link(&self.document(), self.location(), node)
    }
}

/// The absolute URL `node` links to, or `None`.
///
/// - a node that is not attached to the document yields `None`,
/// - an `<a>` ancestor (the node itself included) with a blank or missing
///   `href` yields `None`, even if custom attributes are present,
/// - a custom attribute value that cannot be resolved against `location`
///   is returned as written.
pub fn extract_link(doc: &Document, location: &Location, node: NodeId) -> Option<String> {
    if !doc.is_connected(node) {
        log::trace!("node {node} is detached, no link");
        return None;
    }

    if let Some(anchor) = doc.closest_hyperlink(node) {
        let href = doc.element(anchor)?.href()?;
        if href.trim().is_empty() {
            return None;
        }
        return location.resolve(href);
    }

    let element = doc.element(node)?;
    let raw = CUSTOM_LINK_ATTRIBUTES
        .iter()
        .find_map(|name| element.get_attribute(name).filter(|v| !v.is_empty()))?;
    Some(location.resolve(raw).unwrap_or_else(|| raw.to_string()))
}
