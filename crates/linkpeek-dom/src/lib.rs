//! Host page model.
//!
//! The detection engine never talks to a browser directly. It talks to a
//! [`Page`]: an arena DOM with a document location, optional element boxes
//! for hit testing, and a listener registry that dispatches [`DomEvent`]s in
//! capture-then-bubble order and reports the default action that followed.

pub mod dom;
pub mod event;
pub mod location;
pub mod page;

#[cfg(test)]
pub(crate) mod test_utils;

pub use dom::{Attribute, Document, ElementData, Node, NodeId, NodeKind, TagName};
pub use event::{DomEvent, EventKind, Phase};
pub use location::Location;
pub use page::{DispatchOutcome, Listener, ListenerId, Page, Rect};
