//! Link-detection interaction engine.
//!
//! Turns raw pointer and click events on a [`Page`] into "the user wants to
//! preview this link" detections, under one of three trigger modes:
//!
//! - **drag**: press a link and move it past a distance threshold,
//! - **long-press**: press a link and hold it past a delay,
//! - **alt-click**: click a link with Alt held.
//!
//! The pieces, leaf first:
//!
//! - [`extract`] resolves the link URL an element stands for.
//! - [`gesture`] is the per-press state machine. It is pure: it consumes
//!   events and returns a [`Reaction`] describing what should happen.
//! - [`arbitrator`] owns the page listeners and the click-suppression flag.
//! - [`session`] wires the three together behind [`activate`] and a
//!   [`SessionHandle`] that cleans everything up on teardown or drop.
//! - [`timer`] abstracts the one timer the engine needs, with a virtual
//!   clock implementation for tests and trace replay.
//!
//! [`Page`]: linkpeek_dom::Page

pub mod arbitrator;
pub mod extract;
pub mod gesture;
pub mod session;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_utils;

pub use arbitrator::{EventArbitrator, listener_plan};
pub use extract::{CUSTOM_LINK_ATTRIBUTES, LinkResolver, extract_link};
pub use gesture::{Detection, GestureDetector, GesturePhase, GestureState, PressId, Reaction};
pub use session::{SessionHandle, activate};
pub use timer::{ManualTimers, TimerCallback, TimerId, TimerQueue};
