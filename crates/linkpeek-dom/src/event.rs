//! Page events and their cancellation state.

use linkpeek_types::input::{Modifiers, Point, PointerButton};
use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Event types a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    PointerDown,
    PointerMove,
    PointerUp,
    Click,
    /// The page was hidden or shown (`visibilitychange`).
    VisibilityChange,
    /// The window lost focus.
    Blur,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        Self::PointerDown,
        Self::PointerMove,
        Self::PointerUp,
        Self::Click,
        Self::VisibilityChange,
        Self::Blur,
    ];
}

/// Listener phase. Capture listeners run before any page handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Capture,
    Bubble,
}

/// A single event travelling through the page.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    pub kind: EventKind,
    /// The element the event was dispatched at. `None` for window and
    /// document level events, or pointer events over no element.
    pub target: Option<NodeId>,
    pub position: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    /// For [`EventKind::VisibilityChange`]: whether the page is now hidden.
    pub hidden: bool,
    default_prevented: bool,
    propagation_stopped: bool,
    immediate_propagation_stopped: bool,
}

impl DomEvent {
    fn new(kind: EventKind, target: Option<NodeId>, position: Point) -> Self {
        Self {
            kind,
            target,
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            hidden: false,
            default_prevented: false,
            propagation_stopped: false,
            immediate_propagation_stopped: false,
        }
    }

    pub fn pointer_down(target: Option<NodeId>, position: Point) -> Self {
        Self::new(EventKind::PointerDown, target, position)
    }

    pub fn pointer_move(target: Option<NodeId>, position: Point) -> Self {
        Self::new(EventKind::PointerMove, target, position)
    }

    pub fn pointer_up(target: Option<NodeId>, position: Point) -> Self {
        Self::new(EventKind::PointerUp, target, position)
    }

    pub fn click(target: Option<NodeId>, position: Point) -> Self {
        Self::new(EventKind::Click, target, position)
    }

    pub fn visibility_change(hidden: bool) -> Self {
        let mut event = Self::new(EventKind::VisibilityChange, None, Point::default());
        event.hidden = hidden;
        event
    }

    pub fn blur() -> Self {
        Self::new(EventKind::Blur, None, Point::default())
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Cancel the browser's default action for this event.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Keep the event from reaching the next phase.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Keep the event from reaching any further listener, including the
    /// rest of the current phase.
    pub fn stop_immediate_propagation(&mut self) {
        self.propagation_stopped = true;
        self.immediate_propagation_stopped = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped
    }
}
