//! The per-press gesture state machine.
//!
//! [`GestureDetector`] never touches the page or the clock directly. Each
//! handler takes the event, updates the state, and returns a [`Reaction`]
//! describing the side effects: cancel the event's default, schedule or
//! cancel the long-press timer, arm click suppression, emit a detection.
//! The session applies them.
//!
//! ```text
//!            primary down on link
//!   Idle ------------------------> Armed
//!    ^                               |
//!    |  up / blur / hidden / new down|  move >= threshold (drag)
//!    +-------------------------------+  timer elapsed    (long-press)
//!    ^                               |
//!    +---------- Confirmed <---------+
//!               (emit, then Idle)
//! ```
//!
//! Alt-click never enters `Armed`: a qualifying click is confirmed on the
//! spot.

use linkpeek_dom::{DomEvent, NodeId};
use linkpeek_types::config::{DetectionConfig, TriggerMode};
use linkpeek_types::input::{Point, PointerButton};

use crate::extract::LinkResolver;
use crate::timer::TimerId;

/// Identifies one press. A timer is only honoured for the press that
/// scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PressId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Armed,
}

/// The press being tracked while [`GesturePhase::Armed`].
#[derive(Debug, Clone, PartialEq)]
pub struct GestureState {
    pub press: PressId,
    pub origin: Point,
    pub started_at_ms: u64,
    /// Element the press landed on. Only an id: the element may be removed
    /// from the document while the press is held.
    pub target: NodeId,
    /// URL resolved at press time.
    pub url: String,
    /// Pending long-press timer.
    pub timer: Option<TimerId>,
}

/// A confirmed "preview this link" gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub url: String,
    pub source: NodeId,
}

/// Side effects requested by one detector transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reaction {
    /// Cancel the current event's default action.
    pub prevent_default: bool,
    /// Keep the event away from every other listener and the page.
    pub stop_propagation: bool,
    /// Start the long-press timer for this press, with this delay.
    pub schedule: Option<(PressId, u32)>,
    pub cancel_timer: Option<TimerId>,
    /// Swallow the next click the page would see.
    pub suppress_next_click: bool,
    pub detection: Option<Detection>,
}

impl Reaction {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        *self == Self::default()
    }
}

// -----------------------------------------------------------------------
// GestureDetector
// -----------------------------------------------------------------------

#[derive(Debug)]
pub struct GestureDetector {
    config: DetectionConfig,
    state: Option<GestureState>,
    next_press: u64,
}

impl GestureDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            state: None,
            next_press: 1,
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn mode(&self) -> TriggerMode {
        self.config.mode()
    }

    pub fn phase(&self) -> GesturePhase {
        if self.state.is_some() {
            GesturePhase::Armed
        } else {
            GesturePhase::Idle
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&GestureState> {
        self.state.as_ref()
    }

    /// A pointer went down.
    ///
    /// Any press still being tracked is dropped first: a new press always
    /// starts a new gesture.
    pub fn pointer_down(&mut self, event: &DomEvent, now_ms: u64, links: &dyn LinkResolver) -> Reaction {
        let mut reaction = self.discard("superseded by a new press");

        let mode = self.mode();
        if !mode.tracks_press() || event.button != PointerButton::Primary {
            return reaction;
        }
        let Some(target) = event.target else {
            return reaction;
        };
        let Some(url) = links.resolve_link(target) else {
            return reaction;
        };

        let press = PressId(self.next_press);
        self.next_press += 1;
        if mode == TriggerMode::LongPress {
            reaction.schedule = Some((press, self.config.long_press_delay_ms()));
        }
        log::debug!("{mode}: Idle -> Armed on node {target} ({url})");
        self.state = Some(GestureState {
            press,
            origin: event.position,
            started_at_ms: now_ms,
            target,
            url,
            timer: None,
        });
        reaction.prevent_default = true;
        reaction
    }

    /// Record the timer scheduled for `press`.
    ///
    /// Returns `false` if that press is no longer tracked, in which case the
    /// caller must cancel the timer itself.
    pub fn attach_timer(&mut self, press: PressId, timer: TimerId) -> bool {
        match &mut self.state {
            Some(state) if state.press == press => {
                state.timer = Some(timer);
                true
            },
            _ => false,
        }
    }

    /// The pointer moved. Only drag mode listens.
    pub fn pointer_move(&mut self, event: &DomEvent, links: &dyn LinkResolver) -> Reaction {
        if self.mode() != TriggerMode::Drag {
            return Reaction::none();
        }
        let Some(state) = &self.state else {
            return Reaction::none();
        };
        let distance = state.origin.distance_to(event.position);
        if distance < self.config.drag_threshold_px() {
            log::trace!("drag: {distance:.1}px, below threshold");
            return Reaction::none();
        }

        let Some(state) = self.state.take() else {
            return Reaction::none();
        };
        // The element may have changed or left the document since the press.
        let detection = links.resolve_link(state.target).map(|url| Detection {
            url,
            source: state.target,
        });
        match &detection {
            Some(d) => log::debug!("drag: Armed -> Confirmed after {distance:.1}px ({})", d.url),
            None => log::debug!("drag: Armed -> Idle, node {} no longer a link", state.target),
        }
        Reaction {
            cancel_timer: state.timer,
            detection,
            ..Reaction::none()
        }
    }

    /// The pointer was released before the gesture was confirmed.
    pub fn pointer_up(&mut self) -> Reaction {
        self.discard("released")
    }

    /// The long-press timer for `press` fired.
    pub fn long_press_elapsed(&mut self, press: PressId) -> Reaction {
        let current = self.state.as_ref().map(|s| s.press);
        if self.mode() != TriggerMode::LongPress || current != Some(press) {
            log::trace!("stale long-press timer for {press:?} ignored");
            return Reaction::none();
        }
        let Some(state) = self.state.take() else {
            return Reaction::none();
        };
        log::debug!("long-press: Armed -> Confirmed ({})", state.url);
        Reaction {
            suppress_next_click: true,
            detection: Some(Detection {
                url: state.url,
                source: state.target,
            }),
            ..Reaction::none()
        }
    }

    /// A click reached the detector. Only alt-click mode acts on it.
    pub fn click(&mut self, event: &DomEvent, links: &dyn LinkResolver) -> Reaction {
        if self.mode() != TriggerMode::AltClick || !event.modifiers.alt {
            return Reaction::none();
        }
        let Some(target) = event.target else {
            return Reaction::none();
        };
        let Some(url) = links.resolve_link(target) else {
            return Reaction::none();
        };
        log::debug!("alt-click: Confirmed ({url})");
        Reaction {
            prevent_default: true,
            stop_propagation: true,
            detection: Some(Detection { url, source: target }),
            ..Reaction::none()
        }
    }

    /// The page was hidden or lost focus.
    pub fn interrupt(&mut self) -> Reaction {
        self.discard("interrupted")
    }

    /// Drop any tracked press, cancelling its timer.
    pub fn reset(&mut self) -> Reaction {
        self.discard("reset")
    }

    fn discard(&mut self, why: &str) -> Reaction {
        match self.state.take() {
            Some(state) => {
                log::debug!("{}: Armed -> Idle ({why})", self.mode());
                Reaction {
                    cancel_timer: state.timer,
                    ..Reaction::none()
                }
            },
            None => Reaction::none(),
        }
    }
}
