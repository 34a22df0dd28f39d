//! Listener ownership and click suppression.
//!
//! The arbitrator is the only thing that touches the page's listener
//! registry on the engine's behalf. It installs the capture-phase
//! listeners a mode needs, removes them again, and holds the flag that
//! swallows the click following a confirmed long press.

use linkpeek_dom::{DomEvent, EventKind, Listener, ListenerId, Page, Phase};
use linkpeek_types::config::TriggerMode;

use crate::gesture::Reaction;

/// Event kinds a mode listens to, in installation order.
///
/// The click listener comes first where present, so the suppression guard
/// runs before anything else the engine has installed.
pub fn listener_plan(mode: TriggerMode) -> &'static [EventKind] {
    use EventKind::*;
    match mode {
        TriggerMode::Drag => &[PointerDown, PointerMove, PointerUp, VisibilityChange, Blur],
        TriggerMode::LongPress => &[
            Click,
            PointerDown,
            PointerMove,
            PointerUp,
            VisibilityChange,
            Blur,
        ],
        TriggerMode::AltClick => &[Click],
    }
}

#[derive(Debug, Default)]
pub struct EventArbitrator {
    bound: Vec<ListenerId>,
    bound_mode: Option<TriggerMode>,
    suppress_next_click: bool,
}

impl EventArbitrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the listeners for `mode`, creating each through
    /// `listener_for`. Whatever was bound before is removed first.
    pub fn bind(&mut self, page: &Page, mode: TriggerMode, mut listener_for: impl FnMut(EventKind) -> Listener) {
        self.unbind(page);
        for &kind in listener_plan(mode) {
            let id = page.add_event_listener(kind, Phase::Capture, listener_for(kind));
            self.bound.push(id);
        }
        self.bound_mode = Some(mode);
        log::debug!("bound {} listeners for {mode}", self.bound.len());
    }

    /// Remove every listener this arbitrator installed and drop any pending
    /// suppression. Returns how many listeners were removed.
    pub fn unbind(&mut self, page: &Page) -> usize {
        let removed = self
            .bound
            .drain(..)
            .filter(|id| page.remove_event_listener(*id))
            .count();
        if let Some(mode) = self.bound_mode.take() {
            log::debug!("unbound {removed} listeners for {mode}");
        }
        self.suppress_next_click = false;
        removed
    }

    pub fn bound_mode(&self) -> Option<TriggerMode> {
        self.bound_mode
    }

    /// Number of listeners currently installed.
    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppress_next_click
    }

    /// Swallow the next click.
    pub fn arm_suppression(&mut self) {
        log::debug!("next click will be suppressed");
        self.suppress_next_click = true;
    }

    pub fn clear_suppression(&mut self) {
        self.suppress_next_click = false;
    }

    /// Cancel `event` if a suppression is pending, consuming it. Returns
    /// whether the click was swallowed.
    pub fn guard_click(&mut self, event: &mut DomEvent) -> bool {
        if event.kind != EventKind::Click || !self.suppress_next_click {
            return false;
        }
        self.suppress_next_click = false;
        event.prevent_default();
        event.stop_immediate_propagation();
        log::debug!("suppressed click on {:?}", event.target);
        true
    }

    /// Apply the event-level part of a detector reaction.
    pub fn apply(&mut self, reaction: &Reaction, event: Option<&mut DomEvent>) {
        if let Some(event) = event {
            if reaction.prevent_default {
                event.prevent_default();
            }
            if reaction.stop_propagation {
                event.stop_immediate_propagation();
            }
        }
        if reaction.suppress_next_click {
            self.arm_suppression();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use linkpeek_types::input::Point;

    use crate::test_utils::fixture;

    fn noop(_: EventKind) -> Listener {
        Rc::new(|_: &Page, _: &mut DomEvent| {})
    }

    #[test]
    fn plans_match_modes() {
        let drag = listener_plan(TriggerMode::Drag);
        assert!(drag.contains(&EventKind::PointerMove));
        assert!(!drag.contains(&EventKind::Click));

        let long = listener_plan(TriggerMode::LongPress);
        assert_eq!(long[0], EventKind::Click);
        assert!(long.contains(&EventKind::Blur));

        assert_eq!(listener_plan(TriggerMode::AltClick), &[EventKind::Click]);
    }

    #[test]
    fn bind_installs_capture_listeners() {
        let f = fixture("/foo");
        let mut arb = EventArbitrator::new();
        arb.bind(&f.page, TriggerMode::Drag, noop);
        assert_eq!(arb.bound_mode(), Some(TriggerMode::Drag));
        assert_eq!(f.page.listener_count(), 5);
        assert_eq!(f.page.listener_count_for(EventKind::PointerMove, Phase::Capture), 1);
        assert_eq!(f.page.listener_count_for(EventKind::PointerMove, Phase::Bubble), 0);
    }

    #[test]
    fn rebind_unbinds_first() {
        let f = fixture("/foo");
        let mut arb = EventArbitrator::new();
        arb.bind(&f.page, TriggerMode::LongPress, noop);
        arb.bind(&f.page, TriggerMode::AltClick, noop);
        assert_eq!(f.page.listener_count(), 1);
        assert_eq!(f.page.listener_count_for(EventKind::PointerMove, Phase::Capture), 0);
        assert_eq!(f.page.listener_count_for(EventKind::Click, Phase::Capture), 1);
    }

    #[test]
    fn unbind_is_idempotent() {
        let f = fixture("/foo");
        let mut arb = EventArbitrator::new();
        arb.bind(&f.page, TriggerMode::LongPress, noop);
        assert_eq!(arb.unbind(&f.page), 6);
        assert_eq!(arb.unbind(&f.page), 0);
        assert_eq!(f.page.listener_count(), 0);
        assert_eq!(arb.bound_mode(), None);
    }

    #[test]
    fn unbind_leaves_foreign_listeners() {
        let f = fixture("/foo");
        f.page
            .add_event_listener(EventKind::Click, Phase::Bubble, noop(EventKind::Click));
        let mut arb = EventArbitrator::new();
        arb.bind(&f.page, TriggerMode::AltClick, noop);
        arb.unbind(&f.page);
        assert_eq!(f.page.listener_count(), 1);
    }

    #[test]
    fn guard_swallows_exactly_one_click() {
        let mut arb = EventArbitrator::new();
        let mut click = DomEvent::click(Some(1), Point::default());
        assert!(!arb.guard_click(&mut click));
        assert!(!click.default_prevented());

        arb.arm_suppression();
        let mut click = DomEvent::click(Some(1), Point::default());
        assert!(arb.guard_click(&mut click));
        assert!(click.default_prevented());
        assert!(click.immediate_propagation_stopped());
        assert!(!arb.is_suppressing());

        let mut click = DomEvent::click(Some(1), Point::default());
        assert!(!arb.guard_click(&mut click));
    }

    #[test]
    fn guard_ignores_non_clicks() {
        let mut arb = EventArbitrator::new();
        arb.arm_suppression();
        let mut up = DomEvent::pointer_up(Some(1), Point::default());
        assert!(!arb.guard_click(&mut up));
        assert!(arb.is_suppressing());
    }

    #[test]
    fn unbind_drops_pending_suppression() {
        let f = fixture("/foo");
        let mut arb = EventArbitrator::new();
        arb.bind(&f.page, TriggerMode::LongPress, noop);
        arb.arm_suppression();
        arb.unbind(&f.page);
        assert!(!arb.is_suppressing());
    }

    #[test]
    fn apply_sets_event_flags() {
        let mut arb = EventArbitrator::new();
        let mut event = DomEvent::click(Some(1), Point::default());
        let reaction = Reaction {
            prevent_default: true,
            stop_propagation: true,
            ..Reaction::none()
        };
        arb.apply(&reaction, Some(&mut event));
        assert!(event.default_prevented());
        assert!(event.immediate_propagation_stopped());
        assert!(!arb.is_suppressing());

        let reaction = Reaction {
            suppress_next_click: true,
            ..Reaction::none()
        };
        arb.apply(&reaction, None);
        assert!(arb.is_suppressing());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn mode_strategy() -> impl Strategy<Value = TriggerMode> {
            prop_oneof![
                Just(TriggerMode::Drag),
                Just(TriggerMode::LongPress),
                Just(TriggerMode::AltClick),
            ]
        }

        proptest! {
            #[test]
            fn listeners_track_the_last_bound_mode(
                modes in proptest::collection::vec(mode_strategy(), 1..12),
            ) {
                let f = fixture("/foo");
                let mut arb = EventArbitrator::new();
                for mode in &modes {
                    arb.bind(&f.page, *mode, noop);
                    prop_assert_eq!(f.page.listener_count(), listener_plan(*mode).len());
                }
                arb.unbind(&f.page);
                prop_assert_eq!(f.page.listener_count(), 0);
            }
        }
    }
}
