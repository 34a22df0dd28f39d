//! The host page: document, listener registry, and event dispatch.
//!
//! Dispatch runs every capture-phase listener for the event kind first, then
//! the page's own (bubble-phase) handlers, then the default action. This is
//! the only ordering the detection engine relies on: a capture listener
//! always sees the event before the page does, and can cancel the default
//! action or stop the page's handlers from running.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use linkpeek_types::input::{Point, PointerButton};

use crate::dom::{Document, NodeId};
use crate::event::{DomEvent, EventKind, Phase};
use crate::location::Location;

/// A registered event callback.
///
/// Listeners receive the page by reference instead of capturing it, so a
/// listener never keeps its own page alive.
pub type Listener = Rc<dyn Fn(&Page, &mut DomEvent)>;

/// Handle returned by [`Page::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    kind: EventKind,
    phase: Phase,
    callback: Listener,
}

// -----------------------------------------------------------------------
// Rect
// -----------------------------------------------------------------------

/// An element's box in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Half-open containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }
}

// -----------------------------------------------------------------------
// DispatchOutcome
// -----------------------------------------------------------------------

/// What happened to an event after every listener had its turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
    pub propagation_stopped: bool,
    /// Capture-phase listeners that ran.
    pub capture_listeners_run: usize,
    /// Page (bubble-phase) handlers that ran.
    pub page_handlers_run: usize,
    /// Set when the default action of a click followed a link.
    pub navigated_to: Option<String>,
    /// Set when the default action of a pointer-down began native text
    /// selection or link dragging.
    pub native_drag_started: bool,
}

// -----------------------------------------------------------------------
// Page
// -----------------------------------------------------------------------

/// A loaded page.
///
/// Interior mutability lets listeners read the document and add or remove
/// listeners while an event is being dispatched. Everything runs on one
/// thread.
pub struct Page {
    document: RefCell<Document>,
    location: Location,
    boxes: RefCell<HashMap<NodeId, Rect>>,
    listeners: RefCell<Vec<Registration>>,
    next_listener_id: Cell<u64>,
}

impl Page {
    pub fn new(document: Document, location: Location) -> Self {
        Self {
            document: RefCell::new(document),
            location,
            boxes: RefCell::new(HashMap::new()),
            listeners: RefCell::new(Vec::new()),
            next_listener_id: Cell::new(1),
        }
    }

    pub fn document(&self) -> Ref<'_, Document> {
        self.document.borrow()
    }

    /// Mutable document access. Must not be held across [`Page::dispatch`].
    pub fn document_mut(&self) -> RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    // -------------------------------------------------------------------
    // Hit testing
    // -------------------------------------------------------------------

    /// Give an element a box for [`Page::element_at`].
    pub fn set_box(&self, node: NodeId, rect: Rect) {
        self.boxes.borrow_mut().insert(node, rect);
    }

    /// The topmost connected element whose box contains `point`: the last
    /// match in tree order, so children beat parents and later siblings
    /// beat earlier ones.
    pub fn element_at(&self, point: Point) -> Option<NodeId> {
        let doc = self.document.borrow();
        let boxes = self.boxes.borrow();
        doc.tree_order()
            .into_iter()
            .filter(|id| doc.element(*id).is_some())
            .filter(|id| boxes.get(id).is_some_and(|r| r.contains(point)))
            .last()
    }

    // -------------------------------------------------------------------
    // Listener registry
    // -------------------------------------------------------------------

    pub fn add_event_listener(&self, kind: EventKind, phase: Phase, callback: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id.get());
        self.next_listener_id.set(id.0 + 1);
        self.listeners.borrow_mut().push(Registration {
            id,
            kind,
            phase,
            callback,
        });
        log::trace!("listener {id:?} added for {kind:?} ({phase:?})");
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|r| r.id != id);
        listeners.len() != before
    }

    /// Total number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Number of listeners registered for `kind` in `phase`.
    pub fn listener_count_for(&self, kind: EventKind, phase: Phase) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.kind == kind && r.phase == phase)
            .count()
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|r| r.id == id)
    }

    fn snapshot(&self, kind: EventKind, phase: Phase) -> Vec<(ListenerId, Listener)> {
        self.listeners
            .borrow()
            .iter()
            .filter(|r| r.kind == kind && r.phase == phase)
            .map(|r| (r.id, Rc::clone(&r.callback)))
            .collect()
    }

    // -------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------

    /// Dispatch `event` and run its default action if nobody cancelled it.
    pub fn dispatch(&self, mut event: DomEvent) -> DispatchOutcome {
        log::trace!("dispatch {:?} at {:?}", event.kind, event.target);
        let mut outcome = DispatchOutcome::default();

        outcome.capture_listeners_run = self.run_phase(Phase::Capture, &mut event);
        if !event.propagation_stopped() {
            outcome.page_handlers_run = self.run_phase(Phase::Bubble, &mut event);
        }

        outcome.default_prevented = event.default_prevented();
        outcome.propagation_stopped = event.propagation_stopped();

        if !event.default_prevented() && event.button == PointerButton::Primary {
            match event.kind {
                EventKind::Click => {
                    outcome.navigated_to = event.target.and_then(|t| self.link_target(t));
                },
                EventKind::PointerDown => outcome.native_drag_started = event.target.is_some(),
                _ => {},
            }
        }
        outcome
    }

    fn run_phase(&self, phase: Phase, event: &mut DomEvent) -> usize {
        let mut ran = 0;
        for (id, callback) in self.snapshot(event.kind, phase) {
            if event.immediate_propagation_stopped() {
                break;
            }
            // A listener removed by an earlier one in this dispatch is skipped.
            if !self.is_registered(id) {
                continue;
            }
            callback(self, event);
            ran += 1;
        }
        ran
    }

    /// Where clicking `target` would navigate to.
    fn link_target(&self, target: NodeId) -> Option<String> {
        let doc = self.document.borrow();
        if !doc.is_connected(target) {
            return None;
        }
        let anchor = doc.closest_hyperlink(target)?;
        let href = doc.element(anchor)?.href()?;
        if href.trim().is_empty() {
            return None;
        }
        self.location.resolve(href)
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("location", &self.location.href())
            .field("nodes", &self.document.borrow().len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{link_page, recorder};

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10.0, 10.0, 20.0, 10.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(29.9, 19.9)));
        assert!(!r.contains(Point::new(30.0, 15.0)));
        assert!(!r.contains(Point::new(15.0, 20.0)));
    }

    #[test]
    fn element_at_prefers_deepest() {
        let fx = link_page("/foo");
        assert_eq!(fx.page.element_at(Point::new(100.0, 100.0)), Some(fx.label));
        assert_eq!(fx.page.element_at(Point::new(5.0, 300.0)), Some(fx.plain));
        assert_eq!(fx.page.element_at(Point::new(900.0, 900.0)), None);
    }

    #[test]
    fn element_at_ignores_detached() {
        let fx = link_page("/foo");
        fx.page.document_mut().detach(fx.anchor);
        assert_eq!(fx.page.element_at(Point::new(100.0, 100.0)), Some(fx.body));
    }

    #[test]
    fn listener_registry_counts() {
        let fx = link_page("/foo");
        let (_, cb) = recorder("x");
        let a = fx.page.add_event_listener(EventKind::Click, Phase::Capture, Rc::clone(&cb));
        let b = fx.page.add_event_listener(EventKind::Click, Phase::Bubble, cb);
        assert_ne!(a, b);
        assert_eq!(fx.page.listener_count(), 2);
        assert_eq!(fx.page.listener_count_for(EventKind::Click, Phase::Capture), 1);
        assert_eq!(fx.page.listener_count_for(EventKind::PointerDown, Phase::Capture), 0);
        assert!(fx.page.remove_event_listener(a));
        assert!(!fx.page.remove_event_listener(a));
        assert_eq!(fx.page.listener_count(), 1);
    }

    #[test]
    fn capture_runs_before_page_handlers() {
        let fx = link_page("/foo");
        let (log, page_cb) = recorder("page");
        fx.page.add_event_listener(EventKind::Click, Phase::Bubble, page_cb);
        let capture_log = Rc::clone(&log);
        fx.page.add_event_listener(
            EventKind::Click,
            Phase::Capture,
            Rc::new(move |_: &Page, _: &mut DomEvent| capture_log.borrow_mut().push("capture")),
        );

        let outcome = fx.page.dispatch(DomEvent::click(Some(fx.label), Point::new(100.0, 100.0)));
        assert_eq!(*log.borrow(), vec!["capture", "page"]);
        assert_eq!(outcome.capture_listeners_run, 1);
        assert_eq!(outcome.page_handlers_run, 1);
    }

    #[test]
    fn uncancelled_click_navigates_to_resolved_href() {
        let fx = link_page("/foo");
        let outcome = fx.page.dispatch(DomEvent::click(Some(fx.label), Point::new(100.0, 100.0)));
        assert_eq!(outcome.navigated_to.as_deref(), Some("https://site.example/foo"));
        assert!(!outcome.default_prevented);
    }

    #[test]
    fn click_outside_links_does_not_navigate() {
        let fx = link_page("/foo");
        let outcome = fx.page.dispatch(DomEvent::click(Some(fx.plain), Point::new(5.0, 300.0)));
        assert_eq!(outcome.navigated_to, None);
        let outcome = fx.page.dispatch(DomEvent::click(None, Point::new(900.0, 900.0)));
        assert_eq!(outcome.navigated_to, None);
    }

    #[test]
    fn non_primary_click_does_not_navigate() {
        let fx = link_page("/foo");
        let event = DomEvent::click(Some(fx.anchor), Point::new(100.0, 100.0))
            .with_button(PointerButton::Auxiliary);
        assert_eq!(fx.page.dispatch(event).navigated_to, None);
    }

    #[test]
    fn prevent_default_cancels_navigation() {
        let fx = link_page("/foo");
        fx.page.add_event_listener(
            EventKind::Click,
            Phase::Capture,
            Rc::new(|_: &Page, e: &mut DomEvent| e.prevent_default()),
        );
        let outcome = fx.page.dispatch(DomEvent::click(Some(fx.anchor), Point::new(100.0, 100.0)));
        assert!(outcome.default_prevented);
        assert_eq!(outcome.navigated_to, None);
    }

    #[test]
    fn stop_propagation_skips_page_handlers() {
        let fx = link_page("/foo");
        let (log, page_cb) = recorder("page");
        fx.page.add_event_listener(EventKind::Click, Phase::Bubble, page_cb);
        fx.page.add_event_listener(
            EventKind::Click,
            Phase::Capture,
            Rc::new(|_: &Page, e: &mut DomEvent| e.stop_propagation()),
        );
        let outcome = fx.page.dispatch(DomEvent::click(Some(fx.anchor), Point::new(100.0, 100.0)));
        assert!(log.borrow().is_empty());
        assert_eq!(outcome.page_handlers_run, 0);
        assert!(outcome.propagation_stopped);
        // Not cancelled, so the link is still followed.
        assert!(outcome.navigated_to.is_some());
    }

    #[test]
    fn stop_immediate_skips_rest_of_phase() {
        let fx = link_page("/foo");
        fx.page.add_event_listener(
            EventKind::Click,
            Phase::Capture,
            Rc::new(|_: &Page, e: &mut DomEvent| e.stop_immediate_propagation()),
        );
        let (log, later) = recorder("later");
        fx.page.add_event_listener(EventKind::Click, Phase::Capture, later);
        let outcome = fx.page.dispatch(DomEvent::click(Some(fx.anchor), Point::new(100.0, 100.0)));
        assert!(log.borrow().is_empty());
        assert_eq!(outcome.capture_listeners_run, 1);
    }

    #[test]
    fn listener_removed_mid_dispatch_is_skipped() {
        let fx = link_page("/foo");
        let victim: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let victim_ref = Rc::clone(&victim);
        fx.page.add_event_listener(
            EventKind::Click,
            Phase::Capture,
            Rc::new(move |page: &Page, _: &mut DomEvent| {
                if let Some(id) = victim_ref.get() {
                    page.remove_event_listener(id);
                }
            }),
        );
        let (log, cb) = recorder("victim");
        victim.set(Some(fx.page.add_event_listener(EventKind::Click, Phase::Capture, cb)));

        fx.page.dispatch(DomEvent::click(Some(fx.anchor), Point::new(100.0, 100.0)));
        assert!(log.borrow().is_empty());
        assert_eq!(fx.page.listener_count(), 1);
    }

    #[test]
    fn listener_added_mid_dispatch_waits_for_next_event() {
        let fx = link_page("/foo");
        let (log, cb) = recorder("added");
        let slot = RefCell::new(Some(cb));
        fx.page.add_event_listener(
            EventKind::Click,
            Phase::Capture,
            Rc::new(move |page: &Page, _: &mut DomEvent| {
                if let Some(cb) = slot.borrow_mut().take() {
                    page.add_event_listener(EventKind::Click, Phase::Capture, cb);
                }
            }),
        );
        fx.page.dispatch(DomEvent::click(Some(fx.anchor), Point::default()));
        assert!(log.borrow().is_empty());
        fx.page.dispatch(DomEvent::click(Some(fx.anchor), Point::default()));
        assert_eq!(*log.borrow(), vec!["added"]);
    }

    #[test]
    fn pointer_down_default_starts_native_drag() {
        let fx = link_page("/foo");
        let outcome = fx.page.dispatch(DomEvent::pointer_down(Some(fx.anchor), Point::default()));
        assert!(outcome.native_drag_started);

        fx.page.add_event_listener(
            EventKind::PointerDown,
            Phase::Capture,
            Rc::new(|_: &Page, e: &mut DomEvent| e.prevent_default()),
        );
        let outcome = fx.page.dispatch(DomEvent::pointer_down(Some(fx.anchor), Point::default()));
        assert!(!outcome.native_drag_started);
    }

    #[test]
    fn empty_or_detached_link_does_not_navigate() {
        let fx = link_page("   ");
        let outcome = fx.page.dispatch(DomEvent::click(Some(fx.anchor), Point::default()));
        assert_eq!(outcome.navigated_to, None);

        let fx = link_page("/foo");
        fx.page.document_mut().detach(fx.anchor);
        let outcome = fx.page.dispatch(DomEvent::click(Some(fx.label), Point::default()));
        assert_eq!(outcome.navigated_to, None);
    }

    #[test]
    fn debug_is_compact() {
        let fx = link_page("/foo");
        let dbg = format!("{:?}", fx.page);
        assert!(dbg.contains("https://site.example/"));
    }
}
