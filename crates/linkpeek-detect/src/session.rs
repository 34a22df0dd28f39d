//! Detection sessions.
//!
//! [`activate`] binds the engine to a page and returns the only handle to
//! its state. Page listeners and the long-press timer reach that state
//! through weak references, so the handle alone decides how long the
//! session lives, and dropping it cleans up like [`SessionHandle::teardown`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use linkpeek_dom::{DomEvent, EventKind, Listener, NodeId, Page};
use linkpeek_types::config::{DetectionConfig, TriggerMode};

use crate::arbitrator::EventArbitrator;
use crate::gesture::{Detection, GestureDetector, PressId, Reaction};
use crate::timer::TimerQueue;

type DetectionCallback = Box<dyn FnMut(&str, NodeId)>;

struct SessionState {
    detector: GestureDetector,
    arbitrator: EventArbitrator,
    torn_down: bool,
}

struct Shared {
    state: RefCell<SessionState>,
    timers: Rc<dyn TimerQueue>,
    on_link_detected: RefCell<DetectionCallback>,
}

/// Start detecting links on `page` with `config`.
///
/// `on_link_detected` receives the absolute URL and the element the gesture
/// started on. It runs after the engine has finished with the event, so it
/// may tear down or reconfigure the session.
pub fn activate(
    page: Rc<Page>,
    timers: Rc<dyn TimerQueue>,
    config: DetectionConfig,
    on_link_detected: impl FnMut(&str, NodeId) + 'static,
) -> SessionHandle {
    let shared = Rc::new(Shared {
        state: RefCell::new(SessionState {
            detector: GestureDetector::new(config),
            arbitrator: EventArbitrator::new(),
            torn_down: false,
        }),
        timers,
        on_link_detected: RefCell::new(Box::new(on_link_detected)),
    });
    bind(&page, &shared, config.mode());
    log::debug!("session activated ({}) on {}", config.mode(), page.location());
    SessionHandle { page, shared }
}

fn bind(page: &Page, shared: &Rc<Shared>, mode: TriggerMode) {
    let weak = Rc::downgrade(shared);
    shared.state.borrow_mut().arbitrator.bind(page, mode, |_| {
        let weak = Weak::clone(&weak);
        let listener: Listener = Rc::new(move |page: &Page, event: &mut DomEvent| {
            if let Some(shared) = weak.upgrade() {
                shared.on_event(page, event);
            }
        });
        listener
    });
}

impl Shared {
    fn on_event(self: &Rc<Self>, page: &Page, event: &mut DomEvent) {
        log::trace!("{:?} at {:?} on {:?}", event.kind, event.position, event.target);
        let detection = {
            let mut state = self.state.borrow_mut();
            if state.torn_down {
                return;
            }
            let reaction = match event.kind {
                EventKind::Click => {
                    if state.arbitrator.guard_click(event) {
                        return;
                    }
                    state.detector.click(event, page)
                },
                EventKind::PointerDown => {
                    // A leftover flag from a gesture whose click never came.
                    state.arbitrator.clear_suppression();
                    state.detector.pointer_down(event, self.timers.now_ms(), page)
                },
                EventKind::PointerMove => state.detector.pointer_move(event, page),
                EventKind::PointerUp => state.detector.pointer_up(),
                EventKind::VisibilityChange | EventKind::Blur => state.detector.interrupt(),
            };
            self.carry_out(&mut state, reaction, Some(event))
        };
        if let Some(detection) = detection {
            self.emit(detection);
        }
    }

    fn on_long_press(self: &Rc<Self>, press: PressId) {
        let detection = {
            let mut state = self.state.borrow_mut();
            if state.torn_down {
                return;
            }
            let reaction = state.detector.long_press_elapsed(press);
            self.carry_out(&mut state, reaction, None)
        };
        if let Some(detection) = detection {
            self.emit(detection);
        }
    }

    /// Apply everything in `reaction` except the detection, which is
    /// returned for the caller to emit once the state is released.
    fn carry_out(
        self: &Rc<Self>,
        state: &mut SessionState,
        reaction: Reaction,
        event: Option<&mut DomEvent>,
    ) -> Option<Detection> {
        state.arbitrator.apply(&reaction, event);
        if let Some(timer) = reaction.cancel_timer {
            self.timers.clear_timeout(timer);
        }
        if let Some((press, delay_ms)) = reaction.schedule {
            let weak = Rc::downgrade(self);
            let timer = self.timers.set_timeout(
                delay_ms,
                Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.on_long_press(press);
                    }
                }),
            );
            if !state.detector.attach_timer(press, timer) {
                self.timers.clear_timeout(timer);
            }
        }
        reaction.detection
    }

    fn emit(&self, detection: Detection) {
        match self.on_link_detected.try_borrow_mut() {
            Ok(mut callback) => callback(&detection.url, detection.source),
            Err(_) => log::warn!(
                "detection of {} dropped: raised from inside the detection callback",
                detection.url
            ),
        }
    }

    fn shut_down(&self, state: &mut SessionState, page: &Page) {
        if let Some(timer) = state.detector.reset().cancel_timer {
            self.timers.clear_timeout(timer);
        }
        state.arbitrator.unbind(page);
    }
}

// -----------------------------------------------------------------------
// SessionHandle
// -----------------------------------------------------------------------

/// Owner of an active detection session.
pub struct SessionHandle {
    page: Rc<Page>,
    shared: Rc<Shared>,
}

impl SessionHandle {
    /// Cancel any pending timer and remove every listener. Safe to call any
    /// number of times.
    pub fn teardown(&self) {
        let mut state = self.shared.state.borrow_mut();
        if state.torn_down {
            return;
        }
        self.shared.shut_down(&mut state, &self.page);
        state.torn_down = true;
        log::debug!("session torn down on {}", self.page.location());
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.state.borrow().torn_down
    }

    /// Whether a press is currently being tracked.
    pub fn is_active(&self) -> bool {
        let state = self.shared.state.borrow();
        !state.torn_down && state.detector.is_armed()
    }

    pub fn config(&self) -> DetectionConfig {
        *self.shared.state.borrow().detector.config()
    }

    pub fn mode(&self) -> TriggerMode {
        self.config().mode()
    }

    /// Switch to `config`, dropping any press in progress and replacing the
    /// listeners of the old mode with those of the new one.
    ///
    /// Returns `false` and does nothing if the session was torn down.
    pub fn reconfigure(&self, config: DetectionConfig) -> bool {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.torn_down {
                log::warn!("reconfigure on a torn down session ignored");
                return false;
            }
            let previous = state.detector.mode();
            self.shared.shut_down(&mut state, &self.page);
            state.detector = GestureDetector::new(config);
            log::debug!("session switching {previous} -> {}", config.mode());
        }
        bind(&self.page, &self.shared, config.mode());
        true
    }

    pub fn page(&self) -> &Rc<Page> {
        &self.page
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("SessionHandle")
            .field("mode", &state.detector.mode())
            .field("armed", &state.detector.is_armed())
            .field("listeners", &state.arbitrator.bound_count())
            .field("torn_down", &state.torn_down)
            .finish()
    }
}
