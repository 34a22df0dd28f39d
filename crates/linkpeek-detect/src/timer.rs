//! One-shot timers.
//!
//! The engine needs exactly one kind of timer: "call me back in N
//! milliseconds unless I cancel first". [`TimerQueue`] abstracts it so the
//! host can plug in its own event loop, and [`ManualTimers`] provides a
//! virtual clock that only moves when told to.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;

/// Handle for a scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

pub type TimerCallback = Box<dyn FnOnce()>;

/// A source of one-shot timers on the engine's thread.
pub trait TimerQueue {
    /// Current time in milliseconds on this queue's clock.
    fn now_ms(&self) -> u64;

    /// Run `callback` once, `delay_ms` from now.
    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> TimerId;

    /// Cancel a pending callback. Returns `false` if it already ran or was
    /// never scheduled.
    fn clear_timeout(&self, id: TimerId) -> bool;

    /// Number of callbacks still waiting to run.
    fn pending_count(&self) -> usize;
}

// -----------------------------------------------------------------------
// ManualTimers
// -----------------------------------------------------------------------

/// A virtual clock.
///
/// Time only advances through [`ManualTimers::advance`] and
/// [`ManualTimers::advance_to`]. Callbacks that become due run in deadline
/// order, ties broken by scheduling order, and may schedule or cancel
/// further timers while they run.
pub struct ManualTimers {
    now: Cell<u64>,
    next_id: Cell<u64>,
    // Keyed by (deadline, id): ids grow monotonically, so iteration order is
    // also the firing order.
    pending: RefCell<BTreeMap<(u64, TimerId), TimerCallback>>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now: Cell::new(now_ms),
            next_id: Cell::new(1),
            pending: RefCell::new(BTreeMap::new()),
        }
    }

    /// Advance the clock by `ms`, firing everything that comes due.
    /// Returns the number of callbacks run.
    pub fn advance(&self, ms: u64) -> usize {
        self.advance_to(self.now.get().saturating_add(ms))
    }

    /// Advance the clock to `target_ms`. Moving backwards is a no-op.
    pub fn advance_to(&self, target_ms: u64) -> usize {
        if target_ms < self.now.get() {
            log::warn!("clock cannot move back from {} to {target_ms}", self.now.get());
            return 0;
        }
        let mut fired = 0;
        while let Some((deadline, callback)) = self.pop_due(target_ms) {
            self.now.set(deadline);
            // No borrow of `pending` is held here.
            callback();
            fired += 1;
        }
        self.now.set(target_ms);
        fired
    }

    /// Deadline of the next pending callback.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.borrow().keys().next().map(|(deadline, _)| *deadline)
    }

    fn pop_due(&self, target_ms: u64) -> Option<(u64, TimerCallback)> {
        let mut pending = self.pending.borrow_mut();
        let key = *pending.keys().next()?;
        if key.0 > target_ms {
            return None;
        }
        pending.remove(&key).map(|cb| (key.0, cb))
    }
}

impl Default for ManualTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue for ManualTimers {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn set_timeout(&self, delay_ms: u32, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        let deadline = self.now.get().saturating_add(u64::from(delay_ms));
        self.pending.borrow_mut().insert((deadline, id), callback);
        log::trace!("timer {id:?} due at {deadline}");
        id
    }

    fn clear_timeout(&self, id: TimerId) -> bool {
        let mut pending = self.pending.borrow_mut();
        let key = pending.keys().find(|(_, t)| *t == id).copied();
        key.is_some_and(|k| pending.remove(&k).is_some())
    }

    fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl fmt::Debug for ManualTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualTimers")
            .field("now", &self.now.get())
            .field("pending", &self.pending_count())
            .finish()
    }
}
