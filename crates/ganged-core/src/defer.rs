//! Tick-delayed action queue.
//!
//! Actions are queued with a tick delay and executed at tick boundaries,
//! in enqueue order, once the delay has elapsed. This lets a correction
//! run after the host's own same-frame reaction to an input event has
//! finished. There is no cancellation: once enqueued an action always
//! runs, and any "skip" condition belongs inside the action body as a
//! runtime check.

use crate::fixed::Ticks;

/// A queued zero-argument action over the context `Ctx`.
pub type DeferredAction<Ctx> = Box<dyn FnOnce(&mut Ctx)>;

struct Entry<Ctx> {
    ready_at: Ticks,
    action: DeferredAction<Ctx>,
}

/// FIFO queue of tick-delayed actions. An action scheduled with delay `d`
/// at tick `t` becomes ready at tick `t + d`: never early, never twice.
pub struct DeferredQueue<Ctx> {
    pending: Vec<Entry<Ctx>>,
}

impl<Ctx> Default for DeferredQueue<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> DeferredQueue<Ctx> {
    pub fn new() -> Self {
        Self { pending: Vec::new() }
    }

    /// Queue `action` to run once at least `delay` ticks have elapsed past
    /// `now`.
    pub fn schedule(
        &mut self,
        now: Ticks,
        delay: Ticks,
        action: impl FnOnce(&mut Ctx) + 'static,
    ) {
        self.pending.push(Entry {
            ready_at: now.saturating_add(delay),
            action: Box::new(action),
        });
    }

    /// Remove and return every action whose delay has elapsed, preserving
    /// enqueue order. Actions not yet ready stay queued.
    pub fn take_ready(&mut self, now: Ticks) -> Vec<DeferredAction<Ctx>> {
        let mut ready = Vec::new();
        let mut rest = Vec::new();
        for entry in self.pending.drain(..) {
            if entry.ready_at <= now {
                ready.push(entry.action);
            } else {
                rest.push(entry);
            }
        }
        self.pending = rest;
        ready
    }

    /// Number of actions waiting to run.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<Ctx> std::fmt::Debug for DeferredQueue<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredQueue")
            .field("pending", &self.pending.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
