//! Host clock that drives auto-updating emitters

use crate::emitter::{Emitter, EmitterState};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

/// Longest step handed to emitters, so a stalled frame doesn't dump a
/// burst of catch-up spawns.
pub const MAX_DELTA: f32 = 0.1;

/// Drives every registered emitter whose `auto_update` flag is set.
///
/// The ticker holds weak references only: dropping the last strong handle
/// to an emitter, or destroying it, removes it on the next advance.
pub struct Ticker {
    emitters: Vec<Weak<RefCell<Emitter>>>,
    /// Total seconds advanced
    pub total_time: f64,
    /// Seconds passed to emitters on the last advance
    pub delta_time: f32,
    last_instant: Instant,
    first_tick: bool,
}

impl Default for Ticker {
    fn default() -> Self {
        Self {
            emitters: Vec::new(),
            total_time: 0.0,
            delta_time: 0.0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl Ticker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, emitter: &Rc<RefCell<Emitter>>) {
        let weak = Rc::downgrade(emitter);
        if !self.emitters.iter().any(|e| e.ptr_eq(&weak)) {
            self.emitters.push(weak);
        }
    }

    pub fn remove(&mut self, emitter: &Rc<RefCell<Emitter>>) {
        let weak = Rc::downgrade(emitter);
        self.emitters.retain(|e| !e.ptr_eq(&weak));
    }

    /// Emitters still tracked.
    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Advance by wall time since the previous call. Call once per frame;
    /// the first call only starts the clock.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f32();
        self.last_instant = now;
        self.advance(elapsed);
    }

    /// Advance by `delta` seconds, clamped to `MAX_DELTA`.
    pub fn advance(&mut self, delta: f32) {
        let delta = delta.clamp(0.0, MAX_DELTA);
        self.delta_time = delta;
        self.total_time += delta as f64;

        self.emitters.retain(|weak| {
            let Some(emitter) = weak.upgrade() else {
                return false;
            };
            let mut emitter = emitter.borrow_mut();
            if emitter.auto_update() {
                emitter.update(delta);
            }
            emitter.state() != EmitterState::Destroyed
        });
    }
}
