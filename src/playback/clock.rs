//! Timer sources for the playback controller.
//!
//! The controller never sleeps or spawns anything. It asks a [`Clock`] to schedule a one-shot
//! timer and the host loop hands the fired [`TimerId`] back via
//! [`PlaybackController::on_timer`](crate::PlaybackController::on_timer).

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

pub trait Clock {
    /// Arms a one-shot timer firing `delay` from now.
    fn schedule(&mut self, delay: Duration) -> TimerId;

    /// Disarms `id`. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        (**self).schedule(delay)
    }

    fn cancel(&mut self, id: TimerId) {
        (**self).cancel(id)
    }
}

/// A clock whose time only moves when the host says so.
pub trait ManualClock: Clock {
    fn now(&self) -> Duration;

    /// Moves time to the earliest deadline at or before `limit` and disarms that timer.
    fn pop_due(&mut self, limit: Duration) -> Option<TimerId>;

    /// Moves time forward to `now`; never backward.
    fn set_now(&mut self, now: Duration);
}

impl<C: ManualClock + ?Sized> ManualClock for &mut C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn pop_due(&mut self, limit: Duration) -> Option<TimerId> {
        (**self).pop_due(limit)
    }

    fn set_now(&mut self, now: Duration) {
        (**self).set_now(now)
    }
}

/// Deterministic clock advanced by hand. Used by tests and offline stepping.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<TimerId, Duration>,
    scheduled: u64,
    canceled: u64,
    max_pending: usize,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Largest number of simultaneously armed timers ever observed.
    pub fn max_pending(&self) -> usize {
        self.max_pending
    }

    pub fn scheduled_count(&self) -> u64 {
        self.scheduled
    }

    pub fn canceled_count(&self) -> u64 {
        self.canceled
    }

    /// Earliest armed timer, ties broken by id.
    pub fn next_deadline(&self) -> Option<(TimerId, Duration)> {
        self.pending
            .iter()
            .min_by_key(|(id, at)| (**at, **id))
            .map(|(id, at)| (*id, *at))
    }
}

impl ManualClock for VirtualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn pop_due(&mut self, limit: Duration) -> Option<TimerId> {
        let (id, at) = self.next_deadline().filter(|(_, at)| *at <= limit)?;
        self.pending.remove(&id);
        self.now = self.now.max(at);
        Some(id)
    }

    fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Clock for VirtualClock {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.insert(id, self.now.saturating_add(delay));
        self.scheduled += 1;
        self.max_pending = self.max_pending.max(self.pending.len());
        id
    }

    fn cancel(&mut self, id: TimerId) {
        if self.pending.remove(&id).is_some() {
            self.canceled += 1;
        }
    }
}

const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Wall-clock deadlines for an interactive host loop.
#[derive(Debug, Default)]
pub struct WallClock {
    next_id: u64,
    pending: BTreeMap<TimerId, Instant>,
}

impl WallClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_deadline(&self) -> Option<(TimerId, Instant)> {
        self.pending
            .iter()
            .min_by_key(|(id, at)| (**at, **id))
            .map(|(id, at)| (*id, *at))
    }

    /// Disarms and returns the earliest timer whose deadline has passed.
    pub fn pop_expired(&mut self, now: Instant) -> Option<TimerId> {
        let (id, _) = self.next_deadline().filter(|(_, at)| *at <= now)?;
        self.pending.remove(&id);
        Some(id)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Clock for WallClock {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let now = Instant::now();
        // Delays past what `Instant` can represent are parked a century out.
        let at = now
            .checked_add(delay)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        self.pending.insert(id, at);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.remove(&id);
    }
}
