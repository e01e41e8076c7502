use std::{sync::Arc, time::Duration};

use crate::{
    foundation::{
        core::FrameIndex,
        error::{RaceError, RaceResult},
    },
    keyframes::builder::Keyframe,
    playback::clock::{Clock, ManualClock, TimerId},
};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct AnimationState {
    pub frame_index: FrameIndex,
    pub playing: bool,
    pub generation: u64, // bumped by every replay
}

/// Receives lifecycle notifications, synchronously and after the state change is applied.
pub trait PlaybackListener {
    fn on_start(&mut self) {}

    fn on_stop(&mut self) {}

    /// The clock advanced to `frame`. Not sent for the reset to frame 0 on replay.
    fn on_frame(&mut self, _frame: FrameIndex) {}

    /// Position went back to frame 0; interpolated visual state should be dropped.
    fn on_replay(&mut self, _generation: u64) {}
}

type Hook = Box<dyn FnMut()>;

/// Closure-backed [`PlaybackListener`].
#[derive(Default)]
pub struct PlaybackHooks {
    on_start: Option<Hook>,
    on_stop: Option<Hook>,
    on_frame: Option<Box<dyn FnMut(FrameIndex)>>,
    on_replay: Option<Box<dyn FnMut(u64)>>,
}

impl PlaybackHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_start(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    pub fn on_stop(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_stop = Some(Box::new(f));
        self
    }

    pub fn on_frame(mut self, f: impl FnMut(FrameIndex) + 'static) -> Self {
        self.on_frame = Some(Box::new(f));
        self
    }

    pub fn on_replay(mut self, f: impl FnMut(u64) + 'static) -> Self {
        self.on_replay = Some(Box::new(f));
        self
    }
}

impl PlaybackListener for PlaybackHooks {
    fn on_start(&mut self) {
        if let Some(f) = self.on_start.as_mut() {
            f();
        }
    }

    fn on_stop(&mut self) {
        if let Some(f) = self.on_stop.as_mut() {
            f();
        }
    }

    fn on_frame(&mut self, frame: FrameIndex) {
        if let Some(f) = self.on_frame.as_mut() {
            f(frame);
        }
    }

    fn on_replay(&mut self, generation: u64) {
        if let Some(f) = self.on_replay.as_mut() {
            f(generation);
        }
    }
}

/// What a delivered timer fire did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced(FrameIndex),
    /// The last frame was already showing; playback stopped.
    Finished,
    /// Not the pending tick (canceled, stale or after dispose).
    Ignored,
}

#[derive(Clone, Copy, Debug)]
enum Event {
    Started,
    Stopped,
    Frame(FrameIndex),
    Replayed(u64),
}

/// Steps through a keyframe sequence on a fixed interval.
///
/// Exactly one timer is ever armed. `stop`, `replay` and dispose cancel it before touching
/// state, and a fire whose id is not the armed one is ignored, so a stale tick can never move
/// the frame index.
pub struct PlaybackController<C: Clock> {
    keyframes: Arc<[Keyframe]>,
    clock: C,
    interval: Duration,
    state: AnimationState,
    pending: Option<TimerId>,
    listeners: Vec<Box<dyn PlaybackListener>>,
    disposed: bool,
}

impl<C: Clock> PlaybackController<C> {
    pub fn new(keyframes: impl Into<Arc<[Keyframe]>>, clock: C) -> Self {
        Self {
            keyframes: keyframes.into(),
            clock,
            interval: DEFAULT_TICK_INTERVAL,
            state: AnimationState::default(),
            pending: None,
            listeners: Vec::new(),
            disposed: false,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> RaceResult<Self> {
        if interval.is_zero() {
            return Err(RaceError::playback("tick interval must be > 0"));
        }
        self.interval = interval;
        Ok(self)
    }

    pub fn subscribe(&mut self, listener: impl PlaybackListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn playing(&self) -> bool {
        self.state.playing
    }

    pub fn frame_index(&self) -> FrameIndex {
        self.state.frame_index
    }

    pub fn generation(&self) -> u64 {
        self.state.generation
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn keyframes(&self) -> &Arc<[Keyframe]> {
        &self.keyframes
    }

    pub fn current_keyframe(&self) -> Option<&Keyframe> {
        self.keyframes.get(self.state.frame_index.0)
    }

    pub fn has_pending_tick(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn start(&mut self) {
        if self.disposed || self.keyframes.is_empty() || self.state.playing {
            return;
        }
        self.state.playing = true;
        tracing::debug!(frame = self.state.frame_index.0, "playback started");
        self.emit(Event::Started);
        self.schedule_tick();
    }

    pub fn stop(&mut self) {
        if self.disposed || !self.state.playing {
            return;
        }
        self.cancel_tick();
        self.state.playing = false;
        tracing::debug!(frame = self.state.frame_index.0, "playback stopped");
        self.emit(Event::Stopped);
    }

    pub fn replay(&mut self) {
        if self.disposed || self.keyframes.is_empty() {
            return;
        }
        self.cancel_tick();
        let was_playing = self.state.playing;
        self.state = AnimationState {
            frame_index: FrameIndex::ZERO,
            playing: true,
            generation: self.state.generation + 1,
        };
        tracing::debug!(generation = self.state.generation, "playback replayed");
        if !was_playing {
            self.emit(Event::Started);
        }
        self.emit(Event::Replayed(self.state.generation));
        self.schedule_tick();
    }

    /// Delivers a fired timer. Hosts call this for every id their clock reports as due.
    pub fn on_timer(&mut self, id: TimerId) -> TickOutcome {
        if self.disposed || self.pending != Some(id) {
            tracing::warn!(timer = id.0, "ignoring stale playback tick");
            return TickOutcome::Ignored;
        }
        self.pending = None;
        if !self.state.playing {
            return TickOutcome::Ignored;
        }

        let is_last = FrameIndex::last_of(self.keyframes.len())
            .is_none_or(|last| self.state.frame_index >= last);
        if is_last {
            self.state.playing = false;
            tracing::debug!(frame = self.state.frame_index.0, "playback reached the last frame");
            self.emit(Event::Stopped);
            return TickOutcome::Finished;
        }

        self.state.frame_index = self.state.frame_index.next();
        tracing::trace!(frame = self.state.frame_index.0, "tick");
        self.emit(Event::Frame(self.state.frame_index));
        if self.state.playing {
            self.schedule_tick();
        }
        TickOutcome::Advanced(self.state.frame_index)
    }

    /// Cancels the pending tick, leaves playback stopped without firing `on_stop`, and turns every
    /// later command into a no-op.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_tick();
        self.state.playing = false;
        self.disposed = true;
        tracing::debug!("playback disposed");
    }

    fn schedule_tick(&mut self) {
        if self.pending.is_some() {
            return;
        }
        self.pending = Some(self.clock.schedule(self.interval));
    }

    fn cancel_tick(&mut self) {
        if let Some(id) = self.pending.take() {
            self.clock.cancel(id);
        }
    }

    fn emit(&mut self, event: Event) {
        for listener in &mut self.listeners {
            match event {
                Event::Started => listener.on_start(),
                Event::Stopped => listener.on_stop(),
                Event::Frame(frame) => listener.on_frame(frame),
                Event::Replayed(generation) => listener.on_replay(generation),
            }
        }
    }
}

impl<C: ManualClock> PlaybackController<C> {
    /// Moves the clock forward by `by`, delivering every tick that falls due. Returns the
    /// number of fires delivered.
    pub fn advance(&mut self, by: Duration) -> usize {
        let target = self.clock.now().saturating_add(by);
        let mut fired = 0;
        while let Some(id) = self.clock.pop_due(target) {
            self.on_timer(id);
            fired += 1;
        }
        self.clock.set_now(target);
        fired
    }

    /// Delivers ticks until playback stops on its own. Returns the number of fires delivered.
    pub fn run_to_end(&mut self) -> usize {
        let mut fired = 0;
        // One fire per frame plus the terminal one.
        let budget = self.keyframes.len() + 1;
        while self.state.playing && fired < budget {
            let Some(id) = self.clock.pop_due(Duration::MAX) else {
                break;
            };
            self.on_timer(id);
            fired += 1;
        }
        fired
    }
}

impl<C: Clock> Drop for PlaybackController<C> {
    fn drop(&mut self) {
        self.dispose();
    }
}
