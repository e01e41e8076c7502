//! Barrace turns sparse, per-date observations into a smoothly animated bar-chart race.
//!
//! # Pipeline overview
//!
//! 1. **Build**: `&[Observation] -> Vec<Keyframe>` with interpolated keyframes between dates
//! 2. **Play**: a [`PlaybackController`] steps a frame index on a fixed interval, one timer at a
//!    time, driven by a host [`Clock`]
//! 3. **Project**: `Keyframe + top-N -> Projection` (scales and ranked rows for one frame)
//! 4. **Transition**: a [`TransitionTracker`] keys bars by name so a renderer can animate
//!    enter/update/exit between frames
//!
//! Nothing here draws pixels or performs IO beyond loading datasets and configs from disk.
#![forbid(unsafe_code)]

mod animation;
mod config;
mod data;
mod foundation;
mod keyframes;
mod playback;
mod projection;

pub use animation::ease::Ease;
pub use animation::tween::Lerp;
pub use config::RaceConfig;
pub use data::observation::{
    Dataset, Observation, SaleProduct, SaleRecord, load_observations, observations_from_sales,
};
pub use foundation::core::{ChartLayout, DateDisplay, FrameIndex, Margin, Timestamp};
pub use foundation::error::{RaceError, RaceResult};
pub use keyframes::builder::{
    DEFAULT_SLICE_COUNT, FrameDatum, Keyframe, KeyframeBuilder, build_keyframes,
    expected_keyframe_count,
};
pub use playback::clock::{Clock, ManualClock, TimerId, VirtualClock, WallClock};
pub use playback::controller::{
    AnimationState, DEFAULT_TICK_INTERVAL, PlaybackController, PlaybackHooks, PlaybackListener,
    TickOutcome,
};
pub use projection::mapper::{
    DEFAULT_BAND_PADDING, DEFAULT_TOP_N, Projection, ProjectionOptions, RenderInstruction,
    project, project_with,
};
pub use projection::scale::{BandScale, LinearScale};
pub use projection::transition::{BarGeometry, BarTransition, Phase, TransitionTracker};
