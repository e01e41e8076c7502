use std::{path::Path, time::Duration};

use crate::{
    animation::ease::Ease,
    foundation::{
        core::{ChartLayout, DateDisplay},
        error::{RaceError, RaceResult},
    },
    keyframes::builder::{DEFAULT_SLICE_COUNT, KeyframeBuilder},
    playback::controller::DEFAULT_TICK_INTERVAL,
    projection::mapper::{DEFAULT_BAND_PADDING, DEFAULT_TOP_N, ProjectionOptions},
};

/// Tunables for building and playing a race. Every field has a default, so a config file only
/// needs the keys it changes.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RaceConfig {
    pub slice_count: usize,
    pub top_n: usize,
    pub tick_interval_ms: u64,
    pub layout: ChartLayout,
    pub band_padding: f64,
    pub ease: Ease,
    pub date_display: DateDisplay,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            slice_count: DEFAULT_SLICE_COUNT,
            top_n: DEFAULT_TOP_N,
            tick_interval_ms: DEFAULT_TICK_INTERVAL.as_millis() as u64,
            layout: ChartLayout::default(),
            band_padding: DEFAULT_BAND_PADDING,
            ease: Ease::default(),
            date_display: DateDisplay::default(),
        }
    }
}

impl RaceConfig {
    pub fn from_json_str(s: &str) -> RaceResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> RaceResult<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::from_json_str(&s)
            .map_err(|e| RaceError::validation(format!("config '{}': {e}", path.display())))
    }

    pub fn validate(&self) -> RaceResult<()> {
        if self.slice_count == 0 {
            return Err(RaceError::validation("slice_count must be >= 1"));
        }
        if self.tick_interval_ms == 0 {
            return Err(RaceError::validation("tick_interval_ms must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.band_padding) {
            return Err(RaceError::validation("band_padding must be within [0, 1]"));
        }
        self.layout.validate()
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn builder(&self) -> RaceResult<KeyframeBuilder> {
        KeyframeBuilder::new(self.slice_count)
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions {
            band_padding: self.band_padding,
            ..ProjectionOptions::from_layout(&self.layout, self.top_n)
        }
    }
}
