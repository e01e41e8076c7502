use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::foundation::error::{RaceError, RaceResult};

/// Position inside a keyframe sequence.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct FrameIndex(pub usize);

impl FrameIndex {
    pub const ZERO: Self = Self(0);

    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Last valid index of a sequence with `len` frames, `None` when empty.
    pub fn last_of(len: usize) -> Option<Self> {
        len.checked_sub(1).map(Self)
    }
}

/// Instant on the keyframe timeline, in milliseconds since the Unix epoch.
///
/// Unparsable dates become `NaN` rather than an error; the value then flows through
/// interpolation untouched and serializes as `null`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    pub const INVALID: Self = Self(f64::NAN);

    pub fn from_millis(ms: f64) -> Self {
        Self(ms)
    }

    pub fn as_millis(self) -> f64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0.is_finite()
    }

    /// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, naive date-times and RFC 3339.
    ///
    /// Date-only and naive forms are read as UTC.
    pub fn parse(s: &str) -> Self {
        parse_utc(s.trim())
            .map(|dt| Self(dt.timestamp_millis() as f64))
            .unwrap_or(Self::INVALID)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        if !self.is_valid() {
            return None;
        }
        DateTime::from_timestamp_millis(self.0.trunc() as i64)
    }

    pub fn to_rfc3339(self) -> Option<String> {
        self.to_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn label(self, display: DateDisplay) -> String {
        let Some(dt) = self.to_datetime() else {
            return "Invalid Date".to_owned();
        };
        let fmt = match display {
            DateDisplay::Both => "%d/%m/%Y",
            DateDisplay::Month => "%m/%Y",
            DateDisplay::Year => "%Y",
        };
        dt.format(fmt).to_string()
    }
}

fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    let date = match s.len() {
        4 => NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1)?,
        7 => NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()?,
        _ => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?,
    };
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

impl serde::Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_rfc3339() {
            Some(s) => serializer.serialize_str(&s),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Timestamp::parse).unwrap_or(Self::INVALID))
    }
}

/// How a keyframe date is labelled on the chart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateDisplay {
    Month,
    Year,
    #[default]
    Both,
}

/// Chart box in pixels, margins included.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ChartLayout {
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 32.0,
            right: 6.0,
            bottom: 6.0,
            left: 6.0,
        }
    }
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            margin: Margin::default(),
        }
    }
}

impl ChartLayout {
    pub fn new(width: f64, height: f64) -> RaceResult<Self> {
        let layout = Self {
            width,
            height,
            ..Self::default()
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> RaceResult<()> {
        if !(self.width.is_finite() && self.height.is_finite()) {
            return Err(RaceError::validation("chart width/height must be finite"));
        }
        if self.x_max() < 0.0 || self.y_max() < 0.0 {
            return Err(RaceError::validation(
                "chart margins exceed the chart width/height",
            ));
        }
        Ok(())
    }

    /// Drawable width inside the margins.
    pub fn x_max(&self) -> f64 {
        self.width - self.margin.left - self.margin.right
    }

    /// Drawable height inside the margins.
    pub fn y_max(&self) -> f64 {
        self.height - self.margin.top - self.margin.bottom
    }

    /// Tick count for the value axis: one per 100px, capped at 5 on wide charts.
    pub fn suggested_tick_count(&self) -> usize {
        let x_max = self.x_max();
        if x_max > 500.0 {
            5
        } else {
            (x_max / 100.0).floor().max(0.0) as usize
        }
    }
}
