use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap, HashSet},
};

use crate::{
    animation::tween::Lerp,
    data::observation::Observation,
    foundation::{
        core::Timestamp,
        error::{RaceError, RaceResult},
    },
};

/// Slice count used when none is configured.
pub const DEFAULT_SLICE_COUNT: usize = 8;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameDatum {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Dense, ranked snapshot of every entity at one instant.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    pub date: Timestamp,
    pub data: Vec<FrameDatum>, // sorted by value, descending
    #[serde(default)]
    pub synthetic: bool,
}

impl Keyframe {
    pub fn get(&self, name: &str) -> Option<&FrameDatum> {
        self.data.iter().find(|d| d.name == name)
    }
}

/// Builds keyframe sequences with a fixed number of slices between observation dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyframeBuilder {
    slice_count: usize,
}

impl Default for KeyframeBuilder {
    fn default() -> Self {
        Self {
            slice_count: DEFAULT_SLICE_COUNT,
        }
    }
}

impl KeyframeBuilder {
    pub fn new(slice_count: usize) -> RaceResult<Self> {
        if slice_count == 0 {
            return Err(RaceError::validation("slice count must be >= 1"));
        }
        Ok(Self { slice_count })
    }

    pub fn slice_count(&self) -> usize {
        self.slice_count
    }

    #[tracing::instrument(
        skip(observations),
        fields(observations = observations.len(), slices = self.slice_count)
    )]
    pub fn build(&self, observations: &[Observation]) -> Vec<Keyframe> {
        let table = ObservationTable::index(observations);
        let dates: Vec<&str> = table.by_date.keys().copied().collect();
        let k = self.slice_count;

        let mut out = Vec::with_capacity(expected_keyframe_count(dates.len(), k));
        for (i, &date) in dates.iter().enumerate() {
            let t0 = Timestamp::parse(date);
            out.push(table.exact_frame(date, t0));

            let Some(&next) = dates.get(i + 1) else {
                continue;
            };
            let t1 = Timestamp::parse(next);
            for s in 1..k {
                let t = s as f64 / k as f64;
                out.push(table.synthetic_frame(date, next, Timestamp::lerp(&t0, &t1, t), t));
            }
        }

        tracing::debug!(
            keyframes = out.len(),
            dates = dates.len(),
            entities = table.names.len(),
            "built keyframes"
        );
        out
    }
}

/// Builds the full keyframe sequence for `observations`.
///
/// `slice_count - 1` interpolated keyframes are placed between each pair of consecutive
/// observation dates; exact dates are always kept. Fails only when `slice_count` is zero.
pub fn build_keyframes(
    observations: &[Observation],
    slice_count: usize,
) -> RaceResult<Vec<Keyframe>> {
    Ok(KeyframeBuilder::new(slice_count)?.build(observations))
}

/// Sequence length produced for `distinct_dates` observation dates.
pub fn expected_keyframe_count(distinct_dates: usize, slice_count: usize) -> usize {
    match distinct_dates {
        0 => 0,
        n => n + (n - 1) * slice_count.saturating_sub(1),
    }
}

/// Descending by value; NaN sorts after every number.
pub(crate) fn rank_order(a: &FrameDatum, b: &FrameDatum) -> Ordering {
    match (a.value.is_nan(), b.value.is_nan()) {
        (false, false) => b.value.total_cmp(&a.value),
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
    }
}

fn ranked(mut data: Vec<FrameDatum>) -> Vec<FrameDatum> {
    // Stable: equal values keep first-appearance order of the name.
    data.sort_by(rank_order);
    data
}

struct ObservationTable<'a> {
    names: Vec<&'a str>,
    by_date: BTreeMap<&'a str, HashMap<&'a str, &'a Observation>>,
}

impl<'a> ObservationTable<'a> {
    fn index(observations: &'a [Observation]) -> Self {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        let mut by_date: BTreeMap<&str, HashMap<&str, &Observation>> = BTreeMap::new();
        for obs in observations {
            if seen.insert(obs.name.as_str()) {
                names.push(obs.name.as_str());
            }
            // A repeated (date, name) pair replaces the earlier one.
            by_date
                .entry(obs.date.as_str())
                .or_default()
                .insert(obs.name.as_str(), obs);
        }
        Self { names, by_date }
    }

    fn find(&self, date: &str, name: &str) -> Option<&'a Observation> {
        self.by_date.get(date)?.get(name).copied()
    }

    fn value_at(&self, date: &str, name: &str) -> f64 {
        self.find(date, name).map_or(0.0, |o| o.value)
    }

    fn category_at(&self, date: &str, name: &str) -> Option<&'a str> {
        self.find(date, name)?.category.as_deref()
    }

    fn exact_frame(&self, date: &str, ts: Timestamp) -> Keyframe {
        let data = self
            .names
            .iter()
            .map(|&name| FrameDatum {
                name: name.to_owned(),
                value: self.value_at(date, name),
                category: self.category_at(date, name).map(str::to_owned),
            })
            .collect();
        Keyframe {
            date: ts,
            data: ranked(data),
            synthetic: false,
        }
    }

    fn synthetic_frame(&self, from: &str, to: &str, ts: Timestamp, t: f64) -> Keyframe {
        let data = self
            .names
            .iter()
            .map(|&name| {
                let v0 = self.value_at(from, name);
                let v1 = self.value_at(to, name);
                let category = self
                    .category_at(from, name)
                    .or_else(|| self.category_at(to, name));
                FrameDatum {
                    name: name.to_owned(),
                    value: f64::lerp(&v0, &v1, t),
                    category: category.map(str::to_owned),
                }
            })
            .collect();
        Keyframe {
            date: ts,
            data: ranked(data),
            synthetic: true,
        }
    }
}
