use std::collections::HashMap;

use crate::{
    animation::{ease::Ease, tween::Lerp},
    projection::mapper::Projection,
};

/// Where a bar sits and how long it is, in chart pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct BarGeometry {
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub value: f64,
}

impl BarGeometry {
    /// Same slot, zero length and zero value.
    pub fn collapsed(self) -> Self {
        Self {
            width: 0.0,
            value: 0.0,
            ..self
        }
    }
}

impl Lerp for BarGeometry {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            y: f64::lerp(&a.y, &b.y, t),
            width: f64::lerp(&a.width, &b.width, t),
            height: f64::lerp(&a.height, &b.height, t),
            value: f64::lerp(&a.value, &b.value, t),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Enter,
    Update,
    Exit,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BarTransition {
    pub name: String,
    pub phase: Phase,
    pub rank: Option<usize>, // None while exiting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub from: BarGeometry,
    pub to: BarGeometry,
}

impl BarTransition {
    pub fn sample(&self, t: f64, ease: Ease) -> BarGeometry {
        BarGeometry::lerp(&self.from, &self.to, ease.apply(t))
    }
}

/// Diffs successive projections by entity name.
///
/// Bars present before and after are updates, new names enter from zero length at their new slot,
/// and names that dropped out of the top rows exit to zero length at their old slot. A new
/// playback generation forgets everything, so the next projection enters from scratch.
#[derive(Debug, Default)]
pub struct TransitionTracker {
    generation: Option<u64>,
    previous: Vec<Shown>,
}

#[derive(Debug)]
struct Shown {
    name: String,
    category: Option<String>,
    geometry: BarGeometry,
}

impl TransitionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// Transitions from the last seen projection to `next`: current rows in rank order, then
    /// exits in their previous order.
    pub fn update(&mut self, next: &Projection, generation: u64) -> Vec<BarTransition> {
        if self.generation != Some(generation) {
            tracing::debug!(generation, "transition state reset");
            self.generation = Some(generation);
            self.previous.clear();
        }

        let before: HashMap<&str, BarGeometry> = self
            .previous
            .iter()
            .map(|s| (s.name.as_str(), s.geometry))
            .collect();

        let mut out = Vec::with_capacity(next.rows.len() + self.previous.len());
        let mut current = Vec::with_capacity(next.rows.len());
        for row in &next.rows {
            let to = next.geometry_of(row);
            let (phase, from) = match before.get(row.name.as_str()) {
                Some(prev) => (Phase::Update, *prev),
                None => (Phase::Enter, to.collapsed()),
            };
            out.push(BarTransition {
                name: row.name.clone(),
                phase,
                rank: Some(row.rank),
                category: row.category.clone(),
                from,
                to,
            });
            current.push(Shown {
                name: row.name.clone(),
                category: row.category.clone(),
                geometry: to,
            });
        }

        for prev in &self.previous {
            if next.row(&prev.name).is_some() {
                continue;
            }
            out.push(BarTransition {
                name: prev.name.clone(),
                phase: Phase::Exit,
                rank: None,
                category: prev.category.clone(),
                from: prev.geometry,
                to: prev.geometry.collapsed(),
            });
        }

        self.previous = current;
        out
    }
}
