use crate::{
    foundation::core::ChartLayout,
    keyframes::builder::Keyframe,
    projection::{
        scale::{BandScale, LinearScale},
        transition::BarGeometry,
    },
};

pub const DEFAULT_TOP_N: usize = 10;
pub const DEFAULT_BAND_PADDING: f64 = 0.1;

/// One visible bar, in rank order.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct RenderInstruction {
    pub name: String,
    pub rank: usize,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Everything a rendering surface needs to draw one keyframe.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Projection {
    pub value_scale: LinearScale,
    pub rank_scale: BandScale,
    pub rows: Vec<RenderInstruction>,
}

impl Projection {
    pub fn row(&self, name: &str) -> Option<&RenderInstruction> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// Bar placement for `name`; widths below zero are clamped to zero.
    pub fn geometry(&self, name: &str) -> Option<BarGeometry> {
        let row = self.row(name)?;
        Some(self.geometry_of(row))
    }

    pub(crate) fn geometry_of(&self, row: &RenderInstruction) -> BarGeometry {
        BarGeometry {
            y: self.rank_scale.apply(&row.name).unwrap_or(0.0),
            width: self.value_scale.apply(row.value).max(0.0),
            height: self.rank_scale.bandwidth(),
            value: row.value,
        }
    }

    /// Largest visible value; the right edge of the value axis.
    pub fn domain_max(&self) -> f64 {
        self.value_scale.domain[1]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionOptions {
    pub top_n: usize,
    pub x_max: f64,
    pub y_max: f64,
    pub band_padding: f64,
}

impl ProjectionOptions {
    pub fn from_layout(layout: &ChartLayout, top_n: usize) -> Self {
        Self {
            top_n,
            x_max: layout.x_max(),
            y_max: layout.y_max(),
            band_padding: DEFAULT_BAND_PADDING,
        }
    }
}

/// Projects the first `top_n` rows of `keyframe` onto an `x_max` by `y_max` box.
pub fn project(keyframe: &Keyframe, top_n: usize, x_max: f64, y_max: f64) -> Projection {
    project_with(
        keyframe,
        &ProjectionOptions {
            top_n,
            x_max,
            y_max,
            band_padding: DEFAULT_BAND_PADDING,
        },
    )
}

/// The value domain is taken from the visible rows of this keyframe only, so the leader always
/// spans the full width and the scale moves from frame to frame.
#[tracing::instrument(level = "trace", skip(keyframe), fields(entities = keyframe.data.len()))]
pub fn project_with(keyframe: &Keyframe, opts: &ProjectionOptions) -> Projection {
    let rows: Vec<RenderInstruction> = keyframe
        .data
        .iter()
        .take(opts.top_n)
        .enumerate()
        .map(|(rank, d)| RenderInstruction {
            name: d.name.clone(),
            rank,
            value: d.value,
            category: d.category.clone(),
        })
        .collect();

    // Math.max semantics: a NaN row poisons the domain.
    let domain_max = rows.iter().map(|r| r.value).fold(0.0_f64, |acc, v| {
        if acc.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            acc.max(v)
        }
    });

    Projection {
        value_scale: LinearScale::new([0.0, domain_max], [0.0, opts.x_max]),
        rank_scale: BandScale::new(
            rows.iter().map(|r| r.name.as_str()),
            [0.0, opts.y_max],
            opts.band_padding,
        ),
        rows,
    }
}
