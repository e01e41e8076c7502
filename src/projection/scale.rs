use std::collections::HashMap;

/// Continuous linear map from `domain` onto `range`.
///
/// A degenerate domain (both ends equal) sends every input to the middle of the range.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f64 {
        let t = normalize(self.domain, value);
        self.range[0] + (self.range[1] - self.range[0]) * t
    }

    pub fn invert(&self, px: f64) -> f64 {
        let t = normalize(self.range, px);
        self.domain[0] + (self.domain[1] - self.domain[0]) * t
    }

    /// Roughly `count` evenly spaced round values covering the domain (1, 2 or 5 times a power
    /// of ten apart).
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        ticks(self.domain[0], self.domain[1], count as f64)
    }
}

fn normalize([a, b]: [f64; 2], x: f64) -> f64 {
    let span = b - a;
    if span == 0.0 {
        0.5
    } else if span.is_nan() {
        f64::NAN
    } else {
        (x - a) / span
    }
}

fn tick_spec(start: f64, stop: f64, count: f64) -> (f64, f64, f64) {
    let e10 = 50f64.sqrt();
    let e5 = 10f64.sqrt();
    let e2 = 2f64.sqrt();

    let step = (stop - start) / count.max(0.0);
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= e10 {
        10.0
    } else if error >= e5 {
        5.0
    } else if error >= e2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, inc);
    if power < 0.0 {
        let k = 10f64.powf(-power) / factor;
        i1 = (start * k).round();
        i2 = (stop * k).round();
        if i1 / k < start {
            i1 += 1.0;
        }
        if i2 / k > stop {
            i2 -= 1.0;
        }
        inc = -k;
    } else {
        let k = 10f64.powf(power) * factor;
        i1 = (start / k).round();
        i2 = (stop / k).round();
        if i1 * k < start {
            i1 += 1.0;
        }
        if i2 * k > stop {
            i2 -= 1.0;
        }
        inc = k;
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    (i1, i2, inc)
}

fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    if !(count > 0.0) || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }
    let reverse = stop < start;
    let (i1, i2, inc) = if reverse {
        tick_spec(stop, start, count)
    } else {
        tick_spec(start, stop, count)
    };
    if !(i2 >= i1) {
        return Vec::new();
    }

    let n = (i2 - i1) as usize + 1;
    let at = |i: usize| {
        let k = i1 + i as f64;
        if inc < 0.0 { k / -inc } else { k * inc }
    };
    if reverse {
        (0..n).map(|i| at(n - 1 - i)).collect()
    } else {
        (0..n).map(at).collect()
    }
}

/// Discrete map from names onto evenly spaced bands of `range`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct BandScale {
    pub domain: Vec<String>,
    pub range: [f64; 2],
    pub padding_inner: f64,
    pub padding_outer: f64,
    pub align: f64,
    step: f64,
    bandwidth: f64,
    offset: f64,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl BandScale {
    /// Equal inner and outer `padding`, centered bands.
    pub fn new<I, S>(domain: I, range: [f64; 2], padding: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = Vec::new();
        let mut index = HashMap::new();
        for name in domain {
            let name = name.into();
            if !index.contains_key(&name) {
                index.insert(name.clone(), names.len());
                names.push(name);
            }
        }

        let mut scale = Self {
            domain: names,
            range,
            padding_inner: padding.min(1.0),
            padding_outer: padding,
            align: 0.5,
            step: 0.0,
            bandwidth: 0.0,
            offset: 0.0,
            index,
        };
        scale.rescale();
        scale
    }

    fn rescale(&mut self) {
        let n = self.domain.len() as f64;
        let [r0, r1] = self.range;
        let reverse = r1 < r0;
        let (start, stop) = if reverse { (r1, r0) } else { (r0, r1) };

        let step = (stop - start) / 1f64.max(n - self.padding_inner + self.padding_outer * 2.0);
        let offset = start + (stop - start - step * (n - self.padding_inner)) * self.align;
        self.step = step;
        self.bandwidth = step * (1.0 - self.padding_inner);
        self.offset = offset;
        if reverse {
            // Bands run from the top of the range downward.
            self.offset = offset + step * (n - 1.0);
            self.step = -step;
        }
    }

    /// Start of the band for `name`, `None` when the name is not in the domain.
    pub fn apply(&self, name: &str) -> Option<f64> {
        let i = *self.index.get(name)?;
        Some(self.offset + self.step * i as f64)
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Distance between the starts of adjacent bands.
    pub fn step(&self) -> f64 {
        self.step.abs()
    }

    pub fn len(&self) -> usize {
        self.domain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domain.is_empty()
    }
}
