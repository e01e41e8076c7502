use crate::foundation::core::Timestamp;

pub trait Lerp: Sized {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }
}

impl Lerp for Timestamp {
    // NaN endpoints stay NaN.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Timestamp::from_millis(f64::lerp(&a.as_millis(), &b.as_millis(), t))
    }
}
