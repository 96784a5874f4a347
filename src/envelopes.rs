pub const ADSR_RATE: f64 = 20.0;

/// Rectified sine swell, `|sin(20 t)|`. Peaks at 1, not normalized otherwise.
pub fn adsr(t: f64) -> f64 {
    (ADSR_RATE * t).sin().abs()
}

pub fn rectified_sine(rate: f64) -> impl FnMut(f64) -> f64 + Send + Clone {
    move |t| (rate * t).sin().abs()
}
