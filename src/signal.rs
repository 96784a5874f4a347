pub const DEFAULT_SAMPLE_RATE: usize = 44_100;

/// Endless, forward-only sequence of sample times in seconds.
///
/// The n-th value is `n / sample_rate`. Only values that are pulled get
/// computed, so wrapping a `Signal` in adapters never buffers anything.
#[derive(Clone, Debug)]
pub struct Signal {
    sample_rate: usize,
    position: usize,
}

pub fn signal(sample_rate: usize) -> Signal {
    Signal::new(sample_rate)
}

impl Default for Signal {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl Signal {
    pub fn new(sample_rate: usize) -> Self {
        Signal {
            sample_rate,
            position: 0,
        }
    }

    pub fn sample_rate(&self) -> usize {
        self.sample_rate
    }

    /// Number of time values produced so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn time(&self) -> f64 {
        self.position as f64 / self.sample_rate as f64
    }

    pub fn advance(&mut self) {
        self.position += 1;
    }
}

impl Iterator for Signal {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let t = self.time();
        self.advance();
        Some(t)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}
