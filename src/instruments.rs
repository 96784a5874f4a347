use crate::{BoxedModifier, Modifier};
use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

pub const ORGAN_FREQ: f64 = 400.0;
pub const CLARINET_FREQ: f64 = 229.0;
pub const KLANGFARBE_FREQ: f64 = 122.0;

const CLARINET_WEIGHTS: [f64; 8] = [1.0, 0.7, 0.5, 0.4, 0.3, 0.3, 0.2, 0.1];
// The fundamental appears twice.
const KLANGFARBE_HARMONICS: [f64; 8] = [1.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];

/// Fundamental plus octave. Peaks near 2, so it overflows 16-bit output unscaled.
pub fn organ(t: f64, f: f64) -> f64 {
    (TAU * 2.0 * f * t).sin() + (TAU * f * t).sin()
}

pub fn clarinet(t: f64, f: f64) -> f64 {
    let sum: f64 = CLARINET_WEIGHTS
        .iter()
        .enumerate()
        .map(|(i, w)| w * (TAU * (i + 1) as f64 * t * f).sin())
        .sum();
    0.4 * sum
}

/// Harmonic tone whose partial weights are redrawn on every sample.
///
/// The result is rough on purpose. Two calls with the same `t` generally
/// differ unless both instances were built with the same seed.
pub struct Klangfarbe {
    freq: f64,
    rng: fastrand::Rng,
}

impl Default for Klangfarbe {
    fn default() -> Self {
        Self::new(KLANGFARBE_FREQ)
    }
}

impl Klangfarbe {
    pub fn new(freq: f64) -> Self {
        Self::with_rng(freq, fastrand::Rng::new())
    }

    pub fn seeded(freq: f64, seed: u64) -> Self {
        Self::with_rng(freq, fastrand::Rng::with_seed(seed))
    }

    pub fn with_rng(freq: f64, rng: fastrand::Rng) -> Self {
        Self { freq, rng }
    }

    pub fn sample(&mut self, t: f64) -> f64 {
        let mut sum = 0.0;
        for h in KLANGFARBE_HARMONICS {
            sum += self.rng.f64() * (TAU * h * t * self.freq).sin();
        }
        0.2 * sum
    }
}

impl Modifier for Klangfarbe {
    fn apply(&mut self, t: f64) -> f64 {
        self.sample(t)
    }
}

/// Uniform noise in [-1, 1). Ignores the time value.
pub struct WhiteNoise {
    rng: fastrand::Rng,
}

impl Default for WhiteNoise {
    fn default() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }
}

impl WhiteNoise {
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    pub fn with_rng(rng: fastrand::Rng) -> Self {
        Self { rng }
    }

    pub fn sample(&mut self) -> f64 {
        2.0 * (self.rng.f64() - 0.5)
    }
}

impl Modifier for WhiteNoise {
    fn apply(&mut self, _t: f64) -> f64 {
        self.sample()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Instrument {
    Organ,
    #[default]
    Clarinet,
    Klangfarbe,
    WhiteNoise,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::Organ,
        Instrument::Clarinet,
        Instrument::Klangfarbe,
        Instrument::WhiteNoise,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Instrument::Organ => "organ",
            Instrument::Clarinet => "clarinet",
            Instrument::Klangfarbe => "klangfarbe",
            Instrument::WhiteNoise => "white-noise",
        }
    }

    /// `None` for instruments without a pitch.
    pub fn default_freq(self) -> Option<f64> {
        match self {
            Instrument::Organ => Some(ORGAN_FREQ),
            Instrument::Clarinet => Some(CLARINET_FREQ),
            Instrument::Klangfarbe => Some(KLANGFARBE_FREQ),
            Instrument::WhiteNoise => None,
        }
    }

    /// Builds the timbre as a modifier. `seed` only affects the stochastic
    /// instruments; without one they draw from an unseeded generator.
    pub fn voice(self, freq: Option<f64>, seed: Option<u64>) -> BoxedModifier {
        let freq = freq.or(self.default_freq()).unwrap_or_default();
        let rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        match self {
            Instrument::Organ => Box::new(move |t: f64| organ(t, freq)),
            Instrument::Clarinet => Box::new(move |t: f64| clarinet(t, freq)),
            Instrument::Klangfarbe => {
                let mut k = Klangfarbe::with_rng(freq, rng);
                Box::new(move |t: f64| k.sample(t))
            }
            Instrument::WhiteNoise => {
                let mut noise = WhiteNoise::with_rng(rng);
                Box::new(move |_: f64| noise.sample())
            }
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Instrument {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        Instrument::ALL
            .into_iter()
            .find(|i| i.name() == s || (*i == Instrument::WhiteNoise && s == "noise"))
            .ok_or_else(|| {
                let names: Vec<&str> = Instrument::ALL.iter().map(|i| i.name()).collect();
                format!("unknown instrument '{s}', expected one of {}", names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variance(values: &[f64]) -> f64 {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_silent_at_time_zero() {
        assert_eq!(organ(0.0, ORGAN_FREQ), 0.0);
        assert_eq!(clarinet(0.0, CLARINET_FREQ), 0.0);
        assert_eq!(Klangfarbe::default().sample(0.0), 0.0);
    }

    #[test]
    fn test_organ_quarter_period() {
        // sin(pi) + sin(pi / 2)
        let t = 0.25 / ORGAN_FREQ;
        assert!((organ(t, ORGAN_FREQ) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_clarinet_stays_in_range() {
        let peak = (0..44_100)
            .map(|n| clarinet(n as f64 / 44_100.0, CLARINET_FREQ).abs())
            .fold(0.0, f64::max);
        assert!(peak > 0.5);
        assert!(peak <= 0.4 * CLARINET_WEIGHTS.iter().sum::<f64>());
    }

    #[test]
    fn test_klangfarbe_varies_at_fixed_time() {
        let mut k = Klangfarbe::default();
        let t = 0.001;
        let values: Vec<f64> = (0..64).map(|_| k.sample(t)).collect();
        assert!(variance(&values) > 0.0);
    }

    #[test]
    fn test_klangfarbe_seed_is_reproducible() {
        let mut a = Klangfarbe::seeded(KLANGFARBE_FREQ, 2);
        let mut b = Klangfarbe::seeded(KLANGFARBE_FREQ, 2);
        for n in 0..1000 {
            let t = n as f64 / 44_100.0;
            assert_eq!(a.sample(t), b.sample(t));
        }
    }

    #[test]
    fn test_white_noise_range() {
        let mut noise = WhiteNoise::seeded(9);
        for _ in 0..10_000 {
            let v = noise.sample();
            assert!((-1.0..1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn test_voice_uses_default_freq() {
        let mut voice = Instrument::Clarinet.voice(None, None);
        let t = 0.0123;
        assert_eq!(voice(t), clarinet(t, CLARINET_FREQ));

        let mut voice = Instrument::Organ.voice(Some(220.0), None);
        assert_eq!(voice(t), organ(t, 220.0));
    }

    #[test]
    fn test_seeded_voice_matches_seeded_instrument() {
        let mut voice = Instrument::Klangfarbe.voice(None, Some(5));
        let mut k = Klangfarbe::seeded(KLANGFARBE_FREQ, 5);
        for n in 0..100 {
            let t = n as f64 / 1000.0;
            assert_eq!(voice(t), k.sample(t));
        }
    }

    #[test]
    fn test_parse_instrument() {
        assert_eq!("organ".parse::<Instrument>(), Ok(Instrument::Organ));
        assert_eq!("Clarinet".parse::<Instrument>(), Ok(Instrument::Clarinet));
        assert_eq!("noise".parse::<Instrument>(), Ok(Instrument::WhiteNoise));
        assert_eq!("white-noise".parse::<Instrument>(), Ok(Instrument::WhiteNoise));
        assert!("tuba".parse::<Instrument>().is_err());
        for i in Instrument::ALL {
            assert_eq!(i.to_string().parse::<Instrument>(), Ok(i));
        }
    }
}
