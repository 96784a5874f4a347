use crate::{BoxedModifier, Instrument, Modified, Signal, SignalExt, adsr, signal};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BLOCK_SIZE: u32 = 4410;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub stream: StreamSettings,
    pub voice: VoiceSettings,
    pub render: RenderSettings,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamSettings {
    pub sample_rate: u32,
    pub block_size: u32,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            sample_rate: crate::DEFAULT_SAMPLE_RATE as u32,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoiceSettings {
    pub instrument: Instrument,
    pub frequency: Option<f64>,
    pub envelope: bool,
    pub seed: Option<u64>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            instrument: Instrument::default(),
            frequency: None,
            envelope: true,
            seed: None,
        }
    }
}

impl VoiceSettings {
    pub fn modifier(&self) -> BoxedModifier {
        let mut voice = self.instrument.voice(self.frequency, self.seed);
        if self.envelope {
            Box::new(move |t: f64| adsr(t) * voice(t))
        } else {
            voice
        }
    }

    /// The time signal at `sample_rate`, mapped through this voice.
    pub fn source(&self, sample_rate: u32) -> Modified<Signal, BoxedModifier> {
        signal(sample_rate as usize).modify(self.modifier())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderSettings {
    pub output: PathBuf,
    pub seconds: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("out.wav"),
            seconds: 2.0,
        }
    }
}

pub fn parse_settings(content: &str) -> Result<Settings, toml::de::Error> {
    toml::from_str(content)
}

/// Reads settings from `path`. Falls back to defaults, with a warning, when the
/// file cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let Some(path) = path else {
        return Settings::default();
    };
    match std::fs::read_to_string(path) {
        Ok(content) => match parse_settings(&content) {
            Ok(settings) => {
                log::info!("loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Failed to parse {}: {}", path.display(), e);
                Settings::default()
            }
        },
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            Settings::default()
        }
    }
}
