use anyhow::Context;
use std::path::Path;

pub const PCM16_SCALE: f64 = 32767.0;

/// Scales an amplitude to 16-bit PCM, truncating toward zero.
///
/// Values outside [-1, 1] wrap around instead of clipping, so -1.0 becomes
/// -32767 and 1.5 becomes -16386. NaN becomes 0.
pub fn to_pcm16(sample: f64) -> i16 {
    (sample * PCM16_SCALE) as i64 as i16
}

/// Rounded, so a duration like 0.7 s is not cut short by float error.
pub fn sample_count(seconds: f64, sample_rate: usize) -> usize {
    (seconds * sample_rate as f64).round().max(0.0) as usize
}

/// Pulls `seconds * sample_rate` values from `source` into memory as PCM.
pub fn render(source: impl Iterator<Item = f64>, seconds: f64, sample_rate: usize) -> Vec<i16> {
    source
        .take(sample_count(seconds, sample_rate))
        .map(to_pcm16)
        .collect()
}

pub fn save_wav(
    source: impl Iterator<Item = f64>,
    filename: impl AsRef<Path>,
    seconds: f64,
    sample_rate: usize,
) -> anyhow::Result<()> {
    let filename = filename.as_ref();
    let waveform = render(source, seconds, sample_rate);
    log::info!(
        "writing {} samples ({seconds}s at {sample_rate} Hz) to {}",
        waveform.len(),
        filename.display()
    );
    write_pcm16(&waveform, filename, sample_rate)
}

pub fn write_pcm16(
    waveform: &[i16],
    filename: impl AsRef<Path>,
    sample_rate: usize,
) -> anyhow::Result<()> {
    let filename = filename.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate as u32,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(filename, spec)
        .with_context(|| format!("creating {}", filename.display()))?;
    for &sample in waveform {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}
