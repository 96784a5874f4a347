use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use wavestream::*;

#[cfg(debug_assertions)]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

#[cfg(not(debug_assertions))]
#[global_allocator]
static A: rlsf::GlobalTlsf = rlsf::GlobalTlsf::new();

/// Play or render waveforms built from functions of time
#[derive(Parser)]
#[command(name = "wavestream")]
#[command(version)]
struct Cli {
    /// TOML settings file; command line flags take precedence
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Stream to the default output device until Return is pressed
    Play {
        #[command(flatten)]
        voice: VoiceArgs,
    },
    /// Write a mono 16-bit WAV file
    Render {
        #[command(flatten)]
        voice: VoiceArgs,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Duration in seconds
        #[arg(short, long)]
        seconds: Option<f64>,
    },
    /// Play, then render to the configured output (the default)
    Demo {
        #[command(flatten)]
        voice: VoiceArgs,
    },
}

#[derive(Args, Default)]
struct VoiceArgs {
    /// organ, clarinet, klangfarbe or white-noise
    #[arg(short, long)]
    instrument: Option<Instrument>,

    /// Fundamental frequency in Hz
    #[arg(short, long)]
    frequency: Option<f64>,

    /// Skip the rectified sine envelope
    #[arg(long)]
    no_envelope: bool,

    /// Seed for the stochastic instruments
    #[arg(long)]
    seed: Option<u64>,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Frames per audio callback
    #[arg(long)]
    block_size: Option<u32>,
}

impl VoiceArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(instrument) = self.instrument {
            settings.voice.instrument = instrument;
        }
        if let Some(frequency) = self.frequency {
            settings.voice.frequency = Some(frequency);
        }
        if self.no_envelope {
            settings.voice.envelope = false;
        }
        if let Some(seed) = self.seed {
            settings.voice.seed = Some(seed);
        }
        if let Some(sample_rate) = self.sample_rate {
            settings.stream.sample_rate = sample_rate;
        }
        if let Some(block_size) = self.block_size {
            settings.stream.block_size = block_size;
        }
    }
}

fn run_play(settings: &Settings) -> Result<StopReason> {
    let source = settings.voice.source(settings.stream.sample_rate);
    play_live(source, &settings.stream)
}

fn run_render(settings: &Settings) -> Result<()> {
    let source = settings.voice.source(settings.stream.sample_rate);
    save_wav(
        source,
        &settings.render.output,
        settings.render.seconds,
        settings.stream.sample_rate as usize,
    )?;
    println!("Saved to {}", settings.render.output.display());
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref());

    match cli.command.unwrap_or(Command::Demo {
        voice: VoiceArgs::default(),
    }) {
        Command::Play { voice } => {
            voice.apply(&mut settings);
            run_play(&settings)?;
        }
        Command::Render {
            voice,
            output,
            seconds,
        } => {
            voice.apply(&mut settings);
            if let Some(output) = output {
                settings.render.output = output;
            }
            if let Some(seconds) = seconds {
                settings.render.seconds = seconds;
            }
            run_render(&settings)?;
        }
        Command::Demo { voice } => {
            voice.apply(&mut settings);
            if run_play(&settings)? == StopReason::Interrupted {
                return Ok(());
            }
            run_render(&settings)?;
        }
    }

    Ok(())
}
