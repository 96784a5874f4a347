use crate::StreamSettings;
use anyhow::Context;
use assert_no_alloc::assert_no_alloc;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, Device, OutputCallbackInfo, SampleRate, Stream, StreamConfig, SupportedBufferSize,
};
use std::io::{BufRead, BufReader};
use std::sync::{Mutex, OnceLock, mpsc};
use std::thread;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Return,
    Interrupted,
}

pub struct AudioPlayer {
    device: Device,
    config: StreamConfig,
}

impl AudioPlayer {
    pub fn new(settings: &StreamSettings) -> anyhow::Result<Self> {
        let host = cpal::default_host();
        log::info!("cpal host: {}", host.id().name());
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no output device available"))?;
        match device.name() {
            Ok(name) => log::info!("output device: {name}"),
            Err(_) => log::info!("output device: (no name)"),
        }

        let supported = device
            .default_output_config()
            .context("querying default output config")?;
        let config = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(settings.sample_rate),
            buffer_size: choose_block_size(settings.block_size, supported.buffer_size()),
        };
        log::info!("sample rate: {}", config.sample_rate.0);
        log::info!("block size: {:?}", config.buffer_size);

        Ok(AudioPlayer { device, config })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Starts a stream that owns `source` and pulls one value per frame from
    /// it on the driver thread. Dropping the returned stream releases the device.
    pub fn open<I>(&self, mut source: I) -> anyhow::Result<Stream>
    where
        I: Iterator<Item = f64> + Send + 'static,
    {
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &OutputCallbackInfo| {
                    assert_no_alloc(|| fill_block(data, channels, &mut source));
                },
                |err| log::warn!("audio stream status: {err}"),
                None,
            )
            .context("opening output stream")?;

        stream.play()?;
        Ok(stream)
    }

    pub fn play_live<I>(&self, source: I) -> anyhow::Result<StopReason>
    where
        I: Iterator<Item = f64> + Send + 'static,
    {
        let stream = self.open(source)?;

        println!("{}", "#".repeat(80));
        println!("press Return to quit");
        println!("{}", "#".repeat(80));

        let reason = wait_for_stop();
        drop(stream);
        let reason = reason?;
        log::info!("playback stopped: {reason:?}");
        Ok(reason)
    }
}

pub fn play_live<I>(source: I, settings: &StreamSettings) -> anyhow::Result<StopReason>
where
    I: Iterator<Item = f64> + Send + 'static,
{
    let player = AudioPlayer::new(settings)?;
    player.play_live(source)
}

/// Writes one value per frame into `data`, copying it to every channel.
/// Frames left over after `source` runs dry are silenced. Returns the number
/// of values pulled.
pub fn fill_block<I>(data: &mut [f32], channels: usize, source: &mut I) -> usize
where
    I: Iterator<Item = f64>,
{
    let mut pulled = 0;

    for frame in data.chunks_mut(channels.max(1)) {
        let sample = match source.next() {
            Some(sample) => {
                pulled += 1;
                sample as f32
            }
            None => 0.0,
        };
        frame.fill(sample);
    }

    pulled
}

fn choose_block_size(requested: u32, supported: &SupportedBufferSize) -> BufferSize {
    match supported {
        SupportedBufferSize::Range { min, max } => {
            let frames = requested.clamp(*min, (*max).max(*min));
            if frames != requested {
                log::warn!(
                    "block size {requested} outside device range {min}..={max}, using {frames}"
                );
            }
            BufferSize::Fixed(frames)
        }
        SupportedBufferSize::Unknown => BufferSize::Fixed(requested),
    }
}

static INTERRUPT_HANDLER: OnceLock<Result<(), String>> = OnceLock::new();
static INTERRUPT_TARGET: Mutex<Option<mpsc::Sender<StopReason>>> = Mutex::new(None);

// Installed once per process. Outside of playback an interrupt exits the
// process as it would without a handler.
fn on_interrupt() {
    let target = INTERRUPT_TARGET.lock().ok().and_then(|target| target.clone());
    match target {
        Some(stop) => {
            let _ = stop.send(StopReason::Interrupted);
        }
        None => std::process::exit(130),
    }
}

/// Routes interrupts to `stop` until dropped.
struct InterruptRoute;

impl InterruptRoute {
    fn arm(stop: mpsc::Sender<StopReason>) -> anyhow::Result<Self> {
        INTERRUPT_HANDLER
            .get_or_init(|| ctrlc::set_handler(on_interrupt).map_err(|e| e.to_string()))
            .clone()
            .map_err(|e| anyhow::anyhow!("installing interrupt handler: {e}"))?;
        if let Ok(mut target) = INTERRUPT_TARGET.lock() {
            *target = Some(stop);
        }
        Ok(InterruptRoute)
    }
}

impl Drop for InterruptRoute {
    fn drop(&mut self) {
        if let Ok(mut target) = INTERRUPT_TARGET.lock() {
            *target = None;
        }
    }
}

fn wait_for_stop() -> anyhow::Result<StopReason> {
    wait_for_stop_on(BufReader::new(std::io::stdin()))
}

/// Blocks until a line (or EOF) arrives on `input` or the process is interrupted.
fn wait_for_stop_on<R>(mut input: R) -> anyhow::Result<StopReason>
where
    R: BufRead + Send + 'static,
{
    let (stop, stopped) = mpsc::channel();
    let _route = InterruptRoute::arm(stop.clone())?;

    thread::spawn(move || {
        let mut line = String::new();
        let _ = input.read_line(&mut line);
        let _ = stop.send(StopReason::Return);
    });

    stopped.recv().context("stop signal channel closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_BLOCK_SIZE, Signal, signal};

    #[test]
    fn test_fill_block_advances_cursor_by_block() {
        let mut signal = Signal::default();
        let mut data = vec![0.0f32; DEFAULT_BLOCK_SIZE as usize];

        let pulled = fill_block(&mut data, 1, &mut signal.by_ref().map(|t| t * 2.0));
        assert_eq!(pulled, 4410);
        assert_eq!(signal.position(), 4410);
        assert_eq!(data[0], 0.0);
        assert!((data[4409] - 0.19995465).abs() < 1e-6);

        fill_block(&mut data, 1, &mut signal.by_ref().map(|t| t * 2.0));
        assert_eq!(signal.position(), 8820);
        assert!((data[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_fill_block_copies_to_every_channel() {
        let mut source = signal(4).map(|t| t + 1.0);
        let mut data = vec![0.0f32; 6];

        let pulled = fill_block(&mut data, 2, &mut source);
        assert_eq!(pulled, 3);
        assert_eq!(data, vec![1.0, 1.0, 1.25, 1.25, 1.5, 1.5]);
    }

    #[test]
    fn test_fill_block_silences_after_source_ends() {
        let mut source = [0.5, -0.5].into_iter();
        let mut data = vec![9.0f32; 4];

        let pulled = fill_block(&mut data, 1, &mut source);
        assert_eq!(pulled, 2);
        assert_eq!(data, vec![0.5, -0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_choose_block_size() {
        let range = SupportedBufferSize::Range { min: 64, max: 8192 };
        assert_eq!(choose_block_size(4410, &range), BufferSize::Fixed(4410));

        let small = SupportedBufferSize::Range { min: 64, max: 2048 };
        assert_eq!(choose_block_size(4410, &small), BufferSize::Fixed(2048));

        assert_eq!(
            choose_block_size(4410, &SupportedBufferSize::Unknown),
            BufferSize::Fixed(4410)
        );
    }

    #[test]
    fn test_stop_wait_can_repeat() {
        assert_eq!(wait_for_stop_on(std::io::empty()).unwrap(), StopReason::Return);
        assert_eq!(wait_for_stop_on(std::io::empty()).unwrap(), StopReason::Return);
        assert!(INTERRUPT_TARGET.lock().unwrap().is_none());

        let (stop, stopped) = mpsc::channel();
        {
            let _route = InterruptRoute::arm(stop).unwrap();
            on_interrupt();
            assert_eq!(stopped.recv().unwrap(), StopReason::Interrupted);
        }
        assert!(INTERRUPT_TARGET.lock().unwrap().is_none());
    }
}
