use std::thread;
use std::time::{Duration, Instant};

use vsnd_core::caps::{AudioConfig, CapsQuery, CapsValue, Configure, DspParam, MixerParam};
use vsnd_core::device::{Registry, TxComplete};
use vsnd_core::driver::StreamKind;
use vsnd_virtual::{VirtualSoundDesc, DEVICE_NAME};

#[derive(Clone, Copy)]
struct Saw {
    freq: f32,
    time: f32,
}

impl Saw {
    /// Only 16-bit PCM with at least one channel is generated.
    fn supports(config: &AudioConfig) -> bool {
        config.sample_bits == 16 && config.channels > 0
    }

    fn fill(&mut self, config: &AudioConfig, block: &mut [u8]) {
        let frame_size = config.bytes_per_frame() as usize;

        for frame in block.chunks_exact_mut(frame_size) {
            let x = self.time / (config.sample_rate as f32) * self.freq;
            let y = 2.0 * (x - (0.5 + x).floor());
            let sample = ((y * 0.5) * i16::MAX as f32) as i16;

            for channel in frame.chunks_exact_mut(2) {
                channel.copy_from_slice(&sample.to_le_bytes());
            }

            self.time += 1.0;
        }
    }
}

fn main() -> vsnd_virtual::Result<()> {
    tracing_subscriber::fmt::init();

    let main_thread = thread::current();
    let registry = Registry::new();

    vsnd_virtual::register(
        &registry,
        VirtualSoundDesc {
            on_complete: TxComplete::with_callback(move || main_thread.unpark()),
            ..Default::default()
        },
    )?;

    let Some(device) = registry.find(DEVICE_NAME) else {
        tracing::error!("{DEVICE_NAME} is not registered");
        return Ok(());
    };
    let ops = device.ops();

    ops.init()?;
    ops.configure(Configure::volume(80))?;
    ops.configure(Configure::Output {
        param: DspParam::SampleRate,
        config: AudioConfig::new(48000, 2, 16),
    })?;

    let config = match ops.get_caps(CapsQuery::Output(DspParam::Param))? {
        CapsValue::Config(config) => config,
        other => {
            tracing::error!(?other, "{DEVICE_NAME} did not report its output format");
            return Ok(());
        }
    };

    if !Saw::supports(&config) {
        tracing::error!(?config, "unsupported output format");
        return Ok(());
    }

    let volume = ops.get_caps(CapsQuery::Mixer(MixerParam::Volume))?;
    tracing::info!(?config, ?volume, "negotiated");

    let block_size = ops.buffer_info().block_size;
    let mut block = vec![0; block_size];
    let mut saw = Saw {
        freq: 440.0,
        time: 0.0,
    };

    ops.start(StreamKind::Replay)?;

    let deadline = Instant::now() + Duration::from_secs(2);
    let mut written = 0;

    while Instant::now() < deadline {
        saw.fill(&config, &mut block);
        written += ops.transmit(&block)?;
        thread::park_timeout(Duration::from_millis(50));
    }

    ops.stop(StreamKind::Replay)?;

    tracing::info!(written, "done");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saw_fills_16_bit_frames() {
        let config = AudioConfig::new(48000, 2, 16);
        assert!(Saw::supports(&config));

        let mut saw = Saw {
            freq: 440.0,
            time: 0.0,
        };
        let mut block = vec![0xff; 64];
        saw.fill(&config, &mut block);

        assert_eq!(saw.time, 16.0);
        assert_eq!(&block[..4], &[0, 0, 0, 0]);
        for frame in block.chunks_exact(4) {
            assert_eq!(frame[..2], frame[2..]);
        }
    }

    #[test]
    fn saw_rejects_other_formats() {
        assert!(!Saw::supports(&AudioConfig::new(48000, 2, 8)));
        assert!(!Saw::supports(&AudioConfig::new(48000, 2, 24)));
        assert!(!Saw::supports(&AudioConfig::new(48000, 0, 16)));
    }
}
