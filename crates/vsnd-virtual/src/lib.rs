//! Virtual sound output device.
//!
//! Implements [`AudioOps`] without hardware: transmitted audio is written to a
//! file and a background thread signals block completion at the rate real
//! hardware would drain the transmit buffer.

mod internal;
mod sink;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use vsnd_core::caps::{
    AudioConfig, BufInfo, CapsQuery, CapsType, CapsValue, Configure, DspParam, MixerMask,
    MixerParam, TypeMask,
};
use vsnd_core::device::{AccessMode, Registry, TxComplete};
use vsnd_core::driver::{AudioOps, StreamKind};
pub use vsnd_core::{Error, Result};

use crate::internal::Session;
pub use crate::sink::FileSink;

pub const DEVICE_NAME: &str = "sound0";
pub const DEFAULT_SINK_PATH: &str = "/tmp/virtual.pcm";
pub const DEFAULT_VOLUME: i32 = 60;

pub const TX_FIFO_SIZE: usize = 2048;
pub const BLOCK_COUNT: usize = 2;
pub const BLOCK_SIZE: usize = TX_FIFO_SIZE / BLOCK_COUNT;

/// Tick used when the negotiated format cannot pace the completion thread.
pub const FALLBACK_TICK: Duration = Duration::from_millis(6);
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct VirtualSoundDesc {
    pub sink_path: PathBuf,
    /// Fixed completion period. `None` derives it from the replay format.
    pub tick: Option<Duration>,
    pub stop_timeout: Duration,
    pub on_complete: TxComplete,
}

impl Default for VirtualSoundDesc {
    fn default() -> VirtualSoundDesc {
        VirtualSoundDesc {
            sink_path: PathBuf::from(DEFAULT_SINK_PATH),
            tick: None,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
            on_complete: TxComplete::new(),
        }
    }
}

/// Creates a virtual sound device and registers it as [`DEVICE_NAME`].
pub fn register(registry: &Registry, desc: VirtualSoundDesc) -> Result<Arc<VirtualSound>> {
    let sound = Arc::new(VirtualSound::new(desc)?);
    registry.register(DEVICE_NAME, AccessMode::WriteOnly, sound.clone())?;
    Ok(sound)
}

pub struct VirtualSound {
    sink_path: PathBuf,
    tick: Option<Duration>,
    stop_timeout: Duration,
    on_complete: TxComplete,
    tx_fifo: Box<[u8]>,
    state: Mutex<State>,
    // Locked after `state` when both are needed.
    sink: Mutex<Option<FileSink>>,
}

struct State {
    replay_config: AudioConfig,
    volume: i32,
    session: Option<Session>,
}

impl VirtualSound {
    pub fn new(desc: VirtualSoundDesc) -> Result<VirtualSound> {
        let VirtualSoundDesc {
            sink_path,
            tick,
            stop_timeout,
            on_complete,
        } = desc;

        let tx_fifo = alloc_fifo(TX_FIFO_SIZE)?;

        Ok(VirtualSound {
            sink_path,
            tick,
            stop_timeout,
            on_complete,
            tx_fifo,
            state: Mutex::new(State {
                replay_config: AudioConfig::default(),
                volume: DEFAULT_VOLUME,
                session: None,
            }),
            sink: Mutex::new(None),
        })
    }

    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    pub fn is_playing(&self) -> bool {
        self.state().session.is_some()
    }

    pub fn replay_config(&self) -> AudioConfig {
        self.state().replay_config
    }

    pub fn volume(&self) -> i32 {
        self.state().volume
    }

    pub fn completions(&self) -> &TxComplete {
        &self.on_complete
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sink(&self) -> MutexGuard<'_, Option<FileSink>> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session_tick(&self, config: &AudioConfig) -> Duration {
        self.tick
            .or_else(|| config.block_duration(BLOCK_SIZE))
            .filter(|tick| !tick.is_zero())
            .unwrap_or(FALLBACK_TICK)
    }
}

impl AudioOps for VirtualSound {
    fn get_caps(&self, query: CapsQuery) -> Result<CapsValue> {
        let state = self.state();

        match query {
            CapsQuery::Query(CapsType::Query) => {
                Ok(CapsValue::Types(TypeMask::OUTPUT | TypeMask::MIXER))
            }
            CapsQuery::Output(DspParam::Param) => Ok(CapsValue::Config(state.replay_config)),
            CapsQuery::Mixer(MixerParam::Query) => {
                Ok(CapsValue::Mixer(MixerMask::VOLUME | MixerMask::LINE))
            }
            CapsQuery::Mixer(MixerParam::Volume) => Ok(CapsValue::Value(state.volume)),
            CapsQuery::Mixer(MixerParam::Line) => Ok(CapsValue::Empty),
            _ => Err(Error::Unsupported),
        }
    }

    fn configure(&self, request: Configure) -> Result<()> {
        let mut state = self.state();

        match request {
            Configure::Mixer { param, value } => match param {
                MixerParam::Volume => {
                    state.volume = value;
                    Ok(())
                }
                _ => Err(Error::Unsupported),
            },
            // Output parameters the device cannot change are accepted and
            // ignored; only the mixer rejects unknown controls.
            Configure::Output { param, config } => {
                match param {
                    DspParam::Param | DspParam::SampleRate => {
                        state.replay_config.sample_rate = config.sample_rate;
                        tracing::info!(sample_rate = config.sample_rate, "set sample rate");
                    }
                    DspParam::Channels | DspParam::SampleBits => {}
                }
                Ok(())
            }
            Configure::Input { .. } | Configure::Query(_) => Ok(()),
        }
    }

    fn init(&self) -> Result<()> {
        tracing::info!("sound init");
        Ok(())
    }

    fn start(&self, stream: StreamKind) -> Result<()> {
        if stream != StreamKind::Replay {
            return Err(Error::Unsupported);
        }

        let mut state = self.state();
        if state.session.is_some() {
            return Err(Error::AlreadyStarted);
        }

        tracing::info!(path = %self.sink_path.display(), "sound start");

        let sink = FileSink::open(&self.sink_path)?;
        let tick = self.session_tick(&state.replay_config);

        let session = match Session::spawn(tick, self.on_complete.clone()) {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(?e, "virtual play thread init failed");
                return Err(e);
            }
        };

        *self.sink() = Some(sink);
        state.session = Some(session);

        Ok(())
    }

    fn stop(&self, stream: StreamKind) -> Result<()> {
        if stream != StreamKind::Replay {
            return Ok(());
        }

        let (session, sink) = {
            let mut state = self.state();
            (state.session.take(), self.sink().take())
        };

        let Some(session) = session else {
            return Ok(());
        };

        tracing::info!("sound stop");

        drop(sink);
        session.terminate(self.stop_timeout);

        Ok(())
    }

    fn transmit(&self, buf: &[u8]) -> Result<usize> {
        let mut sink = self.sink();
        let sink = sink.as_mut().ok_or(Error::NotStarted)?;
        sink.write(buf)
    }

    fn buffer_info(&self) -> BufInfo<'_> {
        BufInfo {
            buffer: &self.tx_fifo,
            total_size: TX_FIFO_SIZE,
            block_size: BLOCK_SIZE,
            block_count: BLOCK_COUNT,
        }
    }
}

impl Drop for VirtualSound {
    fn drop(&mut self) {
        let _ = self.stop(StreamKind::Replay);
    }
}

fn alloc_fifo(size: usize) -> Result<Box<[u8]>> {
    let mut fifo = Vec::new();
    fifo.try_reserve_exact(size).map_err(|_| Error::ResourceExhausted { size })?;
    fifo.resize(size, 0);
    Ok(fifo.into_boxed_slice())
}
