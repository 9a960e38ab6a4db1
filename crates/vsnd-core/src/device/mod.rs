
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::driver::AudioOps;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn is_writable(self) -> bool {
        matches!(self, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }

    pub fn is_readable(self) -> bool {
        matches!(self, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }
}

/// Notifies the framework that the device consumed one transmit block.
#[derive(Clone, Default)]
pub struct TxComplete {
    inner: Arc<TxCompleteInner>,
}

#[derive(Default)]
struct TxCompleteInner {
    count: AtomicU64,
    callback: Option<Box<dyn Fn() + Send + Sync>>,
}

impl TxComplete {
    pub fn new() -> TxComplete {
        TxComplete::default()
    }

    pub fn with_callback(callback: impl Fn() + Send + Sync + 'static) -> TxComplete {
        TxComplete {
            inner: Arc::new(TxCompleteInner {
                count: AtomicU64::new(0),
                callback: Some(Box::new(callback)),
            }),
        }
    }

    pub fn signal(&self) {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        if let Some(callback) = &self.inner.callback {
            callback();
        }
    }

    pub fn count(&self) -> u64 {
        self.inner.count.load(Ordering::Acquire)
    }
}

impl fmt::Debug for TxComplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxComplete")
            .field("count", &self.count())
            .field("callback", &self.inner.callback.is_some())
            .finish()
    }
}

#[derive(Clone)]
pub struct AudioDevice {
    name: Arc<str>,
    mode: AccessMode,
    ops: Arc<dyn AudioOps>,
}

impl AudioDevice {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn ops(&self) -> &dyn AudioOps {
        &*self.ops
    }
}

impl fmt::Debug for AudioDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioDevice")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// Table of registered audio devices, keyed by name.
#[derive(Default)]
pub struct Registry {
    devices: DashMap<Arc<str>, AudioDevice>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    pub fn register(&self, name: &str, mode: AccessMode, ops: Arc<dyn AudioOps>) -> Result<()> {
        let name: Arc<str> = Arc::from(name);

        match self.devices.entry(name.clone()) {
            Entry::Occupied(_) => Err(Error::DuplicateDevice {
                name: name.to_string(),
            }),
            Entry::Vacant(entry) => {
                tracing::debug!(%name, ?mode, "registered audio device");
                entry.insert(AudioDevice { name, mode, ops });
                Ok(())
            }
        }
    }

    pub fn unregister(&self, name: &str) -> Option<AudioDevice> {
        self.devices.remove(name).map(|(_, device)| device)
    }

    pub fn find(&self, name: &str) -> Option<AudioDevice> {
        self.devices.get(name).map(|device| device.clone())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
