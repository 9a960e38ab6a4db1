use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("unsupported operation")]
    Unsupported,

    #[error("failed to allocate {size} bytes")]
    ResourceExhausted { size: usize },

    #[error("failed to spawn thread")]
    ThreadSpawn(#[source] io::Error),

    #[error("io error: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("device is not started")]
    NotStarted,
    #[error("device is already started")]
    AlreadyStarted,
    #[error("device already registered: {name}")]
    DuplicateDevice { name: String },
}

impl Error {
    #[cold]
    pub fn new_io<P: AsRef<Path>>(path: P, source: io::Error) -> Error {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::Unsupported)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
