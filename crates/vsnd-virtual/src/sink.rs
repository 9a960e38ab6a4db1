use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use vsnd_core::{Error, Result};

/// File standing in for the output DMA channel.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Opens `path` for writing, creating it if missing and discarding any
    /// previous contents.
    pub fn open(path: &Path) -> Result<FileSink> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }

        let file = options.open(path).map_err(|e| Error::new_io(path, e))?;

        Ok(FileSink {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Issues a single write, which may accept fewer bytes than given.
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.file
            .write(buf)
            .map_err(|e| Error::new_io(&self.path, e))
    }
}
