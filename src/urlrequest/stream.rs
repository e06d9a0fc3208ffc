//! File-backed handles for streamed response bodies.

use crate::base::config::OutputStream;
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
enum Backing {
    /// Removed from disk when the handle drops.
    Temp(NamedTempFile),
    /// Caller-named file, kept on disk.
    Named { file: File, path: PathBuf },
}

/// A scoped file resource a response body is streamed into.
///
/// Dropping the handle closes the file; temporary files are also deleted.
#[derive(Debug)]
pub struct StreamHandle {
    backing: Backing,
}

impl StreamHandle {
    /// Open the target named by the `outputstream` setting. Returns `None`
    /// when streaming is disabled.
    pub fn open(target: &OutputStream, tmp_dir: Option<&Path>) -> Result<Option<Self>, NetError> {
        match target {
            OutputStream::Disabled => Ok(None),
            OutputStream::TempFile => Self::temp(tmp_dir).map(Some),
            OutputStream::Path(path) => Self::create(path).map(Some),
        }
    }

    pub fn temp(tmp_dir: Option<&Path>) -> Result<Self, NetError> {
        let dir = tmp_dir.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        let file = tempfile::Builder::new()
            .prefix("clientnet-")
            .tempfile_in(&dir)
            .stream_context(&dir)?;
        tracing::debug!(path = %file.path().display(), "opened temp stream");
        Ok(Self {
            backing: Backing::Temp(file),
        })
    }

    pub fn create(path: &Path) -> Result<Self, NetError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .stream_context(path)?;
        tracing::debug!(path = %path.display(), "opened output stream");
        Ok(Self {
            backing: Backing::Named {
                file,
                path: path.to_path_buf(),
            },
        })
    }

    pub fn path(&self) -> &Path {
        match &self.backing {
            Backing::Temp(f) => f.path(),
            Backing::Named { path, .. } => path,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.backing, Backing::Temp(_))
    }

    fn file(&self) -> &File {
        match &self.backing {
            Backing::Temp(f) => f.as_file(),
            Backing::Named { file, .. } => file,
        }
    }

    /// A second descriptor sharing this handle's cursor, for the transport
    /// to write into.
    pub fn writer(&self) -> Result<File, NetError> {
        self.file().try_clone().stream_context(self.path())
    }

    pub fn rewind(&mut self) -> Result<(), NetError> {
        let path = self.path().to_path_buf();
        self.seek(SeekFrom::Start(0)).stream_context(&path)?;
        Ok(())
    }

    /// Bytes written so far.
    pub fn len(&self) -> Result<u64, NetError> {
        self.file()
            .metadata()
            .map(|m| m.len())
            .stream_context(self.path())
    }

    pub fn is_empty(&self) -> Result<bool, NetError> {
        Ok(self.len()? == 0)
    }
}

impl Read for StreamHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self.file();
        file.read(buf)
    }
}

impl Write for StreamHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self.file();
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self.file();
        file.flush()
    }
}

impl Seek for StreamHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let mut file = self.file();
        file.seek(pos)
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if self.is_temporary() {
            tracing::debug!(path = %self.path().display(), "releasing temp stream");
        }
    }
}
