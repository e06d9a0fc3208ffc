//! Request body for POST/PUT operations.

use crate::base::neterror::NetError;
use bytes::Bytes;
use std::fs::File;
use std::io::{self, Seek, SeekFrom, Write};
use std::sync::Arc;

/// Request body for HTTP methods that send data.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body (GET, HEAD, TRACE).
    #[default]
    Empty,
    /// Body with raw bytes.
    Bytes(Bytes),
    /// Body streamed from an open file, sent from its start.
    File(Arc<File>),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl From<File> for RequestBody {
    fn from(f: File) -> Self {
        RequestBody::File(Arc::new(f))
    }
}

impl RequestBody {
    /// True for [`RequestBody::Empty`] and zero-length byte bodies.
    pub fn is_empty(&self) -> bool {
        match self {
            RequestBody::Empty => true,
            RequestBody::Bytes(b) => b.is_empty(),
            RequestBody::File(_) => false,
        }
    }

    pub fn is_stream(&self) -> bool {
        matches!(self, RequestBody::File(_))
    }

    /// Body size; file bodies report their metadata length.
    pub fn content_length(&self) -> Result<u64, NetError> {
        match self {
            RequestBody::Empty => Ok(0),
            RequestBody::Bytes(b) => Ok(b.len() as u64),
            RequestBody::File(f) => f
                .metadata()
                .map(|m| m.len())
                .map_err(|e| NetError::FileUnreadable(e.to_string())),
        }
    }

    /// In-memory bytes, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RequestBody::Bytes(b) => Some(b),
            RequestBody::Empty => Some(&[]),
            RequestBody::File(_) => None,
        }
    }

    /// Write the body to `out`, rewinding file bodies first.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<u64> {
        match self {
            RequestBody::Empty => Ok(0),
            RequestBody::Bytes(b) => {
                out.write_all(b)?;
                Ok(b.len() as u64)
            }
            RequestBody::File(f) => {
                let mut file: &File = f;
                file.seek(SeekFrom::Start(0))?;
                io::copy(&mut file, out)
            }
        }
    }
}
