//! Response body storage.

use crate::base::neterror::NetError;
use crate::urlrequest::stream::StreamHandle;
use bytes::Bytes;
use std::io::Read;

/// A response body, buffered or streamed to a file.
#[derive(Debug)]
pub enum ResponseBody {
    /// Bytes as received (transfer/content codings not yet removed).
    Bytes(Bytes),
    /// Body already written to a file by the transport.
    Stream(StreamHandle),
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Bytes(Bytes::new())
    }
}

impl ResponseBody {
    pub fn is_stream(&self) -> bool {
        matches!(self, ResponseBody::Stream(_))
    }

    /// In-memory bytes; empty for streamed bodies.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ResponseBody::Bytes(b) => b,
            ResponseBody::Stream(_) => &[],
        }
    }

    /// Read the whole body, draining the stream from its start.
    pub fn read_all(&mut self) -> Result<Bytes, NetError> {
        match self {
            ResponseBody::Bytes(b) => Ok(b.clone()),
            ResponseBody::Stream(handle) => {
                handle.rewind()?;
                let mut out = Vec::new();
                handle
                    .read_to_end(&mut out)
                    .map_err(|e| NetError::StreamOpenFailed(e.to_string()))?;
                Ok(Bytes::from(out))
            }
        }
    }

    pub fn into_stream(self) -> Option<StreamHandle> {
        match self {
            ResponseBody::Stream(handle) => Some(handle),
            ResponseBody::Bytes(_) => None,
        }
    }
}
