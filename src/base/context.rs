//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO errors into context-rich `NetError` variants.

use crate::base::neterror::NetError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use clientnet::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr)
    ///     .connection_context("example.com", 443)?;
    /// // Error: "Connection failed: example.com:443: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError>;

    /// Map a failed request write.
    fn write_context(self) -> Result<T, NetError>;

    /// Map a failure to open or prepare a streaming file.
    fn stream_context(self, path: &Path) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, NetError> {
        self.map_err(|e| match NetError::from_io(&e) {
            NetError::ConnectionFailed(_) => {
                NetError::ConnectionFailed(format!("{}:{}: {}", host, port, e))
            }
            other => other,
        })
    }

    fn write_context(self) -> Result<T, NetError> {
        self.map_err(|e| NetError::WriteFailed(e.to_string()))
    }

    fn stream_context(self, path: &Path) -> Result<T, NetError> {
        self.map_err(|_| NetError::StreamOpenFailed(path.display().to_string()))
    }
}
