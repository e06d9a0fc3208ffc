//! Content-type detection for file uploads.
//!
//! The client owns a [`LazySniffer`]: the sniffer is built by its factory on
//! first use and reused afterwards. Tests can inject their own factory.

use once_cell::unsync::OnceCell;
use std::fmt;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Guesses a MIME type from a file name and its leading bytes.
pub trait MimeSniffer: Send {
    fn sniff(&self, file_name: &str, data: &[u8]) -> String;
}

/// Magic-byte detection, then file extension, then
/// `application/octet-stream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionSniffer;

const MAGIC: &[(&[u8], &str)] = &[
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"%PDF-", "application/pdf"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b", "application/gzip"),
];

impl MimeSniffer for ExtensionSniffer {
    fn sniff(&self, file_name: &str, data: &[u8]) -> String {
        if let Some((_, mime)) = MAGIC.iter().find(|(magic, _)| data.starts_with(magic)) {
            return mime.to_string();
        }
        mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string()
    }
}

type SnifferFactory = Box<dyn Fn() -> Box<dyn MimeSniffer> + Send>;

/// Memoized sniffer, constructed on first use.
pub struct LazySniffer {
    cell: OnceCell<Box<dyn MimeSniffer>>,
    factory: SnifferFactory,
}

impl LazySniffer {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn MimeSniffer> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            factory: Box::new(factory),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> &dyn MimeSniffer {
        self.cell.get_or_init(|| (self.factory)()).as_ref()
    }

    pub fn sniff(&self, file_name: &str, data: &[u8]) -> String {
        self.get().sniff(file_name, data)
    }
}

impl Default for LazySniffer {
    fn default() -> Self {
        Self::new(|| Box::new(ExtensionSniffer))
    }
}

impl fmt::Debug for LazySniffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySniffer")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
