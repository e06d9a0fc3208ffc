use thiserror::Error;

/// Broad classes of failure surfaced by the client.
///
/// Every [`NetError`] belongs to exactly one class; callers that only care
/// about "bad input" versus "the network failed" can match on this instead
/// of the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied something malformed (URI, cookie, credentials).
    InvalidInput,
    /// The request is well-formed but cannot be carried out by this
    /// client/transport combination.
    UnsupportedOperation,
    /// Connecting, writing, reading or buffering the exchange failed.
    TransportFailure,
    /// A protocol bound was exceeded (redirect limit).
    ProtocolLimit,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum NetError {
    // Connection Errors
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Failed to write request: {0}")]
    WriteFailed(String),
    #[error("Could not open stream file {0}")]
    StreamOpenFailed(String),

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Too many redirects")]
    TooManyRedirects,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Invalid chunked encoding")]
    InvalidChunkedEncoding,
    #[error("Method not supported")]
    MethodNotSupported,
    #[error("Unable to read response, or response is empty")]
    EmptyResponse,
    #[error("Content decoding failed")]
    ContentDecodingFailed,
    #[error("Invalid auth credentials: {0}")]
    InvalidAuthCredentials(String),
    #[error("Unsupported auth scheme: {0}")]
    UnsupportedAuthScheme(String),
    #[error("Invalid header")]
    InvalidHeader,
    #[error("Invalid UTF-8 in response body")]
    InvalidUtf8,
    #[error("JSON error")]
    JsonParseError,

    // Client Errors
    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),
    #[error("Invalid or not supported digest authentication parameter: {0}")]
    InvalidDigestParameter(String),
    #[error("Invalid digest challenge: {0}")]
    InvalidDigestChallenge(String),
    #[error("Digest authentication requires a transport with raw auth support")]
    DigestAuthUnsupported,
    #[error("Cannot handle content type '{0}' automatically")]
    CannotEncodeContentType(String),
    #[error("Transport does not support streaming")]
    StreamingUnsupported,
    #[error("Unable to read file '{0}' for upload")]
    FileUnreadable(String),
    #[error("Invalid configuration value for '{0}'")]
    InvalidConfig(String),

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::ConnectionClosed => -100,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionFailed(_) => -104,
            NetError::NameNotResolved => -105,
            NetError::SslProtocolError => -107,
            NetError::ConnectionTimedOut => -118,

            NetError::InvalidUrl => -300,
            NetError::TooManyRedirects => -310,
            NetError::InvalidResponse => -320,
            NetError::InvalidChunkedEncoding => -321,
            NetError::MethodNotSupported => -322,
            NetError::EmptyResponse => -324,
            NetError::ContentDecodingFailed => -330,
            NetError::InvalidAuthCredentials(_) => -338,
            NetError::UnsupportedAuthScheme(_) => -339,

            // Custom errors (outside Chromium's ranges)
            NetError::WriteFailed(_) => -10001,
            NetError::StreamOpenFailed(_) => -10002,
            NetError::InvalidHeader => -10003,
            NetError::InvalidUtf8 => -10004,
            NetError::JsonParseError => -10005,
            NetError::InvalidCookie(_) => -10010,
            NetError::InvalidDigestParameter(_) => -10011,
            NetError::InvalidDigestChallenge(_) => -10012,
            NetError::DigestAuthUnsupported => -10013,
            NetError::CannotEncodeContentType(_) => -10014,
            NetError::StreamingUnsupported => -10015,
            NetError::FileUnreadable(_) => -10016,
            NetError::InvalidConfig(_) => -10017,

            NetError::Unknown(code) => *code,
        }
    }

    /// The failure class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            NetError::InvalidUrl
            | NetError::InvalidHeader
            | NetError::InvalidCookie(_)
            | NetError::InvalidAuthCredentials(_)
            | NetError::UnsupportedAuthScheme(_)
            | NetError::InvalidDigestParameter(_)
            | NetError::InvalidDigestChallenge(_)
            | NetError::FileUnreadable(_)
            | NetError::InvalidConfig(_) => ErrorKind::InvalidInput,

            NetError::DigestAuthUnsupported
            | NetError::CannotEncodeContentType(_)
            | NetError::StreamingUnsupported
            | NetError::MethodNotSupported => ErrorKind::UnsupportedOperation,

            NetError::TooManyRedirects => ErrorKind::ProtocolLimit,

            NetError::ConnectionClosed
            | NetError::ConnectionRefused
            | NetError::ConnectionFailed(_)
            | NetError::NameNotResolved
            | NetError::SslProtocolError
            | NetError::ConnectionTimedOut
            | NetError::WriteFailed(_)
            | NetError::StreamOpenFailed(_)
            | NetError::InvalidResponse
            | NetError::InvalidChunkedEncoding
            | NetError::EmptyResponse
            | NetError::ContentDecodingFailed
            | NetError::InvalidUtf8
            | NetError::JsonParseError
            | NetError::Unknown(_) => ErrorKind::TransportFailure,
        }
    }

    /// Map an I/O error raised while talking to a peer.
    pub fn from_io(err: &std::io::Error) -> Self {
        use std::io::ErrorKind as Io;
        match err.kind() {
            Io::ConnectionRefused => NetError::ConnectionRefused,
            Io::TimedOut | Io::WouldBlock => NetError::ConnectionTimedOut,
            Io::ConnectionReset | Io::ConnectionAborted | Io::BrokenPipe | Io::UnexpectedEof => {
                NetError::ConnectionClosed
            }
            _ => NetError::ConnectionFailed(err.to_string()),
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -100 => NetError::ConnectionClosed,
            -102 => NetError::ConnectionRefused,
            -104 => NetError::ConnectionFailed(String::new()),
            -105 => NetError::NameNotResolved,
            -107 => NetError::SslProtocolError,
            -118 => NetError::ConnectionTimedOut,
            -300 => NetError::InvalidUrl,
            -310 => NetError::TooManyRedirects,
            -320 => NetError::InvalidResponse,
            -321 => NetError::InvalidChunkedEncoding,
            -322 => NetError::MethodNotSupported,
            -324 => NetError::EmptyResponse,
            -330 => NetError::ContentDecodingFailed,
            -10003 => NetError::InvalidHeader,
            -10004 => NetError::InvalidUtf8,
            -10005 => NetError::JsonParseError,
            -10013 => NetError::DigestAuthUnsupported,
            -10015 => NetError::StreamingUnsupported,
            _ => NetError::Unknown(code),
        }
    }
}
