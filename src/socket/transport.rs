//! The byte-level exchange behind the client.
//!
//! A [`Transport`] connects to a host, writes one serialized request and
//! reads back the raw response. The client drives it synchronously, one
//! round-trip at a time.

use crate::base::config::{Config, HttpVersion};
use crate::base::neterror::NetError;
use crate::http::httpauth::AuthCredential;
use crate::http::orderedheaders::{title_case, OrderedHeaderMap};
use crate::http::requestbody::RequestBody;
use bytes::Bytes;
use http::Method;
use std::fs::File;
use url::{Position, Url};

/// Optional features a transport advertises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Can write response bodies into an output stream.
    pub streaming: bool,
    /// Accepts raw credentials and answers auth challenges itself.
    pub raw_auth: bool,
}

pub trait Transport: Send {
    /// Receive a config snapshot. Called on bind and after every change.
    fn configure(&mut self, config: Config);

    fn connect(&mut self, host: &str, port: u16, secure: bool) -> Result<(), NetError>;

    /// Send the request; returns the bytes written.
    fn write(
        &mut self,
        method: &Method,
        url: &Url,
        version: HttpVersion,
        headers: &OrderedHeaderMap,
        body: &RequestBody,
    ) -> Result<Bytes, NetError>;

    /// Raw response. When an output stream is set, only the status line
    /// and headers are returned and the body goes to the stream.
    fn read(&mut self) -> Result<Bytes, NetError>;

    fn set_output_stream(&mut self, _stream: Option<File>) -> Result<(), NetError> {
        Err(NetError::StreamingUnsupported)
    }

    fn set_raw_auth(&mut self, _credential: Option<AuthCredential>) -> Result<(), NetError> {
        Err(NetError::DigestAuthUnsupported)
    }

    fn close(&mut self);

    fn capabilities(&self) -> Capabilities;
}

/// `/path?query` as written on the request line.
pub fn request_target(url: &Url) -> &str {
    &url[Position::BeforePath..Position::AfterQuery]
}

/// Serialize the request line and headers, ending with the blank line.
pub fn format_head(
    method: &Method,
    url: &Url,
    version: HttpVersion,
    headers: &OrderedHeaderMap,
) -> String {
    let mut head = format!("{} {} HTTP/{}\r\n", method, request_target(url), version);
    for (name, value) in headers.iter() {
        head.push_str(&title_case(name.as_str()));
        head.push_str(": ");
        head.push_str(&String::from_utf8_lossy(value.as_bytes()));
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    head
}

/// Full request bytes: head followed by the body.
pub fn format_request(
    method: &Method,
    url: &Url,
    version: HttpVersion,
    headers: &OrderedHeaderMap,
    body: &RequestBody,
) -> Result<Bytes, NetError> {
    let mut out = format_head(method, url, version, headers).into_bytes();
    body.write_to(&mut out)
        .map_err(|e| NetError::FileUnreadable(e.to_string()))?;
    Ok(Bytes::from(out))
}
