//! In-memory transport that replays canned responses.
//!
//! Clones share state, so a test keeps one handle while the client owns
//! another and inspects connects, written requests and pushed config after
//! `send` returns.
//!
//! ```rust
//! use clientnet::socket::scripted::ScriptedTransport;
//! use clientnet::Client;
//!
//! let transport = ScriptedTransport::new()
//!     .with_response("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
//! let mut client = Client::with_transport(transport.clone());
//! client.set_uri("http://example.com/").unwrap();
//! let mut response = client.send().unwrap();
//! assert_eq!(response.text().unwrap(), "ok");
//! assert_eq!(transport.request_count(), 1);
//! ```

use crate::base::config::{Config, HttpVersion};
use crate::base::neterror::NetError;
use crate::http::httpauth::AuthCredential;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::RequestBody;
use crate::http::response::{dechunk, find, split_head};
use crate::socket::transport::{format_request, Capabilities, Transport};
use bytes::Bytes;
use http::Method;
use std::fs::File;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

#[derive(Debug, Default)]
struct State {
    responses: Vec<Bytes>,
    cursor: usize,
    capabilities: Capabilities,
    connect_error: Option<NetError>,
    config: Option<Config>,
    connects: Vec<(String, u16, bool)>,
    requests: Vec<Bytes>,
    output: Option<File>,
    raw_auth: Option<AuthCredential>,
    closes: usize,
}

/// Replays queued raw responses in order, cycling back to the first when
/// exhausted. With no responses queued, `read` returns nothing.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<State>>,
}

impl ScriptedTransport {
    /// A transport advertising streaming and raw-auth support.
    pub fn new() -> Self {
        Self::default().with_capabilities(Capabilities {
            streaming: true,
            raw_auth: true,
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_response(self, raw: impl Into<Bytes>) -> Self {
        self.push_response(raw);
        self
    }

    pub fn with_responses<I, B>(self, raws: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        for raw in raws {
            self.push_response(raw);
        }
        self
    }

    pub fn with_capabilities(self, capabilities: Capabilities) -> Self {
        self.state().capabilities = capabilities;
        self
    }

    /// Make every `connect` fail with `error`.
    pub fn with_connect_error(self, error: NetError) -> Self {
        self.state().connect_error = Some(error);
        self
    }

    pub fn push_response(&self, raw: impl Into<Bytes>) {
        self.state().responses.push(raw.into());
    }

    pub fn connects(&self) -> Vec<(String, u16, bool)> {
        self.state().connects.clone()
    }

    pub fn requests(&self) -> Vec<Bytes> {
        self.state().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state().requests.len()
    }

    pub fn last_request(&self) -> Option<String> {
        self.state()
            .requests
            .last()
            .map(|r| String::from_utf8_lossy(r).into_owned())
    }

    pub fn config(&self) -> Option<Config> {
        self.state().config.clone()
    }

    pub fn raw_auth(&self) -> Option<AuthCredential> {
        self.state().raw_auth.clone()
    }

    pub fn has_output_stream(&self) -> bool {
        self.state().output.is_some()
    }

    pub fn close_count(&self) -> usize {
        self.state().closes
    }
}

impl Transport for ScriptedTransport {
    fn configure(&mut self, config: Config) {
        self.state().config = Some(config);
    }

    fn connect(&mut self, host: &str, port: u16, secure: bool) -> Result<(), NetError> {
        let mut state = self.state();
        if let Some(err) = state.connect_error.clone() {
            return Err(err);
        }
        state.connects.push((host.to_string(), port, secure));
        Ok(())
    }

    fn write(
        &mut self,
        method: &Method,
        url: &Url,
        version: HttpVersion,
        headers: &OrderedHeaderMap,
        body: &RequestBody,
    ) -> Result<Bytes, NetError> {
        let raw = format_request(method, url, version, headers, body)?;
        self.state().requests.push(raw.clone());
        Ok(raw)
    }

    fn read(&mut self) -> Result<Bytes, NetError> {
        let mut state = self.state();
        if state.responses.is_empty() {
            return Ok(Bytes::new());
        }
        let idx = state.cursor % state.responses.len();
        state.cursor += 1;
        let raw = state.responses[idx].clone();

        let Some(output) = state.output.as_mut() else {
            return Ok(raw);
        };

        let (head, body) = split_head(&raw);
        let head_text = String::from_utf8_lossy(head).to_ascii_lowercase();
        let body = if find(head_text.as_bytes(), b"transfer-encoding: chunked").is_some() {
            dechunk(body)?
        } else {
            body.to_vec()
        };
        output
            .write_all(&body)
            .map_err(|e| NetError::StreamOpenFailed(e.to_string()))?;

        let mut out = head.to_vec();
        out.extend_from_slice(b"\r\n\r\n");
        Ok(Bytes::from(out))
    }

    fn set_output_stream(&mut self, stream: Option<File>) -> Result<(), NetError> {
        let mut state = self.state();
        if stream.is_some() && !state.capabilities.streaming {
            return Err(NetError::StreamingUnsupported);
        }
        state.output = stream;
        Ok(())
    }

    fn set_raw_auth(&mut self, credential: Option<AuthCredential>) -> Result<(), NetError> {
        let mut state = self.state();
        if credential.is_some() && !state.capabilities.raw_auth {
            return Err(NetError::DigestAuthUnsupported);
        }
        state.raw_auth = credential;
        Ok(())
    }

    fn close(&mut self) {
        self.state().closes += 1;
    }

    fn capabilities(&self) -> Capabilities {
        self.state().capabilities
    }
}
