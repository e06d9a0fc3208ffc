//! Blocking TCP/TLS transport.

use crate::base::config::{Config, HttpVersion};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use crate::http::digestauth::{self, DigestChallenge};
use crate::http::httpauth::{AuthCredential, AuthScheme};
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::RequestBody;
use crate::http::response::{parse_head, split_head};
use crate::socket::client::SocketType;
use crate::socket::connectjob::{ConnectJob, ConnectOptions};
use crate::socket::tls::TlsConfig;
use crate::socket::transport::{format_request, request_target, Capabilities, Transport};
use bytes::Bytes;
use http::header::{AUTHORIZATION, CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING, WWW_AUTHENTICATE};
use http::{HeaderMap, Method, StatusCode, Version};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use url::Url;

#[derive(Debug, Clone)]
struct PendingRequest {
    method: Method,
    url: Url,
    version: HttpVersion,
    headers: OrderedHeaderMap,
    body: RequestBody,
}

enum Sink<'a> {
    Buffer(&'a mut Vec<u8>),
    Stream(&'a mut File),
    Discard,
}

impl Sink<'_> {
    fn deliver(&mut self, data: &[u8]) -> Result<(), NetError> {
        match self {
            Sink::Buffer(buf) => {
                buf.extend_from_slice(data);
                Ok(())
            }
            Sink::Stream(file) => file
                .write_all(data)
                .map_err(|e| NetError::StreamOpenFailed(e.to_string())),
            Sink::Discard => Ok(()),
        }
    }
}

/// Response head fields that drive body framing.
struct HeadInfo {
    version: Version,
    status: StatusCode,
    headers: HeaderMap,
}

impl HeadInfo {
    fn is_chunked(&self) -> bool {
        self.headers
            .get_all(TRANSFER_ENCODING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case("chunked"))
    }

    fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    fn wants_close(&self) -> bool {
        let connection = self
            .headers
            .get(CONNECTION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);
        match connection.as_deref() {
            Some(v) if v.contains("close") => true,
            Some(v) if v.contains("keep-alive") => false,
            _ => self.version == Version::HTTP_10,
        }
    }
}

/// Transport over `std::net::TcpStream`, with TLS through BoringSSL.
///
/// Connections are reused across round-trips when `keepalive` is set and
/// the target is unchanged. Given a Digest credential, a `401` carrying a
/// Digest challenge is answered once with a computed `Authorization`.
#[derive(Debug, Default)]
pub struct SocketTransport {
    config: Config,
    conn: Option<BufReader<SocketType>>,
    target: Option<(String, u16, bool)>,
    output: Option<File>,
    raw_auth: Option<AuthCredential>,
    pending: Option<PendingRequest>,
}

impl SocketTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: self.config.connect_timeout(),
            io_timeout: self.config.timeout(),
            tls: TlsConfig::default().with_verify_peer(self.config.ssl_verify_peer()),
        }
    }

    fn open(&mut self, host: &str, port: u16, secure: bool) -> Result<(), NetError> {
        self.close();
        tracing::debug!(host = %host, port, secure, "connecting");
        let socket = ConnectJob::connect(host, port, secure, &self.connect_options())?;
        self.conn = Some(BufReader::new(socket));
        self.target = Some((host.to_string(), port, secure));
        Ok(())
    }

    fn reconnect(&mut self) -> Result<(), NetError> {
        let (host, port, secure) = self.target.clone().ok_or(NetError::ConnectionClosed)?;
        self.open(&host, port, secure)
    }

    fn conn(&mut self) -> Result<&mut BufReader<SocketType>, NetError> {
        self.conn.as_mut().ok_or(NetError::ConnectionClosed)
    }

    fn send(&mut self, request: &PendingRequest) -> Result<Bytes, NetError> {
        let raw = format_request(
            &request.method,
            &request.url,
            request.version,
            &request.headers,
            &request.body,
        )?;
        let socket = self.conn()?.get_mut();
        socket.write_all(&raw).write_context()?;
        socket.flush().write_context()?;
        Ok(raw)
    }

    /// Status line and headers, skipping interim 1xx responses. Empty when
    /// the peer closed without answering.
    fn read_head(&mut self) -> Result<(Vec<u8>, HeadInfo), NetError> {
        loop {
            let conn = self.conn()?;
            let mut head = Vec::new();
            loop {
                let start = head.len();
                let n = conn.read_until(b'\n', &mut head).map_err(|e| NetError::from_io(&e))?;
                if n == 0 {
                    if head.is_empty() {
                        return Ok((head, empty_head()));
                    }
                    return Err(NetError::InvalidResponse);
                }
                let line = &head[start..];
                if line == b"\r\n" || line == b"\n" {
                    // A blank line before the status line is ignored.
                    if start == 0 {
                        head.clear();
                        continue;
                    }
                    break;
                }
            }

            let (version, status, _, headers) = parse_head(split_head(&head).0)?;
            if status.is_informational() && status != StatusCode::SWITCHING_PROTOCOLS {
                tracing::trace!(status = status.as_u16(), "skipping interim response");
                continue;
            }
            return Ok((
                head,
                HeadInfo {
                    version,
                    status,
                    headers,
                },
            ));
        }
    }

    /// Read the body framed by `info`. Returns whether the body ran to EOF.
    fn read_body(&mut self, info: &HeadInfo, is_head: bool, mut sink: Sink<'_>) -> Result<bool, NetError> {
        if is_head
            || info.status == StatusCode::NO_CONTENT
            || info.status == StatusCode::NOT_MODIFIED
        {
            return Ok(false);
        }

        let buffering_raw = matches!(sink, Sink::Buffer(_));
        let conn = self.conn()?;

        if info.is_chunked() {
            loop {
                let mut line = Vec::new();
                conn.read_until(b'\n', &mut line).map_err(|e| NetError::from_io(&e))?;
                if line.is_empty() {
                    return Err(NetError::InvalidChunkedEncoding);
                }
                if buffering_raw {
                    sink.deliver(&line)?;
                }
                let text = std::str::from_utf8(&line).map_err(|_| NetError::InvalidChunkedEncoding)?;
                let size_str = text.split(';').next().unwrap_or("").trim();
                let size = u64::from_str_radix(size_str, 16).map_err(|_| NetError::InvalidChunkedEncoding)?;

                if size == 0 {
                    loop {
                        let mut trailer = Vec::new();
                        let n = conn.read_until(b'\n', &mut trailer).map_err(|e| NetError::from_io(&e))?;
                        if buffering_raw {
                            sink.deliver(&trailer)?;
                        }
                        if n == 0 || trailer == b"\r\n" || trailer == b"\n" {
                            break;
                        }
                    }
                    return Ok(false);
                }

                // The size is untrusted; the chunk is copied as it arrives.
                copy_into(&mut conn.by_ref().take(size), &mut sink, Some(size))?;
                let mut crlf = [0u8; 2];
                conn.read_exact(&mut crlf).map_err(|e| NetError::from_io(&e))?;
                if &crlf != b"\r\n" {
                    return Err(NetError::InvalidChunkedEncoding);
                }
                if buffering_raw {
                    sink.deliver(&crlf)?;
                }
            }
        }

        if let Some(len) = info.content_length() {
            copy_into(&mut conn.take(len), &mut sink, Some(len))?;
            return Ok(false);
        }

        copy_into(conn, &mut sink, None)?;
        Ok(true)
    }

    fn digest_retry(&mut self, info: &HeadInfo) -> Result<Option<PendingRequest>, NetError> {
        let Some(cred) = self.raw_auth.as_ref() else {
            return Ok(None);
        };
        if cred.scheme() != AuthScheme::Digest || info.status != StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let Some(challenge) = info
            .headers
            .get_all(WWW_AUTHENTICATE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|v| DigestChallenge::parse(v).ok())
        else {
            return Ok(None);
        };
        let Some(mut request) = self.pending.clone() else {
            return Ok(None);
        };
        if request.headers.contains(AUTHORIZATION.as_str()) {
            return Ok(None);
        }

        let value = digestauth::authorization_header(
            cred.user(),
            cred.password(),
            &challenge,
            request.method.as_str(),
            request_target(&request.url),
            request.body.as_bytes(),
        )?;
        request.headers.insert(AUTHORIZATION.as_str(), &value)?;
        Ok(Some(request))
    }
}

fn empty_head() -> HeadInfo {
    HeadInfo {
        version: Version::HTTP_11,
        status: StatusCode::OK,
        headers: HeaderMap::new(),
    }
}

fn copy_into<R: Read + ?Sized>(reader: &mut R, sink: &mut Sink<'_>, expected: Option<u64>) -> Result<(), NetError> {
    let mut buf = [0u8; 8192];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(NetError::from_io(&e)),
        };
        total += n as u64;
        sink.deliver(&buf[..n])?;
    }
    match expected {
        Some(len) if total < len => Err(NetError::ConnectionClosed),
        _ => Ok(()),
    }
}

impl Transport for SocketTransport {
    fn configure(&mut self, config: Config) {
        self.config = config;
    }

    fn connect(&mut self, host: &str, port: u16, secure: bool) -> Result<(), NetError> {
        let same_target = self
            .target
            .as_ref()
            .is_some_and(|(h, p, s)| h == host && *p == port && *s == secure);
        if self.config.keep_alive() && same_target {
            if let Some(conn) = &self.conn {
                if conn.buffer().is_empty() && conn.get_ref().is_connected_and_idle() {
                    tracing::debug!(host = %host, port, "reusing connection");
                    return Ok(());
                }
            }
        }
        self.open(host, port, secure)
    }

    fn write(
        &mut self,
        method: &Method,
        url: &Url,
        version: HttpVersion,
        headers: &OrderedHeaderMap,
        body: &RequestBody,
    ) -> Result<Bytes, NetError> {
        let request = PendingRequest {
            method: method.clone(),
            url: url.clone(),
            version,
            headers: headers.clone(),
            body: body.clone(),
        };
        let raw = self.send(&request)?;
        self.pending = Some(request);
        Ok(raw)
    }

    fn read(&mut self) -> Result<Bytes, NetError> {
        let mut retried = false;
        loop {
            let (head, info) = self.read_head()?;
            if head.is_empty() {
                self.close();
                return Ok(Bytes::new());
            }
            let is_head = self.pending.as_ref().is_some_and(|p| p.method == Method::HEAD);

            if !retried {
                if let Some(request) = self.digest_retry(&info)? {
                    let hit_eof = self.read_body(&info, is_head, Sink::Discard)?;
                    if hit_eof || info.wants_close() {
                        self.reconnect()?;
                    }
                    tracing::debug!(url = %request.url, "answering digest challenge");
                    self.send(&request)?;
                    self.pending = Some(request);
                    retried = true;
                    continue;
                }
            }

            let mut out = head;
            let hit_eof = match self.output.take() {
                Some(mut file) => {
                    let result = self.read_body(&info, is_head, Sink::Stream(&mut file));
                    self.output = Some(file);
                    result?
                }
                None => self.read_body(&info, is_head, Sink::Buffer(&mut out))?,
            };

            if hit_eof || info.wants_close() || !self.config.keep_alive() {
                self.close();
            }
            return Ok(Bytes::from(out));
        }
    }

    fn set_output_stream(&mut self, stream: Option<File>) -> Result<(), NetError> {
        self.output = stream;
        Ok(())
    }

    fn set_raw_auth(&mut self, credential: Option<AuthCredential>) -> Result<(), NetError> {
        self.raw_auth = credential;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.get_mut().shutdown();
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            streaming: true,
            raw_auth: true,
        }
    }
}
