//! HTTP response model and raw message parsing.

use crate::base::neterror::NetError;
use crate::http::ResponseBody;
use crate::urlrequest::stream::StreamHandle;
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_ENCODING, LOCATION, SET_COOKIE, TRANSFER_ENCODING};
use http::{HeaderMap, StatusCode, Version};

/// A response produced from raw transport bytes.
#[derive(Debug)]
pub struct HttpResponse {
    status: StatusCode,
    version: Version,
    reason: String,
    headers: HeaderMap,
    body: ResponseBody,
}

impl HttpResponse {
    /// Parse a complete raw HTTP/1.x response.
    pub fn parse(raw: &[u8]) -> Result<Self, NetError> {
        if raw.is_empty() {
            return Err(NetError::EmptyResponse);
        }
        let (head, body) = split_head(raw);
        let (version, status, reason, headers) = parse_head(head)?;
        Ok(Self {
            status,
            version,
            reason,
            headers,
            body: ResponseBody::Bytes(Bytes::copy_from_slice(body)),
        })
    }

    /// Build a response whose body was streamed into `handle`. `head` holds
    /// the status line and headers.
    pub fn from_stream(head: &[u8], mut handle: StreamHandle) -> Result<Self, NetError> {
        if head.is_empty() {
            return Err(NetError::EmptyResponse);
        }
        let (head, _) = split_head(head);
        let (version, status, reason, headers) = parse_head(head)?;
        handle.rewind()?;
        Ok(Self {
            status,
            version,
            reason,
            headers,
            body: ResponseBody::Stream(handle),
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of `name` as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|v| v.to_str().ok())
    }

    /// Raw Set-Cookie lines.
    pub fn set_cookies(&self) -> Vec<&str> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }

    pub fn is_stream(&self) -> bool {
        self.body.is_stream()
    }

    /// The body as received; empty for streamed responses.
    pub fn raw_body(&self) -> &[u8] {
        self.body.as_bytes()
    }

    /// Body with chunked transfer coding and content coding removed.
    ///
    /// Streamed bodies are read back from their file; the transport has
    /// already removed the transfer coding.
    pub fn body(&mut self) -> Result<Bytes, NetError> {
        let raw = self.body.read_all()?;
        let data = if !self.body.is_stream() && self.is_chunked() {
            Bytes::from(dechunk(&raw)?)
        } else {
            raw
        };
        match self.header(CONTENT_ENCODING.as_str()) {
            Some(encoding) => decode_content(encoding, data),
            None => Ok(data),
        }
    }

    pub fn text(&mut self) -> Result<String, NetError> {
        let bytes = self.body()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| NetError::InvalidUtf8)
    }

    #[cfg(feature = "json")]
    pub fn json<T: serde::de::DeserializeOwned>(&mut self) -> Result<T, NetError> {
        let bytes = self.body()?;
        serde_json::from_slice(&bytes).map_err(|_| NetError::JsonParseError)
    }

    pub fn stream(&mut self) -> Option<&mut StreamHandle> {
        match &mut self.body {
            ResponseBody::Stream(handle) => Some(handle),
            ResponseBody::Bytes(_) => None,
        }
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    pub fn into_stream(self) -> Option<StreamHandle> {
        self.body.into_stream()
    }

    fn is_chunked(&self) -> bool {
        self.headers
            .get_all(TRANSFER_ENCODING)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case("chunked"))
    }
}

/// Split at the blank line ending the header block.
pub fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(pos) = find(raw, b"\r\n\r\n") {
        return (&raw[..pos], &raw[pos + 4..]);
    }
    if let Some(pos) = find(raw, b"\n\n") {
        return (&raw[..pos], &raw[pos + 2..]);
    }
    (raw, &[])
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

type Head = (Version, StatusCode, String, HeaderMap);

/// Parse a status line and header block.
pub fn parse_head(head: &[u8]) -> Result<Head, NetError> {
    let text = std::str::from_utf8(head).map_err(|_| NetError::InvalidResponse)?;
    let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

    let status_line = lines.next().ok_or(NetError::InvalidResponse)?;
    let mut parts = status_line.splitn(3, ' ');
    let version = match parts.next() {
        Some("HTTP/1.1") => Version::HTTP_11,
        Some("HTTP/1.0") => Version::HTTP_10,
        _ => return Err(NetError::InvalidResponse),
    };
    let status = parts
        .next()
        .and_then(|c| StatusCode::from_bytes(c.as_bytes()).ok())
        .ok_or(NetError::InvalidResponse)?;
    let reason = parts.next().unwrap_or("").trim().to_string();

    // Collect with obs-fold continuation lines appended to the previous value.
    let mut raw_headers: Vec<(String, String)> = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if line.starts_with([' ', '\t']) {
            if let Some((_, value)) = raw_headers.last_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        match line.split_once(':') {
            Some((name, value)) => raw_headers.push((name.trim().to_string(), value.trim().to_string())),
            None => tracing::trace!(line, "skipping malformed header line"),
        }
    }

    let mut headers = HeaderMap::with_capacity(raw_headers.len());
    for (name, value) in raw_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(n), Ok(v)) => {
                headers.append(n, v);
            }
            _ => tracing::trace!(name = %name, "skipping invalid header"),
        }
    }

    Ok((version, status, reason, headers))
}

/// Remove chunked transfer coding (RFC 7230 section 4.1).
pub fn dechunk(data: &[u8]) -> Result<Vec<u8>, NetError> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;

    loop {
        let eol = find(&data[i..], b"\r\n").ok_or(NetError::InvalidChunkedEncoding)? + i;
        let line = &data[i..eol];
        i = eol + 2;

        // Ignore chunk extensions
        let semi = line.iter().position(|&b| b == b';').unwrap_or(line.len());
        let size_str = std::str::from_utf8(&line[..semi]).map_err(|_| NetError::InvalidChunkedEncoding)?;
        let size = usize::from_str_radix(size_str.trim(), 16).map_err(|_| NetError::InvalidChunkedEncoding)?;

        if size == 0 {
            // Trailers are discarded.
            break;
        }

        let end = i.checked_add(size).ok_or(NetError::InvalidChunkedEncoding)?;
        let next = end.checked_add(2).ok_or(NetError::InvalidChunkedEncoding)?;
        if next > data.len() || &data[end..next] != b"\r\n" {
            return Err(NetError::InvalidChunkedEncoding);
        }
        out.extend_from_slice(&data[i..end]);
        i = next;
    }

    Ok(out)
}

/// Remove gzip/deflate content coding. Unknown codings pass through.
#[cfg(feature = "decompression")]
pub fn decode_content(encoding: &str, data: Bytes) -> Result<Bytes, NetError> {
    use std::io::Read;

    match encoding.trim().to_ascii_lowercase().as_str() {
        "gzip" | "x-gzip" => {
            let mut decoded = Vec::new();
            flate2::read::GzDecoder::new(&data[..])
                .read_to_end(&mut decoded)
                .map_err(|_| NetError::ContentDecodingFailed)?;
            Ok(Bytes::from(decoded))
        }
        "deflate" => {
            let mut decoded = Vec::new();
            if flate2::read::ZlibDecoder::new(&data[..])
                .read_to_end(&mut decoded)
                .is_ok()
            {
                return Ok(Bytes::from(decoded));
            }
            decoded.clear();
            flate2::read::DeflateDecoder::new(&data[..])
                .read_to_end(&mut decoded)
                .map_err(|_| NetError::ContentDecodingFailed)?;
            Ok(Bytes::from(decoded))
        }
        _ => Ok(data),
    }
}

#[cfg(not(feature = "decompression"))]
pub fn decode_content(_encoding: &str, data: Bytes) -> Result<Bytes, NetError> {
    Ok(data)
}
