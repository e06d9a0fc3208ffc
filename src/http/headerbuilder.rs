//! Outgoing header assembly.

use crate::base::config::{Config, HttpVersion};
use crate::base::neterror::NetError;
use crate::http::httpauth::AuthCredential;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::RequestBody;
use http::header::{
    ACCEPT_ENCODING, AUTHORIZATION, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, HOST,
    USER_AGENT,
};
use http::Method;
use url::Url;

/// Everything the header set is derived from.
#[derive(Debug, Clone, Copy)]
pub struct HeaderContext<'a> {
    pub method: &'a Method,
    pub url: &'a Url,
    pub config: &'a Config,
    pub body: &'a RequestBody,
    /// Content type chosen by the body encoder.
    pub content_type: Option<&'a str>,
    /// True when the content type carries a freshly generated multipart
    /// boundary that must not be overridden.
    pub generated_boundary: bool,
    pub auth: Option<&'a AuthCredential>,
    pub user_headers: &'a OrderedHeaderMap,
    /// Prepared Cookie header value; empty for none.
    pub cookie: &'a str,
    pub streaming: bool,
}

/// `gzip, deflate` when responses can be decoded and are not streamed.
pub fn accept_encoding(streaming: bool) -> &'static str {
    if cfg!(feature = "decompression") && !streaming {
        "gzip, deflate"
    } else {
        "identity"
    }
}

/// `host[:port]`, omitting the scheme's default port.
pub fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or("");
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Build the outgoing header set.
///
/// Computed headers come first; user headers then replace them in place,
/// except `Host` (always computed) and `Content-Type` when a multipart
/// boundary was generated. A non-empty jar cookie sets `Cookie` last.
pub fn build_headers(ctx: &HeaderContext<'_>) -> Result<OrderedHeaderMap, NetError> {
    let mut headers = OrderedHeaderMap::new();
    let version = ctx.config.http_version();

    if version == HttpVersion::V1_1 {
        headers.insert(HOST.as_str(), &host_header(ctx.url))?;
    }

    if !ctx.config.keep_alive() && !ctx.user_headers.contains(CONNECTION.as_str()) {
        headers.insert(CONNECTION.as_str(), "close")?;
    }

    headers.insert(ACCEPT_ENCODING.as_str(), accept_encoding(ctx.streaming))?;

    if let Some(ua) = ctx.config.user_agent() {
        if !ua.is_empty() {
            headers.insert(USER_AGENT.as_str(), ua)?;
        }
    }

    if let Some(content_type) = ctx.content_type {
        headers.insert(CONTENT_TYPE.as_str(), content_type)?;
    }

    let length = ctx.body.content_length()?;
    if length > 0 || matches!(*ctx.method, Method::POST | Method::PUT | Method::PATCH) {
        headers.insert(CONTENT_LENGTH.as_str(), &length.to_string())?;
    }

    if let Some(auth) = ctx.auth {
        if let Some(value) = auth.header_value()? {
            headers.insert(AUTHORIZATION.as_str(), &value)?;
        }
    }

    for (name, value) in ctx.user_headers.iter() {
        if *name == HOST || (*name == CONTENT_TYPE && ctx.generated_boundary) {
            continue;
        }
        headers.insert_typed(name.clone(), value.clone());
    }

    if !ctx.cookie.is_empty() {
        headers.insert(COOKIE.as_str(), ctx.cookie)?;
    }

    tracing::trace!(count = headers.len(), "assembled request headers");
    Ok(headers)
}
