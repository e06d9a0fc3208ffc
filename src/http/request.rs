//! Outgoing request model.

use crate::base::neterror::NetError;
use crate::http::formdata::Params;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::requestbody::RequestBody;
use bytes::Bytes;
use http::Method;
use url::Url;

/// A file attached to a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub form_name: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl FileUpload {
    pub fn new(
        form_name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            form_name: form_name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

/// Parse an absolute http(s) URI. URIs without a host are rejected.
pub fn parse_uri(uri: &str) -> Result<Url, NetError> {
    let url = Url::parse(uri).map_err(|_| NetError::InvalidUrl)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().map_or(true, str::is_empty) {
        return Err(NetError::InvalidUrl);
    }
    Ok(url)
}

/// A logical request: target, headers and the parameters the body encoder
/// turns into wire bytes.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: OrderedHeaderMap,
    pub query: Params,
    pub post: Params,
    pub files: Vec<FileUpload>,
    /// Raw body; overrides `post` and `files` when not empty.
    pub content: RequestBody,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: OrderedHeaderMap::new(),
            query: Params::new(),
            post: Params::new(),
            files: Vec::new(),
            content: RequestBody::Empty,
        }
    }

    pub fn get(url: &str) -> Result<Self, NetError> {
        Ok(Self::new(Method::GET, parse_uri(url)?))
    }

    pub fn post(url: &str) -> Result<Self, NetError> {
        Ok(Self::new(Method::POST, parse_uri(url)?))
    }

    /// Methods that never carry a request body.
    pub fn is_bodyless(&self) -> bool {
        is_bodyless_method(&self.method)
    }

    /// True when any body source is set.
    pub fn has_body_data(&self) -> bool {
        !self.content.is_empty() || !self.post.is_empty() || !self.files.is_empty()
    }
}

pub fn is_bodyless_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::TRACE)
}

/// Methods that default to a urlencoded body when none is chosen.
pub fn is_body_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH | Method::OPTIONS
    )
}
