//! `multipart/form-data` encoding (RFC 2388).
//!
//! Every flattened parameter becomes a part
//! `--B\r\nContent-Disposition: form-data; name="K"\r\n\r\nV\r\n`; files add
//! a `filename` and a `Content-Type` header. The body ends with `--B--\r\n`.
//! Given the same boundary the output is byte-for-byte reproducible.
//!
//! ```rust
//! use clientnet::http::formdata::Params;
//! use clientnet::http::multipart::Form;
//!
//! let form = Form::with_boundary("B").text("x", "y");
//! assert_eq!(
//!     &form.into_body()[..],
//!     b"--B\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\ny\r\n--B--\r\n"
//! );
//! ```

use crate::base::neterror::NetError;
use crate::http::formdata::{flatten, Params};
use crate::http::request::FileUpload;
use bytes::Bytes;
use std::borrow::Cow;

/// A multipart form.
#[derive(Debug, Clone)]
pub struct Form {
    boundary: String,
    fields: Vec<(String, Part)>,
}

impl Form {
    /// Create an empty form with a fresh random boundary.
    pub fn new() -> Result<Self, NetError> {
        Ok(Self::with_boundary(generate_boundary()?))
    }

    /// Create an empty form with a caller-chosen boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            fields: Vec::new(),
        }
    }

    /// Parameters first, then files, in their given order.
    pub fn from_parts(params: &Params, files: &[FileUpload], boundary: impl Into<String>) -> Self {
        let mut form = Self::with_boundary(boundary);
        for (name, value) in flatten(params, None) {
            form = form.text(name, value.to_string());
        }
        for file in files {
            form = form.part(
                file.form_name.clone(),
                Part::bytes(file.data.clone())
                    .file_name(file.file_name.clone())
                    .content_type(file.content_type.clone()),
            );
        }
        form
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Add a text field.
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(name, Part::text(value))
    }

    /// Add a custom part.
    pub fn part(mut self, name: impl Into<String>, part: Part) -> Self {
        self.fields.push((name.into(), part));
        self
    }

    /// `Content-Type` header value.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn content_length(&self) -> usize {
        let mut length = 0usize;

        for (name, part) in &self.fields {
            // --boundary\r\n
            length += 2 + self.boundary.len() + 2;
            length += part.format_headers(name).len();
            // \r\n\r\n
            length += 4;
            length += part.len();
            // \r\n
            length += 2;
        }

        // --boundary--\r\n
        length + 2 + self.boundary.len() + 4
    }

    pub fn into_body(self) -> Bytes {
        let mut output = Vec::with_capacity(self.content_length());

        for (name, part) in &self.fields {
            output.extend_from_slice(b"--");
            output.extend_from_slice(self.boundary.as_bytes());
            output.extend_from_slice(b"\r\n");

            output.extend_from_slice(part.format_headers(name).as_bytes());
            output.extend_from_slice(b"\r\n\r\n");

            output.extend_from_slice(&part.data);
            output.extend_from_slice(b"\r\n");
        }

        output.extend_from_slice(b"--");
        output.extend_from_slice(self.boundary.as_bytes());
        output.extend_from_slice(b"--\r\n");

        Bytes::from(output)
    }
}

/// A part of a multipart form.
#[derive(Debug, Clone)]
pub struct Part {
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

impl Part {
    /// A plain field; no part headers besides Content-Disposition.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            data: Bytes::from(value.into()),
            content_type: None,
            file_name: None,
        }
    }

    pub fn bytes(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            content_type: None,
            file_name: None,
        }
    }

    pub fn content_type(mut self, mime: impl Into<String>) -> Self {
        self.content_type = Some(mime.into());
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    fn format_headers(&self, name: &str) -> String {
        let mut header = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quotes(name)
        );

        if let Some(ref filename) = self.file_name {
            header.push_str(&format!("; filename=\"{}\"", escape_quotes(filename)));
        }

        if let Some(ref mime) = self.content_type {
            header.push_str(&format!("\r\nContent-Type: {}", mime));
        }

        header
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Escape quotes, backslashes and line breaks in header parameters.
fn escape_quotes(s: &str) -> Cow<'_, str> {
    if s.contains(['"', '\\', '\r', '\n']) {
        Cow::Owned(
            s.replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\r', "\\r")
                .replace('\n', "\\n"),
        )
    } else {
        Cow::Borrowed(s)
    }
}

/// Fresh unguessable boundary from the system CSPRNG.
pub fn generate_boundary() -> Result<String, NetError> {
    let mut buf = [0u8; 16];
    boring::rand::rand_bytes(&mut buf).map_err(|_| NetError::SslProtocolError)?;
    let hex: String = buf.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(format!("---CLIENTNET-{}", hex))
}

/// Encode parameters and files with the given boundary.
pub fn encode(params: &Params, files: &[FileUpload], boundary: &str) -> Bytes {
    Form::from_parts(params, files, boundary).into_body()
}
