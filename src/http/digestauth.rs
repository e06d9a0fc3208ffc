//! HTTP Digest Authentication (RFC 2617).
//!
//! Computes the `response` value of a Digest `Authorization` header from the
//! user's credentials and a server challenge, and parses
//! `WWW-Authenticate: Digest ...` challenges. Supported quality of
//! protection values are none, `auth` and `auth-int`; the hash is MD5.

use crate::base::neterror::NetError;
use boring::hash::{hash, MessageDigest};
use std::fmt;
use std::str::FromStr;

/// Named digest challenge parameters accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestField {
    Realm,
    Qop,
    Nonce,
    Opaque,
    Nc,
    Cnonce,
}

impl DigestField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestField::Realm => "realm",
            DigestField::Qop => "qop",
            DigestField::Nonce => "nonce",
            DigestField::Opaque => "opaque",
            DigestField::Nc => "nc",
            DigestField::Cnonce => "cnonce",
        }
    }
}

impl FromStr for DigestField {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realm" => Ok(DigestField::Realm),
            "qop" => Ok(DigestField::Qop),
            "nonce" => Ok(DigestField::Nonce),
            "opaque" => Ok(DigestField::Opaque),
            "nc" => Ok(DigestField::Nc),
            "cnonce" => Ok(DigestField::Cnonce),
            other => Err(NetError::InvalidDigestParameter(other.to_string())),
        }
    }
}

impl fmt::Display for DigestField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server challenge parameters for one digest computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestChallenge {
    pub realm: String,
    pub nonce: String,
    pub qop: Option<String>,
    pub opaque: Option<String>,
    pub nc: Option<String>,
    pub cnonce: Option<String>,
}

impl DigestChallenge {
    pub fn new(realm: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            nonce: nonce.into(),
            ..Default::default()
        }
    }

    pub fn with_qop(mut self, qop: impl Into<String>) -> Self {
        self.qop = Some(qop.into());
        self
    }

    pub fn with_opaque(mut self, opaque: impl Into<String>) -> Self {
        self.opaque = Some(opaque.into());
        self
    }

    pub fn with_nc(mut self, nc: impl Into<String>) -> Self {
        self.nc = Some(nc.into());
        self
    }

    pub fn with_cnonce(mut self, cnonce: impl Into<String>) -> Self {
        self.cnonce = Some(cnonce.into());
        self
    }

    /// Build a challenge from named fields. Unknown names are rejected;
    /// `realm` and `nonce` are required.
    pub fn from_fields<I, K, V>(fields: I) -> Result<Self, NetError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut realm = None;
        let mut nonce = None;
        let mut challenge = Self::default();

        for (key, value) in fields {
            let value = value.into();
            match key.as_ref().parse::<DigestField>()? {
                DigestField::Realm => realm = Some(value),
                DigestField::Nonce => nonce = Some(value),
                DigestField::Qop => challenge.qop = Some(value),
                DigestField::Opaque => challenge.opaque = Some(value),
                DigestField::Nc => challenge.nc = Some(value),
                DigestField::Cnonce => challenge.cnonce = Some(value),
            }
        }

        challenge.realm = realm.ok_or_else(|| NetError::InvalidDigestChallenge("missing realm".into()))?;
        challenge.nonce = nonce.ok_or_else(|| NetError::InvalidDigestChallenge("missing nonce".into()))?;
        Ok(challenge)
    }

    /// Parse a `WWW-Authenticate` value such as
    /// `Digest realm="r", nonce="n", qop="auth,auth-int"`.
    ///
    /// Parameters other than the named digest fields are ignored. When the
    /// server offers several qop values, `auth` is preferred.
    pub fn parse(header: &str) -> Result<Self, NetError> {
        let header = header.trim();
        let params = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("digest") => rest,
            Some((params, _)) if params.contains('=') => header,
            _ if header.eq_ignore_ascii_case("digest") => "",
            _ => {
                return Err(NetError::InvalidDigestChallenge(
                    "not a digest challenge".into(),
                ))
            }
        };

        let mut fields = Vec::new();
        for part in split_challenge(params) {
            let (key, value) = parse_param(part)?;
            let Ok(field) = key.parse::<DigestField>() else {
                continue;
            };
            let value = if field == DigestField::Qop {
                select_qop(value)
            } else {
                value.to_string()
            };
            fields.push((field.as_str(), value));
        }

        Self::from_fields(fields)
    }
}

fn select_qop(offered: &str) -> String {
    let options: Vec<&str> = offered.split(',').map(str::trim).filter(|q| !q.is_empty()).collect();
    options
        .iter()
        .find(|q| q.eq_ignore_ascii_case("auth"))
        .or_else(|| options.first())
        .map(|q| q.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Split challenge parameters on commas outside quotes.
fn split_challenge(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, c) in header.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                let part = header[start..i].trim();
                if !part.is_empty() {
                    parts.push(part);
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    let part = header[start..].trim();
    if !part.is_empty() {
        parts.push(part);
    }

    parts
}

fn parse_param(param: &str) -> Result<(&str, &str), NetError> {
    let (key, value) = param
        .split_once('=')
        .ok_or_else(|| NetError::InvalidDigestChallenge(param.to_string()))?;
    let mut value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value = &value[1..value.len() - 1];
    }
    Ok((key.trim(), value))
}

/// Lower-case hex MD5 of `data`.
pub fn md5_hex(data: &[u8]) -> Result<String, NetError> {
    let digest = hash(MessageDigest::md5(), data).map_err(|_| NetError::SslProtocolError)?;
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Compute the RFC 2617 request-digest.
///
/// `entity_body` is required when the challenge's qop is `auth-int`. With a
/// qop, the challenge must carry `nc` and `cnonce`.
pub fn digest(
    user: &str,
    password: &str,
    challenge: &DigestChallenge,
    method: &str,
    path: &str,
    entity_body: Option<&[u8]>,
) -> Result<String, NetError> {
    if challenge.realm.is_empty() && challenge.nonce.is_empty() {
        return Err(NetError::InvalidDigestChallenge("missing realm and nonce".into()));
    }
    if challenge.nonce.is_empty() {
        return Err(NetError::InvalidDigestChallenge("missing nonce".into()));
    }

    let ha1 = md5_hex(format!("{}:{}:{}", user, challenge.realm, password).as_bytes())?;

    let qop = challenge.qop.as_deref().filter(|q| !q.is_empty());
    let ha2 = match qop {
        None | Some("auth") => md5_hex(format!("{}:{}", method, path).as_bytes())?,
        Some("auth-int") => {
            let body = entity_body.ok_or_else(|| {
                NetError::InvalidDigestParameter("auth-int requires an entity body".into())
            })?;
            md5_hex(format!("{}:{}:{}", method, path, md5_hex(body)?).as_bytes())?
        }
        Some(other) => return Err(NetError::InvalidDigestParameter(format!("qop={}", other))),
    };

    let input = match qop {
        None => format!("{}:{}:{}", ha1, challenge.nonce, ha2),
        Some(qop) => {
            let nc = challenge
                .nc
                .as_deref()
                .ok_or_else(|| NetError::InvalidDigestChallenge("missing nc".into()))?;
            let cnonce = challenge
                .cnonce
                .as_deref()
                .ok_or_else(|| NetError::InvalidDigestChallenge("missing cnonce".into()))?;
            format!("{}:{}:{}:{}:{}:{}", ha1, challenge.nonce, nc, cnonce, qop, ha2)
        }
    };

    md5_hex(input.as_bytes())
}

/// Random 16 hex character client nonce.
pub fn generate_cnonce() -> Result<String, NetError> {
    let mut buf = [0u8; 8];
    boring::rand::rand_bytes(&mut buf).map_err(|_| NetError::SslProtocolError)?;
    Ok(buf.iter().map(|b| format!("{:02x}", b)).collect())
}

/// Full `Authorization` header value for a Digest challenge.
///
/// When the challenge requests a qop without supplying `nc`/`cnonce`, the
/// first nonce count and a fresh random cnonce are used.
pub fn authorization_header(
    user: &str,
    password: &str,
    challenge: &DigestChallenge,
    method: &str,
    uri: &str,
    entity_body: Option<&[u8]>,
) -> Result<String, NetError> {
    let mut challenge = challenge.clone();
    if challenge.qop.as_deref().is_some_and(|q| !q.is_empty()) {
        if challenge.nc.is_none() {
            challenge.nc = Some("00000001".into());
        }
        if challenge.cnonce.is_none() {
            challenge.cnonce = Some(generate_cnonce()?);
        }
    }

    let response = digest(user, password, &challenge, method, uri, entity_body)?;

    let mut auth = format!(
        "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\"",
        user, challenge.realm, challenge.nonce, uri, response
    );
    if let Some(ref opaque) = challenge.opaque {
        auth.push_str(&format!(", opaque=\"{}\"", opaque));
    }
    if let (Some(qop), Some(nc), Some(cnonce)) = (
        challenge.qop.as_deref().filter(|q| !q.is_empty()),
        challenge.nc.as_deref(),
        challenge.cnonce.as_deref(),
    ) {
        auth.push_str(&format!(", qop={}, nc={}, cnonce=\"{}\"", qop, nc, cnonce));
    }
    Ok(auth)
}
