//! Credentials and the Basic scheme.
//!
//! A client holds at most one [`AuthCredential`]. Basic credentials become an
//! `Authorization` header directly; Digest credentials are handed to a
//! transport that can answer the server challenge (see
//! [`digestauth`](crate::http::digestauth)).

use crate::base::neterror::NetError;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

/// Supported authentication schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthScheme {
    #[default]
    Basic,
    Digest,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Basic => "basic",
            AuthScheme::Digest => "digest",
        }
    }
}

impl FromStr for AuthScheme {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthScheme::Basic),
            "digest" => Ok(AuthScheme::Digest),
            other => Err(NetError::UnsupportedAuthScheme(other.to_string())),
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User credentials for one scheme. The password is wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredential {
    user: String,
    password: Zeroizing<String>,
    scheme: AuthScheme,
}

impl AuthCredential {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        scheme: AuthScheme,
    ) -> Result<Self, NetError> {
        let user = user.into();
        if user.is_empty() {
            return Err(NetError::InvalidAuthCredentials("empty username".into()));
        }
        if scheme == AuthScheme::Basic && user.contains(':') {
            return Err(NetError::InvalidAuthCredentials(
                "username may not contain ':' with basic auth".into(),
            ));
        }
        Ok(Self {
            user,
            password: Zeroizing::new(password.into()),
            scheme,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// `Authorization` header value for Basic credentials; `None` for
    /// schemes that need a server challenge first.
    pub fn header_value(&self) -> Result<Option<String>, NetError> {
        match self.scheme {
            AuthScheme::Basic => basic_header(&self.user, &self.password).map(Some),
            AuthScheme::Digest => Ok(None),
        }
    }
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredential")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// base64 of `user:password`.
pub fn basic(user: &str, password: &str) -> Result<String, NetError> {
    if user.contains(':') {
        return Err(NetError::InvalidAuthCredentials(
            "username may not contain ':' with basic auth".into(),
        ));
    }
    Ok(STANDARD.encode(format!("{}:{}", user, password)))
}

/// `Basic <token>`.
pub fn basic_header(user: &str, password: &str) -> Result<String, NetError> {
    Ok(format!("Basic {}", basic(user, password)?))
}
