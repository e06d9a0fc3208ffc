use crate::base::neterror::NetError;
use crate::cookies::psl;
use time::{Duration, OffsetDateTime};
use url::Url;

/// Represents a cookie.
/// Modeled after Chromium's `net::CanonicalCookie`.
///
/// An empty `domain` leaves the cookie unscoped (sent to every host); an
/// empty `path` behaves like `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expires: Option<OffsetDateTime>,
    /// Seconds; takes precedence over `expires` when set.
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub version: Option<u32>,
    pub creation_time: OffsetDateTime,
}

impl CanonicalCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: String::new(),
            expires: None,
            max_age: None,
            secure: false,
            http_only: false,
            host_only: false,
            version: None,
            creation_time: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        self.domain = domain.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_expires(mut self, expires: OffsetDateTime) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_host_only(mut self, host_only: bool) -> Self {
        self.host_only = host_only;
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    /// Jar identity: name + domain + path.
    pub fn identity_key(&self) -> String {
        format!("{}{}{}", self.name, self.domain, self.path)
    }

    /// Effective expiry, with Max-Age overriding Expires. A Max-Age past the
    /// representable range never expires.
    pub fn expiry(&self) -> Option<OffsetDateTime> {
        match self.max_age {
            Some(secs) => self.creation_time.checked_add(Duration::seconds(secs)),
            None => self.expires,
        }
    }

    pub fn is_expired(&self, current_time: OffsetDateTime) -> bool {
        match self.max_age {
            Some(secs) if secs <= 0 => true,
            _ => self.expiry().is_some_and(|expiry| expiry < current_time),
        }
    }

    /// A cookie without any expiry lives for the session only.
    pub fn is_session(&self) -> bool {
        self.max_age.is_none() && self.expires.is_none()
    }

    /// Domain, path and secure scoping for a request.
    pub fn is_valid_for_request(&self, domain: &str, path: &str, secure: bool) -> bool {
        if !self.domain.is_empty() {
            let domain_ok = if self.host_only {
                domain.eq_ignore_ascii_case(&self.domain)
            } else {
                psl::host_matches_domain(domain, &self.domain)
            };
            if !domain_ok {
                return false;
            }
        }

        if !self.path.is_empty() && !path_matches(&self.path, path) {
            return false;
        }

        !(self.secure && !secure)
    }

    /// Build a cookie from a Set-Cookie line received for `url`.
    ///
    /// The domain defaults to the request host (host-only) and the path to
    /// the RFC 6265 default path. A Domain attribute that is a public suffix
    /// or does not cover the host is rejected.
    pub fn from_set_cookie(url: &Url, line: &str) -> Result<Self, NetError> {
        let parsed = cookie::Cookie::parse(line)
            .map_err(|e| NetError::InvalidCookie(format!("{}: {}", line, e)))?;
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();

        let (domain, host_only) = match parsed.domain() {
            Some(d) => {
                let d = d.trim_start_matches('.').to_ascii_lowercase();
                if !psl::is_valid_cookie_domain(&d, &host) {
                    return Err(NetError::InvalidCookie(format!(
                        "domain {} not allowed for {}",
                        d, host
                    )));
                }
                (d, false)
            }
            None => (host, true),
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => default_path(url.path()),
        };

        let now = OffsetDateTime::now_utc();
        Ok(Self {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            expires: parsed.expires_datetime(),
            max_age: parsed.max_age().map(|d| d.whole_seconds()),
            secure: parsed.secure().unwrap_or(false),
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
            version: version_attribute(line),
            creation_time: now,
        })
    }

    /// `name=value`, with the value form-encoded when requested.
    pub fn header_pair(&self, encode_value: bool) -> String {
        if encode_value {
            let encoded: String = url::form_urlencoded::byte_serialize(self.value.as_bytes()).collect();
            format!("{}={}", self.name, encoded)
        } else {
            format!("{}={}", self.name, self.value)
        }
    }
}

/// RFC 6265 path matching: the cookie path must be a prefix of the request
/// path, ending at a `/` boundary.
pub fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    let request_path = if request_path.is_empty() { "/" } else { request_path };

    if request_path == cookie_path {
        return true;
    }

    if request_path.starts_with(cookie_path) {
        if cookie_path.ends_with('/') {
            return true;
        }
        return request_path.as_bytes().get(cookie_path.len()) == Some(&b'/');
    }

    false
}

/// RFC 6265 section 5.1.4 default-path.
pub fn default_path(request_path: &str) -> String {
    if !request_path.starts_with('/') {
        return "/".to_string();
    }
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

fn version_attribute(line: &str) -> Option<u32> {
    line.split(';').skip(1).find_map(|attr| {
        let (key, value) = attr.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("version") {
            value.trim().trim_matches('"').parse().ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_key() {
        let c = CanonicalCookie::new("sid", "1")
            .with_domain("example.com")
            .with_path("/app");
        assert_eq!(c.identity_key(), "sidexample.com/app");
    }

    #[test]
    fn test_expired_in_past() {
        let now = OffsetDateTime::now_utc();
        let c = CanonicalCookie::new("a", "b").with_expires(now - Duration::hours(1));
        assert!(c.is_expired(now));
        let c = CanonicalCookie::new("a", "b").with_expires(now + Duration::hours(1));
        assert!(!c.is_expired(now));
        assert!(CanonicalCookie::new("a", "b").is_session());
    }

    #[test]
    fn test_max_age_overrides_expires() {
        let now = OffsetDateTime::now_utc();
        let c = CanonicalCookie::new("a", "b")
            .with_expires(now + Duration::days(1))
            .with_max_age(0);
        assert!(c.is_expired(now));

        let c = CanonicalCookie::new("a", "b")
            .with_expires(now - Duration::days(1))
            .with_max_age(3600);
        assert!(!c.is_expired(now));
    }

    #[test]
    fn test_out_of_range_max_age_never_expires() {
        let now = OffsetDateTime::now_utc();
        let c = CanonicalCookie::new("a", "b").with_max_age(i64::MAX);
        assert_eq!(c.expiry(), None);
        assert!(!c.is_expired(now));
        assert!(!c.is_session());
    }

    #[test]
    fn test_valid_for_request() {
        let c = CanonicalCookie::new("a", "b")
            .with_domain("example.com")
            .with_path("/");
        assert!(c.is_valid_for_request("example.com", "/", false));
        assert!(c.is_valid_for_request("www.example.com", "/x", false));
        assert!(!c.is_valid_for_request("example.org", "/", false));

        let secure = c.clone().with_secure(true);
        assert!(!secure.is_valid_for_request("example.com", "/", false));
        assert!(secure.is_valid_for_request("example.com", "/", true));
    }

    #[test]
    fn test_host_only_requires_exact_host() {
        let c = CanonicalCookie::new("a", "b")
            .with_domain("example.com")
            .with_host_only(true);
        assert!(c.is_valid_for_request("example.com", "/", false));
        assert!(!c.is_valid_for_request("www.example.com", "/", false));
    }

    #[test]
    fn test_path_matches() {
        assert!(path_matches("/", "/anything"));
        assert!(path_matches("/foo", "/foo"));
        assert!(path_matches("/foo", "/foo/bar"));
        assert!(!path_matches("/foo", "/foobar"));
        assert!(!path_matches("/foo/bar", "/foo"));
    }

    #[test]
    fn test_default_path() {
        assert_eq!(default_path(""), "/");
        assert_eq!(default_path("/"), "/");
        assert_eq!(default_path("/page"), "/");
        assert_eq!(default_path("/dir/page"), "/dir");
        assert_eq!(default_path("/a/b/c"), "/a/b");
    }

    #[test]
    fn test_from_set_cookie_defaults() {
        let url = Url::parse("http://www.example.com/shop/cart").unwrap();
        let c = CanonicalCookie::from_set_cookie(&url, "cart=3; HttpOnly").unwrap();
        assert_eq!(c.domain, "www.example.com");
        assert!(c.host_only);
        assert_eq!(c.path, "/shop");
        assert!(c.http_only);
        assert!(!c.secure);
    }

    #[test]
    fn test_from_set_cookie_attributes() {
        let url = Url::parse("https://a.example.com/").unwrap();
        let c = CanonicalCookie::from_set_cookie(
            &url,
            "id=7; Domain=.example.com; Path=/; Secure; Max-Age=60; Version=1",
        )
        .unwrap();
        assert_eq!(c.domain, "example.com");
        assert!(!c.host_only);
        assert!(c.secure);
        assert_eq!(c.max_age, Some(60));
        assert_eq!(c.version, Some(1));
    }

    #[test]
    fn test_from_set_cookie_rejects_foreign_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert!(CanonicalCookie::from_set_cookie(&url, "a=b; Domain=other.com").is_err());
        assert!(CanonicalCookie::from_set_cookie(&url, "a=b; Domain=com").is_err());
    }

    #[test]
    fn test_from_set_cookie_malformed() {
        let url = Url::parse("https://example.com/").unwrap();
        let err = CanonicalCookie::from_set_cookie(&url, "no-equals-sign").unwrap_err();
        assert!(matches!(err, NetError::InvalidCookie(_)));
    }

    #[test]
    fn test_header_pair_encoding() {
        let c = CanonicalCookie::new("q", "a b;c");
        assert_eq!(c.header_pair(false), "q=a b;c");
        assert_eq!(c.header_pair(true), "q=a+b%3Bc");
    }
}
