use crate::base::neterror::NetError;
use crate::cookies::canonicalcookie::CanonicalCookie;
use http::header::SET_COOKIE;
use http::HeaderMap;
use time::OffsetDateTime;
use url::Url;

/// Client-owned cookie store.
///
/// Cookies are kept in insertion order and identified by
/// name + domain + path; adding a cookie with an existing identity replaces
/// it in place. Expired cookies are swept lazily by [`CookieJar::prepare`].
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<CanonicalCookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a cookie under its identity key. Freshness is not checked here.
    pub fn add_cookie(&mut self, cookie: CanonicalCookie) {
        let key = cookie.identity_key();
        match self.cookies.iter_mut().find(|c| c.identity_key() == key) {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    /// Parse and store a Set-Cookie style line supplied by the caller.
    pub fn add_cookie_str(&mut self, url: &Url, line: &str) -> Result<(), NetError> {
        let cookie = CanonicalCookie::from_set_cookie(url, line)?;
        self.add_cookie(cookie);
        Ok(())
    }

    /// Store a Set-Cookie line received from a server. Returns whether it
    /// was accepted.
    pub fn parse_and_save_cookie(&mut self, url: &Url, line: &str) -> bool {
        match CanonicalCookie::from_set_cookie(url, line) {
            Ok(cookie) => {
                tracing::trace!(name = %cookie.name, domain = %cookie.domain, "storing cookie");
                self.add_cookie(cookie);
                true
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "ignoring Set-Cookie");
                false
            }
        }
    }

    /// Store every Set-Cookie header of a response.
    pub fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap) -> usize {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter(|line| self.parse_and_save_cookie(url, line))
            .count()
    }

    /// Replace the jar with simple name/value cookies.
    pub fn set_cookies<I, K, V>(&mut self, pairs: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.cookies.clear();
        for (name, value) in pairs {
            self.add_cookie(CanonicalCookie::new(name, value));
        }
    }

    /// Cookies applicable to the request, without sweeping.
    pub fn matching_cookies(&self, domain: &str, path: &str, secure: bool) -> Vec<&CanonicalCookie> {
        let now = OffsetDateTime::now_utc();
        self.cookies
            .iter()
            .filter(|c| !c.is_expired(now) && c.is_valid_for_request(domain, path, secure))
            .collect()
    }

    /// First cookie named `name` that would be sent to `url`.
    pub fn get_cookie(&self, url: &Url, name: &str) -> Option<&CanonicalCookie> {
        let secure = url.scheme() == "https";
        self.matching_cookies(url.host_str().unwrap_or(""), url.path(), secure)
            .into_iter()
            .find(|c| c.name == name)
    }

    /// Compute the Cookie header value for a request.
    ///
    /// Expired cookies are removed from the jar. On duplicate names the later
    /// cookie's value wins but keeps the earlier position. Returns an empty
    /// string when nothing applies.
    pub fn prepare(&mut self, domain: &str, path: &str, secure: bool, encode_values: bool) -> String {
        let now = OffsetDateTime::now_utc();
        let before = self.cookies.len();
        self.cookies.retain(|c| !c.is_expired(now));
        if self.cookies.len() != before {
            tracing::trace!(removed = before - self.cookies.len(), "swept expired cookies");
        }

        let mut selected: Vec<(&str, String)> = Vec::new();
        for cookie in self
            .cookies
            .iter()
            .filter(|c| c.is_valid_for_request(domain, path, secure))
        {
            let pair = cookie.header_pair(encode_values);
            match selected.iter_mut().find(|(name, _)| *name == cookie.name) {
                Some(slot) => slot.1 = pair,
                None => selected.push((cookie.name.as_str(), pair)),
            }
        }

        selected
            .into_iter()
            .map(|(_, pair)| pair)
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalCookie> {
        self.cookies.iter()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }
}
