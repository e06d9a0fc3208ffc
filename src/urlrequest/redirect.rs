//! Redirect decisions and `Location` resolution.
//!
//! A [`RedirectState`] lives for one `send` call. Each response is fed to
//! [`RedirectState::on_response`], which either finishes the loop or returns
//! the [`RedirectAction`] to apply before the next round-trip.

use crate::base::neterror::NetError;
use http::StatusCode;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPhase {
    #[default]
    Initial,
    Redirected,
    Done,
}

/// What to do with the next request after a redirect response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectAction {
    pub status: StatusCode,
    pub location: String,
    /// Drop parameters and body and switch to GET.
    pub reset_to_get: bool,
}

/// Redirect bookkeeping for a single send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectState {
    counter: u32,
    max_redirects: u32,
    strict: bool,
    phase: RedirectPhase,
}

impl RedirectState {
    pub fn new(max_redirects: u32, strict: bool) -> Self {
        Self {
            counter: 0,
            max_redirects,
            strict,
            phase: RedirectPhase::Initial,
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn phase(&self) -> RedirectPhase {
        self.phase
    }

    /// Decide whether `status`/`location` continue the loop.
    ///
    /// Fails with `TooManyRedirects` once the count of followed redirects
    /// exceeds the limit.
    pub fn on_response(
        &mut self,
        status: StatusCode,
        location: Option<&str>,
    ) -> Result<Option<RedirectAction>, NetError> {
        let location = match location {
            Some(l) if status.is_redirection() && !l.trim().is_empty() => l.trim(),
            _ => {
                self.phase = RedirectPhase::Done;
                return Ok(None);
            }
        };

        self.counter += 1;
        if self.counter > self.max_redirects {
            return Err(NetError::TooManyRedirects);
        }
        self.phase = RedirectPhase::Redirected;

        Ok(Some(RedirectAction {
            status,
            location: location.to_string(),
            reset_to_get: must_reset_to_get(status, self.strict),
        }))
    }
}

/// 303 always switches to GET; 301 and 302 do unless redirects are strict.
pub fn must_reset_to_get(status: StatusCode, strict: bool) -> bool {
    status == StatusCode::SEE_OTHER
        || (!strict && matches!(status, StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND))
}

/// `http://` and `https://` locations replace the URI wholesale.
pub fn is_absolute_location(location: &str) -> bool {
    let lower = location.get(..8).unwrap_or(location).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve a `Location` against the current URI.
///
/// Absolute locations are parsed as-is. Otherwise the query is split off;
/// a path starting with `/` replaces the current path and anything else is
/// appended to the current path's directory.
pub fn resolve_location(current: &Url, location: &str) -> Result<Url, NetError> {
    if is_absolute_location(location) {
        return Url::parse(location).map_err(|_| NetError::InvalidUrl);
    }

    let (path, query) = match location.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (location, None),
    };

    let mut next = current.clone();
    if path.starts_with('/') {
        next.set_path(path);
    } else if !path.is_empty() {
        let current_path = current.path();
        let dir = match current_path.rfind('/') {
            Some(idx) => &current_path[..idx],
            None => "",
        };
        next.set_path(&format!("{}/{}", dir.trim_end_matches('/'), path));
    }
    next.set_query(query);
    next.set_fragment(None);
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_absolute_path_location() {
        let next = resolve_location(&url("http://h/old/page"), "/new").unwrap();
        assert_eq!(next.as_str(), "http://h/new");
    }

    #[test]
    fn test_relative_location() {
        let next = resolve_location(&url("http://h/old/page"), "sibling").unwrap();
        assert_eq!(next.as_str(), "http://h/old/sibling");
        let next = resolve_location(&url("http://h/old/"), "x").unwrap();
        assert_eq!(next.as_str(), "http://h/old/x");
        let next = resolve_location(&url("http://h/page"), "x").unwrap();
        assert_eq!(next.as_str(), "http://h/x");
    }

    #[test]
    fn test_location_query_replaces_query() {
        let next = resolve_location(&url("http://h/a?old=1"), "/b?new=2").unwrap();
        assert_eq!(next.as_str(), "http://h/b?new=2");
        let next = resolve_location(&url("http://h/a?old=1"), "/b").unwrap();
        assert_eq!(next.as_str(), "http://h/b");
    }

    #[test]
    fn test_absolute_location() {
        assert!(is_absolute_location("HTTPS://other/x"));
        assert!(!is_absolute_location("/x"));
        let next = resolve_location(&url("http://h/a"), "https://other.com:8443/x").unwrap();
        assert_eq!(next.as_str(), "https://other.com:8443/x");
    }

    #[test]
    fn test_reset_rules() {
        assert!(must_reset_to_get(StatusCode::SEE_OTHER, true));
        assert!(must_reset_to_get(StatusCode::SEE_OTHER, false));
        assert!(must_reset_to_get(StatusCode::FOUND, false));
        assert!(!must_reset_to_get(StatusCode::FOUND, true));
        assert!(must_reset_to_get(StatusCode::MOVED_PERMANENTLY, false));
        assert!(!must_reset_to_get(StatusCode::TEMPORARY_REDIRECT, false));
        assert!(!must_reset_to_get(StatusCode::PERMANENT_REDIRECT, false));
    }

    #[test]
    fn test_limit() {
        let mut state = RedirectState::new(5, false);
        for _ in 0..5 {
            assert!(state.on_response(StatusCode::FOUND, Some("/x")).unwrap().is_some());
        }
        assert_eq!(state.counter(), 5);
        assert_eq!(
            state.on_response(StatusCode::FOUND, Some("/x")),
            Err(NetError::TooManyRedirects)
        );
    }

    #[test]
    fn test_done_without_location() {
        let mut state = RedirectState::new(5, false);
        assert_eq!(state.phase(), RedirectPhase::Initial);
        assert_eq!(state.on_response(StatusCode::FOUND, None).unwrap(), None);
        assert_eq!(state.phase(), RedirectPhase::Done);

        let mut state = RedirectState::new(5, false);
        let action = state
            .on_response(StatusCode::TEMPORARY_REDIRECT, Some("/y"))
            .unwrap()
            .unwrap();
        assert!(!action.reset_to_get);
        assert_eq!(state.phase(), RedirectPhase::Redirected);
        assert_eq!(state.on_response(StatusCode::OK, Some("/z")).unwrap(), None);
        assert_eq!(state.phase(), RedirectPhase::Done);
    }
}
