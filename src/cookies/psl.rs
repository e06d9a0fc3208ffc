//! Public Suffix List (PSL) validation and host/domain matching.
//!
//! Rejects cookies set on public suffixes like `.com` or `.co.uk`, and
//! provides the suffix-with-dot-boundary match shared by cookie scoping and
//! the credential host-change rule.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use psl::{List, Psl};

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_ascii_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        None => false,
    }
}

/// True if `host` equals `domain` or is a subdomain of it.
///
/// Comparison is ASCII case-insensitive and a leading dot on `domain` is
/// ignored. `"a.example.com"` matches `"example.com"`, `"badexample.com"`
/// does not.
pub fn host_matches_domain(host: &str, domain: &str) -> bool {
    let domain = domain.strip_prefix('.').unwrap_or(domain);
    if domain.is_empty() || host.is_empty() {
        return false;
    }
    if host.eq_ignore_ascii_case(domain) {
        return true;
    }
    if host.len() > domain.len() {
        let split = host.len() - domain.len();
        return host.is_char_boundary(split)
            && host[split..].eq_ignore_ascii_case(domain)
            && host.as_bytes()[split - 1] == b'.';
    }
    false
}

/// Check if a cookie domain attribute is acceptable for a response from
/// `url_host`: it must not be a public suffix, and the host must equal or
/// be a subdomain of it.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);

    if is_public_suffix(cookie_domain) {
        return false;
    }

    host_matches_domain(url_host, cookie_domain)
}
