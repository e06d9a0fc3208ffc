//! Cookie storage and scoping.
//!
//! | Type | Responsibility |
//! |------|----------------|
//! | [`CookieJar`](jar::CookieJar) | Client-owned store, Cookie header preparation |
//! | [`CanonicalCookie`](canonicalcookie::CanonicalCookie) | Single cookie with expiry and scoping rules |
//! | [`psl`] | Public suffix checks and domain matching |
//!
//! ```rust
//! use clientnet::cookies::canonicalcookie::CanonicalCookie;
//! use clientnet::cookies::jar::CookieJar;
//!
//! let mut jar = CookieJar::new();
//! jar.add_cookie(CanonicalCookie::new("sid", "42").with_domain("example.com").with_path("/"));
//! assert_eq!(jar.prepare("www.example.com", "/", false, true), "sid=42");
//! ```

pub mod canonicalcookie;
pub mod jar;
pub mod psl;
