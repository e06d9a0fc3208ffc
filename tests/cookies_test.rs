use clientnet::cookies::canonicalcookie::CanonicalCookie;
use clientnet::cookies::jar::CookieJar;
use http::header::SET_COOKIE;
use http::{HeaderMap, HeaderValue};
use time::{Duration, OffsetDateTime};
use url::Url;

#[test]
fn test_prepare_filters_secure_and_expired() {
    let mut jar = CookieJar::new();
    jar.add_cookie(CanonicalCookie::new("keep", "1").with_domain("example.com").with_path("/"));
    jar.add_cookie(
        CanonicalCookie::new("secret", "2")
            .with_domain("example.com")
            .with_path("/")
            .with_secure(true),
    );
    jar.add_cookie(
        CanonicalCookie::new("stale", "3")
            .with_domain("example.com")
            .with_path("/")
            .with_expires(OffsetDateTime::now_utc() - Duration::hours(1)),
    );

    assert_eq!(jar.prepare("example.com", "/", false, true), "keep=1");
    // Expired cookies are swept, secure ones stay for secure requests.
    assert_eq!(jar.len(), 2);
    assert_eq!(jar.prepare("example.com", "/", true, true), "keep=1; secret=2");
}

#[test]
fn test_parse_and_save() {
    let mut jar = CookieJar::new();
    let url = Url::parse("https://example.com/foo/bar").unwrap();
    assert!(jar.parse_and_save_cookie(&url, "foo=bar"));

    let cookie = jar.get_cookie(&url, "foo").unwrap();
    assert_eq!(cookie.value, "bar");
    assert_eq!(cookie.path, "/foo");
    assert!(cookie.host_only);
}

#[test]
fn test_domain_matching() {
    let mut jar = CookieJar::new();
    let url = Url::parse("https://a.example.com").unwrap();
    jar.parse_and_save_cookie(&url, "host=val");
    jar.parse_and_save_cookie(&url, "domain=val; Domain=example.com");

    assert_eq!(jar.prepare("a.example.com", "/", true, true), "host=val; domain=val");
    assert_eq!(jar.prepare("b.example.com", "/", true, true), "domain=val");
    assert_eq!(jar.prepare("example.com", "/", true, true), "domain=val");
    assert_eq!(jar.prepare("notexample.com", "/", true, true), "");
}

#[test]
fn test_public_suffix_domain_rejected() {
    let mut jar = CookieJar::new();
    let url = Url::parse("https://example.co.uk/").unwrap();
    assert!(!jar.parse_and_save_cookie(&url, "a=1; Domain=co.uk"));
    assert!(!jar.parse_and_save_cookie(&url, "b=1; Domain=other.co.uk"));
    assert!(jar.is_empty());
}

#[test]
fn test_add_cookie_str_reports_malformed() {
    let mut jar = CookieJar::new();
    let url = Url::parse("http://example.com/").unwrap();
    assert!(jar.add_cookie_str(&url, "novalue").is_err());
    assert!(jar.add_cookie_str(&url, "ok=1").is_ok());
    assert_eq!(jar.len(), 1);
}

#[test]
fn test_path_scoping() {
    let mut jar = CookieJar::new();
    jar.add_cookie(CanonicalCookie::new("api", "1").with_domain("example.com").with_path("/api"));

    assert_eq!(jar.prepare("example.com", "/api", false, true), "api=1");
    assert_eq!(jar.prepare("example.com", "/api/v1", false, true), "api=1");
    assert_eq!(jar.prepare("example.com", "/apix", false, true), "");
    assert_eq!(jar.prepare("example.com", "/", false, true), "");
}

#[test]
fn test_same_identity_replaces() {
    let mut jar = CookieJar::new();
    let url = Url::parse("http://example.com/").unwrap();
    jar.parse_and_save_cookie(&url, "sid=old; Path=/");
    jar.parse_and_save_cookie(&url, "sid=new; Path=/");
    assert_eq!(jar.len(), 1);
    assert_eq!(jar.prepare("example.com", "/", false, true), "sid=new");
}

#[test]
fn test_max_age_overrides_expires() {
    let mut jar = CookieJar::new();
    let url = Url::parse("http://example.com/").unwrap();
    jar.parse_and_save_cookie(
        &url,
        "gone=1; Max-Age=0; Expires=Wed, 01 Jan 2200 00:00:00 GMT",
    );
    jar.parse_and_save_cookie(
        &url,
        "live=1; Max-Age=3600; Expires=Wed, 01 Jan 2000 00:00:00 GMT",
    );

    assert_eq!(jar.prepare("example.com", "/", false, true), "live=1");
    assert_eq!(jar.len(), 1);
}

#[test]
fn test_store_response_cookies_skips_bad_lines() {
    let mut jar = CookieJar::new();
    let url = Url::parse("http://shop.example.com/cart").unwrap();
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, HeaderValue::from_static("cart=3; Path=/"));
    headers.append(SET_COOKIE, HeaderValue::from_static("bad"));
    headers.append(SET_COOKIE, HeaderValue::from_static("x=1; Domain=evil.com"));

    assert_eq!(jar.store_response_cookies(&url, &headers), 1);
    assert_eq!(jar.prepare("shop.example.com", "/", false, true), "cart=3");
}

#[test]
fn test_set_cookies_replaces_jar() {
    let mut jar = CookieJar::new();
    jar.add_cookie(CanonicalCookie::new("old", "1"));
    jar.set_cookies([("a", "1"), ("b", "2")]);
    assert_eq!(jar.len(), 2);
    assert_eq!(jar.prepare("any.host", "/deep/path", false, true), "a=1; b=2");
}

#[test]
fn test_value_encoding_flag() {
    let mut jar = CookieJar::new();
    jar.add_cookie(CanonicalCookie::new("q", "a=b c"));
    assert_eq!(jar.prepare("example.com", "/", false, true), "q=a%3Db+c");
    assert_eq!(jar.prepare("example.com", "/", false, false), "q=a=b c");
}

#[test]
fn test_huge_max_age_is_kept() {
    let mut jar = CookieJar::new();
    let url = Url::parse("http://example.com/").unwrap();
    assert!(jar.parse_and_save_cookie(&url, "a=1; Max-Age=9223372036854775807"));
    assert_eq!(jar.prepare("example.com", "/", false, true), "a=1");
    assert_eq!(jar.len(), 1);
}
