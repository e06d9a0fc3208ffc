//! Normalized client configuration.
//!
//! Option names are case and separator insensitive: `max_redirects`,
//! `MaxRedirects` and `max-redirects` all address the same `maxredirects`
//! entry. The store is merged incrementally and never replaced wholesale.

use crate::base::neterror::NetError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const MAX_REDIRECTS: &str = "maxredirects";
pub const STRICT_REDIRECTS: &str = "strictredirects";
pub const USER_AGENT: &str = "useragent";
pub const TIMEOUT: &str = "timeout";
pub const CONNECT_TIMEOUT: &str = "connecttimeout";
pub const HTTP_VERSION: &str = "httpversion";
pub const STORE_RESPONSE: &str = "storeresponse";
pub const KEEP_ALIVE: &str = "keepalive";
pub const OUTPUT_STREAM: &str = "outputstream";
pub const STREAM_TMP_DIR: &str = "streamtmpdir";
pub const ENCODE_COOKIES: &str = "encodecookies";
pub const ARG_SEPARATOR: &str = "argseparator";
pub const RFC3986_STRICT: &str = "rfc3986strict";
pub const SSL_VERIFY_PEER: &str = "sslverifypeer";

const DEFAULT_MAX_REDIRECTS: u32 = 5;
const DEFAULT_TIMEOUT_SECS: f64 = 10.0;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ConfigValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            ConfigValue::Int(i) => Some(*i != 0),
            ConfigValue::Float(_) => None,
            ConfigValue::Str(s) => match s.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Some(true),
                "" | "0" | "false" | "no" | "off" => Some(false),
                _ => None,
            },
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(i) => Some(*i),
            ConfigValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            ConfigValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Int(i) => Some(*i as f64),
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Str(s) => s.trim().parse().ok(),
            ConfigValue::Bool(_) => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(v.into())
    }
}

impl From<u32> for ConfigValue {
    fn from(v: u32) -> Self {
        ConfigValue::Int(v.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::Str(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::Str(v)
    }
}

/// HTTP protocol version written on the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpVersion {
    V1_0,
    #[default]
    V1_1,
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::V1_0 => "1.0",
            HttpVersion::V1_1 => "1.1",
        }
    }

    pub fn to_http(self) -> http::Version {
        match self {
            HttpVersion::V1_0 => http::Version::HTTP_10,
            HttpVersion::V1_1 => http::Version::HTTP_11,
        }
    }
}

impl FromStr for HttpVersion {
    type Err = NetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0" => Ok(HttpVersion::V1_0),
            "1.1" => Ok(HttpVersion::V1_1),
            _ => Err(NetError::InvalidConfig(HTTP_VERSION.to_string())),
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a response body is written when streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputStream {
    /// Buffer the body in memory.
    Disabled,
    /// Stream into an anonymous temp file removed when the response drops.
    TempFile,
    /// Stream into the named file, which is kept.
    Path(PathBuf),
}

/// Strip `-`, `_`, space and `.` and lower-case.
pub fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Normalized key/value configuration store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    values: BTreeMap<String, ConfigValue>,
}

impl Default for Config {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert(MAX_REDIRECTS.into(), ConfigValue::Int(DEFAULT_MAX_REDIRECTS.into()));
        values.insert(STRICT_REDIRECTS.into(), ConfigValue::Bool(false));
        values.insert(
            USER_AGENT.into(),
            ConfigValue::Str(format!("clientnet/{}", env!("CARGO_PKG_VERSION"))),
        );
        values.insert(TIMEOUT.into(), ConfigValue::Float(DEFAULT_TIMEOUT_SECS));
        values.insert(HTTP_VERSION.into(), ConfigValue::Str("1.1".into()));
        values.insert(STORE_RESPONSE.into(), ConfigValue::Bool(true));
        values.insert(KEEP_ALIVE.into(), ConfigValue::Bool(false));
        values.insert(OUTPUT_STREAM.into(), ConfigValue::Bool(false));
        values.insert(ENCODE_COOKIES.into(), ConfigValue::Bool(true));
        values.insert(ARG_SEPARATOR.into(), ConfigValue::Str("&".into()));
        values.insert(RFC3986_STRICT.into(), ConfigValue::Bool(false));
        values.insert(SSL_VERIFY_PEER.into(), ConfigValue::Bool(true));
        Self { values }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a JSON object and merge them over the defaults.
    pub fn from_json(json: &str) -> Result<Self, NetError> {
        let parsed: BTreeMap<String, ConfigValue> =
            serde_json::from_str(json).map_err(|_| NetError::JsonParseError)?;
        let mut config = Self::default();
        config.merge(parsed)?;
        Ok(config)
    }

    /// Set a single option.
    pub fn set<K: AsRef<str>, V: Into<ConfigValue>>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<(), NetError> {
        let key = normalize_key(key.as_ref());
        let value = value.into();

        if key == HTTP_VERSION {
            let version = match &value {
                ConfigValue::Str(s) => s.parse::<HttpVersion>()?,
                ConfigValue::Float(f) if *f == 1.0 => HttpVersion::V1_0,
                ConfigValue::Float(f) if *f == 1.1 => HttpVersion::V1_1,
                _ => return Err(NetError::InvalidConfig(key)),
            };
            self.values
                .insert(key, ConfigValue::Str(version.as_str().to_string()));
            return Ok(());
        }

        self.values.insert(key, value);
        Ok(())
    }

    /// Merge a set of options over the current ones.
    pub fn merge<I, K, V>(&mut self, options: I) -> Result<(), NetError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<ConfigValue>,
    {
        for (key, value) in options {
            self.set(key, value)?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(&normalize_key(key))
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.values.remove(&normalize_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            None => default,
            Some(v) => v.as_bool().unwrap_or_else(|| {
                tracing::warn!(key, value = ?v, "config value is not a boolean, using default");
                default
            }),
        }
    }

    pub fn max_redirects(&self) -> u32 {
        match self.values.get(MAX_REDIRECTS) {
            None => DEFAULT_MAX_REDIRECTS,
            Some(v) => match v.as_int() {
                Some(n) => n.clamp(0, u32::MAX as i64) as u32,
                None => {
                    tracing::warn!(value = ?v, "maxredirects is not an integer, using default");
                    DEFAULT_MAX_REDIRECTS
                }
            },
        }
    }

    pub fn strict_redirects(&self) -> bool {
        self.bool_or(STRICT_REDIRECTS, false)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.values.get(USER_AGENT).and_then(ConfigValue::as_str)
    }

    pub fn timeout(&self) -> Duration {
        self.duration(TIMEOUT)
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    /// Connect timeout, falling back to the general timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.duration(CONNECT_TIMEOUT)
            .unwrap_or_else(|| self.timeout())
    }

    /// Positive seconds value as a `Duration`; `None` when unset or unusable.
    fn duration(&self, key: &str) -> Option<Duration> {
        let v = self.values.get(key)?;
        let duration = v
            .as_float()
            .filter(|s| *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok());
        if duration.is_none() {
            tracing::warn!(key, value = ?v, "config value is not a usable duration, using default");
        }
        duration
    }

    pub fn http_version(&self) -> HttpVersion {
        self.values
            .get(HTTP_VERSION)
            .and_then(ConfigValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    pub fn store_response(&self) -> bool {
        self.bool_or(STORE_RESPONSE, true)
    }

    pub fn keep_alive(&self) -> bool {
        self.bool_or(KEEP_ALIVE, false)
    }

    /// `outputstream` is either a boolean or a file path.
    pub fn output_stream(&self) -> OutputStream {
        match self.values.get(OUTPUT_STREAM) {
            None => OutputStream::Disabled,
            Some(ConfigValue::Str(path)) if !path.is_empty() && path.as_str().parse::<bool>().is_err() => {
                OutputStream::Path(PathBuf::from(path))
            }
            Some(v) => {
                if v.as_bool().unwrap_or(false) {
                    OutputStream::TempFile
                } else {
                    OutputStream::Disabled
                }
            }
        }
    }

    pub fn stream_tmp_dir(&self) -> Option<PathBuf> {
        self.values
            .get(STREAM_TMP_DIR)
            .and_then(ConfigValue::as_str)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    pub fn encode_cookies(&self) -> bool {
        self.bool_or(ENCODE_COOKIES, true)
    }

    pub fn arg_separator(&self) -> &str {
        self.values
            .get(ARG_SEPARATOR)
            .and_then(ConfigValue::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or("&")
    }

    pub fn rfc3986_strict(&self) -> bool {
        self.bool_or(RFC3986_STRICT, false)
    }

    pub fn ssl_verify_peer(&self) -> bool {
        self.bool_or(SSL_VERIFY_PEER, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Max-Redirects"), "maxredirects");
        assert_eq!(normalize_key("max_redirects"), "maxredirects");
        assert_eq!(normalize_key("MAX REDIRECTS"), "maxredirects");
        assert_eq!(normalize_key("max.redirects"), "maxredirects");
    }

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.max_redirects(), 5);
        assert!(!config.strict_redirects());
        assert_eq!(config.http_version(), HttpVersion::V1_1);
        assert!(config.store_response());
        assert!(!config.keep_alive());
        assert_eq!(config.output_stream(), OutputStream::Disabled);
        assert!(config.encode_cookies());
        assert_eq!(config.arg_separator(), "&");
        assert!(!config.rfc3986_strict());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.user_agent().unwrap().starts_with("clientnet/"));
    }

    #[test]
    fn test_separator_insensitive_set() {
        let mut config = Config::new();
        config.set("Max_Redirects", 2).unwrap();
        assert_eq!(config.max_redirects(), 2);
        config.set("max-redirects", 7).unwrap();
        assert_eq!(config.max_redirects(), 7);
        assert_eq!(config.get("MAXREDIRECTS"), Some(&ConfigValue::Int(7)));
    }

    #[test]
    fn test_merge_is_incremental() {
        let mut config = Config::new();
        config
            .merge([("keep-alive", ConfigValue::Bool(true))])
            .unwrap();
        config
            .merge([("strict_redirects", ConfigValue::Bool(true))])
            .unwrap();
        assert!(config.keep_alive());
        assert!(config.strict_redirects());
        assert_eq!(config.max_redirects(), 5);
    }

    #[test]
    fn test_coercion() {
        let mut config = Config::new();
        config.set("maxredirects", "3").unwrap();
        config.set("keepalive", 1).unwrap();
        assert_eq!(config.max_redirects(), 3);
        assert!(config.keep_alive());

        config.set("maxredirects", "lots").unwrap();
        assert_eq!(config.max_redirects(), 5);
    }

    #[test]
    fn test_http_version_validation() {
        let mut config = Config::new();
        config.set("httpversion", "1.0").unwrap();
        assert_eq!(config.http_version(), HttpVersion::V1_0);
        assert!(matches!(
            config.set("httpversion", "2.0"),
            Err(NetError::InvalidConfig(_))
        ));
        assert_eq!(config.http_version(), HttpVersion::V1_0);
    }

    #[test]
    fn test_output_stream_variants() {
        let mut config = Config::new();
        config.set("outputstream", true).unwrap();
        assert_eq!(config.output_stream(), OutputStream::TempFile);
        config.set("outputstream", "/tmp/body.bin").unwrap();
        assert_eq!(
            config.output_stream(),
            OutputStream::Path(PathBuf::from("/tmp/body.bin"))
        );
        config.set("outputstream", false).unwrap();
        assert_eq!(config.output_stream(), OutputStream::Disabled);
    }

    #[test]
    fn test_connect_timeout_falls_back() {
        let mut config = Config::new();
        config.set("timeout", 3).unwrap();
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        config.set("connect_timeout", 1.5).unwrap();
        assert_eq!(config.connect_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_out_of_range_timeout_uses_default() {
        let mut config = Config::new();
        config.set("timeout", 1e30).unwrap();
        config.set("connecttimeout", f64::INFINITY).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));

        config.set("timeout", -2.0).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_from_json() {
        let config =
            Config::from_json(r#"{"MaxRedirects": 2, "user-agent": "loader/1.0", "keepalive": true}"#)
                .unwrap();
        assert_eq!(config.max_redirects(), 2);
        assert_eq!(config.user_agent(), Some("loader/1.0"));
        assert!(config.keep_alive());
        assert!(config.encode_cookies());
    }
}
