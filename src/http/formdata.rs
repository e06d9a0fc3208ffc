//! Request parameters and URL-encoded bodies.
//!
//! Parameters form a tree: a [`ParamValue`] is a scalar, a sequence or a
//! keyed map. [`flatten`] walks the tree into bracketed keys
//! (`tags[]`, `user[name]`) in insertion order, the shape expected by
//! form-processing servers.

use std::fmt;

/// Leaf parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Str(s) => f.write_str(s),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

/// A parameter: scalar, sequence or nested map.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(Scalar),
    Sequence(Vec<ParamValue>),
    Map(Params),
}

macro_rules! scalar_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for Scalar {
                fn from(v: $t) -> Self {
                    Scalar::$variant(v.into())
                }
            }

            impl From<$t> for ParamValue {
                fn from(v: $t) -> Self {
                    ParamValue::Scalar(Scalar::$variant(v.into()))
                }
            }
        )*
    };
}

scalar_from! {
    &str => Str,
    String => Str,
    i64 => Int,
    i32 => Int,
    u32 => Int,
    f64 => Float,
    bool => Bool,
}

impl From<Scalar> for ParamValue {
    fn from(v: Scalar) -> Self {
        ParamValue::Scalar(v)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(v: Vec<T>) -> Self {
        ParamValue::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<Params> for ParamValue {
    fn from(v: Params) -> Self {
        ParamValue::Map(v)
    }
}

/// Insertion-ordered parameter map. Setting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// Flatten nested parameters into `(key, leaf)` pairs.
///
/// Top-level keys are used as-is (or as `prefix[key]` when a prefix is
/// given), sequence children become `key[]` and map children `key[sub]`.
pub fn flatten(params: &Params, prefix: Option<&str>) -> Vec<(String, Scalar)> {
    let mut out = Vec::new();
    for (key, value) in params.iter() {
        let name = match prefix {
            Some(p) => format!("{}[{}]", p, key),
            None => key.to_string(),
        };
        flatten_value(&name, value, &mut out);
    }
    out
}

fn flatten_value(name: &str, value: &ParamValue, out: &mut Vec<(String, Scalar)>) {
    match value {
        ParamValue::Scalar(s) => out.push((name.to_string(), s.clone())),
        ParamValue::Sequence(items) => {
            let child = format!("{}[]", name);
            for item in items {
                flatten_value(&child, item, out);
            }
        }
        ParamValue::Map(map) => out.extend(flatten(map, Some(name))),
    }
}

/// `application/x-www-form-urlencoded` body joined with `&`.
pub fn url_encode(params: &Params) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in flatten(params, None) {
        serializer.append_pair(&key, &value.to_string());
    }
    serializer.finish()
}

/// Query string with a custom separator. With `rfc3986_strict`, spaces are
/// written as `%20` instead of `+`.
pub fn build_query(params: &Params, separator: &str, rfc3986_strict: bool) -> String {
    let encode = |s: &str| -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(s.as_bytes()).collect();
        if rfc3986_strict {
            encoded.replace('+', "%20")
        } else {
            encoded
        }
    };

    flatten(params, None)
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(&v.to_string())))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_nested() {
        let params = Params::new()
            .with("a", 1)
            .with("b", vec![2, 3])
            .with("c", Params::new().with("d", 4));
        let flat = flatten(&params, None);
        assert_eq!(
            flat,
            vec![
                ("a".to_string(), Scalar::Int(1)),
                ("b[]".to_string(), Scalar::Int(2)),
                ("b[]".to_string(), Scalar::Int(3)),
                ("c[d]".to_string(), Scalar::Int(4)),
            ]
        );
    }

    #[test]
    fn test_flatten_with_prefix() {
        let params = Params::new().with("x", "y");
        assert_eq!(
            flatten(&params, Some("p")),
            vec![("p[x]".to_string(), Scalar::Str("y".into()))]
        );
    }

    #[test]
    fn test_flatten_deep() {
        let params = Params::new().with(
            "user",
            Params::new().with("roles", vec!["admin", "dev"]),
        );
        let keys: Vec<String> = flatten(&params, None).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["user[roles][]", "user[roles][]"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut params = Params::new().with("a", 1).with("b", 2);
        params.insert("a", 3);
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(params.get("a"), Some(&ParamValue::from(3)));
    }

    #[test]
    fn test_url_encode() {
        let params = Params::new().with("name", "a b&c").with("ok", true);
        assert_eq!(url_encode(&params), "name=a+b%26c&ok=1");
    }

    #[test]
    fn test_url_encode_brackets() {
        let params = Params::new().with("b", vec![1]);
        assert_eq!(url_encode(&params), "b%5B%5D=1");
    }

    #[test]
    fn test_build_query_separator_and_strict() {
        let params = Params::new().with("q", "x y").with("n", 2);
        assert_eq!(build_query(&params, "&", false), "q=x+y&n=2");
        assert_eq!(build_query(&params, ";", true), "q=x%20y;n=2");
    }
}
