//! URL decoding and encoding.
//!
//! Converts between a raw URL string and the structured [`ParsedUrl`]
//! fields the editor works with. Both directions are pure.
//!
//! # Query Handling
//!
//! - Keys and values are percent-decoded on read, `+` reads as a space
//! - A token that is not valid UTF-8 once decoded is kept raw
//! - Keys are unique: the first occurrence keeps its position, the last
//!   occurrence supplies the value
//! - On write every key and value is percent-encoded
//!
//! # Round Trip
//!
//! `decode(encode(decode(s)))` equals `decode(s)` for every accepted `s`.
//! The raw strings may differ since equivalent percent-encodings exist.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Schemes that cannot exist without a host.
const HOST_REQUIRED_SCHEMES: &[&str] = &["http", "https", "ws", "wss", "ftp"];

/// Characters that would split a host out of the authority.
const HOST_FORBIDDEN: &[char] = &['/', '?', '#', '@', '\\', ' '];

// ============================================================================
// ParsedUrl
// ============================================================================

/// Structured view of a URL.
///
/// Always regenerated from a raw string; never the source of truth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Scheme without the trailing `:`.
    pub scheme: String,

    /// Host, with `:port` when the port is not the scheme default.
    pub host: String,

    /// Path in its serialized (percent-encoded) form.
    pub path: String,

    /// Fragment without the leading `#`.
    pub fragment: String,

    /// Decoded query parameters in URL order.
    pub params: Vec<(String, String)>,
}

impl ParsedUrl {
    /// Looks up a parameter value by key.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Parses a raw URL into structured fields.
///
/// # Errors
///
/// Returns [`Error::MalformedUrl`] if `raw` is not an absolute URI.
pub fn decode(raw: &str) -> Result<ParsedUrl> {
    let url = Url::parse(raw).map_err(|e| Error::malformed_url(raw, e.to_string()))?;

    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    };

    Ok(ParsedUrl {
        scheme: url.scheme().to_string(),
        host,
        path: url.path().to_string(),
        fragment: url.fragment().unwrap_or_default().to_string(),
        params: decode_query(url.query().unwrap_or_default()),
    })
}

/// Splits a raw query string into unique, decoded pairs.
fn decode_query(query: &str) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();
    let mut positions: FxHashMap<String, usize> = FxHashMap::default();

    for token in query.split('&').filter(|t| !t.is_empty()) {
        let (raw_key, raw_value) = token.split_once('=').unwrap_or((token, ""));
        let key = decode_component(raw_key);
        let value = decode_component(raw_value);

        match positions.get(&key) {
            Some(&index) => params[index].1 = value,
            None => {
                positions.insert(key.clone(), params.len());
                params.push((key, value));
            }
        }
    }

    params
}

/// Percent-decodes one query component, falling back to the raw token.
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Serializes structured fields into a URL string.
///
/// Empty params and an empty fragment are omitted.
///
/// # Errors
///
/// Returns [`Error::MalformedUrl`] if the fields do not form a valid URL,
/// e.g. an empty host on `https` or a host containing `/`.
pub fn encode(fields: &ParsedUrl) -> Result<String> {
    let mut url = if fields.host.is_empty() {
        build_hostless(fields)?
    } else {
        build_with_host(fields)?
    };

    let query = encode_query(&fields.params);
    url.set_query((!query.is_empty()).then_some(query.as_str()));
    url.set_fragment((!fields.fragment.is_empty()).then_some(fields.fragment.as_str()));

    Ok(url.into())
}

/// Builds `scheme://host` then applies the path.
fn build_with_host(fields: &ParsedUrl) -> Result<Url> {
    if fields.host.contains(HOST_FORBIDDEN) {
        return Err(Error::malformed_url(
            &fields.host,
            "host contains a reserved character",
        ));
    }

    let authority = format!("{}://{}", fields.scheme, fields.host);
    let mut url = Url::parse(&authority).map_err(|e| Error::malformed_url(&authority, e.to_string()))?;
    url.set_path(&fields.path);
    Ok(url)
}

/// Builds `scheme:path` for URLs without an authority.
fn build_hostless(fields: &ParsedUrl) -> Result<Url> {
    if HOST_REQUIRED_SCHEMES.contains(&fields.scheme.as_str()) {
        return Err(Error::malformed_url(
            format!("{}:{}", fields.scheme, fields.path),
            "scheme requires a host",
        ));
    }

    let mut path = fields.path.replace('?', "%3F").replace('#', "%23");
    // `scheme://p` would read `p` as a host.
    if path.starts_with("//") {
        path.insert_str(0, "/.");
    }
    let raw = format!("{}:{}", fields.scheme, path);
    Url::parse(&raw).map_err(|e| Error::malformed_url(&raw, e.to_string()))
}

/// Joins pairs into an encoded query string.
fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_decode_basic() {
        let parsed = decode("https://x.com/p?a=1&b=2#frag").expect("decode");
        assert_eq!(parsed.scheme, "https");
        assert_eq!(parsed.host, "x.com");
        assert_eq!(parsed.path, "/p");
        assert_eq!(parsed.fragment, "frag");
        assert_eq!(parsed.params, pairs(&[("a", "1"), ("b", "2")]));
        assert_eq!(parsed.param("b"), Some("2"));
    }

    #[test]
    fn test_decode_keeps_non_default_port() {
        assert_eq!(decode("http://x.com:8080/").expect("decode").host, "x.com:8080");
        assert_eq!(decode("https://x.com:443/").expect("decode").host, "x.com");
    }

    #[test]
    fn test_decode_rejects_relative() {
        let err = decode("not a url").unwrap_err();
        assert!(matches!(err, Error::MalformedUrl { .. }));
    }

    #[test]
    fn test_decode_percent_and_plus() {
        let parsed = decode("https://x.com/?q=a+b%20c&name=%E4%BD%A0").expect("decode");
        assert_eq!(parsed.param("q"), Some("a b c"));
        assert_eq!(parsed.param("name"), Some("你"));
    }

    #[test]
    fn test_decode_falls_back_to_raw_token() {
        let parsed = decode("https://x.com/?bad=%FF&ok=1").expect("decode");
        assert_eq!(parsed.param("bad"), Some("%FF"));
        assert_eq!(parsed.param("ok"), Some("1"));
    }

    #[test]
    fn test_decode_duplicate_keys_collapse() {
        let parsed = decode("https://x.com/?a=1&b=2&a=3").expect("decode");
        assert_eq!(parsed.params, pairs(&[("a", "3"), ("b", "2")]));
    }

    #[test]
    fn test_decode_key_without_value() {
        let parsed = decode("https://x.com/?flag&&x=").expect("decode");
        assert_eq!(parsed.params, pairs(&[("flag", ""), ("x", "")]));
    }

    #[test]
    fn test_encode_basic() {
        let fields = ParsedUrl {
            scheme: "https".into(),
            host: "x.com".into(),
            path: "/p".into(),
            fragment: "frag".into(),
            params: pairs(&[("a", "1"), ("q", "a b&c")]),
        };
        assert_eq!(
            encode(&fields).expect("encode"),
            "https://x.com/p?a=1&q=a%20b%26c#frag"
        );
    }

    #[test]
    fn test_encode_omits_empty_parts() {
        let fields = ParsedUrl {
            scheme: "https".into(),
            host: "x.com".into(),
            path: "/".into(),
            ..ParsedUrl::default()
        };
        assert_eq!(encode(&fields).expect("encode"), "https://x.com/");
    }

    #[test]
    fn test_encode_rejects_bad_host() {
        let mut fields = decode("https://x.com/").expect("decode");
        fields.host = "x.com/evil".into();
        assert!(encode(&fields).is_err());

        fields.host = String::new();
        assert!(encode(&fields).is_err());
    }

    #[test]
    fn test_hostless_round_trip() {
        for raw in ["mailto:someone@example.com?subject=hi", "file:///etc/hosts", "foo:/bar", "foo:/.//p"] {
            let first = decode(raw).expect("decode");
            let second = decode(&encode(&first).expect("encode")).expect("re-decode");
            assert_eq!(first, second, "{raw}");
        }
    }

    #[test]
    fn test_hostless_double_slash_path_stays_a_path() {
        let fields = decode("foo:/.//p").expect("decode");
        assert_eq!(fields.host, "");
        assert_eq!(fields.path, "//p");

        let encoded = encode(&fields).expect("encode");
        assert_eq!(encoded, "foo:/.//p");
        assert_eq!(decode(&encoded).expect("re-decode").path, "//p");
    }

    #[test]
    fn test_round_trip_raw_fallback() {
        let first = decode("https://x.com/?k=%C3+&v=%zz").expect("decode");
        let encoded = encode(&first).expect("encode");
        assert_eq!(decode(&encoded).expect("re-decode"), first);
    }

    fn component() -> impl Strategy<Value = String> {
        prop_oneof![
            "\\PC{0,6}",
            "[a-z%+=&]{1,6}",
        ]
    }

    proptest! {
        #[test]
        fn prop_round_trip_structured(
            https in any::<bool>(),
            host in "[a-z]{1,10}\\.(com|org|net)",
            port in proptest::option::of(1024u16..65000),
            segments in proptest::collection::vec("[a-zA-Z0-9_~-]{1,6}", 0..4),
            params in proptest::collection::vec((component(), component()), 0..5),
            fragment in "[a-zA-Z0-9]{0,6}",
        ) {
            let scheme = if https { "https" } else { "http" };
            let authority = match port {
                Some(port) => format!("{host}:{port}"),
                None => host,
            };
            let query = params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            let raw = format!(
                "{scheme}://{authority}/{}?{query}#{fragment}",
                segments.join("/")
            );

            let first = decode(&raw).expect("generated URL decodes");
            let encoded = encode(&first).expect("decoded fields encode");
            prop_assert_eq!(decode(&encoded).expect("re-decode"), first);
        }

        #[test]
        fn prop_round_trip_arbitrary_tail(tail in "[ -~]{0,40}") {
            let raw = format!("https://x.com/p?{tail}");
            if let Ok(first) = decode(&raw) {
                let encoded = encode(&first).expect("decoded fields encode");
                prop_assert_eq!(decode(&encoded).expect("re-decode"), first);
            }
        }
    }
}
