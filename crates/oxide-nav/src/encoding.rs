//! Percent-encoding helpers for params and query strings.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::warn;
use url::form_urlencoded;

use crate::location::{Query, QueryValue};

/// Characters left untouched by URI-component encoding.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encodes a single param value so it can be spliced into a path.
///
/// # Example
///
/// ```
/// use oxide_nav::encoding::encode_param;
///
/// assert_eq!(encode_param("c++"), "c%2B%2B");
/// assert_eq!(encode_param(42), "42");
/// ```
pub fn encode_param(value: impl ToString) -> String {
    utf8_percent_encode(&value.to_string(), URI_COMPONENT).to_string()
}

/// Percent-decodes `text`, falling back to the raw text when it is not valid
/// percent-encoding.
///
/// A malformed escape (`%` not followed by two hex digits) or a byte sequence
/// that is not UTF-8 emits a warning and returns `text` unchanged.
///
/// # Example
///
/// ```
/// use oxide_nav::encoding::decode;
///
/// assert_eq!(decode("c%2B%2B"), "c++");
/// assert_eq!(decode("100%"), "100%");
/// ```
pub fn decode(text: &str) -> String {
    match try_decode(text) {
        Some(decoded) => decoded,
        None => {
            warn!(text, "could not decode percent-encoded value");
            text.to_string()
        }
    }
}

fn try_decode(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3)?;
            if !escape.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(text)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// Parses a search string (with or without the leading `?`) into a query map.
///
/// A key seen once maps to a single value; a repeated key maps to every value
/// in order of appearance.
pub fn parse_query(search: &str) -> Query {
    let search = search.strip_prefix('?').unwrap_or(search);
    let mut query = Query::new();

    for (key, value) in form_urlencoded::parse(search.as_bytes()) {
        let value = value.into_owned();
        match query.get_mut(key.as_ref()) {
            Some(existing) => existing.push(value),
            None => {
                query.insert(key.into_owned(), QueryValue::Single(value));
            }
        }
    }

    query
}

/// Serializes a query map as `application/x-www-form-urlencoded`, without the
/// leading `?`.
///
/// List values are written as one pair per value, in order.
pub fn stringify_query(query: &Query) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        for item in value.iter() {
            serializer.append_pair(key, item);
        }
    }
    serializer.finish()
}
