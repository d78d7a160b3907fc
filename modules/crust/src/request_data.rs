//! Request parameters as JSON, for diagnostics.

use serde_json::{Map, Value};

/// Values longer than this many characters are shortened.
const MAX_VALUE_CHARS: usize = 100;
/// Characters kept from each end of a shortened value.
const KEEP_CHARS: usize = 50;

/// Decode request parameters into a JSON object of parameter name to value.
///
/// Parameters come from the URL query, then from an
/// `application/x-www-form-urlencoded` body if one is given. For repeated
/// names the first value wins, so query parameters shadow form fields.
/// Values longer than 100 characters keep only their first and last 50
/// characters. Missing or undecodable input contributes nothing.
///
/// The middleware does not buffer request bodies and passes only the query.
#[must_use]
pub fn request_data(query: Option<&str>, form: Option<&[u8]>) -> Value {
    let mut inputs = Map::new();
    for (name, value) in decode(query.map(str::as_bytes)).chain(decode(form)) {
        inputs
            .entry(name)
            .or_insert_with(|| Value::String(shorten(&value)));
    }
    Value::Object(inputs)
}

fn decode(input: Option<&[u8]>) -> impl Iterator<Item = (String, String)> {
    input
        .and_then(|bytes| serde_urlencoded::from_bytes::<Vec<(String, String)>>(bytes).ok())
        .unwrap_or_default()
        .into_iter()
}

fn shorten(value: &str) -> String {
    let len = value.chars().count();
    if len <= MAX_VALUE_CHARS {
        return value.to_owned();
    }
    let head = value.chars().take(KEEP_CHARS);
    let tail = value.chars().skip(len - KEEP_CHARS);
    head.chain(tail).collect()
}
