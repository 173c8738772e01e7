//! Canonical conversions between `Value` and `serde_json::Value`.
//!
//! The encoder picks the densest lossless form: a canonical signed
//! integer becomes a native JSON number, a decodable string blob becomes
//! `{"BlobAsString": ..}`, any other blob becomes `{"AsBase64": ..}`, a
//! 2024-form string list becomes `{"ListAsString_2024": ..}`, and any
//! other list becomes a JSON array (the empty list is `[]`). Each tagged
//! form decodes back to exactly the value its encoder produced.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::encode;
use crate::error::FirError;
use crate::value::Value;

pub const TAG_BLOB_AS_STRING: &str = "BlobAsString";
pub const TAG_LIST_AS_STRING_2024: &str = "ListAsString_2024";
pub const TAG_AS_BASE64: &str = "AsBase64";

pub fn value_to_json(value: &Value) -> serde_json::Value {
    if let Ok(n) = encode::signed_integer_from_value(value) {
        return serde_json::Value::Number(n.into());
    }
    match value {
        Value::Blob(blob) => match encode::string_from_blob_bytes(blob.bytes()) {
            Ok(s) => tagged(TAG_BLOB_AS_STRING, s),
            Err(_) => tagged(TAG_AS_BASE64, BASE64.encode(blob.bytes())),
        },
        Value::List(list) => {
            let items = list.items();
            if !items.is_empty() {
                if let Ok(s) = encode::string_from_value(value) {
                    return tagged(TAG_LIST_AS_STRING_2024, s);
                }
            }
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
    }
}

pub fn value_from_json(json: &serde_json::Value) -> Result<Value, FirError> {
    match json {
        serde_json::Value::Number(n) => {
            let n = n
                .as_i64()
                .ok_or_else(|| FirError::json(format!("number {n} is not a lossless i64")))?;
            Ok(encode::value_from_signed_integer(n))
        }
        serde_json::Value::Array(items) => {
            let decoded: Result<Vec<Value>, FirError> = items.iter().map(value_from_json).collect();
            Ok(Value::list(decoded?))
        }
        serde_json::Value::Object(obj) => {
            if obj.len() != 1 {
                return Err(FirError::json(format!(
                    "object has {} keys, expected one tag",
                    obj.len()
                )));
            }
            let (tag, inner) = obj.iter().next().ok_or_else(|| {
                FirError::json("object has no tag")
            })?;
            let text = |inner: &serde_json::Value| {
                inner
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| FirError::json(format!("tag '{tag}' expects a string payload")))
            };
            match tag.as_str() {
                TAG_BLOB_AS_STRING => Ok(encode::blob_value_from_string(&text(inner)?)),
                TAG_LIST_AS_STRING_2024 => Ok(encode::value_from_string(&text(inner)?)),
                TAG_AS_BASE64 => {
                    let bytes = BASE64
                        .decode(text(inner)?)
                        .map_err(|err| FirError::json(format!("invalid base64: {err}")))?;
                    Ok(Value::blob(bytes))
                }
                other => Err(FirError::json(format!("unknown tag '{other}'"))),
            }
        }
        other => Err(FirError::json(format!(
            "cannot decode a value from JSON {other}"
        ))),
    }
}

fn tagged(tag: &str, payload: String) -> serde_json::Value {
    let mut obj = serde_json::Map::with_capacity(1);
    obj.insert(tag.to_string(), serde_json::Value::String(payload));
    serde_json::Value::Object(obj)
}
