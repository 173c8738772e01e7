//! Popular value encodings: strings and integers.
//!
//! Strings have two forms. The blob form packs one 4-byte big-endian unit
//! per Unicode scalar value into a single blob; it is the form used for
//! names inside encoded trees. The 2024 list form wraps each 4-byte unit
//! in its own blob and collects them into a list.
//!
//! A signed integer encodes as `Blob([sign, magnitude..])` with sign byte
//! `4` for non-negative and `2` for negative, followed by the minimal
//! big-endian magnitude, always at least one byte (`0` is `[4, 0]`).

use crate::error::FirError;
use crate::value::Value;

pub const SIGN_BYTE_POSITIVE: u8 = 4;
pub const SIGN_BYTE_NEGATIVE: u8 = 2;

/// Pack a string into blob bytes, one 4-byte big-endian unit per scalar.
pub fn blob_bytes_from_string(s: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(s.len() * 4);
    for c in s.chars() {
        bytes.extend_from_slice(&(c as u32).to_be_bytes());
    }
    bytes
}

pub fn blob_value_from_string(s: &str) -> Value {
    Value::blob(blob_bytes_from_string(s))
}

/// Decode blob-form string bytes. Fails when the length is not a multiple
/// of four or a unit is not a valid Unicode scalar value.
pub fn string_from_blob_bytes(bytes: &[u8]) -> Result<String, FirError> {
    if bytes.len() % 4 != 0 {
        return Err(FirError::string_decode(format!(
            "blob length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    let mut out = String::with_capacity(bytes.len() / 4);
    for unit in bytes.chunks_exact(4) {
        let code = u32::from_be_bytes([unit[0], unit[1], unit[2], unit[3]]);
        let c = char::from_u32(code).ok_or_else(|| {
            FirError::string_decode(format!("unit {code} is not a Unicode scalar value"))
        })?;
        out.push(c);
    }
    Ok(out)
}

pub fn string_from_blob_value(value: &Value) -> Result<String, FirError> {
    match value.as_blob() {
        Some(bytes) => string_from_blob_bytes(bytes),
        None => Err(FirError::string_decode("expected a blob value")),
    }
}

/// Encode a string in the 2024 list form: one single-unit blob per scalar.
pub fn value_from_string(s: &str) -> Value {
    Value::list(
        s.chars()
            .map(|c| Value::blob((c as u32).to_be_bytes().to_vec()))
            .collect(),
    )
}

/// Decode the 2024 list form. Every element must be a 4-byte blob holding
/// one Unicode scalar value.
pub fn string_from_value(value: &Value) -> Result<String, FirError> {
    let items = value
        .as_list()
        .ok_or_else(|| FirError::string_decode("expected a list value"))?;
    let mut out = String::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let bytes = item.as_blob().ok_or_else(|| {
            FirError::string_decode(format!("element {index} is not a blob"))
        })?;
        if bytes.len() != 4 {
            return Err(FirError::string_decode(format!(
                "element {index} has {} bytes, expected 4",
                bytes.len()
            )));
        }
        let code = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let c = char::from_u32(code).ok_or_else(|| {
            FirError::string_decode(format!(
                "element {index} ({code}) is not a Unicode scalar value"
            ))
        })?;
        out.push(c);
    }
    Ok(out)
}

pub fn value_from_signed_integer(n: i64) -> Value {
    let sign = if n < 0 {
        SIGN_BYTE_NEGATIVE
    } else {
        SIGN_BYTE_POSITIVE
    };
    let mut bytes = vec![sign];
    bytes.extend_from_slice(&minimal_be_magnitude(n.unsigned_abs()));
    Value::blob(bytes)
}

/// Decode a signed integer, rejecting every non-canonical shape: lists,
/// blobs shorter than two bytes, unknown sign bytes, zero-padded
/// magnitudes, negative zero, and magnitudes outside `i64`.
pub fn signed_integer_from_value(value: &Value) -> Result<i64, FirError> {
    let bytes = value
        .as_blob()
        .ok_or_else(|| FirError::integer_decode("expected a blob value"))?;
    if bytes.len() < 2 {
        return Err(FirError::integer_decode(format!(
            "blob has {} bytes, expected at least 2",
            bytes.len()
        )));
    }
    let negative = match bytes[0] {
        SIGN_BYTE_POSITIVE => false,
        SIGN_BYTE_NEGATIVE => true,
        other => {
            return Err(FirError::integer_decode(format!(
                "invalid sign byte {other}"
            )))
        }
    };
    let magnitude_bytes = &bytes[1..];
    if magnitude_bytes.len() > 1 && magnitude_bytes[0] == 0 {
        return Err(FirError::integer_decode("magnitude has leading zero byte"));
    }
    if magnitude_bytes.len() > 8 {
        return Err(FirError::range(format!(
            "magnitude of {} bytes exceeds 64 bits",
            magnitude_bytes.len()
        )));
    }
    let mut magnitude: u64 = 0;
    for &b in magnitude_bytes {
        magnitude = (magnitude << 8) | b as u64;
    }
    if negative {
        if magnitude == 0 {
            return Err(FirError::integer_decode("negative zero"));
        }
        if magnitude > i64::MAX as u64 + 1 {
            return Err(FirError::range(format!("-{magnitude} does not fit in i64")));
        }
        Ok(0i64.wrapping_sub_unsigned(magnitude))
    } else {
        if magnitude > i64::MAX as u64 {
            return Err(FirError::range(format!("{magnitude} does not fit in i64")));
        }
        Ok(magnitude as i64)
    }
}

/// Encode a non-negative integer. Negative input is a range error rather
/// than a silent wrap.
pub fn value_from_unsigned_integer(n: i64) -> Result<Value, FirError> {
    if n < 0 {
        return Err(FirError::range(format!(
            "cannot encode negative {n} as unsigned integer"
        )));
    }
    Ok(value_from_signed_integer(n))
}

/// Decode an unsigned integer: the signed form restricted to non-negative
/// results.
pub fn unsigned_integer_from_value(value: &Value) -> Result<i64, FirError> {
    let n = signed_integer_from_value(value)?;
    if n < 0 {
        return Err(FirError::range(format!(
            "decoded negative {n} where unsigned was expected"
        )));
    }
    Ok(n)
}

fn minimal_be_magnitude(magnitude: u64) -> Vec<u8> {
    let be = magnitude.to_be_bytes();
    let start = be.iter().position(|&b| b != 0).unwrap_or(be.len() - 1);
    be[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_string_reference_bytes() {
        assert_eq!(
            blob_bytes_from_string("ABC ä 😀"),
            vec![
                0, 0, 0, 65, 0, 0, 0, 66, 0, 0, 0, 67, 0, 0, 0, 32, 0, 0, 0, 228, 0, 0, 0, 32, 0,
                1, 246, 0,
            ]
        );
        assert_eq!(
            blob_bytes_from_string("DEF 🌲"),
            vec![0, 0, 0, 68, 0, 0, 0, 69, 0, 0, 0, 70, 0, 0, 0, 32, 0, 1, 243, 50]
        );
    }

    #[test]
    fn blob_string_round_trip() {
        for s in ["", "hello", "ABC ä 😀", "🌲🌿"] {
            let value = blob_value_from_string(s);
            assert_eq!(string_from_blob_value(&value).as_deref(), Ok(s));
        }
    }

    #[test]
    fn blob_string_rejects_bad_lengths_and_units() {
        assert!(string_from_blob_bytes(&[0, 0, 65]).is_err());
        // 0xD800 is a surrogate, not a scalar value.
        assert!(string_from_blob_bytes(&[0, 0, 0xd8, 0]).is_err());
        assert!(string_from_blob_value(&Value::empty_list()).is_err());
    }

    #[test]
    fn list_string_round_trip() {
        for s in ["", "abc", "stringValue 789", "test😃"] {
            let value = value_from_string(s);
            assert_eq!(string_from_value(&value).as_deref(), Ok(s));
        }
    }

    #[test]
    fn list_string_shape() {
        let value = value_from_string("Aé");
        let items = value.as_list().expect("list form");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Value::blob(vec![0, 0, 0, 65]));
        assert_eq!(items[1], Value::blob(vec![0, 0, 0, 233]));
    }

    #[test]
    fn list_string_rejects_bad_elements() {
        assert!(string_from_value(&Value::empty_blob()).is_err());
        assert!(string_from_value(&Value::list(vec![Value::blob(vec![65])])).is_err());
        assert!(string_from_value(&Value::list(vec![Value::empty_list()])).is_err());
    }

    #[test]
    fn signed_integer_canonical_bytes() {
        assert_eq!(value_from_signed_integer(0), Value::blob(vec![4, 0]));
        assert_eq!(value_from_signed_integer(1), Value::blob(vec![4, 1]));
        assert_eq!(value_from_signed_integer(-1), Value::blob(vec![2, 1]));
        assert_eq!(value_from_signed_integer(256), Value::blob(vec![4, 1, 0]));
        assert_eq!(value_from_signed_integer(-1234), Value::blob(vec![2, 4, 210]));
    }

    #[test]
    fn signed_integer_round_trip() {
        for n in [0, -1, 1, -1234, 2345, 123456789, i64::MAX, i64::MIN] {
            let value = value_from_signed_integer(n);
            assert_eq!(signed_integer_from_value(&value), Ok(n));
        }
    }

    #[test]
    fn signed_integer_rejects_non_canonical() {
        assert!(signed_integer_from_value(&Value::empty_list()).is_err());
        assert!(signed_integer_from_value(&Value::blob(vec![4])).is_err());
        assert!(signed_integer_from_value(&Value::blob(vec![7, 1])).is_err());
        // leading zero padding
        assert!(signed_integer_from_value(&Value::blob(vec![4, 0, 1])).is_err());
        // negative zero
        assert!(signed_integer_from_value(&Value::blob(vec![2, 0])).is_err());
        // nine magnitude bytes
        assert!(
            signed_integer_from_value(&Value::blob(vec![4, 1, 0, 0, 0, 0, 0, 0, 0, 0])).is_err()
        );
    }

    #[test]
    fn signed_integer_range_limits() {
        // 2^63 is representable only as the negative bound.
        let bound = Value::blob(vec![2, 0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(signed_integer_from_value(&bound), Ok(i64::MIN));
        let too_big = Value::blob(vec![4, 0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert!(signed_integer_from_value(&too_big).is_err());
    }

    #[test]
    fn unsigned_integer_refuses_negative() {
        assert!(value_from_unsigned_integer(-1).is_err());
        assert_eq!(
            value_from_unsigned_integer(42),
            Ok(value_from_signed_integer(42))
        );
        let negative = value_from_signed_integer(-5);
        assert!(matches!(
            unsigned_integer_from_value(&negative),
            Err(FirError::Range(_))
        ));
    }
}
