//! Built-in kernel functions and the canonical truth values.
//!
//! Every kernel function is total: a malformed argument shape yields the
//! canonical empty list instead of failing. Only unknown function names
//! are an error, and those are rejected at compile time.

use std::sync::LazyLock;

use fir_core::{encode, FirError, Value};
use lasso::Spur;

use crate::expr::{intern, resolve};

/// Interned names of the kernel functions.
pub struct KernelNames {
    pub equal: Spur,
    pub length: Spur,
    pub head: Spur,
    pub skip: Spur,
    pub take: Spur,
}

static KERNEL_NAMES: LazyLock<KernelNames> = LazyLock::new(|| KernelNames {
    equal: intern("equal"),
    length: intern("length"),
    head: intern("head"),
    skip: intern("skip"),
    take: intern("take"),
});

pub fn kernel_names() -> &'static KernelNames {
    &KERNEL_NAMES
}

pub fn is_known_function(function: Spur) -> bool {
    let names = kernel_names();
    function == names.equal
        || function == names.length
        || function == names.head
        || function == names.skip
        || function == names.take
}

/// The canonical true value.
pub fn true_value() -> Value {
    Value::blob(vec![4])
}

/// The canonical false value.
pub fn false_value() -> Value {
    Value::blob(vec![2])
}

pub fn value_from_bool(b: bool) -> Value {
    if b {
        true_value()
    } else {
        false_value()
    }
}

/// A value is truthy iff it is the canonical true value.
pub fn is_truthy(value: &Value) -> bool {
    *value == true_value()
}

/// Apply a kernel function to its (already evaluated) input value.
pub fn apply(function: Spur, input: &Value) -> Result<Value, FirError> {
    let names = kernel_names();
    if function == names.equal {
        Ok(equal(input))
    } else if function == names.length {
        Ok(length(input))
    } else if function == names.head {
        Ok(head(input))
    } else if function == names.skip {
        Ok(skip(input))
    } else if function == names.take {
        Ok(take(input))
    } else {
        Err(FirError::compile(format!(
            "unknown kernel function '{}'",
            resolve(function)
        )))
    }
}

/// True when all elements of the input list are equal. Fewer than two
/// elements, or a blob input, is trivially true.
pub fn equal(input: &Value) -> Value {
    match input.as_list() {
        Some(items) => value_from_bool(items.windows(2).all(|pair| pair[0] == pair[1])),
        None => true_value(),
    }
}

/// Byte count of a blob or element count of a list, as a signed integer
/// value.
pub fn length(input: &Value) -> Value {
    let count = match input {
        Value::Blob(blob) => blob.bytes().len(),
        Value::List(list) => list.items().len(),
    };
    encode::value_from_signed_integer(count as i64)
}

/// First element of a non-empty list; the empty list for everything else,
/// blobs included.
pub fn head(input: &Value) -> Value {
    match input.as_list() {
        Some([first, ..]) => first.clone(),
        _ => Value::empty_list(),
    }
}

/// `skip([count, sequence])`: drop the first `count` bytes or elements.
/// Negative counts act as zero; a malformed input shape yields the empty
/// list.
pub fn skip(input: &Value) -> Value {
    match decode_count_and_sequence(input) {
        Some((count, sequence)) => skip_count(count, sequence),
        None => Value::empty_list(),
    }
}

/// `take([count, sequence])`: keep the first `count` bytes or elements.
pub fn take(input: &Value) -> Value {
    match decode_count_and_sequence(input) {
        Some((count, sequence)) => take_count(count, sequence),
        None => Value::empty_list(),
    }
}

pub fn skip_count(count: i64, sequence: &Value) -> Value {
    let count = count.max(0) as usize;
    match sequence {
        Value::Blob(blob) => {
            let bytes = blob.bytes();
            Value::blob(bytes[bytes.len().min(count)..].to_vec())
        }
        Value::List(list) => {
            let items = list.items();
            Value::list(items[items.len().min(count)..].to_vec())
        }
    }
}

pub fn take_count(count: i64, sequence: &Value) -> Value {
    let count = count.max(0) as usize;
    match sequence {
        Value::Blob(blob) => {
            let bytes = blob.bytes();
            Value::blob(bytes[..bytes.len().min(count)].to_vec())
        }
        Value::List(list) => {
            let items = list.items();
            Value::list(items[..items.len().min(count)].to_vec())
        }
    }
}

fn decode_count_and_sequence(input: &Value) -> Option<(i64, &Value)> {
    match input.as_list() {
        Some([count_value, sequence]) => {
            let count = encode::signed_integer_from_value(count_value).ok()?;
            Some((count, sequence))
        }
        _ => None,
    }
}
