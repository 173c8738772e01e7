#![allow(dead_code)]

use fir_core::{encode, Value};
use fir_vm::Expression;

pub fn int(n: i64) -> Value {
    encode::value_from_signed_integer(n)
}

pub fn int_literal(n: i64) -> Expression {
    Expression::literal(int(n))
}

pub fn kernel2(function: &str, first: Expression, second: Expression) -> Expression {
    Expression::kernel_application(function, Expression::List(vec![first, second]))
}

/// Environments that cover the value-shape cases the kernel functions
/// branch on.
pub fn sample_environments() -> Vec<Value> {
    vec![
        Value::empty_blob(),
        Value::empty_list(),
        Value::blob(vec![1, 2, 3]),
        Value::blob(vec![4]),
        Value::list(vec![int(1), int(2), int(3), int(4)]),
        Value::list(vec![Value::blob(vec![7]), Value::empty_list()]),
    ]
}
