//! Pattern-directed inlining of kernel-function applications.
//!
//! [`compile_expression`] lowers an [`Expression`] into a
//! [`CompiledExpression`], a backend-agnostic form recording the
//! optimization decisions an ahead-of-time code generator consumes. Each
//! rule inspects one kernel application and either returns a specialized
//! node or declines with `None`, in which case the generic application
//! form is kept. Declining never changes semantics; a specialized node
//! must evaluate exactly like the generic form for every input.

use fir_core::{encode, FirError, Value};
use lasso::Spur;

use crate::eval;
use crate::expr::Expression;
use crate::kernel::{self, kernel_names};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledExpression {
    Literal(Value),
    Environment,
    StackReference(usize),
    ListConstruction(Vec<CompiledExpression>),
    Conditional {
        condition: Box<CompiledExpression>,
        false_branch: Box<CompiledExpression>,
        true_branch: Box<CompiledExpression>,
    },
    /// Generic kernel application; the fallback when no rule matched.
    KernelApplication {
        function: Spur,
        input: Box<CompiledExpression>,
    },
    /// True iff the input is represented as a blob.
    IsBlob(Box<CompiledExpression>),
    /// True iff the input is represented as a list.
    IsList(Box<CompiledExpression>),
    /// Direct structural equality of the two operands.
    ValueEquals(Box<CompiledExpression>, Box<CompiledExpression>),
    /// Byte count of a blob or element count of a list, as a signed
    /// integer value.
    LengthAsInteger(Box<CompiledExpression>),
    /// First element of a non-empty list, otherwise the empty list.
    HeadOrEmptyList(Box<CompiledExpression>),
    /// Drop a statically known count from the front of the input.
    SkipStatic {
        count: i64,
        input: Box<CompiledExpression>,
    },
}

/// Lower an expression, applying the inlining rules at every kernel
/// application. Fails on nesting beyond
/// [`MAX_EXPRESSION_DEPTH`](crate::expr::MAX_EXPRESSION_DEPTH).
pub fn compile_expression(expr: &Expression) -> Result<CompiledExpression, FirError> {
    expr.check_depth()?;
    Ok(lower(expr))
}

fn lower(expr: &Expression) -> CompiledExpression {
    match expr {
        Expression::Literal(value) => CompiledExpression::Literal(value.clone()),
        Expression::Environment => CompiledExpression::Environment,
        Expression::StackReference(index) => CompiledExpression::StackReference(*index),
        Expression::List(items) => {
            CompiledExpression::ListConstruction(items.iter().map(lower).collect())
        }
        Expression::Conditional {
            condition,
            false_branch,
            true_branch,
        } => CompiledExpression::Conditional {
            condition: Box::new(lower(condition)),
            false_branch: Box::new(lower(false_branch)),
            true_branch: Box::new(lower(true_branch)),
        },
        Expression::KernelApplication { function, input } => {
            match try_inline_kernel_application(*function, input) {
                Some(inlined) => inlined,
                None => CompiledExpression::KernelApplication {
                    function: *function,
                    input: Box::new(lower(input)),
                },
            }
        }
    }
}

fn try_inline_kernel_application(function: Spur, input: &Expression) -> Option<CompiledExpression> {
    let names = kernel_names();
    if function == names.equal {
        try_inline_equal(input)
    } else if function == names.length {
        Some(CompiledExpression::LengthAsInteger(Box::new(lower(input))))
    } else if function == names.head {
        Some(CompiledExpression::HeadOrEmptyList(Box::new(lower(input))))
    } else if function == names.skip {
        try_inline_skip(input)
    } else {
        None
    }
}

/// Two-argument `equal`. When one operand takes a zero-length prefix of a
/// subject and the other is the literal empty blob or empty list, the
/// comparison only observes the subject's representation, so it becomes a
/// direct is-blob or is-list check. Any other two-argument form becomes a
/// direct value equality.
fn try_inline_equal(input: &Expression) -> Option<CompiledExpression> {
    let args = match input {
        Expression::List(args) if args.len() == 2 => args,
        _ => return None,
    };
    for (candidate, other) in [(&args[0], &args[1]), (&args[1], &args[0])] {
        if let Some(subject) = match_zero_length_prefix(candidate) {
            if let Expression::Literal(literal) = other {
                if *literal == Value::empty_blob() {
                    return Some(CompiledExpression::IsBlob(Box::new(lower(subject))));
                }
                if *literal == Value::empty_list() {
                    return Some(CompiledExpression::IsList(Box::new(lower(subject))));
                }
            }
        }
    }
    Some(CompiledExpression::ValueEquals(
        Box::new(lower(&args[0])),
        Box::new(lower(&args[1])),
    ))
}

/// Match `take` of a statically-zero count, i.e. a zero-length prefix of
/// the returned subject expression.
fn match_zero_length_prefix(expr: &Expression) -> Option<&Expression> {
    let (function, input) = match expr {
        Expression::KernelApplication { function, input } => (*function, input.as_ref()),
        _ => return None,
    };
    if function != kernel_names().take {
        return None;
    }
    let args = match input {
        Expression::List(args) if args.len() == 2 => args,
        _ => return None,
    };
    let count = static_signed_integer(&args[0])?;
    (count == 0).then_some(&args[1])
}

/// `skip` with a statically known count. Negative counts clamp to zero,
/// matching the runtime behavior; a count that cannot be decoded
/// statically declines the rule.
fn try_inline_skip(input: &Expression) -> Option<CompiledExpression> {
    let args = match input {
        Expression::List(args) if args.len() == 2 => args,
        _ => return None,
    };
    let count = static_signed_integer(&args[0])?;
    Some(CompiledExpression::SkipStatic {
        count: count.max(0),
        input: Box::new(lower(&args[1])),
    })
}

/// Statically reduce an environment-independent expression to a signed
/// integer, when possible.
fn static_signed_integer(expr: &Expression) -> Option<i64> {
    if !expr.is_independent() {
        return None;
    }
    let value = eval::evaluate(expr, &Value::empty_list()).ok()?;
    encode::signed_integer_from_value(&value).ok()
}

impl CompiledExpression {
    /// Evaluate the compiled form against an environment value. Defines
    /// the semantics the specialized nodes must preserve.
    pub fn evaluate(&self, environment: &Value) -> Result<Value, FirError> {
        match self {
            CompiledExpression::Literal(value) => Ok(value.clone()),
            CompiledExpression::Environment => Ok(environment.clone()),
            CompiledExpression::StackReference(index) => Err(FirError::compile(format!(
                "stack slot {index} read outside a program"
            ))),
            CompiledExpression::ListConstruction(items) => {
                let values: Result<Vec<Value>, FirError> =
                    items.iter().map(|item| item.evaluate(environment)).collect();
                Ok(Value::list(values?))
            }
            CompiledExpression::Conditional {
                condition,
                false_branch,
                true_branch,
            } => {
                if kernel::is_truthy(&condition.evaluate(environment)?) {
                    true_branch.evaluate(environment)
                } else {
                    false_branch.evaluate(environment)
                }
            }
            CompiledExpression::KernelApplication { function, input } => {
                kernel::apply(*function, &input.evaluate(environment)?)
            }
            CompiledExpression::IsBlob(input) => {
                Ok(kernel::value_from_bool(input.evaluate(environment)?.is_blob()))
            }
            CompiledExpression::IsList(input) => {
                Ok(kernel::value_from_bool(input.evaluate(environment)?.is_list()))
            }
            CompiledExpression::ValueEquals(left, right) => Ok(kernel::value_from_bool(
                left.evaluate(environment)? == right.evaluate(environment)?,
            )),
            CompiledExpression::LengthAsInteger(input) => {
                Ok(kernel::length(&input.evaluate(environment)?))
            }
            CompiledExpression::HeadOrEmptyList(input) => {
                Ok(kernel::head(&input.evaluate(environment)?))
            }
            CompiledExpression::SkipStatic { count, input } => {
                Ok(kernel::skip_count(*count, &input.evaluate(environment)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_literal(n: i64) -> Expression {
        Expression::literal(encode::value_from_signed_integer(n))
    }

    fn take_zero_of(subject: Expression) -> Expression {
        Expression::kernel_application(
            "take",
            Expression::List(vec![int_literal(0), subject]),
        )
    }

    #[test]
    fn equal_against_empty_blob_becomes_is_blob() {
        let expr = Expression::kernel_application(
            "equal",
            Expression::List(vec![
                take_zero_of(Expression::Environment),
                Expression::literal(Value::empty_blob()),
            ]),
        );
        let compiled = compile_expression(&expr).unwrap();
        assert_eq!(
            compiled,
            CompiledExpression::IsBlob(Box::new(CompiledExpression::Environment))
        );
    }

    #[test]
    fn equal_against_empty_list_becomes_is_list() {
        let expr = Expression::kernel_application(
            "equal",
            Expression::List(vec![
                Expression::literal(Value::empty_list()),
                take_zero_of(Expression::Environment),
            ]),
        );
        assert_eq!(
            compile_expression(&expr).unwrap(),
            CompiledExpression::IsList(Box::new(CompiledExpression::Environment))
        );
    }

    #[test]
    fn two_argument_equal_becomes_value_equals() {
        let expr = Expression::kernel_application(
            "equal",
            Expression::List(vec![Expression::Environment, int_literal(3)]),
        );
        assert!(matches!(
            compile_expression(&expr).unwrap(),
            CompiledExpression::ValueEquals(_, _)
        ));
    }

    #[test]
    fn equal_with_other_arity_stays_generic() {
        let expr = Expression::kernel_application(
            "equal",
            Expression::List(vec![int_literal(1), int_literal(1), int_literal(1)]),
        );
        assert!(matches!(
            compile_expression(&expr).unwrap(),
            CompiledExpression::KernelApplication { .. }
        ));
    }

    #[test]
    fn length_and_head_always_specialize() {
        let length = Expression::kernel_application("length", Expression::Environment);
        assert!(matches!(
            compile_expression(&length).unwrap(),
            CompiledExpression::LengthAsInteger(_)
        ));
        let head = Expression::kernel_application("head", Expression::Environment);
        assert!(matches!(
            compile_expression(&head).unwrap(),
            CompiledExpression::HeadOrEmptyList(_)
        ));
    }

    #[test]
    fn skip_with_static_count_specializes() {
        let expr = Expression::kernel_application(
            "skip",
            Expression::List(vec![int_literal(2), Expression::Environment]),
        );
        assert_eq!(
            compile_expression(&expr).unwrap(),
            CompiledExpression::SkipStatic {
                count: 2,
                input: Box::new(CompiledExpression::Environment),
            }
        );
    }

    #[test]
    fn skip_with_negative_static_count_clamps_to_zero() {
        let expr = Expression::kernel_application(
            "skip",
            Expression::List(vec![int_literal(-5), Expression::Environment]),
        );
        assert!(matches!(
            compile_expression(&expr).unwrap(),
            CompiledExpression::SkipStatic { count: 0, .. }
        ));
    }

    #[test]
    fn skip_with_dynamic_count_stays_generic() {
        let expr = Expression::kernel_application(
            "skip",
            Expression::List(vec![Expression::Environment, Expression::Environment]),
        );
        assert!(matches!(
            compile_expression(&expr).unwrap(),
            CompiledExpression::KernelApplication { .. }
        ));
    }

    #[test]
    fn static_count_reduces_through_kernel_calls() {
        // head([2, ..]) reduces statically to 2
        let count = Expression::kernel_application(
            "head",
            Expression::List(vec![int_literal(2), int_literal(9)]),
        );
        let expr = Expression::kernel_application(
            "skip",
            Expression::List(vec![count, Expression::Environment]),
        );
        assert!(matches!(
            compile_expression(&expr).unwrap(),
            CompiledExpression::SkipStatic { count: 2, .. }
        ));
    }

    #[test]
    fn deeply_nested_expression_fails_to_lower() {
        use crate::expr::MAX_EXPRESSION_DEPTH;

        let deep = (0..MAX_EXPRESSION_DEPTH + 10)
            .fold(Expression::Environment, |expr, _| {
                Expression::List(vec![expr])
            });
        let err = compile_expression(&deep).expect_err("too deep");
        assert!(err.to_string().contains("depth"));
    }

    #[test]
    fn specialized_nodes_agree_with_generic_evaluation() {
        let environments = [
            Value::empty_blob(),
            Value::empty_list(),
            Value::blob(vec![1, 2, 3]),
            Value::list(vec![Value::blob(vec![4]), Value::empty_list()]),
        ];
        let exprs = [
            Expression::kernel_application(
                "equal",
                Expression::List(vec![
                    take_zero_of(Expression::Environment),
                    Expression::literal(Value::empty_blob()),
                ]),
            ),
            Expression::kernel_application(
                "equal",
                Expression::List(vec![
                    take_zero_of(Expression::Environment),
                    Expression::literal(Value::empty_list()),
                ]),
            ),
            Expression::kernel_application("length", Expression::Environment),
            Expression::kernel_application("head", Expression::Environment),
            Expression::kernel_application(
                "skip",
                Expression::List(vec![int_literal(1), Expression::Environment]),
            ),
        ];
        for expr in &exprs {
            let compiled = compile_expression(expr).unwrap();
            for environment in &environments {
                assert_eq!(
                    compiled.evaluate(environment),
                    eval::evaluate(expr, environment),
                    "inlined form diverged for {expr:?} on {environment}"
                );
            }
        }
    }
}
