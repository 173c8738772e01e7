//! Immutable expression AST over values.
//!
//! Expressions carry structural equality and hashing so the compiler can
//! memoize and detect repeated subexpressions. Kernel-function names are
//! interned process-wide; [`intern`] and [`resolve`] convert between
//! strings and symbols.

use std::sync::LazyLock;

use fir_core::{FirError, Value};
use lasso::{Spur, ThreadedRodeo};

/// Maximum expression nesting the compiler and the evaluators follow by
/// native recursion. This prevents native stack overflow from deeply
/// nested expressions.
pub const MAX_EXPRESSION_DEPTH: usize = 256;

static NAMES: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::new);

/// Intern a kernel-function name, returning its symbol.
pub fn intern(name: &str) -> Spur {
    NAMES.get_or_intern(name)
}

/// Resolve a symbol back to its name.
pub fn resolve(symbol: Spur) -> String {
    NAMES.resolve(&symbol).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    /// A constant value.
    Literal(Value),
    /// Build a list from the item expressions, in order.
    List(Vec<Expression>),
    /// Apply a kernel function to the evaluated input expression.
    KernelApplication { function: Spur, input: Box<Expression> },
    /// Branch on the condition's truthiness. The false branch is laid out
    /// first in compiled programs, matching the instruction encoding.
    Conditional {
        condition: Box<Expression>,
        false_branch: Box<Expression>,
        true_branch: Box<Expression>,
    },
    /// Read the current evaluation environment value.
    Environment,
    /// Read the result slot of an earlier instruction in the same
    /// program. Emitted by the compiler for let-bindings and reuse of
    /// repeated subexpressions.
    StackReference(usize),
}

impl Expression {
    pub fn literal(value: Value) -> Expression {
        Expression::Literal(value)
    }

    pub fn kernel_application(function: &str, input: Expression) -> Expression {
        Expression::KernelApplication {
            function: intern(function),
            input: Box::new(input),
        }
    }

    pub fn conditional(
        condition: Expression,
        false_branch: Expression,
        true_branch: Expression,
    ) -> Expression {
        Expression::Conditional {
            condition: Box::new(condition),
            false_branch: Box::new(false_branch),
            true_branch: Box::new(true_branch),
        }
    }

    /// True when evaluation cannot depend on the environment or on
    /// earlier instruction slots, so the expression can be reduced at
    /// compile time.
    pub fn is_independent(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Environment | Expression::StackReference(_) => false,
            Expression::List(items) => items.iter().all(Expression::is_independent),
            Expression::KernelApplication { input, .. } => input.is_independent(),
            Expression::Conditional {
                condition,
                false_branch,
                true_branch,
            } => {
                condition.is_independent()
                    && false_branch.is_independent()
                    && true_branch.is_independent()
            }
        }
    }

    pub fn contains_conditional(&self) -> bool {
        match self {
            Expression::Conditional { .. } => true,
            Expression::Literal(_) | Expression::Environment | Expression::StackReference(_) => {
                false
            }
            Expression::List(items) => items.iter().any(Expression::contains_conditional),
            Expression::KernelApplication { input, .. } => input.contains_conditional(),
        }
    }

    pub fn contains_stack_reference(&self) -> bool {
        match self {
            Expression::StackReference(_) => true,
            Expression::Literal(_) | Expression::Environment => false,
            Expression::List(items) => items.iter().any(Expression::contains_stack_reference),
            Expression::KernelApplication { input, .. } => input.contains_stack_reference(),
            Expression::Conditional {
                condition,
                false_branch,
                true_branch,
            } => {
                condition.contains_stack_reference()
                    || false_branch.contains_stack_reference()
                    || true_branch.contains_stack_reference()
            }
        }
    }

    /// Nesting depth of the expression tree, measured without native
    /// recursion.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(&Expression, usize)> = vec![(self, 1)];
        while let Some((expr, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match expr {
                Expression::Literal(_)
                | Expression::Environment
                | Expression::StackReference(_) => {}
                Expression::List(items) => {
                    for item in items {
                        stack.push((item, depth + 1));
                    }
                }
                Expression::KernelApplication { input, .. } => stack.push((input, depth + 1)),
                Expression::Conditional {
                    condition,
                    false_branch,
                    true_branch,
                } => {
                    stack.push((condition, depth + 1));
                    stack.push((false_branch, depth + 1));
                    stack.push((true_branch, depth + 1));
                }
            }
        }
        deepest
    }

    /// Reject expressions nested beyond [`MAX_EXPRESSION_DEPTH`] before
    /// walking them recursively.
    pub fn check_depth(&self) -> Result<(), FirError> {
        if self.depth() > MAX_EXPRESSION_DEPTH {
            return Err(FirError::compile("maximum expression depth exceeded"));
        }
        Ok(())
    }

    /// Number of nodes in the expression tree.
    pub fn node_count(&self) -> usize {
        match self {
            Expression::Literal(_) | Expression::Environment | Expression::StackReference(_) => 1,
            Expression::List(items) => 1 + items.iter().map(Expression::node_count).sum::<usize>(),
            Expression::KernelApplication { input, .. } => 1 + input.node_count(),
            Expression::Conditional {
                condition,
                false_branch,
                true_branch,
            } => 1 + condition.node_count() + false_branch.node_count() + true_branch.node_count(),
        }
    }
}
