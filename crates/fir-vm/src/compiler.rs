//! Lowering of expressions into flat instruction programs.
//!
//! Branch-free subtrees stay embedded in a single `Eval`. A conditional
//! lowers to: evaluate the condition, `ConditionalJump` to the true
//! block, false block falling through, an unconditional `Jump` over the
//! true block, and a `CopyLastAssigned` at the join so the result has a
//! stable slot. Repeated branch-free subexpressions are evaluated once in
//! a prefix and referenced through `StackReference`, controlled by
//! [`CompilationEnv::create_let_bindings_for_cse`].
//!
//! Compilation is a pure function of its inputs and safe to run
//! concurrently from multiple threads.

use std::collections::HashMap;

use fir_core::FirError;

use crate::expr::{resolve, Expression};
use crate::instruction::{Program, StackInstruction};
use crate::kernel;

#[derive(Debug, Clone)]
pub struct CompilationEnv {
    /// Evaluate repeated subexpressions once and reference the slot,
    /// instead of recompiling them at every occurrence. Callers disable
    /// this where a binding costs more than recomputation.
    pub create_let_bindings_for_cse: bool,
}

impl Default for CompilationEnv {
    fn default() -> Self {
        CompilationEnv {
            create_let_bindings_for_cse: true,
        }
    }
}

/// Compile an expression into a program. Fails on unknown kernel-function
/// names and on nesting beyond
/// [`MAX_EXPRESSION_DEPTH`](crate::expr::MAX_EXPRESSION_DEPTH).
pub fn compile(expr: &Expression, env: &CompilationEnv) -> Result<Program, FirError> {
    expr.check_depth()?;
    check_kernel_functions(expr)?;

    let mut compiler = Compiler {
        instructions: Vec::new(),
        bindings: HashMap::new(),
    };

    if env.create_let_bindings_for_cse {
        for candidate in cse_candidates(expr) {
            let lowered = compiler.lower(&candidate);
            let index = compiler.emit(StackInstruction::Eval(lowered));
            compiler.bindings.insert(candidate, index);
        }
    }

    let root = compiler.lower(expr);
    let skip_root_eval = matches!(
        root,
        Expression::StackReference(index) if index + 1 == compiler.instructions.len()
    );
    if !skip_root_eval {
        compiler.emit(StackInstruction::Eval(root));
    }
    compiler.emit(StackInstruction::Return);

    Ok(Program::new(compiler.instructions))
}

struct Compiler {
    instructions: Vec<StackInstruction>,
    bindings: HashMap<Expression, usize>,
}

impl Compiler {
    fn emit(&mut self, instruction: StackInstruction) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    /// Point the jump at `at` to the next instruction to be emitted.
    fn patch_jump(&mut self, at: usize) {
        let offset = (self.instructions.len() as i64 - (at as i64 + 1)) as i32;
        match &mut self.instructions[at] {
            StackInstruction::Jump(target) => *target = offset,
            StackInstruction::ConditionalJump { true_branch_offset } => {
                *true_branch_offset = offset
            }
            other => unreachable!("patching non-jump instruction {other}"),
        }
    }

    /// Rewrite an expression into a branch-free form, emitting instruction
    /// blocks for any conditionals and substituting bound subexpressions
    /// with slot references.
    fn lower(&mut self, expr: &Expression) -> Expression {
        if let Some(&index) = self.bindings.get(expr) {
            return Expression::StackReference(index);
        }
        match expr {
            Expression::Literal(_) | Expression::Environment | Expression::StackReference(_) => {
                expr.clone()
            }
            Expression::List(items) => {
                Expression::List(items.iter().map(|item| self.lower(item)).collect())
            }
            Expression::KernelApplication { function, input } => Expression::KernelApplication {
                function: *function,
                input: Box::new(self.lower(input)),
            },
            Expression::Conditional {
                condition,
                false_branch,
                true_branch,
            } => {
                let condition = self.lower(condition);
                self.emit(StackInstruction::Eval(condition));
                let conditional_jump_at = self.emit(StackInstruction::ConditionalJump {
                    true_branch_offset: 0,
                });

                let false_expr = self.lower(false_branch);
                self.emit(StackInstruction::Eval(false_expr));
                let jump_at = self.emit(StackInstruction::Jump(0));

                self.patch_jump(conditional_jump_at);
                let true_expr = self.lower(true_branch);
                self.emit(StackInstruction::Eval(true_expr));

                self.patch_jump(jump_at);
                let join = self.emit(StackInstruction::CopyLastAssigned);
                Expression::StackReference(join)
            }
        }
    }
}

fn check_kernel_functions(expr: &Expression) -> Result<(), FirError> {
    match expr {
        Expression::Literal(_) | Expression::Environment | Expression::StackReference(_) => Ok(()),
        Expression::List(items) => items.iter().try_for_each(check_kernel_functions),
        Expression::KernelApplication { function, input } => {
            if !kernel::is_known_function(*function) {
                return Err(FirError::compile(format!(
                    "unknown kernel function '{}'",
                    resolve(*function)
                )));
            }
            check_kernel_functions(input)
        }
        Expression::Conditional {
            condition,
            false_branch,
            true_branch,
        } => {
            check_kernel_functions(condition)?;
            check_kernel_functions(false_branch)?;
            check_kernel_functions(true_branch)
        }
    }
}

/// Composite branch-free subexpressions occurring at least twice, ordered
/// smallest first so inner bindings exist before the expressions using
/// them. Expressions containing conditionals or stack references are
/// never hoisted.
fn cse_candidates(expr: &Expression) -> Vec<Expression> {
    let mut counts: HashMap<Expression, (usize, usize)> = HashMap::new();
    let mut next_seen = 0usize;
    count_subexpressions(expr, &mut counts, &mut next_seen);

    let mut candidates: Vec<(Expression, usize)> = counts
        .into_iter()
        .filter(|(_, (count, _))| *count >= 2)
        .map(|(expr, (_, first_seen))| (expr, first_seen))
        .collect();
    candidates.sort_by_key(|(expr, first_seen)| (expr.node_count(), *first_seen));
    candidates.into_iter().map(|(expr, _)| expr).collect()
}

fn count_subexpressions(
    expr: &Expression,
    counts: &mut HashMap<Expression, (usize, usize)>,
    next_seen: &mut usize,
) {
    let composite = matches!(expr, Expression::KernelApplication { .. })
        || matches!(expr, Expression::List(items) if !items.is_empty());
    if composite && !expr.contains_conditional() && !expr.contains_stack_reference() {
        let entry = counts.entry(expr.clone()).or_insert_with(|| {
            let seen = *next_seen;
            *next_seen += 1;
            (0, seen)
        });
        entry.0 += 1;
    }
    match expr {
        Expression::Literal(_) | Expression::Environment | Expression::StackReference(_) => {}
        Expression::List(items) => {
            for item in items {
                count_subexpressions(item, counts, next_seen);
            }
        }
        Expression::KernelApplication { input, .. } => {
            count_subexpressions(input, counts, next_seen)
        }
        Expression::Conditional {
            condition,
            false_branch,
            true_branch,
        } => {
            count_subexpressions(condition, counts, next_seen);
            count_subexpressions(false_branch, counts, next_seen);
            count_subexpressions(true_branch, counts, next_seen);
        }
    }
}
