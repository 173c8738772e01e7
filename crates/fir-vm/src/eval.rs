//! Reference evaluator for expressions and compiled programs.
//!
//! The production evaluator lives outside this crate; this one defines
//! the semantics the compiler must preserve and backs the equivalence
//! tests.

use fir_core::{FirError, Value};

use crate::expr::Expression;
use crate::instruction::{Program, StackInstruction};
use crate::kernel;

/// Evaluate an expression against an environment value. Fails on unknown
/// kernel functions, on nesting beyond
/// [`MAX_EXPRESSION_DEPTH`](crate::expr::MAX_EXPRESSION_DEPTH), and on
/// stack references, which are only meaningful inside a program.
pub fn evaluate(expr: &Expression, environment: &Value) -> Result<Value, FirError> {
    expr.check_depth()?;
    evaluate_with_slots(expr, environment, &[])
}

fn evaluate_with_slots(
    expr: &Expression,
    environment: &Value,
    slots: &[Option<Value>],
) -> Result<Value, FirError> {
    match expr {
        Expression::Literal(value) => Ok(value.clone()),
        Expression::List(items) => {
            let values: Result<Vec<Value>, FirError> = items
                .iter()
                .map(|item| evaluate_with_slots(item, environment, slots))
                .collect();
            Ok(Value::list(values?))
        }
        Expression::KernelApplication { function, input } => {
            let input = evaluate_with_slots(input, environment, slots)?;
            kernel::apply(*function, &input)
        }
        Expression::Conditional {
            condition,
            false_branch,
            true_branch,
        } => {
            let condition = evaluate_with_slots(condition, environment, slots)?;
            if kernel::is_truthy(&condition) {
                evaluate_with_slots(true_branch, environment, slots)
            } else {
                evaluate_with_slots(false_branch, environment, slots)
            }
        }
        Expression::Environment => Ok(environment.clone()),
        Expression::StackReference(index) => slots
            .get(*index)
            .and_then(Clone::clone)
            .ok_or_else(|| {
                FirError::compile(format!("stack slot {index} read before assignment"))
            }),
    }
}

/// Run a compiled program against an environment value with a linear
/// program counter and no native recursion across instructions.
pub fn run_program(program: &Program, environment: &Value) -> Result<Value, FirError> {
    let mut slots: Vec<Option<Value>> = vec![None; program.len()];
    let mut last_assigned: Option<Value> = None;
    let mut pc: usize = 0;

    loop {
        let instruction = program
            .instructions
            .get(pc)
            .ok_or_else(|| FirError::compile(format!("program counter {pc} out of range")))?;
        match instruction {
            StackInstruction::Eval(expr) => {
                expr.check_depth()?;
                let value = evaluate_with_slots(expr, environment, &slots)?;
                slots[pc] = Some(value.clone());
                last_assigned = Some(value);
                pc += 1;
            }
            StackInstruction::Jump(offset) => {
                pc = jump_target(pc, *offset)?;
            }
            StackInstruction::ConditionalJump { true_branch_offset } => {
                let condition = last_assigned
                    .as_ref()
                    .ok_or_else(|| FirError::compile("conditional jump before any assignment"))?;
                if kernel::is_truthy(condition) {
                    pc = jump_target(pc, *true_branch_offset)?;
                } else {
                    pc += 1;
                }
            }
            StackInstruction::Return => {
                return last_assigned
                    .ok_or_else(|| FirError::compile("return before any assignment"));
            }
            StackInstruction::CopyLastAssigned => {
                let value = last_assigned
                    .clone()
                    .ok_or_else(|| FirError::compile("copy before any assignment"))?;
                slots[pc] = Some(value);
                pc += 1;
            }
        }
    }
}

fn jump_target(pc: usize, offset: i32) -> Result<usize, FirError> {
    let base = pc as i64 + 1;
    let target = base + offset as i64;
    usize::try_from(target)
        .map_err(|_| FirError::compile(format!("jump from {pc} by {offset} leaves the program")))
}
