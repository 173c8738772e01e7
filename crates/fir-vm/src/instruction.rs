//! Flat instruction sequence executable with a linear program counter.
//!
//! Every instruction owns the result slot matching its own index:
//! `Eval` writes its result there and records it as "last assigned";
//! `CopyLastAssigned` re-records the last-assigned value under its own
//! slot so a branch-join result gets a stable address that later
//! `StackReference` expressions can read. Jump offsets are relative to
//! the instruction after the jump.

use std::fmt;

use crate::expr::Expression;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackInstruction {
    /// Evaluate the (branch-free) expression, store it in this
    /// instruction's slot, and record it as last assigned.
    Eval(Expression),
    /// Unconditional relative jump.
    Jump(i32),
    /// Jump by the offset when the last-assigned value is truthy,
    /// otherwise fall through.
    ConditionalJump { true_branch_offset: i32 },
    /// Terminate, yielding the last-assigned value.
    Return,
    /// Store the last-assigned value in this instruction's slot.
    CopyLastAssigned,
}

impl fmt::Display for StackInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackInstruction::Eval(_) => write!(f, "eval"),
            StackInstruction::Jump(offset) => write!(f, "jump {offset}"),
            StackInstruction::ConditionalJump { true_branch_offset } => {
                write!(f, "cond-jump {true_branch_offset}")
            }
            StackInstruction::Return => write!(f, "return"),
            StackInstruction::CopyLastAssigned => write!(f, "copy-last"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub instructions: Vec<StackInstruction>,
}

impl Program {
    pub fn new(instructions: Vec<StackInstruction>) -> Program {
        Program { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{index:>4}: {instruction}")?;
        }
        Ok(())
    }
}
