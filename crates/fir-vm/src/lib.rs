//! Expression model and stack-instruction compiler of the fir runtime.

pub mod compiler;
pub mod eval;
pub mod expr;
pub mod inline;
pub mod instruction;
pub mod kernel;

pub use compiler::{compile, CompilationEnv};
pub use expr::{intern, resolve, Expression};
pub use inline::{compile_expression, CompiledExpression};
pub use instruction::{Program, StackInstruction};
