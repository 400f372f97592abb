//! Structural verification of compiled modules.
//!
//! The verifier is a post-hoc linear scan over every function. It checks
//! that call indices point into the function table and that branch targets
//! stay inside the code (landing exactly past the last instruction is a
//! valid fall-through target). It always completes and reports every
//! problem found; a non-empty report means the module is not runnable.
//!
//! Not checked, deliberately: stack-depth balance, operand types, and
//! reachability. Those belong to a future pass and are not assumed safe.

use std::fmt;

use crate::bytecode::{Module, Opcode};

/// One structural problem found in a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Where the problem sits, as `<function>:<pc>`.
    pub site: String,
    /// What is wrong.
    pub message: String,
}

impl Problem {
    fn new(func_name: &str, pc: usize, message: impl Into<String>) -> Self {
        Self {
            site: format!("{func_name}:{pc}"),
            message: message.into(),
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.site, self.message)
    }
}

/// Scan a module for structural problems, in function/pc order.
pub fn verify(module: &Module) -> Vec<Problem> {
    let mut problems = Vec::new();
    for func in &module.funcs {
        for (pc, instr) in func.code.iter().enumerate() {
            match instr.op {
                Opcode::Call => {
                    if instr.a < 0 || instr.a as usize >= module.funcs.len() {
                        problems.push(Problem::new(
                            &func.name,
                            pc,
                            "CALL funcIndex out of range",
                        ));
                    }
                }
                Opcode::Jmp | Opcode::JmpIfFalse => {
                    let target = pc as i64 + 1 + instr.a as i64;
                    if target < 0 || target > func.code.len() as i64 {
                        problems.push(Problem::new(&func.name, pc, "Jump target out of range"));
                    }
                }
                _ => {}
            }
        }
    }
    problems
}
