//! Compiled modules: constant pool and function table.

use std::fmt;

use super::Instr;

/// A value in the constant pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constant {
    /// Integer constant.
    Int(i64),
    /// Boolean constant.
    Bool(bool),
    /// The nil value.
    Nil,
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Bool(v) => write!(f, "{v}"),
            Constant::Nil => f.write_str("nil"),
        }
    }
}

/// A compiled function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    /// Function name.
    pub name: String,
    /// Declared parameter count; parameters occupy slots `0..arity`.
    pub arity: usize,
    /// High-water mark of local slots ever allocated.
    pub nlocals: usize,
    /// The instruction sequence.
    pub code: Vec<Instr>,
}

impl Function {
    /// Create an empty function with the given signature.
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
            nlocals: 0,
            code: Vec::new(),
        }
    }
}

/// A compiled module.
///
/// The constant pool is append-only and never deduplicated: the same
/// literal appearing twice yields two pool entries. The function table is
/// addressed by position; index 0 is the synthetic zero-arity `main`
/// wrapping all non-function top-level statements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    /// Ordered constant pool.
    pub consts: Vec<Constant>,
    /// Ordered function table.
    pub funcs: Vec<Function>,
}

impl Module {
    /// Create an empty module.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a constant, returning its pool index.
    pub fn add_const(&mut self, constant: Constant) -> usize {
        self.consts.push(constant);
        self.consts.len() - 1
    }

    /// Append a function, returning its table index.
    pub fn add_function(&mut self, function: Function) -> usize {
        self.funcs.push(function);
        self.funcs.len() - 1
    }

    /// Find a function by name, first match wins. Arity is not consulted.
    pub fn find_function_by_name(&self, name: &str) -> Option<usize> {
        self.funcs.iter().position(|f| f.name == name)
    }
}

impl fmt::Display for Module {
    /// Render the module as a textual listing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; sprig bytecode (textual)")?;
        writeln!(f, ".consts {}", self.consts.len())?;
        for (i, constant) in self.consts.iter().enumerate() {
            writeln!(f, "  {i}: {constant}")?;
        }
        writeln!(f, ".funcs {}", self.funcs.len())?;
        for (i, func) in self.funcs.iter().enumerate() {
            writeln!(
                f,
                "\n.func {i} {} arity={} locals={}",
                func.name, func.arity, func.nlocals
            )?;
            for (pc, instr) in func.code.iter().enumerate() {
                writeln!(f, "{pc:4}  {instr}")?;
            }
            writeln!(f, ".end")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Opcode;

    #[test]
    fn constant_pool_is_not_deduplicated() {
        let mut module = Module::new();
        let first = module.add_const(Constant::Int(3));
        let second = module.add_const(Constant::Int(3));
        assert_eq!(first, 0);
        assert_eq!(second, 1);
        assert_eq!(module.consts.len(), 2);
    }

    #[test]
    fn find_function_first_match_wins() {
        let mut module = Module::new();
        module.add_function(Function::new("main", 0));
        module.add_function(Function::new("f", 1));
        module.add_function(Function::new("f", 2));

        assert_eq!(module.find_function_by_name("f"), Some(1));
        assert_eq!(module.find_function_by_name("missing"), None);
    }

    #[test]
    fn display_lists_consts_and_funcs() {
        let mut module = Module::new();
        module.add_const(Constant::Int(7));
        module.add_const(Constant::Nil);
        let mut main = Function::new("main", 0);
        main.code.push(Instr::with_a(Opcode::Const, 0));
        main.code.push(Instr::new(Opcode::Print));
        module.add_function(main);

        let listing = module.to_string();
        assert!(listing.contains(".consts 2"));
        assert!(listing.contains("0: 7"));
        assert!(listing.contains("1: nil"));
        assert!(listing.contains(".func 0 main arity=0 locals=0"));
        assert!(listing.contains("CONST 0"));
        assert!(listing.contains("PRINT"));
        assert!(listing.contains(".end"));
    }
}
