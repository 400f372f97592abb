//! Lowering from the program tree to a bytecode [`Module`].
//!
//! Compilation is two passes. Pass 1 predeclares a `Function` placeholder
//! for the synthetic `main` and for every top-level function, so direct
//! calls resolve to a table index regardless of declaration order. Pass 2
//! lowers `main` (all non-function top-level statements) and each function
//! body.
//!
//! The failure regime here is fail-fast: the first unsupported shape or
//! unresolved direct-call target aborts the whole call with a
//! [`CompileError`] and no partial module is produced (contrast with the
//! resolver, which accumulates diagnostics and never aborts).

use sprig_core::CompileError;
use sprig_parser::ast::{BinaryOp, Expr, FunDecl, LiteralKind, Program, Stmt, UnaryOp};

use crate::bytecode::{Constant, Function, Module, Opcode};
use crate::emit::FunctionEmitter;

/// Lowers a program tree into a bytecode module.
///
/// All state is created fresh inside [`compile`](Compiler::compile); the
/// type itself is just the traversal context.
#[derive(Debug)]
pub struct Compiler {
    module: Module,
    fx: FunctionEmitter,
}

impl Compiler {
    /// Compile a program into a module, or fail fast on the first
    /// unsupported shape.
    pub fn compile(program: &Program<'_>) -> Result<Module, CompileError> {
        let compiler = Self {
            module: Module::new(),
            fx: FunctionEmitter::new(),
        };
        compiler.run(program)
    }

    fn run(mut self, program: &Program<'_>) -> Result<Module, CompileError> {
        let funs: Vec<&FunDecl<'_>> = program
            .stmts()
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Fun(decl) => Some(*decl),
                _ => None,
            })
            .collect();

        // Pass 1: predeclare `main` and every top-level function so calls
        // can resolve a table index before bodies exist.
        self.module.add_function(Function::new("main", 0));
        for decl in &funs {
            self.module
                .add_function(Function::new(decl.name.name, decl.params.len()));
        }

        // Pass 2: lower `main`, then each function body.
        self.fx = FunctionEmitter::new();
        self.fx.emit_a(Opcode::Enter, 0);
        for stmt in program.stmts() {
            if !matches!(stmt, Stmt::Fun(_)) {
                self.stmt(stmt)?;
            }
        }
        self.fx.emit(Opcode::Leave);
        self.fx.emit(Opcode::Ret);
        self.seal(0);

        for (i, decl) in funs.iter().enumerate() {
            self.fx = FunctionEmitter::new();
            // Parameters occupy the first slots, in declaration order.
            for param in decl.params {
                self.fx.alloc_slot(param.name);
            }
            self.fx.emit_a(Opcode::Enter, 0);
            for stmt in decl.body {
                self.stmt(stmt)?;
            }
            // Implicit valueless return on fall-through.
            self.fx.emit(Opcode::Leave);
            self.fx.emit(Opcode::Ret);
            self.seal(i + 1);
        }

        Ok(self.module)
    }

    /// Move the finished emitter state into the predeclared function slot.
    fn seal(&mut self, index: usize) {
        let fx = std::mem::take(&mut self.fx);
        let (code, nlocals) = fx.finish();
        let func = &mut self.module.funcs[index];
        func.code = code;
        func.nlocals = nlocals;
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn stmt(&mut self, stmt: &Stmt<'_>) -> Result<(), CompileError> {
        match stmt {
            Stmt::Let(decl) => {
                // The slot exists from the declaration on; without an
                // initializer no instruction is emitted and the slot is
                // logically undefined.
                let slot = self.fx.alloc_slot(decl.name.name);
                if let Some(init) = &decl.init {
                    self.expr(init)?;
                    self.fx.emit_a(Opcode::Store, slot);
                }
            }
            Stmt::Expr(stmt) => {
                self.expr(&stmt.expr)?;
                self.fx.emit(Opcode::Pop);
            }
            Stmt::Print(stmt) => {
                self.expr(&stmt.value)?;
                self.fx.emit(Opcode::Print);
            }
            Stmt::Block(block) => {
                // Slot allocation is flat over the function; a block opens
                // no frame and emits no scope instructions.
                for stmt in block.stmts {
                    self.stmt(stmt)?;
                }
            }
            Stmt::If(stmt) => {
                self.expr(&stmt.condition)?;
                let skip = self.fx.new_label();
                self.fx.jump_if_false(skip);
                self.stmt(&stmt.then_branch)?;
                match &stmt.else_branch {
                    Some(else_branch) => {
                        let end = self.fx.new_label();
                        self.fx.jump(end);
                        self.fx.bind(skip);
                        self.stmt(else_branch)?;
                        self.fx.bind(end);
                    }
                    None => self.fx.bind(skip),
                }
            }
            Stmt::While(stmt) => {
                let start = self.fx.new_label();
                let exit = self.fx.new_label();
                self.fx.bind(start);
                self.expr(&stmt.condition)?;
                self.fx.jump_if_false(exit);
                self.stmt(&stmt.body)?;
                self.fx.jump(start);
                self.fx.bind(exit);
            }
            Stmt::Return(stmt) => {
                match &stmt.value {
                    Some(value) => self.expr(value)?,
                    None => {
                        let index = self.module.add_const(Constant::Nil);
                        self.fx.emit_a(Opcode::Const, index as i32);
                    }
                }
                self.fx.emit(Opcode::Leave);
                self.fx.emit(Opcode::Ret);
            }
            Stmt::Fun(_) => {
                // Top-level declarations are lowered separately in pass 2.
                // Local function declarations are not supported by this
                // backend and are skipped here.
            }
        }
        Ok(())
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn expr(&mut self, expr: &Expr<'_>) -> Result<(), CompileError> {
        match expr {
            Expr::Literal(lit) => {
                let constant = match lit.kind {
                    LiteralKind::Int(v) => Constant::Int(v),
                    LiteralKind::Bool(v) => Constant::Bool(v),
                    LiteralKind::Nil => Constant::Nil,
                };
                let index = self.module.add_const(constant);
                self.fx.emit_a(Opcode::Const, index as i32);
            }
            Expr::Variable(var) => {
                match self.fx.slot(var.name.name) {
                    Some(slot) => self.fx.emit_a(Opcode::Load, slot),
                    None => {
                        // Not a local in this function: a bare function
                        // name (or an unresolved name) outside call
                        // position lowers to a nil placeholder.
                        let index = self.module.add_const(Constant::Nil);
                        self.fx.emit_a(Opcode::Const, index as i32);
                    }
                }
            }
            Expr::Unary(unary) => {
                self.expr(&unary.right)?;
                match unary.op {
                    UnaryOp::Not => self.fx.emit(Opcode::Not),
                    UnaryOp::Neg => {
                        // No dedicated negate op: synthesized from zero and
                        // subtraction.
                        let index = self.module.add_const(Constant::Int(0));
                        self.fx.emit_a(Opcode::Const, index as i32);
                        self.fx.emit(Opcode::Sub);
                    }
                }
            }
            Expr::Binary(binary) => match binary.op {
                BinaryOp::And => {
                    // Short-circuit: keep the left value when it is false.
                    self.expr(&binary.left)?;
                    let end = self.fx.new_label();
                    self.fx.emit(Opcode::Dup);
                    self.fx.jump_if_false(end);
                    self.fx.emit(Opcode::Pop);
                    self.expr(&binary.right)?;
                    self.fx.bind(end);
                }
                BinaryOp::Or => {
                    // Short-circuit: keep the left value when it is true.
                    self.expr(&binary.left)?;
                    let end = self.fx.new_label();
                    self.fx.emit(Opcode::Dup);
                    self.fx.emit(Opcode::Not);
                    self.fx.jump_if_false(end);
                    self.fx.emit(Opcode::Pop);
                    self.expr(&binary.right)?;
                    self.fx.bind(end);
                }
                op => {
                    // Fully eager: left, then right, then the operator.
                    self.expr(&binary.left)?;
                    self.expr(&binary.right)?;
                    let opcode = match op {
                        BinaryOp::Add => Opcode::Add,
                        BinaryOp::Sub => Opcode::Sub,
                        BinaryOp::Mul => Opcode::Mul,
                        BinaryOp::Div => Opcode::Div,
                        BinaryOp::Equal => Opcode::Eq,
                        BinaryOp::NotEqual => Opcode::Ne,
                        BinaryOp::Less => Opcode::Lt,
                        BinaryOp::LessEqual => Opcode::Le,
                        BinaryOp::Greater => Opcode::Gt,
                        BinaryOp::GreaterEqual => Opcode::Ge,
                        BinaryOp::And | BinaryOp::Or => {
                            unreachable!("short-circuit operators are lowered above")
                        }
                    };
                    self.fx.emit(opcode);
                }
            },
            Expr::Grouping(group) => self.expr(&group.expr)?,
            Expr::Call(call) => {
                // Only direct calls by name are supported.
                let Expr::Variable(var) = &call.callee else {
                    return Err(CompileError::IndirectCallee { span: call.span });
                };
                let Some(index) = self.module.find_function_by_name(var.name.name) else {
                    return Err(CompileError::UnknownFunction {
                        name: var.name.name.to_string(),
                        span: var.name.span,
                    });
                };
                for arg in call.args {
                    self.expr(arg)?;
                }
                self.fx
                    .emit_ab(Opcode::Call, index as i32, call.args.len() as i32);
            }
        }
        Ok(())
    }
}
