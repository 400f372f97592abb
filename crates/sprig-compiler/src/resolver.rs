//! Semantic resolution: scope checking and best-effort typing.
//!
//! The resolver is one static pass over the program tree. It accumulates
//! diagnostics and never aborts: every call returns the complete list of
//! findings in traversal order, and an empty list is the success signal.
//!
//! Top-level functions are pre-declared before any statement is visited,
//! which is what allows forward references and mutual recursion between
//! them. Nested function declarations are deliberately not pre-declared.

use rustc_hash::{FxHashMap, FxHashSet};

use sprig_core::{Diagnostic, Span};
use sprig_parser::ast::{BinaryOp, Expr, LiteralKind, Program, Stmt, UnaryOp};

use crate::symbol::{Symbol, SymbolKind, Type};

/// The semantic resolution pass.
///
/// State is rebuilt from scratch on every [`resolve`](Resolver::resolve)
/// call, so one resolver can be reused across independent programs.
#[derive(Debug, Default)]
pub struct Resolver {
    /// Scope frames, innermost last.
    scopes: Vec<FxHashMap<String, Symbol>>,
    diags: Vec<Diagnostic>,
}

impl Resolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a program, returning every diagnostic in traversal order.
    pub fn resolve(&mut self, program: &Program<'_>) -> Vec<Diagnostic> {
        self.scopes.clear();
        self.diags.clear();

        self.begin_scope(); // global
        // Pre-declare all top-level functions so calls can see arity
        // regardless of declaration order.
        for stmt in program.stmts() {
            if let Stmt::Fun(f) = stmt {
                self.declare(f.name.span, f.name.name, Symbol::fun(f.params.len()));
            }
        }
        for stmt in program.stmts() {
            self.stmt(stmt);
        }
        self.end_scope();

        std::mem::take(&mut self.diags)
    }

    // ==========================================================================
    // Scopes
    // ==========================================================================

    fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare a name in the innermost scope.
    ///
    /// A clash yields a diagnostic and leaves the existing binding in
    /// place, so later code keeps resolving against the original symbol.
    fn declare(&mut self, span: Span, name: &str, symbol: Symbol) -> bool {
        let current = self
            .scopes
            .last_mut()
            .expect("resolver always has a scope open");
        if current.contains_key(name) {
            self.error(span, format!("Duplicate declaration: '{name}'"));
            return false;
        }
        current.insert(name.to_string(), symbol);
        true
    }

    /// Look a name up through the scope chain, nearest frame first.
    fn lookup(&self, name: &str) -> Option<Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).copied())
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags.push(Diagnostic::new(span, message));
    }

    // ==========================================================================
    // Statements
    // ==========================================================================

    fn stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Let(decl) => {
                // The initializer is resolved before the name is declared,
                // so `let x = x;` sees the outer (or missing) binding.
                let ty = match &decl.init {
                    Some(init) => self.expr(init),
                    None => Type::Unknown,
                };
                self.declare(decl.name.span, decl.name.name, Symbol::var(ty));
            }
            Stmt::Expr(stmt) => {
                self.expr(&stmt.expr);
            }
            Stmt::Print(stmt) => {
                self.expr(&stmt.value);
            }
            Stmt::Block(block) => {
                self.begin_scope();
                for stmt in block.stmts {
                    self.stmt(stmt);
                }
                self.end_scope();
            }
            Stmt::If(stmt) => {
                let cond_ty = self.expr(&stmt.condition);
                self.check_bool(cond_ty, stmt.condition.span(), "if condition should be boolean");
                self.stmt(&stmt.then_branch);
                if let Some(else_branch) = &stmt.else_branch {
                    self.stmt(else_branch);
                }
            }
            Stmt::While(stmt) => {
                let cond_ty = self.expr(&stmt.condition);
                self.check_bool(
                    cond_ty,
                    stmt.condition.span(),
                    "while condition should be boolean",
                );
                self.stmt(&stmt.body);
            }
            Stmt::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    self.expr(value);
                }
            }
            Stmt::Fun(decl) => {
                // Function body scope seeded with parameters.
                self.begin_scope();
                let mut seen = FxHashSet::default();
                for param in decl.params {
                    if seen.contains(param.name) {
                        self.error(
                            param.span,
                            format!("Duplicate parameter: '{}'", param.name),
                        );
                    }
                    seen.insert(param.name);
                    self.declare(param.span, param.name, Symbol::var(Type::Unknown));
                }
                for stmt in decl.body {
                    self.stmt(stmt);
                }
                self.end_scope();
            }
        }
    }

    fn check_bool(&mut self, ty: Type, span: Span, message: &str) {
        if ty != Type::Bool && ty != Type::Unknown {
            self.error(span, message);
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    /// Resolve an expression, returning its best-effort static type.
    fn expr(&mut self, expr: &Expr<'_>) -> Type {
        match expr {
            Expr::Literal(lit) => match lit.kind {
                LiteralKind::Int(_) => Type::Int,
                LiteralKind::Bool(_) => Type::Bool,
                LiteralKind::Nil => Type::Nil,
            },
            Expr::Variable(var) => match self.lookup(var.name.name) {
                None => {
                    self.error(
                        var.name.span,
                        format!("Undefined identifier: '{}'", var.name.name),
                    );
                    Type::Unknown
                }
                Some(sym) => {
                    if sym.kind == SymbolKind::Fun {
                        Type::Function
                    } else {
                        sym.ty
                    }
                }
            },
            Expr::Unary(unary) => {
                let right_ty = self.expr(&unary.right);
                match unary.op {
                    UnaryOp::Not => {
                        if right_ty != Type::Bool && right_ty != Type::Unknown {
                            self.error(unary.span, "Operator '!' expects boolean");
                        }
                        Type::Bool
                    }
                    UnaryOp::Neg => {
                        if right_ty != Type::Int && right_ty != Type::Unknown {
                            self.error(unary.span, "Unary '-' expects int");
                        }
                        Type::Int
                    }
                }
            }
            Expr::Binary(binary) => {
                let left_ty = self.expr(&binary.left);
                let right_ty = self.expr(&binary.right);
                match binary.op {
                    BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                        if !is_int_like(left_ty) || !is_int_like(right_ty) {
                            self.error(
                                binary.op_span,
                                format!(
                                    "Arithmetic '{}' expects int operands",
                                    binary.op.symbol()
                                ),
                            );
                        }
                        Type::Int
                    }
                    BinaryOp::Less
                    | BinaryOp::LessEqual
                    | BinaryOp::Greater
                    | BinaryOp::GreaterEqual => {
                        if !is_int_like(left_ty) || !is_int_like(right_ty) {
                            self.error(
                                binary.op_span,
                                format!(
                                    "Comparison '{}' expects int operands",
                                    binary.op.symbol()
                                ),
                            );
                        }
                        Type::Bool
                    }
                    BinaryOp::Equal | BinaryOp::NotEqual => {
                        let same_basic = (left_ty == Type::Int && right_ty == Type::Int)
                            || (left_ty == Type::Bool && right_ty == Type::Bool)
                            || left_ty == Type::Unknown
                            || right_ty == Type::Unknown;
                        if !same_basic {
                            self.error(
                                binary.op_span,
                                "Equality expects operands of same basic type",
                            );
                        }
                        Type::Bool
                    }
                    BinaryOp::And | BinaryOp::Or => {
                        let bool_like =
                            |ty: Type| ty == Type::Bool || ty == Type::Unknown;
                        if !bool_like(left_ty) || !bool_like(right_ty) {
                            self.error(
                                binary.op_span,
                                format!(
                                    "Logical operator '{}' expects boolean operands",
                                    binary.op.symbol()
                                ),
                            );
                        }
                        Type::Bool
                    }
                }
            }
            Expr::Grouping(group) => self.expr(&group.expr),
            Expr::Call(call) => {
                // Only a bare-identifier callee resolving to a function is
                // arity-checked; the callee itself is not visited as an
                // expression.
                if let Expr::Variable(var) = &call.callee
                    && let Some(sym) = self.lookup(var.name.name)
                    && sym.kind == SymbolKind::Fun
                    && call.args.len() != sym.arity
                {
                    self.error(
                        var.name.span,
                        format!(
                            "Arity mismatch for function '{}': expected {} got {}",
                            var.name.name,
                            sym.arity,
                            call.args.len()
                        ),
                    );
                }
                for arg in call.args {
                    self.expr(arg);
                }
                Type::Unknown
            }
        }
    }
}

fn is_int_like(ty: Type) -> bool {
    ty == Type::Int || ty == Type::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;
    use bumpalo::Bump;
    use sprig_parser::Parser;

    fn check(source: &str) -> Vec<Diagnostic> {
        let arena = Bump::new();
        let program = Parser::parse(source, &arena).expect("program should parse");
        Resolver::new().resolve(&program)
    }

    fn messages(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn undefined_variable_reported() {
        let diags = check("print(x);");
        assert_eq!(messages(&diags), vec!["Undefined identifier: 'x'"]);
    }

    #[test]
    fn duplicate_declaration_reported() {
        let diags = check("let x = 1; let x = 2;");
        assert_eq!(messages(&diags), vec!["Duplicate declaration: 'x'"]);
    }

    #[test]
    fn duplicate_parameter_reported() {
        let diags = check("fn f(a, a) { return 0; }");
        // The scope insert still runs, so the clash is reported twice:
        // once as a parameter problem, once as a declaration problem.
        assert_eq!(
            messages(&diags),
            vec!["Duplicate parameter: 'a'", "Duplicate declaration: 'a'"]
        );
    }

    #[test]
    fn arity_mismatch_reported() {
        let diags = check("fn add(a, b) { return a + b; } print(add(1));");
        assert_eq!(
            messages(&diags),
            vec!["Arity mismatch for function 'add': expected 2 got 1"]
        );
    }

    #[test]
    fn arithmetic_type_check() {
        let diags = check("print(true + 1);");
        assert_eq!(
            messages(&diags),
            vec!["Arithmetic '+' expects int operands"]
        );
    }

    #[test]
    fn comparison_type_check() {
        let diags = check("print(1 < false);");
        assert_eq!(
            messages(&diags),
            vec!["Comparison '<' expects int operands"]
        );
    }

    #[test]
    fn equality_mixed_types_rejected() {
        let diags = check("print(1 == true);");
        assert_eq!(
            messages(&diags),
            vec!["Equality expects operands of same basic type"]
        );
    }

    #[test]
    fn logical_operator_type_check() {
        let diags = check("print(1 && true);");
        assert_eq!(
            messages(&diags),
            vec!["Logical operator '&&' expects boolean operands"]
        );
    }

    #[test]
    fn unary_type_checks() {
        let diags = check("print(!1); print(-true);");
        assert_eq!(
            messages(&diags),
            vec!["Operator '!' expects boolean", "Unary '-' expects int"]
        );
    }

    #[test]
    fn if_condition_must_be_boolean() {
        let diags = check("if (1) { print(1); }");
        assert_eq!(messages(&diags), vec!["if condition should be boolean"]);
    }

    #[test]
    fn while_condition_must_be_boolean() {
        let diags = check("while (1 + 2) { print(1); }");
        assert_eq!(messages(&diags), vec!["while condition should be boolean"]);
    }

    #[test]
    fn unknown_suppresses_downstream_checks() {
        // `y` is undefined, so its Unknown type silences the arithmetic
        // check at the same position.
        let diags = check("print(y + 1);");
        assert_eq!(messages(&diags), vec!["Undefined identifier: 'y'"]);
    }

    #[test]
    fn forward_reference_between_functions() {
        let diags = check("fn even(n) { return odd(n - 1); } fn odd(n) { return even(n - 1); }");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn shadowing_in_nested_block_is_allowed() {
        let diags = check("let x = 1; { let x = true; print(x || false); }");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn call_callee_is_not_visited() {
        // An unknown callee produces no diagnostic of its own; only the
        // arguments are resolved.
        let diags = check("ghost(1, 2);");
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
    }

    #[test]
    fn resolve_is_repeatable() {
        let arena = Bump::new();
        let program = Parser::parse("let x = 1; print(x + y);", &arena).unwrap();
        let mut resolver = Resolver::new();
        let first = resolver.resolve(&program);
        let second = resolver.resolve(&program);
        assert_eq!(first, second);
    }

    #[test]
    fn function_name_types_as_function_value() {
        // Using a function name in arithmetic trips the int check.
        let diags = check("fn f() { return 0; } print(f + 1);");
        assert_eq!(
            messages(&diags),
            vec!["Arithmetic '+' expects int operands"]
        );
    }
}
