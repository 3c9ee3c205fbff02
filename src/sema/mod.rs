//! Semantic analysis: scope resolution and type checking
//!
//! The analyzer walks the AST once, resolving variable and function
//! references against a depth-tagged scope stack and checking every
//! operator, assignment, call, and return against the declared types.
//! Resolved expression types are recorded in a side table keyed by span,
//! leaving the AST itself untouched; later stages read types from the
//! returned [`TypedProgram`].
//!
//! Errors are collected into the analyzer rather than raised through a
//! shared flag, so two analyses never observe each other's state. Within
//! a block, the first failing statement aborts the rest of the block, but
//! both operands of a binary expression are always analyzed so each side
//! can surface its own error.

pub mod error;
pub mod scope;
pub mod types;

pub use error::{SemaError, SemaErrorKind};
pub use types::Type;

use crate::ast::*;
use crate::span::Span;
use scope::ScopeStack;
use std::collections::HashMap;

/// A function signature recorded at its declaration
#[derive(Debug, Clone, PartialEq)]
pub struct FnSig {
    pub return_type: Type,
    pub params: Vec<Type>,
}

/// The result of a successful analysis: resolved expression types keyed
/// by each expression's span, plus the function table for lowering.
#[derive(Debug, Clone, Default)]
pub struct TypedProgram {
    pub expr_types: HashMap<Span, Type>,
    pub functions: HashMap<String, FnSig>,
}

impl TypedProgram {
    /// Resolved type of the expression at `span`
    pub fn type_of(&self, span: Span) -> Option<&Type> {
        self.expr_types.get(&span)
    }
}

/// Per-function analysis context, threaded explicitly through the
/// statement walk
#[derive(Debug, Clone, Copy)]
struct FnContext<'a> {
    name: &'a str,
    return_type: &'a Type,
}

/// The semantic analyzer
#[derive(Default)]
pub struct Analyzer {
    scopes: ScopeStack,
    functions: HashMap<String, FnSig>,
    expr_types: HashMap<Span, Type>,
    errors: Vec<SemaError>,
}

/// Marker for an analysis failure; the diagnostic itself has already
/// been recorded on the analyzer.
type Failed = ();

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyze a translation unit.
    ///
    /// Each declaration is analyzed even when an earlier one failed, so
    /// one run surfaces errors from several functions.
    pub fn analyze(mut self, program: &Program) -> Result<TypedProgram, Vec<SemaError>> {
        for decl in &program.decls {
            let _ = self.analyze_function(decl);
        }

        if self.errors.is_empty() {
            Ok(TypedProgram {
                expr_types: self.expr_types,
                functions: self.functions,
            })
        } else {
            Err(self.errors)
        }
    }

    fn error(&mut self, kind: SemaErrorKind, span: Span) -> Result<Type, Failed> {
        self.errors.push(SemaError::new(kind, span));
        Err(())
    }

    fn resolve_type(&self, name: &TypeName) -> Type {
        match &name.kind {
            TypeNameKind::Int => Type::Int,
            TypeNameKind::Char => Type::Char,
            TypeNameKind::Void => Type::Void,
            TypeNameKind::Struct(name) => Type::Struct(name.clone()),
        }
    }

    // ============ Declarations ============

    fn analyze_function(&mut self, decl: &FunctionDecl) -> Result<(), Failed> {
        let return_type = self.resolve_type(&decl.return_type);
        if !return_type.is_valid_return() {
            self.error(
                SemaErrorKind::UnsupportedType(return_type.clone()),
                decl.return_type.span,
            )?;
        }

        if self.functions.contains_key(&decl.name.name) {
            self.error(
                SemaErrorKind::DuplicateFunction(decl.name.name.clone()),
                decl.name.span,
            )?;
        }

        let mut param_types = Vec::with_capacity(decl.params.len());
        for (i, param) in decl.params.iter().enumerate() {
            let ty = self.resolve_type(&param.ty);
            if !ty.is_valid_storage() {
                self.error(SemaErrorKind::UnsupportedType(ty.clone()), param.ty.span)?;
            }
            if decl.params[..i].iter().any(|p| p.name.name == param.name.name) {
                self.error(
                    SemaErrorKind::DuplicateParameter(param.name.name.clone()),
                    param.name.span,
                )?;
            }
            param_types.push(ty);
        }

        // Registered before the body so recursive calls resolve
        self.functions.insert(
            decl.name.name.clone(),
            FnSig {
                return_type: return_type.clone(),
                params: param_types.clone(),
            },
        );

        let ctx = FnContext {
            name: &decl.name.name,
            return_type: &return_type,
        };

        // Parameters live one level above the body block, so the body can
        // be analyzed as an ordinary nested scope
        self.scopes.enter();
        let mut ok = true;
        for (param, ty) in decl.params.iter().zip(&param_types) {
            if self
                .scopes
                .declare(&param.name.name, ty.clone(), param.name.span)
                .is_err()
            {
                // Duplicates were already reported above
                ok = false;
            }
        }
        let body_ok = self.analyze_block(&decl.body, ctx).is_ok();
        self.scopes.exit();

        if !(ok && body_ok) {
            return Err(());
        }

        // Shallow return check: a non-void function needs a return among
        // its top-level body statements
        if return_type != Type::Void
            && !decl
                .body
                .stmts
                .iter()
                .any(|stmt| matches!(stmt.kind, StmtKind::Return(_)))
        {
            self.error(
                SemaErrorKind::MissingReturn(decl.name.name.clone()),
                decl.name.span,
            )?;
        }

        Ok(())
    }

    // ============ Statements ============

    fn analyze_block(&mut self, block: &Block, ctx: FnContext) -> Result<(), Failed> {
        self.scopes.enter();
        let mut result = Ok(());
        for stmt in &block.stmts {
            if self.analyze_stmt(stmt, ctx).is_err() {
                result = Err(());
                break;
            }
        }
        // The purge must run even when a statement failed
        self.scopes.exit();
        result
    }

    fn analyze_stmt(&mut self, stmt: &Stmt, ctx: FnContext) -> Result<(), Failed> {
        match &stmt.kind {
            StmtKind::VarDecl { ty, name, init } => {
                let declared = self.resolve_type(ty);
                if !declared.is_valid_storage() {
                    self.error(SemaErrorKind::UnsupportedType(declared.clone()), ty.span)?;
                }
                let init_ty = self.analyze_expr(init, ctx)?;
                if init_ty != declared {
                    self.error(
                        SemaErrorKind::AssignTypeMismatch {
                            target: declared.clone(),
                            value: init_ty,
                        },
                        init.span,
                    )?;
                }
                if self.scopes.declare(&name.name, declared, name.span).is_err() {
                    self.error(
                        SemaErrorKind::DuplicateIdentifier(name.name.clone()),
                        name.span,
                    )?;
                }
                Ok(())
            }
            StmtKind::Expr(expr) => {
                self.analyze_expr(expr, ctx)?;
                Ok(())
            }
            StmtKind::Print(expr) => {
                let ty = self.analyze_expr(expr, ctx)?;
                if ty != Type::CStr {
                    self.error(SemaErrorKind::PrintOperandNotString(ty), expr.span)?;
                }
                Ok(())
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond, ctx)?;
                self.analyze_stmt(then_branch, ctx)?;
                if let Some(else_branch) = else_branch {
                    self.analyze_stmt(else_branch, ctx)?;
                }
                Ok(())
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond, ctx)?;
                self.analyze_stmt(body, ctx)
            }
            StmtKind::Block(block) => self.analyze_block(block, ctx),
            StmtKind::Return(value) => match value {
                Some(expr) => {
                    let ty = self.analyze_expr(expr, ctx)?;
                    if &ty != ctx.return_type {
                        self.error(
                            SemaErrorKind::ReturnTypeMismatch {
                                expected: ctx.return_type.clone(),
                                found: ty,
                            },
                            expr.span,
                        )?;
                    }
                    Ok(())
                }
                None => {
                    if ctx.return_type != &Type::Void {
                        self.error(
                            SemaErrorKind::MissingReturnValue(ctx.name.to_string()),
                            stmt.span,
                        )?;
                    }
                    Ok(())
                }
            },
        }
    }

    /// Conditions use C truthiness over `int`; there is no boolean type
    fn check_condition(&mut self, cond: &Expr, ctx: FnContext) -> Result<(), Failed> {
        let ty = self.analyze_expr(cond, ctx)?;
        if ty != Type::Int {
            self.error(SemaErrorKind::ConditionNotInt(ty), cond.span)?;
        }
        Ok(())
    }

    // ============ Expressions ============

    fn analyze_expr(&mut self, expr: &Expr, ctx: FnContext) -> Result<Type, Failed> {
        let ty = match &expr.kind {
            ExprKind::Literal(lit) => match lit {
                Literal::Int(_) => Type::Int,
                Literal::Char(_) => Type::Char,
                Literal::Float(_) => Type::Float,
                Literal::Double(_) => Type::Double,
                Literal::Str(_) => Type::CStr,
            },
            ExprKind::Variable(ident) => match self.scopes.lookup(&ident.name) {
                Some(entry) => entry.ty.clone(),
                None => {
                    return self.error(
                        SemaErrorKind::UndefinedVariable(ident.name.clone()),
                        ident.span,
                    )
                }
            },
            ExprKind::Binary { op, left, right } => {
                // Both sides analyzed unconditionally so each can report
                let lt = self.analyze_expr(left, ctx);
                let rt = self.analyze_expr(right, ctx);
                let (lt, rt) = (lt?, rt?);
                match types::check_binary(*op, &lt, &rt) {
                    Some(ty) => ty,
                    None => {
                        return self.error(
                            SemaErrorKind::BinaryOpMismatch {
                                op: *op,
                                left: lt,
                                right: rt,
                            },
                            expr.span,
                        )
                    }
                }
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.analyze_expr(operand, ctx)?;
                match types::check_unary(*op, &ty) {
                    Some(ty) => ty,
                    None => {
                        return self.error(
                            SemaErrorKind::UnaryOpMismatch {
                                op: *op,
                                operand: ty,
                            },
                            expr.span,
                        )
                    }
                }
            }
            ExprKind::Assign { target, value } => {
                let value_ty = self.analyze_expr(value, ctx);
                if !matches!(target.kind, ExprKind::Variable(_)) {
                    return self.error(SemaErrorKind::InvalidAssignTarget, target.span);
                }
                let target_ty = self.analyze_expr(target, ctx);
                let (target_ty, value_ty) = (target_ty?, value_ty?);
                if target_ty != value_ty {
                    return self.error(
                        SemaErrorKind::AssignTypeMismatch {
                            target: target_ty,
                            value: value_ty,
                        },
                        expr.span,
                    );
                }
                target_ty
            }
            ExprKind::Call { callee, args } => {
                let mut arg_types = Vec::with_capacity(args.len());
                let mut failed = false;
                for arg in args {
                    match self.analyze_expr(arg, ctx) {
                        Ok(ty) => arg_types.push(ty),
                        Err(()) => failed = true,
                    }
                }
                let sig = match self.functions.get(&callee.name) {
                    Some(sig) => sig.clone(),
                    None => {
                        return self.error(
                            SemaErrorKind::UndefinedFunction(callee.name.clone()),
                            callee.span,
                        )
                    }
                };
                if failed {
                    return Err(());
                }
                if arg_types.len() != sig.params.len() {
                    return self.error(
                        SemaErrorKind::WrongArgCount {
                            name: callee.name.clone(),
                            expected: sig.params.len(),
                            found: arg_types.len(),
                        },
                        expr.span,
                    );
                }
                for (i, (found, expected)) in arg_types.iter().zip(&sig.params).enumerate() {
                    if found != expected {
                        return self.error(
                            SemaErrorKind::ArgTypeMismatch {
                                name: callee.name.clone(),
                                index: i + 1,
                                expected: expected.clone(),
                                found: found.clone(),
                            },
                            args[i].span,
                        );
                    }
                }
                sig.return_type
            }
            ExprKind::Member { .. } => {
                return self.error(SemaErrorKind::MemberAccessUnsupported, expr.span)
            }
        };

        self.expr_types.insert(expr.span, ty.clone());
        Ok(ty)
    }
}

/// Analyze a parsed translation unit
pub fn analyze(program: &Program) -> Result<TypedProgram, Vec<SemaError>> {
    Analyzer::new().analyze(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn parse_ok(source: &str) -> Program {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        program
    }

    fn check_ok(source: &str) -> TypedProgram {
        let program = parse_ok(source);
        match analyze(&program) {
            Ok(typed) => typed,
            Err(errors) => panic!("unexpected errors: {:?}", errors),
        }
    }

    fn check_err(source: &str) -> Vec<SemaError> {
        let program = parse_ok(source);
        match analyze(&program) {
            Ok(_) => panic!("expected analysis to fail"),
            Err(errors) => errors,
        }
    }

    #[test]
    fn test_valid_program() {
        check_ok(
            r#"
            int add(int a, int b) {
                return a + b;
            }
            void main() {
                int x = add(1, 2);
                printf("done");
            }
            "#,
        );
    }

    #[test]
    fn test_undefined_variable() {
        let errors = check_err("void main() { int x = y; }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::UndefinedVariable(ref name) if name == "y"
        ));
    }

    #[test]
    fn test_scope_before_use() {
        // Visible while its block is open
        check_ok("void main() { int x = 1; { int y = x; } }");
        // Gone once the block closes
        let errors = check_err("void main() { { int y = 1; } int z = y; }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::UndefinedVariable(_)
        ));
    }

    #[test]
    fn test_duplicate_variable() {
        let errors = check_err("void main() { int x = 1; int x = 2; }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::DuplicateIdentifier(ref name) if name == "x"
        ));
    }

    #[test]
    fn test_shadowing_rejected() {
        let errors = check_err("void main() { int x = 1; { int x = 2; } }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::DuplicateIdentifier(_)
        ));
    }

    #[test]
    fn test_param_visible_in_body() {
        check_ok("int id(int a) { return a; }");
    }

    #[test]
    fn test_param_shadowing_rejected() {
        let errors = check_err("int f(int a) { int a = 1; return a; }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::DuplicateIdentifier(_)
        ));
    }

    #[test]
    fn test_duplicate_parameter() {
        let errors = check_err("int f(int a, int a) { return a; }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::DuplicateParameter(_)
        ));
    }

    #[test]
    fn test_duplicate_function() {
        let errors = check_err("void f() { } void f() { }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::DuplicateFunction(_)
        ));
    }

    #[test]
    fn test_binary_type_mismatch() {
        let errors = check_err(r#"void main() { int x = 1 + "hi"; }"#);
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::BinaryOpMismatch { .. }
        ));
    }

    #[test]
    fn test_binary_result_type_in_table() {
        // Every binary node that survives analysis sits in the operator
        // table for its resolved operand types
        let source = "int f(int a, char c) { int x = a + 1 < 2; int y = a and 1; return x; }";
        let program = parse_ok(source);
        let typed = analyze(&program).unwrap();

        fn walk(expr: &Expr, typed: &TypedProgram) {
            if let ExprKind::Binary { op, left, right } = &expr.kind {
                let lt = typed.type_of(left.span).unwrap();
                let rt = typed.type_of(right.span).unwrap();
                assert!(types::check_binary(*op, lt, rt).is_some());
                walk(left, typed);
                walk(right, typed);
            }
        }
        for decl in &program.decls {
            for stmt in &decl.body.stmts {
                if let StmtKind::VarDecl { init, .. } = &stmt.kind {
                    walk(init, &typed);
                }
            }
        }
    }

    #[test]
    fn test_assignment_types() {
        check_ok("void main() { int x = 1; x = 2; }");
        let errors = check_err(r#"void main() { int x = 1; x = "hi"; }"#);
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::AssignTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_assignment_target_must_be_variable() {
        let errors = check_err("void main() { 1 = 2; }");
        assert!(matches!(errors[0].kind, SemaErrorKind::InvalidAssignTarget));
    }

    #[test]
    fn test_assignment_as_expression() {
        check_ok("void main() { int x = 1; int y = x = 2; }");
    }

    #[test]
    fn test_condition_must_be_int() {
        check_ok("void main() { if (1) { } }");
        let errors = check_err(r#"void main() { while ("hi") { } }"#);
        assert!(matches!(errors[0].kind, SemaErrorKind::ConditionNotInt(_)));
    }

    #[test]
    fn test_print_requires_string() {
        let errors = check_err("void main() { printf(1); }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::PrintOperandNotString(_)
        ));
    }

    #[test]
    fn test_undefined_function() {
        let errors = check_err("void main() { f(); }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::UndefinedFunction(_)
        ));
    }

    #[test]
    fn test_call_arity_and_types() {
        let errors = check_err("int f(int a) { return a; } void main() { f(); }");
        assert!(matches!(errors[0].kind, SemaErrorKind::WrongArgCount { .. }));

        let errors = check_err(r#"int f(int a) { return a; } void main() { f("hi"); }"#);
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::ArgTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_recursive_call_resolves() {
        check_ok("int f(int n) { if (n) { return f(n - 1); } return 0; }");
    }

    #[test]
    fn test_forward_call_rejected() {
        // The function table is populated in declaration order
        let errors = check_err("void main() { g(); } void g() { }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::UndefinedFunction(_)
        ));
    }

    #[test]
    fn test_return_type_mismatch() {
        let errors = check_err(r#"int f() { return "hi"; }"#);
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::ReturnTypeMismatch { .. }
        ));
    }

    #[test]
    fn test_bare_return_in_nonvoid() {
        let errors = check_err("int f() { return; }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::MissingReturnValue(_)
        ));
    }

    #[test]
    fn test_missing_return() {
        let errors = check_err("int f() { int x = 1; }");
        assert!(matches!(errors[0].kind, SemaErrorKind::MissingReturn(_)));
    }

    #[test]
    fn test_return_check_is_shallow() {
        // A return nested inside a branch does not satisfy the top-level
        // check
        let errors = check_err("int f() { if (1) { return 1; } }");
        assert!(matches!(errors[0].kind, SemaErrorKind::MissingReturn(_)));
        // One at the end does
        check_ok("int f() { if (1) { return 1; } return 0; }");
    }

    #[test]
    fn test_struct_types_rejected() {
        let errors = check_err("void f(struct Point p) { }");
        assert!(matches!(errors[0].kind, SemaErrorKind::UnsupportedType(_)));
    }

    #[test]
    fn test_member_access_rejected() {
        let errors = check_err("void main() { int x = 1; x.y; }");
        assert!(matches!(
            errors[0].kind,
            SemaErrorKind::MemberAccessUnsupported
        ));
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let source = "int f(int a) { int x = a + 1; return x; }";
        let program = parse_ok(source);
        let first = analyze(&program).unwrap();
        let second = analyze(&program).unwrap();
        assert_eq!(first.expr_types, second.expr_types);
    }
}
