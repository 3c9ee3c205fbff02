//! Lowering from the typed AST to IR
//!
//! Dispatch is type-directed: every expression's resolved type comes from
//! the side table produced by semantic analysis, and picks between the
//! integer and floating instruction sets. Variables live in stack slots;
//! reads load from the slot, and the left side of an assignment is
//! lowered in address mode, which yields the slot register without a
//! load. The mode is an explicit parameter on the lowering call, so it
//! cannot leak into sibling expressions.
//!
//! Lowering errors indicate a mismatch with the analyzer, not a problem
//! in the source program; a checked program always lowers.

use super::builder::IrBuilder;
use super::instr::{CmpOp, InstrKind, Terminator};
use super::types::{IrType, Module, VReg};
use crate::ast::*;
use crate::sema::{Type, TypedProgram};
use crate::span::Span;
use std::collections::HashMap;
use thiserror::Error;

/// Internal-consistency failures during lowering
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LowerError {
    #[error("expression has no resolved type")]
    Untyped { span: Span },

    #[error("{what} is not supported by the code generator")]
    Unsupported { what: &'static str, span: Span },

    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl LowerError {
    pub fn span(&self) -> Option<Span> {
        match self {
            LowerError::Untyped { span } => Some(*span),
            LowerError::Unsupported { span, .. } => Some(*span),
            LowerError::Internal(_) => None,
        }
    }
}

/// How an expression is being lowered: for its value, or for the address
/// of its storage (only the left side of an assignment)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Value,
    Address,
}

pub struct Lowerer<'a> {
    builder: IrBuilder,
    typed: &'a TypedProgram,
    /// Variable slots of the function currently being lowered. Shadowing
    /// is rejected upstream, so sibling blocks reusing a name may simply
    /// overwrite the dead entry.
    locals: HashMap<String, (VReg, IrType)>,
}

/// Lower a checked translation unit to an IR module
pub fn lower(
    program: &Program,
    typed: &TypedProgram,
    module_name: &str,
) -> Result<Module, LowerError> {
    let mut lowerer = Lowerer {
        builder: IrBuilder::new(module_name),
        typed,
        locals: HashMap::new(),
    };
    lowerer
        .builder
        .declare_external("printf", IrType::I32, vec![IrType::Ptr], true);

    for decl in &program.decls {
        lowerer.lower_function(decl)?;
    }
    Ok(lowerer.builder.finish())
}

fn ir_type(ty: &Type, span: Span) -> Result<IrType, LowerError> {
    match ty {
        Type::Int => Ok(IrType::I32),
        Type::Char => Ok(IrType::I8),
        Type::Void => Ok(IrType::Void),
        Type::Float => Ok(IrType::F32),
        Type::Double => Ok(IrType::F64),
        Type::CStr => Ok(IrType::Ptr),
        Type::Struct(_) => Err(LowerError::Unsupported {
            what: "struct type",
            span,
        }),
    }
}

fn cmp_op(op: BinaryOp) -> Option<CmpOp> {
    match op {
        BinaryOp::Eq => Some(CmpOp::Eq),
        BinaryOp::Ne => Some(CmpOp::Ne),
        BinaryOp::Lt => Some(CmpOp::Lt),
        BinaryOp::Le => Some(CmpOp::Le),
        BinaryOp::Gt => Some(CmpOp::Gt),
        BinaryOp::Ge => Some(CmpOp::Ge),
        _ => None,
    }
}

impl<'a> Lowerer<'a> {
    fn expr_type(&self, expr: &Expr) -> Result<&Type, LowerError> {
        self.typed
            .type_of(expr.span)
            .ok_or(LowerError::Untyped { span: expr.span })
    }

    fn expr_ir_type(&self, expr: &Expr) -> Result<IrType, LowerError> {
        ir_type(self.expr_type(expr)?, expr.span)
    }

    fn lower_function(&mut self, decl: &FunctionDecl) -> Result<(), LowerError> {
        let sig = self
            .typed
            .functions
            .get(&decl.name.name)
            .ok_or(LowerError::Internal("function missing from signature table"))?
            .clone();

        let ret = ir_type(&sig.return_type, decl.return_type.span)?;
        let mut param_types = Vec::with_capacity(sig.params.len());
        for (ty, param) in sig.params.iter().zip(&decl.params) {
            param_types.push(ir_type(ty, param.ty.span)?);
        }

        let regs = self.builder.start_function(&decl.name.name, ret, &param_types);
        self.locals.clear();

        // Promote each incoming argument to a stack slot so parameters
        // and locals are addressed uniformly
        for (param, (reg, ty)) in decl.params.iter().zip(regs.iter().zip(&param_types)) {
            let slot = self.builder.emit(*ty, InstrKind::Alloca);
            self.builder
                .emit_void(*ty, InstrKind::Store { value: *reg, ptr: slot });
            self.locals.insert(param.name.name.clone(), (slot, *ty));
        }

        for stmt in &decl.body.stmts {
            self.lower_stmt(stmt)?;
        }

        // Implicit void return; for a non-void function an unterminated
        // block here is an unreachable tail after its top-level return
        if !self.builder.is_terminated() {
            self.builder.terminate(Terminator::Ret(None));
        }

        self.builder.finish_function();
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), LowerError> {
        match &stmt.kind {
            StmtKind::VarDecl { name, init, .. } => {
                let ty = self.expr_ir_type(init)?;
                let slot = self.builder.emit(ty, InstrKind::Alloca);
                let value = self.lower_value(init)?;
                self.builder
                    .emit_void(ty, InstrKind::Store { value, ptr: slot });
                self.locals.insert(name.name.clone(), (slot, ty));
                Ok(())
            }
            StmtKind::Expr(expr) => {
                self.lower_expr(expr, Mode::Value)?;
                Ok(())
            }
            StmtKind::Print(expr) => {
                let text = match &expr.kind {
                    ExprKind::Literal(Literal::Str(text)) => text,
                    _ => return Err(LowerError::Internal("print operand is not a string literal")),
                };
                let name = self.builder.add_string_constant(text);
                let ptr = self.builder.emit(IrType::Ptr, InstrKind::GlobalAddr(name));
                self.builder.emit(
                    IrType::I32,
                    InstrKind::Call {
                        callee: "printf".to_string(),
                        args: vec![ptr],
                    },
                );
                Ok(())
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.lower_condition(cond)?;
                let then_bb = self.builder.fresh_block("then");
                let else_bb = else_branch
                    .as_ref()
                    .map(|_| self.builder.fresh_block("else"));
                let merge_bb = self.builder.fresh_block("merge");

                self.builder.terminate(Terminator::CondBr {
                    cond,
                    then_bb,
                    else_bb: else_bb.unwrap_or(merge_bb),
                });

                self.builder.switch_to(then_bb);
                self.lower_stmt(then_branch)?;
                self.builder.terminate(Terminator::Br(merge_bb));

                if let (Some(else_bb), Some(else_branch)) = (else_bb, else_branch) {
                    self.builder.switch_to(else_bb);
                    self.lower_stmt(else_branch)?;
                    self.builder.terminate(Terminator::Br(merge_bb));
                }

                self.builder.switch_to(merge_bb);
                Ok(())
            }
            StmtKind::While { cond, body } => {
                let cond_bb = self.builder.fresh_block("cond");
                let body_bb = self.builder.fresh_block("body");
                let merge_bb = self.builder.fresh_block("merge");

                self.builder.terminate(Terminator::Br(cond_bb));

                self.builder.switch_to(cond_bb);
                let cond = self.lower_condition(cond)?;
                self.builder.terminate(Terminator::CondBr {
                    cond,
                    then_bb: body_bb,
                    else_bb: merge_bb,
                });

                self.builder.switch_to(body_bb);
                self.lower_stmt(body)?;
                self.builder.terminate(Terminator::Br(cond_bb));

                self.builder.switch_to(merge_bb);
                Ok(())
            }
            StmtKind::Block(block) => {
                for stmt in &block.stmts {
                    self.lower_stmt(stmt)?;
                }
                Ok(())
            }
            StmtKind::Return(value) => {
                match value {
                    Some(expr) => {
                        let ty = self.expr_ir_type(expr)?;
                        let value = self.lower_value(expr)?;
                        self.builder.terminate(Terminator::Ret(Some((ty, value))));
                    }
                    None => self.builder.terminate(Terminator::Ret(None)),
                }
                Ok(())
            }
        }
    }

    /// Lower a condition to an `i1`: compare the integer value against
    /// zero for inequality (C truthiness)
    fn lower_condition(&mut self, cond: &Expr) -> Result<VReg, LowerError> {
        let value = self.lower_value(cond)?;
        let zero = self.builder.emit(IrType::I32, InstrKind::Const(0));
        Ok(self.builder.emit(
            IrType::Bool,
            InstrKind::ICmp {
                op: CmpOp::Ne,
                operand_ty: IrType::I32,
                lhs: value,
                rhs: zero,
            },
        ))
    }

    /// Lower an expression for its value, which must exist
    fn lower_value(&mut self, expr: &Expr) -> Result<VReg, LowerError> {
        self.lower_expr(expr, Mode::Value)?
            .ok_or(LowerError::Internal("expected a value, found void"))
    }

    fn lower_expr(&mut self, expr: &Expr, mode: Mode) -> Result<Option<VReg>, LowerError> {
        match &expr.kind {
            ExprKind::Literal(lit) => {
                let reg = match lit {
                    Literal::Int(value) => self
                        .builder
                        .emit(IrType::I32, InstrKind::Const(*value as i64)),
                    Literal::Char(value) => self
                        .builder
                        .emit(IrType::I8, InstrKind::Const(*value as i64)),
                    Literal::Float(value) => self
                        .builder
                        .emit(IrType::F32, InstrKind::FConst(*value as f64)),
                    Literal::Double(value) => {
                        self.builder.emit(IrType::F64, InstrKind::FConst(*value))
                    }
                    Literal::Str(text) => {
                        let name = self.builder.add_string_constant(text);
                        self.builder.emit(IrType::Ptr, InstrKind::GlobalAddr(name))
                    }
                };
                Ok(Some(reg))
            }
            ExprKind::Variable(ident) => {
                let (slot, ty) = *self
                    .locals
                    .get(&ident.name)
                    .ok_or(LowerError::Internal("variable has no stack slot"))?;
                let reg = match mode {
                    Mode::Address => slot,
                    Mode::Value => self.builder.emit(ty, InstrKind::Load { ptr: slot }),
                };
                Ok(Some(reg))
            }
            ExprKind::Binary { op, left, right } => {
                let ty = self.expr_ir_type(expr)?;
                let lhs = self.lower_value(left)?;
                let rhs = self.lower_value(right)?;
                Ok(Some(self.lower_binary(*op, ty, lhs, rhs)?))
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.expr_ir_type(expr)?;
                match op {
                    UnaryOp::Plus => Ok(Some(self.lower_value(operand)?)),
                    UnaryOp::Neg => {
                        let value = self.lower_value(operand)?;
                        let reg = if ty.is_float() {
                            let zero = self.builder.emit(ty, InstrKind::FConst(0.0));
                            self.builder.emit(ty, InstrKind::FSub(zero, value))
                        } else {
                            let zero = self.builder.emit(ty, InstrKind::Const(0));
                            self.builder.emit(ty, InstrKind::Sub(zero, value))
                        };
                        Ok(Some(reg))
                    }
                    UnaryOp::Deref => Err(LowerError::Unsupported {
                        what: "dereference",
                        span: expr.span,
                    }),
                }
            }
            ExprKind::Assign { target, value } => {
                // Right side first, then the target in address mode;
                // the assignment yields the right-hand value
                let ty = self.expr_ir_type(value)?;
                let rhs = self.lower_value(value)?;
                let addr = self
                    .lower_expr(target, Mode::Address)?
                    .ok_or(LowerError::Internal("assignment target has no address"))?;
                self.builder
                    .emit_void(ty, InstrKind::Store { value: rhs, ptr: addr });
                Ok(Some(rhs))
            }
            ExprKind::Call { callee, args } => {
                let mut lowered = Vec::with_capacity(args.len());
                for arg in args {
                    lowered.push(self.lower_value(arg)?);
                }
                let sig = self
                    .typed
                    .functions
                    .get(&callee.name)
                    .ok_or(LowerError::Internal("call to unknown function"))?;
                let ret = ir_type(&sig.return_type, expr.span)?;
                let kind = InstrKind::Call {
                    callee: callee.name.clone(),
                    args: lowered,
                };
                if ret == IrType::Void {
                    self.builder.emit_void(ret, kind);
                    Ok(None)
                } else {
                    Ok(Some(self.builder.emit(ret, kind)))
                }
            }
            ExprKind::Member { .. } => Err(LowerError::Unsupported {
                what: "struct member access",
                span: expr.span,
            }),
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        ty: IrType,
        lhs: VReg,
        rhs: VReg,
    ) -> Result<VReg, LowerError> {
        if let Some(cmp) = cmp_op(op) {
            // Comparisons produce an i1, sign-extended back to the
            // node's integer width so the value matches its slot;
            // floating comparisons widen to i32
            let ext_ty = if ty.is_float() { IrType::I32 } else { ty };
            let bit = if ty.is_float() {
                self.builder.emit(
                    IrType::Bool,
                    InstrKind::FCmp {
                        op: cmp,
                        operand_ty: ty,
                        lhs,
                        rhs,
                    },
                )
            } else {
                self.builder.emit(
                    IrType::Bool,
                    InstrKind::ICmp {
                        op: cmp,
                        operand_ty: ty,
                        lhs,
                        rhs,
                    },
                )
            };
            return Ok(self.builder.emit(
                ext_ty,
                InstrKind::SExt {
                    value: bit,
                    from: IrType::Bool,
                },
            ));
        }

        let kind = if ty.is_float() {
            match op {
                BinaryOp::Add => InstrKind::FAdd(lhs, rhs),
                BinaryOp::Sub => InstrKind::FSub(lhs, rhs),
                BinaryOp::Mul => InstrKind::FMul(lhs, rhs),
                BinaryOp::Div => InstrKind::FDiv(lhs, rhs),
                _ => return Err(LowerError::Internal("invalid floating operator")),
            }
        } else {
            match op {
                BinaryOp::Add => InstrKind::Add(lhs, rhs),
                BinaryOp::Sub => InstrKind::Sub(lhs, rhs),
                BinaryOp::Mul => InstrKind::Mul(lhs, rhs),
                BinaryOp::Div => InstrKind::SDiv(lhs, rhs),
                BinaryOp::And => InstrKind::And(lhs, rhs),
                BinaryOp::Or => InstrKind::Or(lhs, rhs),
                _ => return Err(LowerError::Internal("invalid integer operator")),
            }
        };
        Ok(self.builder.emit(ty, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::sema::analyze;

    fn lower_source(source: &str) -> Module {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        let typed = analyze(&program).expect("analysis failed");
        lower(&program, &typed, "test").expect("lowering failed")
    }

    fn func<'m>(module: &'m Module, name: &str) -> &'m super::super::types::Function {
        module
            .functions
            .iter()
            .find(|f| f.name == name)
            .expect("function not found")
    }

    #[test]
    fn test_decl_and_print() {
        let module = lower_source(r#"void main() { int x = 2 + 3; printf("hi"); }"#);

        assert_eq!(module.globals.len(), 1);
        assert_eq!(module.globals[0].value, "hi");
        assert!(module.externals.iter().any(|e| e.name == "printf"));

        let main = func(&module, "main");
        let entry = &main.blocks[0];

        // A 32-bit slot, the addition feeding its store, and one call
        assert!(entry
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::Alloca) && i.ty == IrType::I32));
        assert!(entry
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::Add(_, _))));
        let calls: Vec<_> = entry
            .instrs
            .iter()
            .filter_map(|i| match &i.kind {
                InstrKind::Call { callee, args } => Some((callee.as_str(), args.len())),
                _ => None,
            })
            .collect();
        assert_eq!(calls, vec![("printf", 1)]);
        assert!(matches!(entry.terminator, Some(Terminator::Ret(None))));
    }

    #[test]
    fn test_if_else_block_shape() {
        let module = lower_source("int f() { if (1) { return 1; } else { return 0; } return 2; }");
        let f = func(&module, "f");

        // entry, then, else, merge
        assert_eq!(f.blocks.len(), 4);
        let (then_bb, else_bb) = match f.blocks[0].terminator {
            Some(Terminator::CondBr {
                then_bb, else_bb, ..
            }) => (then_bb, else_bb),
            ref other => panic!("expected conditional branch, got {:?}", other),
        };
        // Both branches return directly
        assert!(matches!(
            f.block(then_bb).terminator,
            Some(Terminator::Ret(Some(_)))
        ));
        assert!(matches!(
            f.block(else_bb).terminator,
            Some(Terminator::Ret(Some(_)))
        ));
        // The comparison against zero drives the branch
        assert!(f.blocks[0]
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::ICmp { op: CmpOp::Ne, .. })));
    }

    #[test]
    fn test_if_else_branches_join_at_merge() {
        let module =
            lower_source("void main() { int x = 0; if (1) { x = 1; } else { x = 2; } }");
        let main = func(&module, "main");
        assert_eq!(main.blocks.len(), 4);

        let merge = main.blocks[3].id;
        assert!(matches!(
            main.blocks[1].terminator,
            Some(Terminator::Br(target)) if target == merge
        ));
        assert!(matches!(
            main.blocks[2].terminator,
            Some(Terminator::Br(target)) if target == merge
        ));
    }

    #[test]
    fn test_if_without_else_falls_to_merge() {
        let module = lower_source("void main() { int x = 0; if (1) { x = 1; } }");
        let main = func(&module, "main");
        // entry, then, merge
        assert_eq!(main.blocks.len(), 3);
        let merge = main.blocks[2].id;
        assert!(matches!(
            main.blocks[0].terminator,
            Some(Terminator::CondBr { else_bb, .. }) if else_bb == merge
        ));
    }

    #[test]
    fn test_while_block_shape() {
        let module = lower_source("void main() { int x = 0; while (0) { x = x + 1; } }");
        let main = func(&module, "main");
        assert_eq!(main.blocks.len(), 4);

        let cond_bb = main.blocks[1].id;
        let body_bb = main.blocks[2].id;
        let merge_bb = main.blocks[3].id;

        // Entry jumps into the condition first
        assert!(matches!(
            main.blocks[0].terminator,
            Some(Terminator::Br(target)) if target == cond_bb
        ));
        // The condition picks body or merge
        assert!(matches!(
            main.block(cond_bb).terminator,
            Some(Terminator::CondBr { then_bb, else_bb, .. })
                if then_bb == body_bb && else_bb == merge_bb
        ));
        // The body loops back to the condition
        assert!(matches!(
            main.block(body_bb).terminator,
            Some(Terminator::Br(target)) if target == cond_bb
        ));
        assert!(matches!(
            main.block(merge_bb).terminator,
            Some(Terminator::Ret(None))
        ));
    }

    #[test]
    fn test_statements_after_return_are_dead() {
        // Code after a top-level return must not land ahead of the
        // `ret` in the already-terminated block
        let module = lower_source(r#"int f() { return 1; printf("hi"); }"#);
        let f = func(&module, "f");
        let entry = &f.blocks[0];

        assert!(matches!(entry.terminator, Some(Terminator::Ret(Some(_)))));
        assert!(!entry
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::Call { .. })));
    }

    #[test]
    fn test_params_promoted_to_slots() {
        let module = lower_source("int id(int a) { return a; }");
        let id = func(&module, "id");
        let entry = &id.blocks[0];

        assert!(entry.instrs.iter().any(|i| matches!(i.kind, InstrKind::Alloca)));
        assert!(entry
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::Store { value, .. } if value == id.params[0].0)));
        assert!(entry.instrs.iter().any(|i| matches!(i.kind, InstrKind::Load { .. })));
    }

    #[test]
    fn test_assignment_yields_rhs() {
        // `y` is initialized from the assignment's value: exactly one
        // load of `x` would be wrong, and there must be three stores
        // (x init, x = 2, y init) but no extra load feeding y
        let module = lower_source("void main() { int x = 1; int y = x = 2; }");
        let main = func(&module, "main");
        let entry = &main.blocks[0];
        let stores = entry
            .instrs
            .iter()
            .filter(|i| matches!(i.kind, InstrKind::Store { .. }))
            .count();
        let loads = entry
            .instrs
            .iter()
            .filter(|i| matches!(i.kind, InstrKind::Load { .. }))
            .count();
        assert_eq!(stores, 3);
        assert_eq!(loads, 0);
    }

    #[test]
    fn test_comparison_sign_extended() {
        let module = lower_source("void main() { int x = 1 < 2; }");
        let main = func(&module, "main");
        let entry = &main.blocks[0];
        assert!(entry
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::ICmp { op: CmpOp::Lt, .. })));
        assert!(entry
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::SExt { .. }) && i.ty == IrType::I32));
    }

    #[test]
    fn test_char_comparison_matches_slot_width() {
        // `a == b` over chars is typed char; the extended comparison
        // result must be i8 so the store into `c` is width-consistent
        let module = lower_source("int f(char a, char b) { char c = a == b; return 0; }");
        let f = func(&module, "f");
        let entry = &f.blocks[0];

        assert!(entry
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::ICmp { op: CmpOp::Eq, operand_ty: IrType::I8, .. })));
        let sext = entry
            .instrs
            .iter()
            .find(|i| matches!(i.kind, InstrKind::SExt { .. }))
            .expect("comparison not extended");
        assert_eq!(sext.ty, IrType::I8);
    }

    #[test]
    fn test_negation_is_zero_minus() {
        let module = lower_source("void main() { int x = -5; }");
        let main = func(&module, "main");
        let entry = &main.blocks[0];
        assert!(entry
            .instrs
            .iter()
            .any(|i| matches!(i.kind, InstrKind::Sub(_, _))));
    }

    #[test]
    fn test_call_lowering() {
        let module = lower_source(
            "int add(int a, int b) { return a + b; } void main() { int x = add(1, 2); }",
        );
        let main = func(&module, "main");
        let entry = &main.blocks[0];
        assert!(entry.instrs.iter().any(|i| matches!(
            &i.kind,
            InstrKind::Call { callee, args } if callee == "add" && args.len() == 2
        )));
    }

    #[test]
    fn test_void_call_has_no_result() {
        let module = lower_source("void f() { } void main() { f(); }");
        let main = func(&module, "main");
        let call = main.blocks[0]
            .instrs
            .iter()
            .find(|i| matches!(&i.kind, InstrKind::Call { callee, .. } if callee == "f"))
            .expect("call not lowered");
        assert!(call.result.is_none());
    }
}
