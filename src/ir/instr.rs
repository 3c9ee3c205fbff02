//! IR instructions and terminators

use super::types::{BlockId, IrType, VReg};
use std::fmt;

/// A single instruction; `result` is absent for value-less instructions
/// (stores, void calls)
#[derive(Debug, Clone)]
pub struct Instr {
    pub result: Option<VReg>,
    pub ty: IrType,
    pub kind: InstrKind,
}

/// Comparison predicates; integer comparisons are signed, floating
/// comparisons are ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn int_mnemonic(&self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Lt => "slt",
            CmpOp::Le => "sle",
            CmpOp::Gt => "sgt",
            CmpOp::Ge => "sge",
        }
    }

    fn float_mnemonic(&self) -> &'static str {
        match self {
            CmpOp::Eq => "oeq",
            CmpOp::Ne => "one",
            CmpOp::Lt => "olt",
            CmpOp::Le => "ole",
            CmpOp::Gt => "ogt",
            CmpOp::Ge => "oge",
        }
    }
}

#[derive(Debug, Clone)]
pub enum InstrKind {
    /// Integer constant of the instruction's type
    Const(i64),
    /// Floating constant of the instruction's type
    FConst(f64),

    Add(VReg, VReg),
    Sub(VReg, VReg),
    Mul(VReg, VReg),
    SDiv(VReg, VReg),

    FAdd(VReg, VReg),
    FSub(VReg, VReg),
    FMul(VReg, VReg),
    FDiv(VReg, VReg),

    /// Bitwise and/or, used for the logical operators over `int`
    And(VReg, VReg),
    Or(VReg, VReg),

    /// Integer comparison over operands of `operand_ty`; produces `i1`
    ICmp {
        op: CmpOp,
        operand_ty: IrType,
        lhs: VReg,
        rhs: VReg,
    },
    /// Ordered floating comparison; produces `i1`
    FCmp {
        op: CmpOp,
        operand_ty: IrType,
        lhs: VReg,
        rhs: VReg,
    },

    /// Sign-extend `value` from `from` to the instruction's type
    SExt { value: VReg, from: IrType },

    /// Stack slot holding one value of the instruction's type; the
    /// result register has pointer type
    Alloca,
    /// Load from a slot; the instruction's type is the loaded type
    Load { ptr: VReg },
    /// Store `value` (of the instruction's type) into `ptr`
    Store { value: VReg, ptr: VReg },

    /// Call a function by name; the instruction's type is the return type
    Call { callee: String, args: Vec<VReg> },

    /// Address of a named global
    GlobalAddr(String),
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = self.result {
            write!(f, "{} = ", result)?;
        }
        match &self.kind {
            InstrKind::Const(value) => write!(f, "const {} {}", self.ty, value),
            InstrKind::FConst(value) => write!(f, "const {} {}", self.ty, value),
            InstrKind::Add(a, b) => write!(f, "add {} {}, {}", self.ty, a, b),
            InstrKind::Sub(a, b) => write!(f, "sub {} {}, {}", self.ty, a, b),
            InstrKind::Mul(a, b) => write!(f, "mul {} {}, {}", self.ty, a, b),
            InstrKind::SDiv(a, b) => write!(f, "sdiv {} {}, {}", self.ty, a, b),
            InstrKind::FAdd(a, b) => write!(f, "fadd {} {}, {}", self.ty, a, b),
            InstrKind::FSub(a, b) => write!(f, "fsub {} {}, {}", self.ty, a, b),
            InstrKind::FMul(a, b) => write!(f, "fmul {} {}, {}", self.ty, a, b),
            InstrKind::FDiv(a, b) => write!(f, "fdiv {} {}, {}", self.ty, a, b),
            InstrKind::And(a, b) => write!(f, "and {} {}, {}", self.ty, a, b),
            InstrKind::Or(a, b) => write!(f, "or {} {}, {}", self.ty, a, b),
            InstrKind::ICmp {
                op,
                operand_ty,
                lhs,
                rhs,
            } => write!(
                f,
                "icmp {} {} {}, {}",
                op.int_mnemonic(),
                operand_ty,
                lhs,
                rhs
            ),
            InstrKind::FCmp {
                op,
                operand_ty,
                lhs,
                rhs,
            } => write!(
                f,
                "fcmp {} {} {}, {}",
                op.float_mnemonic(),
                operand_ty,
                lhs,
                rhs
            ),
            InstrKind::SExt { value, from } => {
                write!(f, "sext {} {} to {}", from, value, self.ty)
            }
            InstrKind::Alloca => write!(f, "alloca {}", self.ty),
            InstrKind::Load { ptr } => write!(f, "load {}, ptr {}", self.ty, ptr),
            InstrKind::Store { value, ptr } => {
                write!(f, "store {} {}, ptr {}", self.ty, value, ptr)
            }
            InstrKind::Call { callee, args } => {
                write!(f, "call {} @{}(", self.ty, callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            InstrKind::GlobalAddr(name) => write!(f, "global ptr @{}", name),
        }
    }
}

/// Block terminators
#[derive(Debug, Clone)]
pub enum Terminator {
    /// Return, with a value unless the function is void
    Ret(Option<(IrType, VReg)>),
    /// Unconditional branch
    Br(BlockId),
    /// Two-way branch on an `i1` condition
    CondBr {
        cond: VReg,
        then_bb: BlockId,
        else_bb: BlockId,
    },
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret(None) => write!(f, "ret void"),
            Terminator::Ret(Some((ty, value))) => write!(f, "ret {} {}", ty, value),
            Terminator::Br(target) => write!(f, "br {}", target),
            Terminator::CondBr {
                cond,
                then_bb,
                else_bb,
            } => write!(f, "br i1 {}, {}, {}", cond, then_bb, else_bb),
        }
    }
}
