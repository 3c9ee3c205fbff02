//! Resolved types and operator compatibility tables

use crate::ast::{BinaryOp, UnaryOp};
use std::fmt;

/// A resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Char,
    Void,
    Float,
    Double,
    /// The opaque string type produced by string literals, consumed
    /// only by the print statement
    CStr,
    Struct(String),
}

impl Type {
    /// Whether this type may be used as a function return type
    pub fn is_valid_return(&self) -> bool {
        matches!(self, Type::Int | Type::Char | Type::Void)
    }

    /// Whether this type may be used as a parameter or variable type
    pub fn is_valid_storage(&self) -> bool {
        matches!(self, Type::Int | Type::Char | Type::Float | Type::Double)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Char => write!(f, "char"),
            Type::Void => write!(f, "void"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::CStr => write!(f, "string"),
            Type::Struct(name) => write!(f, "struct {}", name),
        }
    }
}

/// Operand pairs accepted by each binary operator.
///
/// Each entry is valid in either operand order, so `(Int, Char)` also
/// admits `(Char, Int)`. The result type is always the left operand's
/// type; no numeric promotion is performed.
fn binary_table(op: BinaryOp) -> &'static [(Type, Type)] {
    use Type::*;

    const ARITH: &[(Type, Type)] = &[
        (Int, Int),
        (Int, Char),
        (Char, Char),
        (Float, Float),
        (Double, Double),
    ];
    const LOGIC: &[(Type, Type)] = &[(Int, Int)];

    match op {
        BinaryOp::Add
        | BinaryOp::Sub
        | BinaryOp::Mul
        | BinaryOp::Div
        | BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => ARITH,
        BinaryOp::And | BinaryOp::Or => LOGIC,
    }
}

/// Check a binary operator against its compatibility table.
///
/// Returns the result type (the left operand's type) when the pair is
/// admitted, in either operand order.
pub fn check_binary(op: BinaryOp, left: &Type, right: &Type) -> Option<Type> {
    let table = binary_table(op);
    let matched = table
        .iter()
        .any(|(a, b)| (a == left && b == right) || (a == right && b == left));
    matched.then(|| left.clone())
}

/// Check a unary operator against its compatibility table.
///
/// Negation and unary plus work on the numeric types; dereference has
/// no table entry (there are no pointer types to dereference).
pub fn check_unary(op: UnaryOp, operand: &Type) -> Option<Type> {
    match op {
        UnaryOp::Neg | UnaryOp::Plus => operand
            .is_valid_storage()
            .then(|| operand.clone()),
        UnaryOp::Deref => None,
    }
}
