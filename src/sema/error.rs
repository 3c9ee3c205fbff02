//! Semantic analysis errors

use super::types::Type;
use crate::ast::{BinaryOp, UnaryOp};
use crate::span::Span;
use thiserror::Error;

/// A semantic error with its source location
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}")]
pub struct SemaError {
    pub kind: SemaErrorKind,
    pub span: Span,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SemaErrorKind {
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    #[error("undefined function `{0}`")]
    UndefinedFunction(String),

    #[error("duplicate identifier `{0}`")]
    DuplicateIdentifier(String),

    #[error("duplicate definition of function `{0}`")]
    DuplicateFunction(String),

    #[error("duplicate parameter `{0}`")]
    DuplicateParameter(String),

    #[error("invalid operands to `{op}` ({left} and {right})")]
    BinaryOpMismatch {
        op: BinaryOp,
        left: Type,
        right: Type,
    },

    #[error("invalid operand to unary `{op}` ({operand})")]
    UnaryOpMismatch { op: UnaryOp, operand: Type },

    #[error("cannot assign {value} to a variable of type {target}")]
    AssignTypeMismatch { target: Type, value: Type },

    #[error("invalid assignment target")]
    InvalidAssignTarget,

    #[error("condition must have type int, found {0}")]
    ConditionNotInt(Type),

    #[error("printf expects a string literal, found {0}")]
    PrintOperandNotString(Type),

    #[error("function `{name}` expects {expected} argument(s), found {found}")]
    WrongArgCount {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("argument {index} of `{name}` expects {expected}, found {found}")]
    ArgTypeMismatch {
        name: String,
        index: usize,
        expected: Type,
        found: Type,
    },

    #[error("return value has type {found}, but function returns {expected}")]
    ReturnTypeMismatch { expected: Type, found: Type },

    #[error("function `{0}` must return a value")]
    MissingReturnValue(String),

    #[error("missing return statement in function `{0}`")]
    MissingReturn(String),

    #[error("unsupported type {0}")]
    UnsupportedType(Type),

    #[error("struct member access is not supported")]
    MemberAccessUnsupported,
}

impl SemaError {
    pub fn new(kind: SemaErrorKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn span(&self) -> Span {
        self.span
    }
}
