//! Abstract Syntax Tree (AST) for the mini-C front end
//!
//! The AST represents the structure of a translation unit after parsing.
//! Nodes carry spans only; resolved types live in a side table produced by
//! semantic analysis (`sema::TypedProgram`), so the parser's output is
//! purely syntactic.

use crate::span::Span;
use std::fmt;

/// A complete translation unit
#[derive(Debug, Clone)]
pub struct Program {
    pub decls: Vec<FunctionDecl>,
    pub span: Span,
}

/// Function declaration: `int add(int a, int b) { ... }`
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Ident,
    pub return_type: TypeName,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub ty: TypeName,
    pub name: Ident,
    pub span: Span,
}

/// A source-level type name
#[derive(Debug, Clone)]
pub struct TypeName {
    pub kind: TypeNameKind,
    pub span: Span,
}

/// Kind of type name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeNameKind {
    Int,
    Char,
    Void,
    /// `struct <name>` — accepted syntactically, not lowered
    Struct(String),
}

/// Block of statements; opens its own scope
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Kind of statement
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// Variable declaration with mandatory initializer: `int x = 1;`
    VarDecl {
        ty: TypeName,
        name: Ident,
        init: Expr,
    },

    /// Expression statement: `expr;`
    Expr(Expr),

    /// Built-in print statement: `printf("hi");`
    Print(Expr),

    /// `if (cond) stmt [else stmt]`
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while (cond) stmt`
    While { cond: Expr, body: Box<Stmt> },

    /// Nested block: `{ ... }`
    Block(Block),

    /// `return expr;` or `return;`
    Return(Option<Expr>),
}

/// Expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

/// Kind of expression
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Literal: `42`, `"hello"`
    Literal(Literal),

    /// Variable reference: `x`
    Variable(Ident),

    /// Binary operation: `a + b`
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Unary operation: `-x`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Assignment: `x = value` (an expression, like in C)
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },

    /// Function call: `f(a, b)`
    Call { callee: Ident, args: Vec<Expr> },

    /// Struct member access: `s.field` — parsed, not lowered
    Member { base: Box<Expr>, field: Ident },
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Char(char),
    Float(f32),
    Double(f64),
    /// String literal, usable only as the `printf` argument
    Str(String),
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Plus,
    /// `*x` — parsed, not lowered
    Deref,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Deref => "*",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
