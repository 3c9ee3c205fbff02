//! IR type system and module structure

use std::fmt;

/// A virtual register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VReg(pub u32);

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A basic block identifier, indexing into its function's block list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Fixed-width IR types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    /// 1-bit comparison result
    Bool,
    I8,
    I32,
    F32,
    F64,
    /// Opaque pointer (stack slots, string constants)
    Ptr,
}

impl IrType {
    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32 | IrType::F64)
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Bool => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I32 => write!(f, "i32"),
            IrType::F32 => write!(f, "float"),
            IrType::F64 => write!(f, "double"),
            IrType::Ptr => write!(f, "ptr"),
        }
    }
}

/// A compiled module: globals, external declarations, and functions
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub globals: Vec<Global>,
    pub externals: Vec<ExternalFn>,
    pub functions: Vec<Function>,
}

/// A global string constant
#[derive(Debug, Clone)]
pub struct Global {
    pub name: String,
    pub value: String,
}

/// An externally provided function, declared but not defined here
#[derive(Debug, Clone)]
pub struct ExternalFn {
    pub name: String,
    pub ret: IrType,
    pub params: Vec<IrType>,
    pub variadic: bool,
}

/// A function definition
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub ret: IrType,
    pub params: Vec<(VReg, IrType)>,
    pub blocks: Vec<BasicBlock>,
}

impl Function {
    /// Look up a block by id
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0 as usize]
    }
}

/// A basic block: a label, straight-line instructions, and one terminator
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub instrs: Vec<super::instr::Instr>,
    pub terminator: Option<super::instr::Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            instrs: Vec::new(),
            terminator: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }
}
