//! Incremental construction of IR modules
//!
//! The builder owns the module under construction plus a cursor: the
//! function and basic block that new instructions append to. Virtual
//! register numbering restarts per function; block ids index into the
//! current function's block list.

use super::instr::{Instr, InstrKind, Terminator};
use super::types::{BasicBlock, BlockId, ExternalFn, Function, Global, IrType, Module, VReg};

pub struct IrBuilder {
    module: Module,
    func: Option<Function>,
    current: BlockId,
    next_vreg: u32,
}

impl IrBuilder {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module: Module {
                name: module_name.into(),
                ..Module::default()
            },
            func: None,
            current: BlockId(0),
            next_vreg: 0,
        }
    }

    /// Consume the builder and return the finished module
    pub fn finish(self) -> Module {
        debug_assert!(self.func.is_none(), "unfinished function");
        self.module
    }

    /// Declare an externally provided function
    pub fn declare_external(
        &mut self,
        name: impl Into<String>,
        ret: IrType,
        params: Vec<IrType>,
        variadic: bool,
    ) {
        self.module.externals.push(ExternalFn {
            name: name.into(),
            ret,
            params,
            variadic,
        });
    }

    /// Intern a string constant, returning the global's name
    pub fn add_string_constant(&mut self, value: &str) -> String {
        let name = format!(".str.{}", self.module.globals.len());
        self.module.globals.push(Global {
            name: name.clone(),
            value: value.to_string(),
        });
        name
    }

    /// Begin a function, returning the parameter registers.
    ///
    /// Register numbering restarts and an `entry` block becomes current.
    pub fn start_function(
        &mut self,
        name: impl Into<String>,
        ret: IrType,
        param_types: &[IrType],
    ) -> Vec<VReg> {
        debug_assert!(self.func.is_none(), "function already in progress");
        self.next_vreg = 0;

        let params: Vec<(VReg, IrType)> = param_types
            .iter()
            .map(|&ty| (self.fresh_vreg(), ty))
            .collect();
        let regs = params.iter().map(|(reg, _)| *reg).collect();

        self.func = Some(Function {
            name: name.into(),
            ret,
            params,
            blocks: vec![BasicBlock::new(BlockId(0), "entry")],
        });
        self.current = BlockId(0);
        regs
    }

    /// Finish the current function and append it to the module
    pub fn finish_function(&mut self) {
        let func = self.func.take().expect("no function in progress");
        self.module.functions.push(func);
    }

    pub fn fresh_vreg(&mut self) -> VReg {
        let reg = VReg(self.next_vreg);
        self.next_vreg += 1;
        reg
    }

    /// Create a new, empty block in the current function
    pub fn fresh_block(&mut self, label: &str) -> BlockId {
        let func = self.func.as_mut().expect("no function in progress");
        let id = BlockId(func.blocks.len() as u32);
        func.blocks.push(BasicBlock::new(id, label));
        id
    }

    /// Move the insertion cursor to `block`
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    fn current_block_mut(&mut self) -> &mut BasicBlock {
        let current = self.current;
        let func = self.func.as_mut().expect("no function in progress");
        &mut func.blocks[current.0 as usize]
    }

    /// Whether the current block already has a terminator
    pub fn is_terminated(&self) -> bool {
        let func = self.func.as_ref().expect("no function in progress");
        func.blocks[self.current.0 as usize].is_terminated()
    }

    /// Append a value-producing instruction, returning its register.
    ///
    /// A terminated block accepts nothing further: the instruction is
    /// dropped and only its (dead) register is handed back, so code
    /// after a `return` cannot land ahead of the terminator.
    pub fn emit(&mut self, ty: IrType, kind: InstrKind) -> VReg {
        let result = self.fresh_vreg();
        let block = self.current_block_mut();
        if block.terminator.is_none() {
            block.instrs.push(Instr {
                result: Some(result),
                ty,
                kind,
            });
        }
        result
    }

    /// Append a value-less instruction (store, void call)
    pub fn emit_void(&mut self, ty: IrType, kind: InstrKind) {
        let block = self.current_block_mut();
        if block.terminator.is_none() {
            block.instrs.push(Instr {
                result: None,
                ty,
                kind,
            });
        }
    }

    /// Terminate the current block; the first terminator wins, later
    /// ones are dropped (they belong to unreachable code)
    pub fn terminate(&mut self, terminator: Terminator) {
        let block = self.current_block_mut();
        if block.terminator.is_none() {
            block.terminator = Some(terminator);
        }
    }
}
