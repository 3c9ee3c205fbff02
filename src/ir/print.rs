//! Textual rendering of IR modules

use super::types::Module;
use std::fmt::Write;

/// Render a module in a readable assembly-like form
pub fn print_module(module: &Module) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "; module {}", module.name);

    for ext in &module.externals {
        let _ = write!(out, "declare {} @{}(", ext.ret, ext.name);
        for (i, param) in ext.params.iter().enumerate() {
            if i > 0 {
                let _ = write!(out, ", ");
            }
            let _ = write!(out, "{}", param);
        }
        if ext.variadic {
            if !ext.params.is_empty() {
                let _ = write!(out, ", ");
            }
            let _ = write!(out, "...");
        }
        let _ = writeln!(out, ")");
    }

    for global in &module.globals {
        let _ = writeln!(out, "@{} = constant \"{}\"", global.name, global.value);
    }

    for func in &module.functions {
        let _ = write!(out, "\ndefine {} @{}(", func.ret, func.name);
        for (i, (reg, ty)) in func.params.iter().enumerate() {
            if i > 0 {
                let _ = write!(out, ", ");
            }
            let _ = write!(out, "{} {}", ty, reg);
        }
        let _ = writeln!(out, ") {{");

        for block in &func.blocks {
            let _ = writeln!(out, "{}.{}:", block.id, block.label);
            for instr in &block.instrs {
                let _ = writeln!(out, "  {}", instr);
            }
            match &block.terminator {
                Some(term) => {
                    let _ = writeln!(out, "  {}", term);
                }
                None => {
                    let _ = writeln!(out, "  ; unterminated");
                }
            }
        }
        let _ = writeln!(out, "}}");
    }

    out
}
