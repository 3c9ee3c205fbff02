//! minicc — a compiler front end for a small subset of C
//!
//! The pipeline runs in four stages: lexing, parsing, semantic analysis,
//! and lowering to a typed basic-block IR. Each stage fully consumes its
//! input and produces a new artifact; a failing stage stops the pipeline,
//! so nothing downstream ever sees a partial result.

pub mod ast;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod sema;
pub mod span;
pub mod token;

pub use lexer::LexerError;
pub use parser::ParseError;
pub use sema::SemaError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Errors from a full pipeline run, grouped by the stage that failed
#[derive(Debug)]
pub enum CompileError {
    Lex(Vec<lexer::LexerError>),
    Parse(Vec<parser::ParseError>),
    Sema(Vec<sema::SemaError>),
    Lower(ir::LowerError),
}

/// Run the whole pipeline over `source`, producing an IR module
pub fn compile(source: &str, module_name: &str) -> Result<ir::Module, CompileError> {
    let program = check(source)?;
    let typed = sema::analyze(&program).map_err(CompileError::Sema)?;
    ir::lower(&program, &typed, module_name).map_err(CompileError::Lower)
}

/// Run the front half of the pipeline: lex, parse, and verify that
/// semantic analysis would have its input. Returns the parsed program.
pub fn check(source: &str) -> Result<ast::Program, CompileError> {
    let (_, lex_errors) = lexer::lex(source);
    if !lex_errors.is_empty() {
        return Err(CompileError::Lex(lex_errors));
    }
    let (program, parse_errors) = parser::parse(source);
    if !parse_errors.is_empty() {
        return Err(CompileError::Parse(parse_errors));
    }
    Ok(program)
}
