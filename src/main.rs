use clap::{Parser, Subcommand};
use miette::{miette, IntoDiagnostic, Result};
use minicc::{ir, lexer, sema, CompileError};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "minicc", version, about = "A compiler front end for a small subset of C")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a source file and print its IR
    Build {
        /// Source file to compile
        input: PathBuf,

        /// Also print the token stream
        #[arg(long)]
        emit_tokens: bool,

        /// Also print the syntax tree
        #[arg(long)]
        emit_ast: bool,
    },

    /// Check a source file without generating code
    Check {
        /// Source file to check
        input: PathBuf,
    },

    /// Print the token stream of a source file
    Tokenize {
        /// Source file to tokenize
        input: PathBuf,
    },

    /// Print the syntax tree of a source file
    Parse {
        /// Source file to parse
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            emit_tokens,
            emit_ast,
        } => {
            let source = read_source(&input)?;
            if emit_tokens {
                print_tokens(&source);
            }
            let program = minicc::check(&source).map_err(|err| report(&source, err))?;
            if emit_ast {
                println!("{:#?}", program);
            }
            let typed = sema::analyze(&program)
                .map_err(|errs| report(&source, CompileError::Sema(errs)))?;
            let module = ir::lower(&program, &typed, module_name(&input))
                .map_err(|err| report(&source, CompileError::Lower(err)))?;
            print!("{}", ir::print_module(&module));
        }

        Command::Check { input } => {
            let source = read_source(&input)?;
            let program = minicc::check(&source).map_err(|err| report(&source, err))?;
            sema::analyze(&program).map_err(|errs| report(&source, CompileError::Sema(errs)))?;
            println!("{}: ok", input.display());
        }

        Command::Tokenize { input } => {
            let source = read_source(&input)?;
            let (_, errors) = lexer::lex(&source);
            print_tokens(&source);
            if !errors.is_empty() {
                return Err(report(&source, CompileError::Lex(errors)));
            }
        }

        Command::Parse { input } => {
            let source = read_source(&input)?;
            let program = minicc::check(&source).map_err(|err| report(&source, err))?;
            println!("{:#?}", program);
        }
    }

    Ok(())
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).into_diagnostic()
}

fn module_name(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("main")
}

fn print_tokens(source: &str) {
    let (tokens, _) = lexer::lex(source);
    for token in &tokens {
        println!(
            "{:>4}  {:<12} {:?}",
            token.span.line(source),
            format!("{}", token.kind),
            token.text(source)
        );
    }
}

/// Print one diagnostic per error, then produce the failure for `main`
fn report(source: &str, err: CompileError) -> miette::Report {
    match err {
        CompileError::Lex(errors) => {
            for error in &errors {
                eprintln!("error: {}", error);
            }
        }
        CompileError::Parse(errors) => {
            for error in &errors {
                eprintln!("error: {}", error);
            }
        }
        CompileError::Sema(errors) => {
            for error in &errors {
                eprintln!("error: {} on line {}", error, error.span().line(source));
            }
        }
        CompileError::Lower(error) => match error.span() {
            Some(span) => eprintln!("error: {} on line {}", error, span.line(source)),
            None => eprintln!("error: {}", error),
        },
    }
    miette!("compilation failed")
}
