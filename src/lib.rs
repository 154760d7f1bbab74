//! VibeScript - a tiny, friendly teaching language
//!
//! Source text goes through three stages: the [`Lexer`] turns it into
//! tokens, the [`Parser`] builds a [`Program`], and the [`Interpreter`]
//! walks that tree, collecting every printed line.

pub mod token;
pub mod lexer;
pub mod parser;
pub mod ast;
pub mod value;
pub mod environment;
pub mod builtins;
pub mod interpreter;
pub mod io;
pub mod error;
mod stack;

pub use ast::Program;
pub use error::{ErrorKind, Phase, Result, VibeError};
pub use interpreter::{Interpreter, Limits};
pub use io::{CapturedOutput, InputProvider, OutputSink, ScriptedInput, Silent, StdIo};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::Token;
pub use value::Value;

/// Tokenize source text
pub fn lex(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

/// Tokenize and parse, stopping at the first error
pub fn parse(source: &str) -> Result<Program> {
    let tokens = lex(source)?;
    Parser::new(tokens).parse()
}

/// Tokenize and parse, collecting every parse error
///
/// A lexing error is returned on its own since no tokens are available.
pub fn parse_all(source: &str) -> std::result::Result<Program, Vec<VibeError>> {
    let tokens = lex(source).map_err(|e| vec![e])?;
    let (program, errors) = Parser::new(tokens).parse_recovering();
    if errors.is_empty() {
        Ok(program)
    } else {
        Err(errors)
    }
}

/// Run source text with no input and no console output
///
/// Returns every printed line; a failure at any stage becomes the last line.
pub fn execute(source: &str) -> Vec<String> {
    execute_with(source, Silent, Silent)
}

/// Run source text with injected input and output
pub fn execute_with(
    source: &str,
    input: impl InputProvider + 'static,
    output: impl OutputSink + 'static,
) -> Vec<String> {
    match parse(source) {
        Ok(program) => Interpreter::with_io(input, output).interpret(&program),
        Err(err) => vec![err.to_string()],
    }
}

/// Version of the VibeScript language
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
