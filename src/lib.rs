pub mod ast;
pub mod builtins;
pub mod checker;
pub mod console;
pub mod fixtures;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod token;

use thiserror::Error;

use crate::ast::Program;
use crate::lexer::LexError;
use crate::parser::SyntaxError;

/// Failure of the front-end. Compilation produces no partial result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

impl CompileError {
    pub fn line(&self) -> usize {
        match self {
            Self::Lex(error) => error.line(),
            Self::Syntax(error) => error.line(),
        }
    }
}

/// Tokenizes and parses `source` into a program.
pub fn compile(source: &str) -> Result<Program, CompileError> {
    let tokens = lexer::tokenize(source)?;
    Ok(parser::parse_tokens(tokens)?)
}
