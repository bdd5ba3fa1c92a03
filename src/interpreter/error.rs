use std::fmt;
use std::io;

use thiserror::Error;

/// Fatal runtime failures. Evaluation stops at the first one.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("line {line}: unsupported operand types for {operator}: '{left}' and '{right}'")]
    UnsupportedOperands {
        operator: &'static str,
        left: &'static str,
        right: &'static str,
        line: usize,
    },
    #[error("line {line}: bad operand type for unary -: '{type_name}'")]
    UnsupportedNegation { type_name: &'static str, line: usize },
    #[error("line {line}: invalid literal for int(): '{text}'")]
    InvalidIntLiteral { text: String, line: usize },
    #[error("line {line}: int() argument must be a string or a number, not '{type_name}'")]
    InvalidIntArgument { type_name: &'static str, line: usize },
    #[error("line {line}: cannot convert float {value} to integer")]
    FloatToInt { value: String, line: usize },
    #[error("line {line}: repeated string too large ({times} copies)")]
    RepeatTooLarge { times: i64, line: usize },
    #[error("line {line}: range() arg 3 must not be zero")]
    ZeroRangeStep { line: usize },
    #[error("line {line}: range() expected 1 to 3 arguments, got {found}")]
    RangeArity { found: usize, line: usize },
    #[error("line {line}: range() arguments must be integers, not '{type_name}'")]
    RangeArgument { type_name: &'static str, line: usize },
    #[error("line {line}: '{type_name}' object is not iterable")]
    NotIterable { type_name: &'static str, line: usize },
    #[error("line {line}: maximum call depth of {limit} exceeded calling '{name}'")]
    RecursionLimit {
        name: String,
        limit: usize,
        line: usize,
    },
    #[error("line {line}: input ended while waiting for a line")]
    InputClosed { line: usize },
    #[error("console I/O failed")]
    Console(#[from] io::Error),
}

impl EvalError {
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::UnsupportedOperands { line, .. }
            | Self::UnsupportedNegation { line, .. }
            | Self::InvalidIntLiteral { line, .. }
            | Self::InvalidIntArgument { line, .. }
            | Self::FloatToInt { line, .. }
            | Self::RepeatTooLarge { line, .. }
            | Self::ZeroRangeStep { line }
            | Self::RangeArity { line, .. }
            | Self::RangeArgument { line, .. }
            | Self::NotIterable { line, .. }
            | Self::RecursionLimit { line, .. }
            | Self::InputClosed { line } => Some(*line),
            Self::Console(_) => None,
        }
    }
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Non-fatal degradations recorded while a program runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeWarning {
    UndefinedVariable { name: String, line: usize },
    UnknownCallTarget { name: String, line: usize },
    NotAnInstance {
        name: String,
        attribute: String,
        line: usize,
    },
    MissingAttribute {
        class_name: String,
        attribute: String,
        line: usize,
    },
    UnknownMethod {
        class_name: String,
        method: String,
        line: usize,
    },
}

impl RuntimeWarning {
    pub fn line(&self) -> usize {
        match self {
            Self::UndefinedVariable { line, .. }
            | Self::UnknownCallTarget { line, .. }
            | Self::NotAnInstance { line, .. }
            | Self::MissingAttribute { line, .. }
            | Self::UnknownMethod { line, .. } => *line,
        }
    }
}

impl fmt::Display for RuntimeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable { name, line } => {
                write!(f, "line {line}: variable '{name}' is not defined")
            }
            Self::UnknownCallTarget { name, line } => {
                write!(f, "line {line}: '{name}' is not a function or class")
            }
            Self::NotAnInstance {
                name,
                attribute,
                line,
            } => write!(
                f,
                "line {line}: '{name}' is not an object, cannot use attribute '{attribute}'"
            ),
            Self::MissingAttribute {
                class_name,
                attribute,
                line,
            } => write!(
                f,
                "line {line}: '{class_name}' object has no attribute '{attribute}'"
            ),
            Self::UnknownMethod {
                class_name,
                method,
                line,
            } => write!(
                f,
                "line {line}: '{class_name}' object has no method '{method}'"
            ),
        }
    }
}
