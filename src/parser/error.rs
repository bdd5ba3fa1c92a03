use thiserror::Error;

use crate::token::TokenKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error(
        "Syntax error at line {line}: expected {}, found {found} '{lexeme}'",
        describe_expected(.expected)
    )]
    UnexpectedToken {
        line: usize,
        expected: Vec<TokenKind>,
        found: TokenKind,
        lexeme: String,
    },
    #[error("Syntax error at line {line}: invalid numeric literal '{literal}'")]
    InvalidNumber { literal: String, line: usize },
}

impl SyntaxError {
    pub fn line(&self) -> usize {
        match self {
            Self::UnexpectedToken { line, .. } | Self::InvalidNumber { line, .. } => *line,
        }
    }
}

fn describe_expected(expected: &[TokenKind]) -> String {
    match expected {
        [] => "nothing".to_string(),
        [single] => single.to_string(),
        many => {
            let rendered = many
                .iter()
                .map(TokenKind::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("one of {rendered}")
        }
    }
}
