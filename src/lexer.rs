use std::{iter::Peekable, str::CharIndices};

use crate::token::{Span, Token, TokenKind};

mod error;

pub use error::{LexError, LexResult};

/// Single-pass tokenizer. Newlines are significant and kept as tokens;
/// spaces, tabs, carriage returns and `#` comments are dropped.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
    eof_reached: bool,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
            eof_reached: false,
            line: 1,
            column: 1,
        }
    }

    pub fn next_token(&mut self) -> LexResult<Token<'a>> {
        self.skip_trivia();

        let (start_idx, ch) = match self.chars.peek() {
            Some(&(idx, c)) => (idx, c),
            None => {
                self.eof_reached = true;
                let index = self.input.len();
                return Ok(Token::new(
                    TokenKind::EOF,
                    "",
                    Span {
                        start: index,
                        end: index,
                        line: self.line,
                        column: self.column,
                    },
                ));
            }
        };

        let line = self.line;
        let column = self.column;
        match ch {
            '\n' => {
                self.advance_char();
                Ok(self.token(TokenKind::Newline, start_idx, line, column))
            }
            '"' | '\'' => self.read_string(start_idx, line, column),
            'f' if matches!(self.peek_second(), Some('"' | '\'')) => {
                self.advance_char(); // Consume prefix
                self.read_string(start_idx, line, column)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                Ok(self.read_word(start_idx, line, column))
            }
            c if c.is_ascii_digit() => Ok(self.read_number(start_idx, line, column)),
            '=' | '!' | '<' | '>' => self.read_comparison(ch, start_idx, line, column),
            '+' | '-' | '*' | '/' | '%' | ':' | ',' | '.' | '(' | ')' => {
                self.advance_char();
                let kind = match ch {
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '%' => TokenKind::Percent,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    '.' => TokenKind::Dot,
                    '(' => TokenKind::LParen,
                    _ => TokenKind::RParen,
                };
                Ok(self.token(kind, start_idx, line, column))
            }
            _ => Err(LexError::UnexpectedCharacter {
                character: ch,
                line,
                column,
            }),
        }
    }

    fn skip_trivia(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            match c {
                ' ' | '\t' | '\r' => {
                    self.advance_char();
                }
                '#' => {
                    while let Some(&(_, c)) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance_char();
                    }
                }
                _ => break,
            }
        }
    }

    fn read_word(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.advance_char(); // Consume first char
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance_char();
            } else {
                break;
            }
        }

        // Keywords only ever match a whole word, so `printer` stays an identifier.
        let word = &self.input[start..self.current_index()];
        let kind = TokenKind::keyword(word).unwrap_or(TokenKind::Identifier);
        self.token(kind, start, line, column)
    }

    fn read_number(&mut self, start: usize, line: usize, column: usize) -> Token<'a> {
        self.consume_digits();
        let has_fraction = matches!(self.chars.peek(), Some(&(_, '.')))
            && self.peek_second().is_some_and(|c| c.is_ascii_digit());
        if has_fraction {
            self.advance_char(); // Consume '.'
            self.consume_digits();
        }
        self.token(TokenKind::Number, start, line, column)
    }

    fn consume_digits(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_ascii_digit() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn read_string(&mut self, start: usize, line: usize, column: usize) -> LexResult<Token<'a>> {
        let quote = match self.advance_char() {
            Some((_, c)) => c,
            None => return Err(LexError::UnterminatedString { line, column }),
        };
        while let Some(&(_, c)) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.advance_char();
            if c == quote {
                return Ok(self.token(TokenKind::String, start, line, column));
            }
        }
        Err(LexError::UnterminatedString { line, column })
    }

    fn read_comparison(
        &mut self,
        first: char,
        start: usize,
        line: usize,
        column: usize,
    ) -> LexResult<Token<'a>> {
        self.advance_char();
        let followed_by_equal = matches!(self.chars.peek(), Some(&(_, '=')));
        if followed_by_equal {
            self.advance_char();
        }
        let kind = match (first, followed_by_equal) {
            ('=', true) => TokenKind::EqualEqual,
            ('=', false) => TokenKind::Equal,
            ('!', true) => TokenKind::NotEqual,
            ('<', true) => TokenKind::LessEqual,
            ('<', false) => TokenKind::Less,
            ('>', true) => TokenKind::GreaterEqual,
            ('>', false) => TokenKind::Greater,
            _ => {
                return Err(LexError::UnexpectedCharacter {
                    character: first,
                    line,
                    column,
                });
            }
        };
        Ok(self.token(kind, start, line, column))
    }

    fn token(&mut self, kind: TokenKind, start: usize, line: usize, column: usize) -> Token<'a> {
        let end = self.current_index();
        Token::new(
            kind,
            &self.input[start..end],
            Span {
                start,
                end,
                line,
                column,
            },
        )
    }

    fn advance_char(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn peek_second(&self) -> Option<char> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next().map(|(_, c)| c)
    }

    fn current_index(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(idx, _)| *idx)
            .unwrap_or(self.input.len())
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexResult<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof_reached {
            return None;
        }
        Some(self.next_token())
    }
}

/// Tokenizes a whole source text. The returned vector always ends with an
/// `EOF` token.
pub fn tokenize(input: &str) -> LexResult<Vec<Token<'_>>> {
    Lexer::new(input).collect()
}
