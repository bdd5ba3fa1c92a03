use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number,
    String,
    True,
    False,
    None,

    // Keywords
    Pass,
    Def,
    Class,
    If,
    Elif,
    Else,
    For,
    While,
    Return,
    In,
    Const,
    Print,
    Input,

    // Operators
    And,          // and
    Or,           // or
    Not,          // not
    EqualEqual,   // ==
    NotEqual,     // !=
    LessEqual,    // <=
    GreaterEqual, // >=
    Less,         // <
    Greater,      // >
    Plus,         // +
    Minus,        // -
    Star,         // *
    Slash,        // /
    Percent,      // %
    Equal,        // =

    // Delimiters
    Colon,  // :
    Comma,  // ,
    Dot,    // .
    LParen, // (
    RParen, // )

    // Structural
    Newline,
    EOF,
}

impl TokenKind {
    /// Keyword lookup for a complete identifier-shaped word.
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "pass" => Self::Pass,
            "def" => Self::Def,
            "class" => Self::Class,
            "if" => Self::If,
            "elif" => Self::Elif,
            "else" => Self::Else,
            "for" => Self::For,
            "while" => Self::While,
            "return" => Self::Return,
            "in" => Self::In,
            "True" => Self::True,
            "False" => Self::False,
            "None" => Self::None,
            "const" => Self::Const,
            "print" => Self::Print,
            "input" => Self::Input,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Identifier => "identifier",
            Self::Number => "number",
            Self::String => "string",
            Self::True => "'True'",
            Self::False => "'False'",
            Self::None => "'None'",
            Self::Pass => "'pass'",
            Self::Def => "'def'",
            Self::Class => "'class'",
            Self::If => "'if'",
            Self::Elif => "'elif'",
            Self::Else => "'else'",
            Self::For => "'for'",
            Self::While => "'while'",
            Self::Return => "'return'",
            Self::In => "'in'",
            Self::Const => "'const'",
            Self::Print => "'print'",
            Self::Input => "'input'",
            Self::And => "'and'",
            Self::Or => "'or'",
            Self::Not => "'not'",
            Self::EqualEqual => "'=='",
            Self::NotEqual => "'!='",
            Self::LessEqual => "'<='",
            Self::GreaterEqual => "'>='",
            Self::Less => "'<'",
            Self::Greater => "'>'",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Equal => "'='",
            Self::Colon => "':'",
            Self::Comma => "','",
            Self::Dot => "'.'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Newline => "newline",
            Self::EOF => "end of input",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub span: Span,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }
}
