use crate::ast::{
    BinaryOperator, ClassDef, ElifBranch, Expression, FunctionDef, Program, Statement,
    UnaryOperator,
};
use crate::token::{Token, TokenKind};

mod error;

pub use error::SyntaxError;

pub type ParseResult<T> = Result<T, SyntaxError>;

/// Token kinds that may open a statement.
const STATEMENT_START: [TokenKind; 11] = [
    TokenKind::Identifier,
    TokenKind::Return,
    TokenKind::If,
    TokenKind::For,
    TokenKind::While,
    TokenKind::Def,
    TokenKind::Class,
    TokenKind::Print,
    TokenKind::Input,
    TokenKind::Pass,
    TokenKind::Newline,
];

/// `def` and `class` close every open block; definitions never nest.
const DEFINITION_START: [TokenKind; 2] = [TokenKind::Def, TokenKind::Class];

const EXPRESSION_START: [TokenKind; 10] = [
    TokenKind::Number,
    TokenKind::String,
    TokenKind::True,
    TokenKind::False,
    TokenKind::None,
    TokenKind::Identifier,
    TokenKind::Input,
    TokenKind::LParen,
    TokenKind::Not,
    TokenKind::Minus,
];

/// Recursive-descent parser over a fully tokenized source.
///
/// Blocks are not delimited by indentation. Each block is parsed against a
/// set of terminator keywords that is inherited by nested blocks: `if`
/// bodies stop at `elif`/`else`, every block stops at the next `def` or
/// `class`, and at end of input.
pub struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if !matches!(tokens.last(), Some(token) if token.kind == TokenKind::EOF) {
            let span = tokens.last().map(|token| token.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::EOF, "", span));
        }
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse_program(mut self) -> ParseResult<Program> {
        let statements = self.parse_block(&[])?;
        if !self.at(TokenKind::EOF) {
            return Err(self.error(&[TokenKind::EOF]));
        }
        Ok(Program { statements })
    }

    fn parse_block(&mut self, terminators: &[TokenKind]) -> ParseResult<Vec<Statement>> {
        let mut body = Vec::new();
        loop {
            self.consume_newlines();
            if self.at(TokenKind::EOF) || terminators.contains(&self.kind()) {
                break;
            }
            body.push(self.parse_statement(terminators)?);
        }
        Ok(body)
    }

    fn parse_statement(&mut self, terminators: &[TokenKind]) -> ParseResult<Statement> {
        match self.kind() {
            TokenKind::Return => self.parse_return(terminators),
            TokenKind::If => self.parse_if(terminators),
            TokenKind::For => self.parse_for(terminators),
            TokenKind::While => self.parse_while(terminators),
            TokenKind::Def => Ok(Statement::FunctionDef(
                self.parse_function_def(terminators)?,
            )),
            TokenKind::Class => self.parse_class_def(terminators),
            TokenKind::Identifier => self.parse_identifier_statement(terminators),
            TokenKind::Print => {
                let line = self.advance().span.line;
                let args = self.parse_call_args()?;
                self.end_statement(terminators)?;
                Ok(Statement::Print { args, line })
            }
            TokenKind::Input => {
                let line = self.advance().span.line;
                let args = self.parse_call_args()?;
                self.end_statement(terminators)?;
                Ok(Statement::Expr(Expression::Call {
                    name: "input".to_string(),
                    args,
                    line,
                }))
            }
            TokenKind::Pass => {
                self.advance();
                self.end_statement(terminators)?;
                Ok(Statement::Pass)
            }
            _ => {
                let mut expected = STATEMENT_START.to_vec();
                expected.extend_from_slice(terminators);
                expected.push(TokenKind::EOF);
                Err(self.error(&expected))
            }
        }
    }

    fn parse_return(&mut self, terminators: &[TokenKind]) -> ParseResult<Statement> {
        let line = self.advance().span.line;
        let value = if self.at_statement_end(terminators) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.end_statement(terminators)?;
        Ok(Statement::Return { value, line })
    }

    fn parse_if(&mut self, terminators: &[TokenKind]) -> ParseResult<Statement> {
        self.expect(TokenKind::If)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;

        let block_terminators = with_terminators(terminators, &DEFINITION_START);
        let branch_terminators =
            with_terminators(&block_terminators, &[TokenKind::Elif, TokenKind::Else]);
        let then_body = self.parse_block(&branch_terminators)?;

        let mut elif_branches = Vec::new();
        while self.at(TokenKind::Elif) {
            self.advance();
            let condition = self.parse_expression()?;
            self.expect(TokenKind::Colon)?;
            let body = self.parse_block(&branch_terminators)?;
            elif_branches.push(ElifBranch { condition, body });
        }

        let else_body = if self.at(TokenKind::Else) {
            self.advance();
            self.expect(TokenKind::Colon)?;
            Some(self.parse_block(&block_terminators)?)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_body,
            elif_branches,
            else_body,
        })
    }

    fn parse_for(&mut self, terminators: &[TokenKind]) -> ParseResult<Statement> {
        let line = self.expect(TokenKind::For)?.span.line;
        let target = self.expect_identifier()?;
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_block(&with_terminators(terminators, &DEFINITION_START))?;
        Ok(Statement::For {
            target,
            iterable,
            body,
            line,
        })
    }

    fn parse_while(&mut self, terminators: &[TokenKind]) -> ParseResult<Statement> {
        self.expect(TokenKind::While)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::Colon)?;
        let body = self.parse_block(&with_terminators(terminators, &DEFINITION_START))?;
        Ok(Statement::While { condition, body })
    }

    fn parse_function_def(&mut self, terminators: &[TokenKind]) -> ParseResult<FunctionDef> {
        let line = self.expect(TokenKind::Def)?.span.line;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier()?);
                if self.at(TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Colon)?;

        let body = self.parse_block(&with_terminators(terminators, &DEFINITION_START))?;
        Ok(FunctionDef {
            name,
            params,
            body,
            line,
        })
    }

    fn parse_class_def(&mut self, terminators: &[TokenKind]) -> ParseResult<Statement> {
        let line = self.expect(TokenKind::Class)?.span.line;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;

        let mut methods = Vec::new();
        loop {
            self.consume_newlines();
            match self.kind() {
                TokenKind::Def => methods.push(self.parse_function_def(terminators)?),
                TokenKind::Pass => {
                    self.advance();
                    self.end_statement(terminators)?;
                    break;
                }
                _ => break,
            }
        }

        Ok(Statement::ClassDef(ClassDef {
            name,
            methods,
            line,
        }))
    }

    fn parse_identifier_statement(&mut self, terminators: &[TokenKind]) -> ParseResult<Statement> {
        let token = self.advance();
        let name = token.lexeme.to_string();
        let line = token.span.line;

        let statement = match self.kind() {
            TokenKind::Dot => {
                self.advance();
                let attribute = self.expect_identifier()?;
                match self.kind() {
                    TokenKind::Equal => {
                        self.advance();
                        let value = self.parse_expression()?;
                        Statement::AttrAssign {
                            object: name,
                            name: attribute,
                            value,
                            line,
                        }
                    }
                    TokenKind::LParen => {
                        let args = self.parse_call_args()?;
                        Statement::Expr(Expression::MethodCall {
                            object: name,
                            method: attribute,
                            args,
                            line,
                        })
                    }
                    _ => Statement::Expr(Expression::Attribute {
                        object: name,
                        name: attribute,
                        line,
                    }),
                }
            }
            TokenKind::Equal => {
                self.advance();
                let value = self.parse_expression()?;
                Statement::Assign { name, value, line }
            }
            TokenKind::LParen => {
                let args = self.parse_call_args()?;
                Statement::Expr(Expression::Call { name, args, line })
            }
            _ => Statement::Expr(Expression::Variable { name, line }),
        };

        self.end_statement(terminators)?;
        Ok(statement)
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_and()?;
        while self.at(TokenKind::Or) {
            let line = self.advance().span.line;
            let right = self.parse_and()?;
            expr = binary(BinaryOperator::Or, expr, right, line);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_not()?;
        while self.at(TokenKind::And) {
            let line = self.advance().span.line;
            let right = self.parse_not()?;
            expr = binary(BinaryOperator::And, expr, right, line);
        }
        Ok(expr)
    }

    // `not` binds looser than comparisons: `not a == b` is `not (a == b)`.
    fn parse_not(&mut self) -> ParseResult<Expression> {
        if self.at(TokenKind::Not) {
            let line = self.advance().span.line;
            let operand = self.parse_not()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Not,
                operand: Box::new(operand),
                line,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::NotEqual => BinaryOperator::NotEqual,
                TokenKind::Less => BinaryOperator::Less,
                TokenKind::Greater => BinaryOperator::Greater,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };
            let line = self.advance().span.line;
            let right = self.parse_additive()?;
            expr = binary(op, expr, right, line);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Sub,
                _ => break,
            };
            let line = self.advance().span.line;
            let right = self.parse_multiplicative()?;
            expr = binary(op, expr, right, line);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinaryOperator::Mul,
                TokenKind::Slash => BinaryOperator::Div,
                TokenKind::Percent => BinaryOperator::Mod,
                _ => break,
            };
            let line = self.advance().span.line;
            let right = self.parse_unary()?;
            expr = binary(op, expr, right, line);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if self.at(TokenKind::Minus) {
            let line = self.advance().span.line;
            let operand = self.parse_unary()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
                line,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.kind() {
            TokenKind::Number => {
                let token = self.advance();
                parse_number(token.lexeme, token.span.line)
            }
            TokenKind::String => Ok(Expression::String(self.advance().lexeme.to_string())),
            TokenKind::True => {
                self.advance();
                Ok(Expression::Boolean(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expression::Boolean(false))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expression::None)
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::Input => {
                let line = self.advance().span.line;
                let args = self.parse_call_args()?;
                Ok(Expression::Call {
                    name: "input".to_string(),
                    args,
                    line,
                })
            }
            TokenKind::Identifier => {
                let token = self.advance();
                let name = token.lexeme.to_string();
                let line = token.span.line;
                if self.at(TokenKind::Dot) {
                    self.advance();
                    let attribute = self.expect_identifier()?;
                    if self.at(TokenKind::LParen) {
                        let args = self.parse_call_args()?;
                        return Ok(Expression::MethodCall {
                            object: name,
                            method: attribute,
                            args,
                            line,
                        });
                    }
                    return Ok(Expression::Attribute {
                        object: name,
                        name: attribute,
                        line,
                    });
                }
                if self.at(TokenKind::LParen) {
                    let args = self.parse_call_args()?;
                    return Ok(Expression::Call { name, args, line });
                }
                Ok(Expression::Variable { name, line })
            }
            _ => Err(self.error(&EXPRESSION_START)),
        }
    }

    fn parse_call_args(&mut self) -> ParseResult<Vec<Expression>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) {
            args.push(self.parse_expression()?);
            if self.at(TokenKind::Comma) {
                self.advance();
            } else if !self.at(TokenKind::RParen) {
                return Err(self.error(&[TokenKind::Comma, TokenKind::RParen]));
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn end_statement(&mut self, terminators: &[TokenKind]) -> ParseResult<()> {
        if self.at(TokenKind::Newline) {
            self.advance();
            return Ok(());
        }
        if self.at_statement_end(terminators) {
            return Ok(());
        }
        let mut expected = vec![TokenKind::Newline, TokenKind::EOF];
        expected.extend_from_slice(terminators);
        Err(self.error(&expected))
    }

    fn at_statement_end(&self, terminators: &[TokenKind]) -> bool {
        matches!(self.kind(), TokenKind::Newline | TokenKind::EOF)
            || terminators.contains(&self.kind())
    }

    fn consume_newlines(&mut self) -> bool {
        let mut consumed = false;
        while self.at(TokenKind::Newline) {
            consumed = true;
            self.advance();
        }
        consumed
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token<'a>> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(&[kind]))
        }
    }

    fn expect_identifier(&mut self) -> ParseResult<String> {
        Ok(self.expect(TokenKind::Identifier)?.lexeme.to_string())
    }

    fn current(&self) -> &Token<'a> {
        // `new` guarantees a trailing EOF and `advance` never moves past it.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn advance(&mut self) -> Token<'a> {
        let token = self.current().clone();
        if token.kind != TokenKind::EOF {
            self.position += 1;
        }
        token
    }

    fn error(&self, expected: &[TokenKind]) -> SyntaxError {
        let token = self.current();
        let mut expected = expected.to_vec();
        expected.dedup();
        SyntaxError::UnexpectedToken {
            line: token.span.line,
            expected,
            found: token.kind,
            lexeme: token.lexeme.to_string(),
        }
    }
}

fn with_terminators(inherited: &[TokenKind], own: &[TokenKind]) -> Vec<TokenKind> {
    let mut terminators = inherited.to_vec();
    for kind in own {
        if !terminators.contains(kind) {
            terminators.push(*kind);
        }
    }
    terminators
}

fn binary(op: BinaryOperator, left: Expression, right: Expression, line: usize) -> Expression {
    Expression::BinaryOp {
        op,
        left: Box::new(left),
        right: Box::new(right),
        line,
    }
}

fn parse_number(literal: &str, line: usize) -> ParseResult<Expression> {
    let invalid = || SyntaxError::InvalidNumber {
        literal: literal.to_string(),
        line,
    };
    if literal.contains('.') {
        literal
            .parse::<f64>()
            .map(Expression::Float)
            .map_err(|_| invalid())
    } else {
        literal
            .parse::<i64>()
            .map(Expression::Integer)
            .map_err(|_| invalid())
    }
}

pub fn parse_tokens(tokens: Vec<Token<'_>>) -> ParseResult<Program> {
    Parser::new(tokens).parse_program()
}
