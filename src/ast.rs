//! Syntax tree produced by the parser and walked by the interpreter.
//!
//! Every node owns its children. Nodes whose evaluation can fail or emit a
//! warning carry the source line they start on.

#[derive(Debug, PartialEq, Clone)]
pub enum Expression {
    Integer(i64),
    Float(f64),
    /// Raw string lexeme, including quotes and an optional `f` prefix.
    String(String),
    Boolean(bool),
    None,
    Variable {
        name: String,
        line: usize,
    },
    Attribute {
        object: String,
        name: String,
        line: usize,
    },
    MethodCall {
        object: String,
        method: String,
        args: Vec<Expression>,
        line: usize,
    },
    Call {
        name: String,
        args: Vec<Expression>,
        line: usize,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
        line: usize,
    },
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        line: usize,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOperator {
    Not,
    Negate,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Statement>,
    pub line: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassDef {
    pub name: String,
    pub methods: Vec<FunctionDef>,
    pub line: usize,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ElifBranch {
    pub condition: Expression,
    pub body: Vec<Statement>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Statement {
    Assign {
        name: String,
        value: Expression,
        line: usize,
    },
    AttrAssign {
        object: String,
        name: String,
        value: Expression,
        line: usize,
    },
    If {
        condition: Expression,
        then_body: Vec<Statement>,
        elif_branches: Vec<ElifBranch>,
        else_body: Option<Vec<Statement>>,
    },
    For {
        target: String,
        iterable: Expression,
        body: Vec<Statement>,
        line: usize,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Return {
        value: Option<Expression>,
        line: usize,
    },
    Print {
        args: Vec<Expression>,
        line: usize,
    },
    Pass,
    /// Call, method call, attribute read, bare variable, or `input(...)`
    /// used as a statement.
    Expr(Expression),
}

#[derive(Debug, PartialEq, Clone)]
pub struct Program {
    pub statements: Vec<Statement>,
}
