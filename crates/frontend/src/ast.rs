use std::fmt::Display;

use crate::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Or,
    And,
    Not,
    Equal,
    NotEqual,
    LessEqual,
    GreatEqual,
    LessThan,
    GreaterThan,
    Add,
    Sub,
    Concat,
    Mul,
    Div,
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Operator::Or => "OR",
            Operator::And => "AND",
            Operator::Not => "NOT",
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::LessEqual => "<=",
            Operator::GreatEqual => ">=",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Concat => "&",
            Operator::Mul => "*",
            Operator::Div => "/",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Token kind is always Literal
    Literal(Token),
    /// Token kind is always Identifier
    Identifier(Token),
    ArrayIndex {
        array: Box<Expression>,
        indexes: Vec<Expression>,
    },
    FunctionCall {
        function: Box<Expression>,
        args: Vec<Expression>,
    },
    UnaryOp {
        operator: Operator,
        operand: Box<Expression>,
    },
    BinaryOp {
        operator: Operator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn line(&self) -> u64 {
        match self {
            Expression::Literal(tok) | Expression::Identifier(tok) => tok.line,
            Expression::ArrayIndex { array, .. } => array.line(),
            Expression::FunctionCall { function, .. } => function.line(),
            Expression::UnaryOp { operand, .. } => operand.line(),
            Expression::BinaryOp { left, .. } => left.line(),
        }
    }
}

// Compact rendering used by runtime error messages to name the offending
// sub-expressions.
impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Literal(tok) | Expression::Identifier(tok) => write!(f, "{}", tok),
            Expression::ArrayIndex { array, indexes } => {
                write!(f, "{}[", array)?;
                for (i, idx) in indexes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", idx)?;
                }
                write!(f, "]")
            }
            Expression::FunctionCall { function, args } => {
                write!(f, "{}(", function)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::UnaryOp { operator, operand } => match operator {
                Operator::Not => write!(f, "NOT {}", operand),
                _ => write!(f, "{}{}", operator, operand),
            },
            Expression::BinaryOp {
                operator,
                left,
                right,
            } => write!(f, "{} {} {}", left, operator, right),
        }
    }
}

/// Left hand side of assignments, INPUT and READFILE targets, FOR counters.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignable {
    Identifier(Token),
    ArrayIndex {
        array: Token,
        indexes: Vec<Expression>,
    },
}

impl Assignable {
    pub fn name(&self) -> &str {
        match self {
            Assignable::Identifier(tok) | Assignable::ArrayIndex { array: tok, .. } => {
                tok.identifier_name().unwrap_or("")
            }
        }
    }

    pub fn line(&self) -> u64 {
        match self {
            Assignable::Identifier(tok) | Assignable::ArrayIndex { array: tok, .. } => tok.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveType {
    Integer,
    Real,
    Char,
    String,
    Boolean,
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PrimitiveType::Integer => "INTEGER",
            PrimitiveType::Real => "REAL",
            PrimitiveType::Char => "CHAR",
            PrimitiveType::String => "STRING",
            PrimitiveType::Boolean => "BOOLEAN",
        };
        write!(f, "{}", name)
    }
}

/// Declared type of a variable or parameter. Array bounds stay expressions
/// here, they get evaluated when the declaration runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Primitive(PrimitiveType),
    Array {
        elem: PrimitiveType,
        ranges: Vec<(Expression, Expression)>,
    },
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{}", p),
            Type::Array { elem, ranges } => {
                write!(f, "ARRAY[")?;
                for (i, (lo, hi)) in ranges.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}:{}", lo, hi)?;
                }
                write!(f, "] OF {}", elem)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub line: u64,
}

impl Statement {
    pub fn new(kind: StatementKind, line: u64) -> Self {
        Self { kind, line }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    ProcedureDecl {
        name: Token,
        params: Vec<(Token, Type)>,
        body: Vec<Statement>,
    },
    FunctionDecl {
        name: Token,
        params: Vec<(Token, Type)>,
        return_type: Type,
        body: Vec<Statement>,
    },
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    Case {
        scrutinee: Expression,
        /// Each arm pairs a literal label with its statements
        cases: Vec<(Token, Vec<Statement>)>,
        otherwise: Option<Vec<Statement>>,
    },
    For {
        variable: Assignable,
        start: Expression,
        end: Expression,
        step: Option<Expression>,
        body: Vec<Statement>,
    },
    RepeatUntil {
        body: Vec<Statement>,
        condition: Expression,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    VariableDecl {
        names: Vec<Token>,
        var_type: Type,
    },
    ConstantDecl {
        name: Token,
        value: Token,
    },
    Input {
        target: Assignable,
    },
    Output {
        values: Vec<Expression>,
    },
    Return {
        value: Expression,
    },
    FileOpen {
        file: Token,
        write_mode: bool,
    },
    FileRead {
        file: Token,
        target: Assignable,
    },
    FileWrite {
        file: Token,
        value: Expression,
    },
    FileClose {
        file: Token,
    },
    ProcedureCall {
        name: Token,
        args: Vec<Expression>,
    },
    Assignment {
        target: Assignable,
        value: Expression,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}
