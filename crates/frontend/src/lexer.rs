use std::fmt::Display;

use colored::*;
use thiserror::Error;

use tools::errors::{source_lines, CodeErr, ReportCodeErr};

#[derive(Debug, Error, PartialEq)]
pub enum LexerError {
    #[error("{} while tokenizing number -{0}-, found two '.' to construct a decimal.", "Error".bold().red())]
    DoubleDotNumber(String, u64),

    #[error("{} while tokenizing number -{0}-, letters are not allowed in numbers.", "Error".bold().red())]
    AlphaCharInNumber(String, u64),

    #[error("{} while tokenizing number -{0}-, value is too large.", "Error".bold().red())]
    NumberTooLarge(String, u64),

    #[error("{} while tokenizing string literal, missing closing '\"'.", "Error".bold().red())]
    UnterminatedString(u64),

    #[error("{} while tokenizing character literal, expected one character between single quotes.", "Error".bold().red())]
    MalformedChar(u64),

    #[error("{} while tokenizing code, unsupported character: -{0}-.", "Error".bold().red())]
    UnrecognizedChar(char, u64),
}

impl LexerError {
    fn line(&self) -> u64 {
        match self {
            LexerError::DoubleDotNumber(_, l)
            | LexerError::AlphaCharInNumber(_, l)
            | LexerError::NumberTooLarge(_, l)
            | LexerError::UnterminatedString(l)
            | LexerError::MalformedChar(l)
            | LexerError::UnrecognizedChar(_, l) => *l,
        }
    }
}

impl ReportCodeErr for LexerError {}

/// Literal payload carried by tokens and, later, produced back by the
/// evaluator. Scalars only, arrays never appear in source literals.
#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Char(char),
    Str(String),
    Boolean(bool),
}

// Comparing an INTEGER to a REAL works by value, like the language does
// in CASE branches and '=' expressions.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => {
                if r.fract() == 0.0 && r.is_finite() {
                    write!(f, "{:.1}", r)
                } else {
                    write!(f, "{}", r)
                }
            }
            Value::Char(c) => write!(f, "{}", c),
            Value::Str(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    // Declarations
    Declare,
    Constant,
    Array,
    Of,
    // Callables
    Procedure,
    EndProcedure,
    Function,
    EndFunction,
    Returns,
    Return,
    Call,
    // Control flow
    If,
    Then,
    Else,
    EndIf,
    Case,
    Otherwise,
    EndCase,
    For,
    To,
    Step,
    Next,
    Repeat,
    Until,
    While,
    Do,
    EndWhile,
    // IO
    Input,
    Output,
    OpenFile,
    ReadFile,
    WriteFile,
    CloseFile,
    Read,
    Write,
    // Logic operators
    And,
    Or,
    Not,
    // Type names
    Integer,
    Real,
    Char,
    String,
    Boolean,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Keyword> {
        let kw = match word {
            "DECLARE" => Keyword::Declare,
            "CONSTANT" => Keyword::Constant,
            "ARRAY" => Keyword::Array,
            "OF" => Keyword::Of,
            "PROCEDURE" => Keyword::Procedure,
            "ENDPROCEDURE" => Keyword::EndProcedure,
            "FUNCTION" => Keyword::Function,
            "ENDFUNCTION" => Keyword::EndFunction,
            "RETURNS" => Keyword::Returns,
            "RETURN" => Keyword::Return,
            "CALL" => Keyword::Call,
            "IF" => Keyword::If,
            "THEN" => Keyword::Then,
            "ELSE" => Keyword::Else,
            "ENDIF" => Keyword::EndIf,
            "CASE" => Keyword::Case,
            "OTHERWISE" => Keyword::Otherwise,
            "ENDCASE" => Keyword::EndCase,
            "FOR" => Keyword::For,
            "TO" => Keyword::To,
            "STEP" => Keyword::Step,
            "NEXT" => Keyword::Next,
            "REPEAT" => Keyword::Repeat,
            "UNTIL" => Keyword::Until,
            "WHILE" => Keyword::While,
            "DO" => Keyword::Do,
            "ENDWHILE" => Keyword::EndWhile,
            "INPUT" => Keyword::Input,
            "OUTPUT" => Keyword::Output,
            "OPENFILE" => Keyword::OpenFile,
            "READFILE" => Keyword::ReadFile,
            "WRITEFILE" => Keyword::WriteFile,
            "CLOSEFILE" => Keyword::CloseFile,
            "READ" => Keyword::Read,
            "WRITE" => Keyword::Write,
            "AND" => Keyword::And,
            "OR" => Keyword::Or,
            "NOT" => Keyword::Not,
            "INTEGER" => Keyword::Integer,
            "REAL" => Keyword::Real,
            "CHAR" => Keyword::Char,
            "STRING" => Keyword::String,
            "BOOLEAN" => Keyword::Boolean,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_word(&self) -> &'static str {
        match self {
            Keyword::Declare => "DECLARE",
            Keyword::Constant => "CONSTANT",
            Keyword::Array => "ARRAY",
            Keyword::Of => "OF",
            Keyword::Procedure => "PROCEDURE",
            Keyword::EndProcedure => "ENDPROCEDURE",
            Keyword::Function => "FUNCTION",
            Keyword::EndFunction => "ENDFUNCTION",
            Keyword::Returns => "RETURNS",
            Keyword::Return => "RETURN",
            Keyword::Call => "CALL",
            Keyword::If => "IF",
            Keyword::Then => "THEN",
            Keyword::Else => "ELSE",
            Keyword::EndIf => "ENDIF",
            Keyword::Case => "CASE",
            Keyword::Otherwise => "OTHERWISE",
            Keyword::EndCase => "ENDCASE",
            Keyword::For => "FOR",
            Keyword::To => "TO",
            Keyword::Step => "STEP",
            Keyword::Next => "NEXT",
            Keyword::Repeat => "REPEAT",
            Keyword::Until => "UNTIL",
            Keyword::While => "WHILE",
            Keyword::Do => "DO",
            Keyword::EndWhile => "ENDWHILE",
            Keyword::Input => "INPUT",
            Keyword::Output => "OUTPUT",
            Keyword::OpenFile => "OPENFILE",
            Keyword::ReadFile => "READFILE",
            Keyword::WriteFile => "WRITEFILE",
            Keyword::CloseFile => "CLOSEFILE",
            Keyword::Read => "READ",
            Keyword::Write => "WRITE",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Not => "NOT",
            Keyword::Integer => "INTEGER",
            Keyword::Real => "REAL",
            Keyword::Char => "CHAR",
            Keyword::String => "STRING",
            Keyword::Boolean => "BOOLEAN",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_word())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Assign, // <-
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Equal,
    NotEqual,
    LessEqual,
    GreatEqual,
    Less,
    Greater,
    Add,
    Sub,
    Mul,
    Div,
    Concat, // &
}

impl Symbol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbol::Assign => "<-",
            Symbol::LParen => "(",
            Symbol::RParen => ")",
            Symbol::LBracket => "[",
            Symbol::RBracket => "]",
            Symbol::Comma => ",",
            Symbol::Colon => ":",
            Symbol::Equal => "=",
            Symbol::NotEqual => "<>",
            Symbol::LessEqual => "<=",
            Symbol::GreatEqual => ">=",
            Symbol::Less => "<",
            Symbol::Greater => ">",
            Symbol::Add => "+",
            Symbol::Sub => "-",
            Symbol::Mul => "*",
            Symbol::Div => "/",
            Symbol::Concat => "&",
        }
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Literal(Value),
    Identifier(String),
    Keyword(Keyword),
    Symbol(Symbol),
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Literal(v) => write!(f, "{}", v),
            TokenKind::Identifier(name) => write!(f, "{}", name),
            TokenKind::Keyword(kw) => write!(f, "{}", kw),
            TokenKind::Symbol(sym) => write!(f, "{}", sym),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u64,
}

impl Token {
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn literal_value(&self) -> Option<&Value> {
        match &self.kind {
            TokenKind::Literal(v) => Some(v),
            _ => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

/// Turns a whole source text into tokens. Lines are 1 based and the stream
/// always ends with an EOF token carrying the last line number.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CodeErr> {
    Lexer::new(source)
        .run()
        .map_err(|e| e.to_glob_err(&source_lines(source), e.line()))
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u64,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexerError> {
        while let Some(c) = self.bump() {
            match c {
                ' ' | '\t' | '\r' => {}
                '\n' => self.line += 1,
                '/' => {
                    if self.peek() == Some('/') {
                        // Comment, runs to end of line
                        while let Some(nc) = self.peek() {
                            if nc == '\n' {
                                break;
                            }
                            self.pos += 1;
                        }
                    } else {
                        self.push_symbol(Symbol::Div);
                    }
                }
                '(' => self.push_symbol(Symbol::LParen),
                ')' => self.push_symbol(Symbol::RParen),
                '[' => self.push_symbol(Symbol::LBracket),
                ']' => self.push_symbol(Symbol::RBracket),
                ',' => self.push_symbol(Symbol::Comma),
                ':' => self.push_symbol(Symbol::Colon),
                '=' => self.push_symbol(Symbol::Equal),
                '+' => self.push_symbol(Symbol::Add),
                '-' => self.push_symbol(Symbol::Sub),
                '*' => self.push_symbol(Symbol::Mul),
                '&' => self.push_symbol(Symbol::Concat),
                '<' => match self.peek() {
                    Some('-') => {
                        self.pos += 1;
                        self.push_symbol(Symbol::Assign);
                    }
                    Some('>') => {
                        self.pos += 1;
                        self.push_symbol(Symbol::NotEqual);
                    }
                    Some('=') => {
                        self.pos += 1;
                        self.push_symbol(Symbol::LessEqual);
                    }
                    _ => self.push_symbol(Symbol::Less),
                },
                '>' => {
                    if self.peek() == Some('=') {
                        self.pos += 1;
                        self.push_symbol(Symbol::GreatEqual);
                    } else {
                        self.push_symbol(Symbol::Greater);
                    }
                }
                '"' => self.string_literal()?,
                '\'' => self.char_literal()?,
                _ if c.is_ascii_digit() => self.number(c)?,
                _ if c.is_alphabetic() || c == '_' => self.word(c),
                _ => return Err(LexerError::UnrecognizedChar(c, self.line)),
            }
        }

        self.tokens.push(Token {
            kind: TokenKind::Eof,
            line: self.line,
        });

        Ok(self.tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn push_symbol(&mut self, sym: Symbol) {
        self.tokens.push(Token {
            kind: TokenKind::Symbol(sym),
            line: self.line,
        });
    }

    fn push_literal(&mut self, value: Value) {
        self.tokens.push(Token {
            kind: TokenKind::Literal(value),
            line: self.line,
        });
    }

    fn string_literal(&mut self) -> Result<(), LexerError> {
        let mut text = String::new();

        loop {
            match self.bump() {
                Some('"') => break,
                Some('\n') | None => return Err(LexerError::UnterminatedString(self.line)),
                Some(c) => text.push(c),
            }
        }

        self.push_literal(Value::Str(text));
        Ok(())
    }

    fn char_literal(&mut self) -> Result<(), LexerError> {
        let c = match self.bump() {
            Some('\'') | Some('\n') | None => return Err(LexerError::MalformedChar(self.line)),
            Some(c) => c,
        };

        if self.bump() != Some('\'') {
            return Err(LexerError::MalformedChar(self.line));
        }

        self.push_literal(Value::Char(c));
        Ok(())
    }

    fn number(&mut self, first: char) -> Result<(), LexerError> {
        let mut text = String::from(first);
        let mut seen_dot = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.pos += 1;
            } else if c == '.' {
                if seen_dot {
                    return Err(LexerError::DoubleDotNumber(text, self.line));
                }
                seen_dot = true;
                text.push(c);
                self.pos += 1;
            } else if c.is_alphabetic() || c == '_' {
                return Err(LexerError::AlphaCharInNumber(text, self.line));
            } else {
                break;
            }
        }

        let value = if seen_dot {
            Value::Real(
                text.parse::<f64>()
                    .map_err(|_| LexerError::NumberTooLarge(text.clone(), self.line))?,
            )
        } else {
            Value::Integer(
                text.parse::<i64>()
                    .map_err(|_| LexerError::NumberTooLarge(text.clone(), self.line))?,
            )
        };

        self.push_literal(value);
        Ok(())
    }

    fn word(&mut self, first: char) {
        let mut text = String::from(first);

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }

        let kind = match text.as_str() {
            "TRUE" => TokenKind::Literal(Value::Boolean(true)),
            "FALSE" => TokenKind::Literal(Value::Boolean(false)),
            _ => match Keyword::from_word(&text) {
                Some(kw) => TokenKind::Keyword(kw),
                None => TokenKind::Identifier(text),
            },
        };

        self.tokens.push(Token {
            kind,
            line: self.line,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenize_declaration() {
        assert_eq!(
            kinds("DECLARE x : INTEGER"),
            vec![
                TokenKind::Keyword(Keyword::Declare),
                TokenKind::Identifier("x".into()),
                TokenKind::Symbol(Symbol::Colon),
                TokenKind::Keyword(Keyword::Integer),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_literals() {
        assert_eq!(
            kinds("42 3.5 \"hi\" 'c' TRUE FALSE"),
            vec![
                TokenKind::Literal(Value::Integer(42)),
                TokenKind::Literal(Value::Real(3.5)),
                TokenKind::Literal(Value::Str("hi".into())),
                TokenKind::Literal(Value::Char('c')),
                TokenKind::Literal(Value::Boolean(true)),
                TokenKind::Literal(Value::Boolean(false)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tokenize_compound_symbols() {
        assert_eq!(
            kinds("x <- a <> b <= c >= d < e > f & g"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Symbol(Symbol::Assign),
                TokenKind::Identifier("a".into()),
                TokenKind::Symbol(Symbol::NotEqual),
                TokenKind::Identifier("b".into()),
                TokenKind::Symbol(Symbol::LessEqual),
                TokenKind::Identifier("c".into()),
                TokenKind::Symbol(Symbol::GreatEqual),
                TokenKind::Identifier("d".into()),
                TokenKind::Symbol(Symbol::Less),
                TokenKind::Identifier("e".into()),
                TokenKind::Symbol(Symbol::Greater),
                TokenKind::Identifier("f".into()),
                TokenKind::Symbol(Symbol::Concat),
                TokenKind::Identifier("g".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        assert_eq!(
            kinds("OUTPUT 1 // says hello\nOUTPUT 2"),
            vec![
                TokenKind::Keyword(Keyword::Output),
                TokenKind::Literal(Value::Integer(1)),
                TokenKind::Keyword(Keyword::Output),
                TokenKind::Literal(Value::Integer(2)),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_numbers_are_one_based() {
        let tokens = tokenize("OUTPUT 1\nOUTPUT 2").unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[2].line, 2);
        assert_eq!(tokens.last().unwrap().line, 2);
    }

    #[test]
    fn double_dot_number_is_rejected() {
        assert!(tokenize("x <- 1.2.3").is_err());
    }

    #[test]
    fn unterminated_string_is_rejected() {
        assert!(tokenize("OUTPUT \"oops").is_err());
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert_eq!(
            kinds("declare"),
            vec![TokenKind::Identifier("declare".into()), TokenKind::Eof]
        );
    }
}
