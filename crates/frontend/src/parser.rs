use std::fmt::Display;

mod errors_parser;
mod stmt_parser;
mod type_parser;

use crate::ast::{Expression, Operator, Program, Statement};
use crate::lexer::{Keyword, Symbol, Token, TokenKind};

use tools::errors::{source_lines, CodeErr, ReportCodeErr};

pub use self::errors_parser::ParserError;

pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    fn new(mut tokens: Vec<Token>) -> Self {
        // The stream always ends with EOF, even if the caller handed us
        // a bare Vec
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let line = tokens.last().map(|t| t.line).unwrap_or(1);
            tokens.push(Token {
                kind: TokenKind::Eof,
                line,
            });
        }

        Self { tokens, cursor: 0 }
    }

    /// Parses a whole token stream into a program, statement after statement.
    pub fn parse_program(tokens: Vec<Token>, source: &str) -> Result<Program, CodeErr> {
        let lines = source_lines(source);
        let mut parser = Parser::new(tokens);
        let mut statements = Vec::new();

        while !parser.is_eof() {
            statements.push(
                parser
                    .statement()
                    .map_err(|e| e.to_glob_err(&lines, e.line()))?,
            );
        }

        Ok(Program { statements })
    }

    /// Parses exactly one statement. Trailing tokens are an error.
    pub fn parse_statement(tokens: Vec<Token>, source: &str) -> Result<Statement, CodeErr> {
        let lines = source_lines(source);
        let mut parser = Parser::new(tokens);

        parser
            .statement()
            .and_then(|s| {
                parser.expect_eof()?;
                Ok(s)
            })
            .map_err(|e| e.to_glob_err(&lines, e.line()))
    }

    /// Parses exactly one expression. Trailing tokens are an error.
    pub fn parse_expression(tokens: Vec<Token>, source: &str) -> Result<Expression, CodeErr> {
        let lines = source_lines(source);
        let mut parser = Parser::new(tokens);

        parser
            .expression()
            .and_then(|e| {
                parser.expect_eof()?;
                Ok(e)
            })
            .map_err(|e| e.to_glob_err(&lines, e.line()))
    }

    // ---------
    //  Helpers
    // ---------

    fn at(&self) -> &Token {
        // Safe: new() guarantees at least the EOF token
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.at().clone();
        if !matches!(token.kind, TokenKind::Eof) {
            self.cursor += 1;
        }
        token
    }

    fn is_eof(&self) -> bool {
        matches!(self.at().kind, TokenKind::Eof)
    }

    fn check_symbol(&self, symbol: Symbol) -> bool {
        matches!(&self.at().kind, TokenKind::Symbol(s) if *s == symbol)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        matches!(&self.at().kind, TokenKind::Keyword(k) if *k == keyword)
    }

    fn match_symbol(&mut self, symbol: Symbol) -> bool {
        if self.check_symbol(symbol) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    fn consume_symbol(&mut self, symbol: Symbol) -> Result<Token, ParserError> {
        if self.check_symbol(symbol) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(symbol))
        }
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Result<Token, ParserError> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(keyword))
        }
    }

    fn consume_identifier(&mut self) -> Result<Token, ParserError> {
        if matches!(self.at().kind, TokenKind::Identifier(_)) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_type("an identifier"))
        }
    }

    fn consume_literal(&mut self) -> Result<Token, ParserError> {
        if matches!(self.at().kind, TokenKind::Literal(_)) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_type("a literal"))
        }
    }

    fn expect_eof(&self) -> Result<(), ParserError> {
        if self.is_eof() {
            Ok(())
        } else {
            Err(ParserError::Structural {
                msg: format!("extra token -{}- after complete input", self.at()),
                line: self.at().line,
            })
        }
    }

    fn unexpected(&self, expected: impl Display) -> ParserError {
        ParserError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.at().to_string(),
            line: self.at().line,
        }
    }

    fn unexpected_type(&self, expected: &'static str) -> ParserError {
        ParserError::UnexpectedTokenType {
            expected,
            found: self.at().to_string(),
            line: self.at().line,
        }
    }

    // Comma separated list, at least one item
    fn match_multiple<T>(
        &mut self,
        mut getter: impl FnMut(&mut Self) -> Result<T, ParserError>,
    ) -> Result<Vec<T>, ParserError> {
        let mut items = vec![getter(self)?];

        while self.match_symbol(Symbol::Comma) {
            items.push(getter(self)?);
        }

        Ok(items)
    }

    // -------------
    //  Expressions
    // -------------

    fn expression(&mut self) -> Result<Expression, ParserError> {
        self.logic_or()
    }

    fn logic_or(&mut self) -> Result<Expression, ParserError> {
        let mut left = self.logic_and()?;

        while self.match_keyword(Keyword::Or) {
            let right = self.logic_and()?;
            left = binary(Operator::Or, left, right);
        }

        Ok(left)
    }

    fn logic_and(&mut self) -> Result<Expression, ParserError> {
        let mut left = self.logic_not()?;

        while self.match_keyword(Keyword::And) {
            let right = self.logic_not()?;
            left = binary(Operator::And, left, right);
        }

        Ok(left)
    }

    fn logic_not(&mut self) -> Result<Expression, ParserError> {
        if self.match_keyword(Keyword::Not) {
            let operand = self.logic_not()?;
            Ok(Expression::UnaryOp {
                operator: Operator::Not,
                operand: Box::new(operand),
            })
        } else {
            self.comparison()
        }
    }

    // Comparisons don't chain: a < b < c stops after the first pair
    fn comparison(&mut self) -> Result<Expression, ParserError> {
        const TABLE: [(Symbol, Operator); 6] = [
            (Symbol::Equal, Operator::Equal),
            (Symbol::NotEqual, Operator::NotEqual),
            (Symbol::LessEqual, Operator::LessEqual),
            (Symbol::GreatEqual, Operator::GreatEqual),
            (Symbol::Less, Operator::LessThan),
            (Symbol::Greater, Operator::GreaterThan),
        ];

        let left = self.term()?;

        for (symbol, operator) in TABLE {
            if self.match_symbol(symbol) {
                let right = self.term()?;
                return Ok(binary(operator, left, right));
            }
        }

        Ok(left)
    }

    fn term(&mut self) -> Result<Expression, ParserError> {
        const TABLE: [(Symbol, Operator); 3] = [
            (Symbol::Add, Operator::Add),
            (Symbol::Sub, Operator::Sub),
            (Symbol::Concat, Operator::Concat),
        ];

        self.binary_level(&TABLE, Self::factor)
    }

    fn factor(&mut self) -> Result<Expression, ParserError> {
        const TABLE: [(Symbol, Operator); 2] = [
            (Symbol::Mul, Operator::Mul),
            (Symbol::Div, Operator::Div),
        ];

        self.binary_level(&TABLE, Self::call)
    }

    fn binary_level(
        &mut self,
        table: &[(Symbol, Operator)],
        next: fn(&mut Self) -> Result<Expression, ParserError>,
    ) -> Result<Expression, ParserError> {
        let mut left = next(self)?;

        'outer: loop {
            for (symbol, operator) in table {
                if self.match_symbol(*symbol) {
                    let right = next(self)?;
                    left = binary(*operator, left, right);
                    continue 'outer;
                }
            }
            break;
        }

        Ok(left)
    }

    // Postfix calls and indexings, both chainable: f(x)[1](y) parses
    pub(crate) fn call(&mut self) -> Result<Expression, ParserError> {
        let mut expr = self.primary()?;

        loop {
            if self.match_symbol(Symbol::LParen) {
                let args = if self.check_symbol(Symbol::RParen) {
                    Vec::new()
                } else {
                    self.match_multiple(Self::expression)?
                };
                self.consume_symbol(Symbol::RParen)?;

                expr = Expression::FunctionCall {
                    function: Box::new(expr),
                    args,
                };
            } else if self.match_symbol(Symbol::LBracket) {
                let indexes = self.match_multiple(Self::expression)?;
                self.consume_symbol(Symbol::RBracket)?;

                expr = Expression::ArrayIndex {
                    array: Box::new(expr),
                    indexes,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expression, ParserError> {
        if self.match_symbol(Symbol::LParen) {
            let expr = self.expression()?;
            self.consume_symbol(Symbol::RParen)?;
            return Ok(expr);
        }

        if self.match_symbol(Symbol::Sub) {
            let operand = self.primary()?;
            return Ok(Expression::UnaryOp {
                operator: Operator::Sub,
                operand: Box::new(operand),
            });
        }

        match &self.at().kind {
            TokenKind::Literal(_) => Ok(Expression::Literal(self.advance())),
            TokenKind::Identifier(_) => Ok(Expression::Identifier(self.advance())),
            _ => Err(self.unexpected_type("an expression")),
        }
    }
}

fn binary(operator: Operator, left: Expression, right: Expression) -> Expression {
    Expression::BinaryOp {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn expr(source: &str) -> Expression {
        Parser::parse_expression(tokenize(source).unwrap(), source).unwrap()
    }

    #[test]
    fn factor_binds_tighter_than_term() {
        match expr("1 + 2 * 3") {
            Expression::BinaryOp {
                operator, right, ..
            } => {
                assert_eq!(operator, Operator::Add);
                assert!(matches!(
                    *right,
                    Expression::BinaryOp {
                        operator: Operator::Mul,
                        ..
                    }
                ));
            }
            other => panic!("wrong tree: {:?}", other),
        }
    }

    #[test]
    fn parens_override_precedence() {
        match expr("(1 + 2) * 3") {
            Expression::BinaryOp { operator, left, .. } => {
                assert_eq!(operator, Operator::Mul);
                assert!(matches!(
                    *left,
                    Expression::BinaryOp {
                        operator: Operator::Add,
                        ..
                    }
                ));
            }
            other => panic!("wrong tree: {:?}", other),
        }
    }

    #[test]
    fn comparison_sits_above_term() {
        match expr("a + 1 < b * 2") {
            Expression::BinaryOp { operator, .. } => {
                assert_eq!(operator, Operator::LessThan)
            }
            other => panic!("wrong tree: {:?}", other),
        }
    }

    #[test]
    fn comparisons_do_not_chain() {
        let source = "1 < 2 < 3";
        assert!(Parser::parse_expression(tokenize(source).unwrap(), source).is_err());
    }

    #[test]
    fn logic_ladder_on_top() {
        match expr("a = 1 OR NOT b AND c") {
            Expression::BinaryOp {
                operator, right, ..
            } => {
                assert_eq!(operator, Operator::Or);
                assert!(matches!(
                    *right,
                    Expression::BinaryOp {
                        operator: Operator::And,
                        ..
                    }
                ));
            }
            other => panic!("wrong tree: {:?}", other),
        }
    }

    #[test]
    fn postfix_call_and_index_chain() {
        assert_eq!(format!("{}", expr("grid[i, j]")), "grid[i, j]");
        assert_eq!(format!("{}", expr("f(x)[1]")), "f(x)[1]");
        assert_eq!(format!("{}", expr("LENGTH(\"hi\")")), "LENGTH(hi)");
    }

    #[test]
    fn unary_minus_on_primary() {
        match expr("-5 + 2") {
            Expression::BinaryOp { operator, left, .. } => {
                assert_eq!(operator, Operator::Add);
                assert!(matches!(
                    *left,
                    Expression::UnaryOp {
                        operator: Operator::Sub,
                        ..
                    }
                ));
            }
            other => panic!("wrong tree: {:?}", other),
        }
    }

    #[test]
    fn trailing_tokens_are_rejected() {
        let source = "1 + 2 3";
        assert!(Parser::parse_expression(tokenize(source).unwrap(), source).is_err());
    }

    #[test]
    fn concat_is_a_term_operator() {
        match expr("\"a\" & \"b\" & \"c\"") {
            Expression::BinaryOp { operator, left, .. } => {
                assert_eq!(operator, Operator::Concat);
                assert!(matches!(
                    *left,
                    Expression::BinaryOp {
                        operator: Operator::Concat,
                        ..
                    }
                ));
            }
            other => panic!("wrong tree: {:?}", other),
        }
    }
}
