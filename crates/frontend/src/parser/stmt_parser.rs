use super::{Parser, ParserError};
use crate::ast::{Assignable, Expression, Statement, StatementKind, Type};
use crate::lexer::{Keyword, Symbol, Token, TokenKind};

impl Parser {
    pub(super) fn statement(&mut self) -> Result<Statement, ParserError> {
        if let TokenKind::Keyword(kw) = self.at().kind {
            match kw {
                Keyword::Procedure => return self.procedure_decl(),
                Keyword::Function => return self.function_decl(),
                Keyword::If => return self.if_stmt(),
                Keyword::Case => return self.case_stmt(),
                Keyword::For => return self.for_loop(),
                Keyword::Repeat => return self.repeat_until(),
                Keyword::While => return self.while_loop(),
                Keyword::Declare => return self.variable_decl(),
                Keyword::Constant => return self.constant_decl(),
                Keyword::Input => return self.input_stmt(),
                Keyword::Output => return self.output_stmt(),
                Keyword::Return => return self.return_stmt(),
                Keyword::OpenFile => return self.file_open(),
                Keyword::ReadFile => return self.file_read(),
                Keyword::WriteFile => return self.file_write(),
                Keyword::CloseFile => return self.file_close(),
                Keyword::Call => return self.procedure_call(),
                // Any other keyword falls through and fails as an
                // assignment target
                _ => {}
            }
        }

        self.assignment()
    }

    // Runs statements until one of the closing keywords shows up,
    // consuming the closer only when asked to
    fn statements_until(
        &mut self,
        closers: &[Keyword],
        consume_closer: bool,
    ) -> Result<Vec<Statement>, ParserError> {
        let mut stmts = Vec::new();

        loop {
            if let TokenKind::Keyword(kw) = self.at().kind {
                if closers.contains(&kw) {
                    break;
                }
            }

            if self.is_eof() {
                return Err(ParserError::UnexpectedToken {
                    expected: closers[0].to_string(),
                    found: "end of file".into(),
                    line: self.at().line,
                });
            }

            stmts.push(self.statement()?);
        }

        if consume_closer {
            self.advance();
        }

        Ok(stmts)
    }

    fn procedure_decl(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Procedure)?.line;
        let (name, params) = self.callable_header()?;
        let body = self.statements_until(&[Keyword::EndProcedure], true)?;

        Ok(Statement::new(
            StatementKind::ProcedureDecl { name, params, body },
            line,
        ))
    }

    fn function_decl(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Function)?.line;
        let (name, params) = self.callable_header()?;
        self.consume_keyword(Keyword::Returns)?;
        let return_type = self.parse_type()?;
        let body = self.statements_until(&[Keyword::EndFunction], true)?;

        Ok(Statement::new(
            StatementKind::FunctionDecl {
                name,
                params,
                return_type,
                body,
            },
            line,
        ))
    }

    // Shared between PROCEDURE and FUNCTION: name plus an optional
    // parenthesised parameter list
    fn callable_header(&mut self) -> Result<(Token, Vec<(Token, Type)>), ParserError> {
        let name = self.consume_identifier()?;
        let mut params = Vec::new();

        if self.match_symbol(Symbol::LParen) {
            if !self.check_symbol(Symbol::RParen) {
                params = self.match_multiple(Self::parameter)?;
            }
            self.consume_symbol(Symbol::RParen)?;
        }

        Ok((name, params))
    }

    fn parameter(&mut self) -> Result<(Token, Type), ParserError> {
        let name = self.consume_identifier()?;
        self.consume_symbol(Symbol::Colon)?;
        let param_type = self.parse_type()?;

        Ok((name, param_type))
    }

    fn if_stmt(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::If)?.line;
        let condition = self.expression()?;
        self.consume_keyword(Keyword::Then)?;

        let then_branch = self.statements_until(&[Keyword::Else, Keyword::EndIf], false)?;

        let else_branch = if self.match_keyword(Keyword::Else) {
            Some(self.statements_until(&[Keyword::EndIf], true)?)
        } else {
            self.consume_keyword(Keyword::EndIf)?;
            None
        };

        Ok(Statement::new(
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            },
            line,
        ))
    }

    fn case_stmt(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Case)?.line;
        self.consume_keyword(Keyword::Of)?;
        let scrutinee = self.expression()?;

        let mut cases = Vec::new();
        let mut otherwise = None;

        loop {
            if self.match_keyword(Keyword::EndCase) {
                break;
            }

            if self.match_keyword(Keyword::Otherwise) {
                self.consume_symbol(Symbol::Colon)?;
                otherwise = Some(self.statements_until(&[Keyword::EndCase], true)?);
                break;
            }

            if self.is_eof() {
                return Err(ParserError::UnexpectedToken {
                    expected: Keyword::EndCase.to_string(),
                    found: "end of file".into(),
                    line: self.at().line,
                });
            }

            let label = self.consume_literal()?;
            self.consume_symbol(Symbol::Colon)?;
            let body = self.case_branch_body();
            cases.push((label, body));
        }

        Ok(Statement::new(
            StatementKind::Case {
                scrutinee,
                cases,
                otherwise,
            },
            line,
        ))
    }

    // A branch body has no closing keyword of its own, so we parse
    // statements speculatively and roll the cursor back once one fails:
    // that failure is the next label, OTHERWISE or ENDCASE.
    fn case_branch_body(&mut self) -> Vec<Statement> {
        let mut body = Vec::new();

        while !self.is_eof() {
            let checkpoint = self.cursor;
            match self.statement() {
                Ok(stmt) => body.push(stmt),
                Err(_) => {
                    self.cursor = checkpoint;
                    break;
                }
            }
        }

        body
    }

    fn for_loop(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::For)?.line;
        let variable = self.assignable()?;
        self.consume_symbol(Symbol::Assign)?;
        let start = self.expression()?;
        self.consume_keyword(Keyword::To)?;
        let end = self.expression()?;

        let step = if self.match_keyword(Keyword::Step) {
            Some(self.expression()?)
        } else {
            None
        };

        let body = self.statements_until(&[Keyword::Next], true)?;

        // The counter name repeats after NEXT and must match
        let trailing = self.consume_identifier()?;
        if trailing.identifier_name() != Some(variable.name()) {
            return Err(ParserError::UnexpectedToken {
                expected: variable.name().to_string(),
                found: trailing.to_string(),
                line: trailing.line,
            });
        }

        Ok(Statement::new(
            StatementKind::For {
                variable,
                start,
                end,
                step,
                body,
            },
            line,
        ))
    }

    fn repeat_until(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Repeat)?.line;
        let body = self.statements_until(&[Keyword::Until], true)?;
        let condition = self.expression()?;

        Ok(Statement::new(
            StatementKind::RepeatUntil { body, condition },
            line,
        ))
    }

    fn while_loop(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::While)?.line;
        let condition = self.expression()?;
        self.consume_keyword(Keyword::Do)?;
        let body = self.statements_until(&[Keyword::EndWhile], true)?;

        Ok(Statement::new(
            StatementKind::While { condition, body },
            line,
        ))
    }

    fn variable_decl(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Declare)?.line;
        let names = self.match_multiple(Self::consume_identifier)?;
        self.consume_symbol(Symbol::Colon)?;
        let var_type = self.parse_type()?;

        Ok(Statement::new(
            StatementKind::VariableDecl { names, var_type },
            line,
        ))
    }

    fn constant_decl(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Constant)?.line;
        let name = self.consume_identifier()?;

        // Both CONSTANT k = 1 and CONSTANT k <- 1 are seen in the wild
        if !self.match_symbol(Symbol::Equal) {
            self.consume_symbol(Symbol::Assign)?;
        }

        let value = self.consume_literal()?;

        Ok(Statement::new(
            StatementKind::ConstantDecl { name, value },
            line,
        ))
    }

    fn input_stmt(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Input)?.line;
        let target = self.assignable()?;

        Ok(Statement::new(StatementKind::Input { target }, line))
    }

    fn output_stmt(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Output)?.line;
        let values = self.match_multiple(Self::expression)?;

        Ok(Statement::new(StatementKind::Output { values }, line))
    }

    fn return_stmt(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Return)?.line;
        let value = self.expression()?;

        Ok(Statement::new(StatementKind::Return { value }, line))
    }

    fn file_open(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::OpenFile)?.line;
        let file = self.consume_literal()?;
        self.consume_keyword(Keyword::For)?;

        let write_mode = if self.match_keyword(Keyword::Write) {
            true
        } else if self.match_keyword(Keyword::Read) {
            false
        } else {
            return Err(self.unexpected_type("READ or WRITE"));
        };

        Ok(Statement::new(
            StatementKind::FileOpen { file, write_mode },
            line,
        ))
    }

    fn file_read(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::ReadFile)?.line;
        let file = self.consume_literal()?;
        self.consume_symbol(Symbol::Comma)?;
        let target = self.assignable()?;

        Ok(Statement::new(StatementKind::FileRead { file, target }, line))
    }

    fn file_write(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::WriteFile)?.line;
        let file = self.consume_literal()?;
        self.consume_symbol(Symbol::Comma)?;
        let value = self.expression()?;

        Ok(Statement::new(StatementKind::FileWrite { file, value }, line))
    }

    fn file_close(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::CloseFile)?.line;
        let file = self.consume_literal()?;

        Ok(Statement::new(StatementKind::FileClose { file }, line))
    }

    fn procedure_call(&mut self) -> Result<Statement, ParserError> {
        let line = self.consume_keyword(Keyword::Call)?.line;
        let name = self.consume_identifier()?;
        let mut args = Vec::new();

        if self.match_symbol(Symbol::LParen) {
            if !self.check_symbol(Symbol::RParen) {
                args = self.match_multiple(Self::expression)?;
            }
            self.consume_symbol(Symbol::RParen)?;
        }

        Ok(Statement::new(
            StatementKind::ProcedureCall { name, args },
            line,
        ))
    }

    fn assignment(&mut self) -> Result<Statement, ParserError> {
        let line = self.at().line;
        let target = self.assignable()?;
        self.consume_symbol(Symbol::Assign)?;
        let value = self.expression()?;

        Ok(Statement::new(
            StatementKind::Assignment { target, value },
            line,
        ))
    }

    // Reuses the postfix expression parser, then narrows the shape down
    // to a plain name or a name with indexes
    pub(super) fn assignable(&mut self) -> Result<Assignable, ParserError> {
        let expr = self.call()?;

        match expr {
            Expression::Identifier(tok) => Ok(Assignable::Identifier(tok)),
            Expression::ArrayIndex { array, indexes } => match *array {
                Expression::Identifier(tok) => Ok(Assignable::ArrayIndex {
                    array: tok,
                    indexes,
                }),
                other => Err(ParserError::Structural {
                    msg: format!("-{}- cannot be assigned to", other),
                    line: other.line(),
                }),
            },
            other => Err(ParserError::Structural {
                msg: format!("-{}- cannot be assigned to", other),
                line: other.line(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PrimitiveType;
    use crate::lexer::tokenize;

    fn program(source: &str) -> Vec<Statement> {
        Parser::parse_program(tokenize(source).unwrap(), source)
            .unwrap()
            .statements
    }

    fn stmt(source: &str) -> StatementKind {
        Parser::parse_statement(tokenize(source).unwrap(), source)
            .unwrap()
            .kind
    }

    #[test]
    fn declare_multiple_names() {
        match stmt("DECLARE a, b, c : INTEGER") {
            StatementKind::VariableDecl { names, var_type } => {
                assert_eq!(names.len(), 3);
                assert_eq!(var_type, Type::Primitive(PrimitiveType::Integer));
            }
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn declare_two_dim_array() {
        match stmt("DECLARE grid : ARRAY[1:3, 1:4] OF REAL") {
            StatementKind::VariableDecl { var_type, .. } => match var_type {
                Type::Array { elem, ranges } => {
                    assert_eq!(elem, PrimitiveType::Real);
                    assert_eq!(ranges.len(), 2);
                }
                other => panic!("wrong type: {:?}", other),
            },
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn if_with_else() {
        match stmt("IF x > 0 THEN\n OUTPUT 1\nELSE\n OUTPUT 2\nENDIF") {
            StatementKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch.map(|b| b.len()), Some(1));
            }
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn case_arms_roll_back_to_next_label() {
        let source = "CASE OF x\n 1 : OUTPUT \"one\"\n 2 : OUTPUT \"two\"\n OUTPUT \"too\"\n OTHERWISE : OUTPUT \"other\"\nENDCASE";
        match stmt(source) {
            StatementKind::Case {
                cases, otherwise, ..
            } => {
                assert_eq!(cases.len(), 2);
                assert_eq!(cases[1].1.len(), 2);
                assert_eq!(otherwise.map(|b| b.len()), Some(1));
            }
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn for_loop_with_step() {
        match stmt("FOR i <- 1 TO 10 STEP 2\n OUTPUT i\nNEXT i") {
            StatementKind::For { variable, step, .. } => {
                assert_eq!(variable.name(), "i");
                assert!(step.is_some());
            }
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn for_loop_counter_must_repeat_after_next() {
        let source = "FOR i <- 1 TO 10\n OUTPUT i\nNEXT j";
        assert!(Parser::parse_statement(tokenize(source).unwrap(), source).is_err());
    }

    #[test]
    fn while_and_repeat_loops() {
        assert!(matches!(
            stmt("WHILE x < 3 DO\n x <- x + 1\nENDWHILE"),
            StatementKind::While { .. }
        ));
        assert!(matches!(
            stmt("REPEAT\n x <- x + 1\nUNTIL x = 3"),
            StatementKind::RepeatUntil { .. }
        ));
    }

    #[test]
    fn procedure_with_params_and_call() {
        let stmts = program(
            "PROCEDURE greet(who : STRING)\n OUTPUT \"hi \" & who\nENDPROCEDURE\nCALL greet(\"you\")",
        );
        match &stmts[0].kind {
            StatementKind::ProcedureDecl { params, body, .. } => {
                assert_eq!(params.len(), 1);
                assert_eq!(body.len(), 1);
            }
            other => panic!("wrong statement: {:?}", other),
        }
        match &stmts[1].kind {
            StatementKind::ProcedureCall { args, .. } => assert_eq!(args.len(), 1),
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn call_without_arguments() {
        match stmt("CALL tick") {
            StatementKind::ProcedureCall { args, .. } => assert!(args.is_empty()),
            other => panic!("wrong statement: {:?}", other),
        }
        match stmt("CALL tick()") {
            StatementKind::ProcedureCall { args, .. } => assert!(args.is_empty()),
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn function_declaration() {
        match stmt("FUNCTION double(n : INTEGER) RETURNS INTEGER\n RETURN n * 2\nENDFUNCTION") {
            StatementKind::FunctionDecl {
                params,
                return_type,
                body,
                ..
            } => {
                assert_eq!(params.len(), 1);
                assert_eq!(return_type, Type::Primitive(PrimitiveType::Integer));
                assert_eq!(body.len(), 1);
            }
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn file_statements_parse() {
        assert!(matches!(
            stmt("OPENFILE \"data.txt\" FOR READ"),
            StatementKind::FileOpen { write_mode: false, .. }
        ));
        assert!(matches!(
            stmt("WRITEFILE \"data.txt\", x + 1"),
            StatementKind::FileWrite { .. }
        ));
        assert!(matches!(
            stmt("READFILE \"data.txt\", x"),
            StatementKind::FileRead { .. }
        ));
        assert!(matches!(
            stmt("CLOSEFILE \"data.txt\""),
            StatementKind::FileClose { .. }
        ));
    }

    #[test]
    fn assignment_to_array_element() {
        match stmt("grid[2, 3] <- 7") {
            StatementKind::Assignment { target, .. } => match target {
                Assignable::ArrayIndex { indexes, .. } => assert_eq!(indexes.len(), 2),
                other => panic!("wrong target: {:?}", other),
            },
            other => panic!("wrong statement: {:?}", other),
        }
    }

    #[test]
    fn literal_is_not_assignable() {
        let source = "5 <- x";
        assert!(Parser::parse_statement(tokenize(source).unwrap(), source).is_err());
    }

    #[test]
    fn unterminated_block_is_rejected() {
        let source = "IF x THEN\n OUTPUT 1";
        assert!(Parser::parse_statement(tokenize(source).unwrap(), source).is_err());
    }
}
