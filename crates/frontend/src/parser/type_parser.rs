use super::{Parser, ParserError};
use crate::ast::{Expression, PrimitiveType, Type};
use crate::lexer::{Keyword, Symbol, TokenKind};

fn primitive_of(kw: Keyword) -> Option<PrimitiveType> {
    match kw {
        Keyword::Integer => Some(PrimitiveType::Integer),
        Keyword::Real => Some(PrimitiveType::Real),
        Keyword::Char => Some(PrimitiveType::Char),
        Keyword::String => Some(PrimitiveType::String),
        Keyword::Boolean => Some(PrimitiveType::Boolean),
        _ => None,
    }
}

impl Parser {
    pub(super) fn parse_type(&mut self) -> Result<Type, ParserError> {
        match self.at().kind {
            TokenKind::Keyword(Keyword::Array) => self.array_type(),
            TokenKind::Keyword(kw) => match primitive_of(kw) {
                Some(p) => {
                    self.advance();
                    Ok(Type::Primitive(p))
                }
                None => Err(self.unexpected_type("a type name")),
            },
            _ => Err(self.unexpected_type("a type name")),
        }
    }

    // ARRAY[lo:hi, ...] OF <primitive>
    fn array_type(&mut self) -> Result<Type, ParserError> {
        self.consume_keyword(Keyword::Array)?;
        self.consume_symbol(Symbol::LBracket)?;
        let ranges = self.match_multiple(Self::array_range)?;
        self.consume_symbol(Symbol::RBracket)?;
        self.consume_keyword(Keyword::Of)?;

        let elem = match self.at().kind {
            TokenKind::Keyword(kw) => match primitive_of(kw) {
                Some(p) => {
                    self.advance();
                    p
                }
                None => return Err(self.unexpected_type("a primitive element type")),
            },
            _ => return Err(self.unexpected_type("a primitive element type")),
        };

        Ok(Type::Array { elem, ranges })
    }

    fn array_range(&mut self) -> Result<(Expression, Expression), ParserError> {
        let lo = self.expression()?;
        self.consume_symbol(Symbol::Colon)?;
        let hi = self.expression()?;

        Ok((lo, hi))
    }
}
