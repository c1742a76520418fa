use colored::*;
use thiserror::Error;

use tools::errors::ReportCodeErr;

#[derive(Error, Debug, PartialEq)]
pub enum ParserError {
    #[error("{} while parsing, expected token -{expected}-, found -{found}-.", "Error".red().bold())]
    UnexpectedToken {
        expected: String,
        found: String,
        line: u64,
    },

    #[error("{} while parsing, expected {expected}, found -{found}-.", "Error".red().bold())]
    UnexpectedTokenType {
        expected: &'static str,
        found: String,
        line: u64,
    },

    #[error("{} while parsing, {msg}.", "Error".red().bold())]
    Structural { msg: String, line: u64 },
}

impl ParserError {
    pub fn line(&self) -> u64 {
        match self {
            ParserError::UnexpectedToken { line, .. }
            | ParserError::UnexpectedTokenType { line, .. }
            | ParserError::Structural { line, .. } => *line,
        }
    }
}

// Implement global trait for final error
impl ReportCodeErr for ParserError {}
