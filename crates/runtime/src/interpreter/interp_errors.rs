use colored::*;
use thiserror::Error;

use tools::errors::ReportCodeErr;

#[derive(Error, Debug, PartialEq)]
pub enum InterpreterError {
    // A shape the parser can build but the evaluator cannot run, like a
    // FOR counter that is an array element
    #[error("{} invalid construct reached at runtime: {msg}", "Error".red().bold())]
    InvalidNode { msg: String, line: u64 },

    #[error("{} while evaluating -{expr}-: {msg}", "Error".red().bold())]
    Operation { expr: String, msg: String, line: u64 },

    #[error("{} in call to built-in function: {msg}", "Error".red().bold())]
    Builtin { msg: String, line: u64 },

    #[error("{} while reading input for -{target}-: {msg}", "Error".red().bold())]
    Input {
        target: String,
        msg: String,
        line: u64,
    },

    #[error("{} -{name}- {msg}", "Error".red().bold())]
    Undefined { name: String, msg: String, line: u64 },

    #[error("{} while assigning to -{target}-: {msg}", "Error".red().bold())]
    Assignment {
        target: String,
        msg: String,
        line: u64,
    },

    #[error("{} while indexing -{name}-: {msg}", "Error".red().bold())]
    Index { name: String, msg: String, line: u64 },

    #[error("{} while declaring -{name}-: {msg}", "Error".red().bold())]
    Declaration { name: String, msg: String, line: u64 },

    #[error("{} WHILE TRUE never terminates, use REPEAT ... UNTIL or a real condition.", "Error".red().bold())]
    InfiniteLoop { line: u64 },

    #[error("{} function -{name}- finished without reaching a RETURN.", "Error".red().bold())]
    MissingReturn { name: String, line: u64 },
}

impl InterpreterError {
    pub fn line(&self) -> u64 {
        match self {
            InterpreterError::InvalidNode { line, .. }
            | InterpreterError::Operation { line, .. }
            | InterpreterError::Builtin { line, .. }
            | InterpreterError::Input { line, .. }
            | InterpreterError::Undefined { line, .. }
            | InterpreterError::Assignment { line, .. }
            | InterpreterError::Index { line, .. }
            | InterpreterError::Declaration { line, .. }
            | InterpreterError::InfiniteLoop { line }
            | InterpreterError::MissingReturn { line, .. } => *line,
        }
    }
}

// Implement global trait for final error
impl ReportCodeErr for InterpreterError {}
