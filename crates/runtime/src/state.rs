use std::collections::HashMap;
use std::rc::Rc;

use colored::*;
use thiserror::Error;

use frontend::ast::{PrimitiveType, Statement, Type};

use crate::values::{ArrayVal, Value};

#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("{} -{0}- is already declared as a constant.", "Error".red().bold())]
    NameIsConstant(String),

    #[error("{} -{0}- is already declared as a variable.", "Error".red().bold())]
    NameIsVariable(String),

    #[error("{} -{0}- is already declared as a procedure.", "Error".red().bold())]
    NameIsProcedure(String),

    #[error("{} -{0}- is already declared as a function.", "Error".red().bold())]
    NameIsFunction(String),
}

/// One slot in the variables map. Scalars remember their declared type and
/// start out without a value, arrays carry their own element type.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Scalar {
        value: Option<Value>,
        var_type: PrimitiveType,
    },
    Array(ArrayVal),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureDef {
    pub params: Vec<(String, Type)>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
    pub body: Vec<Statement>,
}

/// The whole mutable world of a running program. One instance is threaded
/// through the interpreter, the CLI keeps it alive across REPL lines.
#[derive(Debug, Default)]
pub struct ProgramState {
    pub variables: HashMap<String, Slot>,
    pub constants: HashMap<String, Value>,
    pub procedures: HashMap<String, Rc<ProcedureDef>>,
    pub functions: HashMap<String, Rc<FunctionDef>>,
}

impl ProgramState {
    pub fn new() -> Self {
        Self::default()
    }

    // The four namespaces share one naming pool: a name used in one of
    // them cannot be declared in another
    fn check_free(&self, name: &str, skip_variables: bool) -> Result<(), StateError> {
        if !skip_variables && self.variables.contains_key(name) {
            return Err(StateError::NameIsVariable(name.to_string()));
        }
        if self.constants.contains_key(name) {
            return Err(StateError::NameIsConstant(name.to_string()));
        }
        if self.procedures.contains_key(name) {
            return Err(StateError::NameIsProcedure(name.to_string()));
        }
        if self.functions.contains_key(name) {
            return Err(StateError::NameIsFunction(name.to_string()));
        }
        Ok(())
    }

    /// Re-declaring a variable is allowed and resets it, clashing with
    /// another namespace is not.
    pub fn declare_variable(&mut self, name: &str, slot: Slot) -> Result<(), StateError> {
        self.check_free(name, true)?;
        self.variables.insert(name.to_string(), slot);
        Ok(())
    }

    pub fn declare_constant(&mut self, name: &str, value: Value) -> Result<(), StateError> {
        if self.variables.contains_key(name) {
            return Err(StateError::NameIsVariable(name.to_string()));
        }
        if self.procedures.contains_key(name) {
            return Err(StateError::NameIsProcedure(name.to_string()));
        }
        if self.functions.contains_key(name) {
            return Err(StateError::NameIsFunction(name.to_string()));
        }
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    pub fn declare_procedure(&mut self, name: &str, def: ProcedureDef) -> Result<(), StateError> {
        self.check_free(name, false)?;
        self.procedures.insert(name.to_string(), Rc::new(def));
        Ok(())
    }

    pub fn declare_function(&mut self, name: &str, def: FunctionDef) -> Result<(), StateError> {
        self.check_free(name, false)?;
        self.functions.insert(name.to_string(), Rc::new(def));
        Ok(())
    }
}
