use std::rc::Rc;

use super::{Interpreter, InterpreterError};
use crate::builtins::Builtin;
use crate::state::Slot;
use crate::values::{apply_binary, apply_unary, coerce, Value};
use frontend::ast::{Expression, PrimitiveType, Type};
use frontend::lexer::Token;

impl Interpreter<'_> {
    pub(super) fn eval_expr(&mut self, expr: &Expression) -> Result<Value, InterpreterError> {
        match expr {
            Expression::Literal(tok) => match tok.literal_value() {
                Some(v) => Ok(v.clone()),
                None => Err(InterpreterError::InvalidNode {
                    msg: format!("-{}- is not a literal", tok),
                    line: tok.line,
                }),
            },
            Expression::Identifier(tok) => self.eval_identifier(tok),
            Expression::UnaryOp { operator, operand } => {
                let value = self.eval_expr(operand)?;
                apply_unary(*operator, value).map_err(|e| InterpreterError::Operation {
                    expr: expr.to_string(),
                    msg: e.to_string(),
                    line: expr.line(),
                })
            }
            Expression::BinaryOp {
                operator,
                left,
                right,
            } => {
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                apply_binary(*operator, l, r).map_err(|e| InterpreterError::Operation {
                    expr: format!("{} {} {}", left, operator, right),
                    msg: e.to_string(),
                    line: expr.line(),
                })
            }
            Expression::ArrayIndex { array, indexes } => self.eval_array_index(array, indexes),
            Expression::FunctionCall { function, args } => self.eval_call(function, args),
        }
    }

    fn eval_identifier(&mut self, tok: &Token) -> Result<Value, InterpreterError> {
        let name = tok.identifier_name().unwrap_or("");

        match self.state.variables.get(name) {
            Some(Slot::Scalar { value: Some(v), .. }) => Ok(v.clone()),
            Some(Slot::Scalar { value: None, .. }) => Err(InterpreterError::Undefined {
                name: name.to_string(),
                msg: "has no value yet".into(),
                line: tok.line,
            }),
            Some(Slot::Array(_)) => Err(InterpreterError::Operation {
                expr: name.to_string(),
                msg: "an array cannot be used as a scalar value".into(),
                line: tok.line,
            }),
            None => match self.state.constants.get(name) {
                Some(v) => Ok(v.clone()),
                None => Err(InterpreterError::Undefined {
                    name: name.to_string(),
                    msg: "is not declared".into(),
                    line: tok.line,
                }),
            },
        }
    }

    // Indexes evaluate first, then the cell is read. Reading a cell that
    // was never written is the same mistake as reading an unset variable.
    fn eval_array_index(
        &mut self,
        array: &Expression,
        indexes: &[Expression],
    ) -> Result<Value, InterpreterError> {
        let line = array.line();
        let tok = match array {
            Expression::Identifier(tok) => tok,
            other => {
                return Err(InterpreterError::InvalidNode {
                    msg: format!("-{}- cannot be indexed", other),
                    line,
                })
            }
        };
        let name = tok.identifier_name().unwrap_or("").to_string();
        let idxs = self.eval_indexes(indexes, &name)?;

        match self.state.variables.get(&name) {
            Some(Slot::Array(arr)) => match arr.get(&idxs) {
                Ok(Some(v)) => Ok(v.clone()),
                Ok(None) => Err(InterpreterError::Undefined {
                    name: format!("{}[{}]", name, join_indexes(&idxs)),
                    msg: "has no value yet".into(),
                    line,
                }),
                Err(e) => Err(InterpreterError::Index {
                    name,
                    msg: e.to_string(),
                    line,
                }),
            },
            Some(Slot::Scalar { .. }) => Err(InterpreterError::Index {
                name,
                msg: "is not an array".into(),
                line,
            }),
            None => Err(InterpreterError::Undefined {
                name,
                msg: "is not declared".into(),
                line,
            }),
        }
    }

    pub(super) fn eval_indexes(
        &mut self,
        indexes: &[Expression],
        name: &str,
    ) -> Result<Vec<i64>, InterpreterError> {
        let mut out = Vec::with_capacity(indexes.len());

        for index in indexes {
            let value = self.eval_expr(index)?;
            match coerce(value, PrimitiveType::Integer) {
                Ok(Value::Integer(i)) => out.push(i),
                _ => {
                    return Err(InterpreterError::Index {
                        name: name.to_string(),
                        msg: format!("index -{}- is not an INTEGER", index),
                        line: index.line(),
                    })
                }
            }
        }

        Ok(out)
    }

    // Built-ins shadow user functions on purpose
    fn eval_call(
        &mut self,
        function: &Expression,
        args: &[Expression],
    ) -> Result<Value, InterpreterError> {
        let line = function.line();
        let tok = match function {
            Expression::Identifier(tok) => tok,
            other => {
                return Err(InterpreterError::InvalidNode {
                    msg: format!("-{}- is not callable", other),
                    line,
                })
            }
        };
        let name = tok.identifier_name().unwrap_or("").to_string();

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }

        if let Some(builtin) = Builtin::lookup(&name) {
            return builtin
                .call(&values, &mut self.rng)
                .map_err(|e| InterpreterError::Builtin {
                    msg: e.to_string(),
                    line,
                });
        }

        let def = match self.state.functions.get(&name) {
            Some(def) => Rc::clone(def),
            None => {
                return Err(InterpreterError::Undefined {
                    name,
                    msg: "is not a function".into(),
                    line,
                })
            }
        };

        match self.call_scoped(&def.params, values, &def.body, line)? {
            Some(value) => match &def.return_type {
                // The returned value must fit the declared type
                Type::Primitive(p) => {
                    coerce(value, *p).map_err(|e| InterpreterError::Operation {
                        expr: name.clone(),
                        msg: e.to_string(),
                        line,
                    })
                }
                Type::Array { .. } => Err(InterpreterError::InvalidNode {
                    msg: format!("function -{}- cannot return an array", name),
                    line,
                }),
            },
            None => Err(InterpreterError::MissingReturn { name, line }),
        }
    }
}

pub(super) fn join_indexes(indexes: &[i64]) -> String {
    indexes
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
