use std::io::{BufRead, Write};
use std::rc::Rc;

use super::{Interpreter, InterpreterError};
use crate::state::{FunctionDef, ProcedureDef, Slot};
use crate::values::{coerce, truthy, ArrayVal, Value};
use frontend::ast::{
    Assignable, Expression, PrimitiveType, Statement, StatementKind, Type,
};
use frontend::lexer::Token;

impl Interpreter<'_> {
    // Runs a statement list; the first RETURN value encountered bubbles up
    pub(super) fn exec_block(
        &mut self,
        stmts: &[Statement],
    ) -> Result<Option<Value>, InterpreterError> {
        for stmt in stmts {
            if let Some(value) = self.exec_stmt(stmt)? {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }

    pub(super) fn exec_stmt(
        &mut self,
        stmt: &Statement,
    ) -> Result<Option<Value>, InterpreterError> {
        let line = stmt.line;

        match &stmt.kind {
            StatementKind::ProcedureDecl { name, params, body } => {
                let proc_name = identifier(name);
                let def = ProcedureDef {
                    params: named_params(params),
                    body: body.clone(),
                };

                self.state
                    .declare_procedure(&proc_name, def)
                    .map_err(|e| InterpreterError::Declaration {
                        name: proc_name.clone(),
                        msg: e.to_string(),
                        line,
                    })?;

                Ok(None)
            }
            StatementKind::FunctionDecl {
                name,
                params,
                return_type,
                body,
            } => {
                let fn_name = identifier(name);
                let def = FunctionDef {
                    params: named_params(params),
                    return_type: return_type.clone(),
                    body: body.clone(),
                };

                self.state
                    .declare_function(&fn_name, def)
                    .map_err(|e| InterpreterError::Declaration {
                        name: fn_name.clone(),
                        msg: e.to_string(),
                        line,
                    })?;

                Ok(None)
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(condition)? {
                    self.exec_block(then_branch)
                } else {
                    match else_branch {
                        Some(branch) => self.exec_block(branch),
                        None => Ok(None),
                    }
                }
            }
            StatementKind::Case {
                scrutinee,
                cases,
                otherwise,
            } => {
                let value = self.eval_expr(scrutinee)?;

                for (label, body) in cases {
                    if label.literal_value() == Some(&value) {
                        return self.exec_block(body);
                    }
                }

                match otherwise {
                    Some(body) => self.exec_block(body),
                    None => Ok(None),
                }
            }
            StatementKind::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                let name = match variable {
                    Assignable::Identifier(tok) => identifier(tok),
                    Assignable::ArrayIndex { .. } => {
                        return Err(InterpreterError::InvalidNode {
                            msg: "a FOR counter must be a plain variable".into(),
                            line,
                        })
                    }
                };

                // The counter obeys the same namespace rules as a plain
                // assignment target
                if self.state.constants.contains_key(&name) {
                    return Err(InterpreterError::Assignment {
                        target: name,
                        msg: "is a constant".into(),
                        line,
                    });
                }
                if self.state.procedures.contains_key(&name)
                    || self.state.functions.contains_key(&name)
                {
                    return Err(InterpreterError::Assignment {
                        target: name,
                        msg: "is already a callable name".into(),
                        line,
                    });
                }

                let mut current = self.int_operand(start, "FOR start")?;
                let end_value = self.int_operand(end, "FOR end")?;
                let step_value = match step {
                    Some(expr) => self.int_operand(expr, "FOR step")?,
                    None => 1,
                };

                if step_value == 0 {
                    return Err(InterpreterError::Operation {
                        expr: "FOR step".into(),
                        msg: "a step of 0 never reaches the end value".into(),
                        line,
                    });
                }

                loop {
                    if step_value > 0 && current > end_value {
                        break;
                    }
                    if step_value < 0 && current < end_value {
                        break;
                    }

                    // The counter is an ordinary INTEGER variable, the
                    // body and later code see it
                    self.state.variables.insert(
                        name.clone(),
                        Slot::Scalar {
                            value: Some(Value::Integer(current)),
                            var_type: PrimitiveType::Integer,
                        },
                    );

                    if let Some(value) = self.exec_block(body)? {
                        return Ok(Some(value));
                    }

                    current += step_value;
                }

                Ok(None)
            }
            StatementKind::RepeatUntil { body, condition } => {
                loop {
                    if let Some(value) = self.exec_block(body)? {
                        return Ok(Some(value));
                    }
                    if self.condition(condition)? {
                        break;
                    }
                }

                Ok(None)
            }
            StatementKind::While { condition, body } => {
                // A constant TRUE can never finish, refuse it up front
                if let Expression::Literal(tok) = condition {
                    if tok.literal_value() == Some(&Value::Boolean(true)) {
                        return Err(InterpreterError::InfiniteLoop { line });
                    }
                }

                while self.condition(condition)? {
                    if let Some(value) = self.exec_block(body)? {
                        return Ok(Some(value));
                    }
                }

                Ok(None)
            }
            StatementKind::VariableDecl { names, var_type } => {
                let first = identifier(&names[0]);
                let slot = self.build_slot(var_type, &first, line)?;

                for name_tok in names {
                    let name = identifier(name_tok);
                    self.state
                        .declare_variable(&name, slot.clone())
                        .map_err(|e| InterpreterError::Declaration {
                            name: name.clone(),
                            msg: e.to_string(),
                            line,
                        })?;
                }

                Ok(None)
            }
            StatementKind::ConstantDecl { name, value } => {
                let const_name = identifier(name);
                let literal = match value.literal_value() {
                    Some(v) => v.clone(),
                    None => {
                        return Err(InterpreterError::InvalidNode {
                            msg: format!("-{}- is not a literal", value),
                            line,
                        })
                    }
                };

                self.state
                    .declare_constant(&const_name, literal)
                    .map_err(|e| InterpreterError::Declaration {
                        name: const_name.clone(),
                        msg: e.to_string(),
                        line,
                    })?;

                Ok(None)
            }
            StatementKind::Input { target } => {
                let expected = self.input_target_type(target, line)?;
                let text = self.read_line(target, line)?;
                let value = convert_input(&text, expected).map_err(|msg| {
                    InterpreterError::Input {
                        target: target.name().to_string(),
                        msg,
                        line,
                    }
                })?;

                self.assign_to(target, value, line)?;
                Ok(None)
            }
            StatementKind::Output { values } => {
                let mut text = String::new();
                for value in values {
                    text.push_str(&self.eval_expr(value)?.to_string());
                }

                writeln!(self.output, "{}", text).map_err(|e| InterpreterError::Operation {
                    expr: "OUTPUT".into(),
                    msg: e.to_string(),
                    line,
                })?;
                Ok(None)
            }
            StatementKind::Return { value } => Ok(Some(self.eval_expr(value)?)),
            // File statements are recognized but files are not modelled
            StatementKind::FileOpen { .. }
            | StatementKind::FileRead { .. }
            | StatementKind::FileWrite { .. }
            | StatementKind::FileClose { .. } => Ok(None),
            StatementKind::ProcedureCall { name, args } => {
                let proc_name = identifier(name);
                let def = match self.state.procedures.get(&proc_name) {
                    Some(def) => Rc::clone(def),
                    None => {
                        return Err(InterpreterError::Undefined {
                            name: proc_name,
                            msg: "is not a procedure".into(),
                            line,
                        })
                    }
                };

                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg)?);
                }

                // A RETURN inside a procedure just ends it early
                self.call_scoped(&def.params, values, &def.body, line)?;
                Ok(None)
            }
            StatementKind::Assignment { target, value } => {
                let value = self.eval_expr(value)?;
                self.assign_to(target, value, line)?;
                Ok(None)
            }
        }
    }

    pub(super) fn assign_to(
        &mut self,
        target: &Assignable,
        value: Value,
        line: u64,
    ) -> Result<(), InterpreterError> {
        let name = target.name().to_string();

        if self.state.constants.contains_key(&name) {
            return Err(InterpreterError::Assignment {
                target: name,
                msg: "is a constant".into(),
                line,
            });
        }

        match target {
            Assignable::Identifier(_) => match self.state.variables.get_mut(&name) {
                Some(Slot::Scalar {
                    value: slot,
                    var_type,
                }) => {
                    let coerced = coerce(value, *var_type).map_err(|e| {
                        InterpreterError::Assignment {
                            target: name.clone(),
                            msg: e.to_string(),
                            line,
                        }
                    })?;
                    *slot = Some(coerced);
                    Ok(())
                }
                Some(Slot::Array(_)) => Err(InterpreterError::Assignment {
                    target: name,
                    msg: "is an array, assign to an element".into(),
                    line,
                }),
                None => Err(InterpreterError::Assignment {
                    target: name,
                    msg: "is not declared".into(),
                    line,
                }),
            },
            Assignable::ArrayIndex { indexes, .. } => {
                let idxs = self.eval_indexes(indexes, &name)?;

                match self.state.variables.get_mut(&name) {
                    Some(Slot::Array(arr)) => {
                        let coerced = coerce(value, arr.elem).map_err(|e| {
                            InterpreterError::Assignment {
                                target: name.clone(),
                                msg: e.to_string(),
                                line,
                            }
                        })?;
                        arr.set(&idxs, coerced)
                            .map_err(|e| InterpreterError::Index {
                                name: name.clone(),
                                msg: e.to_string(),
                                line,
                            })
                    }
                    Some(Slot::Scalar { .. }) => Err(InterpreterError::Index {
                        name,
                        msg: "is not an array".into(),
                        line,
                    }),
                    None => Err(InterpreterError::Assignment {
                        target: name,
                        msg: "is not declared".into(),
                        line,
                    }),
                }
            }
        }
    }

    fn condition(&mut self, expr: &Expression) -> Result<bool, InterpreterError> {
        let value = self.eval_expr(expr)?;
        truthy(&value).map_err(|e| InterpreterError::Operation {
            expr: expr.to_string(),
            msg: e.to_string(),
            line: expr.line(),
        })
    }

    fn int_operand(&mut self, expr: &Expression, what: &str) -> Result<i64, InterpreterError> {
        let value = self.eval_expr(expr)?;
        match coerce(value, PrimitiveType::Integer) {
            Ok(Value::Integer(i)) => Ok(i),
            _ => Err(InterpreterError::Operation {
                expr: expr.to_string(),
                msg: format!("{} must be an INTEGER", what),
                line: expr.line(),
            }),
        }
    }

    // Bounds evaluate once per declaration, every declared name gets its
    // own copy of the slot
    fn build_slot(
        &mut self,
        var_type: &Type,
        name: &str,
        line: u64,
    ) -> Result<Slot, InterpreterError> {
        match var_type {
            Type::Primitive(p) => Ok(Slot::Scalar {
                value: None,
                var_type: *p,
            }),
            Type::Array { elem, ranges } => {
                let mut bounds = Vec::with_capacity(ranges.len());
                for (lo, hi) in ranges {
                    bounds.push((
                        self.int_operand(lo, "array bound")?,
                        self.int_operand(hi, "array bound")?,
                    ));
                }

                let arr = ArrayVal::new(*elem, bounds).map_err(|e| {
                    InterpreterError::Declaration {
                        name: name.to_string(),
                        msg: e.to_string(),
                        line,
                    }
                })?;

                Ok(Slot::Array(arr))
            }
        }
    }

    // INPUT resolves the declared type first, then reads one line. The
    // text typed is not echoed back to the output sink.
    fn input_target_type(
        &self,
        target: &Assignable,
        line: u64,
    ) -> Result<PrimitiveType, InterpreterError> {
        let name = target.name();

        if self.state.constants.contains_key(name) {
            return Err(InterpreterError::Assignment {
                target: name.to_string(),
                msg: "is a constant".into(),
                line,
            });
        }

        match (self.state.variables.get(name), target) {
            (Some(Slot::Scalar { var_type, .. }), Assignable::Identifier(_)) => Ok(*var_type),
            (Some(Slot::Array(arr)), Assignable::ArrayIndex { .. }) => Ok(arr.elem),
            (Some(Slot::Array(_)), Assignable::Identifier(_)) => Err(InterpreterError::Input {
                target: name.to_string(),
                msg: "cannot read a whole array".into(),
                line,
            }),
            (Some(Slot::Scalar { .. }), Assignable::ArrayIndex { .. }) => {
                Err(InterpreterError::Index {
                    name: name.to_string(),
                    msg: "is not an array".into(),
                    line,
                })
            }
            (None, _) => Err(InterpreterError::Undefined {
                name: name.to_string(),
                msg: "is not declared".into(),
                line,
            }),
        }
    }

    fn read_line(&mut self, target: &Assignable, line: u64) -> Result<String, InterpreterError> {
        let mut buffer = String::new();
        let read = self
            .input
            .read_line(&mut buffer)
            .map_err(|e| InterpreterError::Input {
                target: target.name().to_string(),
                msg: e.to_string(),
                line,
            })?;

        if read == 0 {
            return Err(InterpreterError::Input {
                target: target.name().to_string(),
                msg: "unexpected end of input".into(),
                line,
            });
        }

        while buffer.ends_with('\n') || buffer.ends_with('\r') {
            buffer.pop();
        }

        Ok(buffer)
    }
}

fn identifier(tok: &Token) -> String {
    tok.identifier_name().unwrap_or("").to_string()
}

fn named_params(params: &[(Token, Type)]) -> Vec<(String, Type)> {
    params
        .iter()
        .map(|(tok, ty)| (identifier(tok), ty.clone()))
        .collect()
}

fn convert_input(text: &str, expected: PrimitiveType) -> Result<Value, String> {
    match expected {
        PrimitiveType::String => Ok(Value::Str(text.to_string())),
        PrimitiveType::Char => match text.chars().next() {
            Some(c) => Ok(Value::Char(c)),
            None => Err("expected a character, got an empty line".into()),
        },
        PrimitiveType::Integer => {
            let number: f64 = text
                .trim()
                .parse()
                .map_err(|_| format!("-{}- is not an INTEGER", text))?;
            // coerce owns the whole-valued and in-range rules
            coerce(Value::Real(number), PrimitiveType::Integer)
                .map_err(|_| format!("-{}- is not an INTEGER", text))
        }
        PrimitiveType::Real => text
            .trim()
            .parse()
            .map(Value::Real)
            .map_err(|_| format!("-{}- is not a REAL", text)),
        PrimitiveType::Boolean => match text.trim() {
            t if t.eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
            t if t.eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
            _ => Err(format!("-{}- is not TRUE or FALSE", text)),
        },
    }
}
