mod expr;
mod interp_errors;
mod stmt;

use std::io::{self, BufRead, Write};

use rand::rngs::StdRng;
use rand::SeedableRng;

use frontend::ast::{Program, Statement, Type};
use tools::errors::{source_lines, CodeErr, ReportCodeErr};

pub use self::interp_errors::InterpreterError;

use crate::state::{ProgramState, Slot};
use crate::values::coerce;

/// Walks a parsed program against one ProgramState. Input and output go
/// through injected sinks so tests can drive them; the RNG behind RANDOM
/// is seedable the same way.
pub struct Interpreter<'a> {
    state: &'a mut ProgramState,
    source: Vec<String>,
    input: Box<dyn BufRead + 'a>,
    output: Box<dyn Write + 'a>,
    rng: StdRng,
}

impl<'a> Interpreter<'a> {
    pub fn new(state: &'a mut ProgramState, source: &str) -> Self {
        Self {
            state,
            source: source_lines(source),
            input: Box::new(io::BufReader::new(io::stdin())),
            output: Box::new(io::stdout()),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_io(
        state: &'a mut ProgramState,
        source: &str,
        input: impl BufRead + 'a,
        output: impl Write + 'a,
        seed: u64,
    ) -> Self {
        Self {
            state,
            source: source_lines(source),
            input: Box::new(input),
            output: Box::new(output),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn run(&mut self, program: &Program) -> Result<(), CodeErr> {
        for stmt in &program.statements {
            // A top level RETURN value has nowhere to go, it is dropped
            self.exec_stmt(stmt)
                .map_err(|e| e.to_glob_err(&self.source, e.line()))?;
        }

        Ok(())
    }

    // Shared call protocol for procedures and functions. The caller's
    // variables are snapshotted, parameters are bound positionally (extra
    // arguments or parameters are silently dropped), and on the way out
    // only names that existed before the call keep their new values.
    fn call_scoped(
        &mut self,
        params: &[(String, Type)],
        args: Vec<crate::values::Value>,
        body: &[Statement],
        line: u64,
    ) -> Result<Option<crate::values::Value>, InterpreterError> {
        let snapshot = self.state.variables.clone();

        for ((name, param_type), value) in params.iter().zip(args) {
            let slot = match param_type {
                Type::Primitive(p) => {
                    let coerced =
                        coerce(value, *p).map_err(|e| InterpreterError::Assignment {
                            target: name.clone(),
                            msg: e.to_string(),
                            line,
                        })?;
                    Slot::Scalar {
                        value: Some(coerced),
                        var_type: *p,
                    }
                }
                Type::Array { .. } => {
                    return Err(InterpreterError::InvalidNode {
                        msg: format!("parameter -{}- cannot take an array", name),
                        line,
                    })
                }
            };
            self.state.variables.insert(name.clone(), slot);
        }

        let result = self.exec_block(body);

        let after_call = std::mem::replace(&mut self.state.variables, snapshot);
        for (name, slot) in after_call {
            if self.state.variables.contains_key(&name) {
                self.state.variables.insert(name, slot);
            }
        }

        result
    }
}
