use colored::*;
use rand::{rngs::StdRng, Rng};
use thiserror::Error;

use crate::values::Value;

#[derive(Debug, Error, PartialEq)]
pub enum BuiltinError {
    #[error("{} function {0} takes {1} parameter(s), found {2}.", "Error".red().bold())]
    WrongArgCount(&'static str, usize, usize),

    #[error("{} invalid parameter to function {0}: {1}.", "Error".red().bold())]
    WrongArgType(&'static str, String),

    #[error(
        "{} attempt to access characters beyond the length in SUBSTRING (length: {0}, last character requested: {1}).",
        "Error".red().bold()
    )]
    SubstringRange(usize, i64),

    #[error("{} division by zero in function {0}.", "Error".red().bold())]
    DivisionByZero(&'static str),
}

/// The functions every program gets for free. They share the call syntax
/// with user functions and are looked up first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Substring,
    Random,
    Mod,
    Div,
    Round,
    Length,
    Lcase,
    Ucase,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        let builtin = match name {
            "SUBSTRING" => Builtin::Substring,
            "RANDOM" => Builtin::Random,
            "MOD" => Builtin::Mod,
            "DIV" => Builtin::Div,
            "ROUND" => Builtin::Round,
            "LENGTH" => Builtin::Length,
            "LCASE" => Builtin::Lcase,
            "UCASE" => Builtin::Ucase,
            _ => return None,
        };
        Some(builtin)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Substring => "SUBSTRING",
            Builtin::Random => "RANDOM",
            Builtin::Mod => "MOD",
            Builtin::Div => "DIV",
            Builtin::Round => "ROUND",
            Builtin::Length => "LENGTH",
            Builtin::Lcase => "LCASE",
            Builtin::Ucase => "UCASE",
        }
    }

    pub fn call(&self, args: &[Value], rng: &mut StdRng) -> Result<Value, BuiltinError> {
        match self {
            Builtin::Substring => {
                check_arg_count(self.name(), args, 3)?;
                substring(self.name(), args)
            }
            Builtin::Random => {
                check_arg_count(self.name(), args, 0)?;
                Ok(Value::Real(rng.gen::<f64>()))
            }
            Builtin::Mod => {
                check_arg_count(self.name(), args, 2)?;
                let (a, b) = int_pair(self.name(), args)?;
                if b == 0 {
                    return Err(BuiltinError::DivisionByZero(self.name()));
                }
                Ok(Value::Integer(a - floor_div(a, b) * b))
            }
            Builtin::Div => {
                check_arg_count(self.name(), args, 2)?;
                let (a, b) = int_pair(self.name(), args)?;
                if b == 0 {
                    return Err(BuiltinError::DivisionByZero(self.name()));
                }
                Ok(Value::Integer(floor_div(a, b)))
            }
            Builtin::Round => {
                check_arg_count(self.name(), args, 2)?;
                round(self.name(), args)
            }
            Builtin::Length => {
                check_arg_count(self.name(), args, 1)?;
                let s = string_arg(self.name(), &args[0])?;
                Ok(Value::Integer(s.chars().count() as i64))
            }
            Builtin::Lcase => {
                check_arg_count(self.name(), args, 1)?;
                let s = string_arg(self.name(), &args[0])?;
                Ok(Value::Str(s.to_lowercase()))
            }
            Builtin::Ucase => {
                check_arg_count(self.name(), args, 1)?;
                let s = string_arg(self.name(), &args[0])?;
                Ok(Value::Str(s.to_uppercase()))
            }
        }
    }
}

// --------
// Helpers
// --------

fn check_arg_count(name: &'static str, args: &[Value], expected: usize) -> Result<(), BuiltinError> {
    if args.len() != expected {
        return Err(BuiltinError::WrongArgCount(name, expected, args.len()));
    }
    Ok(())
}

fn string_arg<'a>(name: &'static str, arg: &'a Value) -> Result<&'a str, BuiltinError> {
    match arg {
        Value::Str(s) => Ok(s),
        other => Err(BuiltinError::WrongArgType(
            name,
            format!("expected a STRING, found -{}-", other),
        )),
    }
}

fn int_arg(name: &'static str, arg: &Value) -> Result<i64, BuiltinError> {
    match arg {
        Value::Integer(i) => Ok(*i),
        other => Err(BuiltinError::WrongArgType(
            name,
            format!("expected an INTEGER, found -{}-", other),
        )),
    }
}

fn int_pair(name: &'static str, args: &[Value]) -> Result<(i64, i64), BuiltinError> {
    Ok((int_arg(name, &args[0])?, int_arg(name, &args[1])?))
}

// Flooring division, like the usual exam-board reading of DIV: the
// quotient always rounds toward negative infinity
fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    let r = a % b;
    if r != 0 && (r < 0) != (b < 0) {
        q - 1
    } else {
        q
    }
}

// SUBSTRING(text, start, length), 1 based. Asking past the end of the
// text is an error, asking for zero or fewer characters yields ""
fn substring(name: &'static str, args: &[Value]) -> Result<Value, BuiltinError> {
    let s = string_arg(name, &args[0])?;
    let start = int_arg(name, &args[1])?;
    let length = int_arg(name, &args[2])?;

    if start < 1 {
        return Err(BuiltinError::WrongArgType(
            name,
            format!("start position must be at least 1, found {}", start),
        ));
    }

    let total = s.chars().count();
    let last = start + length - 1;
    if last > total as i64 {
        return Err(BuiltinError::SubstringRange(total, last));
    }

    let taken: String = s
        .chars()
        .skip(start as usize - 1)
        .take(length.max(0) as usize)
        .collect();

    Ok(Value::Str(taken))
}

fn round(name: &'static str, args: &[Value]) -> Result<Value, BuiltinError> {
    let number = match &args[0] {
        Value::Integer(i) => *i as f64,
        Value::Real(r) => *r,
        other => {
            return Err(BuiltinError::WrongArgType(
                name,
                format!("expected a number, found -{}-", other),
            ))
        }
    };
    let places = int_arg(name, &args[1])?;

    // Beyond 18 places a double has no precision left to round away, so
    // wider requests behave like the nearest representable request
    let factor = 10f64.powi(places.clamp(-18, 18) as i32);
    // Ties go to the even neighbour: ROUND(2.5, 0) is 2, ROUND(3.5, 0) is 4
    Ok(Value::Real((number * factor).round_ties_even() / factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn call(builtin: Builtin, args: &[Value]) -> Result<Value, BuiltinError> {
        builtin.call(args, &mut rng())
    }

    #[test]
    fn substring_is_one_based() {
        assert_eq!(
            call(
                Builtin::Substring,
                &[
                    Value::Str("HELLO".into()),
                    Value::Integer(2),
                    Value::Integer(3)
                ]
            ),
            Ok(Value::Str("ELL".into()))
        );
    }

    #[test]
    fn substring_rejects_reads_past_the_end() {
        assert_eq!(
            call(
                Builtin::Substring,
                &[
                    Value::Str("HI".into()),
                    Value::Integer(1),
                    Value::Integer(5)
                ]
            ),
            Err(BuiltinError::SubstringRange(2, 5))
        );
    }

    #[test]
    fn substring_of_zero_length_is_empty() {
        assert_eq!(
            call(
                Builtin::Substring,
                &[
                    Value::Str("HI".into()),
                    Value::Integer(1),
                    Value::Integer(0)
                ]
            ),
            Ok(Value::Str("".into()))
        );
    }

    #[test]
    fn mod_and_div_floor_on_negatives() {
        let args = [Value::Integer(-7), Value::Integer(2)];
        assert_eq!(call(Builtin::Div, &args), Ok(Value::Integer(-4)));
        assert_eq!(call(Builtin::Mod, &args), Ok(Value::Integer(1)));

        let args = [Value::Integer(7), Value::Integer(2)];
        assert_eq!(call(Builtin::Div, &args), Ok(Value::Integer(3)));
        assert_eq!(call(Builtin::Mod, &args), Ok(Value::Integer(1)));
    }

    #[test]
    fn mod_and_div_require_integers() {
        let args = [Value::Real(7.0), Value::Integer(2)];
        assert!(call(Builtin::Div, &args).is_err());
        assert!(call(Builtin::Mod, &args).is_err());
    }

    #[test]
    fn division_by_zero_is_reported() {
        let args = [Value::Integer(7), Value::Integer(0)];
        assert_eq!(
            call(Builtin::Div, &args),
            Err(BuiltinError::DivisionByZero("DIV"))
        );
    }

    #[test]
    fn round_to_decimal_places() {
        assert_eq!(
            call(Builtin::Round, &[Value::Real(3.14159), Value::Integer(2)]),
            Ok(Value::Real(3.14))
        );
        assert_eq!(
            call(Builtin::Round, &[Value::Integer(3), Value::Integer(0)]),
            Ok(Value::Real(3.0))
        );
    }

    #[test]
    fn round_breaks_ties_toward_even() {
        assert_eq!(
            call(Builtin::Round, &[Value::Real(2.5), Value::Integer(0)]),
            Ok(Value::Real(2.0))
        );
        assert_eq!(
            call(Builtin::Round, &[Value::Real(3.5), Value::Integer(0)]),
            Ok(Value::Real(4.0))
        );
        assert_eq!(
            call(Builtin::Round, &[Value::Real(-2.5), Value::Integer(0)]),
            Ok(Value::Real(-2.0))
        );
    }

    #[test]
    fn round_survives_extreme_place_counts() {
        assert_eq!(
            call(Builtin::Round, &[Value::Real(2.0), Value::Integer(i64::MAX)]),
            Ok(Value::Real(2.0))
        );
        assert_eq!(
            call(Builtin::Round, &[Value::Real(2.0), Value::Integer(i64::MIN)]),
            Ok(Value::Real(0.0))
        );
    }

    #[test]
    fn case_changes() {
        assert_eq!(
            call(Builtin::Ucase, &[Value::Str("hey".into())]),
            Ok(Value::Str("HEY".into()))
        );
        assert_eq!(
            call(Builtin::Lcase, &[Value::Str("HEY".into())]),
            Ok(Value::Str("hey".into()))
        );
    }

    #[test]
    fn length_counts_characters() {
        assert_eq!(
            call(Builtin::Length, &[Value::Str("hello".into())]),
            Ok(Value::Integer(5))
        );
        assert!(call(Builtin::Length, &[Value::Integer(5)]).is_err());
    }

    #[test]
    fn random_is_deterministic_under_a_seed() {
        let mut a = rng();
        let mut b = rng();
        assert_eq!(
            Builtin::Random.call(&[], &mut a),
            Builtin::Random.call(&[], &mut b)
        );

        match Builtin::Random.call(&[], &mut a) {
            Ok(Value::Real(r)) => assert!((0.0..1.0).contains(&r)),
            other => panic!("wrong value: {:?}", other),
        }
    }
}
