use colored::*;
use thiserror::Error;

use frontend::ast::{Operator, PrimitiveType};
pub use frontend::lexer::Value;

#[derive(Debug, Error, PartialEq)]
pub enum ValueError {
    #[error("{} operator -{0}- not defined for -{1}- and -{2}-.", "Error".red().bold())]
    UndefinedBinaryOp(Operator, PrimitiveType, PrimitiveType),

    #[error("{} operator -{0}- not defined for -{1}-.", "Error".red().bold())]
    UndefinedUnaryOp(Operator, PrimitiveType),

    #[error("{} a value of type -{0}- cannot be stored in a -{1}-.", "Error".red().bold())]
    WrongType(PrimitiveType, PrimitiveType),

    #[error("{} value -{0}- of type -{1}- cannot be stored in a -{2}-.", "Error".red().bold())]
    WrongValue(Value, PrimitiveType, PrimitiveType),

    #[error("{} a value of type -{0}- cannot be used as a condition.", "Error".red().bold())]
    NotACondition(PrimitiveType),

    #[error("{} array bound {0}..{1} is empty.", "Error".red().bold())]
    EmptyBound(i64, i64),

    #[error("{} expected {0} index(es), found {1}.", "Error".red().bold())]
    WrongIndexCount(usize, usize),

    #[error("{} index {0} outside of bound {1}..{2} in dimension {3}.", "Error".red().bold())]
    IndexOutOfBounds(i64, i64, i64, usize),
}

pub fn type_of(value: &Value) -> PrimitiveType {
    match value {
        Value::Integer(_) => PrimitiveType::Integer,
        Value::Real(_) => PrimitiveType::Real,
        Value::Char(_) => PrimitiveType::Char,
        Value::Str(_) => PrimitiveType::String,
        Value::Boolean(_) => PrimitiveType::Boolean,
    }
}

/// Condition test: booleans as-is, numbers count as true when non zero.
pub fn truthy(value: &Value) -> Result<bool, ValueError> {
    match value {
        Value::Boolean(b) => Ok(*b),
        Value::Integer(i) => Ok(*i != 0),
        Value::Real(r) => Ok(*r != 0.0),
        other => Err(ValueError::NotACondition(type_of(other))),
    }
}

/// Fits a value into a declared type, converting where the language allows
/// it. INTEGER slots take whole-valued reals, REAL slots take integers,
/// CHAR slots take one-character strings, BOOLEAN slots take 0 and 1.
pub fn coerce(value: Value, target: PrimitiveType) -> Result<Value, ValueError> {
    match (target, value) {
        (PrimitiveType::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
        (PrimitiveType::Integer, Value::Real(r)) => {
            // The upper comparison is strict: i64::MAX as f64 rounds up to
            // 2^63, one past the last INTEGER
            if r.fract() == 0.0 && r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64 {
                Ok(Value::Integer(r as i64))
            } else {
                Err(ValueError::WrongValue(
                    Value::Real(r),
                    PrimitiveType::Real,
                    PrimitiveType::Integer,
                ))
            }
        }
        (PrimitiveType::Real, Value::Integer(i)) => Ok(Value::Real(i as f64)),
        (PrimitiveType::Real, Value::Real(r)) => Ok(Value::Real(r)),
        (PrimitiveType::String, Value::Str(s)) => Ok(Value::Str(s)),
        (PrimitiveType::Char, Value::Char(c)) => Ok(Value::Char(c)),
        (PrimitiveType::Char, Value::Str(s)) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(ValueError::WrongValue(
                    Value::Str(s),
                    PrimitiveType::String,
                    PrimitiveType::Char,
                )),
            }
        }
        (PrimitiveType::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
        (PrimitiveType::Boolean, Value::Integer(0)) => Ok(Value::Boolean(false)),
        (PrimitiveType::Boolean, Value::Integer(1)) => Ok(Value::Boolean(true)),
        (PrimitiveType::Boolean, Value::Real(r)) if r == 0.0 => Ok(Value::Boolean(false)),
        (PrimitiveType::Boolean, Value::Real(r)) if r == 1.0 => Ok(Value::Boolean(true)),
        (target, value) => Err(ValueError::WrongType(type_of(&value), target)),
    }
}

pub fn apply_unary(operator: Operator, operand: Value) -> Result<Value, ValueError> {
    match operator {
        Operator::Sub => match operand {
            Value::Integer(i) => Ok(Value::Integer(-i)),
            Value::Real(r) => Ok(Value::Real(-r)),
            other => Err(ValueError::UndefinedUnaryOp(operator, type_of(&other))),
        },
        Operator::Not => Ok(Value::Boolean(!truthy(&operand)?)),
        _ => Err(ValueError::UndefinedUnaryOp(operator, type_of(&operand))),
    }
}

pub fn apply_binary(operator: Operator, left: Value, right: Value) -> Result<Value, ValueError> {
    match operator {
        Operator::Add => arithmetic(operator, left, right, |a, b| a + b, |a, b| a + b),
        Operator::Sub => arithmetic(operator, left, right, |a, b| a - b, |a, b| a - b),
        Operator::Mul => arithmetic(operator, left, right, |a, b| a * b, |a, b| a * b),
        // True division, the result is always REAL
        Operator::Div => match (as_real(&left), as_real(&right)) {
            (Some(a), Some(b)) => Ok(Value::Real(a / b)),
            _ => Err(undefined(operator, &left, &right)),
        },
        Operator::Concat => match (&left, &right) {
            (Value::Str(_) | Value::Char(_), Value::Str(_) | Value::Char(_)) => {
                Ok(Value::Str(format!("{}{}", left, right)))
            }
            _ => Err(undefined(operator, &left, &right)),
        },
        Operator::Equal => Ok(Value::Boolean(left == right)),
        Operator::NotEqual => Ok(Value::Boolean(left != right)),
        Operator::LessThan => ordering(operator, left, right, |o| o == std::cmp::Ordering::Less),
        Operator::LessEqual => {
            ordering(operator, left, right, |o| o != std::cmp::Ordering::Greater)
        }
        Operator::GreaterThan => {
            ordering(operator, left, right, |o| o == std::cmp::Ordering::Greater)
        }
        Operator::GreatEqual => {
            ordering(operator, left, right, |o| o != std::cmp::Ordering::Less)
        }
        Operator::And => Ok(Value::Boolean(truthy(&left)? && truthy(&right)?)),
        Operator::Or => Ok(Value::Boolean(truthy(&left)? || truthy(&right)?)),
        Operator::Not => Err(undefined(operator, &left, &right)),
    }
}

fn undefined(operator: Operator, left: &Value, right: &Value) -> ValueError {
    ValueError::UndefinedBinaryOp(operator, type_of(left), type_of(right))
}

fn as_real(value: &Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(r) => Some(*r),
        _ => None,
    }
}

// Integer op stays integer, anything with a REAL side widens
fn arithmetic(
    operator: Operator,
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> i64,
    real_op: fn(f64, f64) -> f64,
) -> Result<Value, ValueError> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(Value::Integer(int_op(*a, *b))),
        _ => match (as_real(&left), as_real(&right)) {
            (Some(a), Some(b)) => Ok(Value::Real(real_op(a, b))),
            _ => Err(undefined(operator, &left, &right)),
        },
    }
}

fn ordering(
    operator: Operator,
    left: Value,
    right: Value,
    accept: fn(std::cmp::Ordering) -> bool,
) -> Result<Value, ValueError> {
    let ord = match (&left, &right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        _ => match (as_real(&left), as_real(&right)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };

    match ord {
        Some(o) => Ok(Value::Boolean(accept(o))),
        None => Err(undefined(operator, &left, &right)),
    }
}

/// N dimensional array stored as one flat buffer in row major order.
/// Bounds are inclusive on both ends, so ARRAY[1:3] holds three cells.
/// Cells start out unassigned.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayVal {
    pub elem: PrimitiveType,
    pub bounds: Vec<(i64, i64)>,
    cells: Vec<Option<Value>>,
}

impl ArrayVal {
    pub fn new(elem: PrimitiveType, bounds: Vec<(i64, i64)>) -> Result<Self, ValueError> {
        let mut size: usize = 1;

        for (lo, hi) in &bounds {
            if hi < lo {
                return Err(ValueError::EmptyBound(*lo, *hi));
            }
            size *= (hi - lo + 1) as usize;
        }

        Ok(Self {
            elem,
            bounds,
            cells: vec![None; size],
        })
    }

    fn offset(&self, indexes: &[i64]) -> Result<usize, ValueError> {
        if indexes.len() != self.bounds.len() {
            return Err(ValueError::WrongIndexCount(self.bounds.len(), indexes.len()));
        }

        let mut offset = 0usize;

        for (dim, (index, (lo, hi))) in indexes.iter().zip(&self.bounds).enumerate() {
            if index < lo || index > hi {
                return Err(ValueError::IndexOutOfBounds(*index, *lo, *hi, dim + 1));
            }
            offset = offset * (hi - lo + 1) as usize + (index - lo) as usize;
        }

        Ok(offset)
    }

    pub fn get(&self, indexes: &[i64]) -> Result<Option<&Value>, ValueError> {
        let offset = self.offset(indexes)?;
        Ok(self.cells[offset].as_ref())
    }

    pub fn set(&mut self, indexes: &[i64], value: Value) -> Result<(), ValueError> {
        let offset = self.offset(indexes)?;
        self.cells[offset] = Some(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_slot_takes_whole_real() {
        assert_eq!(
            coerce(Value::Real(2.0), PrimitiveType::Integer),
            Ok(Value::Integer(2))
        );
        assert!(coerce(Value::Real(2.5), PrimitiveType::Integer).is_err());
    }

    #[test]
    fn integer_slot_rejects_out_of_range_reals() {
        assert!(coerce(Value::Real(1e20), PrimitiveType::Integer).is_err());
        assert!(coerce(Value::Real(-1e20), PrimitiveType::Integer).is_err());

        // A big whole double inside the range still converts exactly
        let edge = 9_007_199_254_740_992.0; // 2^53
        assert_eq!(
            coerce(Value::Real(edge), PrimitiveType::Integer),
            Ok(Value::Integer(9_007_199_254_740_992))
        );
    }

    #[test]
    fn char_slot_takes_single_char_string() {
        assert_eq!(
            coerce(Value::Str("x".into()), PrimitiveType::Char),
            Ok(Value::Char('x'))
        );
        assert!(coerce(Value::Str("xy".into()), PrimitiveType::Char).is_err());
    }

    #[test]
    fn boolean_slot_takes_zero_and_one() {
        assert_eq!(
            coerce(Value::Integer(1), PrimitiveType::Boolean),
            Ok(Value::Boolean(true))
        );
        assert!(coerce(Value::Integer(2), PrimitiveType::Boolean).is_err());
    }

    #[test]
    fn division_always_yields_real() {
        assert_eq!(
            apply_binary(Operator::Div, Value::Integer(7), Value::Integer(2)),
            Ok(Value::Real(3.5))
        );
        assert_eq!(
            apply_binary(Operator::Div, Value::Integer(4), Value::Integer(2)),
            Ok(Value::Real(2.0))
        );
    }

    #[test]
    fn mixed_arithmetic_widens_to_real() {
        assert_eq!(
            apply_binary(Operator::Add, Value::Integer(1), Value::Real(0.5)),
            Ok(Value::Real(1.5))
        );
        assert_eq!(
            apply_binary(Operator::Add, Value::Integer(1), Value::Integer(2)),
            Ok(Value::Integer(3))
        );
    }

    #[test]
    fn concat_joins_strings_and_chars() {
        assert_eq!(
            apply_binary(
                Operator::Concat,
                Value::Str("ab".into()),
                Value::Char('c')
            ),
            Ok(Value::Str("abc".into()))
        );
        assert!(apply_binary(Operator::Concat, Value::Str("ab".into()), Value::Integer(1)).is_err());
    }

    #[test]
    fn integer_and_real_compare_by_value() {
        assert_eq!(
            apply_binary(Operator::Equal, Value::Integer(1), Value::Real(1.0)),
            Ok(Value::Boolean(true))
        );
    }

    #[test]
    fn array_respects_inclusive_bounds() {
        let mut arr = ArrayVal::new(PrimitiveType::Integer, vec![(1, 5)]).unwrap();

        arr.set(&[1], Value::Integer(10)).unwrap();
        arr.set(&[5], Value::Integer(50)).unwrap();
        assert_eq!(arr.get(&[1]).unwrap(), Some(&Value::Integer(10)));
        assert_eq!(arr.get(&[5]).unwrap(), Some(&Value::Integer(50)));

        assert!(arr.set(&[0], Value::Integer(0)).is_err());
        assert!(arr.set(&[6], Value::Integer(0)).is_err());
    }

    #[test]
    fn array_cells_start_unassigned() {
        let arr = ArrayVal::new(PrimitiveType::Integer, vec![(1, 3)]).unwrap();
        assert_eq!(arr.get(&[2]).unwrap(), None);
    }

    #[test]
    fn two_dim_array_keeps_cells_apart() {
        let mut grid = ArrayVal::new(PrimitiveType::Integer, vec![(1, 3), (1, 4)]).unwrap();

        grid.set(&[1, 4], Value::Integer(14)).unwrap();
        grid.set(&[2, 1], Value::Integer(21)).unwrap();

        assert_eq!(grid.get(&[1, 4]).unwrap(), Some(&Value::Integer(14)));
        assert_eq!(grid.get(&[2, 1]).unwrap(), Some(&Value::Integer(21)));
        assert_eq!(grid.get(&[1, 1]).unwrap(), None);
    }

    #[test]
    fn wrong_index_count_is_rejected() {
        let grid = ArrayVal::new(PrimitiveType::Integer, vec![(1, 3), (1, 4)]).unwrap();
        assert!(grid.get(&[1]).is_err());
    }
}
