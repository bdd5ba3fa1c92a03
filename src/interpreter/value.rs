use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::BinaryOperator;

use super::error::{EvalError, EvalResult};
use super::number::Number;

/// Longest string, in bytes, that `str * int` may build.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

pub type InstanceRef = Rc<RefCell<Instance>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub class_name: String,
    pub attributes: HashMap<String, Value>,
}

impl Instance {
    pub fn new_ref(class_name: &str) -> InstanceRef {
        Rc::new(RefCell::new(Self {
            class_name: class_name.to_string(),
            attributes: HashMap::new(),
        }))
    }
}

/// Half-open integer progression with a non-zero step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn iter(self) -> impl Iterator<Item = i64> {
        let mut current = Some(self.start);
        std::iter::from_fn(move || {
            let value = current?;
            let in_bounds = if self.step > 0 {
                value < self.stop
            } else {
                value > self.stop
            };
            if !in_bounds {
                current = None;
                return None;
            }
            current = value.checked_add(self.step);
            Some(value)
        })
    }

    pub fn is_empty(self) -> bool {
        if self.step > 0 {
            self.start >= self.stop
        } else {
            self.start <= self.stop
        }
    }
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.step == 1 {
            write!(f, "range({}, {})", self.start, self.stop)
        } else {
            write!(f, "range({}, {}, {})", self.start, self.stop, self.step)
        }
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Number(Number),
    String(String),
    Boolean(bool),
    None,
    Range(RangeValue),
    Instance(InstanceRef),
    Function(String),
    Class(String),
    /// Result of dividing by zero.
    Undefined,
    /// Result of a statement that produces nothing.
    Unit,
}

impl Value {
    pub fn int(value: i64) -> Self {
        Self::Number(Number::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Self::Number(Number::Float(value))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(number) => !number.is_zero(),
            Value::String(value) => !value.is_empty(),
            Value::Boolean(value) => *value,
            Value::Range(range) => !range.is_empty(),
            Value::Instance(_) | Value::Function(_) | Value::Class(_) | Value::Undefined => true,
            Value::None | Value::Unit => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(Number::Int(_)) => "int",
            Value::Number(Number::Float(_)) => "float",
            Value::String(_) => "str",
            Value::Boolean(_) => "bool",
            Value::None | Value::Unit => "NoneType",
            Value::Range(_) => "range",
            Value::Instance(_) => "object",
            Value::Function(_) => "function",
            Value::Class(_) => "type",
            Value::Undefined => "undefined",
        }
    }

    /// Numeric view used by arithmetic; booleans count as 0 and 1.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(number) => Some(*number),
            Value::Boolean(value) => Some(Number::Int(i64::from(*value))),
            _ => None,
        }
    }

    /// Arithmetic and comparison operators. `and`/`or` are handled by the
    /// caller since they return one of their operands.
    pub fn binary_op(&self, op: BinaryOperator, other: &Value, line: usize) -> EvalResult<Value> {
        let unsupported = || EvalError::UnsupportedOperands {
            operator: op.symbol(),
            left: self.type_name(),
            right: other.type_name(),
            line,
        };
        match op {
            BinaryOperator::Or | BinaryOperator::And => Err(unsupported()),
            BinaryOperator::Equal => Ok(Value::Boolean(self == other)),
            BinaryOperator::NotEqual => Ok(Value::Boolean(self != other)),
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual => {
                let ordering = self.compare(other).ok_or_else(unsupported)?;
                let result = match op {
                    BinaryOperator::Less => ordering == Ordering::Less,
                    BinaryOperator::Greater => ordering == Ordering::Greater,
                    BinaryOperator::LessEqual => ordering != Ordering::Greater,
                    _ => ordering != Ordering::Less,
                };
                Ok(Value::Boolean(result))
            }
            BinaryOperator::Add => match (self, other) {
                (Value::String(left), Value::String(right)) => {
                    Ok(Value::String(format!("{left}{right}")))
                }
                _ => self.numeric(other, Number::add).ok_or_else(unsupported),
            },
            BinaryOperator::Sub => self.numeric(other, Number::sub).ok_or_else(unsupported),
            BinaryOperator::Mul => match (self, other) {
                (Value::String(text), count) | (count, Value::String(text))
                    if matches!(count, Value::Number(Number::Int(_)) | Value::Boolean(_)) =>
                {
                    let times = count
                        .as_number()
                        .map_or(0, |number| match number {
                            Number::Int(value) => value.max(0),
                            Number::Float(_) => 0,
                        });
                    let copies = usize::try_from(times)
                        .ok()
                        .filter(|copies| {
                            text.len()
                                .checked_mul(*copies)
                                .is_some_and(|length| length <= MAX_REPEAT_LEN)
                        })
                        .ok_or(EvalError::RepeatTooLarge { times, line })?;
                    Ok(Value::String(text.repeat(copies)))
                }
                _ => self.numeric(other, Number::mul).ok_or_else(unsupported),
            },
            BinaryOperator::Div => {
                let (left, right) = self.number_pair(other).ok_or_else(unsupported)?;
                Ok(left.div(right).map_or(Value::Undefined, Value::Number))
            }
            BinaryOperator::Mod => {
                let (left, right) = self.number_pair(other).ok_or_else(unsupported)?;
                Ok(left.rem(right).map_or(Value::Undefined, Value::Number))
            }
        }
    }

    pub fn negate(&self, line: usize) -> EvalResult<Value> {
        self.as_number()
            .map(|number| Value::Number(number.neg()))
            .ok_or(EvalError::UnsupportedNegation {
                type_name: self.type_name(),
                line,
            })
    }

    fn number_pair(&self, other: &Value) -> Option<(Number, Number)> {
        Some((self.as_number()?, other.as_number()?))
    }

    fn numeric(&self, other: &Value, apply: fn(Number, Number) -> Number) -> Option<Value> {
        let (left, right) = self.number_pair(other)?;
        Some(Value::Number(apply(left, right)))
    }

    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::String(left), Value::String(right)) => Some(left.cmp(right)),
            _ => {
                let (left, right) = self.number_pair(other)?;
                left.compare(right)
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Instance(left), Value::Instance(right)) => Rc::ptr_eq(left, right),
            (Value::Range(left), Value::Range(right)) => left == right,
            (Value::Function(left), Value::Function(right)) => left == right,
            (Value::Class(left), Value::Class(right)) => left == right,
            (Value::None | Value::Unit, Value::None | Value::Unit) => true,
            (Value::Undefined, Value::Undefined) => true,
            _ => match (self.as_number(), other.as_number()) {
                (Some(left), Some(right)) => left == right,
                _ => false,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{number}"),
            Value::String(value) => f.write_str(value),
            Value::Boolean(true) => f.write_str("True"),
            Value::Boolean(false) => f.write_str("False"),
            Value::None | Value::Unit => f.write_str("None"),
            Value::Range(range) => write!(f, "{range}"),
            Value::Instance(instance) => write!(f, "<{} object>", instance.borrow().class_name),
            Value::Function(name) => write!(f, "<function {name}>"),
            Value::Class(name) => write!(f, "<class {name}>"),
            Value::Undefined => f.write_str("undefined"),
        }
    }
}
