use std::collections::HashMap;
use std::io;

use tracing::{debug, warn};

use crate::ast::{
    BinaryOperator, ClassDef, ElifBranch, Expression, FunctionDef, Statement, UnaryOperator,
};
use crate::builtins::BuiltinFunction;
use crate::console::{InputSource, OutputSink};

use super::error::{EvalError, EvalResult, RuntimeWarning};
use super::number::Number;
use super::value::{Instance, RangeValue, Value};

/// Control-flow marker for statement execution.
pub(super) enum ExecResult {
    Continue,
    Return(Value),
}

type Frame = HashMap<String, Value>;

/// Walks statements and expressions for a single run.
///
/// The global frame lives for the whole run; each user call pushes a frame
/// that starts as a copy of its caller's and is dropped on return.
pub(super) struct InterpreterRuntime<'p, 'io> {
    pub(super) functions: HashMap<&'p str, &'p FunctionDef>,
    pub(super) classes: HashMap<&'p str, &'p ClassDef>,
    pub(super) globals: Frame,
    pub(super) call_stack: Vec<Frame>,
    pub(super) output: &'io mut dyn OutputSink,
    pub(super) input: &'io mut dyn InputSource,
    pub(super) warnings: Vec<RuntimeWarning>,
    pub(super) max_call_depth: usize,
}

impl<'p> InterpreterRuntime<'p, '_> {
    pub(super) fn exec_block(&mut self, body: &'p [Statement]) -> EvalResult<ExecResult> {
        for statement in body {
            if let ExecResult::Return(value) = self.exec_statement(statement)? {
                return Ok(ExecResult::Return(value));
            }
        }
        Ok(ExecResult::Continue)
    }

    fn exec_statement(&mut self, statement: &'p Statement) -> EvalResult<ExecResult> {
        match statement {
            Statement::Assign { name, value, .. } => {
                let value = self.eval_expression(value)?;
                self.frame_mut().insert(name.clone(), value);
            }
            Statement::AttrAssign {
                object,
                name,
                value,
                line,
            } => {
                let value = self.eval_expression(value)?;
                match self.frame().get(object).cloned() {
                    Some(Value::Instance(instance)) => {
                        instance.borrow_mut().attributes.insert(name.clone(), value);
                    }
                    _ => self.warn(RuntimeWarning::NotAnInstance {
                        name: object.clone(),
                        attribute: name.clone(),
                        line: *line,
                    }),
                }
            }
            Statement::If {
                condition,
                then_body,
                elif_branches,
                else_body,
            } => {
                if self.eval_expression(condition)?.is_truthy() {
                    return self.exec_block(then_body);
                }
                for ElifBranch { condition, body } in elif_branches {
                    if self.eval_expression(condition)?.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                if let Some(body) = else_body {
                    return self.exec_block(body);
                }
            }
            Statement::For {
                target,
                iterable,
                body,
                line,
            } => return self.exec_for(target, iterable, body, *line),
            Statement::While { condition, body } => {
                while self.eval_expression(condition)?.is_truthy() {
                    if let ExecResult::Return(value) = self.exec_block(body)? {
                        return Ok(ExecResult::Return(value));
                    }
                }
            }
            Statement::FunctionDef(function) => {
                debug!(name = %function.name, "registering function");
                self.functions.insert(function.name.as_str(), function);
            }
            Statement::ClassDef(class) => {
                debug!(name = %class.name, "registering class");
                self.classes.insert(class.name.as_str(), class);
            }
            Statement::Return { value, .. } => {
                let value = match value {
                    Some(value) => self.eval_expression(value)?,
                    None => Value::None,
                };
                return Ok(ExecResult::Return(value));
            }
            Statement::Print { args, .. } => {
                let rendered = self
                    .eval_args(args)?
                    .iter()
                    .map(Value::to_string)
                    .collect::<Vec<_>>();
                self.output.write_line(&rendered)?;
            }
            Statement::Pass => {}
            Statement::Expr(expression) => {
                self.eval_expression(expression)?;
            }
        }
        Ok(ExecResult::Continue)
    }

    fn exec_for(
        &mut self,
        target: &str,
        iterable: &'p Expression,
        body: &'p [Statement],
        line: usize,
    ) -> EvalResult<ExecResult> {
        let items: Box<dyn Iterator<Item = Value>> = match self.eval_expression(iterable)? {
            Value::Range(range) => Box::new(range.iter().map(Value::int)),
            Value::String(text) => Box::new(
                text.chars()
                    .map(|character| Value::String(character.to_string()))
                    .collect::<Vec<_>>()
                    .into_iter(),
            ),
            other => {
                return Err(EvalError::NotIterable {
                    type_name: other.type_name(),
                    line,
                });
            }
        };
        for item in items {
            self.frame_mut().insert(target.to_string(), item);
            if let ExecResult::Return(value) = self.exec_block(body)? {
                return Ok(ExecResult::Return(value));
            }
        }
        Ok(ExecResult::Continue)
    }

    fn eval_expression(&mut self, expression: &'p Expression) -> EvalResult<Value> {
        match expression {
            Expression::Integer(value) => Ok(Value::int(*value)),
            Expression::Float(value) => Ok(Value::float(*value)),
            Expression::String(raw) => Ok(Value::String(string_contents(raw).to_string())),
            Expression::Boolean(value) => Ok(Value::Boolean(*value)),
            Expression::None => Ok(Value::None),
            Expression::Variable { name, line } => Ok(self.load(name, *line)),
            Expression::Attribute { object, name, line } => {
                Ok(self.load_attribute(object, name, *line))
            }
            Expression::MethodCall {
                object,
                method,
                args,
                line,
            } => self.call_method(object, method, args, *line),
            Expression::Call { name, args, line } => self.call_named(name, args, *line),
            Expression::UnaryOp { op, operand, line } => {
                let operand = self.eval_expression(operand)?;
                match op {
                    UnaryOperator::Not => Ok(Value::Boolean(!operand.is_truthy())),
                    UnaryOperator::Negate => operand.negate(*line),
                }
            }
            Expression::BinaryOp {
                op,
                left,
                right,
                line,
            } => {
                // Both operands are always evaluated, left first.
                let left = self.eval_expression(left)?;
                let right = self.eval_expression(right)?;
                match op {
                    BinaryOperator::And => Ok(if left.is_truthy() { right } else { left }),
                    BinaryOperator::Or => Ok(if left.is_truthy() { left } else { right }),
                    _ => left.binary_op(*op, &right, *line),
                }
            }
        }
    }

    fn eval_args(&mut self, args: &'p [Expression]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expression(arg)).collect()
    }

    fn load(&mut self, name: &str, line: usize) -> Value {
        if let Some(value) = self.frame().get(name) {
            return value.clone();
        }
        if self.functions.contains_key(name) {
            return Value::Function(name.to_string());
        }
        if self.classes.contains_key(name) {
            return Value::Class(name.to_string());
        }
        self.warn(RuntimeWarning::UndefinedVariable {
            name: name.to_string(),
            line,
        });
        Value::String(format!("[variable {name} is not defined]"))
    }

    fn load_attribute(&mut self, object: &str, attribute: &str, line: usize) -> Value {
        let Some(Value::Instance(instance)) = self.frame().get(object).cloned() else {
            self.warn(RuntimeWarning::NotAnInstance {
                name: object.to_string(),
                attribute: attribute.to_string(),
                line,
            });
            return Value::None;
        };
        let found = instance.borrow().attributes.get(attribute).cloned();
        found.unwrap_or_else(|| {
            let class_name = instance.borrow().class_name.clone();
            self.warn(RuntimeWarning::MissingAttribute {
                class_name,
                attribute: attribute.to_string(),
                line,
            });
            Value::None
        })
    }

    fn call_named(&mut self, name: &str, args: &'p [Expression], line: usize) -> EvalResult<Value> {
        if let Some(builtin) = BuiltinFunction::from_name(name) {
            let args = self.eval_args(args)?;
            return self.call_builtin(builtin, args, line);
        }
        let target = match self.frame().get(name) {
            Some(Value::Function(function)) => Some(Value::Function(function.clone())),
            Some(Value::Class(class)) => Some(Value::Class(class.clone())),
            _ => None,
        };
        let target = target.unwrap_or_else(|| {
            if self.functions.contains_key(name) {
                Value::Function(name.to_string())
            } else if self.classes.contains_key(name) {
                Value::Class(name.to_string())
            } else {
                Value::None
            }
        });
        match target {
            Value::Function(function) => match self.functions.get(function.as_str()).copied() {
                Some(function) => {
                    let args = self.eval_args(args)?;
                    self.invoke_function(function, None, args, line)
                }
                None => Ok(self.unknown_call_target(&function, line)),
            },
            Value::Class(class) => match self.classes.get(class.as_str()).copied() {
                Some(class) => {
                    let args = self.eval_args(args)?;
                    self.instantiate(class, args, line)
                }
                None => Ok(self.unknown_call_target(&class, line)),
            },
            _ => Ok(self.unknown_call_target(name, line)),
        }
    }

    fn unknown_call_target(&mut self, name: &str, line: usize) -> Value {
        self.warn(RuntimeWarning::UnknownCallTarget {
            name: name.to_string(),
            line,
        });
        Value::None
    }

    fn call_method(
        &mut self,
        object: &str,
        method: &str,
        args: &'p [Expression],
        line: usize,
    ) -> EvalResult<Value> {
        let Some(Value::Instance(instance)) = self.frame().get(object).cloned() else {
            self.warn(RuntimeWarning::NotAnInstance {
                name: object.to_string(),
                attribute: method.to_string(),
                line,
            });
            return Ok(Value::None);
        };
        let class_name = instance.borrow().class_name.clone();
        let Some(function) = self.find_method(&class_name, method) else {
            self.warn(RuntimeWarning::UnknownMethod {
                class_name,
                method: method.to_string(),
                line,
            });
            return Ok(Value::None);
        };
        let args = self.eval_args(args)?;
        self.invoke_function(function, Some(Value::Instance(instance)), args, line)
    }

    fn find_method(&self, class_name: &str, method: &str) -> Option<&'p FunctionDef> {
        let class = self.classes.get(class_name).copied()?;
        class.methods.iter().rev().find(|def| def.name == method)
    }

    fn instantiate(
        &mut self,
        class: &'p ClassDef,
        args: Vec<Value>,
        line: usize,
    ) -> EvalResult<Value> {
        debug!(class = %class.name, line, "instantiating");
        let instance = Value::Instance(Instance::new_ref(&class.name));
        if let Some(init) = self.find_method(&class.name, "__init__") {
            self.invoke_function(init, Some(instance.clone()), args, line)?;
        }
        Ok(instance)
    }

    /// Runs a user function or method in a fresh frame copied from the caller.
    /// Extra arguments are ignored and missing parameters stay unbound.
    fn invoke_function(
        &mut self,
        function: &'p FunctionDef,
        receiver: Option<Value>,
        args: Vec<Value>,
        line: usize,
    ) -> EvalResult<Value> {
        if self.call_stack.len() >= self.max_call_depth {
            return Err(EvalError::RecursionLimit {
                name: function.name.clone(),
                limit: self.max_call_depth,
                line,
            });
        }
        debug!(
            name = %function.name,
            depth = self.call_stack.len() + 1,
            "calling"
        );

        let mut frame = self.frame().clone();
        let mut params = function.params.iter();
        if let Some(receiver) = receiver {
            if let Some(first) = params.next() {
                frame.insert(first.clone(), receiver.clone());
            }
            frame.insert("self".to_string(), receiver);
        }
        for (param, value) in params.zip(args) {
            frame.insert(param.clone(), value);
        }

        self.call_stack.push(frame);
        let result = self.exec_block(&function.body);
        self.call_stack.pop();
        match result? {
            ExecResult::Continue => Ok(Value::None),
            ExecResult::Return(value) => Ok(value),
        }
    }

    fn call_builtin(
        &mut self,
        builtin: BuiltinFunction,
        args: Vec<Value>,
        line: usize,
    ) -> EvalResult<Value> {
        match builtin {
            BuiltinFunction::Print => {
                let rendered = args.iter().map(Value::to_string).collect::<Vec<_>>();
                self.output.write_line(&rendered)?;
                Ok(Value::None)
            }
            BuiltinFunction::Input => {
                let prompt = args.first().map(Value::to_string);
                match self.input.read_line(prompt.as_deref()) {
                    Ok(text) => Ok(Value::String(text)),
                    Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => {
                        Err(EvalError::InputClosed { line })
                    }
                    Err(error) => Err(error.into()),
                }
            }
            BuiltinFunction::Int => convert_int(args.first(), line),
            BuiltinFunction::Range => build_range(&args, line),
        }
    }

    fn frame(&self) -> &Frame {
        self.call_stack.last().unwrap_or(&self.globals)
    }

    fn frame_mut(&mut self) -> &mut Frame {
        match self.call_stack.last_mut() {
            Some(frame) => frame,
            None => &mut self.globals,
        }
    }

    fn warn(&mut self, warning: RuntimeWarning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }
}

/// Drops an optional `f` prefix and one pair of surrounding quotes.
fn string_contents(raw: &str) -> &str {
    let unprefixed = raw.strip_prefix('f').unwrap_or(raw);
    let mut chars = unprefixed.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open @ ('"' | '\'')), Some(close)) if open == close => {
            &unprefixed[1..unprefixed.len() - 1]
        }
        _ => unprefixed,
    }
}

fn convert_int(value: Option<&Value>, line: usize) -> EvalResult<Value> {
    let Some(value) = value.filter(|value| value.is_truthy()) else {
        return Ok(Value::int(0));
    };
    match value {
        Value::Number(Number::Int(value)) => Ok(Value::int(*value)),
        Value::Number(Number::Float(value)) => {
            let truncated = value.trunc();
            // i64::MAX as f64 rounds up to 2^63, which is already out of range.
            let in_range = truncated >= i64::MIN as f64 && truncated < i64::MAX as f64;
            if in_range {
                Ok(Value::int(truncated as i64))
            } else {
                Err(EvalError::FloatToInt {
                    value: Number::Float(*value).to_string(),
                    line,
                })
            }
        }
        Value::Boolean(value) => Ok(Value::int(i64::from(*value))),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::int)
            .map_err(|_| EvalError::InvalidIntLiteral {
                text: text.clone(),
                line,
            }),
        other => Err(EvalError::InvalidIntArgument {
            type_name: other.type_name(),
            line,
        }),
    }
}

fn build_range(args: &[Value], line: usize) -> EvalResult<Value> {
    let bounds = args
        .iter()
        .map(|arg| match arg.as_number() {
            Some(Number::Int(value)) => Ok(value),
            _ => Err(EvalError::RangeArgument {
                type_name: arg.type_name(),
                line,
            }),
        })
        .collect::<EvalResult<Vec<_>>>()?;
    let (start, stop, step) = match bounds.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => {
            return Err(EvalError::RangeArity {
                found: args.len(),
                line,
            });
        }
    };
    if step == 0 {
        return Err(EvalError::ZeroRangeStep { line });
    }
    Ok(Value::Range(RangeValue { start, stop, step }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_quotes() {
        assert_eq!(string_contents("\"hello\""), "hello");
        assert_eq!(string_contents("'x'"), "x");
        assert_eq!(string_contents("f\"n = {n}\""), "n = {n}");
        assert_eq!(string_contents("\"\""), "");
    }

    #[test]
    fn int_conversion() {
        assert_eq!(convert_int(None, 1).expect("int"), Value::int(0));
        assert_eq!(
            convert_int(Some(&Value::String(String::new())), 1).expect("int"),
            Value::int(0)
        );
        assert_eq!(
            convert_int(Some(&Value::String(" 42 ".to_string())), 1).expect("int"),
            Value::int(42)
        );
        assert_eq!(
            convert_int(Some(&Value::float(-3.9)), 1).expect("int"),
            Value::int(-3)
        );
        assert_eq!(
            convert_int(Some(&Value::Boolean(true)), 1).expect("int"),
            Value::int(1)
        );
        let error = convert_int(Some(&Value::float(1e300)), 3).expect_err("expected overflow");
        assert_eq!(error.to_string(), "line 3: cannot convert float 1e+300 to integer");
        assert!(matches!(
            convert_int(Some(&Value::float(f64::NAN)), 1),
            Err(EvalError::FloatToInt { .. })
        ));
        assert!(matches!(
            convert_int(Some(&Value::float(f64::NEG_INFINITY)), 1),
            Err(EvalError::FloatToInt { .. })
        ));
        let error = convert_int(Some(&Value::String("abc".to_string())), 7)
            .expect_err("expected invalid literal");
        assert_eq!(error.to_string(), "line 7: invalid literal for int(): 'abc'");
    }

    #[test]
    fn range_forms() {
        let range = |args: &[i64]| {
            build_range(&args.iter().copied().map(Value::int).collect::<Vec<_>>(), 1)
        };
        assert!(matches!(
            range(&[3]).expect("range"),
            Value::Range(RangeValue { start: 0, stop: 3, step: 1 })
        ));
        assert!(matches!(
            range(&[2, 5]).expect("range"),
            Value::Range(RangeValue { start: 2, stop: 5, step: 1 })
        ));
        assert!(matches!(
            range(&[5, 0, -1]).expect("range"),
            Value::Range(RangeValue { start: 5, stop: 0, step: -1 })
        ));
        assert!(matches!(range(&[1, 2, 0]), Err(EvalError::ZeroRangeStep { .. })));
        assert!(matches!(range(&[]), Err(EvalError::RangeArity { found: 0, .. })));
        assert!(matches!(
            build_range(&[Value::float(1.5)], 1),
            Err(EvalError::RangeArgument { type_name: "float", .. })
        ));
    }
}
