//! Provider capability interface and the in-memory execution engine.
//!
//! The translator stays agnostic of the backing collection through
//! [`QueryProvider`]: a set of lookups returning the concrete target
//! operation for a sequence-operation kind and element type. The
//! bundled [`MemoryProvider`] supplies every operation for the types
//! it can order and add, and doubles as the executor that evaluates
//! compiled artifacts over in-memory values.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::builder::ROOT_SOURCE;
use crate::compile::CompiledQuery;
use crate::translate::{Artifact, BinaryOp, TargetExpr, TranslateError, UnaryOp};
use crate::types::Ty;
use crate::value::{type_name, Value};

/// The sequence operations a provider can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceOpKind {
    Filter,
    Select,
    SelectMany,
    OrderBy,
    OrderByDescending,
    Take,
    Skip,
    Any,
    All,
    Count,
    Min,
    Max,
    Sum,
    Average,
    Contains,
    ElementAt,
}

/// A concrete target-operation descriptor: which operation, bound to
/// which element (or reduced-over) type.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOp {
    pub kind: SequenceOpKind,
    pub element: Ty,
}

/// The seam between the compiler and the backing collection type.
///
/// Implementations answer two questions: "what is the element type of
/// this queryable?" and "give me your operation descriptor for this
/// kind over this element type". Refusing the latter is how a provider
/// reports an operation it cannot supply.
pub trait QueryProvider {
    fn sequence_op(&self, kind: SequenceOpKind, element: &Ty) -> Result<SequenceOp, TranslateError>;

    fn element_type(&self, source: &Ty) -> Option<Ty> {
        source.element().cloned()
    }
}

/// Errors raised while executing a compiled artifact over values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("type error: {0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("undefined parameter '{0}'")]
    UndefinedParameter(String),
}

/// Parameter bindings during evaluation; innermost binding wins.
#[derive(Debug, Default)]
struct Env {
    bindings: Vec<(String, Value)>,
}

impl Env {
    fn new() -> Self {
        Env::default()
    }

    fn bind(&mut self, name: &str, value: Value) {
        self.bindings.push((name.to_string(), value));
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find_map(|(bound, value)| (bound == name).then_some(value))
    }

    fn depth(&self) -> usize {
        self.bindings.len()
    }

    fn truncate(&mut self, depth: usize) {
        self.bindings.truncate(depth);
    }
}

/// In-memory query engine over [`Value`] collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryProvider;

impl QueryProvider for MemoryProvider {
    fn sequence_op(&self, kind: SequenceOpKind, element: &Ty) -> Result<SequenceOp, TranslateError> {
        let supported = match kind {
            SequenceOpKind::Sum | SequenceOpKind::Average => {
                element.unwrap_optional().is_numeric()
            }
            SequenceOpKind::Min
            | SequenceOpKind::Max
            | SequenceOpKind::OrderBy
            | SequenceOpKind::OrderByDescending => element.is_comparable(),
            _ => true,
        };
        if supported {
            Ok(SequenceOp {
                kind,
                element: element.clone(),
            })
        } else {
            Err(TranslateError::UnsupportedOperation {
                kind,
                element: element.to_string(),
            })
        }
    }
}

impl MemoryProvider {
    pub fn new() -> Self {
        MemoryProvider
    }

    /// Execute a compiled query over a record collection.
    ///
    /// Predicate artifacts filter the records and then apply the
    /// decoded page; pipeline and aggregate artifacts already carry
    /// their paging operators in the chain, so only the root source is
    /// bound for them.
    pub fn run(&self, query: &CompiledQuery, items: &[Value]) -> Result<Value, EvalError> {
        match &query.artifact {
            Artifact::Predicate(lambda) => {
                let mut kept = Vec::new();
                for item in items {
                    if self.apply_predicate(lambda, item)? {
                        kept.push(item.clone());
                    }
                }
                let offset = query.page.offset.unwrap_or(0) as usize;
                let kept: Vec<Value> = match query.page.limit {
                    Some(limit) => kept.into_iter().skip(offset).take(limit as usize).collect(),
                    None => kept.into_iter().skip(offset).collect(),
                };
                Ok(Value::Array(kept))
            }
            Artifact::Pipeline(expr) | Artifact::Aggregate(expr) => {
                let mut env = Env::new();
                env.bind(ROOT_SOURCE, Value::Array(items.to_vec()));
                self.eval(expr, &mut env)
            }
        }
    }

    /// Evaluate a predicate lambda against a single record.
    pub fn apply_predicate(&self, lambda: &TargetExpr, item: &Value) -> Result<bool, EvalError> {
        let mut env = Env::new();
        let result = self.apply_lambda(lambda, std::slice::from_ref(item), &mut env)?;
        result.as_bool().ok_or_else(|| {
            EvalError::Type(format!("predicate returned {}", type_name(&result)))
        })
    }

    /// Evaluate an arbitrary target expression with explicit bindings.
    pub fn evaluate(
        &self,
        expr: &TargetExpr,
        bindings: Vec<(String, Value)>,
    ) -> Result<Value, EvalError> {
        let mut env = Env { bindings };
        self.eval(expr, &mut env)
    }

    fn apply_lambda(
        &self,
        lambda: &TargetExpr,
        args: &[Value],
        env: &mut Env,
    ) -> Result<Value, EvalError> {
        let TargetExpr::Lambda { params, body } = lambda else {
            return Err(EvalError::Type("expected a lambda expression".to_string()));
        };
        if params.len() != args.len() {
            return Err(EvalError::Type(format!(
                "lambda takes {} argument(s), got {}",
                params.len(),
                args.len()
            )));
        }
        let depth = env.depth();
        for (param, value) in params.iter().zip(args) {
            env.bind(param, value.clone());
        }
        let result = self.eval(body, env);
        env.truncate(depth);
        result
    }

    fn eval(&self, expr: &TargetExpr, env: &mut Env) -> Result<Value, EvalError> {
        match expr {
            TargetExpr::Constant(value) => Ok(value.clone()),

            TargetExpr::Parameter(name) => env
                .lookup(name)
                .cloned()
                .ok_or_else(|| EvalError::UndefinedParameter(name.clone())),

            TargetExpr::Property { target, name } => {
                let value = self.eval(target, env)?;
                match value {
                    Value::Object(map) => {
                        if let Some(found) = map.get(name) {
                            return Ok(found.clone());
                        }
                        // Schema names are canonical; data written with
                        // different casing still resolves.
                        let fallback = map
                            .iter()
                            .find(|(key, _)| key.eq_ignore_ascii_case(name))
                            .map(|(_, v)| v.clone());
                        Ok(fallback.unwrap_or(Value::Null))
                    }
                    Value::Null => Ok(Value::Null),
                    other => Err(EvalError::Type(format!(
                        "cannot access property '{}' on {}",
                        name,
                        type_name(&other)
                    ))),
                }
            }

            TargetExpr::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                match op {
                    UnaryOp::Not => value
                        .as_bool()
                        .map(|b| Value::Bool(!b))
                        .ok_or_else(|| {
                            EvalError::Type(format!("cannot negate {}", type_name(&value)))
                        }),
                }
            }

            TargetExpr::Binary { op, left, right } => match op {
                // Logical operators short-circuit.
                BinaryOp::And => {
                    if !self.eval_bool(left, env)? {
                        return Ok(Value::Bool(false));
                    }
                    Ok(Value::Bool(self.eval_bool(right, env)?))
                }
                BinaryOp::Or => {
                    if self.eval_bool(left, env)? {
                        return Ok(Value::Bool(true));
                    }
                    Ok(Value::Bool(self.eval_bool(right, env)?))
                }
                _ => {
                    let left = self.eval(left, env)?;
                    let right = self.eval(right, env)?;
                    self.binary(*op, &left, &right)
                }
            },

            TargetExpr::Match { target, pattern } => {
                let value = self.eval(target, env)?;
                match value {
                    Value::String(s) => Ok(Value::Bool(pattern.is_match(&s))),
                    Value::Null => Ok(Value::Bool(false)),
                    other => Err(EvalError::Type(format!(
                        "pattern match requires string, got {}",
                        type_name(&other)
                    ))),
                }
            }

            TargetExpr::Lambda { .. } => Err(EvalError::Type(
                "lambda expression is not a value".to_string(),
            )),

            TargetExpr::Apply {
                op,
                source,
                argument,
            } => self.eval_sequence(op, source, argument.as_deref(), env),

            TargetExpr::Construct { fields } => {
                let mut map = std::collections::HashMap::new();
                for (name, value) in fields {
                    map.insert(name.clone(), self.eval(value, env)?);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn eval_bool(&self, expr: &TargetExpr, env: &mut Env) -> Result<bool, EvalError> {
        let value = self.eval(expr, env)?;
        value.as_bool().ok_or_else(|| {
            EvalError::Type(format!("expected boolean, got {}", type_name(&value)))
        })
    }

    fn binary(&self, op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
        match op {
            BinaryOp::Add
            | BinaryOp::Subtract
            | BinaryOp::Multiply
            | BinaryOp::Divide
            | BinaryOp::Modulo => self.numeric_binop(op, left, right),

            BinaryOp::Equals => Ok(Value::Bool(values_equal(left, right))),
            BinaryOp::NotEquals => Ok(Value::Bool(!values_equal(left, right))),

            BinaryOp::Less | BinaryOp::LessOrEqual | BinaryOp::Greater
            | BinaryOp::GreaterOrEqual => self.ordering(op, left, right),

            BinaryOp::And | BinaryOp::Or => {
                let (Some(a), Some(b)) = (left.as_bool(), right.as_bool()) else {
                    return Err(EvalError::Type(format!(
                        "logical operator requires booleans, got {} and {}",
                        type_name(left),
                        type_name(right)
                    )));
                };
                Ok(Value::Bool(if op == BinaryOp::And {
                    a && b
                } else {
                    a || b
                }))
            }
        }
    }

    /// Mixed-representation arithmetic goes through decimals so
    /// integer/float combinations don't accumulate binary-float error.
    fn numeric_binop(&self, op: BinaryOp, a: &Value, b: &Value) -> Result<Value, EvalError> {
        match (a, b) {
            (Value::Integer(x), Value::Integer(y)) => self.integer_binop(op, *x, *y),
            (Value::Float(x), Value::Float(y)) => Ok(Value::Float(float_binop(op, *x, *y))),
            _ => {
                let (Some(da), Some(db)) = (a.as_decimal(), b.as_decimal()) else {
                    return Err(EvalError::Type(format!(
                        "cannot apply {:?} to {} and {}",
                        op,
                        type_name(a),
                        type_name(b)
                    )));
                };
                if matches!(op, BinaryOp::Divide | BinaryOp::Modulo) && db.is_zero() {
                    return Err(EvalError::DivisionByZero);
                }
                let result = match op {
                    BinaryOp::Add => da.checked_add(db),
                    BinaryOp::Subtract => da.checked_sub(db),
                    BinaryOp::Multiply => da.checked_mul(db),
                    BinaryOp::Divide => da.checked_div(db),
                    _ => da.checked_rem(db),
                }
                .ok_or_else(|| EvalError::Type("numeric overflow".to_string()))?;

                if matches!(a, Value::Decimal(_)) || matches!(b, Value::Decimal(_)) {
                    Ok(Value::Decimal(result))
                } else {
                    Ok(Value::Float(result.to_f64().unwrap_or(f64::NAN)))
                }
            }
        }
    }

    fn integer_binop(&self, op: BinaryOp, x: i64, y: i64) -> Result<Value, EvalError> {
        let result = match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Subtract => x.checked_sub(y),
            BinaryOp::Multiply => x.checked_mul(y),
            BinaryOp::Divide => {
                if y == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                x.checked_div(y)
            }
            _ => {
                if y == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                x.checked_rem(y)
            }
        };
        result
            .map(Value::Integer)
            .ok_or_else(|| EvalError::Type("integer overflow".to_string()))
    }

    fn ordering(&self, op: BinaryOp, a: &Value, b: &Value) -> Result<Value, EvalError> {
        use std::cmp::Ordering;
        if matches!(a, Value::Null) || matches!(b, Value::Null) {
            // Null orders with nothing; comparisons against it are false.
            return Ok(Value::Bool(false));
        }
        let ord = match (a, b) {
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => match (a.as_decimal(), b.as_decimal()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => {
                    return Err(EvalError::Type(format!(
                        "cannot compare {} and {}",
                        type_name(a),
                        type_name(b)
                    )));
                }
            },
        };
        let result = match op {
            BinaryOp::Less => ord == Ordering::Less,
            BinaryOp::LessOrEqual => ord != Ordering::Greater,
            BinaryOp::Greater => ord == Ordering::Greater,
            _ => ord != Ordering::Less,
        };
        Ok(Value::Bool(result))
    }

    fn eval_sequence(
        &self,
        op: &SequenceOp,
        source: &TargetExpr,
        argument: Option<&TargetExpr>,
        env: &mut Env,
    ) -> Result<Value, EvalError> {
        let source_value = self.eval(source, env)?;
        let Value::Array(items) = source_value else {
            return Err(EvalError::Type(format!(
                "{:?} requires an array source, got {}",
                op.kind,
                type_name(&source_value)
            )));
        };

        match op.kind {
            SequenceOpKind::Filter => {
                let lambda = required(argument, op.kind)?;
                let mut kept = Vec::new();
                for item in &items {
                    if self.lambda_bool(lambda, item, env)? {
                        kept.push(item.clone());
                    }
                }
                Ok(Value::Array(kept))
            }

            SequenceOpKind::Select => {
                let lambda = required(argument, op.kind)?;
                let mut mapped = Vec::new();
                for item in &items {
                    mapped.push(self.apply_lambda(lambda, std::slice::from_ref(item), env)?);
                }
                Ok(Value::Array(mapped))
            }

            SequenceOpKind::SelectMany => {
                let lambda = required(argument, op.kind)?;
                let mut flattened = Vec::new();
                for item in &items {
                    let inner = self.apply_lambda(lambda, std::slice::from_ref(item), env)?;
                    match inner {
                        Value::Array(values) => flattened.extend(values),
                        Value::Null => {}
                        other => {
                            return Err(EvalError::Type(format!(
                                "SelectMany selector returned {}",
                                type_name(&other)
                            )));
                        }
                    }
                }
                Ok(Value::Array(flattened))
            }

            SequenceOpKind::OrderBy | SequenceOpKind::OrderByDescending => {
                let mut keyed: Vec<(Value, Value)> = Vec::new();
                for item in &items {
                    let key = match argument {
                        Some(lambda) => {
                            self.apply_lambda(lambda, std::slice::from_ref(item), env)?
                        }
                        None => item.clone(),
                    };
                    keyed.push((item.clone(), key));
                }
                if op.kind == SequenceOpKind::OrderByDescending {
                    keyed.sort_by(|(_, a), (_, b)| b.compare(a));
                } else {
                    keyed.sort_by(|(_, a), (_, b)| a.compare(b));
                }
                Ok(Value::Array(keyed.into_iter().map(|(item, _)| item).collect()))
            }

            SequenceOpKind::Take => {
                let count = self.count_argument(argument, op.kind, env)?;
                Ok(Value::Array(items.into_iter().take(count).collect()))
            }

            SequenceOpKind::Skip => {
                let count = self.count_argument(argument, op.kind, env)?;
                Ok(Value::Array(items.into_iter().skip(count).collect()))
            }

            SequenceOpKind::Any => match argument {
                None => Ok(Value::Bool(!items.is_empty())),
                Some(lambda) => {
                    for item in &items {
                        if self.lambda_bool(lambda, item, env)? {
                            return Ok(Value::Bool(true));
                        }
                    }
                    Ok(Value::Bool(false))
                }
            },

            SequenceOpKind::All => match argument {
                None => Ok(Value::Bool(true)),
                Some(lambda) => {
                    for item in &items {
                        if !self.lambda_bool(lambda, item, env)? {
                            return Ok(Value::Bool(false));
                        }
                    }
                    Ok(Value::Bool(true))
                }
            },

            SequenceOpKind::Count => match argument {
                None => Ok(Value::Integer(items.len() as i64)),
                Some(lambda) => {
                    let mut count = 0i64;
                    for item in &items {
                        if self.lambda_bool(lambda, item, env)? {
                            count += 1;
                        }
                    }
                    Ok(Value::Integer(count))
                }
            },

            SequenceOpKind::Min | SequenceOpKind::Max => {
                let values = self.selector_values(&items, argument, env)?;
                let mut best: Option<Value> = None;
                for value in values {
                    if matches!(value, Value::Null) {
                        continue;
                    }
                    best = Some(match best {
                        None => value,
                        Some(current) => {
                            let keep_new = match op.kind {
                                SequenceOpKind::Min => {
                                    value.compare(&current) == std::cmp::Ordering::Less
                                }
                                _ => value.compare(&current) == std::cmp::Ordering::Greater,
                            };
                            if keep_new { value } else { current }
                        }
                    });
                }
                Ok(best.unwrap_or(Value::Null))
            }

            SequenceOpKind::Sum => {
                let values = self.selector_values(&items, argument, env)?;
                let mut acc: Option<Value> = None;
                for value in values {
                    acc = Some(match acc {
                        None => value,
                        Some(current) => self.numeric_binop(BinaryOp::Add, &current, &value)?,
                    });
                }
                Ok(acc.unwrap_or(Value::Integer(0)))
            }

            SequenceOpKind::Average => {
                let values = self.selector_values(&items, argument, env)?;
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                let count = values.len();
                let mut acc: Option<Value> = None;
                for value in values {
                    acc = Some(match acc {
                        None => value,
                        Some(current) => self.numeric_binop(BinaryOp::Add, &current, &value)?,
                    });
                }
                let total = acc.unwrap_or(Value::Integer(0));
                match total {
                    Value::Decimal(d) => {
                        let divisor = Decimal::from(count as i64);
                        Ok(Value::Decimal(d.checked_div(divisor).ok_or_else(|| {
                            EvalError::Type("numeric overflow".to_string())
                        })?))
                    }
                    other => {
                        let sum = other.as_f64().ok_or_else(|| {
                            EvalError::Type(format!("cannot average {}", type_name(&other)))
                        })?;
                        Ok(Value::Float(sum / count as f64))
                    }
                }
            }

            SequenceOpKind::Contains => {
                let needle_expr = required(argument, op.kind)?;
                let needle = self.eval(needle_expr, env)?;
                Ok(Value::Bool(
                    items.iter().any(|item| values_equal(item, &needle)),
                ))
            }

            SequenceOpKind::ElementAt => {
                let index_expr = required(argument, op.kind)?;
                let index_value = self.eval(index_expr, env)?;
                let Value::Integer(index) = index_value else {
                    return Err(EvalError::Type(format!(
                        "ElementAt index must be integer, got {}",
                        type_name(&index_value)
                    )));
                };
                let resolved = if index < 0 {
                    let back = index.unsigned_abs() as usize;
                    if back > items.len() {
                        return Ok(Value::Null);
                    }
                    items.len() - back
                } else {
                    index as usize
                };
                Ok(items.get(resolved).cloned().unwrap_or(Value::Null))
            }
        }
    }

    fn lambda_bool(
        &self,
        lambda: &TargetExpr,
        item: &Value,
        env: &mut Env,
    ) -> Result<bool, EvalError> {
        let result = self.apply_lambda(lambda, std::slice::from_ref(item), env)?;
        result.as_bool().ok_or_else(|| {
            EvalError::Type(format!("predicate returned {}", type_name(&result)))
        })
    }

    fn selector_values(
        &self,
        items: &[Value],
        argument: Option<&TargetExpr>,
        env: &mut Env,
    ) -> Result<Vec<Value>, EvalError> {
        match argument {
            None => Ok(items.to_vec()),
            Some(lambda) => {
                let mut values = Vec::new();
                for item in items {
                    values.push(self.apply_lambda(lambda, std::slice::from_ref(item), env)?);
                }
                Ok(values)
            }
        }
    }

    fn count_argument(
        &self,
        argument: Option<&TargetExpr>,
        kind: SequenceOpKind,
        env: &mut Env,
    ) -> Result<usize, EvalError> {
        let expr = required(argument, kind)?;
        let value = self.eval(expr, env)?;
        match value {
            Value::Integer(n) if n >= 0 => Ok(n as usize),
            Value::Integer(_) => Ok(0),
            other => Err(EvalError::Type(format!(
                "{:?} count must be integer, got {}",
                kind,
                type_name(&other)
            ))),
        }
    }
}

fn required(
    argument: Option<&TargetExpr>,
    kind: SequenceOpKind,
) -> Result<&TargetExpr, EvalError> {
    argument.ok_or_else(|| EvalError::Type(format!("{:?} requires an argument", kind)))
}

/// Same-representation float arithmetic follows IEEE semantics;
/// division by zero yields an infinity rather than an error, matching
/// how the float members themselves behave.
fn float_binop(op: BinaryOp, x: f64, y: f64) -> f64 {
    match op {
        BinaryOp::Add => x + y,
        BinaryOp::Subtract => x - y,
        BinaryOp::Multiply => x * y,
        BinaryOp::Divide => x / y,
        _ => x % y,
    }
}

/// Equality across numeric representations: `2 == 2.0` holds, while
/// non-numeric kinds fall back to structural equality.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_decimal(), b.as_decimal()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lambda(param: &str, body: TargetExpr) -> TargetExpr {
        TargetExpr::Lambda {
            params: vec![param.to_string()],
            body: Box::new(body),
        }
    }

    fn param(name: &str) -> TargetExpr {
        TargetExpr::Parameter(name.to_string())
    }

    #[test]
    fn take_and_skip_slice_the_source() {
        let provider = MemoryProvider::new();
        let items = Value::Array(vec![
            Value::Integer(1),
            Value::Integer(2),
            Value::Integer(3),
        ]);
        let expr = TargetExpr::Apply {
            op: SequenceOp {
                kind: SequenceOpKind::Take,
                element: Ty::Int32,
            },
            source: Box::new(TargetExpr::Apply {
                op: SequenceOp {
                    kind: SequenceOpKind::Skip,
                    element: Ty::Int32,
                },
                source: Box::new(TargetExpr::Constant(items)),
                argument: Some(Box::new(TargetExpr::Constant(Value::Integer(1)))),
            }),
            argument: Some(Box::new(TargetExpr::Constant(Value::Integer(1)))),
        };
        let result = provider.evaluate(&expr, Vec::new()).unwrap();
        assert_eq!(result, Value::Array(vec![Value::Integer(2)]));
    }

    #[test]
    fn sum_promotes_across_representations() {
        let provider = MemoryProvider::new();
        let expr = TargetExpr::Apply {
            op: SequenceOp {
                kind: SequenceOpKind::Sum,
                element: Ty::Float64,
            },
            source: Box::new(TargetExpr::Constant(Value::Array(vec![
                Value::Integer(1),
                Value::Float(2.5),
            ]))),
            argument: None,
        };
        assert_eq!(
            provider.evaluate(&expr, Vec::new()).unwrap(),
            Value::Float(3.5)
        );
    }

    #[test]
    fn filter_lambda_binds_its_parameter() {
        let provider = MemoryProvider::new();
        let predicate = lambda(
            "x",
            TargetExpr::Binary {
                op: BinaryOp::Greater,
                left: Box::new(param("x")),
                right: Box::new(TargetExpr::Constant(Value::Integer(1))),
            },
        );
        let expr = TargetExpr::Apply {
            op: SequenceOp {
                kind: SequenceOpKind::Filter,
                element: Ty::Int32,
            },
            source: Box::new(TargetExpr::Constant(Value::Array(vec![
                Value::Integer(1),
                Value::Integer(2),
            ]))),
            argument: Some(Box::new(predicate)),
        };
        assert_eq!(
            provider.evaluate(&expr, Vec::new()).unwrap(),
            Value::Array(vec![Value::Integer(2)])
        );
    }

    #[test]
    fn provider_refuses_sum_over_strings() {
        let provider = MemoryProvider::new();
        let err = provider
            .sequence_op(SequenceOpKind::Sum, &Ty::Str)
            .unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedOperation { .. }));
    }

    #[test]
    fn integer_division_by_zero_is_an_error() {
        let provider = MemoryProvider::new();
        assert_eq!(
            provider.integer_binop(BinaryOp::Divide, 1, 0),
            Err(EvalError::DivisionByZero)
        );
    }
}
