//! Expression evaluation.
//!
//! One walker serves both evaluation modes. In connect mode every property
//! read is also recorded in a [`DependencySet`]; since the walker only visits
//! the branches it takes, the recorded set is exactly what this evaluation
//! depended on.

use crate::parser::ast::{BinaryOperator, ExpressionType, LiteralType, UnaryOperator};
use crate::runner::ds::array_object::new_array;
use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::{new_object, ObjectRef};
use crate::runner::ds::operations::object::{call, get, get_v, has_property, set};
use crate::runner::ds::operations::test_and_comparison::{
    abstract_equality_comparison, compare_values, strict_equality_comparison,
};
use crate::runner::ds::operations::type_conversion::{
    get_type, to_boolean, to_display_string, to_number, to_property_key, to_string,
};
use crate::runner::ds::scope::Scope;
use crate::runner::ds::value::Value;
use crate::runner::plugin::types::{EvalContext, ValueConverter};
use std::cmp::Ordering;
use std::rc::Rc;

use super::types::{DependencySet, EvalMode, ValueResult};

/// Evaluate an expression and return its value.
pub fn evaluate_expression(expr: &ExpressionType, scope: &Scope, ctx: &EvalContext) -> ValueResult {
    walk(expr, scope, ctx, &mut EvalMode::Evaluate)
}

/// Evaluate an expression, recording every observer it reads into `deps`.
pub fn connect_expression(
    expr: &ExpressionType,
    scope: &Scope,
    ctx: &EvalContext,
    deps: &mut DependencySet,
) -> ValueResult {
    walk(expr, scope, ctx, &mut EvalMode::Connect(deps))
}

/// Write `value` to the location an expression denotes.
///
/// Only scope, member and keyed accesses are assignable. Value converters are
/// unwrapped outermost first, each applying `from_view`.
pub fn assign_expression(
    expr: &ExpressionType,
    scope: &Scope,
    value: Value,
    ctx: &EvalContext,
) -> ValueResult {
    match expr {
        ExpressionType::AccessScope { name, ancestor } => {
            let context = scope.resolve(name, *ancestor)?;
            match &context {
                Value::Object(o) => set(o, name, value.clone())?,
                _ => {
                    return Err(BindingError::evaluation(format!(
                        "Cannot assign '{}' on a binding context of {}",
                        name,
                        to_string(&context)
                    )))
                }
            }
        }
        ExpressionType::AccessMember { object, name, .. } => {
            let target = evaluate_expression(object, scope, ctx)?;
            assign_property(&target, name, value.clone())?;
        }
        ExpressionType::AccessKeyed { object, key } => {
            let target = evaluate_expression(object, scope, ctx)?;
            let key = evaluate_expression(key, scope, ctx)?;
            assign_property(&target, &to_property_key(&key), value.clone())?;
        }
        ExpressionType::ValueConverter {
            expression,
            name,
            args,
        } => {
            let args = evaluate_arguments(args, scope, ctx, &mut EvalMode::Evaluate)?;
            let converted = lookup_converter(name, ctx)?.from_view(value, &args)?;
            return assign_expression(expression, scope, converted, ctx);
        }
        _ => return Err(BindingError::invalid_target(expr.to_string())),
    }
    Ok(value)
}

fn walk(
    expr: &ExpressionType,
    scope: &Scope,
    ctx: &EvalContext,
    mode: &mut EvalMode<'_>,
) -> ValueResult {
    match expr {
        ExpressionType::Literal(lit) => Ok(evaluate_literal(lit)),

        ExpressionType::ArrayLiteral(elements) => {
            let values = evaluate_arguments(elements, scope, ctx, mode)?;
            Ok(Value::Object(new_array(values)))
        }

        ExpressionType::ObjectLiteral(entries) => {
            let object = new_object();
            for (key, value) in entries {
                let value = walk(value, scope, ctx, mode)?;
                set(&object, key, value)?;
            }
            Ok(Value::Object(object))
        }

        ExpressionType::AccessThis { ancestor } => {
            Ok(scope.ancestor(*ancestor)?.binding_context().clone())
        }

        ExpressionType::AccessScope { name, ancestor } => {
            let context = scope.resolve(name, *ancestor)?;
            observe(&context, name, ctx, mode)?;
            Ok(match &context {
                Value::Object(o) => get(o, name),
                _ => Value::Undefined,
            })
        }

        ExpressionType::AccessMember {
            object,
            name,
            optional,
        } => {
            let target = walk(object, scope, ctx, mode)?;
            if target.is_nullish() && *optional {
                return Ok(Value::Undefined);
            }
            read_property(&target, name, ctx, mode)
        }

        ExpressionType::AccessKeyed { object, key } => {
            let target = walk(object, scope, ctx, mode)?;
            let key = walk(key, scope, ctx, mode)?;
            read_property(&target, &to_property_key(&key), ctx, mode)
        }

        ExpressionType::CallScope {
            name,
            args,
            ancestor,
        } => {
            let context = scope.resolve(name, *ancestor)?;
            let args = evaluate_arguments(args, scope, ctx, mode)?;
            let function = match &context {
                Value::Object(o) => get(o, name),
                _ => Value::Undefined,
            };
            if !is_callable(&function) {
                return Err(BindingError::evaluation(format!(
                    "'{}' is not a function",
                    name
                )));
            }
            call(&function, &context, args)
        }

        ExpressionType::CallMember { object, name, args } => {
            let target = walk(object, scope, ctx, mode)?;
            let args = evaluate_arguments(args, scope, ctx, mode)?;
            call_method(&target, name, args, ctx, mode)
        }

        ExpressionType::CallFunction { func, args } => {
            let function = walk(func, scope, ctx, mode)?;
            let args = evaluate_arguments(args, scope, ctx, mode)?;
            if !is_callable(&function) {
                return Err(BindingError::evaluation(format!(
                    "'{}' is not a function",
                    func
                )));
            }
            call(&function, &Value::Undefined, args)
        }

        ExpressionType::Conditional { condition, yes, no } => {
            let test = walk(condition, scope, ctx, mode)?;
            if to_boolean(&test) {
                walk(yes, scope, ctx, mode)
            } else {
                walk(no, scope, ctx, mode)
            }
        }

        ExpressionType::Binary {
            operator,
            left,
            right,
        } => evaluate_binary_expression(operator, left, right, scope, ctx, mode),

        ExpressionType::Unary { operator, operand } => {
            let value = walk(operand, scope, ctx, mode)?;
            Ok(evaluate_unary(operator, &value))
        }

        ExpressionType::Assign { target, value } => {
            let value = walk(value, scope, ctx, mode)?;
            assign_expression(target, scope, value, ctx)
        }

        ExpressionType::Template {
            cooked,
            expressions,
        } => {
            let mut result = String::new();
            for (i, part) in cooked.iter().enumerate() {
                result.push_str(part);
                if let Some(e) = expressions.get(i) {
                    let value = walk(e, scope, ctx, mode)?;
                    result.push_str(&to_display_string(&value));
                }
            }
            Ok(Value::String(result))
        }

        ExpressionType::ValueConverter {
            expression,
            name,
            args,
        } => {
            let value = walk(expression, scope, ctx, mode)?;
            let args = evaluate_arguments(args, scope, ctx, mode)?;
            lookup_converter(name, ctx)?.to_view(value, &args)
        }
    }
}

fn evaluate_literal(lit: &LiteralType) -> Value {
    match lit {
        LiteralType::Undefined => Value::Undefined,
        LiteralType::NullLiteral => Value::Null,
        LiteralType::BooleanLiteral(b) => Value::Boolean(*b),
        LiteralType::NumberLiteral(n) => Value::Number(*n),
        LiteralType::StringLiteral(s) => Value::String(s.clone()),
    }
}

fn evaluate_arguments(
    args: &[Rc<ExpressionType>],
    scope: &Scope,
    ctx: &EvalContext,
    mode: &mut EvalMode<'_>,
) -> Result<Vec<Value>, BindingError> {
    let mut values = Vec::with_capacity(args.len());
    for a in args {
        values.push(walk(a, scope, ctx, mode)?);
    }
    Ok(values)
}

/// Records the observer of `target.property` when connecting.
fn observe(
    target: &Value,
    property: &str,
    ctx: &EvalContext,
    mode: &mut EvalMode<'_>,
) -> Result<(), BindingError> {
    if let EvalMode::Connect(deps) = mode {
        if let Value::Object(o) = target {
            let observer = if ctx.config.strict_observation() {
                ctx.locator.try_get_observer(o, property)?
            } else {
                ctx.locator.get_observer(o, property)
            };
            deps.add_property(observer);
        }
    }
    Ok(())
}

fn observe_collection(
    array: &ObjectRef,
    ctx: &EvalContext,
    mode: &mut EvalMode<'_>,
) -> Result<(), BindingError> {
    if let EvalMode::Connect(deps) = mode {
        deps.add_collection(ctx.locator.get_array_observer(array)?);
    }
    Ok(())
}

fn read_property(
    target: &Value,
    name: &str,
    ctx: &EvalContext,
    mode: &mut EvalMode<'_>,
) -> ValueResult {
    if !target.is_nullish() {
        observe(target, name, ctx, mode)?;
    }
    get_v(target, name)
}

fn assign_property(target: &Value, name: &str, value: Value) -> Result<(), BindingError> {
    match target {
        Value::Object(o) => set(o, name, value),
        _ => Err(BindingError::evaluation(format!(
            "Cannot set property '{}' of {}",
            name,
            to_string(target)
        ))),
    }
}

fn is_callable(v: &Value) -> bool {
    match v {
        Value::Object(o) => o.borrow().is_callable(),
        _ => false,
    }
}

/// Own function-valued properties win over the built-in methods of the
/// value's kind. Connecting a built-in array method call also subscribes to
/// the array's collection observer, so `items.includes(x)` follows pushes.
fn call_method(
    target: &Value,
    name: &str,
    args: Vec<Value>,
    ctx: &EvalContext,
    mode: &mut EvalMode<'_>,
) -> ValueResult {
    if target.is_nullish() {
        return Err(BindingError::evaluation(format!(
            "Cannot read property '{}' of {}",
            name,
            to_string(target)
        )));
    }
    if let Value::Object(o) = target {
        let own = get(o, name);
        if is_callable(&own) {
            return call(&own, target, args);
        }
    }
    let kind = match target {
        Value::Object(o) if o.borrow().is_array() => Some("Array"),
        Value::String(_) => Some("String"),
        _ => None,
    };
    if let Some(method) = kind.and_then(|k| ctx.resources.get_method(k, name)) {
        if let Value::Object(o) = target {
            observe_collection(o, ctx, mode)?;
        }
        return method.call(ctx, target, args);
    }
    Err(BindingError::evaluation(format!("'{}' is not a function", name)))
}

fn lookup_converter(name: &str, ctx: &EvalContext) -> Result<Rc<dyn ValueConverter>, BindingError> {
    ctx.resources
        .get_converter(name)
        .ok_or_else(|| BindingError::evaluation(format!("No value converter named '{}'", name)))
}

/// Evaluate `&&`, `||` and `??`; the right operand only when needed.
fn evaluate_logical_expression(
    operator: &BinaryOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    scope: &Scope,
    ctx: &EvalContext,
    mode: &mut EvalMode<'_>,
) -> ValueResult {
    let left_val = walk(left, scope, ctx, mode)?;
    let take_left = match operator {
        BinaryOperator::LogicalAnd => !to_boolean(&left_val),
        BinaryOperator::LogicalOr => to_boolean(&left_val),
        _ => !left_val.is_nullish(),
    };
    if take_left {
        Ok(left_val)
    } else {
        walk(right, scope, ctx, mode)
    }
}

/// Evaluate a binary expression.
fn evaluate_binary_expression(
    operator: &BinaryOperator,
    left: &ExpressionType,
    right: &ExpressionType,
    scope: &Scope,
    ctx: &EvalContext,
    mode: &mut EvalMode<'_>,
) -> ValueResult {
    if operator.is_short_circuit() {
        return evaluate_logical_expression(operator, left, right, scope, ctx, mode);
    }
    let left_val = walk(left, scope, ctx, mode)?;
    let right_val = walk(right, scope, ctx, mode)?;

    Ok(match operator {
        // Arithmetic
        BinaryOperator::Add => add_values(&left_val, &right_val),
        BinaryOperator::Subtract => subtract_values(&left_val, &right_val),
        BinaryOperator::Multiply => Value::Number(to_number(&left_val) * to_number(&right_val)),
        BinaryOperator::Divide => Value::Number(to_number(&left_val) / to_number(&right_val)),
        BinaryOperator::Modulo => Value::Number(to_number(&left_val) % to_number(&right_val)),

        // Comparison
        BinaryOperator::LessThan => compare(&left_val, &right_val, |o| o == Ordering::Less),
        BinaryOperator::GreaterThan => compare(&left_val, &right_val, |o| o == Ordering::Greater),
        BinaryOperator::LessThanEqual => compare(&left_val, &right_val, |o| o != Ordering::Greater),
        BinaryOperator::GreaterThanEqual => compare(&left_val, &right_val, |o| o != Ordering::Less),

        // Equality
        BinaryOperator::StrictlyEqual => {
            Value::Boolean(strict_equality_comparison(&left_val, &right_val))
        }
        BinaryOperator::StrictlyUnequal => {
            Value::Boolean(!strict_equality_comparison(&left_val, &right_val))
        }
        BinaryOperator::LooselyEqual => {
            Value::Boolean(abstract_equality_comparison(&left_val, &right_val))
        }
        BinaryOperator::LooselyUnequal => {
            Value::Boolean(!abstract_equality_comparison(&left_val, &right_val))
        }

        BinaryOperator::In => match &right_val {
            Value::Object(o) => {
                let key = to_property_key(&left_val);
                observe(&right_val, &key, ctx, mode)?;
                Value::Boolean(has_property(o, &key))
            }
            _ => {
                return Err(BindingError::evaluation(format!(
                    "Cannot use 'in' operator to search for '{}' in {}",
                    to_string(&left_val),
                    to_string(&right_val)
                )))
            }
        },

        BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr | BinaryOperator::NullishCoalescing => {
            unreachable!("short-circuit operators are handled above")
        }
    })
}

fn compare<F>(left: &Value, right: &Value, test: F) -> Value
where
    F: Fn(Ordering) -> bool,
{
    Value::Boolean(compare_values(left, right).map_or(false, test))
}

/// `+` forgives a missing operand: `undefined + 'x'` is `'x'`, two missing
/// operands give `0`.
fn add_values(left: &Value, right: &Value) -> Value {
    match (left.is_nullish(), right.is_nullish()) {
        (true, true) => Value::Number(0.0),
        (true, false) => right.clone(),
        (false, true) => left.clone(),
        (false, false) => {
            let stringish = |v: &Value| matches!(v, Value::String(_) | Value::Object(_));
            if stringish(left) || stringish(right) {
                Value::String(to_string(left) + &to_string(right))
            } else {
                Value::Number(to_number(left) + to_number(right))
            }
        }
    }
}

fn subtract_values(left: &Value, right: &Value) -> Value {
    match (left.is_nullish(), right.is_nullish()) {
        (true, true) => Value::Number(0.0),
        (true, false) => Value::Number(-to_number(right)),
        (false, true) => Value::Number(to_number(left)),
        (false, false) => Value::Number(to_number(left) - to_number(right)),
    }
}

fn evaluate_unary(operator: &UnaryOperator, value: &Value) -> Value {
    match operator {
        UnaryOperator::LogicalNot => Value::Boolean(!to_boolean(value)),
        UnaryOperator::Minus => Value::Number(-to_number(value)),
        UnaryOperator::Plus => Value::Number(to_number(value)),
        UnaryOperator::TypeOf => Value::String(get_type(value).to_string()),
        UnaryOperator::Void => Value::Undefined,
    }
}
