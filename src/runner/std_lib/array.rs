//! Array built-in.
//!
//! Mutating methods go through `array_splice` so index, `length` and
//! collection observers all see the change.

use crate::runner::ds::array_object::{array_elements, new_array};
use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::ObjectRef;
use crate::runner::ds::operations::object::{array_len, array_replace, array_splice};
use crate::runner::ds::operations::test_and_comparison::{same_value, strict_equality_comparison};
use crate::runner::ds::operations::type_conversion::{
    join_array, to_number, to_relative_index, to_string,
};
use crate::runner::ds::value::Value;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::registry::ResourceRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Register the Array built-in with the registry.
pub fn register(registry: &mut ResourceRegistry) {
    let array = BuiltInObject::new("Array")
        .add_method("push", array_push)
        .add_method("pop", array_pop)
        .add_method("shift", array_shift)
        .add_method("unshift", array_unshift)
        .add_method("slice", array_slice)
        .add_method("splice", array_splice_method)
        .add_method("indexOf", array_index_of)
        .add_method("includes", array_includes)
        .add_method("join", array_join)
        .add_method("reverse", array_reverse);

    registry.register_object(array);
}

fn this_array(this: &Value, method: &str) -> Result<ObjectRef, BindingError> {
    match this {
        Value::Object(o) if o.borrow().is_array() => Ok(o.clone()),
        _ => Err(BindingError::evaluation(format!(
            "Array.prototype.{} called on a non-array",
            method
        ))),
    }
}

fn elements(array: &ObjectRef) -> Vec<Value> {
    array_elements(array).unwrap_or_default()
}

/// Array.prototype.push
fn array_push(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "push")?;
    let len = array_len(&array)?;
    let added = args.len();
    array_splice(&array, len, 0, args)?;
    Ok(Value::from(len + added))
}

/// Array.prototype.pop
fn array_pop(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "pop")?;
    let len = array_len(&array)?;
    if len == 0 {
        return Ok(Value::Undefined);
    }
    let mut removed = array_splice(&array, len - 1, 1, vec![])?;
    Ok(removed.pop().unwrap_or_default())
}

/// Array.prototype.shift
fn array_shift(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "shift")?;
    let removed = array_splice(&array, 0, 1, vec![])?;
    Ok(removed.into_iter().next().unwrap_or_default())
}

/// Array.prototype.unshift
fn array_unshift(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "unshift")?;
    let len = array_len(&array)?;
    let added = args.len();
    array_splice(&array, 0, 0, args)?;
    Ok(Value::from(len + added))
}

/// Array.prototype.slice
fn array_slice(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "slice")?;
    let items = elements(&array);
    let len = items.len();
    let start = args
        .get(0)
        .map_or(0, |v| to_relative_index(v, len));
    let end = match args.get(1) {
        None | Some(Value::Undefined) => len,
        Some(v) => to_relative_index(v, len),
    };
    let slice = if start < end {
        items[start..end].to_vec()
    } else {
        vec![]
    };
    Ok(Value::Object(new_array(slice)))
}

/// Array.prototype.splice
fn array_splice_method(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "splice")?;
    let len = array_len(&array)?;
    let mut args = args.into_iter();
    let start = args
        .next()
        .map_or(0, |v| to_relative_index(&v, len));
    let delete_count = match args.next() {
        None => len - start,
        Some(v) => {
            let n = to_number(&v);
            if n.is_nan() || n <= 0.0 {
                0
            } else {
                (n as usize).min(len - start)
            }
        }
    };
    let removed = array_splice(&array, start, delete_count, args.collect())?;
    Ok(Value::Object(new_array(removed)))
}

/// Array.prototype.indexOf
fn array_index_of(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "indexOf")?;
    let needle = args.into_iter().next().unwrap_or_default();
    let position = elements(&array)
        .iter()
        .position(|v| strict_equality_comparison(v, &needle));
    Ok(Value::Number(position.map_or(-1.0, |p| p as f64)))
}

/// Array.prototype.includes
fn array_includes(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "includes")?;
    let needle = args.into_iter().next().unwrap_or_default();
    Ok(Value::Boolean(
        elements(&array).iter().any(|v| same_value(v, &needle)),
    ))
}

/// Array.prototype.join
fn array_join(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "join")?;
    let separator = match args.get(0) {
        None | Some(Value::Undefined) => ",".to_string(),
        Some(v) => to_string(v),
    };
    Ok(Value::String(join_array(&array, &separator)))
}

/// Array.prototype.reverse
fn array_reverse(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> ValueResult {
    let array = this_array(this, "reverse")?;
    let mut items = elements(&array);
    if items.len() > 1 {
        items.reverse();
        array_replace(&array, items)?;
    }
    Ok(this.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(values: &[i32]) -> Value {
        Value::Object(new_array(values.iter().map(|n| Value::from(*n)).collect()))
    }

    fn contents(v: &Value) -> Vec<Value> {
        elements(v.as_object().unwrap())
    }

    #[test]
    fn test_push_pop_shift_unshift() {
        let ctx = EvalContext::new();
        let a = nums(&[1, 2]);
        assert_eq!(array_push(&ctx, &a, vec![Value::from(3)]).unwrap(), Value::from(3));
        assert_eq!(array_pop(&ctx, &a, vec![]).unwrap(), Value::from(3));
        assert_eq!(array_shift(&ctx, &a, vec![]).unwrap(), Value::from(1));
        assert_eq!(
            array_unshift(&ctx, &a, vec![Value::from(0)]).unwrap(),
            Value::from(2)
        );
        assert_eq!(contents(&a), vec![Value::from(0), Value::from(2)]);
        let empty = nums(&[]);
        assert_eq!(array_pop(&ctx, &empty, vec![]).unwrap(), Value::Undefined);
    }

    #[test]
    fn test_slice_and_splice() {
        let ctx = EvalContext::new();
        let a = nums(&[1, 2, 3, 4]);
        let s = array_slice(&ctx, &a, vec![Value::from(1), Value::from(-1)]).unwrap();
        assert_eq!(contents(&s), vec![Value::from(2), Value::from(3)]);

        let removed = array_splice_method(
            &ctx,
            &a,
            vec![Value::from(1), Value::from(2), Value::from(9)],
        )
        .unwrap();
        assert_eq!(contents(&removed), vec![Value::from(2), Value::from(3)]);
        assert_eq!(contents(&a), vec![Value::from(1), Value::from(9), Value::from(4)]);
    }

    #[test]
    fn test_search_and_join() {
        let ctx = EvalContext::new();
        let a = nums(&[1, 2, 3]);
        assert_eq!(
            array_index_of(&ctx, &a, vec![Value::from(3)]).unwrap(),
            Value::from(2)
        );
        assert_eq!(
            array_index_of(&ctx, &a, vec![Value::from("3")]).unwrap(),
            Value::from(-1)
        );
        assert_eq!(
            array_includes(&ctx, &a, vec![Value::from(2)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            array_join(&ctx, &a, vec![Value::from("-")]).unwrap(),
            Value::from("1-2-3")
        );
    }

    #[test]
    fn test_reverse_in_place() {
        let ctx = EvalContext::new();
        let a = nums(&[1, 2, 3]);
        let r = array_reverse(&ctx, &a, vec![]).unwrap();
        assert_eq!(r, a);
        assert_eq!(contents(&a), vec![Value::from(3), Value::from(2), Value::from(1)]);
    }

    #[test]
    fn test_rejects_non_array_this() {
        let ctx = EvalContext::new();
        assert!(array_push(&ctx, &Value::from("x"), vec![]).is_err());
    }
}
