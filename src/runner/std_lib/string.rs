//! String built-in.

use crate::runner::ds::error::BindingError;
use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::Value;
use crate::runner::eval::types::ValueResult;
use crate::runner::plugin::registry::ResourceRegistry;
use crate::runner::plugin::types::{BuiltInObject, EvalContext};

/// Register the String built-in with the registry.
pub fn register(registry: &mut ResourceRegistry) {
    let string = BuiltInObject::new("String")
        .add_method("toUpperCase", string_to_upper_case)
        .add_method("toLowerCase", string_to_lower_case)
        .add_method("trim", string_trim)
        .add_method("includes", string_includes)
        .add_method("indexOf", string_index_of);

    registry.register_object(string);
}

fn this_str<'a>(this: &'a Value, method: &str) -> Result<&'a str, BindingError> {
    this.as_str().ok_or_else(|| {
        BindingError::evaluation(format!(
            "String.prototype.{} called on a non-string",
            method
        ))
    })
}

fn search_arg(args: &[Value]) -> String {
    args.get(0).map_or_else(|| "undefined".to_string(), to_string)
}

/// String.prototype.toUpperCase
fn string_to_upper_case(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> ValueResult {
    Ok(Value::String(this_str(this, "toUpperCase")?.to_uppercase()))
}

/// String.prototype.toLowerCase
fn string_to_lower_case(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> ValueResult {
    Ok(Value::String(this_str(this, "toLowerCase")?.to_lowercase()))
}

/// String.prototype.trim
fn string_trim(_ctx: &EvalContext, this: &Value, _args: Vec<Value>) -> ValueResult {
    Ok(Value::String(this_str(this, "trim")?.trim().to_string()))
}

/// String.prototype.includes
fn string_includes(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let s = this_str(this, "includes")?;
    let from = args.get(1).map_or(0.0, to_number);
    let from = if from.is_nan() || from < 0.0 { 0 } else { from as usize };
    let rest: String = s.chars().skip(from).collect();
    Ok(Value::Boolean(rest.contains(search_arg(&args).as_str())))
}

/// String.prototype.indexOf; positions count characters.
fn string_index_of(_ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
    let s = this_str(this, "indexOf")?;
    let index = s
        .find(search_arg(&args).as_str())
        .map_or(-1.0, |byte| s[..byte].chars().count() as f64);
    Ok(Value::Number(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_and_trim() {
        let ctx = EvalContext::new();
        let s = Value::from("  Hello ");
        assert_eq!(
            string_to_upper_case(&ctx, &s, vec![]).unwrap(),
            Value::from("  HELLO ")
        );
        assert_eq!(string_trim(&ctx, &s, vec![]).unwrap(), Value::from("Hello"));
    }

    #[test]
    fn test_search() {
        let ctx = EvalContext::new();
        let s = Value::from("héllo world");
        assert_eq!(
            string_index_of(&ctx, &s, vec![Value::from("world")]).unwrap(),
            Value::from(6)
        );
        assert_eq!(
            string_includes(&ctx, &s, vec![Value::from("llo")]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            string_includes(&ctx, &s, vec![Value::from("h"), Value::from(1)]).unwrap(),
            Value::Boolean(false)
        );
    }
}
