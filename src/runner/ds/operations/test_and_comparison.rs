use crate::runner::ds::operations::type_conversion::{to_number, to_string};
use crate::runner::ds::value::Value;
use std::cmp::Ordering;
use std::rc::Rc;

/// Change detection equality: objects by identity, `NaN` equals `NaN`,
/// `+0` equals `-0`.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        _ => a == b,
    }
}

/// `===`
pub fn strict_equality_comparison(a: &Value, b: &Value) -> bool {
    a == b
}

/// `==`
pub fn abstract_equality_comparison(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined)
        | (Value::Null, Value::Null)
        | (Value::Undefined, Value::Null)
        | (Value::Null, Value::Undefined) => true,
        (Value::Undefined, _) | (Value::Null, _) | (_, Value::Undefined) | (_, Value::Null) => {
            false
        }
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Object(_), Value::String(_)) | (Value::String(_), Value::Object(_)) => {
            to_string(a) == to_string(b)
        }
        _ => to_number(a) == to_number(b),
    }
}

/// Ordering used by `<`, `>`, `<=`, `>=`. Two strings compare by code point,
/// anything else numerically; `None` when either side is `NaN`.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => to_number(a).partial_cmp(&to_number(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::new_object;

    #[test]
    fn test_same_value_treats_nan_as_equal() {
        assert!(same_value(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
        assert!(same_value(&Value::Number(0.0), &Value::Number(-0.0)));
        assert!(!strict_equality_comparison(
            &Value::Number(f64::NAN),
            &Value::Number(f64::NAN)
        ));
    }

    #[test]
    fn test_objects_compare_by_identity() {
        let a = new_object();
        let b = new_object();
        assert!(same_value(&Value::Object(a.clone()), &Value::Object(a.clone())));
        assert!(!same_value(&Value::Object(a), &Value::Object(b)));
    }

    #[test]
    fn test_abstract_equality() {
        assert!(abstract_equality_comparison(&Value::Null, &Value::Undefined));
        assert!(abstract_equality_comparison(&Value::from("1"), &Value::from(1)));
        assert!(abstract_equality_comparison(&Value::Boolean(true), &Value::from(1)));
        assert!(!abstract_equality_comparison(&Value::Null, &Value::from(0)));
        assert!(!abstract_equality_comparison(&Value::from("a"), &Value::from("b")));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(
            compare_values(&Value::from("10"), &Value::from("9")),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&Value::from(10), &Value::from("9")),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_values(&Value::Undefined, &Value::from(1)), None);
    }
}
