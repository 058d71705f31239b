use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::{ObjectRef, ObjectType};
use crate::runner::ds::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Arrays whose elements are being joined right now.
    static JOINING: RefCell<Vec<*const ()>> = RefCell::new(Vec::new());
}

pub const TYPE_STR_UNDEFINED: &str = "undefined";
pub const TYPE_STR_BOOLEAN: &str = "boolean";
pub const TYPE_STR_STRING: &str = "string";
pub const TYPE_STR_NUMBER: &str = "number";
pub const TYPE_STR_OBJECT: &str = "object";
pub const TYPE_STR_FUNCTION: &str = "function";

/// Result of `typeof`.
pub fn get_type(a: &Value) -> &'static str {
    match a {
        Value::Undefined => TYPE_STR_UNDEFINED,
        Value::Null => TYPE_STR_OBJECT,
        Value::Boolean(_) => TYPE_STR_BOOLEAN,
        Value::String(_) => TYPE_STR_STRING,
        Value::Number(_) => TYPE_STR_NUMBER,
        Value::Object(o) => {
            if o.borrow().is_callable() {
                TYPE_STR_FUNCTION
            } else {
                TYPE_STR_OBJECT
            }
        }
    }
}

pub fn to_boolean(v: &Value) -> bool {
    match v {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => !(*n == 0.0 || n.is_nan()),
        Value::Object(_) => true,
    }
}

pub fn to_number(v: &Value) -> f64 {
    match v {
        Value::Undefined => f64::NAN,
        Value::Null => 0.0,
        Value::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Number(n) => *n,
        Value::String(s) => string_to_number(s),
        Value::Object(_) => string_to_number(&to_string(v)),
    }
}

fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if s.starts_with("0x") || s.starts_with("0X") {
        return i64::from_str_radix(&s[2..], 16).map_or(f64::NAN, |n| n as f64);
    }
    // Rust accepts "inf" and "nan", coercion does not.
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return f64::NAN;
    }
    s.parse::<f64>().unwrap_or(f64::NAN)
}

/// Shortest round-trip digits, in exponent form below `1e-6` and from
/// `1e21` up.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };
    // `{:e}` yields the shortest digits as `d.ddde[-]x`
    let exp_form = format!("{:e}", n.abs());
    let (mantissa, exponent) = match exp_form.split_once('e') {
        Some(parts) => parts,
        None => return format!("{}{}", sign, exp_form),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    let body = if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        format!("{}.{}", &digits[..point as usize], &digits[point as usize..])
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let e = point - 1;
        let e = if e < 0 {
            format!("-{}", -e)
        } else {
            format!("+{}", e)
        };
        if k == 1 {
            format!("{}e{}", digits, e)
        } else {
            format!("{}.{}e{}", &digits[..1], &digits[1..], e)
        }
    };
    format!("{}{}", sign, body)
}

/// Joins the elements of `array` with `separator`, rendering `null` and
/// `undefined` as nothing. An array reached again while it is being joined
/// renders as the empty string.
pub fn join_array(array: &ObjectRef, separator: &str) -> String {
    let key = Rc::as_ptr(array) as *const ();
    if JOINING.with(|j| j.borrow().contains(&key)) {
        return String::new();
    }
    let elements = match array.borrow().as_array() {
        Some(a) => a.elements().to_vec(),
        None => return String::new(),
    };
    JOINING.with(|j| j.borrow_mut().push(key));
    let joined = elements
        .iter()
        .map(to_display_string)
        .collect::<Vec<String>>()
        .join(separator);
    JOINING.with(|j| {
        j.borrow_mut().pop();
    });
    joined
}

pub fn to_string(v: &Value) -> String {
    match v {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => number_to_string(*n),
        Value::Object(o) => match &*o.borrow() {
            ObjectType::Array(_) => join_array(o, ","),
            ObjectType::Function(f) => format!("function {}() {{ [native code] }}", f.name),
            ObjectType::Ordinary(_) => "[object Object]".to_string(),
        },
    }
}

/// Like `to_string` but `null` and `undefined` render as nothing; used for
/// interpolation and text content.
pub fn to_display_string(v: &Value) -> String {
    if v.is_nullish() {
        String::new()
    } else {
        to_string(v)
    }
}

/// Property name used for keyed access: `items[1]` and `items['1']` hit the
/// same property.
pub fn to_property_key(v: &Value) -> String {
    to_string(v)
}

/// Validates a value assigned to an array `length`.
pub fn to_array_length(v: &Value) -> Result<usize, BindingError> {
    let n = to_number(v);
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 {
        Ok(n as usize)
    } else {
        Err(BindingError::evaluation(format!(
            "Invalid array length: {}",
            to_string(v)
        )))
    }
}

/// Relative index as taken by `slice`/`splice`: negative counts from the end,
/// then clamped into `0..=len`.
pub fn to_relative_index(v: &Value, len: usize) -> usize {
    let n = to_number(v);
    let n = if n.is_nan() { 0.0 } else { n.trunc() };
    if n < 0.0 {
        let from_end = len as f64 + n;
        if from_end < 0.0 {
            0
        } else {
            from_end as usize
        }
    } else if n > len as f64 {
        len
    } else {
        n as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::array_object::new_array;

    #[test]
    fn test_to_number() {
        assert_eq!(to_number(&Value::from(" 42 ")), 42.0);
        assert_eq!(to_number(&Value::from("")), 0.0);
        assert_eq!(to_number(&Value::from("0x1F")), 31.0);
        assert!(to_number(&Value::from("inf")).is_nan());
        assert!(to_number(&Value::from("12px")).is_nan());
        assert!(to_number(&Value::Undefined).is_nan());
        assert_eq!(to_number(&Value::Null), 0.0);
        assert_eq!(to_number(&Value::Boolean(true)), 1.0);
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.5), "0.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(-12.25), "-12.25");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(123456789012345680000.0), "123456789012345680000");
    }

    #[test]
    fn test_number_to_string_exponent_forms() {
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(1.5e300), "1.5e+300");
        assert_eq!(number_to_string(-2e22), "-2e+22");
        assert_eq!(number_to_string(1e-7), "1e-7");
        assert_eq!(number_to_string(1.25e-7), "1.25e-7");
        assert_eq!(number_to_string(0.000001), "0.000001");
        assert_eq!(number_to_string(0.0000015), "0.0000015");
    }

    #[test]
    fn test_array_to_string_joins_with_commas() {
        let a = Value::Object(new_array(vec![
            Value::from(1),
            Value::Null,
            Value::from("x"),
        ]));
        assert_eq!(to_string(&a), "1,,x");
    }

    #[test]
    fn test_self_containing_array_renders_cycle_as_empty() {
        let inner = new_array(vec![Value::from(1)]);
        let outer = new_array(vec![Value::Object(inner.clone()), Value::from(2)]);
        if let ObjectType::Array(a) = &mut *inner.borrow_mut() {
            a.elements.push(Value::Object(outer.clone()));
        }
        assert_eq!(to_string(&Value::Object(outer.clone())), "1,,2");
        assert_eq!(to_string(&Value::Object(inner)), "1,,2");
        assert_eq!(join_array(&outer, "-"), "1,-2");
    }

    #[test]
    fn test_to_relative_index() {
        assert_eq!(to_relative_index(&Value::from(-1), 4), 3);
        assert_eq!(to_relative_index(&Value::from(-10), 4), 0);
        assert_eq!(to_relative_index(&Value::from(10), 4), 4);
        assert_eq!(to_relative_index(&Value::Undefined, 4), 0);
    }
}
