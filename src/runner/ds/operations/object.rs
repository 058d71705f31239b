//! Reads and writes on model objects.
//!
//! Every write goes through here: the new value is stored under a short
//! borrow, the borrow is released, and only then are the installed observers
//! notified, so subscribers are free to read or write the same object.

use crate::runner::ds::array_object::{array_index, ARRAY_LENGTH_PROP, MAX_DENSE_GROWTH};
use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::{ModelObject, ObjectRef, ObjectType};
use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::operations::type_conversion::{get_type, to_array_length, to_string};
use crate::runner::ds::value::Value;
use crate::runner::eval::types::ValueResult;
use crate::runner::observation::collection_observer::Splice;
use crate::runner::observation::property_observer::PropertyObserver;
use std::rc::Rc;

pub fn get(o: &ObjectRef, name: &str) -> Value {
    o.borrow()
        .as_model_object()
        .get_own_property(name)
        .unwrap_or(Value::Undefined)
}

/// Member read on an arbitrary value. Reading from `null`/`undefined` is an
/// error; other primitives expose `length` and indices on strings only.
pub fn get_v(v: &Value, name: &str) -> ValueResult {
    match v {
        Value::Undefined | Value::Null => Err(BindingError::evaluation(format!(
            "Cannot read property '{}' of {}",
            name,
            to_string(v)
        ))),
        Value::Object(o) => Ok(get(o, name)),
        Value::String(s) => {
            if name == ARRAY_LENGTH_PROP {
                Ok(Value::Number(s.chars().count() as f64))
            } else if let Some(i) = array_index(name) {
                Ok(s.chars()
                    .nth(i)
                    .map_or(Value::Undefined, |c| Value::String(c.to_string())))
            } else {
                Ok(Value::Undefined)
            }
        }
        _ => Ok(Value::Undefined),
    }
}

pub fn has_property(o: &ObjectRef, name: &str) -> bool {
    o.borrow().as_model_object().has_own_property(name)
}

pub fn own_keys(o: &ObjectRef) -> Vec<String> {
    o.borrow().as_model_object().own_keys()
}

pub fn freeze(o: &ObjectRef) {
    o.borrow_mut().as_model_object_mut().object_base_mut().freeze();
}

pub fn is_frozen(o: &ObjectRef) -> bool {
    o.borrow().is_frozen()
}

fn frozen_error(name: &str) -> BindingError {
    BindingError::evaluation(format!(
        "Cannot assign to property '{}' of a frozen object",
        name
    ))
}

/// Writes a property and notifies its observer when the value changed.
pub fn set(o: &ObjectRef, name: &str, value: Value) -> Result<(), BindingError> {
    if o.borrow().is_array() {
        if name == ARRAY_LENGTH_PROP {
            return array_set_length(o, to_array_length(&value)?);
        }
        if let Some(index) = array_index(name) {
            return array_set_index(o, index, value);
        }
    }
    let (old, observer) = {
        let mut object = o.borrow_mut();
        if object.is_frozen() {
            return Err(frozen_error(name));
        }
        let base = object.as_model_object_mut().object_base_mut();
        let old = base.put(name, value.clone());
        (old, base.observer(name))
    };
    match observer {
        Some(observer) if !same_value(&old, &value) => observer.notify(&value, &old),
        _ => Ok(()),
    }
}

pub fn call(function: &Value, this: &Value, args: Vec<Value>) -> ValueResult {
    let callable = match function {
        Value::Object(o) => match &*o.borrow() {
            ObjectType::Function(f) => Some(f.callable()),
            _ => None,
        },
        _ => None,
    };
    match callable {
        Some(f) => f(this, args),
        None => Err(BindingError::evaluation(format!(
            "{} is not a function",
            get_type(function)
        ))),
    }
}

pub fn array_len(o: &ObjectRef) -> Result<usize, BindingError> {
    o.borrow()
        .as_array()
        .map(|a| a.len())
        .ok_or_else(|| BindingError::evaluation("Expected an array"))
}

pub fn array_set_index(o: &ObjectRef, index: usize, value: Value) -> Result<(), BindingError> {
    let len = array_len(o)?;
    if index < len {
        let current = get(o, &index.to_string());
        if same_value(&current, &value) && !is_frozen(o) {
            return Ok(());
        }
        array_splice(o, index, 1, vec![value]).map(|_| ())
    } else {
        check_growth(len, index)?;
        let mut items = vec![Value::Undefined; index - len];
        items.push(value);
        array_splice(o, len, 0, items).map(|_| ())
    }
}

pub fn array_set_length(o: &ObjectRef, new_len: usize) -> Result<(), BindingError> {
    let len = array_len(o)?;
    if new_len < len {
        array_splice(o, new_len, len - new_len, vec![]).map(|_| ())
    } else if new_len > len {
        check_growth(len, new_len)?;
        array_splice(o, len, 0, vec![Value::Undefined; new_len - len]).map(|_| ())
    } else {
        Ok(())
    }
}

fn check_growth(len: usize, target: usize) -> Result<(), BindingError> {
    if target - len > MAX_DENSE_GROWTH {
        return Err(BindingError::evaluation(format!(
            "Cannot grow array from {} to {} elements",
            len, target
        )));
    }
    Ok(())
}

/// Removes `delete_count` elements at `start` and inserts `items` there,
/// returning the removed elements.
///
/// Observers of shifted indices and of `length` are notified first, then the
/// collection observer receives one splice record. All of them are notified
/// even when one fails; the first failure is returned.
pub fn array_splice(
    o: &ObjectRef,
    start: usize,
    delete_count: usize,
    items: Vec<Value>,
) -> Result<Vec<Value>, BindingError> {
    let added_count = items.len();
    let (removed, changes, collection, start) = {
        let mut object = o.borrow_mut();
        if object.is_frozen() {
            return Err(frozen_error(ARRAY_LENGTH_PROP));
        }
        let array = object
            .as_array_mut()
            .ok_or_else(|| BindingError::evaluation("splice called on a non-array"))?;
        let old_len = array.elements.len();
        let start = start.min(old_len);
        let delete_count = delete_count.min(old_len - start);
        if delete_count == 0 && added_count == 0 {
            return Ok(vec![]);
        }
        let old_tail: Vec<Value> = array.elements[start..].to_vec();
        let removed: Vec<Value> = array
            .elements
            .splice(start..start + delete_count, items)
            .collect();
        let new_len = array.elements.len();

        let mut changes: Vec<(usize, Rc<PropertyObserver>, Value, Value)> = vec![];
        for (name, observer) in array.object_base().observers() {
            if name == ARRAY_LENGTH_PROP {
                if old_len != new_len {
                    changes.push((
                        usize::MAX,
                        observer.clone(),
                        Value::Number(new_len as f64),
                        Value::Number(old_len as f64),
                    ));
                }
            } else if let Some(i) = array_index(name) {
                if i >= start {
                    let old = old_tail.get(i - start).cloned().unwrap_or_default();
                    let new = array.elements.get(i).cloned().unwrap_or_default();
                    if !same_value(&old, &new) {
                        changes.push((i, observer.clone(), new, old));
                    }
                }
            }
        }
        changes.sort_by_key(|c| c.0);
        (removed, changes, array.collection_observer(), start)
    };

    let mut first_error = None;
    for (_, observer, new, old) in changes {
        if let Err(e) = observer.notify(&new, &old) {
            first_error.get_or_insert(e);
        }
    }
    if let Some(collection) = collection {
        let splice = Splice {
            index: start,
            removed: removed.clone(),
            added_count,
        };
        if let Err(e) = collection.notify(&[splice]) {
            first_error.get_or_insert(e);
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(removed),
    }
}

pub fn array_push(o: &ObjectRef, items: Vec<Value>) -> Result<usize, BindingError> {
    let len = array_len(o)?;
    let added = items.len();
    array_splice(o, len, 0, items)?;
    Ok(len + added)
}

/// Replaces the whole content; one splice record covering everything.
pub fn array_replace(o: &ObjectRef, items: Vec<Value>) -> Result<(), BindingError> {
    let len = array_len(o)?;
    array_splice(o, 0, len, items).map(|_| ())
}
