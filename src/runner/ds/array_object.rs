use crate::runner::ds::object::{ModelObject, ObjectBase, ObjectRef, ObjectType};
use crate::runner::ds::value::Value;
use crate::runner::observation::collection_observer::CollectionObserver;
use std::cell::RefCell;
use std::rc::Rc;

pub const ARRAY_LENGTH_PROP: &str = "length";

/// Most `undefined` slots one index or `length` write may add. Arrays are
/// dense, so a write far past the end would otherwise allocate every hole.
pub const MAX_DENSE_GROWTH: usize = 1 << 20;

/// Dense array. Element writes that change identity or length go through
/// `operations::object::array_splice` so observers hear about them.
pub struct ArrayObject {
    base: ObjectBase,
    pub(crate) elements: Vec<Value>,
    collection_observer: Option<Rc<CollectionObserver>>,
}

impl ArrayObject {
    pub fn new(elements: Vec<Value>) -> Self {
        ArrayObject {
            base: ObjectBase::new(),
            elements,
            collection_observer: None,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn collection_observer(&self) -> Option<Rc<CollectionObserver>> {
        self.collection_observer.clone()
    }

    pub fn install_collection_observer(&mut self, observer: Rc<CollectionObserver>) {
        self.collection_observer = Some(observer);
    }
}

impl ModelObject for ArrayObject {
    fn object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn get_own_property(&self, name: &str) -> Option<Value> {
        if name == ARRAY_LENGTH_PROP {
            return Some(Value::Number(self.elements.len() as f64));
        }
        if let Some(index) = array_index(name) {
            return self.elements.get(index).cloned();
        }
        self.base.get(name).cloned()
    }

    fn has_own_property(&self, name: &str) -> bool {
        name == ARRAY_LENGTH_PROP
            || array_index(name).map_or(false, |i| i < self.elements.len())
            || self.base.contains(name)
    }

    fn own_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = (0..self.elements.len()).map(|i| i.to_string()).collect();
        keys.extend(self.base.keys().iter().cloned());
        keys
    }
}

/// Canonical array index: decimal digits without a leading zero.
pub fn array_index(name: &str) -> Option<usize> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if name.len() > 1 && name.starts_with('0') {
        return None;
    }
    name.parse::<usize>().ok()
}

pub fn new_array(elements: Vec<Value>) -> ObjectRef {
    Rc::new(RefCell::new(ObjectType::Array(ArrayObject::new(elements))))
}

/// Snapshot of the elements, `None` when the object is not an array.
pub fn array_elements(object: &ObjectRef) -> Option<Vec<Value>> {
    object.borrow().as_array().map(|a| a.elements.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_index() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("12"), Some(12));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("1.5"), None);
        assert_eq!(array_index("length"), None);
    }

    #[test]
    fn test_length_and_indices_are_own_properties() {
        let a = ArrayObject::new(vec![Value::from(1), Value::from(2)]);
        assert_eq!(a.get_own_property("length"), Some(Value::Number(2.0)));
        assert_eq!(a.get_own_property("1"), Some(Value::Number(2.0)));
        assert_eq!(a.get_own_property("2"), None);
        assert!(a.has_own_property("0"));
        assert!(!a.has_own_property("5"));
        assert_eq!(a.own_keys(), vec!["0".to_string(), "1".to_string()]);
    }
}
