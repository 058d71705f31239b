use crate::runner::ds::array_object::ArrayObject;
use crate::runner::ds::function_object::FunctionObject;
use crate::runner::ds::value::Value;
use crate::runner::observation::property_observer::PropertyObserver;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub type ObjectRef = Rc<RefCell<ObjectType>>;

pub enum ObjectType {
    Ordinary(OrdinaryObject),
    Function(FunctionObject),
    Array(ArrayObject),
}

impl ObjectType {
    pub fn is_callable(&self) -> bool {
        matches!(self, ObjectType::Function(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ObjectType::Array(_))
    }

    pub fn as_model_object(&self) -> &dyn ModelObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::Array(o) => o,
        }
    }

    pub fn as_model_object_mut(&mut self) -> &mut dyn ModelObject {
        match self {
            ObjectType::Ordinary(o) => o,
            ObjectType::Function(o) => o,
            ObjectType::Array(o) => o,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.as_model_object().object_base().frozen
    }

    pub fn as_array(&self) -> Option<&ArrayObject> {
        match self {
            ObjectType::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayObject> {
        match self {
            ObjectType::Array(a) => Some(a),
            _ => None,
        }
    }
}

/// Own properties plus the interception slots installed by the observer
/// locator. A slot, once installed, stays for the lifetime of the object so
/// repeated lookups hand back the same observer.
pub struct ObjectBase {
    properties: HashMap<String, Value>,
    keys: Vec<String>,
    frozen: bool,
    observers: HashMap<String, Rc<PropertyObserver>>,
}

impl ObjectBase {
    pub fn new() -> Self {
        ObjectBase {
            properties: HashMap::new(),
            keys: Vec::new(),
            frozen: false,
            observers: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Stores the value and hands back what was there before.
    pub fn put(&mut self, name: &str, value: Value) -> Value {
        match self.properties.insert(name.to_string(), value) {
            Some(old) => old,
            None => {
                self.keys.push(name.to_string());
                Value::Undefined
            }
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn observer(&self, name: &str) -> Option<Rc<PropertyObserver>> {
        self.observers.get(name).cloned()
    }

    pub fn install_observer(&mut self, name: &str, observer: Rc<PropertyObserver>) {
        self.observers.insert(name.to_string(), observer);
    }

    pub fn observers(&self) -> impl Iterator<Item = (&String, &Rc<PropertyObserver>)> {
        self.observers.iter()
    }
}

impl Default for ObjectBase {
    fn default() -> Self {
        Self::new()
    }
}

pub trait ModelObject {
    fn object_base(&self) -> &ObjectBase;

    fn object_base_mut(&mut self) -> &mut ObjectBase;

    fn get_own_property(&self, name: &str) -> Option<Value> {
        self.object_base().get(name).cloned()
    }

    fn has_own_property(&self, name: &str) -> bool {
        self.object_base().contains(name)
    }

    fn own_keys(&self) -> Vec<String> {
        self.object_base().keys().to_vec()
    }
}

pub struct OrdinaryObject {
    base: ObjectBase,
}

impl OrdinaryObject {
    pub fn new() -> Self {
        OrdinaryObject {
            base: ObjectBase::new(),
        }
    }
}

impl Default for OrdinaryObject {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelObject for OrdinaryObject {
    fn object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

pub fn new_object() -> ObjectRef {
    Rc::new(RefCell::new(ObjectType::Ordinary(OrdinaryObject::new())))
}

/// Builds a plain object from `(name, value)` pairs, keeping their order.
pub fn object_from(entries: Vec<(&str, Value)>) -> ObjectRef {
    let mut o = OrdinaryObject::new();
    for (name, value) in entries {
        o.base.put(name, value);
    }
    Rc::new(RefCell::new(ObjectType::Ordinary(o)))
}
