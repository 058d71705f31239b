use crate::runner::ds::object::{ModelObject, ObjectBase, ObjectRef, ObjectType};
use crate::runner::ds::value::Value;
use crate::runner::eval::types::ValueResult;
use std::cell::RefCell;
use std::rc::Rc;

/// Host function callable from binding expressions. Receives `this` and the
/// evaluated arguments.
pub type NativeFunction = Rc<dyn Fn(&Value, Vec<Value>) -> ValueResult>;

pub struct FunctionObject {
    pub name: String,
    function: NativeFunction,
    base: ObjectBase,
}

impl FunctionObject {
    pub fn new(name: impl Into<String>, function: NativeFunction) -> Self {
        FunctionObject {
            name: name.into(),
            function,
            base: ObjectBase::new(),
        }
    }

    /// Cloned out so the caller can release the object borrow before the
    /// call; the function is free to mutate the model, itself included.
    pub fn callable(&self) -> NativeFunction {
        self.function.clone()
    }
}

impl ModelObject for FunctionObject {
    fn object_base(&self) -> &ObjectBase {
        &self.base
    }

    fn object_base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }
}

pub fn new_function<F>(name: &str, f: F) -> ObjectRef
where
    F: Fn(&Value, Vec<Value>) -> ValueResult + 'static,
{
    Rc::new(RefCell::new(ObjectType::Function(FunctionObject::new(
        name,
        Rc::new(f),
    ))))
}
