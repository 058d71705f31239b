//! Registry for built-in methods and value converters.

use std::collections::HashMap;
use std::rc::Rc;

use super::types::{BuiltInFn, BuiltInObject, EvalContext, ValueConverter};
use crate::runner::ds::error::BindingError;
use crate::runner::ds::value::Value;
use crate::runner::eval::types::ValueResult;
use crate::runner::std_lib::register_core_builtins;

/// Resources an expression can reach by name: methods of built-in value
/// kinds and the converters used by `expr | name`.
pub struct ResourceRegistry {
    /// All registered built-in objects.
    objects: HashMap<String, BuiltInObject>,

    /// Value converters by name.
    converters: HashMap<String, Rc<dyn ValueConverter>>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ResourceRegistry {
            objects: HashMap::new(),
            converters: HashMap::new(),
        }
    }

    /// Create a registry with the `Array` and `String` methods.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        register_core_builtins(&mut registry);
        registry
    }

    pub fn register_object(&mut self, obj: BuiltInObject) {
        self.objects.insert(obj.name.clone(), obj);
    }

    pub fn get_object(&self, name: &str) -> Option<&BuiltInObject> {
        self.objects.get(name)
    }

    /// Replaces (or adds) one method of a registered object.
    pub fn override_method(
        &mut self,
        object: &str,
        method: &str,
        func: Rc<dyn Fn(&EvalContext, &Value, Vec<Value>) -> ValueResult>,
    ) -> Result<(), BindingError> {
        let obj = self.objects.get_mut(object).ok_or_else(|| {
            BindingError::configuration(format!("no built-in object named '{}'", object))
        })?;
        obj.methods
            .insert(method.to_string(), BuiltInFn::Plugin(func));
        Ok(())
    }

    pub fn get_method(&self, object: &str, method: &str) -> Option<&BuiltInFn> {
        self.objects
            .get(object)
            .and_then(|obj| obj.methods.get(method))
    }

    pub fn has_method(&self, object: &str, method: &str) -> bool {
        self.get_method(object, method).is_some()
    }

    pub fn register_converter(&mut self, name: &str, converter: Rc<dyn ValueConverter>) {
        self.converters.insert(name.to_string(), converter);
    }

    pub fn get_converter(&self, name: &str) -> Option<Rc<dyn ValueConverter>> {
        self.converters.get(name).cloned()
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
