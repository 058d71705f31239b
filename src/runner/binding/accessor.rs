use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::ObjectRef;
use crate::runner::ds::operations::object::{get, set};
use crate::runner::ds::value::Value;
use crate::runner::observation::observer_locator::ObserverLocator;
use crate::runner::observation::property_observer::PropertyObserver;
use std::rc::Rc;

/// The target side of a property binding. Implemented by whatever adapter
/// owns the rendered thing; [`PropertyAccessor`] targets a plain object.
pub trait TargetAccessor {
    fn get_value(&self) -> Value;

    fn set_value(&self, value: Value) -> Result<(), BindingError>;

    /// Observer reporting target-originated changes, if the target has one.
    fn observer(&self, locator: &ObserverLocator) -> Option<Rc<PropertyObserver>>;

    fn describe(&self) -> String;
}

pub struct PropertyAccessor {
    object: ObjectRef,
    property: String,
}

impl PropertyAccessor {
    pub fn new(object: &ObjectRef, property: &str) -> Self {
        PropertyAccessor {
            object: object.clone(),
            property: property.to_string(),
        }
    }

    pub fn object(&self) -> &ObjectRef {
        &self.object
    }
}

impl TargetAccessor for PropertyAccessor {
    fn get_value(&self) -> Value {
        get(&self.object, &self.property)
    }

    fn set_value(&self, value: Value) -> Result<(), BindingError> {
        set(&self.object, &self.property, value)
    }

    fn observer(&self, locator: &ObserverLocator) -> Option<Rc<PropertyObserver>> {
        Some(locator.get_observer(&self.object, &self.property))
    }

    fn describe(&self) -> String {
        self.property.clone()
    }
}
