use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::{ObjectRef, ObjectType};
use crate::runner::ds::operations::object::{get, set};
use crate::runner::ds::value::Value;
use crate::runner::observation::subscriber::{Subscriber, SubscriberCollection, SubscriberId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Watches one property of one object.
///
/// Installed in the object's interception slot by the observer locator and
/// notified by `operations::object::set` after every write that changes the
/// value. The object is held weakly; the object owns its observers.
pub struct PropertyObserver {
    object: Weak<RefCell<ObjectType>>,
    property: String,
    current_value: RefCell<Value>,
    supported: bool,
    subscribers: SubscriberCollection,
}

impl PropertyObserver {
    pub(crate) fn new(object: &ObjectRef, property: &str, supported: bool) -> Self {
        PropertyObserver {
            object: Rc::downgrade(object),
            property: property.to_string(),
            current_value: RefCell::new(get(object, property)),
            supported,
            subscribers: SubscriberCollection::new(),
        }
    }

    pub fn property_name(&self) -> &str {
        &self.property
    }

    pub fn object(&self) -> Option<ObjectRef> {
        self.object.upgrade()
    }

    /// `false` for observers handed out for frozen objects; they never fire.
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    pub fn get_value(&self) -> Value {
        match self.object.upgrade() {
            Some(o) => get(&o, &self.property),
            None => self.current_value.borrow().clone(),
        }
    }

    /// Writes through the object so that the write is intercepted like any
    /// other.
    pub fn set_value(&self, value: Value) -> Result<(), BindingError> {
        match self.object.upgrade() {
            Some(o) => set(&o, &self.property, value),
            None => Err(BindingError::unsupported(format!(
                "object owning '{}' no longer exists",
                self.property
            ))),
        }
    }

    pub fn subscribe(&self, id: SubscriberId, subscriber: Weak<dyn Subscriber>) -> bool {
        self.subscribers.add(id, subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn has_subscriber(&self, id: SubscriberId) -> bool {
        self.subscribers.contains(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub(crate) fn notify(&self, new_value: &Value, old_value: &Value) -> Result<(), BindingError> {
        *self.current_value.borrow_mut() = new_value.clone();
        self.subscribers
            .notify(|s| s.handle_change(new_value, old_value))
    }
}
