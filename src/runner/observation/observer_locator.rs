use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::ObjectRef;
use crate::runner::observation::collection_observer::CollectionObserver;
use crate::runner::observation::property_observer::PropertyObserver;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Hands out the observer for an (object, property) pair, installing it in
/// the object's interception slot on first request.
#[derive(Default)]
pub struct ObserverLocator {
    installed: Cell<usize>,
}

impl ObserverLocator {
    pub fn new() -> Self {
        ObserverLocator {
            installed: Cell::new(0),
        }
    }

    /// Number of observers this locator has installed.
    pub fn installed_count(&self) -> usize {
        self.installed.get()
    }

    /// Always succeeds. A frozen object gets an observer that never fires.
    pub fn get_observer(&self, object: &ObjectRef, property: &str) -> Rc<PropertyObserver> {
        if let Some(existing) = object
            .borrow()
            .as_model_object()
            .object_base()
            .observer(property)
        {
            return existing;
        }
        let supported = !object.borrow().is_frozen();
        if !supported {
            warn!(property, "property of a frozen object cannot be observed");
        }
        let observer = Rc::new(PropertyObserver::new(object, property, supported));
        object
            .borrow_mut()
            .as_model_object_mut()
            .object_base_mut()
            .install_observer(property, observer.clone());
        self.installed.set(self.installed.get() + 1);
        debug!(property, "installed property observer");
        observer
    }

    /// Like [`get_observer`](Self::get_observer) but refuses properties that
    /// cannot be intercepted.
    pub fn try_get_observer(
        &self,
        object: &ObjectRef,
        property: &str,
    ) -> Result<Rc<PropertyObserver>, BindingError> {
        let observer = self.get_observer(object, property);
        if observer.is_supported() {
            Ok(observer)
        } else {
            Err(BindingError::unsupported(format!(
                "property '{}' belongs to a frozen object",
                property
            )))
        }
    }

    pub fn get_array_observer(
        &self,
        array: &ObjectRef,
    ) -> Result<Rc<CollectionObserver>, BindingError> {
        let existing = match array.borrow().as_array() {
            Some(a) => a.collection_observer(),
            None => {
                return Err(BindingError::unsupported(
                    "collection observation requires an array",
                ))
            }
        };
        if let Some(existing) = existing {
            return Ok(existing);
        }
        let observer = Rc::new(CollectionObserver::new(array));
        if let Some(a) = array.borrow_mut().as_array_mut() {
            a.install_collection_observer(observer.clone());
        }
        self.installed.set(self.installed.get() + 1);
        debug!("installed collection observer");
        Ok(observer)
    }
}
