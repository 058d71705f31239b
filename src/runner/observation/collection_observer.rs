use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::{ObjectRef, ObjectType};
use crate::runner::ds::value::Value;
use crate::runner::observation::subscriber::{Subscriber, SubscriberCollection, SubscriberId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// One in-place array mutation: `removed` left at `index`, then
/// `added_count` elements were inserted there.
#[derive(Debug, Clone, PartialEq)]
pub struct Splice {
    pub index: usize,
    pub removed: Vec<Value>,
    pub added_count: usize,
}

/// Reports in-place mutations of one array (push, splice, index and length
/// writes).
pub struct CollectionObserver {
    array: Weak<RefCell<ObjectType>>,
    subscribers: SubscriberCollection,
}

impl CollectionObserver {
    pub(crate) fn new(array: &ObjectRef) -> Self {
        CollectionObserver {
            array: Rc::downgrade(array),
            subscribers: SubscriberCollection::new(),
        }
    }

    pub fn array(&self) -> Option<ObjectRef> {
        self.array.upgrade()
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

    pub(crate) fn notify(&self, splices: &[Splice]) -> Result<(), BindingError> {
        self.subscribers
            .notify(|s| s.handle_collection_change(splices))
    }
}
