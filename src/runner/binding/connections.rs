use crate::runner::eval::types::DependencySet;
use crate::runner::observation::subscriber::{Subscriber, SubscriberId};
use std::cell::RefCell;
use std::rc::Weak;

/// The observers one subscriber is currently attached to.
///
/// After each connect pass the whole set is replaced: the new observers are
/// subscribed before the old ones that did not survive are dropped, so an
/// observer read by both passes never loses the subscriber in between.
pub struct Connections {
    id: SubscriberId,
    current: RefCell<DependencySet>,
}

impl Connections {
    pub fn new(id: SubscriberId) -> Self {
        Connections {
            id,
            current: RefCell::new(DependencySet::new()),
        }
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    pub fn replace(&self, next: DependencySet, subscriber: &Weak<dyn Subscriber>) {
        self.subscribe_all(&next, subscriber);
        let previous = self.current.replace(next);
        let (stale_properties, stale_collections) = {
            let current = self.current.borrow();
            (
                previous
                    .properties()
                    .iter()
                    .filter(|o| !current.contains_property(o))
                    .cloned()
                    .collect::<Vec<_>>(),
                previous
                    .collections()
                    .iter()
                    .filter(|o| !current.contains_collection(o))
                    .cloned()
                    .collect::<Vec<_>>(),
            )
        };
        for o in stale_properties {
            o.unsubscribe(self.id);
        }
        for o in stale_collections {
            o.unsubscribe(self.id);
        }
    }

    /// Adds to the current set without dropping anything. Used when an
    /// evaluation fails half way, so the binding still hears about the
    /// change that may fix it.
    pub fn merge(&self, extra: DependencySet, subscriber: &Weak<dyn Subscriber>) {
        self.subscribe_all(&extra, subscriber);
        self.current.borrow_mut().merge(extra);
    }

    pub fn clear(&self) {
        let previous = self.current.replace(DependencySet::new());
        for o in previous.properties() {
            o.unsubscribe(self.id);
        }
        for o in previous.collections() {
            o.unsubscribe(self.id);
        }
    }

    pub fn snapshot(&self) -> DependencySet {
        self.current.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.current.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.borrow().is_empty()
    }

    fn subscribe_all(&self, deps: &DependencySet, subscriber: &Weak<dyn Subscriber>) {
        for o in deps.properties() {
            o.subscribe(self.id, subscriber.clone());
        }
        for o in deps.collections() {
            o.subscribe(self.id, subscriber.clone());
        }
    }
}
