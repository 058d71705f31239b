use crate::runner::ds::error::BindingError;
use crate::runner::ds::value::Value;
use crate::runner::observation::collection_observer::Splice;
use std::cell::{Cell, RefCell};
use std::rc::Weak;

pub type SubscriberId = u64;

thread_local! {
    static NEXT_SUBSCRIBER_ID: Cell<SubscriberId> = Cell::new(1);
}

/// Ids are unique per thread; observers and subscribers never cross threads.
pub fn next_subscriber_id() -> SubscriberId {
    NEXT_SUBSCRIBER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

/// Receives change notifications from observers.
pub trait Subscriber {
    fn subscriber_id(&self) -> SubscriberId;

    fn handle_change(&self, new_value: &Value, old_value: &Value) -> Result<(), BindingError>;

    fn handle_collection_change(&self, splices: &[Splice]) -> Result<(), BindingError> {
        let _ = splices;
        Ok(())
    }
}

/// Subscribers of one observer, held weakly: an observer never keeps a
/// binding alive.
#[derive(Default)]
pub struct SubscriberCollection {
    entries: RefCell<Vec<(SubscriberId, Weak<dyn Subscriber>)>>,
}

impl SubscriberCollection {
    pub fn new() -> Self {
        SubscriberCollection {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Adds the subscriber unless it is already present.
    pub fn add(&self, id: SubscriberId, subscriber: Weak<dyn Subscriber>) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.iter().any(|(i, _)| *i == id) {
            return false;
        }
        entries.push((id, subscriber));
        true
    }

    pub fn remove(&self, id: SubscriberId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|(i, _)| *i != id);
        before != entries.len()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries.borrow().iter().any(|(i, _)| *i == id)
    }

    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|(_, s)| s.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Calls `f` for every subscriber present when notification starts.
    ///
    /// Subscribers removed by an earlier callback are skipped; ones added
    /// during the pass wait for the next change. Every subscriber is called
    /// even if some fail, and the first failure is returned.
    pub fn notify<F>(&self, f: F) -> Result<(), BindingError>
    where
        F: Fn(&dyn Subscriber) -> Result<(), BindingError>,
    {
        let snapshot: Vec<(SubscriberId, Weak<dyn Subscriber>)> = self.entries.borrow().clone();
        let mut first_error = None;
        for (id, weak) in snapshot {
            if !self.contains(id) {
                continue;
            }
            match weak.upgrade() {
                Some(subscriber) => {
                    if let Err(e) = f(&*subscriber) {
                        tracing::trace!(subscriber = id, error = %e, "subscriber failed");
                        first_error.get_or_insert(e);
                    }
                }
                None => {
                    self.remove(id);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct Counter {
        id: SubscriberId,
        calls: Cell<usize>,
    }

    impl Subscriber for Counter {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn handle_change(&self, _: &Value, _: &Value) -> Result<(), BindingError> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    fn counter() -> Rc<Counter> {
        Rc::new(Counter {
            id: next_subscriber_id(),
            calls: Cell::new(0),
        })
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let ids: Vec<SubscriberId> = (0..3).map(|_| next_subscriber_id()).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_add_is_idempotent() {
        let c = counter();
        let weak: Weak<dyn Subscriber> = Rc::downgrade(&c) as Weak<dyn Subscriber>;
        let subscribers = SubscriberCollection::new();
        assert!(subscribers.add(c.id, weak.clone()));
        assert!(!subscribers.add(c.id, weak));
        assert_eq!(subscribers.len(), 1);
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let subscribers = SubscriberCollection::new();
        let c = counter();
        let id = c.id;
        subscribers.add(id, Rc::downgrade(&c) as Weak<dyn Subscriber>);
        drop(c);
        assert_eq!(subscribers.len(), 0);
        assert!(subscribers.contains(id));
        subscribers
            .notify(|s| s.handle_change(&Value::Undefined, &Value::Undefined))
            .unwrap();
        assert!(!subscribers.contains(id));
    }

    #[test]
    fn test_notify_reaches_every_subscriber() {
        let subscribers = SubscriberCollection::new();
        let a = counter();
        let b = counter();
        subscribers.add(a.id, Rc::downgrade(&a) as Weak<dyn Subscriber>);
        subscribers.add(b.id, Rc::downgrade(&b) as Weak<dyn Subscriber>);
        subscribers
            .notify(|s| s.handle_change(&Value::Undefined, &Value::Null))
            .unwrap();
        assert_eq!(a.calls.get(), 1);
        assert_eq!(b.calls.get(), 1);
    }
}
