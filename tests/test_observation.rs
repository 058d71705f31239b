//! Tests for property and collection observation.

extern crate bindery;


use binding_util::*;
use bindery::runner::ds::array_object::new_array;
use bindery::runner::ds::error::BindingError;
use bindery::runner::ds::operations::object::{array_push, freeze, set};
use bindery::runner::ds::value::Value;
use bindery::runner::observation::collection_observer::Splice;
use bindery::runner::observation::observer_locator::ObserverLocator;
use bindery::runner::observation::subscriber::{next_subscriber_id, Subscriber, SubscriberId};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

// ============================================================================
// Property observers
// ============================================================================

#[test]
fn test_observer_identity() {
    let locator = ObserverLocator::new();
    let m = model(vec![("a", Value::from(1))]);
    let first = locator.get_observer(&m, "a");
    let second = locator.get_observer(&m, "a");
    assert!(Rc::ptr_eq(&first, &second));
    assert!(!Rc::ptr_eq(&first, &locator.get_observer(&m, "b")));
    assert_eq!(locator.installed_count(), 2);

    // a second locator finds the observer already installed on the object
    let other = ObserverLocator::new();
    assert!(Rc::ptr_eq(&first, &other.get_observer(&m, "a")));
}

#[test]
fn test_external_writes_are_intercepted() {
    let locator = ObserverLocator::new();
    let m = model(vec![("a", Value::from(1))]);
    let recorder = Recorder::new();
    recorder.subscribe_to(&locator.get_observer(&m, "a"));

    put(&m, "a", Value::from(2));
    put(&m, "a", Value::from(2));
    put(&m, "other", Value::from(9));

    assert_eq!(
        *recorder.changes.borrow(),
        vec![(Value::from(2), Value::from(1))]
    );
}

#[test]
fn test_observer_set_value_notifies() {
    let locator = ObserverLocator::new();
    let m = model(vec![]);
    let observer = locator.get_observer(&m, "a");
    let recorder = Recorder::new();
    recorder.subscribe_to(&observer);

    observer.set_value(Value::from("x")).unwrap();
    assert_eq!(prop(&m, "a"), Value::from("x"));
    assert_eq!(observer.get_value(), Value::from("x"));
    assert_eq!(
        *recorder.changes.borrow(),
        vec![(Value::from("x"), Value::Undefined)]
    );
}

#[test]
fn test_failing_subscriber_does_not_block_siblings() {
    let locator = ObserverLocator::new();
    let m = model(vec![("a", Value::from(1))]);
    let observer = locator.get_observer(&m, "a");
    let failing = Recorder::with_failure(true);
    let healthy = Recorder::new();
    failing.subscribe_to(&observer);
    healthy.subscribe_to(&observer);

    let result = set(&m, "a", Value::from(2));
    assert!(matches!(result, Err(BindingError::EvaluationError(_))));
    assert_eq!(failing.count(), 1);
    assert_eq!(healthy.count(), 1);
    assert_eq!(prop(&m, "a"), Value::from(2));
}

#[test]
fn test_dropped_subscribers_are_skipped() {
    let locator = ObserverLocator::new();
    let m = model(vec![("a", Value::from(1))]);
    let observer = locator.get_observer(&m, "a");
    {
        let temporary = Recorder::new();
        temporary.subscribe_to(&observer);
        assert_eq!(observer.subscriber_count(), 1);
    }
    put(&m, "a", Value::from(2));
    assert_eq!(observer.subscriber_count(), 0);
}

/// Unsubscribes a sibling the first time it is notified.
struct Unsubscriber {
    id: SubscriberId,
    victim: SubscriberId,
    observer: RefCell<Option<Rc<bindery::runner::observation::property_observer::PropertyObserver>>>,
}

impl Subscriber for Unsubscriber {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn handle_change(&self, _: &Value, _: &Value) -> Result<(), BindingError> {
        if let Some(o) = self.observer.borrow_mut().take() {
            o.unsubscribe(self.victim);
        }
        Ok(())
    }
}

#[test]
fn test_unsubscribe_during_notification() {
    let locator = ObserverLocator::new();
    let m = model(vec![("a", Value::from(1))]);
    let observer = locator.get_observer(&m, "a");
    let victim = Recorder::new();
    let remover = Rc::new(Unsubscriber {
        id: next_subscriber_id(),
        victim: victim.id,
        observer: RefCell::new(Some(observer.clone())),
    });
    let weak: Weak<dyn Subscriber> = Rc::downgrade(&remover) as Weak<dyn Subscriber>;
    observer.subscribe(remover.id, weak);
    victim.subscribe_to(&observer);

    put(&m, "a", Value::from(2));
    assert_eq!(victim.count(), 0);
    assert!(!observer.has_subscriber(victim.id));
    assert!(observer.has_subscriber(remover.id));
}

#[test]
fn test_frozen_objects_degrade() {
    let locator = ObserverLocator::new();
    let m = model(vec![("a", Value::from(1))]);
    freeze(&m);
    let observer = locator.get_observer(&m, "a");
    assert!(!observer.is_supported());
    assert!(matches!(
        locator.try_get_observer(&m, "a"),
        Err(BindingError::ObservationUnsupported(_))
    ));
}

// ============================================================================
// Arrays
// ============================================================================

struct SpliceRecorder {
    id: SubscriberId,
    splices: RefCell<Vec<Splice>>,
}

impl Subscriber for SpliceRecorder {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn handle_change(&self, _: &Value, _: &Value) -> Result<(), BindingError> {
        Ok(())
    }

    fn handle_collection_change(&self, splices: &[Splice]) -> Result<(), BindingError> {
        self.splices.borrow_mut().extend_from_slice(splices);
        Ok(())
    }
}

#[test]
fn test_array_mutation_notifies_index_length_and_collection() {
    let locator = ObserverLocator::new();
    let items = new_array(vec![Value::from(1), Value::from(2)]);
    let index_recorder = Recorder::new();
    let length_recorder = Recorder::new();
    index_recorder.subscribe_to(&locator.get_observer(&items, "2"));
    length_recorder.subscribe_to(&locator.get_observer(&items, "length"));

    let collection = locator.get_array_observer(&items).unwrap();
    let splices = Rc::new(SpliceRecorder {
        id: next_subscriber_id(),
        splices: RefCell::new(vec![]),
    });
    let weak: Weak<dyn Subscriber> = Rc::downgrade(&splices) as Weak<dyn Subscriber>;
    collection.subscribe(splices.id, weak);

    array_push(&items, vec![Value::from(3)]).unwrap();

    assert_eq!(
        *index_recorder.changes.borrow(),
        vec![(Value::from(3), Value::Undefined)]
    );
    assert_eq!(
        *length_recorder.changes.borrow(),
        vec![(Value::from(3), Value::from(2))]
    );
    assert_eq!(
        *splices.splices.borrow(),
        vec![Splice {
            index: 2,
            removed: vec![],
            added_count: 1
        }]
    );
}

#[test]
fn test_index_write_notifies_only_that_index() {
    let locator = ObserverLocator::new();
    let items = new_array(vec![Value::from(1), Value::from(2)]);
    let zero = Recorder::new();
    let one = Recorder::new();
    zero.subscribe_to(&locator.get_observer(&items, "0"));
    one.subscribe_to(&locator.get_observer(&items, "1"));

    put(&items, "1", Value::from(0));

    assert_eq!(zero.count(), 0);
    assert_eq!(
        *one.changes.borrow(),
        vec![(Value::from(0), Value::from(2))]
    );
}

#[test]
fn test_array_observer_requires_array() {
    let locator = ObserverLocator::new();
    assert!(matches!(
        locator.get_array_observer(&model(vec![])),
        Err(BindingError::ObservationUnsupported(_))
    ));
}
