//! Core types for the evaluation engine.

use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::ObjectRef;
use crate::runner::ds::value::Value;
use crate::runner::observation::collection_observer::CollectionObserver;
use crate::runner::observation::property_observer::PropertyObserver;
use std::rc::Rc;

pub type ValueResult = Result<Value, BindingError>;

/// How the evaluator walks an expression.
///
/// Connect performs exactly the same traversal as Evaluate and additionally
/// records the observer of every property it reads, so branches that are not
/// taken never end up in the dependency set.
pub enum EvalMode<'a> {
    Evaluate,
    Connect(&'a mut DependencySet),
}

impl<'a> EvalMode<'a> {
    pub fn is_connect(&self) -> bool {
        matches!(self, EvalMode::Connect(_))
    }
}

/// Observers read by one evaluation, without duplicates.
#[derive(Default, Clone)]
pub struct DependencySet {
    properties: Vec<Rc<PropertyObserver>>,
    collections: Vec<Rc<CollectionObserver>>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_property(&mut self, observer: Rc<PropertyObserver>) {
        if !self.contains_property(&observer) {
            self.properties.push(observer);
        }
    }

    pub fn add_collection(&mut self, observer: Rc<CollectionObserver>) {
        if !self.contains_collection(&observer) {
            self.collections.push(observer);
        }
    }

    pub fn contains_property(&self, observer: &Rc<PropertyObserver>) -> bool {
        self.properties.iter().any(|o| Rc::ptr_eq(o, observer))
    }

    pub fn contains_collection(&self, observer: &Rc<CollectionObserver>) -> bool {
        self.collections.iter().any(|o| Rc::ptr_eq(o, observer))
    }

    /// Whether `property` of `object` was read.
    pub fn reads(&self, object: &ObjectRef, property: &str) -> bool {
        self.properties.iter().any(|o| {
            o.property_name() == property && o.object().map_or(false, |x| Rc::ptr_eq(&x, object))
        })
    }

    pub fn properties(&self) -> &[Rc<PropertyObserver>] {
        &self.properties
    }

    pub fn collections(&self) -> &[Rc<CollectionObserver>] {
        &self.collections
    }

    pub fn len(&self) -> usize {
        self.properties.len() + self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds everything from `other`.
    pub fn merge(&mut self, other: DependencySet) {
        for p in other.properties {
            self.add_property(p);
        }
        for c in other.collections {
            self.add_collection(c);
        }
    }
}
