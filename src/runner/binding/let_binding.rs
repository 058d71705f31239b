use crate::parser::ast::ExpressionType;
use crate::runner::binding::connections::Connections;
use crate::runner::binding::{reactive_failure, Bindable};
use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::ObjectRef;
use crate::runner::ds::operations::object::set;
use crate::runner::ds::scope::Scope;
use crate::runner::ds::value::Value;
use crate::runner::eval::expression::connect_expression;
use crate::runner::eval::types::DependencySet;
use crate::runner::observation::collection_observer::Splice;
use crate::runner::observation::subscriber::{next_subscriber_id, Subscriber, SubscriberId};
use crate::runner::plugin::types::EvalContext;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::debug;

/// Declares `name` in the scope it is bound to and keeps it equal to the
/// source expression.
///
/// By default the value lands on the scope's binding context, where sibling
/// expressions read it like any model property. With `to_binding_context`
/// off it is written to the override-context locals instead. Writes are
/// synchronous since siblings bound later read the value immediately.
pub struct LetBinding {
    id: SubscriberId,
    self_weak: Weak<LetBinding>,
    source: Rc<ExpressionType>,
    name: String,
    to_binding_context: bool,
    ctx: EvalContext,
    scope: RefCell<Option<Scope>>,
    bound: Cell<bool>,
    activation: Cell<u64>,
    connections: Connections,
}

impl LetBinding {
    pub fn new(
        source: Rc<ExpressionType>,
        name: &str,
        to_binding_context: bool,
        ctx: EvalContext,
    ) -> Rc<Self> {
        let id = next_subscriber_id();
        Rc::new_cyclic(|self_weak| LetBinding {
            id,
            self_weak: self_weak.clone(),
            source,
            name: name.to_string(),
            to_binding_context,
            ctx,
            scope: RefCell::new(None),
            bound: Cell::new(false),
            activation: Cell::new(0),
            connections: Connections::new(id),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> DependencySet {
        self.connections.snapshot()
    }

    fn target(&self, scope: &Scope) -> Result<ObjectRef, BindingError> {
        if !self.to_binding_context {
            return Ok(scope.locals().clone());
        }
        match scope.binding_context() {
            Value::Object(o) => Ok(o.clone()),
            other => Err(BindingError::evaluation(format!(
                "let '{}' needs an object binding context, found {}",
                self.name, other
            ))),
        }
    }

    fn evaluate_and_write(&self, scope: &Scope) -> Result<(), BindingError> {
        let target = self.target(scope)?;
        let activation = self.activation.get();
        let mut deps = DependencySet::new();
        let result = connect_expression(&self.source, scope, &self.ctx, &mut deps);
        if !self.bound.get() || self.activation.get() != activation {
            return Ok(());
        }
        match result {
            Ok(value) => {
                let subscriber: Weak<dyn Subscriber> = self.self_weak.clone();
                self.connections.replace(deps, &subscriber);
                set(&target, &self.name, value)
            }
            Err(e) => {
                let subscriber: Weak<dyn Subscriber> = self.self_weak.clone();
                self.connections.merge(deps, &subscriber);
                Err(e)
            }
        }
    }

    fn refresh(&self) -> Result<(), BindingError> {
        if !self.bound.get() {
            return Ok(());
        }
        let scope = match self.scope.borrow().clone() {
            Some(s) => s,
            None => return Ok(()),
        };
        self.evaluate_and_write(&scope)
            .or_else(|e| reactive_failure(&self.ctx, &self.source, e))
    }
}

impl Bindable for LetBinding {
    fn bind(&self, scope: &Scope) -> Result<(), BindingError> {
        if self.bound.get() {
            if self.scope.borrow().as_ref().map_or(false, |s| s.same_as(scope)) {
                return Ok(());
            }
            self.unbind();
        }
        *self.scope.borrow_mut() = Some(scope.clone());
        self.bound.set(true);
        self.activation.set(self.activation.get() + 1);
        debug!(name = %self.name, expression = %self.source, "bind let");
        if let Err(e) = self.evaluate_and_write(scope) {
            self.unbind();
            return Err(e);
        }
        Ok(())
    }

    fn unbind(&self) {
        if !self.bound.replace(false) {
            return;
        }
        self.activation.set(self.activation.get() + 1);
        self.connections.clear();
        *self.scope.borrow_mut() = None;
        debug!(name = %self.name, "unbind let");
    }

    fn is_bound(&self) -> bool {
        self.bound.get()
    }
}

impl Subscriber for LetBinding {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn handle_change(&self, _new_value: &Value, _old_value: &Value) -> Result<(), BindingError> {
        self.refresh()
    }

    fn handle_collection_change(&self, _splices: &[Splice]) -> Result<(), BindingError> {
        self.refresh()
    }
}
