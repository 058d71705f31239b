use crate::parser::ast::ExpressionType;
use crate::runner::binding::accessor::{PropertyAccessor, TargetAccessor};
use crate::runner::binding::connections::Connections;
use crate::runner::binding::{reactive_failure, Bindable, BindingMode};
use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::ObjectRef;
use crate::runner::ds::operations::test_and_comparison::same_value;
use crate::runner::ds::scope::Scope;
use crate::runner::ds::value::Value;
use crate::runner::eval::expression::{assign_expression, connect_expression, evaluate_expression};
use crate::runner::eval::types::DependencySet;
use crate::runner::observation::collection_observer::Splice;
use crate::runner::observation::property_observer::PropertyObserver;
use crate::runner::observation::subscriber::{next_subscriber_id, Subscriber, SubscriberId};
use crate::runner::plugin::types::EvalContext;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// Binds a source expression to one target property.
///
/// Source changes re-run the expression in connect mode and queue a target
/// write. The queued write always applies the latest computed value, so it
/// does not matter how long the queue holds it. Target changes (from-view and
/// two-way) are assigned back through the expression unless the source
/// already evaluates to the same value, which is what stops two-way feedback.
pub struct PropertyBinding {
    id: SubscriberId,
    self_weak: Weak<PropertyBinding>,
    source: Rc<ExpressionType>,
    target: Rc<dyn TargetAccessor>,
    mode: BindingMode,
    ctx: EvalContext,
    scope: RefCell<Option<Scope>>,
    bound: Cell<bool>,
    activation: Cell<u64>,
    last_value: RefCell<Value>,
    connections: Connections,
    target_listener: Rc<TargetListener>,
    target_observer: RefCell<Option<Rc<PropertyObserver>>>,
}

impl PropertyBinding {
    pub fn new(
        source: Rc<ExpressionType>,
        target: Rc<dyn TargetAccessor>,
        mode: BindingMode,
        ctx: EvalContext,
    ) -> Rc<Self> {
        let id = next_subscriber_id();
        Rc::new_cyclic(|self_weak| PropertyBinding {
            id,
            self_weak: self_weak.clone(),
            source,
            target,
            mode,
            ctx,
            scope: RefCell::new(None),
            bound: Cell::new(false),
            activation: Cell::new(0),
            last_value: RefCell::new(Value::Undefined),
            connections: Connections::new(id),
            target_listener: Rc::new(TargetListener {
                id: next_subscriber_id(),
                binding: self_weak.clone(),
            }),
            target_observer: RefCell::new(None),
        })
    }

    /// Binding whose target is `property` of a plain object.
    pub fn to_property(
        source: Rc<ExpressionType>,
        object: &ObjectRef,
        property: &str,
        mode: BindingMode,
        ctx: EvalContext,
    ) -> Rc<Self> {
        Self::new(source, Rc::new(PropertyAccessor::new(object, property)), mode, ctx)
    }

    pub fn mode(&self) -> BindingMode {
        self.mode
    }

    pub fn source_expression(&self) -> &Rc<ExpressionType> {
        &self.source
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    /// Last value computed from the source.
    pub fn last_value(&self) -> Value {
        self.last_value.borrow().clone()
    }

    /// Observers the binding is currently subscribed to on the source side.
    pub fn dependencies(&self) -> DependencySet {
        self.connections.snapshot()
    }

    /// Pushes a target-side value into the source.
    pub fn update_source(&self, value: Value) -> Result<(), BindingError> {
        if !self.bound.get() || !self.mode.observes_target() {
            return Ok(());
        }
        let scope = match self.current_scope() {
            Some(s) => s,
            None => return Ok(()),
        };
        if let Ok(current) = evaluate_expression(&self.source, &scope, &self.ctx) {
            if same_value(&current, &value) {
                return Ok(());
            }
        }
        trace!(expression = %self.source, "updating source from target");
        assign_expression(&self.source, &scope, value, &self.ctx).map(|_| ())
    }

    fn current_scope(&self) -> Option<Scope> {
        self.scope.borrow().clone()
    }

    fn subscriber(&self) -> Weak<dyn Subscriber> {
        self.self_weak.clone()
    }

    fn activate(&self, scope: &Scope) -> Result<(), BindingError> {
        match self.mode {
            BindingMode::OneTime => {
                let value = evaluate_expression(&self.source, scope, &self.ctx)?;
                self.update_target(value)?;
            }
            BindingMode::ToView | BindingMode::TwoWay => {
                let mut deps = DependencySet::new();
                let value = connect_expression(&self.source, scope, &self.ctx, &mut deps)?;
                self.connections.replace(deps, &self.subscriber());
                self.update_target(value)?;
            }
            BindingMode::FromView => {}
        }
        if self.mode.observes_target() {
            if let Some(observer) = self.target.observer(&self.ctx.locator) {
                let listener: Weak<TargetListener> = Rc::downgrade(&self.target_listener);
                observer.subscribe(self.target_listener.id, listener);
                *self.target_observer.borrow_mut() = Some(observer);
            }
        }
        Ok(())
    }

    /// Records `value` and queues the target write unless the target already
    /// holds it.
    fn update_target(&self, value: Value) -> Result<(), BindingError> {
        *self.last_value.borrow_mut() = value.clone();
        if same_value(&self.target.get_value(), &value) {
            return Ok(());
        }
        let binding = self.self_weak.clone();
        self.ctx.queue.queue_write(Box::new(move || match binding.upgrade() {
            Some(b) if b.bound.get() => b.write_target(),
            _ => Ok(()),
        }))
    }

    fn write_target(&self) -> Result<(), BindingError> {
        let value = self.last_value();
        if same_value(&self.target.get_value(), &value) {
            return Ok(());
        }
        trace!(property = %self.target.describe(), "writing target");
        self.target.set_value(value)
    }

    fn refresh(&self) -> Result<(), BindingError> {
        if !self.bound.get() || !self.mode.observes_source() {
            return Ok(());
        }
        let scope = match self.current_scope() {
            Some(s) => s,
            None => return Ok(()),
        };
        let activation = self.activation.get();
        let mut deps = DependencySet::new();
        let result = connect_expression(&self.source, &scope, &self.ctx, &mut deps);
        if !self.bound.get() || self.activation.get() != activation {
            // unbound or rebound while evaluating
            return Ok(());
        }
        match result {
            Ok(value) => {
                self.connections.replace(deps, &self.subscriber());
                self.update_target(value)
                    .or_else(|e| reactive_failure(&self.ctx, &self.source, e))
            }
            Err(e) => {
                self.connections.merge(deps, &self.subscriber());
                reactive_failure(&self.ctx, &self.source, e)
            }
        }
    }
}

impl Bindable for PropertyBinding {
    fn bind(&self, scope: &Scope) -> Result<(), BindingError> {
        if self.bound.get() {
            if self.current_scope().map_or(false, |s| s.same_as(scope)) {
                return Ok(());
            }
            self.unbind();
        }
        *self.scope.borrow_mut() = Some(scope.clone());
        self.bound.set(true);
        self.activation.set(self.activation.get() + 1);
        debug!(expression = %self.source, property = %self.target.describe(), mode = ?self.mode, "bind");
        if let Err(e) = self.activate(scope) {
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
        if let Some(observer) = self.target_observer.borrow_mut().take() {
            observer.unsubscribe(self.target_listener.id);
        }
        *self.scope.borrow_mut() = None;
        debug!(expression = %self.source, "unbind");
    }

    fn is_bound(&self) -> bool {
        self.bound.get()
    }
}

impl Subscriber for PropertyBinding {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn handle_change(&self, _new_value: &Value, _old_value: &Value) -> Result<(), BindingError> {
        trace!(expression = %self.source, "source changed");
        self.refresh()
    }

    fn handle_collection_change(&self, _splices: &[Splice]) -> Result<(), BindingError> {
        self.refresh()
    }
}

/// Subscribed to the target observer on behalf of a binding.
struct TargetListener {
    id: SubscriberId,
    binding: Weak<PropertyBinding>,
}

impl Subscriber for TargetListener {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn handle_change(&self, new_value: &Value, _old_value: &Value) -> Result<(), BindingError> {
        match self.binding.upgrade() {
            Some(b) => b
                .update_source(new_value.clone())
                .or_else(|e| reactive_failure(&b.ctx, &b.source, e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::BindingParser;
    use crate::runner::ds::object::{new_object, object_from};
    use crate::runner::ds::operations::object::{get, set};

    fn binding(source: &str, target: &ObjectRef, mode: BindingMode) -> Rc<PropertyBinding> {
        let ast = BindingParser::parse_to_ast_from_str(source).unwrap();
        PropertyBinding::to_property(ast, target, "value", mode, EvalContext::new())
    }

    #[test]
    fn test_to_view_follows_source() {
        let model = object_from(vec![("name", Value::from("a"))]);
        let target = new_object();
        let b = binding("name", &target, BindingMode::ToView);
        b.bind(&Scope::new(Value::Object(model.clone()))).unwrap();
        assert_eq!(get(&target, "value"), Value::from("a"));

        set(&model, "name", Value::from("b")).unwrap();
        assert_eq!(get(&target, "value"), Value::from("b"));
    }

    #[test]
    fn test_one_time_keeps_no_subscriptions() {
        let model = object_from(vec![("name", Value::from("a"))]);
        let target = new_object();
        let b = binding("name", &target, BindingMode::OneTime);
        b.bind(&Scope::new(Value::Object(model.clone()))).unwrap();
        assert!(b.dependencies().is_empty());

        set(&model, "name", Value::from("b")).unwrap();
        assert_eq!(get(&target, "value"), Value::from("a"));
    }

    #[test]
    fn test_from_view_writes_back_only() {
        let model = object_from(vec![("name", Value::from("a"))]);
        let target = new_object();
        let b = binding("name", &target, BindingMode::FromView);
        b.bind(&Scope::new(Value::Object(model.clone()))).unwrap();
        assert_eq!(get(&target, "value"), Value::Undefined);

        set(&target, "value", Value::from("typed")).unwrap();
        assert_eq!(get(&model, "name"), Value::from("typed"));
    }

    #[test]
    fn test_failed_bind_leaves_binding_unbound() {
        let target = new_object();
        let b = binding("missing.deep", &target, BindingMode::ToView);
        assert!(b.bind(&Scope::new(Value::Object(new_object()))).is_err());
        assert!(!b.is_bound());
        assert!(b.dependencies().is_empty());
    }
}
