use crate::parser::ast::ExpressionType;
use crate::runner::binding::connections::Connections;
use crate::runner::binding::{reactive_failure, Bindable};
use crate::runner::ds::array_object::{array_elements, MAX_DENSE_GROWTH};
use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::{new_object, object_from, ObjectRef};
use crate::runner::ds::operations::object::set;
use crate::runner::ds::operations::type_conversion::get_type;
use crate::runner::ds::scope::Scope;
use crate::runner::ds::value::Value;
use crate::runner::eval::expression::connect_expression;
use crate::runner::eval::types::DependencySet;
use crate::runner::observation::collection_observer::Splice;
use crate::runner::observation::subscriber::{next_subscriber_id, Subscriber, SubscriberId};
use crate::runner::plugin::types::EvalContext;
use crate::runner::templating::diff::{diff_sequences, ItemKey};
use crate::runner::templating::render_slot::RenderSlot;
use crate::runner::templating::view::{View, ViewFactory};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

/// Renders one view per item of a sequence.
///
/// Each view gets a child scope whose binding context is the item (or
/// `{ local: item }`) and whose locals carry `$index`, `$first`, `$last`,
/// `$middle`, `$even`, `$odd` and `$length`. On change the old and new item
/// sequences are diffed: removed views are unbound, surviving views keep
/// their bindings and only get their locals relabelled, and only new items
/// get new views.
pub struct RepeatController {
    id: SubscriberId,
    self_weak: Weak<RepeatController>,
    local: Option<String>,
    items: Rc<ExpressionType>,
    template: Rc<ViewFactory>,
    slot: RenderSlot,
    ctx: EvalContext,
    scope: RefCell<Option<Scope>>,
    bound: Cell<bool>,
    generation: Cell<u64>,
    views: RefCell<Vec<Rc<View>>>,
    keys: RefCell<Vec<ItemKey>>,
    connections: Connections,
}

impl RepeatController {
    pub fn new(
        local: Option<String>,
        items: Rc<ExpressionType>,
        template: Rc<ViewFactory>,
        slot: RenderSlot,
        ctx: EvalContext,
    ) -> Rc<Self> {
        let id = next_subscriber_id();
        Rc::new_cyclic(|self_weak| RepeatController {
            id,
            self_weak: self_weak.clone(),
            local,
            items,
            template,
            slot,
            ctx,
            scope: RefCell::new(None),
            bound: Cell::new(false),
            generation: Cell::new(0),
            views: RefCell::new(vec![]),
            keys: RefCell::new(vec![]),
            connections: Connections::new(id),
        })
    }

    /// Current views in item order.
    pub fn views(&self) -> Vec<Rc<View>> {
        self.views.borrow().clone()
    }

    pub fn slot(&self) -> &RenderSlot {
        &self.slot
    }

    fn subscriber(&self) -> Weak<dyn Subscriber> {
        self.self_weak.clone()
    }

    /// Evaluates the items expression, also depending on the array's
    /// collection observer when the result is an array.
    fn connect_items(&self, scope: &Scope) -> Result<(Value, DependencySet), BindingError> {
        let mut deps = DependencySet::new();
        let result = connect_expression(&self.items, scope, &self.ctx, &mut deps).and_then(|v| {
            if let Value::Object(o) = &v {
                if o.borrow().is_array() {
                    deps.add_collection(self.ctx.locator.get_array_observer(o)?);
                }
            }
            Ok(v)
        });
        match result {
            Ok(v) => Ok((v, deps)),
            Err(e) => {
                self.connections.merge(deps, &self.subscriber());
                Err(e)
            }
        }
    }

    fn item_context(&self, item: &Value) -> Value {
        match &self.local {
            Some(name) => Value::Object(object_from(vec![(name.as_str(), item.clone())])),
            None => item.clone(),
        }
    }

    fn item_scope(&self, parent: &Scope, item: &Value, index: usize, length: usize) -> Result<Scope, BindingError> {
        let locals = new_object();
        write_locals(&locals, index, length)?;
        Ok(Scope::child_with_locals(parent, self.item_context(item), locals))
    }

    /// Brings the views in line with `items`.
    fn sync(&self, items: &Value) -> Result<(), BindingError> {
        let items = items_to_vec(items)?;
        let scope = match self.scope.borrow().clone() {
            Some(s) => s,
            None => return Ok(()),
        };
        let new_keys: Vec<ItemKey> = items.iter().map(ItemKey::of).collect();
        let diff = diff_sequences(&self.keys.borrow(), &new_keys);
        if diff.is_identity() {
            return Ok(());
        }
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        debug!(
            items = items.len(),
            created = diff.created(),
            removed = diff.removed.len(),
            moved = diff.moved,
            "repeat patch"
        );

        let old_views = self.views.borrow().clone();
        for &i in &diff.removed {
            old_views[i].unbind();
        }
        let next: Vec<Rc<View>> = diff
            .sources
            .iter()
            .map(|source| match source {
                Some(old) => old_views[*old].clone(),
                None => self.template.create(&self.ctx),
            })
            .collect();
        *self.views.borrow_mut() = next.clone();
        *self.keys.borrow_mut() = new_keys;

        let length = items.len();
        for (index, (view, item)) in next.iter().zip(items.iter()).enumerate() {
            if self.generation.get() != generation || !self.bound.get() {
                // a nested sync took over
                return Ok(());
            }
            let result = match view.scope() {
                Some(existing) if view.is_bound() => write_locals(existing.locals(), index, length),
                _ => self
                    .item_scope(&scope, item, index, length)
                    .and_then(|s| view.bind(&s)),
            };
            if let Err(e) = result {
                self.teardown();
                self.schedule_reconcile()?;
                return Err(e);
            }
        }
        self.schedule_reconcile()
    }

    /// Unbinds and forgets every view.
    fn teardown(&self) {
        let views = self.views.replace(vec![]);
        self.keys.borrow_mut().clear();
        for view in views {
            view.unbind();
        }
    }

    fn schedule_reconcile(&self) -> Result<(), BindingError> {
        let controller = self.self_weak.clone();
        self.ctx.queue.queue_write(Box::new(move || {
            if let Some(c) = controller.upgrade() {
                let views = c.views.borrow().clone();
                c.slot.reconcile(views);
            }
            Ok(())
        }))
    }

    fn refresh(&self) -> Result<(), BindingError> {
        if !self.bound.get() {
            return Ok(());
        }
        let scope = match self.scope.borrow().clone() {
            Some(s) => s,
            None => return Ok(()),
        };
        let (items, deps) = match self.connect_items(&scope) {
            Ok(r) => r,
            Err(e) => return reactive_failure(&self.ctx, &self.items, e),
        };
        if !self.bound.get() {
            return Ok(());
        }
        self.connections.replace(deps, &self.subscriber());
        self.sync(&items)
            .or_else(|e| reactive_failure(&self.ctx, &self.items, e))
    }
}

impl Bindable for RepeatController {
    fn bind(&self, scope: &Scope) -> Result<(), BindingError> {
        if self.bound.get() {
            if self.scope.borrow().as_ref().map_or(false, |s| s.same_as(scope)) {
                return Ok(());
            }
            self.unbind();
        }
        *self.scope.borrow_mut() = Some(scope.clone());
        self.bound.set(true);
        let result = self.connect_items(scope).and_then(|(items, deps)| {
            self.connections.replace(deps, &self.subscriber());
            self.sync(&items)
        });
        if let Err(e) = result {
            self.unbind();
            return Err(e);
        }
        Ok(())
    }

    fn unbind(&self) {
        if !self.bound.replace(false) {
            return;
        }
        self.generation.set(self.generation.get() + 1);
        self.connections.clear();
        self.teardown();
        *self.scope.borrow_mut() = None;
        if let Err(e) = self.schedule_reconcile() {
            warn!(error = %e, "failed to detach repeated views");
        }
        debug!(items = %self.items, "unbind repeat");
    }

    fn is_bound(&self) -> bool {
        self.bound.get()
    }
}

impl Subscriber for RepeatController {
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

fn write_locals(locals: &ObjectRef, index: usize, length: usize) -> Result<(), BindingError> {
    let first = index == 0;
    let last = index + 1 == length;
    set(locals, "$index", Value::from(index))?;
    set(locals, "$first", Value::Boolean(first))?;
    set(locals, "$last", Value::Boolean(last))?;
    set(locals, "$middle", Value::Boolean(!first && !last))?;
    set(locals, "$even", Value::Boolean(index % 2 == 0))?;
    set(locals, "$odd", Value::Boolean(index % 2 == 1))?;
    set(locals, "$length", Value::from(length))
}

/// Arrays are iterated, a non-negative integer `n` counts `0..n`, null and
/// undefined render nothing.
fn items_to_vec(items: &Value) -> Result<Vec<Value>, BindingError> {
    match items {
        Value::Undefined | Value::Null => Ok(vec![]),
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && n.is_finite() => {
            if *n > MAX_DENSE_GROWTH as f64 {
                return Err(BindingError::evaluation(format!(
                    "repeat range {} exceeds {} items",
                    n, MAX_DENSE_GROWTH
                )));
            }
            Ok((0..*n as usize).map(Value::from).collect())
        }
        Value::Object(o) => array_elements(o).ok_or_else(|| {
            BindingError::evaluation("repeat expects an array, a number or null")
        }),
        other => Err(BindingError::evaluation(format!(
            "repeat cannot iterate a {} ({})",
            get_type(other),
            other
        ))),
    }
}
