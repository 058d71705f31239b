use crate::parser::ast::ExpressionType;
use crate::runner::binding::connections::Connections;
use crate::runner::binding::{reactive_failure, Bindable};
use crate::runner::ds::error::BindingError;
use crate::runner::ds::operations::type_conversion::to_boolean;
use crate::runner::ds::scope::Scope;
use crate::runner::ds::value::Value;
use crate::runner::eval::expression::connect_expression;
use crate::runner::eval::types::DependencySet;
use crate::runner::observation::collection_observer::Splice;
use crate::runner::observation::subscriber::{next_subscriber_id, Subscriber, SubscriberId};
use crate::runner::plugin::types::EvalContext;
use crate::runner::templating::render_slot::RenderSlot;
use crate::runner::templating::view::{View, ViewFactory};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalState {
    NoViewActive,
    TrueViewActive,
    FalseViewActive,
}

/// `if` with an optional `else` template.
///
/// At most one view is bound at a time: the previous view is unbound before
/// the next one binds. Views share the controller's scope. The render slot
/// is reconciled through the write queue from whatever view is active when
/// the task runs, so queued toggles settle on the last condition.
pub struct IfController {
    id: SubscriberId,
    self_weak: Weak<IfController>,
    condition: Rc<ExpressionType>,
    template: Rc<ViewFactory>,
    else_template: Option<Rc<ViewFactory>>,
    slot: RenderSlot,
    ctx: EvalContext,
    scope: RefCell<Option<Scope>>,
    bound: Cell<bool>,
    state: Cell<ConditionalState>,
    active: RefCell<Option<Rc<View>>>,
    cached_true: RefCell<Option<Rc<View>>>,
    cached_false: RefCell<Option<Rc<View>>>,
    generation: Cell<u64>,
    connections: Connections,
}

impl IfController {
    pub fn new(
        condition: Rc<ExpressionType>,
        template: Rc<ViewFactory>,
        else_template: Option<Rc<ViewFactory>>,
        slot: RenderSlot,
        ctx: EvalContext,
    ) -> Rc<Self> {
        let id = next_subscriber_id();
        Rc::new_cyclic(|self_weak| IfController {
            id,
            self_weak: self_weak.clone(),
            condition,
            template,
            else_template,
            slot,
            ctx,
            scope: RefCell::new(None),
            bound: Cell::new(false),
            state: Cell::new(ConditionalState::NoViewActive),
            active: RefCell::new(None),
            cached_true: RefCell::new(None),
            cached_false: RefCell::new(None),
            generation: Cell::new(0),
            connections: Connections::new(id),
        })
    }

    pub fn state(&self) -> ConditionalState {
        self.state.get()
    }

    pub fn active_view(&self) -> Option<Rc<View>> {
        self.active.borrow().clone()
    }

    pub fn slot(&self) -> &RenderSlot {
        &self.slot
    }

    fn subscriber(&self) -> Weak<dyn Subscriber> {
        self.self_weak.clone()
    }

    fn evaluate_condition(&self, scope: &Scope) -> Result<(bool, DependencySet), BindingError> {
        let mut deps = DependencySet::new();
        match connect_expression(&self.condition, scope, &self.ctx, &mut deps) {
            Ok(v) => Ok((to_boolean(&v), deps)),
            Err(e) => {
                self.connections.merge(deps, &self.subscriber());
                Err(e)
            }
        }
    }

    fn view_for(&self, state: ConditionalState) -> Option<Rc<View>> {
        let (factory, cache) = match state {
            ConditionalState::TrueViewActive => (&self.template, &self.cached_true),
            ConditionalState::FalseViewActive => (self.else_template.as_ref()?, &self.cached_false),
            ConditionalState::NoViewActive => return None,
        };
        if let Some(view) = cache.borrow().clone() {
            return Some(view);
        }
        let view = factory.create(&self.ctx);
        if self.ctx.config.cache_conditional_views() {
            *cache.borrow_mut() = Some(view.clone());
        }
        Some(view)
    }

    fn is_active(&self, view: &Rc<View>) -> bool {
        self.active
            .borrow()
            .as_ref()
            .map_or(false, |a| Rc::ptr_eq(a, view))
    }

    /// Moves to the state `show` calls for.
    fn apply(&self, show: bool) -> Result<(), BindingError> {
        let next = if show {
            ConditionalState::TrueViewActive
        } else if self.else_template.is_some() {
            ConditionalState::FalseViewActive
        } else {
            ConditionalState::NoViewActive
        };
        if next == self.state.get() {
            return Ok(());
        }
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        debug!(from = ?self.state.get(), to = ?next, "conditional transition");

        let previous = self.active.borrow_mut().take();
        if let Some(view) = previous {
            view.unbind();
        }
        self.state.set(ConditionalState::NoViewActive);

        let scope = match self.scope.borrow().clone() {
            Some(s) => s,
            None => return self.schedule_reconcile(),
        };
        if let Some(view) = self.view_for(next) {
            if let Err(e) = view.bind(&scope) {
                self.schedule_reconcile()?;
                return Err(e);
            }
            if self.generation.get() != generation || !self.bound.get() {
                // superseded while the view was binding
                if !self.is_active(&view) {
                    view.unbind();
                }
                return Ok(());
            }
            *self.active.borrow_mut() = Some(view);
            self.state.set(next);
        }
        self.schedule_reconcile()
    }

    fn schedule_reconcile(&self) -> Result<(), BindingError> {
        let controller = self.self_weak.clone();
        self.ctx.queue.queue_write(Box::new(move || {
            if let Some(c) = controller.upgrade() {
                let views = c.active.borrow().iter().cloned().collect();
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
        let (show, deps) = match self.evaluate_condition(&scope) {
            Ok(r) => r,
            Err(e) => return reactive_failure(&self.ctx, &self.condition, e),
        };
        if !self.bound.get() {
            return Ok(());
        }
        self.connections.replace(deps, &self.subscriber());
        self.apply(show)
            .or_else(|e| reactive_failure(&self.ctx, &self.condition, e))
    }
}

impl Bindable for IfController {
    fn bind(&self, scope: &Scope) -> Result<(), BindingError> {
        if self.bound.get() {
            if self.scope.borrow().as_ref().map_or(false, |s| s.same_as(scope)) {
                return Ok(());
            }
            self.unbind();
        }
        *self.scope.borrow_mut() = Some(scope.clone());
        self.bound.set(true);
        let result = self.evaluate_condition(scope).and_then(|(show, deps)| {
            self.connections.replace(deps, &self.subscriber());
            self.apply(show)
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
        let previous = self.active.borrow_mut().take();
        if let Some(view) = previous {
            view.unbind();
        }
        self.state.set(ConditionalState::NoViewActive);
        *self.scope.borrow_mut() = None;
        if let Err(e) = self.schedule_reconcile() {
            warn!(error = %e, "failed to detach conditional view");
        }
        debug!(condition = %self.condition, "unbind if");
    }

    fn is_bound(&self) -> bool {
        self.bound.get()
    }
}

impl Subscriber for IfController {
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
