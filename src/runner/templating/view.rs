//! Instructions, view factories and views.

use crate::parser::ast::ExpressionType;
use crate::runner::binding::accessor::PropertyAccessor;
use crate::runner::binding::let_binding::LetBinding;
use crate::runner::binding::property_binding::PropertyBinding;
use crate::runner::binding::{Bindable, BindingMode};
use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::{new_object, ObjectRef};
use crate::runner::ds::operations::object::get;
use crate::runner::ds::operations::type_conversion::to_display_string;
use crate::runner::ds::scope::Scope;
use crate::runner::plugin::types::EvalContext;
use crate::runner::templating::if_controller::IfController;
use crate::runner::templating::render_slot::RenderSlot;
use crate::runner::templating::repeat::RepeatController;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Element property whose value [`View::text_content`] renders.
pub const TEXT_CONTENT_PROP: &str = "textContent";

/// One compiled template instruction.
pub enum Instruction {
    Property {
        expression: Rc<ExpressionType>,
        target_property: String,
        mode: BindingMode,
    },
    Let {
        expression: Rc<ExpressionType>,
        name: String,
        to_binding_context: bool,
    },
    If {
        condition: Rc<ExpressionType>,
        template: Rc<ViewFactory>,
        else_template: Option<Rc<ViewFactory>>,
    },
    Repeat {
        /// `None` uses each item itself as the binding context.
        local: Option<String>,
        items: Rc<ExpressionType>,
        template: Rc<ViewFactory>,
    },
}

/// A template: its identity and its instructions.
pub struct ViewFactory {
    name: String,
    instructions: Vec<Instruction>,
}

impl ViewFactory {
    pub fn new(name: &str) -> Self {
        ViewFactory {
            name: name.to_string(),
            instructions: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn add_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn add_property(
        self,
        expression: Rc<ExpressionType>,
        target_property: &str,
        mode: BindingMode,
    ) -> Self {
        self.add_instruction(Instruction::Property {
            expression,
            target_property: target_property.to_string(),
            mode,
        })
    }

    /// Binds the element's text.
    pub fn add_text(self, expression: Rc<ExpressionType>) -> Self {
        self.add_property(expression, TEXT_CONTENT_PROP, BindingMode::ToView)
    }

    pub fn add_let(self, expression: Rc<ExpressionType>, name: &str) -> Self {
        self.add_instruction(Instruction::Let {
            expression,
            name: name.to_string(),
            to_binding_context: true,
        })
    }

    pub fn add_if(
        self,
        condition: Rc<ExpressionType>,
        template: ViewFactory,
        else_template: Option<ViewFactory>,
    ) -> Self {
        self.add_instruction(Instruction::If {
            condition,
            template: Rc::new(template),
            else_template: else_template.map(Rc::new),
        })
    }

    pub fn add_repeat(
        self,
        local: Option<&str>,
        items: Rc<ExpressionType>,
        template: ViewFactory,
    ) -> Self {
        self.add_instruction(Instruction::Repeat {
            local: local.map(str::to_string),
            items,
            template: Rc::new(template),
        })
    }

    /// Instantiates an unbound view: a fresh element, one binding or
    /// controller per instruction and one render slot per controller.
    pub fn create(self: &Rc<Self>, ctx: &EvalContext) -> Rc<View> {
        let element = new_object();
        let mut children: Vec<Rc<dyn Bindable>> = Vec::with_capacity(self.instructions.len());
        let mut slots = vec![];
        for instruction in &self.instructions {
            match instruction {
                Instruction::Property {
                    expression,
                    target_property,
                    mode,
                } => children.push(PropertyBinding::new(
                    expression.clone(),
                    Rc::new(PropertyAccessor::new(&element, target_property)),
                    *mode,
                    ctx.clone(),
                )),
                Instruction::Let {
                    expression,
                    name,
                    to_binding_context,
                } => children.push(LetBinding::new(
                    expression.clone(),
                    name,
                    *to_binding_context,
                    ctx.clone(),
                )),
                Instruction::If {
                    condition,
                    template,
                    else_template,
                } => {
                    let slot = RenderSlot::new();
                    children.push(IfController::new(
                        condition.clone(),
                        template.clone(),
                        else_template.clone(),
                        slot.clone(),
                        ctx.clone(),
                    ));
                    slots.push(slot);
                }
                Instruction::Repeat {
                    local,
                    items,
                    template,
                } => {
                    let slot = RenderSlot::new();
                    children.push(RepeatController::new(
                        local.clone(),
                        items.clone(),
                        template.clone(),
                        slot.clone(),
                        ctx.clone(),
                    ));
                    slots.push(slot);
                }
            }
        }
        let view = Rc::new(View {
            id: ViewId::new(),
            factory: self.clone(),
            element,
            children,
            slots,
            scope: RefCell::new(None),
            bound: Cell::new(false),
            attached: Cell::new(false),
        });
        debug!(view = %view.id, template = %self.name, "created view");
        view
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(Uuid);

impl ViewId {
    fn new() -> Self {
        ViewId(Uuid::new_v4())
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An instantiated template. Bound views have live bindings; attached views
/// sit in their controller's render slot.
pub struct View {
    id: ViewId,
    factory: Rc<ViewFactory>,
    element: ObjectRef,
    children: Vec<Rc<dyn Bindable>>,
    slots: Vec<RenderSlot>,
    scope: RefCell<Option<Scope>>,
    bound: Cell<bool>,
    attached: Cell<bool>,
}

impl View {
    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn factory(&self) -> &Rc<ViewFactory> {
        &self.factory
    }

    /// The object property bindings of this view write to.
    pub fn element(&self) -> &ObjectRef {
        &self.element
    }

    pub fn scope(&self) -> Option<Scope> {
        self.scope.borrow().clone()
    }

    pub fn slots(&self) -> &[RenderSlot] {
        &self.slots
    }

    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }

    pub(crate) fn set_attached(&self, attached: bool) {
        self.attached.set(attached);
    }

    pub fn bound_children_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_bound()).count()
    }

    /// The element's text followed by the text of every attached nested view,
    /// slot by slot.
    pub fn text_content(&self) -> String {
        let mut text = to_display_string(&get(&self.element, TEXT_CONTENT_PROP));
        for slot in &self.slots {
            text.push_str(&slot.text_content());
        }
        text
    }
}

impl Bindable for View {
    #[instrument(level = "debug", skip(self, scope), fields(view = %self.id, template = %self.factory.name))]
    fn bind(&self, scope: &Scope) -> Result<(), BindingError> {
        if self.bound.get() {
            if self.scope.borrow().as_ref().map_or(false, |s| s.same_as(scope)) {
                return Ok(());
            }
            self.unbind();
        }
        *self.scope.borrow_mut() = Some(scope.clone());
        self.bound.set(true);
        for (i, child) in self.children.iter().enumerate() {
            if let Err(e) = child.bind(scope) {
                for earlier in self.children[..i].iter().rev() {
                    earlier.unbind();
                }
                self.bound.set(false);
                *self.scope.borrow_mut() = None;
                debug!(error = %e, "view bind failed");
                return Err(e);
            }
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self), fields(view = %self.id))]
    fn unbind(&self) {
        if !self.bound.replace(false) {
            return;
        }
        for child in self.children.iter().rev() {
            child.unbind();
        }
        *self.scope.borrow_mut() = None;
    }

    fn is_bound(&self) -> bool {
        self.bound.get()
    }
}
