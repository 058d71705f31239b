//! Core types shared by the evaluator, bindings and controllers.

use crate::runner::ds::value::Value;
use crate::runner::eval::types::ValueResult;
use crate::runner::observation::observer_locator::ObserverLocator;
use crate::runner::plugin::config::EngineConfig;
use crate::runner::plugin::registry::ResourceRegistry;
use crate::runner::task_queue::{ImmediateQueue, TaskQueue};
use std::collections::HashMap;
use std::rc::Rc;

/// Everything an evaluation needs besides the AST and the scope.
///
/// Cheap to clone; every binding keeps its own copy.
#[derive(Clone)]
pub struct EvalContext {
    pub locator: Rc<ObserverLocator>,
    pub resources: Rc<ResourceRegistry>,
    pub config: Rc<EngineConfig>,
    pub queue: Rc<dyn TaskQueue>,
}

impl EvalContext {
    /// Default configuration, core built-ins, writes applied immediately.
    pub fn new() -> Self {
        EvalContext {
            locator: Rc::new(ObserverLocator::new()),
            resources: Rc::new(ResourceRegistry::with_core()),
            config: Rc::new(EngineConfig::default()),
            queue: Rc::new(ImmediateQueue),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Rc::new(config);
        self
    }

    pub fn with_resources(mut self, resources: ResourceRegistry) -> Self {
        self.resources = Rc::new(resources);
        self
    }

    pub fn with_queue(mut self, queue: Rc<dyn TaskQueue>) -> Self {
        self.queue = queue;
        self
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Function signature for built-in methods.
/// Native functions receive the evaluation context, `this` value, and arguments.
pub type NativeFn = fn(ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult;

/// Built-in function - either compiled-in or registered at runtime.
#[derive(Clone)]
pub enum BuiltInFn {
    /// Direct function pointer for compiled-in methods.
    Native(NativeFn),
    /// Closure registered by the embedding application.
    Plugin(Rc<dyn Fn(&EvalContext, &Value, Vec<Value>) -> ValueResult>),
}

impl BuiltInFn {
    pub fn call(&self, ctx: &EvalContext, this: &Value, args: Vec<Value>) -> ValueResult {
        match self {
            BuiltInFn::Native(f) => f(ctx, this, args),
            BuiltInFn::Plugin(f) => f(ctx, this, args),
        }
    }
}

/// Methods available on every value of one kind (`Array`, `String`).
pub struct BuiltInObject {
    pub name: String,
    pub methods: HashMap<String, BuiltInFn>,
}

impl BuiltInObject {
    pub fn new(name: &str) -> Self {
        BuiltInObject {
            name: name.to_string(),
            methods: HashMap::new(),
        }
    }

    pub fn add_method(mut self, name: &str, f: NativeFn) -> Self {
        self.methods.insert(name.to_string(), BuiltInFn::Native(f));
        self
    }
}

/// Transforms values between model and view, applied by the `|` operator.
pub trait ValueConverter {
    fn to_view(&self, value: Value, args: &[Value]) -> ValueResult;

    /// Identity unless the converter supports writing back.
    fn from_view(&self, value: Value, args: &[Value]) -> ValueResult {
        let _ = args;
        Ok(value)
    }
}

/// A one-way converter from a closure.
pub struct FnConverter<F>(pub F);

impl<F> ValueConverter for FnConverter<F>
where
    F: Fn(Value, &[Value]) -> ValueResult,
{
    fn to_view(&self, value: Value, args: &[Value]) -> ValueResult {
        (self.0)(value, args)
    }
}
