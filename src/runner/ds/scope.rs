//! Binding scopes.
//!
//! A [`Scope`] pairs the object expressions read names from (the binding
//! context) with an [`OverrideContext`] that carries contextual locals
//! (`$index`, `$first`, `let` values) and links to the enclosing scope's
//! override context for `$parent` traversal.

use crate::runner::ds::error::BindingError;
use crate::runner::ds::object::{new_object, ObjectRef};
use crate::runner::ds::operations::object::has_property;
use crate::runner::ds::value::Value;
use std::collections::HashSet;
use std::rc::Rc;

lazy_static! {
    /// Locals maintained by the repeat controller on every item scope.
    pub static ref CONTEXTUAL_LOCALS: HashSet<&'static str> = [
        "$index", "$first", "$last", "$middle", "$even", "$odd", "$length",
    ]
    .iter()
    .cloned()
    .collect();
}

pub struct OverrideContext {
    binding_context: Value,
    locals: ObjectRef,
    parent: Option<Rc<OverrideContext>>,
}

impl OverrideContext {
    pub fn binding_context(&self) -> &Value {
        &self.binding_context
    }

    pub fn locals(&self) -> &ObjectRef {
        &self.locals
    }

    pub fn parent(&self) -> Option<&Rc<OverrideContext>> {
        self.parent.as_ref()
    }

    /// Number of ancestors above this level.
    pub fn depth(&self) -> u32 {
        let mut depth = 0;
        let mut current = self.parent.as_ref();
        while let Some(oc) = current {
            depth += 1;
            current = oc.parent.as_ref();
        }
        depth
    }

    /// The object at this level that declares `name`: the binding context
    /// wins over the locals.
    fn declaring_object(&self, name: &str) -> Option<Value> {
        if let Value::Object(o) = &self.binding_context {
            if has_property(o, name) {
                return Some(self.binding_context.clone());
            }
        }
        if has_property(&self.locals, name) {
            return Some(Value::Object(self.locals.clone()));
        }
        None
    }
}

#[derive(Clone)]
pub struct Scope {
    binding_context: Value,
    override_context: Rc<OverrideContext>,
}

impl Scope {
    /// Root scope with no ancestors.
    pub fn new(binding_context: Value) -> Self {
        Scope {
            override_context: Rc::new(OverrideContext {
                binding_context: binding_context.clone(),
                locals: new_object(),
                parent: None,
            }),
            binding_context,
        }
    }

    /// Scope one `$parent` hop below `parent`.
    pub fn child(parent: &Scope, binding_context: Value) -> Self {
        Self::child_with_locals(parent, binding_context, new_object())
    }

    pub fn child_with_locals(parent: &Scope, binding_context: Value, locals: ObjectRef) -> Self {
        Scope {
            override_context: Rc::new(OverrideContext {
                binding_context: binding_context.clone(),
                locals,
                parent: Some(parent.override_context.clone()),
            }),
            binding_context,
        }
    }

    pub fn binding_context(&self) -> &Value {
        &self.binding_context
    }

    pub fn override_context(&self) -> &Rc<OverrideContext> {
        &self.override_context
    }

    pub fn locals(&self) -> &ObjectRef {
        &self.override_context.locals
    }

    /// Same binding context and the very same override context.
    pub fn same_as(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.override_context, &other.override_context)
            && self.binding_context == other.binding_context
    }

    pub fn ancestor(&self, depth: u32) -> Result<&Rc<OverrideContext>, BindingError> {
        let mut current = &self.override_context;
        for _ in 0..depth {
            current = match current.parent.as_ref() {
                Some(p) => p,
                None => {
                    return Err(BindingError::UndefinedAncestorScope {
                        requested: depth,
                        available: self.override_context.depth(),
                    })
                }
            };
        }
        Ok(current)
    }

    /// Finds the object a scope name is read from and written to.
    ///
    /// With `ancestor == 0` the chain is walked upward and the first level
    /// declaring `name` wins; when no level does, the leaf binding context is
    /// used so that assignments create the property there. With
    /// `ancestor > 0` only the addressed level is consulted.
    pub fn resolve(&self, name: &str, ancestor: u32) -> Result<Value, BindingError> {
        if ancestor > 0 {
            let oc = self.ancestor(ancestor)?;
            return Ok(oc
                .declaring_object(name)
                .unwrap_or_else(|| oc.binding_context.clone()));
        }
        let mut current = Some(&self.override_context);
        while let Some(oc) = current {
            if let Some(found) = oc.declaring_object(name) {
                return Ok(found);
            }
            current = oc.parent.as_ref();
        }
        Ok(self.binding_context.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ds::object::object_from;

    fn nested() -> (ObjectRef, ObjectRef, Scope) {
        let outer = object_from(vec![("name", Value::from("outer")), ("only_outer", Value::from(1))]);
        let inner = object_from(vec![("name", Value::from("inner"))]);
        let root = Scope::new(Value::Object(outer.clone()));
        let scope = Scope::child(&root, Value::Object(inner.clone()));
        (outer, inner, scope)
    }

    #[test]
    fn test_nearest_declaring_level_wins() {
        let (outer, inner, scope) = nested();
        assert_eq!(scope.resolve("name", 0).unwrap(), Value::Object(inner));
        assert_eq!(scope.resolve("only_outer", 0).unwrap(), Value::Object(outer));
    }

    #[test]
    fn test_undeclared_names_resolve_to_leaf() {
        let (_, inner, scope) = nested();
        assert_eq!(scope.resolve("missing", 0).unwrap(), Value::Object(inner));
    }

    #[test]
    fn test_ancestor_lookup_stays_at_its_level() {
        let (outer, _, scope) = nested();
        assert_eq!(scope.resolve("name", 1).unwrap(), Value::Object(outer));
        assert_eq!(
            scope.resolve("name", 2).unwrap_err(),
            BindingError::UndefinedAncestorScope {
                requested: 2,
                available: 1
            }
        );
    }

    #[test]
    fn test_locals_are_consulted_after_binding_context() {
        let (_, _, scope) = nested();
        crate::runner::ds::operations::object::set(scope.locals(), "$index", Value::from(3))
            .unwrap();
        assert_eq!(
            scope.resolve("$index", 0).unwrap(),
            Value::Object(scope.locals().clone())
        );
    }
}
