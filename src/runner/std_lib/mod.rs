//! Built-in methods callable on arrays and strings from binding expressions.

pub mod array;
pub mod string;

use crate::runner::plugin::registry::ResourceRegistry;

/// Register every built-in object with the registry.
pub fn register_core_builtins(registry: &mut ResourceRegistry) {
    array::register(registry);
    string::register(registry);
}
