//! Bindings: live associations between a source expression and a target.
//!
//! Everything that can be activated against a [`Scope`] implements
//! [`Bindable`]: property and let bindings, the structural controllers and
//! whole views.

pub mod accessor;
pub mod connections;
pub mod let_binding;
pub mod property_binding;

use crate::parser::ast::ExpressionType;
use crate::runner::ds::error::BindingError;
use crate::runner::ds::scope::Scope;
use crate::runner::plugin::config::ErrorPolicy;
use crate::runner::plugin::types::EvalContext;
use tracing::warn;

pub trait Bindable {
    /// Activates against `scope`. Binding again with a different scope
    /// rebinds; with the same scope it is a no-op. On error nothing stays
    /// bound.
    fn bind(&self, scope: &Scope) -> Result<(), BindingError>;

    /// Drops every subscription and releases the scope. Idempotent.
    fn unbind(&self);

    fn is_bound(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingMode {
    /// Written once on bind, never observed.
    OneTime,
    ToView,
    /// Target changes are assigned back to the source; the source is not read.
    FromView,
    TwoWay,
}

impl BindingMode {
    pub fn observes_source(&self) -> bool {
        matches!(self, BindingMode::ToView | BindingMode::TwoWay)
    }

    pub fn observes_target(&self) -> bool {
        matches!(self, BindingMode::FromView | BindingMode::TwoWay)
    }
}

/// Applies the configured policy to an error raised by a reactive update.
pub(crate) fn reactive_failure(
    ctx: &EvalContext,
    source: &ExpressionType,
    error: BindingError,
) -> Result<(), BindingError> {
    match ctx.config.reactive_error_policy() {
        ErrorPolicy::Log => {
            warn!(expression = %source, error = %error, "reactive update failed, keeping last value");
            Ok(())
        }
        ErrorPolicy::Propagate => Err(error),
    }
}
