//! Expression evaluation against a [`Scope`](crate::runner::ds::scope::Scope).
//!
//! Three entry points share one walker: [`evaluate_expression`] reads,
//! [`connect_expression`] reads while collecting dependencies and
//! [`assign_expression`] writes back through an assignable expression.

pub mod expression;
pub mod types;

pub use expression::{assign_expression, connect_expression, evaluate_expression};
pub use types::{DependencySet, EvalMode, ValueResult};
