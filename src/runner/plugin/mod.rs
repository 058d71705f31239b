//! Evaluation context, resources and configuration.
//!
//! Every binding, controller and evaluator call carries an
//! [`EvalContext`](types::EvalContext): the shared observer locator, the
//! [`ResourceRegistry`](registry::ResourceRegistry) holding built-in methods
//! and value converters, the [`EngineConfig`](config::EngineConfig) and the
//! write queue.
//!
//! ## Registering a value converter
//!
//! ```
//! use bindery::runner::ds::value::Value;
//! use bindery::runner::eval::types::ValueResult;
//! use bindery::runner::plugin::registry::ResourceRegistry;
//! use bindery::runner::plugin::types::{EvalContext, FnConverter};
//! use std::rc::Rc;
//!
//! let mut resources = ResourceRegistry::with_core();
//! resources.register_converter(
//!     "shout",
//!     Rc::new(FnConverter(|v: Value, _: &[Value]| -> ValueResult {
//!         Ok(Value::String(format!("{}!", v)))
//!     })),
//! );
//! let ctx = EvalContext::new().with_resources(resources);
//! assert!(ctx.resources.get_converter("shout").is_some());
//! ```
//!
//! ## Configuration
//!
//! ```
//! use bindery::runner::plugin::config::{EngineConfig, ErrorPolicy};
//!
//! let config = EngineConfig::parse("[binding]\nreactive_error_policy = \"propagate\"").unwrap();
//! assert_eq!(config.reactive_error_policy(), ErrorPolicy::Propagate);
//! ```

pub mod config;
pub mod registry;
pub mod types;
