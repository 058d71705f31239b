//! # bindery - reactive data binding in Rust
//!
//! Binds view objects to a model through small expressions:
//! - PEG parser for the binding expression language
//! - Evaluator with evaluate, connect (dependency collection) and assign modes
//! - Property observers that intercept writes and notify subscribers
//! - Property and let bindings with one-time, to-view, from-view and two-way modes
//! - `if`/`else` and `repeat` controllers that patch their views in place
//!
//! ## Quick Start
//!
//! ### Parsing an expression
//!
//! ```
//! use bindery::parser::BindingParser;
//!
//! let ast = BindingParser::parse_to_ast_from_str("user.name | upper").unwrap();
//! println!("Parsed {}", ast);
//! ```
//!
//! ### Evaluating against a scope
//!
//! ```
//! use bindery::parser::BindingParser;
//! use bindery::runner::ds::object::object_from;
//! use bindery::runner::ds::scope::Scope;
//! use bindery::runner::ds::value::Value;
//! use bindery::runner::eval::expression::evaluate_expression;
//! use bindery::runner::plugin::types::EvalContext;
//!
//! let model = object_from(vec![("price", Value::from(4)), ("qty", Value::from(3))]);
//! let scope = Scope::new(Value::Object(model));
//! let ast = BindingParser::parse_to_ast_from_str("price * qty").unwrap();
//!
//! let total = evaluate_expression(&ast, &scope, &EvalContext::new()).unwrap();
//! assert_eq!(total, Value::from(12));
//! ```
//!
//! ### Keeping a view property in sync
//!
//! ```
//! use bindery::parser::BindingParser;
//! use bindery::runner::binding::property_binding::PropertyBinding;
//! use bindery::runner::binding::{Bindable, BindingMode};
//! use bindery::runner::ds::object::{new_object, object_from};
//! use bindery::runner::ds::operations::object::{get, set};
//! use bindery::runner::ds::scope::Scope;
//! use bindery::runner::ds::value::Value;
//! use bindery::runner::plugin::types::EvalContext;
//!
//! let model = object_from(vec![("name", Value::from("Ada"))]);
//! let input = new_object();
//! let ast = BindingParser::parse_to_ast_from_str("name").unwrap();
//! let binding = PropertyBinding::to_property(ast, &input, "value", BindingMode::TwoWay, EvalContext::new());
//! binding.bind(&Scope::new(Value::Object(model.clone()))).unwrap();
//! assert_eq!(get(&input, "value"), Value::from("Ada"));
//!
//! // the model follows the view...
//! set(&input, "value", Value::from("Grace")).unwrap();
//! assert_eq!(get(&model, "name"), Value::from("Grace"));
//!
//! // ...and the view follows the model
//! set(&model, "name", Value::from("Hedy")).unwrap();
//! assert_eq!(get(&input, "value"), Value::from("Hedy"));
//! ```
//!
//! ### Rendering a list
//!
//! ```
//! use bindery::parser::BindingParser;
//! use bindery::runner::binding::Bindable;
//! use bindery::runner::ds::array_object::new_array;
//! use bindery::runner::ds::object::object_from;
//! use bindery::runner::ds::operations::object::array_push;
//! use bindery::runner::ds::scope::Scope;
//! use bindery::runner::ds::value::Value;
//! use bindery::runner::plugin::types::EvalContext;
//! use bindery::runner::templating::view::ViewFactory;
//! use std::rc::Rc;
//!
//! let parse = |s: &str| BindingParser::parse_to_ast_from_str(s).unwrap();
//! let items = new_array(vec![Value::from("a"), Value::from("b")]);
//! let model = object_from(vec![("items", Value::Object(items.clone()))]);
//!
//! let row = ViewFactory::new("row").add_text(parse("$index + '=' + item + ' '"));
//! let list = Rc::new(ViewFactory::new("list").add_repeat(Some("item"), parse("items"), row));
//! let view = list.create(&EvalContext::new());
//! view.bind(&Scope::new(Value::Object(model))).unwrap();
//! assert_eq!(view.text_content(), "0=a 1=b ");
//!
//! array_push(&items, vec![Value::from("c")]).unwrap();
//! assert_eq!(view.text_content(), "0=a 1=b 2=c ");
//! ```
//!
//! ## Change propagation
//!
//! Every model write goes through [`runner::ds::operations::object::set`] or
//! one of the array operations next to it. A write that changes a value
//! notifies the property's observer, which notifies its subscribers in
//! subscription order. Bindings re-run their expression in connect mode,
//! replace their dependency set with the observers actually read, and queue
//! the target write on the context's [`runner::task_queue::TaskQueue`].
//!
//! ## Architecture
//!
//! - **[`parser`]** - PEG grammar and expression AST
//! - **[`runner`]** - Runtime
//!   - **[`runner::ds`]** - values, objects, scopes
//!   - **[`runner::observation`]** - observers and the observer locator
//!   - **[`runner::eval`]** - evaluate, connect and assign
//!   - **[`runner::binding`]** - property and let bindings
//!   - **[`runner::templating`]** - views and controllers
//!   - **[`runner::plugin`]** - context, resources and configuration

#[macro_use]
extern crate lazy_static;

pub mod parser;
pub mod runner;
