//! Runtime: model data, observation, evaluation, bindings and controllers.
//!
//! - **[`ds`]** - values, objects, arrays, scopes and the operations on them
//! - **[`observation`]** - property and collection observers
//! - **[`eval`]** - evaluate, connect and assign
//! - **[`binding`]** - property and let bindings
//! - **[`templating`]** - views, render slots and the if/repeat controllers
//! - **[`plugin`]** - evaluation context, resources and configuration
//! - **[`std_lib`]** - built-in array and string methods
//! - **[`task_queue`]** - immediate and deferred write scheduling

pub mod binding;
pub mod ds;
pub mod eval;
pub mod observation;
pub mod plugin;
pub mod std_lib;
pub mod task_queue;
pub mod templating;
