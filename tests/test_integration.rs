//! End-to-end scenarios: configuration files, composed views and logging.

extern crate bindery;


use binding_util::*;
use bindery::runner::binding::property_binding::PropertyBinding;
use bindery::runner::binding::{Bindable, BindingMode};
use bindery::runner::ds::array_object::new_array;
use bindery::runner::ds::error::BindingError;
use bindery::runner::ds::object::{new_object, object_from};
use bindery::runner::ds::operations::object::{array_push, set};
use bindery::runner::ds::value::Value;
use bindery::runner::eval::types::ValueResult;
use bindery::runner::plugin::config::{EngineConfig, ErrorPolicy};
use bindery::runner::plugin::registry::ResourceRegistry;
use bindery::runner::plugin::types::{EvalContext, FnConverter};
use bindery::runner::templating::view::ViewFactory;
use std::fs;
use std::rc::Rc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn write_config(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("bindery-{}-{}.toml", name, std::process::id()));
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_file_drives_error_policy() {
    init_tracing();
    let path = write_config("policy", "[binding]\nreactive_error_policy = \"propagate\"\n");
    let config = EngineConfig::load(&path).unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(config.reactive_error_policy(), ErrorPolicy::Propagate);

    let m = model(vec![("user", Value::Object(object_from(vec![("name", Value::from("a"))])))]);
    let element = new_object();
    let binding = PropertyBinding::to_property(
        expr("user.name"),
        &element,
        "value",
        BindingMode::ToView,
        EvalContext::new().with_config(config),
    );
    binding.bind(&root_scope(&m)).unwrap();
    assert!(matches!(
        set(&m, "user", Value::Undefined),
        Err(BindingError::EvaluationError(_))
    ));
}

#[test]
fn test_config_file_disables_view_cache() {
    let path = write_config("cache", "[templating]\ncache_conditional_views = false\n");
    let config = EngineConfig::load(&path).unwrap();
    fs::remove_file(&path).ok();
    assert!(!config.cache_conditional_views());
    assert_eq!(config.reactive_error_policy(), ErrorPolicy::Log);
}

#[test]
fn test_invalid_config_file() {
    let path = write_config("invalid", "[observation]\nstrict = \"yes\"\n");
    let result = EngineConfig::load(&path);
    fs::remove_file(&path).ok();
    assert!(matches!(result, Err(BindingError::Configuration(_))));
}

// ============================================================================
// Composed views
// ============================================================================

fn shop_context() -> EvalContext {
    let mut resources = ResourceRegistry::with_core();
    resources.register_converter(
        "price",
        Rc::new(FnConverter(|v: Value, _: &[Value]| -> ValueResult {
            Ok(Value::from(format!("${}", v)))
        })),
    );
    EvalContext::new().with_resources(resources)
}

#[test]
fn test_shopping_cart() {
    init_tracing();
    let apple = object_from(vec![("name", Value::from("apple")), ("cost", Value::from(2))]);
    let pear = object_from(vec![("name", Value::from("pear")), ("cost", Value::from(3))]);
    let lines = new_array(vec![Value::Object(apple.clone()), Value::Object(pear)]);
    let m = model(vec![
        ("lines", Value::Object(lines.clone())),
        ("coupon", Value::from("")),
    ]);

    let line = ViewFactory::new("line").add_text(expr("`${$index + 1}.${line.name}=${line.cost | price};`"));
    let empty = ViewFactory::new("empty").add_text(expr("'empty'"));
    let root = ViewFactory::new("cart")
        .add_let(expr("lines.length"), "count")
        .add_if(expr("count"), ViewFactory::new("list").add_repeat(Some("line"), expr("lines"), line), Some(empty))
        .add_property(expr("coupon"), "coupon", BindingMode::TwoWay);
    let view = Rc::new(root).create(&shop_context());
    view.bind(&root_scope(&m)).unwrap();
    assert_eq!(view.text_content(), "1.apple=$2;2.pear=$3;");

    put(&apple, "cost", Value::from(5));
    assert_eq!(view.text_content(), "1.apple=$5;2.pear=$3;");

    array_push(&lines, vec![Value::Object(object_from(vec![("name", Value::from("fig")), ("cost", Value::from(1))]))]).unwrap();
    assert_eq!(view.text_content(), "1.apple=$5;2.pear=$3;3.fig=$1;");

    put(&m, "lines", Value::Object(new_array(vec![])));
    assert_eq!(view.text_content(), "empty");
    assert_eq!(prop(&m, "count"), Value::from(0));

    put(view.element(), "coupon", Value::from("SAVE"));
    assert_eq!(prop(&m, "coupon"), Value::from("SAVE"));
}

#[test]
fn test_deferred_form_converges() {
    init_tracing();
    let (ctx, queue) = deferred_ctx();
    let m = model(vec![("name", Value::from("ada")), ("show", Value::Boolean(true))]);
    let root = ViewFactory::new("form").add_if(
        expr("show"),
        ViewFactory::new("greeting").add_text(expr("'hi ' + name.toUpperCase()")),
        None,
    );
    let view = Rc::new(root).create(&ctx);
    view.bind(&root_scope(&m)).unwrap();
    queue.flush().unwrap();
    assert_eq!(view.text_content(), "hi ADA");

    put(&m, "name", Value::from("grace"));
    put(&m, "show", Value::Boolean(false));
    put(&m, "show", Value::Boolean(true));
    assert!(!queue.is_empty());
    queue.flush().unwrap();
    assert!(queue.is_empty());
    assert_eq!(view.text_content(), "hi GRACE");
}
