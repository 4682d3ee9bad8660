//! Tests for the stock binders and how bindings are ordered and rendered.

use std::{cell::Cell, rc::Rc};

use tether_test::prelude::*;

fn models_with(data: &Object) -> Object {
    Object::from_iter([("data", data.clone())])
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_text_binder_renders_and_follows_changes() {
    let data = Object::from_iter([("foo", "bar")]);
    let el = element("div", &[("rv-text", "data.foo")]);

    let _view = bind([el], models_with(&data), BindOptions::new());
    assert_eq!(el.text_content(), "bar");
    assert!(!el.has_attribute("rv-text"));

    data.set("foo", "baz");
    assert_eq!(el.text_content(), "baz");
}

#[test]
fn test_html_binder_keeps_markup() {
    let data = Object::from_iter([("foo", "<b>bold</b>")]);
    let el = element("div", &[("rv-html", "data.foo")]);

    let _view = bind([el], models_with(&data), BindOptions::new());
    assert_eq!(el.inner_html(), "<b>bold</b>");
    assert_eq!(el.text_content(), "bold");
}

#[test]
fn test_binds_every_root_node() {
    let data = Object::from_iter([("foo", "bar")]);
    let first = element("div", &[("rv-text", "data.foo")]);
    let second = element("div", &[("rv-text", "data.foo")]);

    let _view = bind([first, second], models_with(&data), BindOptions::new());
    assert_eq!(first.text_content(), "bar");
    assert_eq!(second.text_content(), "bar");
}

#[test]
fn test_constant_declarations_render_once() {
    let el = element("div", &[("rv-text", "'hello world'")]);
    let view = bind([el], Object::new(), BindOptions::new());
    assert_eq!(el.text_content(), "hello world");
    assert_eq!(view.bindings()[0].keypath(), None);
}

#[test]
fn test_show_hide_enabled_and_class() {
    let data = Object::from_iter([("on", true)]);
    let shown = element("div", &[("rv-show", "data.on")]);
    let hidden = element("div", &[("rv-hide", "data.on")]);
    let disabled = element("button", &[("rv-disabled", "data.on")]);
    let classed = element("div", &[("class", "item"), ("rv-class-active", "data.on")]);

    let _view = bind(
        [shown, hidden, disabled, classed],
        models_with(&data),
        BindOptions::new(),
    );
    assert!(!shown.hidden());
    assert!(hidden.hidden());
    assert!(disabled.disabled());
    assert_eq!(classed.classes(), ["item", "active"]);

    data.set("on", false);
    assert!(shown.hidden());
    assert!(!hidden.hidden());
    assert!(!disabled.disabled());
    assert_eq!(classed.classes(), ["item"]);
}

#[test]
fn test_unknown_directives_stay_in_place() {
    let data = Object::from_iter([("foo", "bar")]);
    let el = element("div", &[("rv-nope", "data.foo"), ("rv-text", "data.foo")]);

    let view = bind([el], models_with(&data), BindOptions::new());
    assert_eq!(view.bindings().len(), 1);
    assert_eq!(el.attribute("rv-nope").as_deref(), Some("data.foo"));
}

#[test]
fn test_catch_all_binder_sets_attributes() {
    let data = Object::from_iter([("href", "/home")]);
    let el = element("a", &[("rv-href", "data.href")]);

    let options = BindOptions::new().binder("*", AttributeBinder);
    let _view = bind([el], models_with(&data), options);
    assert_eq!(el.attribute("href").as_deref(), Some("/home"));

    data.set("href", Value::Null);
    assert!(!el.has_attribute("href"));
}

#[test]
fn test_malformed_declaration_is_skipped() {
    let el = element("div", &[("rv-text", "'unterminated"), ("rv-show", "data.on")]);
    let view = bind([el], Object::new(), BindOptions::new());
    assert_eq!(view.bindings().len(), 1);
    assert_eq!(view.bindings()[0].name(), "show");
}

#[test]
fn test_custom_prefix() {
    let data = Object::from_iter([("foo", "bar")]);
    let el = element("div", &[("data-text", "data.foo"), ("rv-text", "data.missing")]);

    let _view = bind([el], models_with(&data), BindOptions::new().prefix("data"));
    assert_eq!(el.text_content(), "bar");
    assert!(el.has_attribute("rv-text"));
}

#[test]
fn test_nested_keypath_relinks_when_parent_replaced() {
    let old_address = Object::from_iter([("city", "Paris")]);
    let user = Object::from_iter([("address", old_address.clone())]);
    let models = Object::from_iter([("user", user.clone())]);
    let el = element("span", &[("rv-text", "user.address.city")]);

    let _view = bind([el], models, BindOptions::new());
    assert_eq!(el.text_content(), "Paris");

    let new_address = Object::from_iter([("city", "Oslo")]);
    user.set("address", new_address.clone());
    assert_eq!(el.text_content(), "Oslo");

    old_address.set("city", "Rome");
    assert_eq!(el.text_content(), "Oslo");
    assert_eq!(observer::callback_count(&old_address, "city"), 0);

    new_address.set("city", "Lima");
    assert_eq!(el.text_content(), "Lima");
}

#[test]
fn test_bindings_resolve_the_nearest_scope() {
    let el = element("span", &[("rv-text", "name")]);
    let models = Object::from_iter([("name", "root")]);
    let view = bind([el], models.clone(), BindOptions::new());
    assert_eq!(el.text_content(), "root");

    models.set("name", "changed");
    assert_eq!(el.text_content(), "changed");
    view.unbind();
}

// =============================================================================
// Priority
// =============================================================================

fn bind_order(a: Recorder, b: Recorder, log: &EventLog) -> (usize, usize) {
    let data = Object::from_iter([("x", "1")]);
    let el = element("div", &[("rv-a", "data.x"), ("rv-b", "data.x")]);
    let options = BindOptions::new().binder("a", a).binder("b", b);
    let _view = bind([el], models_with(&data), options);
    (
        log.position("a:bind").expect("a bound"),
        log.position("b:bind").expect("b bound"),
    )
}

#[test]
fn test_higher_priority_binds_first() {
    let log = EventLog::new();
    let (a, b) = bind_order(
        Recorder::new("a", &log).with_priority(10),
        Recorder::new("b", &log).with_priority(30),
        &log,
    );
    assert!(b < a);
}

#[test]
fn test_lower_priority_binds_later() {
    let log = EventLog::new();
    let (a, b) = bind_order(
        Recorder::new("a", &log).with_priority(5),
        Recorder::new("b", &log).with_priority(2),
        &log,
    );
    assert!(a < b);
}

#[test]
fn test_missing_priority_sorts_as_zero() {
    let log = EventLog::new();
    let (a, b) = bind_order(
        Recorder::new("a", &log),
        Recorder::new("b", &log).with_priority(1),
        &log,
    );
    assert!(b < a);
}

#[test]
fn test_equal_priorities_keep_declaration_order() {
    let log = EventLog::new();
    let data = Object::from_iter([("x", "1")]);
    let el = element(
        "div",
        &[
            ("rv-c", "data.x"),
            ("rv-a", "data.x"),
            ("rv-b", "data.x"),
            ("rv-d", "data.x"),
        ],
    );
    let options = BindOptions::new()
        .binder("a", Recorder::new("a", &log).with_priority(30))
        .binder("b", Recorder::new("b", &log).with_priority(10))
        .binder("c", Recorder::new("c", &log))
        .binder("d", Recorder::new("d", &log));

    let _view = bind([el], models_with(&data), options);
    let binds: Vec<String> = log
        .entries()
        .into_iter()
        .filter(|entry| entry.ends_with(":bind"))
        .collect();
    assert_eq!(binds, ["a:bind", "b:bind", "c:bind", "d:bind"]);
}

#[test]
fn test_binder_lifecycle_is_recorded() {
    let log = EventLog::new();
    let recorder = Recorder::new("r", &log);
    let data = Object::from_iter([("x", "one")]);
    let el = element("div", &[("rv-r", "data.x")]);

    let view = bind(
        [el],
        models_with(&data),
        BindOptions::new().binder("r", recorder.clone()),
    );
    data.set("x", "two");
    view.unbind();
    data.set("x", "three");

    assert_eq!(
        log.entries(),
        ["r:bind", "r:routine:one", "r:routine:two", "r:unbind"]
    );
    assert_eq!(recorder.routine_count(), 2);
}

#[test]
fn test_closure_binders() {
    let seen = Rc::new(Cell::new(0));
    let binder = {
        let seen = seen.clone();
        move |binding: &Binding, value: &Value| {
            seen.set(seen.get() + 1);
            binding.node().set_attribute("seen", &value.to_display_string());
        }
    };
    let data = Object::from_iter([("x", 7)]);
    let el = element("div", &[("rv-seen", "data.x")]);

    let _view = bind([el], models_with(&data), BindOptions::new().binder("seen", binder));
    assert_eq!(el.attribute("seen").as_deref(), Some("7"));
    assert_eq!(seen.get(), 1);
}

// =============================================================================
// Two-way binding
// =============================================================================

#[test]
fn test_value_binder_publishes_on_input() {
    let data = Object::from_iter([("foo", "bar")]);
    let el = input("text", &[("rv-value", "data.foo")]);

    let _view = bind([el], models_with(&data), BindOptions::new());
    assert_eq!(el.value(), "bar");

    el.set_value("qux");
    el.dispatch("input");
    assert_eq!(data.get("foo"), Value::from("qux"));

    data.set("foo", "zap");
    assert_eq!(el.value(), "zap");
}

#[test]
fn test_event_name_attribute_picks_publish_event() {
    let data = Object::from_iter([("foo", "bar")]);
    let el = input("text", &[("event-name", "blur"), ("rv-value", "data.foo")]);

    let _view = bind([el], models_with(&data), BindOptions::new());
    el.set_value("typed");
    el.dispatch("input");
    assert_eq!(data.get("foo"), Value::from("bar"));

    el.dispatch("blur");
    assert_eq!(data.get("foo"), Value::from("typed"));
}

#[test]
fn test_unbind_removes_publish_listener() {
    let data = Object::from_iter([("foo", "bar")]);
    let el = input("text", &[("rv-value", "data.foo")]);

    let view = bind([el], models_with(&data), BindOptions::new());
    assert_eq!(el.listener_count("input"), 1);
    view.unbind();
    assert_eq!(el.listener_count("input"), 0);

    el.set_value("ignored");
    el.dispatch("input");
    assert_eq!(data.get("foo"), Value::from("bar"));
}

#[test]
fn test_checkbox_checked_follows_and_publishes() {
    let data = Object::from_iter([("done", true)]);
    let checked = input("checkbox", &[("rv-checked", "data.done")]);
    let unchecked = input("checkbox", &[("rv-unchecked", "data.done")]);

    let _view = bind([checked, unchecked], models_with(&data), BindOptions::new());
    assert!(checked.checked());
    assert!(!unchecked.checked());

    checked.click();
    assert_eq!(data.get("done"), Value::Bool(false));
    assert!(unchecked.checked());

    unchecked.click();
    assert_eq!(data.get("done"), Value::Bool(true));
    assert!(checked.checked());
}

#[test]
fn test_radio_group_publishes_its_value() {
    let data = Object::from_iter([("color", "blue")]);
    let red = input(
        "radio",
        &[("name", "color"), ("value", "red"), ("rv-checked", "data.color")],
    );
    let blue = input(
        "radio",
        &[("name", "color"), ("value", "blue"), ("rv-checked", "data.color")],
    );
    let form = element_with("form", &[], &[red, blue]);

    let _view = bind([form], models_with(&data), BindOptions::new());
    assert!(!red.checked());
    assert!(blue.checked());

    red.click();
    assert_eq!(data.get("color"), Value::from("red"));
    assert!(red.checked());
    assert!(!blue.checked());

    data.set("color", "blue");
    assert!(!red.checked());
    assert!(blue.checked());
}

#[test]
fn test_radio_value_sets_the_attribute() {
    let data = Object::from_iter([("option", "small")]);
    let el = input("radio", &[("rv-value", "data.option")]);

    let _view = bind([el], models_with(&data), BindOptions::new());
    assert_eq!(el.attribute("value").as_deref(), Some("small"));
    assert_eq!(el.listener_count("input"), 0);
}

// =============================================================================
// Formatters
// =============================================================================

fn upper(value: Value, _: &[Value]) -> Value {
    Value::from(value.to_display_string().to_uppercase())
}

#[test]
fn test_formatter_applies_on_read() {
    let data = Object::from_iter([("name", "abc")]);
    let el = element("div", &[("rv-text", "data.name | upper")]);

    let _view = bind([el], models_with(&data), BindOptions::new().formatter("upper", upper));
    assert_eq!(el.text_content(), "ABC");

    data.set("name", "xyz");
    assert_eq!(el.text_content(), "XYZ");
}

#[test]
fn test_watch_rerenders_on_argument_change() {
    let reads = Rc::new(Cell::new(0));
    let count_read = {
        let reads = reads.clone();
        move |_: Value, _: &[Value]| {
            reads.set(reads.get() + 1);
            Value::from(reads.get())
        }
    };
    let data = Object::from_iter([("foo", "a"), ("bar", "b")]);
    let el = element("div", &[("rv-text", "data.foo | countRead | watch data.bar")]);

    let _view = bind(
        [el],
        models_with(&data),
        BindOptions::new().formatter("countRead", count_read),
    );
    assert_eq!(el.text_content(), "1");

    data.set("bar", "changed");
    assert_eq!(el.text_content(), "2");
}

#[test]
fn test_formatter_arguments() {
    let suffix = |value: Value, args: &[Value]| {
        let mut text = value.to_display_string();
        for arg in args {
            text.push_str(&arg.to_display_string());
        }
        Value::from(text)
    };
    let data = Object::from_iter([("name", "x"), ("tail", "!")]);
    let el = element("div", &[("rv-text", "data.name | suffix '-' 1 data.tail")]);

    let _view = bind([el], models_with(&data), BindOptions::new().formatter("suffix", suffix));
    assert_eq!(el.text_content(), "x-1!");

    data.set("tail", "?");
    assert_eq!(el.text_content(), "x-1?");
}

#[test]
fn test_not_formatter_publishes_negated() {
    let data = Object::from_iter([("off", false)]);
    let el = input("checkbox", &[("rv-checked", "data.off | not")]);

    let _view = bind([el], models_with(&data), BindOptions::new());
    assert!(el.checked());

    el.click();
    assert_eq!(data.get("off"), Value::Bool(true));
}

#[test]
fn test_unknown_formatter_passes_through() {
    let data = Object::from_iter([("name", "abc")]);
    let el = element("div", &[("rv-text", "data.name | missing")]);

    let _view = bind([el], models_with(&data), BindOptions::new());
    assert_eq!(el.text_content(), "abc");
}

// =============================================================================
// Text interpolation
// =============================================================================

#[test]
fn test_text_interpolation() {
    let user = Object::from_iter([("name", "Ada")]);
    let models = Object::from_iter([("user", user.clone())]);
    let el = element_with("p", &[], &[NodeId::text("Hello { user.name }!")]);

    let _view = bind([el], models, BindOptions::new());
    assert_eq!(el.text_content(), "Hello Ada!");
    assert_eq!(el.children().len(), 3);

    user.set("name", "Grace");
    assert_eq!(el.text_content(), "Hello Grace!");
}

#[test]
fn test_text_interpolation_with_formatter() {
    let user = Object::from_iter([("name", "ada")]);
    let models = Object::from_iter([("user", user)]);
    let el = element_with("p", &[], &[NodeId::text("{ user.name | upper }")]);

    let _view = bind([el], models, BindOptions::new().formatter("upper", upper));
    assert_eq!(el.text_content(), "ADA");
}

#[test]
fn test_interpolation_disabled_without_delimiters() {
    let models = Object::from_iter([("name", "Ada")]);
    let el = element_with("p", &[], &[NodeId::text("{ name }")]);

    let view = bind([el], models, BindOptions::new().template_delimiters(None));
    assert!(view.bindings().is_empty());
    assert_eq!(el.text_content(), "{ name }");
}

// =============================================================================
// Keypaths through lists
// =============================================================================

#[test]
fn test_list_index_and_length_keypaths() {
    let items: List = ["a", "b"].into_iter().collect();
    let data = Object::from_iter([("items", items.clone())]);
    let first = element("span", &[("rv-text", "data.items.0")]);
    let count = element("span", &[("rv-text", "data.items.length")]);

    let _view = bind([first, count], models_with(&data), BindOptions::new());
    assert_eq!(first.text_content(), "a");
    assert_eq!(count.text_content(), "2");

    items.push("c");
    assert_eq!(count.text_content(), "3");

    items.unshift("z");
    assert_eq!(first.text_content(), "z");
}

#[test]
fn test_list_mutation_renders_length_once() {
    let log = EventLog::new();
    let recorder = Recorder::new("x", &log);
    let items: List = [1].into_iter().map(Value::from).collect();
    let data = Object::from_iter([("items", items.clone())]);
    let el = element("span", &[("rv-x", "data.items.length")]);

    let _view = bind(
        [el],
        models_with(&data),
        BindOptions::new().binder("x", recorder.clone()),
    );
    assert_eq!(recorder.routine_count(), 1);

    items.push(2);
    assert_eq!(recorder.routine_count(), 2);
    assert_eq!(log.entries().last().map(String::as_str), Some("x:routine:2"));

    items.sort();
    assert_eq!(recorder.routine_count(), 3);
}

#[test]
fn test_models_from_json() {
    let json = serde_json::json!({ "user": { "name": "Ada", "tags": ["x", "y"] } });
    let Value::Object(models) = Value::from(json) else {
        panic!("json objects become objects");
    };
    let name = element("span", &[("rv-text", "user.name")]);
    let tags = element("span", &[("rv-text", "user.tags.length")]);

    let _view = bind([name, tags], models, BindOptions::new());
    assert_eq!(name.text_content(), "Ada");
    assert_eq!(tags.text_content(), "2");
}
