//! Tests for keypaths that cross into a custom adapter.

use tether_test::prelude::*;

fn user_models(model: &Model) -> Object {
    Object::from_iter([("user", model.to_value())])
}

#[test]
fn test_reads_and_subscribes_through_the_adapter() {
    let model = Model::from_iter([("name", "Ada")]);
    let el = element("div", &[("data-text", "user:name")]);

    let _view = bind([el], user_models(&model), model_options());
    assert_eq!(el.text_content(), "Ada");
    assert!(model.gets("name") > 0);
    assert!(model.was_called(&Call::On("name".into())));
    assert_eq!(model.handler_count("name"), 1);

    model.set("name", "Grace");
    assert_eq!(el.text_content(), "Grace");
}

#[test]
fn test_no_reads_without_preload() {
    let model = Model::from_iter([("name", "Ada")]);
    let el = element("div", &[("data-text", "user:name")]);

    let _view = bind([el], user_models(&model), model_options().preload_data(false));
    assert_eq!(model.gets("name"), 0);
    assert!(model.was_called(&Call::On("name".into())));
    assert_eq!(el.text_content(), "");

    model.set("name", "Grace");
    assert_eq!(el.text_content(), "Grace");
}

#[test]
fn test_unchanged_set_does_not_rerender() {
    let log = EventLog::new();
    let recorder = Recorder::new("r", &log);
    let model = Model::from_iter([("name", "Ada")]);
    let el = element("div", &[("data-r", "user:name")]);

    let _view = bind(
        [el],
        user_models(&model),
        model_options().binder("r", recorder.clone()),
    );
    model.set("name", "Ada");
    assert_eq!(recorder.routine_count(), 1);
}

#[test]
fn test_unbind_unsubscribes() {
    let model = Model::from_iter([("name", "Ada")]);
    let el = element("div", &[("data-text", "user:name")]);

    let view = bind([el], user_models(&model), model_options());
    view.unbind();
    assert!(model.was_called(&Call::Off("name".into())));
    assert_eq!(model.handler_count("name"), 0);

    model.set("name", "Grace");
    assert_eq!(el.text_content(), "Ada");
}

#[test]
fn test_publishes_through_the_adapter() {
    let model = Model::from_iter([("name", "Ada")]);
    let el = input("text", &[("data-value", "user:name")]);

    let _view = bind([el], user_models(&model), model_options());
    el.set_value("Zed");
    el.dispatch("input");
    assert_eq!(model.peek("name"), Value::from("Zed"));
    assert!(model.was_called(&Call::Set("name".into())));
}

#[test]
fn test_replacing_the_model_moves_the_subscription() {
    let old = Model::from_iter([("name", "Ada")]);
    let session = Object::from_iter([("user", old.to_value())]);
    let models = Object::from_iter([("session", session.clone())]);
    let el = element("div", &[("data-text", "session.user:name")]);

    let _view = bind([el], models, model_options());
    assert_eq!(el.text_content(), "Ada");

    let new = Model::from_iter([("name", "Grace")]);
    session.set("user", new.to_value());
    assert_eq!(el.text_content(), "Grace");
    assert_eq!(old.handler_count("name"), 0);
    assert_eq!(new.handler_count("name"), 1);

    old.set("name", "stale");
    assert_eq!(el.text_content(), "Grace");
}

#[test]
fn test_models_inside_iteration() {
    let first = Model::from_iter([("name", "a")]);
    let second = Model::from_iter([("name", "b")]);
    let people = List::from_iter([first.to_value(), second.to_value()]);
    let data = Object::from_iter([("people", people)]);
    let template = element("li", &[("data-each-person", "data.people"), ("data-text", "person:name")]);
    let ul = element_with("ul", &[], &[template]);

    let _view = bind([ul], Object::from_iter([("data", data)]), model_options());
    assert_eq!(texts(ul, "li"), ["a", "b"]);

    second.set("name", "c");
    assert_eq!(texts(ul, "li"), ["a", "c"]);
}

#[test]
fn test_unregistered_interface_is_plain_text() {
    let model = Model::from_iter([("name", "Ada")]);
    let el = element("div", &[("rv-text", "user:name")]);

    // Without the adapter `:` is not an interface, so the whole keypath is
    // one key of the root models.
    let _view = bind([el], user_models(&model), BindOptions::new());
    assert_eq!(el.text_content(), "");
    assert_eq!(model.gets("name"), 0);
}
