use std::collections::BTreeMap;

use formbind_core::{Form, FormConfig, JsonModel, Model, Patch, Resolver, Rule};
use serde_json::{Value, json};

fn form(data: Value) -> Form<JsonModel> {
    Form::new(FormConfig::default(), JsonModel::new(data), Resolver::default())
}

fn form_with_rules(data: Value, rules: Value) -> Form<JsonModel> {
    let rules: BTreeMap<String, Rule> = serde_json::from_value(rules).unwrap();
    let model = JsonModel::with_rules(data, rules).expect("rules compile");
    Form::new(FormConfig::default(), model, Resolver::default())
}

#[test]
fn value_reads_nested_paths_without_materializing() {
    let f = form(json!({"name": "app", "icons": [{"name": "ipad152x152", "uri": "/a.png"}]}));
    assert_eq!(f.value("name").unwrap(), Some(json!("app")));
    assert_eq!(
        f.value("icons[name=ipad152x152].uri").unwrap(),
        Some(json!("/a.png"))
    );
    assert_eq!(f.value("icons[name=iphone].uri").unwrap(), None);
    assert_eq!(f.to_json()["icons"].as_array().unwrap().len(), 1);
}

#[test]
fn change_of_existing_leaf_patches_one_field() {
    let mut f = form(json!({"name": "a", "icons": [{"name": "x", "uri": "old"}]}));
    let patch = f.on_change("icons[name=x].uri", json!("new")).unwrap();
    assert_eq!(patch.len(), 1);
    assert_eq!(patch.get(".icons[0].uri"), Some(&json!("new")));
    assert_eq!(f.model().data()["icons"][0]["uri"], json!("new"));
    assert_eq!(f.model().data()["name"], json!("a"));
}

#[test]
fn change_that_appends_an_element_patches_each_of_its_fields() {
    let mut f = form(json!({"icons": []}));
    let patch = f
        .on_change("icons[name=ipad152x152].uri", json!("/img/ipad.png"))
        .unwrap();
    let keys: Vec<String> = patch.keys().collect();
    assert_eq!(keys, vec![".icons[0].name", ".icons[0].uri"]);
    assert_eq!(patch.get(".icons[0].uri"), Some(&json!("/img/ipad.png")));
    assert_eq!(
        f.model().data(),
        &json!({"icons": [{"name": "ipad152x152", "uri": "/img/ipad.png"}]})
    );
    assert_eq!(
        serde_json::to_value(&patch).unwrap(),
        json!({".icons[0].name": "ipad152x152", ".icons[0].uri": "/img/ipad.png"})
    );
}

#[test]
fn change_that_creates_nested_mappings_is_a_single_entry() {
    let mut f = form(json!({}));
    let patch = f.on_change("meta.title", json!("T")).unwrap();
    assert_eq!(patch.len(), 1);
    assert_eq!(patch.get(".meta.title"), Some(&json!("T")));
    assert_eq!(f.model().data(), &json!({"meta": {"title": "T"}}));
}

#[test]
fn change_replacing_a_whole_element_patches_the_sequence() {
    let mut f = form(json!({"icons": [{"name": "x"}]}));
    let patch = f.on_change("icons[name=y]", json!({"name": "y", "uri": "u"})).unwrap();
    assert_eq!(patch.keys().collect::<Vec<_>>(), vec![".icons"]);
    assert_eq!(
        f.model().data(),
        &json!({"icons": [{"name": "x"}, {"name": "y", "uri": "u"}]})
    );
}

#[test]
fn failed_change_leaves_model_and_state_alone() {
    let mut f = form(json!({"icons": {"name": "x"}}));
    assert!(f.on_change("icons[name=x].uri", json!("u")).is_err());
    assert_eq!(f.model().data(), &json!({"icons": {"name": "x"}}));
    assert!(f.errors().is_empty());
    assert_eq!(f.input_class_name("icons", true), "");
}

#[test]
fn class_names_are_empty_until_first_validation() {
    let mut f = form_with_rules(json!({"name": ""}), json!({"name": {"required": true}}));
    assert_eq!(f.input_class_name("name", true), "");
    assert_eq!(f.label_class_name("name", true), "");
    assert_eq!(f.input_class_name("name", false), "form-input-success");
    assert_eq!(f.label_class_name("name", false), "form-label-success");

    f.on_change("name", json!("")).unwrap();
    assert_eq!(f.error("name"), Some("is required"));
    assert_eq!(f.error(".name"), Some("is required"));
    assert_eq!(f.input_class_name("name", true), "form-input-error");
    assert_eq!(f.label_class_name("name", true), "form-label-error");

    f.on_change("name", json!("ok")).unwrap();
    assert_eq!(f.error("name"), None);
    assert!(f.errors().is_empty());
    assert_eq!(f.input_class_name("name", true), "form-input-success");
}

#[test]
fn nested_errors_are_keyed_by_normalized_path() {
    let mut f = form_with_rules(
        json!({"icons": []}),
        json!({"icons[].uri": {"pattern": "^/", "message": "must be absolute"}}),
    );
    f.on_change("icons[name=ipad].uri", json!("relative.png")).unwrap();
    assert_eq!(
        f.errors(),
        BTreeMap::from([(".icons[0].uri".to_owned(), "must be absolute".to_owned())])
    );
    assert_eq!(f.error("icons[name=ipad].uri"), Some("must be absolute"));
    assert_eq!(f.label_class_name("icons[name=ipad].uri", true), "form-label-error");
    assert_eq!(f.label_class_name("icons[name=ipad].name", true), "form-label-success");
}

#[test]
fn validation_only_touches_patched_attributes() {
    let mut f = form_with_rules(
        json!({"a": "", "b": ""}),
        json!({"a": {"required": true}, "b": {"required": true}}),
    );
    f.validate_model();
    assert_eq!(f.errors().len(), 2);

    f.on_change("a", json!("x")).unwrap();
    assert_eq!(f.error("a"), None);
    assert_eq!(f.error("b"), Some("is required"));
}

#[test]
fn length_rules_and_is_valid() {
    let mut f = form_with_rules(
        json!({"code": "abcd"}),
        json!({"code": {"minLength": 2, "maxLength": 3}}),
    );
    assert!(!f.is_valid());
    assert_eq!(
        f.validate_model().get(".code").map(String::as_str),
        Some("must be at most 3 characters")
    );
    f.on_change("code", json!("a")).unwrap();
    assert_eq!(f.error("code"), Some("must be at least 2 characters"));
    f.on_change("code", json!("abc")).unwrap();
    assert!(f.is_valid());
    assert!(f.errors().is_empty());
}

#[test]
fn invalid_rule_pattern_is_rejected() {
    let rules = BTreeMap::from([(
        "name".to_owned(),
        Rule {
            pattern: Some("(".into()),
            ..Rule::default()
        },
    )]);
    assert!(JsonModel::with_rules(json!({}), rules).is_err());
}

#[test]
fn configured_class_names_and_mapper() {
    let config: FormConfig = serde_json::from_value(json!({
        "name": "signup",
        "inputErrorClassName": "is-invalid"
    }))
    .unwrap();
    let model = JsonModel::with_rules(
        json!({"email": ""}),
        BTreeMap::from([("email".to_owned(), Rule { required: true, ..Rule::default() })]),
    )
    .unwrap();
    let mut f = Form::new(config, model, Resolver::default())
        .with_class_mapper(|c| if c.is_empty() { String::new() } else { format!("css-{c}") });
    assert_eq!(f.name(), "signup");

    f.validate_model();
    assert_eq!(f.input_class_name("email", true), "css-is-invalid");
    assert_eq!(f.label_class_name("email", true), "css-signup-label-error");
    assert_eq!(FormConfig::named("x").input_success_class(), "x-input-success");
}

#[test]
fn attribute_binding_carries_value_and_input_class() {
    let mut f = form(json!({"name": "app"}));
    let binding = f.attribute("name").unwrap();
    assert_eq!(binding.value, Some(json!("app")));
    assert_eq!(binding.class_name, "");

    f.on_change("name", json!("other")).unwrap();
    let binding = f.attribute("name").unwrap();
    assert_eq!(binding.value, Some(json!("other")));
    assert_eq!(binding.class_name, "form-input-success");
}

#[test]
fn form_config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("form.json");
    std::fs::write(&p, r#"{"name": "profile", "labelSuccessClassName": "ok"}"#).unwrap();
    let config = FormConfig::from_json_file(&p).expect("load config");
    assert_eq!(config.name, "profile");
    assert_eq!(config.label_success_class(), "ok");
    assert_eq!(config.label_error_class(), "profile-label-error");
}

#[test]
fn custom_models_plug_into_forms() {
    #[derive(Default)]
    struct Recorder {
        data: Value,
        applied: Vec<String>,
    }

    impl Model for Recorder {
        fn to_json(&self) -> Value {
            self.data.clone()
        }
        fn apply(&mut self, patch: &Patch) -> formbind_core::PathResult<()> {
            for (path, value) in patch.iter() {
                self.applied.push(path.to_string());
                path.assign(&mut self.data, value.clone())?;
            }
            Ok(())
        }
        fn pre_validate(&self, _attrs: &Patch) -> formbind_core::Errors {
            formbind_core::Errors::new()
        }
    }

    let model = Recorder {
        data: json!({"list": []}),
        ..Recorder::default()
    };
    let mut f = Form::new(FormConfig::default(), model, Resolver::default());
    f.on_change("list[id=1].v", json!(2)).unwrap();
    assert_eq!(f.model().applied, vec![".list[0].id", ".list[0].v"]);
    assert!(f.is_valid());
}

#[test]
fn whole_model_validation_reports_absent_required_fields() {
    let mut f = form_with_rules(json!({}), json!({"name": {"required": true}}));
    assert!(!f.is_valid());
    assert_eq!(
        f.validate_model(),
        &BTreeMap::from([(".name".to_owned(), "is required".to_owned())])
    );
    assert_eq!(f.input_class_name("name", true), "form-input-error");

    f.on_change("name", json!("app")).unwrap();
    assert!(f.is_valid());
    assert!(f.errors().is_empty());
}

#[test]
fn whole_model_validation_checks_nested_rules() {
    let mut f = form_with_rules(
        json!({"icons": [{"uri": "rel.png"}, {"uri": "/ok.png"}, {"name": "x"}]}),
        json!({
            "icons[].uri": {"pattern": "^/"},
            "icons[].name": {"required": true, "message": "needs a name"}
        }),
    );
    assert!(!f.is_valid());
    assert_eq!(
        f.validate_model(),
        &BTreeMap::from([
            (".icons[0].name".to_owned(), "needs a name".to_owned()),
            (".icons[0].uri".to_owned(), "has an invalid format".to_owned()),
            (".icons[1].name".to_owned(), "needs a name".to_owned()),
        ])
    );
}

#[test]
fn replacing_a_whole_element_validates_its_fields() {
    let mut f = form_with_rules(
        json!({"icons": [{"name": "x", "uri": "/x.png"}]}),
        json!({"icons[].uri": {"pattern": "^/"}}),
    );
    let patch = f
        .on_change("icons[name=y]", json!({"name": "y", "uri": "rel.png"}))
        .unwrap();
    assert_eq!(patch.keys().collect::<Vec<_>>(), vec![".icons"]);
    assert_eq!(
        f.errors(),
        BTreeMap::from([(".icons[1].uri".to_owned(), "has an invalid format".to_owned())])
    );
    assert_eq!(f.error("icons[name=y].uri"), Some("has an invalid format"));

    f.on_change("icons[name=y].uri", json!("/y.png")).unwrap();
    assert!(f.errors().is_empty());
    assert!(f.is_valid());
}

#[test]
fn missing_nested_required_field_shows_up_in_full_validation() {
    let mut f = form_with_rules(json!({"icons": []}), json!({"icons[].uri": {"required": true}}));
    f.on_change("icons[name=z].name", json!("z")).unwrap();
    assert!(f.errors().is_empty());
    assert!(!f.is_valid());
    assert_eq!(f.validate_model().get(".icons[0].uri").map(String::as_str), Some("is required"));
}
