//! End-to-end rendering of forms across requests.

mod common;
use common::*;

use formation::{
    Attributes, FieldDescriptor, FieldKind, FieldSetup, FormOptions, FormationConfig, Method,
    OptionList, RelationDefaults, ResourceRoute,
};

#[test]
fn edit_form_binds_defaults() {
    let mut f = page();
    f.setup([
        (
            "title",
            FieldSetup::new()
                .label("Post Title")
                .rules("required")
                .default_value("Hello"),
        ),
        ("body", FieldSetup::new().default_value("<p>Text</p>")),
    ]);

    let route = ResourceRoute::new("posts.edit", ["3"]);
    let url_for = |name: &str, params: &[String]| format!("/{name}/{}", params.join("/"));
    let mut html = f.open_resource(&route, url_for, FormOptions::new());
    html += &f.field(FieldDescriptor::new("title"));
    html += &f.field(FieldDescriptor::new("body").kind(FieldKind::Textarea));
    let save = f.submit_resource(Some("Post"), route.is_update(), None);
    html += &f.field(FieldDescriptor::new("save").kind(FieldKind::Button).label(save));
    html += &f.close();

    assert!(html.contains("name=\"_method\" value=\"PUT\""));
    assert!(html.contains("<span class=\"access\">P</span>ost Title</label>"));
    assert_eq!(inputs_named(&html, "title").len(), 1);
    assert!(html.contains("value=\"Hello\""));
    assert!(html.contains("&lt;p&gt;Text&lt;/p&gt;</textarea>"));
    assert!(html.contains(
        "<button class=\"btn btn-default\"><span class=\"glyphicon glyphicon-ok\"></span>&nbsp; Update Post</button>"
    ));
    assert!(html.ends_with("</form>"));
}

#[test]
fn submission_errors_decorate_fields() {
    let mut f = submitted(&[("email", "not-an-email"), ("name", "")]);
    f.set_validation_rules([("email", "required|email"), ("name", "required")], None);

    assert!(!f.validated(None));

    let html = f.field(FieldDescriptor::new("email").kind(FieldKind::Email));
    assert!(html.starts_with("<div class=\"form-group has-error\" id=\"email-area\">"));
    assert!(html.contains("value=\"not-an-email\""));
    assert!(html.contains("<div class=\"error\" id=\"email-error\">"));

    let summary = f.error_summary();
    assert!(summary.contains("The Email must be a valid email address."));
    assert!(summary.contains("The Name field is required."));
}

#[test]
fn submitted_input_wins_over_defaults() {
    let mut f = submitted(&[("city", "Bergen")]);
    f.set_defaults([("city", "Oslo"), ("country", "NO")], &[], None);
    assert_eq!(f.value_text("city"), "Bergen");
    assert_eq!(f.value_text("country"), "");

    f.reset_defaults([("city", "Tromsø")]);
    assert_eq!(f.value_text("city"), "Tromsø");
}

#[test]
fn session_errors_survive_redirect() {
    let mut f = with_session_errors(r#"{"default": {"title": ["Title taken.", "Too short."]}}"#);
    let html = f.text("title", None, Attributes::new());
    assert!(html.contains("id=\"title\""));

    let tag = f.error_tag("title", FieldKind::Text, None);
    assert_eq!(tag, "<div class=\"error\" id=\"title-error\">Title taken.</div>\n");
    assert!(f.script_tag().unwrap().contains("\"title\":\"Title taken.\""));
}

#[test]
fn relation_rows_render_with_pivot_fields() {
    let mut f = page();
    let roles = RelationDefaults::new("userRoles")
        .item([("name", "Admin"), ("level_formatted", "High")])
        .item([("name", "Editor"), ("level_formatted", "Low")]);
    f.set_defaults([("name", "Ann")], &[roles], None);

    let html = f.text("user_roles.2.level", None, Attributes::new());
    assert!(html.contains("name=\"user_roles[2][level]\""));
    assert!(html.contains("value=\"Low\""));
    assert!(html.contains("class=\"form-control field-level\""));
}

#[test]
fn radio_set_and_select_share_option_lists() {
    let options = OptionList::new().with("s", "Small").with("l", "Large");
    let mut f = page();
    f.set_defaults([("size", "l")], &[], None);

    let radios = f.radio_set("size", &options, None, Attributes::new());
    assert!(radios.contains("id=\"size-l\" checked=\"checked\""));

    let select = f.select("size", &options, Some("Any"), None, Attributes::new());
    assert!(select.contains("<option value=\"l\" selected=\"selected\">Large</option>"));
}

#[test]
fn configuration_loads_from_json() {
    let config = FormationConfig::from_json(
        r#"{"label": {"suffix": ":"}, "field": {"id-prefix": "f-"}, "encoding": "ISO-8859-1"}"#,
    )
    .unwrap();
    let mut f = formation::Formation::new(config, formation::RequestData::new());

    assert!(f.label("email", None, Attributes::new()).contains("for=\"f-email\""));
    assert!(f
        .open(FormOptions::new().method(Method::Get))
        .contains("accept-charset=\"ISO-8859-1\""));
}
