//! Opening and closing forms, including resource-route forms.

use crate::context::Formation;

use super::attrs::{AttrValue, Attributes};

/// HTTP methods a form can submit with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET method
    Get,
    /// POST method
    #[default]
    Post,
    /// PUT method, spoofed over POST
    Put,
    /// PATCH method, spoofed over POST
    Patch,
    /// DELETE method, spoofed over POST
    Delete,
}

impl Method {
    /// Parses a method name, ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the method as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns the method the browser actually submits with.
    pub fn form_method(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            _ => "POST",
        }
    }

    /// Returns whether the method has to be spoofed with a `_method` field.
    pub fn is_spoofed(&self) -> bool {
        matches!(self, Self::Put | Self::Patch | Self::Delete)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for opening a form.
#[derive(Debug, Clone, Default)]
pub struct FormOptions {
    method: Option<Method>,
    action: Option<String>,
    files: bool,
    token: Option<String>,
    attributes: Attributes,
}

impl FormOptions {
    /// Creates default options: a POST form to the current URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the action URL.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Makes the form accept file uploads.
    #[must_use]
    pub fn files(mut self, files: bool) -> Self {
        self.files = files;
        self
    }

    /// Sets the CSRF token sent with non-GET forms.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets an extra attribute on the `<form>` element.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.set(key, value);
        self
    }
}

/// A named route with its parameters, such as `users.edit` with `[7]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRoute {
    /// Route name.
    pub name: String,
    /// Route parameters in order.
    pub parameters: Vec<String>,
}

impl ResourceRoute {
    /// Creates a route.
    pub fn new<I, S>(name: impl Into<String>, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns whether the route edits an existing resource.
    pub fn is_update(&self) -> bool {
        self.name.ends_with(".edit")
    }

    /// Returns the method the resource form submits with: PUT for edit
    /// routes, POST otherwise.
    pub fn method(&self) -> Method {
        if self.is_update() {
            Method::Put
        } else {
            Method::Post
        }
    }

    /// Returns the route the form submits to: `create` becomes `store` and
    /// `edit` becomes `update`.
    pub fn target(&self) -> String {
        self.name.replace("create", "store").replace("edit", "update")
    }
}

fn hidden_input(name: &str, value: &str) -> String {
    let attributes = Attributes::new()
        .with("type", "hidden")
        .with("name", name)
        .with("value", value);
    format!("<input{}>", attributes.to_html())
}

impl Formation {
    /// Opens a form.
    ///
    /// PUT, PATCH and DELETE are submitted as POST with a hidden `_method`
    /// field, and the token is added as a hidden `_token` field to every
    /// form that is not GET. Persisted errors are reloaded.
    pub fn open(&mut self, options: FormOptions) -> String {
        self.load_session_errors();

        let method = options.method.unwrap_or_default();
        let mut attributes = Attributes::new().with("method", method.form_method());
        if let Some(action) = &options.action {
            attributes.set("action", action);
        }
        attributes.set("accept-charset", &self.config.encoding);
        if options.files {
            attributes.set("enctype", "multipart/form-data");
        }
        for (key, value) in options.attributes.iter() {
            attributes.set(key, value.clone());
        }

        let mut appendage = String::new();
        if method.is_spoofed() {
            appendage.push_str(&hidden_input("_method", method.as_str()));
        }
        if method != Method::Get {
            if let Some(token) = &options.token {
                appendage.push_str(&hidden_input("_token", token));
            }
        }

        format!("<form{}>\n\n\t{appendage}", attributes.to_html())
    }

    /// Sets defaults from a record's fields, then opens the form.
    pub fn open_for_model<K, V>(
        &mut self,
        defaults: impl IntoIterator<Item = (K, V)>,
        options: FormOptions,
    ) -> String
    where
        K: AsRef<str>,
        V: Into<crate::tree::ValueTree>,
    {
        self.set_defaults(defaults, &[], None);
        self.open(options)
    }

    /// Opens a form for a resource route.
    ///
    /// The method and action follow the route unless `options` sets them;
    /// `url_for` turns a route name and its parameters into a URL.
    pub fn open_resource(
        &mut self,
        route: &ResourceRoute,
        url_for: impl Fn(&str, &[String]) -> String,
        mut options: FormOptions,
    ) -> String {
        if options.method.is_none() {
            options.method = Some(route.method());
        }
        if options.action.is_none() {
            options.action = Some(url_for(&route.target(), &route.parameters));
        }
        self.open(options)
    }

    /// Closes a form.
    pub fn close(&self) -> String {
        "</form>".to_string()
    }

    /// Builds the submit label of a resource form: `Create` or `Update`,
    /// optionally followed by the item name.
    ///
    /// Without an explicit icon, `plus` or `ok` is used when automatic
    /// button icons are on. An empty icon means none.
    pub fn submit_resource(&self, item: Option<&str>, update: bool, icon: Option<&str>) -> String {
        let (action, auto_icon) = if update { ("Update", "ok") } else { ("Create", "plus") };
        let icon = match icon {
            Some(icon) => icon,
            None if self.config.auto_button_icon => auto_icon,
            None => "",
        };

        let mut label = if icon.is_empty() {
            action.to_string()
        } else {
            format!("[ICON: {icon}]{action}")
        };
        if let Some(item) = item.filter(|i| !i.is_empty()) {
            label.push(' ');
            label.push_str(item);
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormationConfig;
    use crate::context::RequestData;

    fn formation() -> Formation {
        Formation::new(FormationConfig::default(), RequestData::new())
    }

    #[test]
    fn test_method() {
        assert_eq!(Method::parse("patch"), Some(Method::Patch));
        assert_eq!(Method::parse("TRACE"), None);
        assert_eq!(Method::Delete.form_method(), "POST");
        assert_eq!(Method::Get.form_method(), "GET");
        assert!(Method::Put.is_spoofed());
        assert!(!Method::Post.is_spoofed());
    }

    #[test]
    fn test_open_post() {
        let mut f = formation();
        let html = f.open(
            FormOptions::new()
                .action("/users")
                .files(true)
                .token("abc123")
                .attr("class", "form-horizontal"),
        );
        assert_eq!(
            html,
            "<form method=\"POST\" action=\"/users\" accept-charset=\"UTF-8\" enctype=\"multipart/form-data\" class=\"form-horizontal\">\n\n\t<input type=\"hidden\" name=\"_token\" value=\"abc123\">"
        );
        assert_eq!(f.close(), "</form>");
    }

    #[test]
    fn test_open_spoofed_method() {
        let mut f = formation();
        let html = f.open(FormOptions::new().method(Method::Put).action("/users/7"));
        assert!(html.starts_with("<form method=\"POST\""));
        assert!(html.ends_with("\t<input type=\"hidden\" name=\"_method\" value=\"PUT\">"));

        let html = f.open(FormOptions::new().method(Method::Get).token("abc"));
        assert!(!html.contains("_token"));
        assert!(html.ends_with(">\n\n\t"));
    }

    #[test]
    fn test_open_for_model() {
        let mut f = formation();
        f.open_for_model([("title", "Hello")], FormOptions::new());
        assert_eq!(f.value_text("title"), "Hello");
    }

    #[test]
    fn test_resource_routes() {
        let edit = ResourceRoute::new("users.edit", ["7"]);
        assert!(edit.is_update());
        assert_eq!(edit.method(), Method::Put);
        assert_eq!(edit.target(), "users.update");

        let create = ResourceRoute::new("users.create", Vec::<String>::new());
        assert!(!create.is_update());
        assert_eq!(create.method(), Method::Post);
        assert_eq!(create.target(), "users.store");
    }

    #[test]
    fn test_open_resource() {
        let mut f = formation();
        let route = ResourceRoute::new("users.edit", ["7"]);
        let url_for = |name: &str, params: &[String]| format!("/{name}/{}", params.join("/"));
        let html = f.open_resource(&route, url_for, FormOptions::new());
        assert!(html.starts_with("<form method=\"POST\" action=\"/users.update/7\""));
        assert!(html.contains("name=\"_method\" value=\"PUT\""));
    }

    #[test]
    fn test_submit_resource() {
        let f = formation();
        assert_eq!(f.submit_resource(Some("User"), false, None), "[ICON: plus]Create User");
        assert_eq!(f.submit_resource(None, true, None), "[ICON: ok]Update");
        assert_eq!(f.submit_resource(None, true, Some("")), "Update");
        assert_eq!(f.submit_resource(Some("Post"), true, Some("pencil")), "[ICON: pencil]Update Post");

        let mut config = FormationConfig::default();
        config.auto_button_icon = false;
        let f = Formation::new(config, RequestData::new());
        assert_eq!(f.submit_resource(None, false, None), "Create");
    }
}
