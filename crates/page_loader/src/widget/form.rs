use anyhow::{Context as _, Error, anyhow};
use html::{DOM, NodeId};

use super::submit::Credentials;

pub const FORM_ID: &str = "login-form";
pub const PLACEHOLDER_CLASS: &str = "cf-turnstile";
/// Hidden input the verification script fills with its token.
pub const TOKEN_INPUT_NAME: &str = "cf-turnstile-response";

/// Elements of an injected login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetForm {
    pub container: NodeId,
    pub form: NodeId,
    pub username: NodeId,
    pub password: NodeId,
    pub placeholder: NodeId,
}

fn form_markup(site_key: &str) -> String {
    format!(
        r#"<form id="{FORM_ID}">
  <input type="text" id="username" name="username" placeholder="Username" required>
  <input type="password" id="password" name="password" placeholder="Password" required>
  <button id="submit" type="submit">Log in</button>
  <div class="{PLACEHOLDER_CLASS}" data-sitekey="{site_key}"></div>
</form>"#
    )
}

/// Append the login form to `main`, or find the one already there.
///
/// # Errors
/// Returns an error if the markup cannot be imported or is missing a field.
pub fn inject_form(dom: &mut DOM, main: NodeId, site_key: &str) -> Result<WidgetForm, Error> {
    if let Some(form) = dom.first_with_attr(main, "form", "id", FORM_ID) {
        let container = dom.parent(form).ok_or_else(|| anyhow!("detached login form"))?;
        return locate(dom, container, form);
    }
    let container = dom.create_element("div");
    dom.append_child(main, container)?;
    dom.append_html(container, &form_markup(site_key))
        .context("importing login form")?;
    let form = dom
        .first_by_tag(container, "form")
        .ok_or_else(|| anyhow!("login form missing after import"))?;
    locate(dom, container, form)
}

fn locate(dom: &DOM, container: NodeId, form: NodeId) -> Result<WidgetForm, Error> {
    let field = |id: &str| {
        dom.first_with_attr(form, "input", "id", id)
            .ok_or_else(|| anyhow!("login form has no #{id}"))
    };
    Ok(WidgetForm {
        container,
        form,
        username: field("username")?,
        password: field("password")?,
        placeholder: dom
            .first_by_class(form, PLACEHOLDER_CLASS)
            .ok_or_else(|| anyhow!("login form has no verification placeholder"))?,
    })
}

fn field_value(dom: &DOM, input: NodeId) -> String {
    dom.attr(input, "value").unwrap_or_default().to_owned()
}

/// Read the current field values and verification token.
///
/// # Errors
/// Returns an error when the verification script has not produced a token.
pub fn read_credentials(dom: &DOM, widget: &WidgetForm) -> Result<Credentials, Error> {
    let token_input = dom
        .first_with_attr(widget.form, "input", "name", TOKEN_INPUT_NAME)
        .ok_or_else(|| anyhow!("verification token missing"))?;
    Ok(Credentials {
        username: field_value(dom, widget.username),
        password: field_value(dom, widget.password),
        token: field_value(dom, token_input),
    })
}
