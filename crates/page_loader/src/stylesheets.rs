//! Idempotent `<link>` / `<script>` injection into `head`.

use anyhow::{Error, anyhow};
use html::{DOM, NodeId};
use log::debug;

fn head(dom: &DOM) -> Result<NodeId, Error> {
    dom.first_by_tag(dom.root(), "head")
        .ok_or_else(|| anyhow!("document has no head"))
}

/// Append `<link rel="stylesheet" href>` unless one with the same href exists.
///
/// Returns `true` when a new link was added.
///
/// # Errors
/// Returns an error when the document has no `head`.
pub fn ensure_stylesheet(dom: &mut DOM, href: &str) -> Result<bool, Error> {
    let head = head(dom)?;
    if dom.first_with_attr(head, "link", "href", href).is_some() {
        debug!("stylesheets: {href} already present");
        return Ok(false);
    }
    let link = dom.create_element("link");
    dom.set_attr(link, "rel", "stylesheet");
    dom.set_attr(link, "href", href);
    dom.append_child(head, link)?;
    debug!("stylesheets: added {href}");
    Ok(true)
}

/// Append `<script type="module" src>` unless one with the same src exists.
///
/// # Errors
/// Returns an error when the document has no `head`.
pub fn ensure_module_script(dom: &mut DOM, src: &str) -> Result<bool, Error> {
    let head = head(dom)?;
    if dom.first_with_attr(head, "script", "src", src).is_some() {
        return Ok(false);
    }
    let script = dom.create_element("script");
    dom.set_attr(script, "type", "module");
    dom.set_attr(script, "src", src);
    dom.append_child(head, script)?;
    Ok(true)
}
