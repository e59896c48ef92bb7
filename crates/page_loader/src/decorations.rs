//! Standard markup decorations.
//!
//! Each routine is synchronous and idempotent: running it twice over the same subtree
//! leaves the tree as a single run would.

use crate::collaborators::BlockContent;
use crate::status::{BLOCK_STATUS_ATTR, SECTION_STATUS_ATTR, initialize_status};
use anyhow::{Error, anyhow};
use html::{DOM, NodeId};
use log::{debug, trace};

/// Hidden until the section loader reveals it.
pub const HIDDEN_STYLE: &str = "display: none";

/// Sanitize a free-form name into a class token: lowercase ASCII alphanumerics
/// separated by single dashes.
pub fn to_class_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Turn lone links into buttons.
///
/// A link that is the only child of a `p` or `div` becomes `.button` inside a
/// `.button-container`; wrapped in `strong` it is primary, in `em` secondary.
pub fn decorate_buttons(dom: &mut DOM, main: NodeId) {
    for link in dom.all_by_tag(main, "a") {
        let text = dom.text_content(link);
        if dom.attr(link, "title").is_none() && !text.trim().is_empty() {
            dom.set_attr(link, "title", text.trim());
        }
        let Some(href) = dom.attr(link, "href") else {
            continue;
        };
        if href == text.trim() || dom.first_by_tag(link, "img").is_some() {
            continue;
        }
        let Some(up) = dom.parent(link) else {
            continue;
        };
        let only_child = |dom: &DOM, node: NodeId| dom.children(node).len() == 1;
        if only_child(dom, up) && (dom.is_element(up, "p") || dom.is_element(up, "div")) {
            dom.add_class(link, "button");
            dom.add_class(up, "button-container");
            continue;
        }
        let Some(two_up) = dom.parent(up) else {
            continue;
        };
        if !only_child(dom, up) || !only_child(dom, two_up) || !dom.is_element(two_up, "p") {
            continue;
        }
        let variant = match dom.tag(up) {
            Some("strong") => "primary",
            Some("em") => "secondary",
            _ => continue,
        };
        dom.add_class(link, "button");
        dom.add_class(link, variant);
        dom.add_class(two_up, "button-container");
    }
}

/// Give each `span.icon.icon-<name>` its image.
pub fn decorate_icons(dom: &mut DOM, main: NodeId, code_base_path: &str) {
    for span in dom.all_by_class(main, "icon") {
        if !dom.is_element(span, "span") || dom.first_by_tag(span, "img").is_some() {
            continue;
        }
        let Some(name) = dom
            .node(span)
            .and_then(|node| node.classes().find_map(|class| class.strip_prefix("icon-")))
            .map(str::to_owned)
        else {
            continue;
        };
        let img = dom.create_element("img");
        dom.set_attr(img, "data-icon-name", &name);
        dom.set_attr(img, "src", &format!("{code_base_path}/icons/{name}.svg"));
        dom.set_attr(img, "alt", "");
        dom.set_attr(img, "loading", "lazy");
        if let Err(err) = dom.append_child(span, img) {
            debug!("decorate_icons: skipping icon `{name}`: {err}");
        }
    }
}

/// Turn each top-level `div` of main into a section.
///
/// # Errors
/// Returns an error if a wrapper cannot be attached.
pub fn decorate_sections(dom: &mut DOM, main: NodeId) -> Result<(), Error> {
    for section in dom.element_children(main) {
        if !dom.is_element(section, "div") || dom.attr(section, SECTION_STATUS_ATTR).is_some() {
            continue;
        }
        wrap_section_content(dom, section)?;
        dom.add_class(section, "section");
        initialize_status(dom, section, SECTION_STATUS_ATTR);
        dom.set_attr(section, "style", HIDDEN_STYLE);
        apply_section_metadata(dom, section);
        trace!("decorate_sections: section {section:?} ready");
    }
    Ok(())
}

/// Group runs of default content into one wrapper; every `div` gets its own wrapper.
fn wrap_section_content(dom: &mut DOM, section: NodeId) -> Result<(), Error> {
    let mut current: Option<NodeId> = None;
    let mut in_default_content = false;
    let mut wrappers = Vec::new();
    for child in dom.children(section) {
        let is_div = dom.is_element(child, "div");
        if is_div || !in_default_content || current.is_none() {
            let wrapper = dom.create_element("div");
            in_default_content = !is_div;
            if in_default_content {
                dom.add_class(wrapper, "default-content-wrapper");
            }
            wrappers.push(wrapper);
            current = Some(wrapper);
        }
        let wrapper = current.ok_or_else(|| anyhow!("no wrapper for section content"))?;
        dom.append_child(wrapper, child)?;
    }
    for wrapper in wrappers {
        dom.append_child(section, wrapper)?;
    }
    Ok(())
}

/// Key/value rows of a block, keyed by class-name-normalized first cell.
pub fn read_block_config(dom: &DOM, block: NodeId) -> Vec<(String, String)> {
    dom.element_children(block)
        .into_iter()
        .filter_map(|row| {
            let cells = dom.element_children(row);
            let (key_cell, value_cell) = (cells.first()?, cells.get(1)?);
            let key = to_class_name(&dom.text_content(*key_cell));
            let value = dom.text_content(*value_cell).trim().to_owned();
            (!key.is_empty()).then_some((key, value))
        })
        .collect()
}

fn apply_section_metadata(dom: &mut DOM, section: NodeId) {
    let Some(metadata) = dom.first_by_class(section, "section-metadata") else {
        return;
    };
    for (key, value) in read_block_config(dom, metadata) {
        if key == "style" {
            for style in value.split(',').map(to_class_name).filter(|style| !style.is_empty()) {
                dom.add_class(section, &style);
            }
        } else {
            dom.set_attr(section, &format!("data-{key}"), &value);
        }
    }
    // The metadata block sits alone in its wrapper; drop both.
    let target = dom
        .parent(metadata)
        .filter(|wrapper| dom.parent(*wrapper) == Some(section))
        .unwrap_or(metadata);
    dom.remove(target);
}

/// Mark every `div.section > div > div` named by its first class as a block.
pub fn decorate_blocks(dom: &mut DOM, main: NodeId) {
    for section in dom.element_children(main) {
        if !dom.has_class(section, "section") {
            continue;
        }
        for wrapper in dom.element_children(section) {
            if !dom.is_element(wrapper, "div") {
                continue;
            }
            for block in dom.element_children(wrapper) {
                decorate_block(dom, block, wrapper, section);
            }
        }
    }
}

fn decorate_block(dom: &mut DOM, block: NodeId, wrapper: NodeId, section: NodeId) {
    if !dom.is_element(block, "div") || dom.attr(block, BLOCK_STATUS_ATTR).is_some() {
        return;
    }
    let Some(name) = dom.first_class(block).map(str::to_owned) else {
        return;
    };
    mark_block(dom, block, &name);
    dom.add_class(wrapper, &format!("{name}-wrapper"));
    dom.add_class(section, &format!("{name}-container"));
}

/// Give an element the block marker, name and initial status.
pub fn mark_block(dom: &mut DOM, block: NodeId, name: &str) {
    dom.add_class(block, "block");
    dom.set_attr(block, "data-block-name", name);
    initialize_status(dom, block, BLOCK_STATUS_ATTR);
}

/// Copy `<meta name="template">` and `<meta name="theme">` values onto `body` as classes.
pub fn decorate_template_and_theme(dom: &mut DOM) {
    let Some(body) = dom.first_by_tag(dom.root(), "body") else {
        return;
    };
    for meta_name in ["template", "theme"] {
        let Some(content) = dom
            .first_with_attr(dom.root(), "meta", "name", meta_name)
            .and_then(|meta| dom.attr(meta, "content"))
            .map(str::to_owned)
        else {
            continue;
        };
        for class in content.split(',').map(to_class_name).filter(|class| !class.is_empty()) {
            dom.add_class(body, &class);
        }
    }
}

/// Build a detached `div.<name>` of rows of columns, moving `content` into it.
///
/// # Errors
/// Returns an error if an element cannot be moved into the block.
pub fn build_block(dom: &mut DOM, name: &str, content: BlockContent) -> Result<NodeId, Error> {
    let block = dom.create_element("div");
    dom.add_class(block, name);
    for row in content {
        let row_el = dom.create_element("div");
        for column in row {
            let column_el = dom.create_element("div");
            for element in column {
                dom.append_child(column_el, element)?;
            }
            dom.append_child(row_el, column_el)?;
        }
        dom.append_child(block, row_el)?;
    }
    Ok(block)
}
