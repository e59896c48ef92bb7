use core::fmt;

use super::{DOM, DOMNode, NodeKind};
use indextree::NodeId;

use serde_json::{Map, Value, json};

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

// -----------------------
// Module-scope helpers
// -----------------------

fn sorted_attrs(node: &DOMNode) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = node.attrs.iter().cloned().collect();
    pairs.sort_by(|left, right| left.0.cmp(&right.0));
    pairs
}

fn node_to_json(dom: &DOM, id: NodeId) -> Value {
    let Some(node) = dom.node(id) else {
        return Value::Null;
    };
    let children = || -> Vec<Value> {
        dom.children(id)
            .into_iter()
            .map(|child| node_to_json(dom, child))
            .filter(|value| !value.is_null())
            .collect()
    };
    match &node.kind {
        NodeKind::Document => json!({ "type": "document", "children": children() }),
        NodeKind::Element { tag } => {
            let mut attrs_obj = Map::new();
            for (key, value) in sorted_attrs(node) {
                attrs_obj.insert(key, Value::String(value));
            }
            json!({
                "type": "element",
                "tag": tag,
                "attrs": Value::Object(attrs_obj),
                "children": children(),
            })
        }
        NodeKind::Text { text } => {
            if text.trim().is_empty() {
                Value::Null
            } else {
                json!({ "type": "text", "text": text })
            }
        }
        NodeKind::Comment { .. } => Value::Null,
    }
}

fn escape_html(text: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_html(dom: &DOM, id: NodeId, out: &mut String) {
    let Some(node) = dom.node(id) else {
        return;
    };
    match &node.kind {
        NodeKind::Document => {
            for child in dom.children(id) {
                write_html(dom, child, out);
            }
        }
        NodeKind::Element { tag } => {
            out.push('<');
            out.push_str(tag);
            for (key, value) in node.attrs.iter() {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape_html(value, true));
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            for child in dom.children(id) {
                write_html(dom, child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::Text { text } => out.push_str(&escape_html(text, false)),
        NodeKind::Comment { text } => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
    }
}

impl fmt::Debug for DOM {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            for _ in 0..depth {
                f.write_str("  ")?;
            }
            Ok(())
        }

        fn escape_text(text: &str) -> String {
            let mut out = String::with_capacity(text.len());
            for ch in text.chars() {
                match ch {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    _ => out.push(ch),
                }
            }
            out
        }

        fn fmt_node(dom: &DOM, id: NodeId, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
            let Some(node) = dom.node(id) else {
                return Ok(());
            };
            match &node.kind {
                NodeKind::Document => {
                    write_indent(f, depth)?;
                    writeln!(f, "#document")?;
                }
                NodeKind::Element { tag } => {
                    write_indent(f, depth)?;
                    write!(f, "<{tag}")?;
                    for (key, value) in sorted_attrs(node) {
                        write!(f, " {key}=\"{}\"", escape_text(&value))?;
                    }
                    writeln!(f, ">")?;
                }
                NodeKind::Text { text } => {
                    // Skip pure-whitespace text nodes in the printer for cleaner output
                    if text.chars().all(char::is_whitespace) {
                        return Ok(());
                    }
                    write_indent(f, depth)?;
                    writeln!(f, "\"{}\"", escape_text(text))?;
                }
                NodeKind::Comment { text } => {
                    write_indent(f, depth)?;
                    writeln!(f, "<!-- {} -->", escape_text(text))?;
                }
            }
            for child in dom.children(id) {
                fmt_node(dom, child, f, depth + 1)?;
            }
            Ok(())
        }

        fmt_node(self, self.root, f, 0)
    }
}

impl DOM {
    /// Build a deterministic JSON representation of the subtree at `id`.
    /// Schema:
    /// - Document: { "type":"document", "children":[ ... ] }
    /// - Element: { "type":"element", "tag": "div", "attrs": {..}, "children":[ ... ] }
    /// - Text: { "type":"text", "text":"..." }
    pub fn to_json_value(&self, id: NodeId) -> Value {
        node_to_json(self, id)
    }

    /// Pretty JSON string of the whole document for snapshots and test comparisons.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value(self.root))
            .unwrap_or_else(|_| String::from("{}"))
    }

    /// Serialize a node and its subtree back to markup, attributes in insertion order.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        write_html(self, id, &mut out);
        out
    }

    /// Serialize only the children of a node.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            write_html(self, child, &mut out);
        }
        out
    }
}
