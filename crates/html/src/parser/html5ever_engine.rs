use crate::dom::DOM;
use html5ever::driver::Parser;
use html5ever::tendril::stream::Utf8LossyDecoder;
use html5ever::tendril::{ByteTendril, TendrilSink as _};
use html5ever::{ParseOpts, parse_document};
use indextree::NodeId;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

/// Incremental HTML5 parser feeding an `RcDom`, converted into a [`DOM`] on finish.
pub struct Html5everEngine {
    parser: Utf8LossyDecoder<Parser<RcDom>>,
}

impl Default for Html5everEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Html5everEngine {
    pub fn new() -> Self {
        let parser = parse_document(RcDom::default(), ParseOpts::default()).from_utf8();
        Self { parser }
    }

    /// Push a chunk of bytes. Multi-byte sequences split across chunks are reassembled.
    pub fn push(&mut self, chunk: &[u8]) {
        self.parser.process(ByteTendril::from_slice(chunk));
    }

    /// Finish parsing and convert the tree.
    pub fn finalize(self) -> DOM {
        let rc_dom = self.parser.finish();
        let mut dom = DOM::new();
        let root = dom.root();
        convert_node(&mut dom, &rc_dom.document, root);
        dom
    }
}

/// Convert an html5ever node into `dom` under `parent`.
fn convert_node(dom: &mut DOM, rc_node: &Handle, parent: NodeId) {
    match &rc_node.data {
        RcNodeData::Document => {
            for child in rc_node.children.borrow().iter() {
                convert_node(dom, child, parent);
            }
        }
        RcNodeData::Doctype { .. } | RcNodeData::ProcessingInstruction { .. } => {}
        RcNodeData::Text { contents } => {
            let text = contents.borrow().to_string();
            if text.trim().is_empty() {
                return;
            }
            let node = dom.create_text(&text);
            attach(dom, parent, node);
        }
        RcNodeData::Comment { contents } => {
            let node = dom.create_comment(contents);
            attach(dom, parent, node);
        }
        RcNodeData::Element { name, attrs, .. } => {
            let node = dom.create_element(&name.local);
            for attr in attrs.borrow().iter() {
                dom.set_attr(node, &attr.name.local, &attr.value);
            }
            attach(dom, parent, node);
            for child in rc_node.children.borrow().iter() {
                convert_node(dom, child, node);
            }
        }
    }
}

fn attach(dom: &mut DOM, parent: NodeId, node: NodeId) {
    // Freshly created nodes can always be appended to a live parent.
    if let Err(err) = dom.append_child(parent, node) {
        log::warn!("html: dropping node during conversion: {err}");
    }
}
