//! Shared handle to the page document.
//!
//! Everything runs on one thread, so the tree sits behind `Rc<RefCell<_>>`. Access goes
//! through closures, which keeps every borrow short and never held across an `.await`.

use core::cell::RefCell;
use std::rc::Rc;

use html::{DOM, NodeId};

#[derive(Clone, Default)]
pub struct SharedDocument {
    inner: Rc<RefCell<DOM>>,
}

impl SharedDocument {
    pub fn new(dom: DOM) -> Self {
        Self {
            inner: Rc::new(RefCell::new(dom)),
        }
    }

    /// Run `func` with shared access to the tree.
    pub fn read<R>(&self, func: impl FnOnce(&DOM) -> R) -> R {
        func(&self.inner.borrow())
    }

    /// Run `func` with exclusive access to the tree.
    pub fn write<R>(&self, func: impl FnOnce(&mut DOM) -> R) -> R {
        func(&mut self.inner.borrow_mut())
    }

    /// The `main` element holding the page sections.
    pub fn main(&self) -> Option<NodeId> {
        self.first_by_tag("main")
    }

    pub fn body(&self) -> Option<NodeId> {
        self.first_by_tag("body")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_by_tag("head")
    }

    pub fn first_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.read(|dom| dom.first_by_tag(dom.root(), tag))
    }

    /// Serialize the whole document, mostly for logging and tests.
    pub fn to_html(&self) -> String {
        self.read(|dom| dom.outer_html(dom.root()))
    }
}

impl From<DOM> for SharedDocument {
    fn from(dom: DOM) -> Self {
        Self::new(dom)
    }
}
