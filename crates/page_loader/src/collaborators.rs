use crate::document::SharedDocument;
use anyhow::Error;
use core::future::Future;
use core::pin::Pin;
use html::{DOM, NodeId};

// Reduce type complexity with an alias for collaborator futures. Not `Send`: the page
// runs on a single thread.
pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<(), Error>> + 'a>>;

/// Rows of columns of elements, the shape a block is built from.
pub type BlockContent = Vec<Vec<Vec<NodeId>>>;

/// The routines the bootstrap sequence calls but does not own.
///
/// Synchronous decorations receive the tree directly; anything that may suspend
/// receives the shared handle and must not keep a borrow across its own `.await`s.
pub trait Collaborators {
    fn name(&self) -> &'static str;

    fn decorate_buttons(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error>;
    fn decorate_icons(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error>;
    fn decorate_sections(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error>;
    fn decorate_blocks(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error>;
    fn decorate_template_and_theme(&self, dom: &mut DOM) -> Result<(), Error>;

    /// Build a detached block element named `name` from existing elements.
    fn build_block(&self, dom: &mut DOM, name: &str, content: BlockContent) -> Result<NodeId, Error>;

    /// Load the code and styles behind one decorated block.
    fn load_block<'a>(&'a self, doc: &'a SharedDocument, block: NodeId) -> LoadFuture<'a>;
    /// Resolve once the first image of `section` is ready (or immediately without one).
    fn wait_for_first_image<'a>(&'a self, doc: &'a SharedDocument, section: NodeId) -> LoadFuture<'a>;
    fn load_header<'a>(&'a self, doc: &'a SharedDocument, header: NodeId) -> LoadFuture<'a>;
    fn load_footer<'a>(&'a self, doc: &'a SharedDocument, footer: NodeId) -> LoadFuture<'a>;
    /// Load a stylesheet. Must be idempotent per URL.
    fn load_css<'a>(&'a self, doc: &'a SharedDocument, href: String) -> LoadFuture<'a>;
    /// Non-critical work run by the delayed phase.
    fn load_delayed<'a>(&'a self, doc: &'a SharedDocument) -> LoadFuture<'a>;

    fn scroll_into_view(&self, dom: &mut DOM, target: NodeId);
}
