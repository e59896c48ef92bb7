//! Parsed document tree for page bootstrapping.
//!
//! The tree is an arena of typed nodes in document order. It is built once from
//! server-delivered markup and then mutated in place by the page loader.

#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

pub mod dom;
pub mod parser;

pub use dom::{DOM, DOMNode, NodeKind};
pub use indextree::NodeId;
pub use parser::{HTMLParser, parse_document};
