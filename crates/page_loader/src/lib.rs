//! Phased bootstrap of a server-rendered page.
//!
//! A delivered document is decorated into sections and blocks, then loaded in three
//! phases: the first section eagerly, the rest lazily, and non-critical work after a
//! delay. Everything runs on one thread; background work is tracked by
//! [`scheduler::BackgroundTasks`].

#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]
#![allow(
    clippy::single_char_lifetime_names,
    reason = "Future aliases borrow for one lifetime"
)]
#![allow(
    clippy::missing_errors_doc,
    reason = "Collaborator trait methods share one error contract"
)]

pub mod auto_blocks;
pub mod bootstrap;
pub mod collaborators;
pub mod config;
pub mod decorations;
pub mod document;
pub mod fonts;
pub mod pipeline;
pub mod scheduler;
pub mod sections;
pub mod standard;
pub mod status;
pub mod storage;
pub mod stylesheets;
pub mod telemetry;
pub mod url;
pub mod widget;

pub use bootstrap::{PageBootstrap, PageEnvironment, PageLoadReport, Phase};
pub use collaborators::{BlockContent, Collaborators, LoadFuture};
pub use config::{LoaderConfig, WidgetConfig};
pub use document::SharedDocument;
pub use standard::StandardCollaborators;
pub use status::LoadStatus;
pub use storage::{MemorySessionStore, SessionStore, UnavailableSessionStore};
