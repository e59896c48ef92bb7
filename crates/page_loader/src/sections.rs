//! Section and block loading.
//!
//! Sections load one at a time in document order, and so do the blocks inside a
//! section. A failure is recorded on the element that failed and loading carries on.

use crate::collaborators::{Collaborators, LoadFuture};
use crate::decorations::HIDDEN_STYLE;
use crate::document::SharedDocument;
use crate::status::{
    BLOCK_STATUS_ATTR, LoadStatus, SECTION_STATUS_ATTR, advance_status, read_status,
};
use html::{DOM, NodeId};
use log::{debug, info, warn};
use serde::Serialize;

/// Called once a section's blocks are loaded, before its status settles.
pub type SectionCallback<'a> = Box<dyn FnOnce(NodeId) -> LoadFuture<'a> + 'a>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionsReport {
    pub loaded: usize,
    pub failed: usize,
    /// Sections already past `unloaded` when the batch reached them.
    pub skipped: usize,
}

impl SectionsReport {
    fn record(&mut self, status: LoadStatus) {
        match status {
            LoadStatus::Loaded => self.loaded += 1,
            LoadStatus::Error => self.failed += 1,
            LoadStatus::Unloaded | LoadStatus::Loading => self.skipped += 1,
        }
    }
}

/// Top-level sections of `main` in document order.
pub fn sections_of(dom: &DOM, main: NodeId) -> Vec<NodeId> {
    dom.element_children(main)
        .into_iter()
        .filter(|node| dom.attr(*node, SECTION_STATUS_ATTR).is_some())
        .collect()
}

/// Decorated blocks inside `section`, in document order.
pub fn blocks_of(dom: &DOM, section: NodeId) -> Vec<NodeId> {
    dom.descendants(section)
        .into_iter()
        .filter(|node| dom.attr(*node, BLOCK_STATUS_ATTR).is_some())
        .collect()
}

/// Load one block through the collaborators.
///
/// Only an `unloaded` block is loaded; any other block reports its current status.
pub async fn load_block(
    doc: &SharedDocument,
    collaborators: &dyn Collaborators,
    block: NodeId,
) -> LoadStatus {
    let started = doc.write(|dom| {
        match read_status(dom, block, BLOCK_STATUS_ATTR) {
            Some(LoadStatus::Unloaded) => {
                advance_status(dom, block, BLOCK_STATUS_ATTR, LoadStatus::Loading);
                Ok(())
            }
            other => Err(other.unwrap_or(LoadStatus::Error)),
        }
    });
    if let Err(current) = started {
        debug!("sections: block {block:?} already {current}");
        return current;
    }
    let outcome = match collaborators.load_block(doc, block).await {
        Ok(()) => LoadStatus::Loaded,
        Err(err) => {
            warn!("sections: block {block:?} failed to load: {err:#}");
            LoadStatus::Error
        }
    };
    doc.write(|dom| advance_status(dom, block, BLOCK_STATUS_ATTR, outcome));
    outcome
}

/// Load a section: `unloaded -> loading`, every block in order, the optional callback,
/// then `loaded` or `error`. The section is revealed either way.
pub async fn load_section(
    doc: &SharedDocument,
    collaborators: &dyn Collaborators,
    section: NodeId,
    callback: Option<SectionCallback<'_>>,
) -> LoadStatus {
    let blocks = doc.write(|dom| match read_status(dom, section, SECTION_STATUS_ATTR) {
        Some(LoadStatus::Unloaded) => {
            advance_status(dom, section, SECTION_STATUS_ATTR, LoadStatus::Loading);
            Ok(blocks_of(dom, section))
        }
        other => Err(other.unwrap_or(LoadStatus::Error)),
    });
    let blocks = match blocks {
        Ok(blocks) => blocks,
        Err(current) => {
            debug!("sections: section {section:?} already {current}");
            return current;
        }
    };

    let mut failed = 0_usize;
    for block in blocks {
        if load_block(doc, collaborators, block).await == LoadStatus::Error {
            failed += 1;
        }
    }

    if let Some(callback) = callback {
        if let Err(err) = callback(section).await {
            warn!("sections: load callback for {section:?} failed: {err:#}");
        }
    }

    let outcome = if failed == 0 {
        LoadStatus::Loaded
    } else {
        LoadStatus::Error
    };
    doc.write(|dom| {
        if dom.attr(section, "style") == Some(HIDDEN_STYLE) {
            dom.remove_attr(section, "style");
        }
        advance_status(dom, section, SECTION_STATUS_ATTR, outcome);
    });
    if failed > 0 {
        warn!("sections: section {section:?} finished with {failed} failed block(s)");
    }
    outcome
}

/// Load every section of `main` sequentially in document order.
pub async fn load_sections(
    doc: &SharedDocument,
    collaborators: &dyn Collaborators,
    main: NodeId,
) -> SectionsReport {
    let sections = doc.read(|dom| sections_of(dom, main));
    let mut report = SectionsReport::default();
    for section in sections {
        let attached = doc.read(|dom| dom.parent(section) == Some(main));
        if !attached {
            continue;
        }
        let was_unloaded = doc.read(|dom| {
            read_status(dom, section, SECTION_STATUS_ATTR) == Some(LoadStatus::Unloaded)
        });
        let status = load_section(doc, collaborators, section, None).await;
        if was_unloaded {
            report.record(status);
        } else {
            report.skipped += 1;
        }
    }
    info!(
        "sections: {} loaded, {} failed, {} skipped",
        report.loaded, report.failed, report.skipped
    );
    report
}
