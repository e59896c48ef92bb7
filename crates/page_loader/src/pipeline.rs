//! The main-container decoration pipeline.

use crate::auto_blocks::build_auto_blocks;
use crate::collaborators::Collaborators;
use anyhow::Error;
use html::{DOM, NodeId};
use log::{error, trace};

type Step = fn(&dyn Collaborators, &mut DOM, NodeId) -> Result<(), Error>;

/// Ordered steps. Auto blocks run before sections and blocks so synthesized blocks are
/// decorated like explicit ones.
const STEPS: [(&str, Step); 5] = [
    ("buttons", |collab, dom, main| collab.decorate_buttons(dom, main)),
    ("icons", |collab, dom, main| collab.decorate_icons(dom, main)),
    ("auto_blocks", |collab, dom, main| {
        build_auto_blocks(dom, collab, main);
        Ok(())
    }),
    ("sections", |collab, dom, main| collab.decorate_sections(dom, main)),
    ("blocks", |collab, dom, main| collab.decorate_blocks(dom, main)),
];

/// Decorate `main` in place. Never fails: each step's error is logged and the next
/// step runs on whatever the tree looks like.
pub fn decorate_main(dom: &mut DOM, collaborators: &dyn Collaborators, main: NodeId) {
    for (name, step) in STEPS {
        trace!("pipeline: {name}");
        if let Err(err) = step(collaborators, dom, main) {
            error!("pipeline: {name} decoration failed: {err:#}");
        }
    }
}
