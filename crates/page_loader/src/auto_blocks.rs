//! Blocks synthesized from markup patterns.

use crate::collaborators::Collaborators;
use anyhow::Error;
use html::{DOM, NodeId};
use log::{debug, error};

pub const HERO_BLOCK: &str = "hero";

/// Run every auto-block heuristic over `main`.
///
/// Failures are logged and swallowed; `main` keeps whatever blocks it already had.
pub fn build_auto_blocks(dom: &mut DOM, collaborators: &dyn Collaborators, main: NodeId) {
    if let Err(err) = build_hero_block(dom, collaborators, main) {
        error!("auto_blocks: hero synthesis failed: {err:#}");
    }
}

/// Pair the first `picture` and `h1` of `main` into a hero block when the picture
/// comes first in document order.
///
/// The block is placed in a new section `div` prepended to `main`. Returns the block,
/// or `None` when the pattern is absent or already synthesized.
///
/// # Errors
/// Returns an error if the block cannot be built or attached.
pub fn build_hero_block(
    dom: &mut DOM,
    collaborators: &dyn Collaborators,
    main: NodeId,
) -> Result<Option<NodeId>, Error> {
    let (Some(heading), Some(picture)) =
        (dom.first_by_tag(main, "h1"), dom.first_by_tag(main, "picture"))
    else {
        return Ok(None);
    };
    if !dom.precedes(picture, heading) {
        debug!("auto_blocks: heading precedes picture, no hero");
        return Ok(None);
    }
    if inside_hero(dom, heading, main) {
        return Ok(None);
    }
    let block = collaborators.build_block(dom, HERO_BLOCK, vec![vec![vec![picture, heading]]])?;
    let section = dom.create_element("div");
    dom.append_child(section, block)?;
    dom.prepend_child(main, section)?;
    debug!("auto_blocks: hero block synthesized");
    Ok(Some(block))
}

fn inside_hero(dom: &DOM, node: NodeId, main: NodeId) -> bool {
    let mut current = dom.parent(node);
    while let Some(ancestor) = current {
        if ancestor == main {
            return false;
        }
        if dom.has_class(ancestor, HERO_BLOCK) {
            return true;
        }
        current = dom.parent(ancestor);
    }
    false
}
