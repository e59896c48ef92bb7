//! Load status of sections and blocks.
//!
//! Status lives on the element itself (`data-section-status`, `data-block-status`) so
//! that the document stays the single source of truth. Transitions only move forward.

use core::fmt;
use core::str::FromStr;

use anyhow::{Error, anyhow};
use html::{DOM, NodeId};
use log::warn;

pub const SECTION_STATUS_ATTR: &str = "data-section-status";
pub const BLOCK_STATUS_ATTR: &str = "data-block-status";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Loaded,
    Error,
}

impl LoadStatus {
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Error => "error",
        }
    }

    /// Whether the status is terminal (`loaded` or `error`).
    #[inline]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Loaded | Self::Error)
    }

    /// Monotonic transition rule: `unloaded -> loading -> loaded | error`.
    #[inline]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unloaded, Self::Loading) | (Self::Loading, Self::Loaded | Self::Error)
        )
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoadStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unloaded" => Ok(Self::Unloaded),
            "loading" => Ok(Self::Loading),
            "loaded" => Ok(Self::Loaded),
            "error" => Ok(Self::Error),
            other => Err(anyhow!("unknown load status `{other}`")),
        }
    }
}

/// Read a status attribute. Missing or unparseable values read as `None`.
pub fn read_status(dom: &DOM, node: NodeId, attr: &str) -> Option<LoadStatus> {
    dom.attr(node, attr).and_then(|value| value.parse().ok())
}

/// Write the initial `unloaded` status unless the element already carries one.
pub fn initialize_status(dom: &mut DOM, node: NodeId, attr: &str) -> bool {
    if dom.attr(node, attr).is_some() {
        return false;
    }
    dom.set_attr(node, attr, LoadStatus::Unloaded.as_str());
    true
}

/// Move a node's status forward. Regressions and skips are refused and logged.
pub fn advance_status(dom: &mut DOM, node: NodeId, attr: &str, next: LoadStatus) -> bool {
    let current = read_status(dom, node, attr);
    match current {
        Some(current) if current.can_advance_to(next) => {
            dom.set_attr(node, attr, next.as_str());
            true
        }
        _ => {
            warn!(
                "status: refusing {attr} transition {} -> {next} on {node:?}",
                current.map_or("none", LoadStatus::as_str)
            );
            false
        }
    }
}
