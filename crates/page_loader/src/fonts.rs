//! Web font loading and the session `fonts-loaded` flag.

use crate::collaborators::Collaborators;
use crate::document::SharedDocument;
use crate::storage::SessionStore;
use anyhow::Error;
use log::{debug, info};
use url::Url;

pub const FONTS_LOADED_KEY: &str = "fonts-loaded";

pub fn fonts_href(code_base_path: &str) -> String {
    format!("{code_base_path}/styles/fonts.css")
}

/// Storage bucket for a page URL.
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

fn is_localhost(url: &Url) -> bool {
    url.host_str().is_some_and(|host| host.contains("localhost"))
}

/// Fonts load in the eager phase on wide viewports, or once this session already
/// loaded them. Unavailable or failing storage reads as "not loaded".
pub fn should_load_fonts_eagerly(
    viewport_width: u32,
    desktop_breakpoint: u32,
    store: &dyn SessionStore,
    url: &Url,
) -> bool {
    if viewport_width >= desktop_breakpoint {
        return true;
    }
    if !store.is_available() {
        debug!("fonts: session storage unavailable, skipping flag check");
        return false;
    }
    match store.get_item(&origin_of(url), FONTS_LOADED_KEY) {
        Ok(flag) => flag.is_some(),
        Err(err) => {
            debug!("fonts: flag read failed: {err:#}");
            false
        }
    }
}

/// Load the font stylesheet, then remember it for the session.
///
/// The flag is not written on `localhost` or when storage is unavailable.
///
/// # Errors
/// Returns the stylesheet loader's error.
pub async fn load_fonts(
    doc: &SharedDocument,
    collaborators: &dyn Collaborators,
    code_base_path: &str,
    url: &Url,
    store: &dyn SessionStore,
) -> Result<(), Error> {
    collaborators.load_css(doc, fonts_href(code_base_path)).await?;
    if is_localhost(url) || !store.is_available() {
        return Ok(());
    }
    if let Err(err) = store.set_item(&origin_of(url), FONTS_LOADED_KEY, "true") {
        debug!("fonts: flag write failed: {err:#}");
        return Ok(());
    }
    info!("fonts: loaded, session flag set");
    Ok(())
}
