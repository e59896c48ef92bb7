//! Default collaborators following the usual page conventions.

use crate::collaborators::{BlockContent, Collaborators, LoadFuture};
use crate::config::LoaderConfig;
use crate::decorations;
use crate::document::SharedDocument;
use crate::sections;
use crate::status::LoadStatus;
use crate::stylesheets::{ensure_module_script, ensure_stylesheet};
use anyhow::{Error, anyhow};
use html::{DOM, NodeId};
use log::{debug, info};

pub struct StandardCollaborators {
    code_base_path: String,
}

impl StandardCollaborators {
    pub fn new(code_base_path: impl Into<String>) -> Self {
        Self {
            code_base_path: code_base_path.into(),
        }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.code_base_path.clone())
    }

    pub fn code_base_path(&self) -> &str {
        &self.code_base_path
    }

    /// Create `div.<name>` inside `host`, mark it as a block and load it.
    async fn load_chrome_block(
        &self,
        doc: &SharedDocument,
        host: NodeId,
        name: &'static str,
    ) -> Result<(), Error> {
        let block = doc.write(|dom| -> Result<NodeId, Error> {
            if let Some(existing) = dom.first_by_class(host, name) {
                return Ok(existing);
            }
            let block = decorations::build_block(dom, name, Vec::new())?;
            decorations::mark_block(dom, block, name);
            dom.append_child(host, block)?;
            Ok(block)
        })?;
        match sections::load_block(doc, self, block).await {
            LoadStatus::Error => Err(anyhow!("{name} block failed to load")),
            _ => Ok(()),
        }
    }
}

impl Default for StandardCollaborators {
    fn default() -> Self {
        Self::new("")
    }
}

impl Collaborators for StandardCollaborators {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn decorate_buttons(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error> {
        decorations::decorate_buttons(dom, main);
        Ok(())
    }

    fn decorate_icons(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error> {
        decorations::decorate_icons(dom, main, &self.code_base_path);
        Ok(())
    }

    fn decorate_sections(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error> {
        decorations::decorate_sections(dom, main)
    }

    fn decorate_blocks(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error> {
        decorations::decorate_blocks(dom, main);
        Ok(())
    }

    fn decorate_template_and_theme(&self, dom: &mut DOM) -> Result<(), Error> {
        decorations::decorate_template_and_theme(dom);
        Ok(())
    }

    fn build_block(&self, dom: &mut DOM, name: &str, content: BlockContent) -> Result<NodeId, Error> {
        decorations::build_block(dom, name, content)
    }

    fn load_block<'a>(&'a self, doc: &'a SharedDocument, block: NodeId) -> LoadFuture<'a> {
        Box::pin(async move {
            let name = doc
                .read(|dom| dom.attr(block, "data-block-name").map(str::to_owned))
                .ok_or_else(|| anyhow!("block {block:?} has no name"))?;
            let href = format!("{}/blocks/{name}/{name}.css", self.code_base_path);
            doc.write(|dom| ensure_stylesheet(dom, &href))?;
            debug!("standard: loaded block `{name}`");
            Ok(())
        })
    }

    fn wait_for_first_image<'a>(&'a self, doc: &'a SharedDocument, section: NodeId) -> LoadFuture<'a> {
        Box::pin(async move {
            doc.write(|dom| {
                if let Some(img) = dom.first_by_tag(section, "img") {
                    dom.set_attr(img, "loading", "eager");
                    dom.set_attr(img, "fetchpriority", "high");
                }
            });
            Ok(())
        })
    }

    fn load_header<'a>(&'a self, doc: &'a SharedDocument, header: NodeId) -> LoadFuture<'a> {
        Box::pin(self.load_chrome_block(doc, header, "header"))
    }

    fn load_footer<'a>(&'a self, doc: &'a SharedDocument, footer: NodeId) -> LoadFuture<'a> {
        Box::pin(self.load_chrome_block(doc, footer, "footer"))
    }

    fn load_css<'a>(&'a self, doc: &'a SharedDocument, href: String) -> LoadFuture<'a> {
        Box::pin(async move {
            doc.write(|dom| ensure_stylesheet(dom, &href))?;
            Ok(())
        })
    }

    fn load_delayed<'a>(&'a self, doc: &'a SharedDocument) -> LoadFuture<'a> {
        Box::pin(async move {
            let src = format!("{}/scripts/delayed.js", self.code_base_path);
            doc.write(|dom| ensure_module_script(dom, &src))?;
            info!("standard: delayed scripts queued");
            Ok(())
        })
    }

    fn scroll_into_view(&self, dom: &mut DOM, target: NodeId) {
        dom.set_attr(target, "data-scrolled-into-view", "true");
    }
}
