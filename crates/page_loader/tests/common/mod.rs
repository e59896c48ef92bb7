#![allow(dead_code)]
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::{Error, Result, anyhow, bail};
use html::{DOM, NodeId, parse_document};
use page_loader::collaborators::{BlockContent, Collaborators, LoadFuture};
use page_loader::sections::sections_of;
use page_loader::status::{SECTION_STATUS_ATTR, read_status};
use page_loader::widget::{
    CredentialTransport, Credentials, Notifier, TransportResponse, VerificationScript,
};
use page_loader::widget::form::TOKEN_INPUT_NAME;
use page_loader::widget::submit::TransportFuture;
use page_loader::{
    LoadStatus, LoaderConfig, MemorySessionStore, PageBootstrap, PageEnvironment,
    SessionStore, SharedDocument, StandardCollaborators,
};
use tokio::sync::Notify;
use url::Url;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Page with a header, footer and the given `main` content.
pub fn page(main: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Test</title></head><body>\
         <header></header><main>{main}</main><footer></footer></body></html>"
    )
}

pub fn shared_page(main: &str) -> Result<SharedDocument> {
    Ok(SharedDocument::new(parse_document(&page(main))?))
}

/// Three plain sections, each with one block, and no hero pattern.
pub const THREE_SECTIONS: &str = r#"
<div><h2>First</h2><div class="cards"><div><div>One</div></div></div></div>
<div><p>Second</p><div class="columns"><div><div>Two</div></div></div></div>
<div><p>Third</p><div class="quote"><div><div>Three</div></div></div></div>
"#;

pub fn main_of(dom: &DOM) -> Result<NodeId> {
    dom.first_by_tag(dom.root(), "main")
        .ok_or_else(|| anyhow!("main missing"))
}

pub fn section_statuses(dom: &DOM) -> Vec<Option<LoadStatus>> {
    let Some(main) = dom.first_by_tag(dom.root(), "main") else {
        return Vec::new();
    };
    sections_of(dom, main)
        .into_iter()
        .map(|section| read_status(dom, section, SECTION_STATUS_ATTR))
        .collect()
}

pub fn environment(url: &str, viewport_width: u32) -> Result<PageEnvironment> {
    Ok(PageEnvironment {
        url: Url::parse(url)?,
        viewport_width,
    })
}

pub fn bootstrap(
    recorder: &Rc<Recorder>,
    environment: PageEnvironment,
    store: Rc<dyn SessionStore>,
) -> PageBootstrap {
    bootstrap_with(LoaderConfig::default(), recorder, environment, store)
}

pub fn bootstrap_with(
    config: LoaderConfig,
    recorder: &Rc<Recorder>,
    environment: PageEnvironment,
    store: Rc<dyn SessionStore>,
) -> PageBootstrap {
    let collaborators: Rc<dyn Collaborators> = Rc::<Recorder>::clone(recorder);
    PageBootstrap::new(config, collaborators, environment, store)
}

pub fn memory_store() -> Rc<MemorySessionStore> {
    Rc::new(MemorySessionStore::new())
}

/// Standard collaborators that record every asynchronous call.
///
/// Each `load_block` call also snapshots the status of every section.
#[derive(Default)]
pub struct Recorder {
    inner: StandardCollaborators,
    failing: RefCell<HashSet<String>>,
    failing_steps: RefCell<HashSet<&'static str>>,
    events: RefCell<Vec<String>>,
    snapshots: RefCell<Vec<(String, Vec<Option<LoadStatus>>)>>,
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn fail_block(&self, name: &str) {
        self.failing.borrow_mut().insert(name.to_owned());
    }

    /// Make a synchronous decoration step (`buttons` or `icons`) fail.
    pub fn fail_step(&self, step: &'static str) {
        self.failing_steps.borrow_mut().insert(step);
    }

    fn check_step(&self, step: &'static str) -> Result<(), Error> {
        if self.failing_steps.borrow().contains(step) {
            bail!("{step} decoration broke");
        }
        Ok(())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.borrow().iter().filter(|seen| *seen == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.borrow().iter().position(|seen| seen == event)
    }

    pub fn snapshots(&self) -> Vec<(String, Vec<Option<LoadStatus>>)> {
        self.snapshots.borrow().clone()
    }

    fn record(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }
}

impl Collaborators for Recorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    fn decorate_buttons(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error> {
        self.check_step("buttons")?;
        self.inner.decorate_buttons(dom, main)
    }

    fn decorate_icons(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error> {
        self.check_step("icons")?;
        self.inner.decorate_icons(dom, main)
    }

    fn decorate_sections(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error> {
        self.inner.decorate_sections(dom, main)
    }

    fn decorate_blocks(&self, dom: &mut DOM, main: NodeId) -> Result<(), Error> {
        self.inner.decorate_blocks(dom, main)
    }

    fn decorate_template_and_theme(&self, dom: &mut DOM) -> Result<(), Error> {
        self.inner.decorate_template_and_theme(dom)
    }

    fn build_block(&self, dom: &mut DOM, name: &str, content: BlockContent) -> Result<NodeId, Error> {
        self.inner.build_block(dom, name, content)
    }

    fn load_block<'a>(&'a self, doc: &'a SharedDocument, block: NodeId) -> LoadFuture<'a> {
        Box::pin(async move {
            let name = doc
                .read(|dom| dom.attr(block, "data-block-name").map(str::to_owned))
                .unwrap_or_default();
            let statuses = doc.read(section_statuses);
            self.snapshots.borrow_mut().push((name.clone(), statuses));
            self.record(format!("block:{name}"));
            tokio::task::yield_now().await;
            if self.failing.borrow().contains(&name) {
                bail!("block `{name}` refused to load");
            }
            self.inner.load_block(doc, block).await
        })
    }

    fn wait_for_first_image<'a>(&'a self, doc: &'a SharedDocument, section: NodeId) -> LoadFuture<'a> {
        Box::pin(async move {
            self.record("first_image");
            self.inner.wait_for_first_image(doc, section).await
        })
    }

    fn load_header<'a>(&'a self, doc: &'a SharedDocument, header: NodeId) -> LoadFuture<'a> {
        Box::pin(async move {
            self.record("header");
            self.inner.load_header(doc, header).await
        })
    }

    fn load_footer<'a>(&'a self, doc: &'a SharedDocument, footer: NodeId) -> LoadFuture<'a> {
        Box::pin(async move {
            self.record("footer");
            self.inner.load_footer(doc, footer).await
        })
    }

    fn load_css<'a>(&'a self, doc: &'a SharedDocument, href: String) -> LoadFuture<'a> {
        Box::pin(async move {
            self.record(format!("css:{href}"));
            self.inner.load_css(doc, href).await
        })
    }

    fn load_delayed<'a>(&'a self, doc: &'a SharedDocument) -> LoadFuture<'a> {
        Box::pin(async move {
            self.record("delayed");
            self.inner.load_delayed(doc).await
        })
    }

    fn scroll_into_view(&self, dom: &mut DOM, target: NodeId) {
        self.record("scroll");
        self.inner.scroll_into_view(dom, target);
    }
}

/// Verification script whose load the test controls.
pub struct FakeScript {
    loaded: Cell<bool>,
    notify: Rc<Notify>,
    renders: Cell<u32>,
    token: String,
}

impl FakeScript {
    pub fn new(token: &str) -> Rc<Self> {
        Rc::new(Self {
            loaded: Cell::new(false),
            notify: Rc::new(Notify::new()),
            renders: Cell::new(0),
            token: token.to_owned(),
        })
    }

    /// Mark the script loaded without waking the poll.
    pub fn set_loaded(&self) {
        self.loaded.set(true);
    }

    /// Mark the script loaded and signal it.
    pub fn finish_loading(&self) {
        self.loaded.set(true);
        self.notify.notify_one();
    }

    pub fn renders(&self) -> u32 {
        self.renders.get()
    }
}

impl VerificationScript for FakeScript {
    fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    fn loaded_notify(&self) -> Option<Rc<Notify>> {
        Some(Rc::clone(&self.notify))
    }

    fn render(&self, dom: &mut DOM, placeholder: NodeId, site_key: &str) -> Result<(), Error> {
        self.renders.set(self.renders.get() + 1);
        dom.set_attr(placeholder, "data-rendered-with", site_key);
        if !self.token.is_empty() {
            let input = dom.create_element("input");
            dom.set_attr(input, "type", "hidden");
            dom.set_attr(input, "name", TOKEN_INPUT_NAME);
            dom.set_attr(input, "value", &self.token);
            dom.append_child(placeholder, input)?;
        }
        Ok(())
    }
}

/// Transport that records what it was asked to send.
#[derive(Default)]
pub struct FakeTransport {
    pub sent: RefCell<Vec<(String, Credentials)>>,
    pub fail: Cell<bool>,
}

impl CredentialTransport for FakeTransport {
    fn send<'a>(&'a self, endpoint: &'a str, credentials: &'a Credentials) -> TransportFuture<'a> {
        Box::pin(async move {
            self.sent
                .borrow_mut()
                .push((endpoint.to_owned(), credentials.clone()));
            if self.fail.get() {
                bail!("connection refused");
            }
            Ok(TransportResponse {
                status: 200,
                body: format!("welcome {}", credentials.username),
            })
        })
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: RefCell<Vec<String>>,
    pub failures: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn response(&self, body: &str) {
        self.messages.borrow_mut().push(body.to_owned());
    }

    fn failure(&self, message: &str) {
        self.failures.borrow_mut().push(message.to_owned());
    }
}
