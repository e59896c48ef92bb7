//! Three-phase page bootstrap.
//!
//! `eager` decorates the page and loads the first section, `lazy` loads everything
//! else visible, `delayed` schedules non-critical work. Each phase starts after the
//! previous one resolves. Side work (fonts, the widget, the delayed task) goes to
//! [`BackgroundTasks`] and is never awaited by the chain.

use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::rc::Rc;

use anyhow::Error;
use futures::join;
use html::NodeId;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::runtime::Builder;
use tokio::task::LocalSet;
use tokio::time::{Instant, sleep};
use tracing::{Instrument as _, info_span};
use url::Url;

use crate::collaborators::Collaborators;
use crate::config::LoaderConfig;
use crate::document::SharedDocument;
use crate::fonts::{load_fonts, should_load_fonts_eagerly};
use crate::pipeline::decorate_main;
use crate::scheduler::{BackgroundTasks, TaskSummary};
use crate::sections::{SectionCallback, SectionsReport, load_section, load_sections, sections_of};
use crate::status::LoadStatus;
use crate::storage::SessionStore;
use crate::telemetry::{PhaseTimings, maybe_emit, phase_timings_json};
use crate::widget::{WidgetHandle, WidgetLoader};

/// Body class set once the page may be shown.
pub const APPEAR_CLASS: &str = "appear";

/// Signals read from the environment the page runs in.
#[derive(Debug, Clone)]
pub struct PageEnvironment {
    pub url: Url,
    pub viewport_width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Eager,
    Lazy,
    Delayed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EagerReport {
    pub appeared: bool,
    pub first_section: Option<LoadStatus>,
    pub fonts_eager: bool,
    pub widget_started: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LazyReport {
    pub sections: SectionsReport,
    pub scrolled_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageLoadReport {
    pub appeared: bool,
    pub first_section: Option<LoadStatus>,
    pub sections: SectionsReport,
    pub timings: PhaseTimings,
}

pub struct PageBootstrap {
    config: LoaderConfig,
    collaborators: Rc<dyn Collaborators>,
    environment: PageEnvironment,
    store: Rc<dyn SessionStore>,
    tasks: BackgroundTasks,
    widget_loader: Option<WidgetLoader>,
    widget: RefCell<Option<WidgetHandle>>,
    appeared: Cell<bool>,
    completed: Cell<Option<Phase>>,
}

impl PageBootstrap {
    pub fn new(
        config: LoaderConfig,
        collaborators: Rc<dyn Collaborators>,
        environment: PageEnvironment,
        store: Rc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            collaborators,
            environment,
            store,
            tasks: BackgroundTasks::new(),
            widget_loader: None,
            widget: RefCell::new(None),
            appeared: Cell::new(false),
            completed: Cell::new(None),
        }
    }

    /// Start this widget during the eager phase (unless disabled in its config).
    #[must_use]
    pub fn with_widget(mut self, loader: WidgetLoader) -> Self {
        self.widget_loader = Some(loader);
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    pub fn widget(&self) -> Option<WidgetHandle> {
        self.widget.borrow().clone()
    }

    pub fn has_appeared(&self) -> bool {
        self.appeared.get()
    }

    /// Last phase that ran to completion.
    pub fn completed_phase(&self) -> Option<Phase> {
        self.completed.get()
    }

    fn finish_phase(&self, phase: Phase) {
        debug!("bootstrap: {phase:?} phase complete");
        self.completed.set(Some(phase));
    }

    fn mark_appeared(&self, doc: &SharedDocument) {
        if self.appeared.replace(true) {
            return;
        }
        if let Some(body) = doc.body() {
            doc.write(|dom| dom.add_class(body, APPEAR_CLASS));
        }
        info!("bootstrap: page appeared");
    }

    fn spawn_fonts(&self, doc: &SharedDocument, name: &'static str) {
        let doc = doc.clone();
        let collaborators = Rc::clone(&self.collaborators);
        let store = Rc::clone(&self.store);
        let code_base_path = self.config.code_base_path.clone();
        let url = self.environment.url.clone();
        self.tasks.spawn(name, async move {
            load_fonts(
                &doc,
                collaborators.as_ref(),
                &code_base_path,
                &url,
                store.as_ref(),
            )
            .await
        });
    }

    fn start_widget(&self, doc: &SharedDocument, main: NodeId) -> bool {
        let Some(loader) = self.widget_loader.as_ref().filter(|loader| loader.config().enabled)
        else {
            return false;
        };
        match loader.start(doc, main, &self.tasks) {
            Ok(handle) => {
                *self.widget.borrow_mut() = Some(handle);
                true
            }
            Err(err) => {
                warn!("bootstrap: widget not started: {err:#}");
                false
            }
        }
    }

    /// Decorate the page and load the first section.
    pub async fn load_eager(&self, doc: &SharedDocument) -> EagerReport {
        let collaborators = self.collaborators.as_ref();
        let mut report = EagerReport::default();
        async {
            doc.write(|dom| {
                if let Some(html) = dom.first_by_tag(dom.root(), "html") {
                    dom.set_attr(html, "lang", &self.config.language);
                }
                if let Err(err) = collaborators.decorate_template_and_theme(dom) {
                    warn!("bootstrap: template/theme decoration failed: {err:#}");
                }
            });
            let main = doc.main();
            match main {
                Some(main) => {
                    doc.write(|dom| decorate_main(dom, collaborators, main));
                    self.mark_appeared(doc);
                    report.appeared = true;

                    if let Some(first) = doc.read(|dom| sections_of(dom, main).first().copied()) {
                        let callback: SectionCallback<'_> = Box::new(move |section| {
                            collaborators.wait_for_first_image(doc, section)
                        });
                        let status = load_section(doc, collaborators, first, Some(callback)).await;
                        report.first_section = Some(status);
                    }
                }
                None => warn!("bootstrap: document has no main element"),
            }

            let fonts_eager = should_load_fonts_eagerly(
                self.environment.viewport_width,
                self.config.desktop_breakpoint,
                self.store.as_ref(),
                &self.environment.url,
            );
            if fonts_eager {
                self.spawn_fonts(doc, "fonts:eager");
            }
            report.fonts_eager = fonts_eager;
            report.widget_started = main.is_some_and(|main| self.start_widget(doc, main));
        }
        .instrument(info_span!("eager"))
        .await;
        self.finish_phase(Phase::Eager);
        report
    }

    /// Load the remaining sections, header and footer, and lazy styles.
    pub async fn load_lazy(&self, doc: &SharedDocument) -> LazyReport {
        if self.completed_phase() < Some(Phase::Eager) {
            warn!("bootstrap: lazy phase started before eager completed");
        }
        let collaborators = self.collaborators.as_ref();
        let mut report = LazyReport::default();
        async {
            if let Some(main) = doc.main() {
                report.sections = load_sections(doc, collaborators, main).await;
            }

            if let Some(fragment) = self.environment.url.fragment().filter(|hash| !hash.is_empty()) {
                let scrolled = doc.write(|dom| {
                    let target = dom.element_by_id(fragment)?;
                    collaborators.scroll_into_view(dom, target);
                    Some(())
                });
                if scrolled.is_some() {
                    report.scrolled_to = Some(fragment.to_owned());
                }
            }

            let header = doc.first_by_tag("header");
            let footer = doc.first_by_tag("footer");
            let load_header = async {
                if let Some(header) = header {
                    if let Err(err) = collaborators.load_header(doc, header).await {
                        warn!("bootstrap: header failed to load: {err:#}");
                    }
                }
            };
            let load_footer = async {
                if let Some(footer) = footer {
                    if let Err(err) = collaborators.load_footer(doc, footer).await {
                        warn!("bootstrap: footer failed to load: {err:#}");
                    }
                }
            };
            join!(load_header, load_footer);

            let lazy_styles = format!("{}/styles/lazy-styles.css", self.config.code_base_path);
            let styles_doc = doc.clone();
            let styles_collaborators = Rc::clone(&self.collaborators);
            self.tasks.spawn("lazy-styles", async move {
                styles_collaborators.load_css(&styles_doc, lazy_styles).await
            });
            self.spawn_fonts(doc, "fonts:lazy");
        }
        .instrument(info_span!("lazy"))
        .await;
        self.finish_phase(Phase::Lazy);
        report
    }

    /// Schedule the delayed task; returns without waiting for it.
    pub fn load_delayed(&self, doc: &SharedDocument) {
        if self.completed_phase() < Some(Phase::Lazy) {
            warn!("bootstrap: delayed phase scheduled before lazy completed");
        }
        let doc = doc.clone();
        let collaborators = Rc::clone(&self.collaborators);
        let delay = self.config.delayed_after();
        self.tasks.spawn(
            "delayed",
            async move {
                sleep(delay).await;
                collaborators.load_delayed(&doc).await
            }
            .instrument(info_span!("delayed")),
        );
        self.finish_phase(Phase::Delayed);
    }

    /// Run the three phases in order.
    ///
    /// Must run inside a `LocalSet`; background tasks keep running after it returns.
    pub async fn load_page(&self, doc: &SharedDocument) -> PageLoadReport {
        let started = Instant::now();
        let eager = self.load_eager(doc).await;
        let eager_done = Instant::now();
        let lazy = self.load_lazy(doc).await;
        let lazy_done = Instant::now();
        self.load_delayed(doc);

        let mut timings = PhaseTimings {
            eager_ms: millis(eager_done - started),
            lazy_ms: millis(lazy_done - eager_done),
            total_ms: millis(lazy_done - started),
            ..PhaseTimings::default()
        };
        timings.record_sections(eager.first_section, &lazy.sections);
        maybe_emit(self.config.telemetry_enabled, &phase_timings_json(&timings));

        PageLoadReport {
            appeared: eager.appeared,
            first_section: eager.first_section,
            sections: lazy.sections,
            timings,
        }
    }

    /// Load the page, then wait for every background task.
    pub async fn run(&self, doc: &SharedDocument) -> (PageLoadReport, TaskSummary) {
        let report = self.load_page(doc).await;
        let summary = self.tasks.drain().await;
        (report, summary)
    }

    /// [`Self::run`] on a fresh current-thread runtime.
    ///
    /// # Errors
    /// Returns an error if the runtime cannot be built.
    pub fn block_on_page(&self, doc: &SharedDocument) -> Result<(PageLoadReport, TaskSummary), Error> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let local = LocalSet::new();
        Ok(local.block_on(&runtime, self.run(doc)))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
