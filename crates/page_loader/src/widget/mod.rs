//! Deferred login widget.
//!
//! The form is injected right after eager decoration. A background task then waits for
//! the verification script, renders it and attaches the submission handler. Until the
//! handler is attached, submissions are discarded.

pub mod form;
pub mod readiness;
pub mod submit;

use core::cell::Cell;
use std::rc::Rc;

use anyhow::Error;
use html::NodeId;
use log::{info, warn};
use serde::Serialize;
use tokio::sync::watch;

use crate::config::WidgetConfig;
use crate::document::SharedDocument;
use crate::scheduler::BackgroundTasks;

pub use form::{WidgetForm, inject_form, read_credentials};
pub use readiness::{PollPolicy, Readiness, VerificationScript, wait_until_ready};
pub use submit::{
    CredentialTransport, Credentials, HttpTransport, LogNotifier, Notifier, SubmissionOutcome,
    TransportResponse, submit_credentials,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetState {
    /// Form injected, waiting for the verification script.
    Waiting,
    /// Script rendered and submission handler attached.
    Ready,
    TimedOut,
    Cancelled,
    Failed,
}

pub struct WidgetLoader {
    config: WidgetConfig,
    script: Rc<dyn VerificationScript>,
    transport: Rc<dyn CredentialTransport>,
    notifier: Rc<dyn Notifier>,
}

impl WidgetLoader {
    pub fn new(
        config: WidgetConfig,
        script: Rc<dyn VerificationScript>,
        transport: Rc<dyn CredentialTransport>,
        notifier: Rc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            script,
            transport,
            notifier,
        }
    }

    /// `reqwest` transport and log notifier.
    pub fn with_defaults(config: WidgetConfig, script: Rc<dyn VerificationScript>) -> Self {
        Self::new(
            config,
            script,
            Rc::new(HttpTransport::default()),
            Rc::new(LogNotifier),
        )
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Inject the form into `main` and spawn the readiness task on `tasks`.
    ///
    /// # Errors
    /// Returns an error if the form cannot be injected; nothing is spawned then.
    pub fn start(
        &self,
        doc: &SharedDocument,
        main: NodeId,
        tasks: &BackgroundTasks,
    ) -> Result<WidgetHandle, Error> {
        let widget = doc.write(|dom| inject_form(dom, main, &self.config.site_key))?;
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = WidgetHandle {
            inner: Rc::new(HandleInner {
                state: Cell::new(WidgetState::Waiting),
                cancel: cancel_tx,
                doc: doc.clone(),
                widget,
                endpoint: self.config.endpoint.clone(),
                transport: Rc::clone(&self.transport),
                notifier: Rc::clone(&self.notifier),
            }),
        };
        let policy = PollPolicy {
            interval: self.config.poll_interval(),
            limit: self.config.poll_limit,
        };
        let script = Rc::clone(&self.script);
        let site_key = self.config.site_key.clone();
        let task_handle = handle.clone();
        tasks.spawn("widget", async move {
            let inner = &task_handle.inner;
            match wait_until_ready(script.as_ref(), policy, cancel_rx).await {
                Readiness::Ready => {}
                Readiness::TimedOut { attempts } => {
                    warn!("widget: verification script not loaded after {attempts} polls");
                    inner.state.set(WidgetState::TimedOut);
                    return Ok(());
                }
                Readiness::Cancelled => {
                    inner.state.set(WidgetState::Cancelled);
                    return Ok(());
                }
            }
            let rendered = inner
                .doc
                .write(|dom| script.render(dom, inner.widget.placeholder, &site_key));
            if let Err(err) = rendered {
                inner.state.set(WidgetState::Failed);
                return Err(err.context("rendering verification widget"));
            }
            inner.state.set(WidgetState::Ready);
            info!("widget: verification rendered, submissions enabled");
            Ok(())
        });
        Ok(handle)
    }
}

struct HandleInner {
    state: Cell<WidgetState>,
    cancel: watch::Sender<bool>,
    doc: SharedDocument,
    widget: WidgetForm,
    endpoint: String,
    transport: Rc<dyn CredentialTransport>,
    notifier: Rc<dyn Notifier>,
}

/// The page-side view of a started widget.
#[derive(Clone)]
pub struct WidgetHandle {
    inner: Rc<HandleInner>,
}

impl WidgetHandle {
    pub fn state(&self) -> WidgetState {
        self.inner.state.get()
    }

    pub fn form(&self) -> WidgetForm {
        self.inner.widget
    }

    /// Submit the form. Returns `None` when the handler is not attached yet.
    pub async fn submit(&self) -> Option<SubmissionOutcome> {
        if self.state() != WidgetState::Ready {
            info!("widget: submission discarded, handler not attached");
            return None;
        }
        let inner = &self.inner;
        Some(
            submit_credentials(
                &inner.doc,
                &inner.widget,
                &inner.endpoint,
                inner.transport.as_ref(),
                inner.notifier.as_ref(),
            )
            .await,
        )
    }

    /// Stop waiting for the verification script. No effect once it is ready.
    pub fn cancel(&self) {
        self.inner.cancel.send_replace(true);
    }
}
