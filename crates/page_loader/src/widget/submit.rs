use core::future::Future;
use core::pin::Pin;

use anyhow::{Context as _, Error};
use log::{info, warn};
use serde::Serialize;

use crate::document::SharedDocument;

use super::form::{WidgetForm, read_credentials};

/// JSON body POSTed to the verification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<TransportResponse, Error>> + 'a>>;

/// Delivers credentials to the endpoint. One attempt per call.
pub trait CredentialTransport {
    fn send<'a>(&'a self, endpoint: &'a str, credentials: &'a Credentials) -> TransportFuture<'a>;
}

/// JSON POST over `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl CredentialTransport for HttpTransport {
    fn send<'a>(&'a self, endpoint: &'a str, credentials: &'a Credentials) -> TransportFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .post(endpoint)
                .json(credentials)
                .send()
                .await
                .with_context(|| format!("posting credentials to {endpoint}"))?;
            let status = response.status().as_u16();
            let body = response.text().await.context("reading response body")?;
            Ok(TransportResponse { status, body })
        })
    }
}

/// Where submission results are shown to the user.
pub trait Notifier {
    /// The endpoint answered; `body` is its text, shown as is.
    fn response(&self, body: &str);
    fn failure(&self, message: &str);
}

/// Notifier that writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn response(&self, body: &str) {
        info!("widget: {body}");
    }

    fn failure(&self, message: &str) {
        warn!("widget: submission failed: {message}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// The endpoint answered. No status-specific handling.
    Delivered { status: u16, body: String },
    /// Nothing was sent: the form could not produce credentials.
    Rejected { reason: String },
    /// The request itself failed.
    Failed { error: String },
}

/// Read the form and send one submission. Every outcome is reported to `notifier`.
pub async fn submit_credentials(
    doc: &SharedDocument,
    widget: &WidgetForm,
    endpoint: &str,
    transport: &dyn CredentialTransport,
    notifier: &dyn Notifier,
) -> SubmissionOutcome {
    let credentials = match doc.read(|dom| read_credentials(dom, widget)) {
        Ok(credentials) => credentials,
        Err(err) => {
            let reason = format!("{err:#}");
            notifier.failure(&reason);
            return SubmissionOutcome::Rejected { reason };
        }
    };
    match transport.send(endpoint, &credentials).await {
        Ok(TransportResponse { status, body }) => {
            notifier.response(&body);
            SubmissionOutcome::Delivered { status, body }
        }
        Err(err) => {
            let error = format!("{err:#}");
            notifier.failure(&error);
            SubmissionOutcome::Failed { error }
        }
    }
}
