mod html5ever_engine;

use crate::dom::DOM;
use crate::parser::html5ever_engine::Html5everEngine;
use anyhow::{Error, anyhow};
use bytes::Bytes;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt as _};

/// Parse a complete document held in memory.
///
/// # Errors
/// Parsing itself is infallible for HTML5; the `Result` mirrors the streaming API.
pub fn parse_document(markup: &str) -> Result<DOM, Error> {
    let mut engine = Html5everEngine::new();
    engine.push(markup.as_bytes());
    Ok(engine.finalize())
}

/// Streaming parser: bytes arrive asynchronously, html5ever runs on a blocking worker.
pub struct HTMLParser {
    process_handle: JoinHandle<Result<DOM, Error>>,
}

impl HTMLParser {
    pub fn parse<S>(handle: &Handle, byte_stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, Error>> + Send + Unpin + 'static,
    {
        let process_handle = handle.spawn(Self::process(byte_stream));
        Self { process_handle }
    }

    /// Drive a byte stream to completion and return the parsed tree.
    ///
    /// # Errors
    /// Returns the first stream error, or an error if the parse worker panicked.
    pub async fn process<S>(mut byte_stream: S) -> Result<DOM, Error>
    where
        S: Stream<Item = Result<Bytes, Error>> + Send + Unpin + 'static,
    {
        // Bridge async stream into a blocking worker so !Send html5ever stays off async threads.
        let (tx, mut rx) = tokio::sync::mpsc::channel::<Bytes>(64);
        let worker = tokio::task::spawn_blocking(move || {
            let mut engine = Html5everEngine::new();
            while let Some(chunk) = rx.blocking_recv() {
                engine.push(&chunk);
            }
            engine.finalize()
        });

        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk?;
            if tx.send(chunk).await.is_err() {
                break;
            }
        }
        drop(tx);
        let dom = worker.await.map_err(|_| anyhow!("parse worker panicked"))?;
        log::debug!("html: parsed streamed document");
        Ok(dom)
    }

    pub fn is_finished(&self) -> bool {
        self.process_handle.is_finished()
    }

    /// Wait for the parse to finish.
    ///
    /// # Errors
    /// Returns the parse error or a join error if the task was cancelled.
    pub async fn finish(self) -> Result<DOM, Error> {
        self.process_handle.await?
    }
}
