use anyhow::{Context as _, Error, anyhow};
use bytes::Bytes;
use html::HTMLParser;
use log::info;
use reqwest::get as reqwest_get;
use tokio::fs::read as tokio_fs_read;
use tokio_stream::{Stream, StreamExt as _, once};
use url::Url;

use crate::document::SharedDocument;

pub type ByteStream = Box<dyn Stream<Item = Result<Bytes, Error>> + Send + Unpin>;

/// Creates a byte stream from a URL.
///
/// Supported URL schemes:
/// - `http`, `https`: Fetched via `reqwest` as a streaming response
/// - `file`: Read from the local filesystem (emitted as a single chunk)
///
/// # Errors
///
/// - Returns `Err` if the URL scheme is unsupported
/// - Returns `Err` if HTTP fetch fails or returns a non-success status
/// - Returns `Err` if the file path is invalid or the file cannot be read
pub async fn stream_url(url: &Url) -> Result<ByteStream, Error> {
    Ok(match url.scheme() {
        "http" | "https" => {
            let response = reqwest_get(url.clone())
                .await
                .map_err(|err| anyhow!("Failed to fetch URL {url}: {err}"))?;

            if !response.status().is_success() {
                return Err(anyhow!(
                    "Failed to fetch URL: {} (Status: {})",
                    url,
                    response.status()
                ));
            }
            let stream = response.bytes_stream().map(|res| res.map_err(Error::from));
            Box::new(stream)
        }
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|()| anyhow!("Invalid file path for file url: {url}"))?;
            let data = tokio_fs_read(&path)
                .await
                .map(Bytes::from)
                .with_context(|| format!("reading {}", path.display()))?;
            Box::new(once(Ok::<Bytes, Error>(data)))
        }
        _ => return Err(anyhow!("Unsupported url scheme {}", url.scheme())),
    })
}

/// Fetch and parse a page into a shared document.
///
/// # Errors
/// Returns the fetch or parse error.
pub async fn open_document(url: &Url) -> Result<SharedDocument, Error> {
    let stream = stream_url(url).await?;
    let dom = HTMLParser::process(stream).await?;
    info!("url: opened {url}");
    Ok(SharedDocument::new(dom))
}
