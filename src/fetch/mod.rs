//! Loading input documents from a local path or over HTTP.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// Issues a GET for `url` through `client` and returns the body.
///
/// # Errors
///
/// Fails on transport errors and on any non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("GET {url} returned {status}");
    }
    Ok(resp.bytes().await?.to_vec())
}

/// Reads `source` from disk, or fetches it when it looks like an HTTP URL.
#[tracing::instrument(skip(client))]
pub async fn load<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(client, source).await?
    } else {
        std::fs::read(source).with_context(|| format!("reading '{source}'"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records requested URLs and never touches the network.
    struct RecordingClient {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpClient for RecordingClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            self.seen.lock().unwrap().push(req.url().to_string());
            let resp = http_response(b"remote".to_vec());
            Ok(resp)
        }
    }

    fn http_response(body: Vec<u8>) -> reqwest::Response {
        axum::http::Response::builder()
            .status(200)
            .body(body)
            .unwrap()
            .into()
    }

    #[tokio::test]
    async fn test_load_reads_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.csv");
        std::fs::write(&path, "Topico,Indicador,Abertura\n").unwrap();

        let client = RecordingClient {
            seen: Mutex::new(Vec::new()),
        };
        let bytes = load(&client, path.to_str().unwrap()).await.unwrap();

        assert_eq!(bytes, b"Topico,Indicador,Abertura\n");
        assert!(client.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_fetches_urls() {
        let client = RecordingClient {
            seen: Mutex::new(Vec::new()),
        };
        let bytes = load(&client, "https://example.com/base.csv").await.unwrap();

        assert_eq!(bytes, b"remote");
        assert_eq!(
            client.seen.lock().unwrap().as_slice(),
            &["https://example.com/base.csv".to_string()]
        );
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let client = BasicClient::new();
        assert!(load(&client, "/nonexistent/base.csv").await.is_err());
    }
}
