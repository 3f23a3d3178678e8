//! Where workbook bytes come from.

use crate::error::{ReportError, Result};
use futures::future::BoxFuture;
use std::collections::HashMap;

/// Fetches the raw xlsx bytes for a registered file id.
pub trait SpreadsheetSource: Send + Sync {
    fn fetch<'a>(&'a self, file_id: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// In-memory source keyed by file id. Used for local files and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    files: HashMap<String, Vec<u8>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, file_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.insert(file_id.into(), bytes);
        self
    }

    pub fn from_path(file_id: impl Into<String>, path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::new().with_file(file_id, bytes))
    }
}

impl SpreadsheetSource for StaticSource {
    fn fetch<'a>(&'a self, file_id: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        let result = self
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| ReportError::TransportError(format!("unknown file id {}", file_id)));
        Box::pin(async move { result })
    }
}

#[cfg(feature = "remote")]
pub use remote::HttpProxySource;

#[cfg(feature = "remote")]
mod remote {
    use super::SpreadsheetSource;
    use crate::error::{ReportError, Result};
    use futures::future::BoxFuture;
    use log::debug;
    use reqwest::Client;

    /// Downloads files through an HTTP proxy that holds the document-store credentials:
    /// `GET {base_url}?fileId={id}`.
    #[derive(Clone)]
    pub struct HttpProxySource {
        client: Client,
        base_url: String,
    }

    impl HttpProxySource {
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                client: Client::new(),
                base_url: base_url.into(),
            }
        }

        pub fn with_client(mut self, client: Client) -> Self {
            self.client = client;
            self
        }

        async fn download(&self, file_id: &str) -> Result<Vec<u8>> {
            debug!("Fetching file {} via {}", file_id, self.base_url);
            let response = self
                .client
                .get(&self.base_url)
                .query(&[("fileId", file_id)])
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ReportError::TransportError(format!(
                    "Drive API error: {}",
                    status
                )));
            }

            Ok(response.bytes().await?.to_vec())
        }
    }

    impl SpreadsheetSource for HttpProxySource {
        fn fetch<'a>(&'a self, file_id: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
            Box::pin(self.download(file_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_source_returns_registered_bytes() {
        let source = StaticSource::new().with_file("abc", vec![1, 2, 3]);
        assert_eq!(source.fetch("abc").await.unwrap(), vec![1, 2, 3]);

        let err = source.fetch("missing").await.unwrap_err();
        assert!(matches!(err, ReportError::TransportError(_)));
    }
}
