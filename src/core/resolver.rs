use crate::core::decode::{self, format_for};
use crate::domain::model::{Dataset, SourceDescriptor};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 依前綴與副檔名判斷來源類型
pub fn describe_source(source: &str) -> Result<SourceDescriptor> {
    if source.starts_with("http://") || source.starts_with("https://") {
        return Ok(SourceDescriptor::Api(source.to_string()));
    }

    let path = PathBuf::from(source);
    if format_for(&path).is_some() {
        Ok(SourceDescriptor::File(path))
    } else {
        Err(EtlError::UnsupportedSource {
            source_name: source.to_string(),
        })
    }
}

/// 把來源描述轉成記憶體中的資料集。單次嘗試，不重試
pub struct SourceResolver<S: Storage> {
    storage: S,
    client: Client,
}

impl<S: Storage> SourceResolver<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            client: Client::new(),
        }
    }

    pub fn with_timeout(storage: S, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| EtlError::Config {
            message: format!("failed to build HTTP client: {}", e),
        })?;
        Ok(Self { storage, client })
    }

    pub async fn resolve(&self, source: &str) -> Result<Dataset> {
        self.load(describe_source(source)?).await
    }

    pub async fn load(&self, source: SourceDescriptor) -> Result<Dataset> {
        match source {
            SourceDescriptor::Api(url) => self.load_from_api(&url).await,
            SourceDescriptor::File(path) => self.load_from_file(&path).await,
        }
    }

    pub async fn load_from_file(&self, path: &Path) -> Result<Dataset> {
        let format = format_for(path).ok_or_else(|| EtlError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;

        tracing::info!("Loading {} file: {}", format.label, path.display());
        let bytes = self.storage.read_file(&path.to_string_lossy()).await?;
        let dataset = (format.decode)(&bytes, &path.display().to_string())?;

        tracing::debug!(
            "Decoded {} rows x {} columns from {}",
            dataset.row_count(),
            dataset.column_count(),
            path.display()
        );
        Ok(dataset)
    }

    pub async fn load_from_api(&self, url: &str) -> Result<Dataset> {
        tracing::info!("Loading data from API: {}", url);
        let request_failed = |source: reqwest::Error| EtlError::Request {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_failed)?;
        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            return Err(EtlError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(request_failed)?;
        decode::decode_json(&body, url)
    }
}
