use crate::core::analysis::summarize;
use crate::core::cleaner::Cleaner;
use crate::core::resolver::SourceResolver;
use crate::core::sink::SinkWriter;
use crate::core::{ConfigProvider, Dataset, LoadReport, Pipeline, Storage, TransformResult};
use crate::utils::error::Result;
use std::time::Duration;

/// 檔案或 API → 清理 → CSV + SQLite
pub struct IngestPipeline<S: Storage + Clone, C: ConfigProvider> {
    resolver: SourceResolver<S>,
    cleaner: Cleaner,
    sink: SinkWriter<S>,
    config: C,
}

impl<S: Storage + Clone, C: ConfigProvider> IngestPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let timeout = config.timeout_seconds().map(Duration::from_secs);
        Ok(Self {
            resolver: SourceResolver::with_timeout(storage.clone(), timeout)?,
            cleaner: Cleaner::new(config.clean_options()),
            sink: SinkWriter::new(storage),
            config,
        })
    }

    pub fn config(&self) -> &C {
        &self.config
    }
}

#[async_trait::async_trait]
impl<S: Storage + Clone, C: ConfigProvider> Pipeline for IngestPipeline<S, C> {
    async fn extract(&self) -> Result<Dataset> {
        self.resolver.resolve(self.config.source()).await
    }

    async fn transform(&self, data: Dataset) -> Result<TransformResult> {
        let (dataset, report) = self.cleaner.clean(data);

        let summary = if self.config.analyze() {
            let summary = summarize(&dataset);
            tracing::info!("\n--- DATA ANALYSIS ---\n{}", summary);
            Some(summary)
        } else {
            None
        };

        Ok(TransformResult {
            dataset,
            report,
            summary,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<LoadReport> {
        self.sink.persist(result.dataset, &self.config.sink()).await
    }
}
