use crate::core::analysis::DatasetSummary;
use crate::core::{CleaningReport, LoadReport, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows_extracted: usize,
    pub cleaning: CleaningReport,
    pub summary: Option<DatasetSummary>,
    pub load: LoadReport,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// 依序執行 extract → transform → load，任何一步失敗就停止並回傳錯誤
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn monitor(&self) -> &SystemMonitor {
        &self.monitor
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let started_at = Utc::now();
        tracing::info!("Starting ETL process...");

        // Extract
        tracing::info!("Extracting data...");
        let raw_data = self.pipeline.extract().await?;
        let rows_extracted = raw_data.row_count();
        tracing::info!(
            "Extracted {} rows x {} columns",
            rows_extracted,
            raw_data.column_count()
        );
        self.monitor.record_phase("Extract", rows_extracted);

        // Transform
        tracing::info!("Transforming data...");
        let transformed = self.pipeline.transform(raw_data).await?;
        let cleaning = transformed.report.clone();
        let summary = transformed.summary.clone();
        tracing::info!("Transformed into {} rows", transformed.dataset.row_count());
        self.monitor
            .record_phase("Transform", transformed.dataset.row_count());

        // Load
        tracing::info!("Loading data...");
        let load = self.pipeline.load(transformed).await?;
        tracing::info!(
            "Output saved to: {} and {} (table '{}')",
            load.csv_path.display(),
            load.database,
            load.table
        );
        self.monitor.record_phase("Load", load.rows_written);
        self.monitor.log_final_stats();

        Ok(RunSummary {
            rows_extracted,
            cleaning,
            summary,
            load,
            started_at,
            finished_at: Utc::now(),
        })
    }
}
