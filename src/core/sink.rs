use crate::adapters::sqlite;
use crate::domain::model::{Dataset, LoadReport, SinkDescriptor};
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use serde_json::Value;
use std::path::Path;

pub fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 帶標題列的 CSV，不輸出索引欄
pub fn to_csv_bytes(dataset: &Dataset, path: &Path) -> Result<Vec<u8>> {
    if dataset.column_count() == 0 {
        return Ok(Vec::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(dataset.column_names())
        .map_err(|e| EtlError::io(path, e.into()))?;
    for row in dataset.rows() {
        writer
            .write_record(row.into_iter().map(render_cell))
            .map_err(|e| EtlError::io(path, e.into()))?;
    }
    writer
        .into_inner()
        .map_err(|e| EtlError::io(path, e.into_error()))
}

/// 寫出 CSV 檔與 SQLite 資料表。
///
/// 兩者是各自獨立的寫入，彼此之間沒有交易：CSV 先寫，
/// 若資料表寫入失敗，已寫好的 CSV 不會回滾。
pub struct SinkWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> SinkWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// 覆寫既有檔案
    pub async fn write_file_sink(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let bytes = to_csv_bytes(dataset, path)?;
        tracing::debug!("Writing CSV ({} bytes) to {}", bytes.len(), path.display());
        self.storage.write_file(&path.to_string_lossy(), &bytes).await?;
        tracing::info!("Data saved to CSV: {}", path.display());
        Ok(())
    }

    /// 整表取代，回傳寫入列數
    pub async fn write_relational_sink(
        &self,
        dataset: Dataset,
        database: &str,
        table: &str,
    ) -> Result<usize> {
        let target = database.to_string();
        let name = table.to_string();

        let written = tokio::task::spawn_blocking(move || {
            sqlite::write_table(&target, &name, &dataset)
        })
        .await
        .map_err(|e| EtlError::persistence(database, table, e))??;

        tracing::info!(
            "Data saved to SQL database: {} (table '{}', {} rows)",
            database,
            table,
            written
        );
        Ok(written)
    }

    pub async fn persist(&self, dataset: Dataset, sink: &SinkDescriptor) -> Result<LoadReport> {
        tracing::info!("Saving data...");
        self.write_file_sink(&dataset, &sink.csv_path).await?;
        let rows_written = self
            .write_relational_sink(dataset, &sink.database, &sink.table)
            .await?;

        Ok(LoadReport {
            csv_path: sink.csv_path.clone(),
            database: sink.database.clone(),
            table: sink.table.clone(),
            rows_written,
        })
    }
}
