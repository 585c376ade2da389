use crate::core::{CleanOptions, ConfigProvider, MissingValuePolicy, SinkDescriptor};
use crate::domain::model::{DEFAULT_CSV_PATH, DEFAULT_DATABASE, DEFAULT_FILL_TEXT, DEFAULT_TABLE};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "tab-ingest")]
#[command(about = "Load a tabular dataset, clean it, and save it to CSV and SQLite")]
pub struct CliConfig {
    /// .csv/.xlsx/.xls/.json 檔案，或回傳 JSON 陣列的 http(s) URL
    #[arg(long, help = "File path (.csv, .xlsx, .xls, .json) or http(s) URL")]
    pub source: Option<String>,

    #[arg(long, value_enum, default_value_t = MissingValuePolicy::Drop)]
    pub missing_values: MissingValuePolicy,

    #[arg(long, default_value = DEFAULT_FILL_TEXT, help = "Value used for missing text in fill mode")]
    pub fill_text: String,

    #[arg(long, default_value = DEFAULT_CSV_PATH)]
    pub output_csv: String,

    #[arg(long, default_value = DEFAULT_DATABASE, help = "SQLite path or sqlite:/// URL")]
    pub database: String,

    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    #[arg(long, help = "Log a statistical summary of the cleaned data")]
    pub analyze: bool,

    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    #[arg(long, help = "Read settings from a TOML file instead of the flags above")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl ConfigProvider for CliConfig {
    fn source(&self) -> &str {
        self.source.as_deref().unwrap_or_default()
    }

    fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            missing_values: self.missing_values,
            fill_text: self.fill_text.clone(),
        }
    }

    fn sink(&self) -> SinkDescriptor {
        SinkDescriptor {
            csv_path: PathBuf::from(&self.output_csv),
            database: self.database.clone(),
            table: self.table.clone(),
        }
    }

    fn analyze(&self) -> bool {
        self.analyze
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let source = validation::validate_required_field("source", &self.source)?;
        validation::validate_source("source", source)?;
        validation::validate_path("output_csv", &self.output_csv)?;
        validation::validate_path("database", &self.database)?;
        validation::validate_table_name("table", &self.table)?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_range("timeout_seconds", timeout, 1, 3600)?;
        }
        Ok(())
    }
}
