use crate::core::{CleanOptions, ConfigProvider, MissingValuePolicy, SinkDescriptor};
use crate::domain::model::{DEFAULT_CSV_PATH, DEFAULT_DATABASE, DEFAULT_FILL_TEXT, DEFAULT_TABLE};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub clean: CleanConfig,
    #[serde(default)]
    pub analyze: AnalyzeConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub location: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanConfig {
    #[serde(default)]
    pub missing_values: MissingValuePolicy,
    #[serde(default = "default_fill_text")]
    pub fill_text: String,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            missing_values: MissingValuePolicy::default(),
            fill_text: default_fill_text(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            database: default_database(),
            table: default_table(),
        }
    }
}

fn default_fill_text() -> String {
    DEFAULT_FILL_TEXT.to_string()
}

fn default_csv_path() -> String {
    DEFAULT_CSV_PATH.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EtlError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_URL})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::Config {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.into_owned())
    }

    pub fn name(&self) -> &str {
        self.pipeline.name.as_deref().unwrap_or("tab-ingest")
    }
}

impl ConfigProvider for TomlConfig {
    fn source(&self) -> &str {
        &self.source.location
    }

    fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            missing_values: self.clean.missing_values,
            fill_text: self.clean.fill_text.clone(),
        }
    }

    fn sink(&self) -> SinkDescriptor {
        SinkDescriptor {
            csv_path: PathBuf::from(&self.sink.csv_path),
            database: self.sink.database.clone(),
            table: self.sink.table.clone(),
        }
    }

    fn analyze(&self) -> bool {
        self.analyze.enabled
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.source.timeout_seconds
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_source("source.location", &self.source.location)?;
        validation::validate_path("sink.csv_path", &self.sink.csv_path)?;
        validation::validate_path("sink.database", &self.sink.database)?;
        validation::validate_table_name("sink.table", &self.sink.table)?;
        if let Some(timeout) = self.source.timeout_seconds {
            validation::validate_range("source.timeout_seconds", timeout, 1, 3600)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[pipeline]
name = "survey-import"
description = "Weekly survey export"

[source]
location = "https://api.example.com/responses"
timeout_seconds = 30

[clean]
missing_values = "fill"
fill_text = "n/a"

[analyze]
enabled = true

[sink]
csv_path = "out/survey.csv"
database = "out/survey.db"
table = "responses"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.name(), "survey-import");
        assert_eq!(config.source(), "https://api.example.com/responses");
        assert_eq!(config.timeout_seconds(), Some(30));
        assert_eq!(config.clean_options().missing_values, MissingValuePolicy::Fill);
        assert_eq!(config.clean_options().fill_text, "n/a");
        assert!(config.analyze());
        assert_eq!(config.sink().table, "responses");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("[source]\nlocation = \"data.xlsx\"\n").unwrap();

        assert_eq!(config.name(), "tab-ingest");
        assert_eq!(config.clean_options(), CleanOptions::default());
        assert_eq!(config.sink(), SinkDescriptor::default());
        assert!(!config.analyze());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TAB_INGEST_TEST_SOURCE", "https://test.api.com/rows");

        let toml_content = r#"
[source]
location = "${TAB_INGEST_TEST_SOURCE}"

[sink]
table = "${TAB_INGEST_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.source.location, "https://test.api.com/rows");
        assert_eq!(config.sink.table, "${TAB_INGEST_UNSET_VARIABLE}");

        std::env::remove_var("TAB_INGEST_TEST_SOURCE");
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let toml_content = r#"
[source]
location = "data.csv"

[clean]
missing_values = "interpolate"
"#;
        assert!(matches!(
            TomlConfig::from_toml_str(toml_content),
            Err(EtlError::Config { .. })
        ));
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[source]
location = "https://"

[sink]
table = ""
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[pipeline]\nname = \"file-test\"\n\n[source]\nlocation = \"rows.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.name(), "file-test");
        assert_eq!(config.source(), "rows.json");
    }
}
