use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

/// 欄位推斷型別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Text,
    Other,
}

impl ColumnType {
    /// Numeric 需至少一個非空值且全為數字；全空欄位視為 Text
    pub fn infer(values: &[Value]) -> Self {
        let mut present = values.iter().filter(|v| !v.is_null()).peekable();
        if present.peek().is_none() {
            return ColumnType::Text;
        }

        let mut all_numbers = true;
        let mut all_strings = true;
        for value in present {
            all_numbers &= value.is_number();
            all_strings &= value.is_string();
        }

        if all_numbers {
            ColumnType::Numeric
        } else if all_strings {
            ColumnType::Text
        } else {
            ColumnType::Other
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Text => "text",
            ColumnType::Other => "other",
        };
        f.pad(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    name: String,
    values: Vec<Value>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn column_type(&self) -> ColumnType {
        ColumnType::infer(&self.values)
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }
}

/// 記憶體中的表格資料：欄位名稱唯一，每欄長度都等於 `row_count`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
    row_count: usize,
}

impl Dataset {
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// 由列資料建立。重複的欄名會加上 `_1`, `_2` 後綴
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = names.len();
        let row_count = rows.len();
        let mut columns: Vec<Column> = Vec::with_capacity(width);
        let mut seen = HashSet::with_capacity(width);

        for name in names {
            let name = unique_name(&mut seen, name);
            columns.push(Column {
                name,
                values: Vec::with_capacity(row_count),
            });
        }

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(EtlError::Shape {
                    message: format!(
                        "row {} has {} values but there are {} columns",
                        index,
                        row.len(),
                        width
                    ),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Ok(Self { columns, row_count })
    }

    /// 沒有欄位但有列數的資料集，例如 JSON `[{}, {}]`
    pub fn with_row_count(row_count: usize) -> Self {
        Self {
            columns: Vec::new(),
            row_count,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Value>> + '_ {
        (0..self.row_count).map(move |i| self.columns.iter().map(|c| &c.values[i]).collect())
    }

    pub fn missing_count(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }

    /// 重新命名所有欄位，回傳實際變動的欄位數。新名稱同樣保證唯一
    pub(crate) fn rename_columns<F>(&mut self, mut rename: F) -> usize
    where
        F: FnMut(&str) -> String,
    {
        let mut seen = HashSet::with_capacity(self.columns.len());
        let mut changed = 0;
        for column in &mut self.columns {
            let name = unique_name(&mut seen, rename(&column.name));
            if name != column.name {
                column.name = name;
                changed += 1;
            }
        }
        changed
    }

    /// 只保留 `keep[i] == true` 的列，順序不變
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.row_count);
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&true));
        }
        self.row_count = keep.iter().filter(|k| **k).count();
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }
}

fn unique_name(seen: &mut HashSet<String>, name: String) -> String {
    if seen.insert(name.clone()) {
        return name;
    }
    let mut suffix = 1;
    loop {
        let candidate = format!("{}_{}", name, suffix);
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// 資料來源：本機檔案或回傳 JSON 陣列的 HTTP 端點
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    File(PathBuf),
    Api(String),
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::File(path) => write!(f, "{}", path.display()),
            SourceDescriptor::Api(url) => f.write_str(url),
        }
    }
}

pub const DEFAULT_CSV_PATH: &str = "cleaned_data.csv";
pub const DEFAULT_DATABASE: &str = "database.db";
pub const DEFAULT_TABLE: &str = "cleaned_data";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinkDescriptor {
    pub csv_path: PathBuf,
    pub database: String,
    pub table: String,
}

impl Default for SinkDescriptor {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            database: DEFAULT_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum MissingValuePolicy {
    /// 刪除任何含缺值的列
    #[default]
    Drop,
    /// 數值欄補中位數，其餘補固定字串
    Fill,
}

pub const DEFAULT_FILL_TEXT: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanOptions {
    pub missing_values: MissingValuePolicy,
    pub fill_text: String,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            missing_values: MissingValuePolicy::Drop,
            fill_text: DEFAULT_FILL_TEXT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub columns_renamed: usize,
    pub rows_before: usize,
    pub duplicates_removed: usize,
    pub missing_values_before: usize,
    pub rows_dropped: usize,
    pub values_filled: usize,
    pub missing_values_after: usize,
    pub rows_after: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformResult {
    pub dataset: Dataset,
    pub report: CleaningReport,
    pub summary: Option<crate::core::analysis::DatasetSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub csv_path: PathBuf,
    pub database: String,
    pub table: String,
    pub rows_written: usize,
}
