//! 探索式摘要：形狀、各欄型別與缺值、數值欄位的敘述統計與相關係數。
//! 只讀取資料集，不做任何修改。

use crate::domain::model::{ColumnType, Dataset};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

fn sorted_numbers(values: &[Value]) -> Vec<f64> {
    let mut numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    numbers.sort_by(f64::total_cmp);
    numbers
}

/// 線性內插分位數，`sorted` 需已排序且非空
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// 只計算非缺值的數字
pub fn median(values: &[Value]) -> Option<f64> {
    let sorted = sorted_numbers(values);
    if sorted.is_empty() {
        None
    } else {
        Some(quantile(&sorted, 0.5))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl NumericStats {
    pub fn from_values(values: &[Value]) -> Option<Self> {
        let sorted = sorted_numbers(values);
        let count = sorted.len();
        if count == 0 {
            return None;
        }

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let variance =
                sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        });

        Some(Self {
            count,
            mean,
            std,
            min: sorted[0],
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.5),
            p75: quantile(&sorted, 0.75),
            max: sorted[count - 1],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub column_type: ColumnType,
    pub non_missing: usize,
    pub missing: usize,
    pub numeric: Option<NumericStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub correlation: Option<CorrelationMatrix>,
}

/// Pearson 相關係數，只使用兩欄皆有值的列
fn pearson(xs: &[Value], ys: &[Value]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x.as_f64()?, y.as_f64()?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    let columns: Vec<ColumnSummary> = dataset
        .columns()
        .iter()
        .map(|column| {
            let column_type = column.column_type();
            let missing = column.missing_count();
            ColumnSummary {
                name: column.name().to_string(),
                column_type,
                non_missing: column.values().len() - missing,
                missing,
                numeric: match column_type {
                    ColumnType::Numeric => NumericStats::from_values(column.values()),
                    _ => None,
                },
            }
        })
        .collect();

    let numeric: Vec<_> = dataset
        .columns()
        .iter()
        .filter(|c| c.column_type() == ColumnType::Numeric)
        .collect();

    let correlation = (numeric.len() > 1).then(|| CorrelationMatrix {
        columns: numeric.iter().map(|c| c.name().to_string()).collect(),
        values: numeric
            .iter()
            .map(|a| {
                numeric
                    .iter()
                    .map(|b| pearson(a.values(), b.values()))
                    .collect()
            })
            .collect(),
    });

    DatasetSummary {
        rows: dataset.row_count(),
        columns,
        correlation,
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |v| format!("{:.4}", v))
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape of dataset: ({}, {})", self.rows, self.columns.len())?;

        writeln!(f, "\nColumns:")?;
        for c in &self.columns {
            writeln!(
                f,
                "  {:<24} {:<8} non-missing={:<6} missing={}",
                c.name, c.column_type, c.non_missing, c.missing
            )?;
        }

        let described: Vec<_> = self
            .columns
            .iter()
            .filter_map(|c| c.numeric.as_ref().map(|s| (&c.name, s)))
            .collect();
        if !described.is_empty() {
            writeln!(f, "\nSummary Statistics:")?;
            for (name, s) in described {
                writeln!(
                    f,
                    "  {:<24} count={} mean={:.4} std={} min={} 25%={} 50%={} 75%={} max={}",
                    name,
                    s.count,
                    s.mean,
                    fmt_opt(s.std),
                    s.min,
                    s.p25,
                    s.p50,
                    s.p75,
                    s.max
                )?;
            }
        }

        if let Some(matrix) = &self.correlation {
            writeln!(f, "\nCorrelation Matrix:")?;
            write!(f, "  {:<24}", "")?;
            for name in &matrix.columns {
                write!(f, " {:>12}", name)?;
            }
            writeln!(f)?;
            for (name, row) in matrix.columns.iter().zip(&matrix.values) {
                write!(f, "  {:<24}", name)?;
                for value in row {
                    write!(f, " {:>12}", fmt_opt(*value))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
