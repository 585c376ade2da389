use crate::core::analysis::median;
use crate::domain::model::{CleanOptions, CleaningReport, ColumnType, Dataset, MissingValuePolicy};
use serde_json::{Number, Value};
use std::collections::HashSet;

pub const ID_COLUMN: &str = "id";

/// 去頭尾空白、轉小寫、空格換底線。對已正規化的名稱是 no-op
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// 依固定順序清理：欄名正規化 → `id` 去重 → 缺值處理
#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    options: CleanOptions,
}

impl Cleaner {
    pub fn new(options: CleanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CleanOptions {
        &self.options
    }

    pub fn clean(&self, mut dataset: Dataset) -> (Dataset, CleaningReport) {
        tracing::info!("Cleaning data...");
        let mut report = CleaningReport {
            rows_before: dataset.row_count(),
            ..Default::default()
        };

        report.columns_renamed = normalize_columns(&mut dataset);

        report.duplicates_removed = drop_duplicate_ids(&mut dataset);
        if dataset.column(ID_COLUMN).is_some() {
            tracing::info!(
                "Removed {} duplicate rows based on '{}' column",
                report.duplicates_removed,
                ID_COLUMN
            );
        }

        report.missing_values_before = dataset.missing_count();
        match self.options.missing_values {
            MissingValuePolicy::Drop => {
                report.rows_dropped = drop_missing_rows(&mut dataset);
                tracing::info!(
                    "Removed {} rows containing {} missing values",
                    report.rows_dropped,
                    report.missing_values_before
                );
            }
            MissingValuePolicy::Fill => {
                report.values_filled = fill_missing(&mut dataset, &self.options.fill_text);
                tracing::info!("Filled {} missing values", report.values_filled);
            }
        }

        report.missing_values_after = dataset.missing_count();
        report.rows_after = dataset.row_count();
        (dataset, report)
    }
}

pub fn normalize_columns(dataset: &mut Dataset) -> usize {
    dataset.rename_columns(normalize_column_name)
}

/// 數值以值比較 (`1` 與 `1.0` 相同)，其他以 JSON 表示比較。
/// 整數保留完整精度，不經過 `f64`
fn id_key(value: &Value) -> String {
    if let Some(i) = value.as_i64() {
        return i.to_string();
    }
    if let Some(u) = value.as_u64() {
        return u.to_string();
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => value.to_string(),
    }
}

/// 保留每個 `id` 第一次出現的列。沒有 `id` 欄位時不動
pub fn drop_duplicate_ids(dataset: &mut Dataset) -> usize {
    let keep: Vec<bool> = match dataset.column(ID_COLUMN) {
        Some(column) => {
            let mut seen = HashSet::with_capacity(column.values().len());
            column.values().iter().map(|v| seen.insert(id_key(v))).collect()
        }
        None => return 0,
    };

    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        dataset.retain_rows(&keep);
    }
    removed
}

pub fn drop_missing_rows(dataset: &mut Dataset) -> usize {
    let keep: Vec<bool> = (0..dataset.row_count())
        .map(|i| dataset.columns().iter().all(|c| !c.values()[i].is_null()))
        .collect();

    let removed = keep.iter().filter(|k| !**k).count();
    if removed > 0 {
        dataset.retain_rows(&keep);
    }
    removed
}

/// 全為整數且中位數為整數時維持整數
fn median_value(values: &[Value]) -> Option<Value> {
    let m = median(values)?;
    let integral = values.iter().filter(|v| !v.is_null()).all(Value::is_i64);
    if integral && m.fract() == 0.0 {
        Some(Value::from(m as i64))
    } else {
        Number::from_f64(m).map(Value::Number)
    }
}

pub fn fill_missing(dataset: &mut Dataset, fill_text: &str) -> usize {
    let mut filled = 0;
    for column in dataset.columns_mut() {
        let missing = column.missing_count();
        if missing == 0 {
            continue;
        }

        let fill = match column.column_type() {
            ColumnType::Numeric => median_value(column.values()),
            ColumnType::Text | ColumnType::Other => None,
        }
        .unwrap_or_else(|| Value::String(fill_text.to_string()));

        tracing::debug!("Filling {} missing values in '{}' with {}", missing, column.name(), fill);
        for value in column.values_mut() {
            if value.is_null() {
                *value = fill.clone();
            }
        }
        filled += missing;
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decode::records_to_dataset;
    use serde_json::json;

    fn records(value: Value) -> Dataset {
        records_to_dataset(value, "test").unwrap()
    }

    fn fill_options() -> CleanOptions {
        CleanOptions {
            missing_values: MissingValuePolicy::Fill,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_column_name() {
        assert_eq!(normalize_column_name("  First Name "), "first_name");
        assert_eq!(normalize_column_name("ID"), "id");
        assert_eq!(normalize_column_name("already_done"), "already_done");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for name in [" Zip Code", "A  B", "ÄÖ Ü", "x\ty", "", "  "] {
            let once = normalize_column_name(name);
            assert_eq!(normalize_column_name(&once), once);
        }

        let mut dataset = records(json!([{"A B": 1, "a b": 2, " Name ": "x"}]));
        let first = normalize_columns(&mut dataset);
        let names: Vec<String> = dataset.column_names().iter().map(|s| s.to_string()).collect();
        let second = normalize_columns(&mut dataset);

        assert_eq!(first, 3);
        assert_eq!(second, 0);
        assert_eq!(names, vec!["a_b", "a_b_1", "name"]);
        assert_eq!(dataset.column_names(), vec!["a_b", "a_b_1", "name"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first_in_order() {
        let mut dataset = records(json!([
            {"id": 3, "v": "a"},
            {"id": 1, "v": "b"},
            {"id": 3, "v": "c"},
            {"id": 2, "v": "d"},
            {"id": 1.0, "v": "e"}
        ]));

        let removed = drop_duplicate_ids(&mut dataset);

        assert_eq!(removed, 2);
        assert_eq!(
            dataset.column("v").unwrap().values(),
            &[json!("a"), json!("b"), json!("d")]
        );
        let ids: HashSet<String> = dataset
            .column("id")
            .unwrap()
            .values()
            .iter()
            .map(id_key)
            .collect();
        assert_eq!(ids.len(), dataset.row_count());
    }

    #[test]
    fn test_large_integer_ids_stay_distinct() {
        let mut dataset = records(json!([
            {"id": 9007199254740992_i64, "v": "a"},
            {"id": 9007199254740993_i64, "v": "b"},
            {"id": 18446744073709551615_u64, "v": "c"},
            {"id": 18446744073709551614_u64, "v": "d"},
            {"id": 9007199254740993_i64, "v": "e"}
        ]));

        let removed = drop_duplicate_ids(&mut dataset);

        assert_eq!(removed, 1);
        assert_eq!(
            dataset.column("v").unwrap().values(),
            &[json!("a"), json!("b"), json!("c"), json!("d")]
        );
    }

    #[test]
    fn test_integral_float_id_matches_integer_id() {
        assert_eq!(id_key(&json!(7)), id_key(&json!(7.0)));
        assert_ne!(id_key(&json!(7)), id_key(&json!(7.5)));
        assert_ne!(id_key(&json!(7)), id_key(&json!("7")));
        assert_eq!(id_key(&Value::Null), id_key(&Value::Null));
    }

    #[test]
    fn test_no_id_column_is_noop() {
        let mut dataset = records(json!([{"key": 1}, {"key": 1}]));
        assert_eq!(drop_duplicate_ids(&mut dataset), 0);
        assert_eq!(dataset.row_count(), 2);
    }

    #[test]
    fn test_id_column_found_after_normalization() {
        let cleaner = Cleaner::default();
        let dataset = records(json!([{" ID ": 1, "v": 1}, {" ID ": 1, "v": 2}]));
        let (cleaned, report) = cleaner.clean(dataset);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(cleaned.row_count(), 1);
        assert_eq!(cleaned.column_names(), vec!["id", "v"]);
    }

    #[test]
    fn test_drop_mode_scenario() {
        let dataset = records(json!([
            {"id": 1, "age": 30},
            {"id": 1, "age": 30},
            {"id": 2, "age": null}
        ]));

        let (cleaned, report) = Cleaner::default().clean(dataset);

        assert_eq!(cleaned.row_count(), 1);
        assert_eq!(cleaned.row(0).unwrap(), vec![&json!(1), &json!(30)]);
        assert_eq!(cleaned.missing_count(), 0);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.missing_values_before, 1);
        assert_eq!(report.missing_values_after, 0);
    }

    #[test]
    fn test_fill_mode_scenario() {
        let dataset = records(json!([
            {"id": 1, "age": 30},
            {"id": 1, "age": 30},
            {"id": 2, "age": null}
        ]));

        let (cleaned, report) = Cleaner::new(fill_options()).clean(dataset);

        assert_eq!(cleaned.row_count(), 2);
        assert_eq!(cleaned.column("age").unwrap().values(), &[json!(30), json!(30)]);
        assert_eq!(report.values_filled, 1);
        assert_eq!(report.rows_dropped, 0);
    }

    #[test]
    fn test_fill_mode_uses_median_and_sentinel() {
        let dataset = records(json!([
            {"score": 1, "city": "Oslo", "flag": true},
            {"score": null, "city": null, "flag": null},
            {"score": 4, "city": "Rome", "flag": false},
            {"score": 10, "city": null, "flag": true},
            {"score": 2.5, "city": "Nice", "flag": true}
        ]));
        let original_median = median(dataset.column("score").unwrap().values()).unwrap();

        let (cleaned, report) = Cleaner::new(CleanOptions {
            missing_values: MissingValuePolicy::Fill,
            fill_text: "n/a".to_string(),
        })
        .clean(dataset);

        assert_eq!(cleaned.missing_count(), 0);
        assert_eq!(report.values_filled, 4);
        assert_eq!(original_median, 3.25);
        assert_eq!(cleaned.column("score").unwrap().values()[1].as_f64(), Some(3.25));
        assert_eq!(cleaned.column("city").unwrap().values()[3], json!("n/a"));
        assert_eq!(cleaned.column("flag").unwrap().values()[1], json!("n/a"));
    }

    #[test]
    fn test_fill_mode_all_missing_column_gets_sentinel() {
        let dataset = records(json!([{"a": null}, {"a": null}]));
        let (cleaned, _) = Cleaner::new(fill_options()).clean(dataset);
        assert_eq!(cleaned.column("a").unwrap().values(), &[json!("Unknown"), json!("Unknown")]);
    }

    #[test]
    fn test_empty_inputs_pass_through() {
        for policy in [MissingValuePolicy::Drop, MissingValuePolicy::Fill] {
            let cleaner = Cleaner::new(CleanOptions {
                missing_values: policy,
                ..Default::default()
            });

            let (cleaned, report) = cleaner.clean(Dataset::empty());
            assert_eq!(cleaned.row_count(), 0);
            assert_eq!(report, CleaningReport::default());

            let (cleaned, _) = cleaner.clean(Dataset::with_row_count(3));
            assert_eq!(cleaned.row_count(), 3);
            assert_eq!(cleaned.column_count(), 0);

            let headers_only =
                Dataset::from_rows(vec!["Id".to_string(), "Name".to_string()], vec![]).unwrap();
            let (cleaned, _) = cleaner.clean(headers_only);
            assert_eq!(cleaned.column_names(), vec!["id", "name"]);
            assert_eq!(cleaned.row_count(), 0);
        }
    }
}
