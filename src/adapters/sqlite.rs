use crate::domain::model::{Column, ColumnType, Dataset};
use crate::utils::error::{EtlError, Result};
use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;
use serde_json::Value;
use std::path::PathBuf;

/// 接受純路徑或 `sqlite:///path` 形式的連線字串
pub fn database_path(target: &str) -> PathBuf {
    let path = target
        .strip_prefix("sqlite:///")
        .or_else(|| target.strip_prefix("sqlite://"))
        .unwrap_or(target);
    if path.is_empty() {
        PathBuf::from(":memory:")
    } else {
        PathBuf::from(path)
    }
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQLite 欄位親和型別
pub fn column_affinity(column: &Column) -> &'static str {
    let present: Vec<&Value> = column.values().iter().filter(|v| !v.is_null()).collect();
    match column.column_type() {
        ColumnType::Numeric if present.iter().all(|v| v.is_i64()) => "INTEGER",
        ColumnType::Numeric => "REAL",
        ColumnType::Other if !present.is_empty() && present.iter().all(|v| v.is_boolean()) => {
            "INTEGER"
        }
        _ => "TEXT",
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        nested => SqlValue::Text(nested.to_string()),
    }
}

/// 以 drop-and-recreate 方式整表取代，單一交易內完成。
/// 回傳寫入的列數
pub fn write_table(target: &str, table: &str, dataset: &Dataset) -> Result<usize> {
    let fail = |e: rusqlite::Error| EtlError::persistence(target, table, e);
    let path = database_path(target);

    let mut conn = Connection::open(&path).map_err(fail)?;
    let tx = conn.transaction().map_err(fail)?;

    tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_identifier(table)), [])
        .map_err(fail)?;

    if dataset.column_count() == 0 {
        // SQLite 不允許零欄位的資料表
        tracing::warn!(
            "Dataset has no columns; table '{}' was dropped and not recreated",
            table
        );
        tx.commit().map_err(fail)?;
        return Ok(0);
    }

    let definitions: Vec<String> = dataset
        .columns()
        .iter()
        .map(|c| format!("{} {}", quote_identifier(c.name()), column_affinity(c)))
        .collect();
    let create_sql = format!(
        "CREATE TABLE {} ({})",
        quote_identifier(table),
        definitions.join(", ")
    );
    tracing::debug!("{}", create_sql);
    tx.execute(&create_sql, []).map_err(fail)?;

    let column_list: Vec<String> = dataset
        .columns()
        .iter()
        .map(|c| quote_identifier(c.name()))
        .collect();
    let placeholders = vec!["?"; dataset.column_count()].join(", ");
    let insert_sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_identifier(table),
        column_list.join(", "),
        placeholders
    );

    let mut written = 0;
    {
        let mut stmt = tx.prepare(&insert_sql).map_err(fail)?;
        for row in dataset.rows() {
            stmt.execute(rusqlite::params_from_iter(row.into_iter().map(to_sql_value)))
                .map_err(fail)?;
            written += 1;
        }
    }

    tx.commit().map_err(fail)?;
    Ok(written)
}
