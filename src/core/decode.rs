//! 各格式解碼器。全部都是 `bytes -> Dataset` 的純函式，
//! 以副檔名查表分派，新增格式只需在 `FORMATS` 加一筆。

use crate::domain::model::Dataset;
use crate::utils::error::{EtlError, Result};
use calamine::{Data, Reader, Xls, Xlsx};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

pub type Decoder = fn(&[u8], &str) -> Result<Dataset>;

pub struct Format {
    pub extension: &'static str,
    pub label: &'static str,
    pub decode: Decoder,
}

pub const FORMATS: &[Format] = &[
    Format {
        extension: "csv",
        label: "CSV",
        decode: decode_csv,
    },
    Format {
        extension: "xlsx",
        label: "Excel",
        decode: decode_xlsx,
    },
    Format {
        extension: "xls",
        label: "Excel (legacy)",
        decode: decode_xls,
    },
    Format {
        extension: "json",
        label: "JSON",
        decode: decode_json,
    },
];

/// 檔名最後一個 `.` 之後的部分，大小寫敏感
pub fn extension(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .rsplit_once('.')
        .map(|(_, ext)| ext)
}

pub fn format_for(path: &Path) -> Option<&'static Format> {
    let ext = extension(path)?;
    FORMATS.iter().find(|f| f.extension == ext)
}

/// 常見的缺值字串 (NA, NaN, null …)
const NA_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

pub fn parse_cell(raw: &str) -> Value {
    if NA_VALUES.contains(&raw) {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    match raw {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn header_name(index: usize, raw: &str) -> String {
    if raw.trim().is_empty() {
        format!("Unnamed: {}", index)
    } else {
        raw.to_string()
    }
}

pub fn decode_csv(bytes: &[u8], location: &str) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let names: Vec<String> = reader
        .headers()
        .map_err(|e| EtlError::decode(location, e))?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(i, h))
        .collect();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EtlError::decode(location, e))?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Dataset::from_rows(names, rows)
}

pub fn decode_xlsx(bytes: &[u8], location: &str) -> Result<Dataset> {
    decode_workbook::<Xlsx<Cursor<Vec<u8>>>>(bytes, location)
}

pub fn decode_xls(bytes: &[u8], location: &str) -> Result<Dataset> {
    decode_workbook::<Xls<Cursor<Vec<u8>>>>(bytes, location)
}

/// 只讀第一張工作表，第一列為欄名
fn decode_workbook<R>(bytes: &[u8], location: &str) -> Result<Dataset>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: std::fmt::Display,
{
    let mut workbook =
        R::new(Cursor::new(bytes.to_vec())).map_err(|e| EtlError::decode(location, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| EtlError::decode(location, "workbook has no worksheets"))?
        .map_err(|e| EtlError::decode(location, e))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Dataset::empty());
    };

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::Empty => header_name(i, ""),
            other => header_name(i, &other.to_string()),
        })
        .collect();
    let rows: Vec<Vec<Value>> = rows.map(|row| row.iter().map(cell_value).collect()).collect();

    Dataset::from_rows(names, rows)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::Int(i) => Value::from(*i),
        // xlsx 的數字一律存成浮點，整數值還原成整數
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(*f as i64),
        Data::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if NA_VALUES.contains(&s.as_str()) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

pub fn decode_json(bytes: &[u8], location: &str) -> Result<Dataset> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| EtlError::decode(location, e))?;
    records_to_dataset(value, location)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// JSON 物件陣列轉成資料集。欄位順序依鍵第一次出現的順序，缺的鍵補 null
pub fn records_to_dataset(value: Value, location: &str) -> Result<Dataset> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(EtlError::decode(
                location,
                format!("expected a JSON array of objects, found {}", kind(&other)),
            ));
        }
    };

    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut objects: Vec<Map<String, Value>> = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        let map = match item {
            Value::Object(map) => map,
            other => {
                return Err(EtlError::decode(
                    location,
                    format!("element {} is {}, expected an object", index, kind(&other)),
                ));
            }
        };
        for key in map.keys() {
            if seen.insert(key.clone()) {
                names.push(key.clone());
            }
        }
        objects.push(map);
    }

    if names.is_empty() {
        return Ok(Dataset::with_row_count(objects.len()));
    }

    let rows: Vec<Vec<Value>> = objects
        .into_iter()
        .map(|mut map| {
            names
                .iter()
                .map(|name| map.remove(name).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Dataset::from_rows(names, rows)
}
