use serde_json::json;
use std::io::{Cursor, Write};
use tab_ingest::core::decode::decode_xlsx;
use tab_ingest::{Cleaner, CleanOptions, LocalStorage, SourceResolver};
use tempfile::TempDir;
use zip::write::{FileOptions, ZipWriter};

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="People" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

// 第三列的 Age 留空，第四列 ID 重複
const SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
<sheetData>
<row r="1">
<c r="A1" t="inlineStr"><is><t>ID</t></is></c>
<c r="B1" t="inlineStr"><is><t>Full Name</t></is></c>
<c r="C1" t="inlineStr"><is><t>Age</t></is></c>
</row>
<row r="2">
<c r="A2"><v>1</v></c>
<c r="B2" t="inlineStr"><is><t>Ann</t></is></c>
<c r="C2"><v>30</v></c>
</row>
<row r="3">
<c r="A3"><v>2</v></c>
<c r="B3" t="inlineStr"><is><t>Bo</t></is></c>
</row>
<row r="4">
<c r="A4"><v>1</v></c>
<c r="B4" t="inlineStr"><is><t>Ann again</t></is></c>
<c r="C4"><v>31.5</v></c>
</row>
</sheetData>
</worksheet>"#;

fn build_workbook() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("xl/workbook.xml", WORKBOOK),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
        ("xl/worksheets/sheet1.xml", SHEET),
    ];
    for (name, content) in parts {
        zip.start_file::<_, ()>(name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

#[test]
fn test_decode_first_sheet() {
    let dataset = decode_xlsx(&build_workbook(), "people.xlsx").unwrap();

    assert_eq!(dataset.column_names(), vec!["ID", "Full Name", "Age"]);
    assert_eq!(dataset.row_count(), 3);
    assert_eq!(dataset.column("ID").unwrap().values(), &[json!(1), json!(2), json!(1)]);
    assert_eq!(
        dataset.column("Age").unwrap().values(),
        &[json!(30), serde_json::Value::Null, json!(31.5)]
    );
}

#[test]
fn test_corrupt_workbook_is_decode_error() {
    let result = decode_xlsx(b"not a zip archive", "broken.xlsx");
    assert!(matches!(
        result,
        Err(tab_ingest::EtlError::Decode { .. })
    ));
}

#[tokio::test]
async fn test_resolve_and_clean_workbook_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("people.xlsx");
    std::fs::write(&path, build_workbook()).unwrap();

    let resolver = SourceResolver::new(LocalStorage::default());
    let dataset = resolver.resolve(path.to_str().unwrap()).await.unwrap();
    assert_eq!(dataset.row_count(), 3);

    let (cleaned, report) = Cleaner::new(CleanOptions::default()).clean(dataset);
    assert_eq!(cleaned.column_names(), vec!["id", "full_name", "age"]);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.rows_dropped, 1);
    assert_eq!(cleaned.row_count(), 1);
    assert_eq!(
        cleaned.row(0).unwrap(),
        vec![&json!(1), &json!("Ann"), &json!(30)]
    );
}
