use tablekit::{detect_format, CellValue, Databook, Dataset, ErrorKind, Options, Row};
use tempfile::tempdir;

fn typed() -> Dataset {
    Dataset::from_rows(
        Some(vec!["name", "age", "score", "member"]),
        vec![
            vec![
                CellValue::from("Alice"),
                CellValue::Int(30),
                CellValue::Float(9.25),
                CellValue::Bool(true),
            ],
            vec![
                CellValue::from("Bob"),
                CellValue::Int(-4),
                CellValue::Float(10.5),
                CellValue::Bool(false),
            ],
        ],
    )
    .unwrap()
}

/// What a typeless format gives back for `typed()`
fn as_text(ds: &Dataset) -> Vec<Row> {
    ds.rows()
        .iter()
        .map(|row| Row::new(row.iter().map(CellValue::as_str).collect()))
        .collect()
}

/// Save under an extension no codec claims so `open` has to sniff the content
fn reopen_detected(ds: &Dataset, format: &str) -> Dataset {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data.bin");
    ds.save(&path, format).unwrap();
    Dataset::open(&path).unwrap()
}

// ===== Typed Round Trips =====

#[test]
fn test_typed_formats_roundtrip() {
    for format in ["xlsx", "parquet", "df", "dbf", "json", "yaml"] {
        let payload = typed().export(format).unwrap();
        let loaded = Dataset::import(payload.as_bytes(), Some(format)).unwrap();

        assert_eq!(loaded.headers(), typed().headers(), "{format}");
        assert_eq!(loaded.rows(), typed().rows(), "{format}");
    }
}

#[test]
fn test_typed_formats_are_detected() {
    for format in ["xlsx", "parquet", "df", "dbf", "json", "yaml"] {
        let payload = typed().export(format).unwrap();
        assert_eq!(detect_format(payload.as_bytes()), Some(format));

        let loaded = reopen_detected(&typed(), format);
        assert_eq!(loaded.rows(), typed().rows(), "{format}");
    }
}

// ===== Text Round Trips =====

#[test]
fn test_csv_mentioning_table_tag_needs_a_name() {
    let raw = b"title,body\r\nx,<table> tag\r\n";
    assert_eq!(detect_format(raw), Some("html"));

    let ds = Dataset::import(raw, Some("csv")).unwrap();
    assert_eq!(ds.get(0, 1).unwrap(), &CellValue::from("<table> tag"));
}


#[test]
fn test_text_formats_roundtrip_as_strings() {
    for format in ["csv", "tsv", "html"] {
        let payload = typed().export(format).unwrap();
        assert!(!payload.is_binary());

        let loaded = Dataset::import(payload.as_bytes(), Some(format)).unwrap();
        assert_eq!(loaded.headers(), typed().headers(), "{format}");
        assert_eq!(loaded.rows(), as_text(&typed()).as_slice(), "{format}");
    }
}

#[test]
fn test_text_formats_are_detected() {
    for format in ["csv", "tsv", "html"] {
        let loaded = reopen_detected(&typed(), format);
        assert_eq!(loaded.rows(), as_text(&typed()).as_slice(), "{format}");
    }
}

#[test]
fn test_csv_infer_types_option() {
    let payload = typed().export("csv").unwrap();
    let mut loaded = Dataset::new();
    loaded
        .load_with(
            payload.as_bytes(),
            Some("csv"),
            &Options::new().with("infer_types", true),
        )
        .unwrap();
    assert_eq!(loaded.rows(), typed().rows());
}

#[test]
fn test_csv_custom_delimiter() {
    let options = Options::new().with("delimiter", ";");
    let payload = typed().export_with("csv", &options).unwrap();
    assert!(payload.as_text().unwrap().starts_with("name;age;score;member"));

    let mut loaded = Dataset::new();
    loaded.load_with(payload.as_bytes(), Some("csv"), &options).unwrap();
    assert_eq!(loaded.width(), 4);
}

#[test]
fn test_formatters_apply_to_csv_export() {
    let mut ds = Dataset::with_headers(vec!["id", "name"]);
    ds.append(vec![CellValue::Int(1), CellValue::from("alice")]).unwrap();
    ds.append(vec![CellValue::Int(2), CellValue::from("bob")]).unwrap();
    ds.add_formatter("name", |cell| CellValue::String(cell.as_str().to_uppercase()))
        .unwrap();

    let payload = ds.export("csv").unwrap();
    assert_eq!(payload.as_text(), Some("id,name\r\n1,ALICE\r\n2,BOB\r\n"));
    assert_eq!(ds.get(0, 1).unwrap(), &CellValue::from("alice"));
}

#[test]
fn test_formatters_apply_to_book_export() {
    let mut sheet = typed().with_title("people");
    sheet.add_formatter("age", |_| CellValue::Null).unwrap();
    let book = Databook::from_sheets(vec![sheet, typed().with_title("raw")]);

    let payload = book.export("json").unwrap();
    let loaded = Databook::import(payload.as_bytes(), Some("json")).unwrap();
    assert_eq!(loaded.sheet("people").unwrap().column("age").unwrap(), vec![CellValue::Null; 2]);
    assert_eq!(loaded.sheet("raw").unwrap().rows(), typed().rows());
}

// ===== Export-only Formats =====

#[test]
fn test_export_only_formats() {
    let ds = typed().with_title("People");

    let jira = ds.export("jira").unwrap();
    assert!(jira.as_text().unwrap().starts_with("||name||age||score||member||"));

    let latex = ds.export("latex").unwrap();
    assert!(latex.as_text().unwrap().contains("\\caption{People}"));

    let rst = ds.export("rst").unwrap();
    assert!(rst.as_text().unwrap().starts_with("===== ==="));

    for format in ["jira", "latex", "rst"] {
        let err = Dataset::import(b"anything", Some(format)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capability, "{format}");
    }
}

// ===== Books =====

#[test]
fn test_book_formats_roundtrip() {
    let book = Databook::from_sheets(vec![
        typed().with_title("first"),
        typed().with_title("second"),
    ]);

    for format in ["xlsx", "json", "yaml"] {
        let payload = book.export(format).unwrap();
        let loaded = Databook::import(payload.as_bytes(), None).unwrap();

        assert_eq!(loaded.titles(), vec![Some("first"), Some("second")], "{format}");
        assert_eq!(loaded.sheet("second").unwrap().rows(), typed().rows(), "{format}");
    }
}

#[test]
fn test_single_table_is_not_a_book() {
    let err = Databook::import(br#"[{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#, Some("json"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Import);

    let err = Databook::import(b"- id: 1\n  name: a\n", Some("yaml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Import);
}

#[test]
fn test_book_export_only_formats() {
    let book = Databook::from_sheets(vec![
        typed().with_title("first"),
        typed().with_title("second"),
    ]);

    let html = book.export("html").unwrap();
    let html = html.as_text().unwrap();
    assert_eq!(html.matches("<table>").count(), 2);
    assert!(html.contains("<h3>first</h3>"));

    let rst = book.export("rst").unwrap();
    assert_eq!(rst.as_text().unwrap().matches("\n\n").count(), 1);
}

#[test]
fn test_book_rejected_by_single_sheet_formats() {
    let book = Databook::from_sheets(vec![typed(), typed()]);
    for format in ["csv", "tsv", "parquet", "df", "dbf", "jira", "latex"] {
        let err = book.export(format).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Capability, "{format}");
    }
}

#[test]
fn test_ods_is_import_only() {
    let err = typed().export("ods").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Capability);

    let err = Dataset::import(b"PK\x03\x04 not really a zip", Some("ods")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Import);
}
