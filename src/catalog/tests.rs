use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

const SAMPLE_PO: &str = r#"msgid ""
msgstr ""
"Content-Type: text/plain; charset=UTF-8\n"

#: src/pages/home.tsx:12 src/pages/about.tsx:8
msgid "Hello"
msgstr "Привет"

#: src/pages/home.tsx:30
msgid "Welcome text"
msgstr ""
"Добро пожаловать\n"
"в приложение"

#: src/components/button.tsx:5
msgid "Hi"
msgstr "Привет"

#: src/components/empty.tsx:1
msgid "Untranslated"
msgstr ""
"#;

#[test]
fn test_parse_sample_catalog() {
    let map = parse_po(SAMPLE_PO);

    assert_eq!(
        map.get("Привет").unwrap(),
        &[
            "src/pages/home.tsx:12".to_string(),
            "src/pages/about.tsx:8".to_string(),
            "src/components/button.tsx:5".to_string(),
        ]
    );
    assert_eq!(
        map.get("Добро пожаловать\nв приложение").unwrap(),
        &["src/pages/home.tsx:30".to_string()]
    );
    // 空 msgstr 不产生条目
    assert!(map.get("").is_none());
}

#[test]
fn test_header_entry_has_no_locations() {
    let map = parse_po(SAMPLE_PO);
    let header = map.get("Content-Type: text/plain; charset=UTF-8\n").unwrap();
    assert!(header.is_empty());
}

#[test]
fn test_key_order_follows_file() {
    let map = parse_po(SAMPLE_PO);
    let keys: Vec<&str> = map.iter().map(|(text, _)| text).collect();
    assert_eq!(
        keys,
        vec![
            "Content-Type: text/plain; charset=UTF-8\n",
            "Привет",
            "Добро пожаловать\nв приложение",
        ]
    );
}

#[test]
fn test_duplicate_locations_are_kept() {
    let content = "#: a.ts:1\nmsgstr \"X\"\n\n#: a.ts:1\nmsgstr \"X\"\n";
    let map = parse_po(content);
    assert_eq!(map.get("X").unwrap(), &["a.ts:1".to_string(), "a.ts:1".to_string()]);
}

#[test]
fn test_other_line_ends_accumulation() {
    let content = "#: a.ts:1\nmsgstr \"First\"\n#, fuzzy\n\"ignored\"\n";
    let map = parse_po(content);
    assert_eq!(map.get("First").unwrap(), &["a.ts:1".to_string()]);
    assert!(map.get("Firstignored").is_none());
    assert_eq!(map.len(), 1);
}

#[test]
fn test_crlf_line_endings() {
    let content = "#: a.ts:1\r\nmsgid \"Hello\"\r\nmsgstr \"Hola\"\r\n";
    let map = parse_po(content);
    assert_eq!(map.get("Hola").unwrap(), &["a.ts:1".to_string()]);
}

#[test]
fn test_parse_is_idempotent() {
    assert_eq!(parse_po(SAMPLE_PO), parse_po(SAMPLE_PO));
}

#[test]
fn test_keys_with_location() {
    let map: TranslationsMap = vec![
        ("Привет", vec!["a.ts:1", "b.ts:2"]),
        ("Привет!", vec!["b.ts:2"]),
        ("Пока", vec!["c.ts:3"]),
    ]
    .into_iter()
    .collect();

    let keys: Vec<&str> = map.keys_with_location("b.ts:2").collect();
    assert_eq!(keys, vec!["Привет", "Привет!"]);
    assert_eq!(map.keys_with_location("z.ts:9").count(), 0);
}

#[test]
fn test_locations_skips_blank_entries() {
    let map: TranslationsMap = vec![("Hello", vec!["", "a.ts:1", "  "])].into_iter().collect();
    assert_eq!(map.locations("Hello"), vec!["a.ts:1"]);
    assert!(map.locations("Missing").is_empty());
}

#[tokio::test]
async fn test_catalog_read_is_cached() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(SAMPLE_PO.as_bytes()).unwrap();

    let catalog = TranslationCatalog::new(file.path().to_path_buf());
    let first = catalog.read().await.unwrap().clone();

    // 删除文件后再次读取仍然返回缓存
    let path = file.path().to_path_buf();
    drop(file);
    assert!(!path.exists());

    let second = catalog.read().await.unwrap();
    assert_eq!(&first, second);
}

#[tokio::test]
async fn test_catalog_read_missing_file() {
    let catalog = TranslationCatalog::new(PathBuf::from("does/not/exist.po"));
    let result = catalog.read().await;
    assert!(matches!(result, Err(UpdaterError::Catalog { .. })));
}
