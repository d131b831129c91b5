use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use figma_texts_updater::matcher::TranslationChunk;
use figma_texts_updater::{
    DiffPair, DocumentNode, DocumentSource, FuzzyMatcher, LoadedConfig, MatchError, RewriteStatus,
    RunOptions, RunReport, TranslationCatalog, UpdaterError, UpdaterWorkflow, VersionInfo,
};

const FIGMA_URL: &str = "https://www.figma.com/design/AbC123/Landing";

/// 内存中的设计稿
#[derive(Debug, Default)]
struct MemorySource {
    documents: HashMap<String, DocumentNode>,
    versions: Option<Vec<VersionInfo>>,
}

impl MemorySource {
    fn with_documents(old: DocumentNode, new: DocumentNode) -> Self {
        let mut documents = HashMap::new();
        documents.insert("old".to_string(), old);
        documents.insert("new".to_string(), new);
        Self {
            documents,
            versions: None,
        }
    }
}

#[async_trait]
impl DocumentSource for MemorySource {
    async fn get_document(&self, _snapshot_url: &str, version_id: &str) -> Result<DocumentNode, UpdaterError> {
        self.documents
            .get(version_id)
            .cloned()
            .ok_or_else(|| UpdaterError::Upstream {
                status: 404,
                message: format!("unknown version {}", version_id),
            })
    }

    async fn get_versions(&self, _snapshot_url: &str) -> Result<Option<Vec<VersionInfo>>, UpdaterError> {
        Ok(self.versions.clone())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Paths(Vec<String>),
    Fail,
}

/// 按旧文本返回预设结果，并记录每次调用
#[derive(Debug, Clone, Default)]
struct StubMatcher {
    replies: HashMap<String, Reply>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubMatcher {
    fn reply(mut self, old_text: &str, reply: Reply) -> Self {
        self.replies.insert(old_text.to_string(), reply);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FuzzyMatcher for StubMatcher {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn find_code_paths(&self, old_text: &str, _chunk: &TranslationChunk<'_>) -> Result<Vec<String>, MatchError> {
        self.calls.lock().unwrap().push(old_text.to_string());

        match self.replies.get(old_text) {
            Some(Reply::Paths(paths)) => Ok(paths.clone()),
            Some(Reply::Fail) => Err(MatchError::Status {
                status: 500,
                body: "internal error".to_string(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

fn page(texts: &[(&str, &str)]) -> DocumentNode {
    let children = texts.iter().map(|(id, text)| DocumentNode::text(*id, *text)).collect();
    DocumentNode::container("0:0", "DOCUMENT", vec![DocumentNode::container("0:1", "CANVAS", children)])
}

fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn read_file(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative)).unwrap()
}

fn workflow(root: &Path, source: MemorySource, matcher: StubMatcher) -> UpdaterWorkflow {
    let config = LoadedConfig::with_root(root.to_path_buf());
    let catalog = TranslationCatalog::new(config.catalog_path());
    UpdaterWorkflow::with_components(config, Box::new(source), catalog, Box::new(matcher))
}

fn run_options(list_only: bool) -> RunOptions {
    RunOptions {
        figma_url: FIGMA_URL.to_string(),
        old_version: Some("old".to_string()),
        new_version: Some("new".to_string()),
        list_only,
    }
}

fn outcomes(report: RunReport) -> Vec<figma_texts_updater::RewriteOutcome> {
    match report {
        RunReport::Applied { outcomes, .. } => outcomes,
        other => panic!("unexpected report: {:?}", other),
    }
}

const CATALOG: &str = r#"msgid ""
msgstr ""

#: src/pages/home.tsx:12
msgid "greeting"
msgstr "Hello"

#: src/pages/home.tsx:20
msgid "farewell"
msgstr "Goodbye"

#: src/pages/about.tsx:3
msgid "title"
msgstr "О компании"
"#;

#[tokio::test]
async fn test_single_text_change_produces_one_pair() {
    let dir = TempDir::new().unwrap();
    let source = MemorySource::with_documents(
        page(&[("1:1", "Hello"), ("1:2", "Unchanged")]),
        page(&[("1:1", "Hi"), ("1:2", "Unchanged")]),
    );
    let workflow = workflow(dir.path(), source, StubMatcher::default());

    let diffs = workflow.build_diffs(FIGMA_URL, "old", "new").await.unwrap();
    assert_eq!(diffs, vec![DiffPair::new("Hello", "Hi")]);
}

#[tokio::test]
async fn test_catalog_hit_rewrites_without_matcher() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/locales/ru.po", CATALOG);
    write_file(dir.path(), "src/pages/home.tsx", "<h1>{t('Hello')}</h1>\n<p>Hello</p>\n");

    let matcher = StubMatcher::default();
    let source = MemorySource::with_documents(page(&[("1:1", "Hello")]), page(&[("1:1", "Hi")]));
    let workflow = workflow(dir.path(), source, matcher.clone());

    let outcomes = outcomes(workflow.run(&run_options(false)).await.unwrap());

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].applied());
    assert_eq!(outcomes[0].location(), Some("src/pages/home.tsx:12"));
    assert_eq!(
        read_file(dir.path(), "src/pages/home.tsx"),
        "<h1>{t('Hi')}</h1>\n<p>Hello</p>\n"
    );
    assert!(matcher.calls().is_empty());
}

#[tokio::test]
async fn test_matcher_without_suggestions_skips_pair() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/locales/ru.po", CATALOG);
    write_file(dir.path(), "src/pages/home.tsx", "Hello Goodbye");

    let matcher = StubMatcher::default();
    let source = MemorySource::with_documents(page(&[("1:1", "Original")]), page(&[("1:1", "Updated")]));
    let workflow = workflow(dir.path(), source, matcher.clone());

    let outcomes = outcomes(workflow.run(&run_options(false)).await.unwrap());

    assert!(!outcomes[0].applied());
    assert!(outcomes[0].attempted_variants().is_empty());
    assert_eq!(matcher.calls(), vec!["Original".to_string()]);
    assert_eq!(read_file(dir.path(), "src/pages/home.tsx"), "Hello Goodbye");
}

#[tokio::test]
async fn test_matcher_location_without_catalog_key_uses_old_text() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/locales/ru.po", CATALOG);
    write_file(dir.path(), "src/widgets/banner.tsx", "const text = 'Sale today';");

    let matcher = StubMatcher::default().reply(
        "Sale today",
        Reply::Paths(vec!["src/widgets/banner.tsx:7".to_string()]),
    );
    let source = MemorySource::with_documents(page(&[("1:1", "Sale today")]), page(&[("1:1", "Sale tomorrow")]));
    let workflow = workflow(dir.path(), source, matcher);

    let outcomes = outcomes(workflow.run(&run_options(false)).await.unwrap());

    match &outcomes[0].status {
        RewriteStatus::Applied { location, search_text, .. } => {
            assert_eq!(location, "src/widgets/banner.tsx:7");
            assert_eq!(search_text, "Sale today");
        }
        other => panic!("unexpected status: {:?}", other),
    }
    assert_eq!(
        read_file(dir.path(), "src/widgets/banner.tsx"),
        "const text = 'Sale tomorrow';"
    );
}

#[tokio::test]
async fn test_fuzzy_match_replaces_catalog_variant() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/locales/ru.po", CATALOG);
    write_file(dir.path(), "src/pages/home.tsx", "t('Goodbye')");

    let matcher = StubMatcher::default().reply(
        "Goodbye!",
        Reply::Paths(vec!["src/pages/home.tsx:20".to_string()]),
    );
    let source = MemorySource::with_documents(page(&[("1:1", "Goodbye!")]), page(&[("1:1", "See you")]));
    let workflow = workflow(dir.path(), source, matcher);

    let outcomes = outcomes(workflow.run(&run_options(false)).await.unwrap());

    assert!(outcomes[0].applied());
    assert_eq!(read_file(dir.path(), "src/pages/home.tsx"), "t('See you')");
}

#[tokio::test]
async fn test_pairs_on_same_file_apply_cumulatively() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/locales/ru.po", CATALOG);
    write_file(dir.path(), "src/pages/home.tsx", "t('Hello'); t('Goodbye');");

    let source = MemorySource::with_documents(
        page(&[("1:1", "Hello"), ("1:2", "Goodbye")]),
        page(&[("1:1", "Hi"), ("1:2", "Bye")]),
    );
    let workflow = workflow(dir.path(), source, StubMatcher::default());

    let outcomes = outcomes(workflow.run(&run_options(false)).await.unwrap());

    assert!(outcomes.iter().all(|o| o.applied()));
    assert_eq!(read_file(dir.path(), "src/pages/home.tsx"), "t('Hi'); t('Bye');");
}

#[tokio::test]
async fn test_matcher_failure_only_affects_its_pair() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/locales/ru.po", CATALOG);
    write_file(dir.path(), "src/pages/home.tsx", "t('Hello');");

    let matcher = StubMatcher::default().reply("Broken", Reply::Fail);
    let source = MemorySource::with_documents(
        page(&[("1:1", "Broken"), ("1:2", "Hello")]),
        page(&[("1:1", "Fixed"), ("1:2", "Hi")]),
    );
    let workflow = workflow(dir.path(), source, matcher.clone());

    let outcomes = outcomes(workflow.run(&run_options(false)).await.unwrap());

    assert_eq!(outcomes.len(), 2);
    assert!(matches!(outcomes[0].status, RewriteStatus::NoCandidates { .. }));
    assert!(outcomes[1].applied());
    assert_eq!(matcher.calls(), vec!["Broken".to_string()]);
    assert_eq!(read_file(dir.path(), "src/pages/home.tsx"), "t('Hi');");
}

#[tokio::test]
async fn test_list_only_leaves_files_untouched() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "src/locales/ru.po", CATALOG);
    write_file(dir.path(), "src/pages/home.tsx", "t('Hello');");

    let source = MemorySource::with_documents(page(&[("1:1", "Hello")]), page(&[("1:1", "Hi")]));
    let workflow = workflow(dir.path(), source, StubMatcher::default());

    let report = workflow.run(&run_options(true)).await.unwrap();

    assert_eq!(report, RunReport::Preview(vec![DiffPair::new("Hello", "Hi")]));
    assert_eq!(read_file(dir.path(), "src/pages/home.tsx"), "t('Hello');");
}

#[tokio::test]
async fn test_no_changes_between_versions() {
    let dir = TempDir::new().unwrap();
    let source = MemorySource::with_documents(page(&[("1:1", "Hello")]), page(&[("1:1", "  Hello ")]));
    let workflow = workflow(dir.path(), source, StubMatcher::default());

    let report = workflow.run(&run_options(false)).await.unwrap();
    assert_eq!(report, RunReport::NoChanges);
}

#[tokio::test]
async fn test_missing_version_lists_newest_first() {
    let dir = TempDir::new().unwrap();
    let version = |id: &str, day: u32| VersionInfo {
        id: id.to_string(),
        label: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap(),
        author: "designer".to_string(),
    };
    let source = MemorySource {
        documents: HashMap::new(),
        versions: Some(vec![version("a", 1), version("c", 3), version("b", 2)]),
    };
    let workflow = workflow(dir.path(), source, StubMatcher::default());

    let options = RunOptions {
        figma_url: FIGMA_URL.to_string(),
        ..Default::default()
    };

    match workflow.run(&options).await.unwrap() {
        RunReport::Versions(versions) => {
            let ids: Vec<&str> = versions.iter().map(|v| v.id.as_str()).collect();
            assert_eq!(ids, vec!["c", "b", "a"]);
        }
        other => panic!("unexpected report: {:?}", other),
    }
}

#[tokio::test]
async fn test_no_versions_is_an_error() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow(dir.path(), MemorySource::default(), StubMatcher::default());

    let options = RunOptions {
        figma_url: FIGMA_URL.to_string(),
        old_version: Some("old".to_string()),
        ..Default::default()
    };

    let result = workflow.run(&options).await;
    assert!(matches!(result, Err(UpdaterError::MissingVersions)));
}

#[tokio::test]
async fn test_missing_catalog_aborts_rewrite() {
    let dir = TempDir::new().unwrap();
    let source = MemorySource::with_documents(page(&[("1:1", "Hello")]), page(&[("1:1", "Hi")]));
    let workflow = workflow(dir.path(), source, StubMatcher::default());

    let result = workflow.run(&run_options(false)).await;
    assert!(matches!(result, Err(UpdaterError::Catalog { .. })));
}

#[tokio::test]
async fn test_snapshot_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let workflow = workflow(dir.path(), MemorySource::default(), StubMatcher::default());

    let result = workflow.run(&run_options(false)).await;
    assert!(matches!(result, Err(UpdaterError::Upstream { status: 404, .. })));
}
