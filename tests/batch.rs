//! Integration tests for batch conversion over stores.
//!
//! Run with:
//!   cargo test --test batch -- --nocapture

mod common;

use edgequake_doc2md::{
    convert_iter, convert_store, convert_store_with_egress, replace_extension_with_md,
    Aggregator, BatchOptions, BatchProgressCallback, ByteStore, ConverterError,
    ConverterRegistry, DirStore, Doc2MdError, EntrySeparator, FailurePolicy, Resolution,
    TextStore,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn source(entries: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
        .collect()
}

fn run(
    source: &BTreeMap<String, Vec<u8>>,
    options: &BatchOptions,
    registry: &ConverterRegistry,
) -> (BTreeMap<String, String>, Result<edgequake_doc2md::BatchReport, Doc2MdError>) {
    common::init_tracing();
    let mut target = BTreeMap::new();
    let result = convert_store(source, &mut target, options, registry);
    (target, result)
}

/// A registry whose `bad` format always fails.
fn registry_with_failing_format() -> ConverterRegistry {
    ConverterRegistry::default().with("bad", |_: &[u8]| {
        Err(ConverterError::Malformed("corrupt header".into()))
    })
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
}

impl RecordingCallback {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl BatchProgressCallback for RecordingCallback {
    fn on_batch_start(&self, expected_entries: Option<usize>) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {expected_entries:?}"));
    }

    fn on_entry_start(&self, key: &str) {
        self.events.lock().unwrap().push(format!("begin {key}"));
    }

    fn on_entry_complete(&self, key: &str, _markdown_len: usize) {
        self.events.lock().unwrap().push(format!("done {key}"));
    }

    fn on_entry_error(&self, key: &str, _error: &str) {
        self.events.lock().unwrap().push(format!("error {key}"));
    }

    fn on_batch_complete(&self, converted: usize, failed: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("end {converted}/{failed}"));
    }
}

// ── Store conversion ─────────────────────────────────────────────────────────

#[test]
fn test_mixed_store_converts_every_entry() {
    let src = source(&[
        ("a.txt", "alpha"),
        ("b.unknown", "bravo"),
        ("c.html", "<p>charlie</p>"),
    ]);
    let (target, result) = run(&src, &BatchOptions::default(), &ConverterRegistry::default());
    let report = result.unwrap();

    assert_eq!(
        target.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["a.txt.md", "b.unknown.md", "c.html.md"]
    );
    assert_eq!(target["a.txt.md"], "alpha\n");
    assert_eq!(target["b.unknown.md"], "bravo\n");
    assert_eq!(target["c.html.md"], "charlie\n");

    assert!(report.is_complete());
    assert_eq!(report.stats.total_entries, 3);
    assert_eq!(report.stats.converted_entries, 3);
    assert_eq!(report.stats.fallback_entries, 1);
    assert_eq!(report.stats.total_input_bytes, 5 + 5 + 14);

    let b = &report.converted[1];
    assert_eq!(b.key, "b.unknown");
    assert_eq!(b.resolution, Resolution::Fallback);
    assert_eq!(b.format.as_deref(), Some("unknown"));
}

#[test]
fn test_office_documents_in_one_batch() {
    let src: BTreeMap<String, Vec<u8>> = [
        ("docs/report.docx", common::docx()),
        ("docs/budget.xlsx", common::xlsx()),
        ("docs/deck.pptx", common::pptx()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    let options = BatchOptions::builder()
        .key_transform(replace_extension_with_md)
        .build()
        .unwrap();
    let (target, result) = run(&src, &options, &ConverterRegistry::default());

    assert!(result.unwrap().is_complete());
    assert!(target["docs/report.md"].contains("# Quarterly Report"));
    assert!(target["docs/budget.md"].contains("| Laptop | 1200 |"));
    assert!(target["docs/deck.md"].contains("## Slide 2"));
}

#[test]
fn test_overrides_apply_only_to_their_formats() {
    let src = source(&[("a.txt", "alpha"), ("c.html", "<p>charlie</p>")]);
    let registry = ConverterRegistry::default();
    let options = BatchOptions::builder()
        .overrides(
            ConverterRegistry::empty()
                .with("txt", |b: &[u8]| Ok(String::from_utf8_lossy(b).to_uppercase())),
        )
        .build()
        .unwrap();

    let (target, result) = run(&src, &options, &registry);
    result.unwrap();
    assert_eq!(target["a.txt.md"], "ALPHA\n");
    assert_eq!(target["c.html.md"], "charlie\n");

    // The caller's registry still has the built-in txt converter.
    assert_eq!(registry.get("txt").unwrap()(b"alpha").unwrap(), "alpha");
    let (plain, _) = run(&src, &BatchOptions::default(), &registry);
    assert_eq!(plain["a.txt.md"], "alpha\n");
}

#[test]
fn test_fail_fast_stops_at_first_failure() {
    let src = source(&[
        ("1.txt", "one"),
        ("2.bad", "??"),
        ("3.txt", "three"),
    ]);
    let options = BatchOptions::builder()
        .failure_policy(FailurePolicy::FailFast)
        .build()
        .unwrap();
    let (target, result) = run(&src, &options, &registry_with_failing_format());

    match result.unwrap_err() {
        Doc2MdError::EntryFailed { key, source } => {
            assert_eq!(key, "2.bad");
            assert_eq!(source.format.as_deref(), Some("bad"));
            assert!(source.message.contains("corrupt header"));
        }
        other => panic!("expected EntryFailed, got {other:?}"),
    }
    assert_eq!(target.keys().collect::<Vec<_>>(), vec!["1.txt.md"]);
}

#[test]
fn test_collect_and_continue_records_failures() {
    let src = source(&[
        ("1.txt", "one"),
        ("2.bad", "??"),
        ("3.txt", "three"),
    ]);
    let options = BatchOptions::builder()
        .failure_policy(FailurePolicy::CollectAndContinue)
        .build()
        .unwrap();
    let (target, result) = run(&src, &options, &registry_with_failing_format());
    let report = result.unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.stats.converted_entries, 2);
    assert_eq!(report.stats.failed_entries, 1);
    assert_eq!(report.failures[0].key, "2.bad");
    assert_eq!(target.len(), 2);
    assert!(!target.contains_key("2.bad.md"));
}

#[test]
fn test_egress_sees_populated_target() {
    let src = source(&[("a.txt", "alpha"), ("b.txt", "bravo")]);
    let mut target: HashMap<String, String> = HashMap::new();

    let (seen, report) = convert_store_with_egress(
        &src,
        &mut target,
        &BatchOptions::default(),
        &ConverterRegistry::default(),
        |t| {
            let mut keys: Vec<String> = t.entries().into_iter().map(|(k, _)| k).collect();
            keys.sort();
            keys
        },
    )
    .unwrap();

    assert_eq!(seen, vec!["a.txt.md", "b.txt.md"]);
    assert_eq!(report.stats.converted_entries, 2);
    assert_eq!(target.len(), 2);
}

#[test]
fn test_egress_not_run_when_batch_fails() {
    let src = source(&[("x.bad", "??")]);
    let options = BatchOptions::builder()
        .failure_policy(FailurePolicy::FailFast)
        .build()
        .unwrap();
    let mut target: Vec<(String, String)> = Vec::new();
    let mut ran = false;

    let result = convert_store_with_egress(
        &src,
        &mut target,
        &options,
        &registry_with_failing_format(),
        |_| ran = true,
    );
    assert!(result.is_err());
    assert!(!ran);
}

#[test]
fn test_aggregated_egress() {
    let src = source(&[
        ("a.txt", "Intro\nShared footer\nCopyright ACME"),
        ("b.txt", "Body\nShared footer\nCopyright ACME"),
    ]);
    let aggregator = Aggregator::builder()
        .headers(true)
        .separator(EntrySeparator::HorizontalRule)
        .min_duplicated_lines(2)
        .build()
        .unwrap();
    let mut target: BTreeMap<String, String> = BTreeMap::new();

    let (combined, _) = convert_store_with_egress(
        &src,
        &mut target,
        &BatchOptions::default(),
        &ConverterRegistry::default(),
        |t| aggregator.aggregate(t),
    )
    .unwrap();

    assert_eq!(
        combined,
        "## a.txt.md\n\nIntro\nShared footer\nCopyright ACME\n\n---\n\n## b.txt.md\n\nBody\n"
    );
}

#[test]
fn test_progress_callback_events() {
    let src = source(&[("1.txt", "one"), ("2.bad", "??")]);
    let callback = Arc::new(RecordingCallback::default());
    let options = BatchOptions::builder()
        .progress_callback(callback.clone())
        .build()
        .unwrap();
    let (_, result) = run(&src, &options, &registry_with_failing_format());
    result.unwrap();

    assert_eq!(
        callback.events(),
        vec![
            "start Some(2)",
            "begin 1.txt",
            "done 1.txt",
            "begin 2.bad",
            "error 2.bad",
            "end 1/1",
        ]
    );
}

#[test]
fn test_key_collision_later_entry_wins() {
    let src = source(&[("notes.md", "from md"), ("notes.txt", "from txt")]);
    let options = BatchOptions::builder()
        .key_transform(replace_extension_with_md)
        .build()
        .unwrap();
    let (target, result) = run(&src, &options, &ConverterRegistry::default());

    assert_eq!(result.unwrap().stats.converted_entries, 2);
    assert_eq!(target.len(), 1);
    assert_eq!(target["notes.md"], "from txt\n");
}

// ── Directory stores ─────────────────────────────────────────────────────────

#[test]
fn test_dir_store_round_trip() {
    common::init_tracing();
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    std::fs::create_dir_all(input.path().join("sub")).unwrap();
    std::fs::write(input.path().join("readme.txt"), "Top level").unwrap();
    std::fs::write(input.path().join("sub/page.html"), "<p>Nested</p>").unwrap();
    std::fs::write(input.path().join("sub/report.docx"), common::docx()).unwrap();

    let source = DirStore::open(input.path()).unwrap();
    let mut target = DirStore::create(output.path().join("md")).unwrap();
    let report = convert_store(
        &source,
        &mut target,
        &BatchOptions::default(),
        &ConverterRegistry::default(),
    )
    .unwrap();

    assert_eq!(report.stats.converted_entries, 3);
    let written = target.entries();
    let keys: Vec<&str> = written.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        vec!["readme.txt.md", "sub/page.html.md", "sub/report.docx.md"]
    );
    let on_disk =
        std::fs::read_to_string(output.path().join("md/sub/page.html.md")).unwrap();
    assert_eq!(on_disk, "Nested\n");
}

#[test]
fn test_dir_store_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    assert!(matches!(
        store.read("absent.txt"),
        Err(Doc2MdError::KeyNotFound { .. })
    ));
    assert!(matches!(
        store.read("../escape.txt"),
        Err(Doc2MdError::InvalidKey { .. })
    ));
}

#[test]
fn test_dir_store_rejects_files() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    std::fs::write(&file, "x").unwrap();
    assert!(matches!(
        DirStore::open(&file),
        Err(Doc2MdError::NotADirectory { .. })
    ));
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[test]
fn test_convert_iter_can_stop_early() {
    let registry = ConverterRegistry::default();
    let options = BatchOptions::default();
    let mut pulled = 0;
    let entries = (0..1_000).map(|i| {
        pulled += 1;
        (format!("{i}.txt"), format!("entry {i}").into_bytes())
    });

    let first_two: Vec<_> = convert_iter(entries, &options, &registry).take(2).collect();
    assert_eq!(first_two.len(), 2);
    assert_eq!(first_two[1].markdown(), Some("entry 1\n"));
    assert_eq!(pulled, 2);
}
