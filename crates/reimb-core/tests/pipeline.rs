use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;
use reimb_core::{
    CancellationToken, FieldId, FieldValue, FileProcessor, OcrError, OcrProvider, OcrSession,
    Payload, ReimbError, SourceFile,
};

const SAMPLE: &str = "姓名: 王小明\n部門: 研發部\n日期: 2024-07-15\n交通費: NT$1,500\n總計: NT$1,500";

#[derive(Default)]
struct Counters {
    acquired: AtomicUsize,
    terminated: AtomicUsize,
}

/// Provider whose sessions replay a fixed progress script and then either
/// return `text` or fail.
struct ScriptedProvider {
    text: String,
    script: Vec<u8>,
    fail: bool,
    counters: Arc<Counters>,
}

impl ScriptedProvider {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            script: vec![0, 25, 50, 75, 100],
            fail: false,
            counters: Arc::new(Counters::default()),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            script: vec![0, 40],
            ..Self::new("")
        }
    }
}

impl OcrProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn acquire(&self, _language: &str) -> Result<Box<dyn OcrSession>, OcrError> {
        self.counters.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession {
            text: self.text.clone(),
            script: self.script.clone(),
            fail: self.fail,
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct ScriptedSession {
    text: String,
    script: Vec<u8>,
    fail: bool,
    counters: Arc<Counters>,
}

impl OcrSession for ScriptedSession {
    fn recognize(
        &mut self,
        _payload: &Payload,
        progress: &mut dyn FnMut(u8),
    ) -> Result<String, OcrError> {
        for &p in &self.script {
            progress(p);
        }
        if self.fail {
            return Err(OcrError::Recognition("engine crashed".to_string()));
        }
        Ok(self.text.clone())
    }

    fn terminate(self: Box<Self>) {
        self.counters.terminated.fetch_add(1, Ordering::SeqCst);
    }
}

fn upload(name: &str) -> SourceFile {
    SourceFile::from_bytes(name, Some("image/png"), vec![0x89, b'P', b'N', b'G']).unwrap()
}

fn run(provider: ScriptedProvider, file: &SourceFile) -> (reimb_core::Result<reimb_core::ProcessedFile>, Vec<u8>, Arc<Counters>) {
    let counters = Arc::clone(&provider.counters);
    let processor = FileProcessor::new(Arc::new(provider));
    let mut seen = Vec::new();
    let result = processor.process(file, |p| seen.push(p), &CancellationToken::new());
    (result, seen, counters)
}

#[test]
fn test_success_reports_monotonic_progress_ending_at_100() {
    let (result, seen, counters) = run(ScriptedProvider::new(SAMPLE), &upload("scan.png"));

    assert!(result.is_ok());
    assert_eq!(seen, vec![0, 10, 30, 50, 70, 90, 100]);
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(counters.terminated.load(Ordering::SeqCst), 1);
}

#[test]
fn test_end_to_end_sample() {
    let (result, _, _) = run(ScriptedProvider::new(SAMPLE), &upload("wang.png"));
    let processed = result.unwrap();
    let form = processed.data;

    assert_eq!(processed.file_name, "wang.png");
    assert_eq!(form.name.as_deref(), Some("王小明"));
    assert_eq!(form.department.as_deref(), Some("研發部"));
    assert_eq!(form.date.as_deref(), Some("2024/07/15"));
    assert_eq!(form.transport_cost, Some(1500));
    assert_eq!(form.total_cost, Some(1500));
    assert_eq!(form.lodging_cost, None);
    assert_eq!(form.confidence_of(FieldId::Name), 0.95);
    assert_eq!(form.confidence_of(FieldId::LodgingCost), 0.0);
    assert_eq!(
        form.value(FieldId::TransportCost),
        Some(FieldValue::Amount(1500))
    );
}

#[test]
fn test_recognition_failure_releases_session_once() {
    let (result, seen, counters) = run(ScriptedProvider::failing(), &upload("scan.png"));

    assert!(matches!(result, Err(ReimbError::Recognition(_))));
    assert!(!seen.contains(&100));
    assert_eq!(seen, vec![0, 10, 42]);
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(counters.terminated.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unreadable_file_never_acquires_session() {
    let dir = tempfile::tempdir().unwrap();
    let file = SourceFile::from_path(dir.path().join("missing.jpg")).unwrap();

    let (result, seen, counters) = run(ScriptedProvider::new(SAMPLE), &file);

    assert!(matches!(result, Err(ReimbError::Io(_))));
    assert_eq!(seen, vec![0]);
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 0);
    assert_eq!(counters.terminated.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancelled_before_start() {
    let provider = ScriptedProvider::new(SAMPLE);
    let counters = Arc::clone(&provider.counters);
    let processor = FileProcessor::new(Arc::new(provider));
    let token = CancellationToken::new();
    token.cancel();

    let result = processor.process(&upload("scan.png"), |_| {}, &token);

    assert!(matches!(result, Err(ReimbError::Cancelled)));
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancelled_during_recognition_releases_session() {
    let provider = ScriptedProvider::new(SAMPLE);
    let counters = Arc::clone(&provider.counters);
    let processor = FileProcessor::new(Arc::new(provider));
    let token = CancellationToken::new();
    let mut seen = Vec::new();

    let result = processor.process(
        &upload("scan.png"),
        |p| {
            seen.push(p);
            if p >= 30 {
                token.cancel();
            }
        },
        &token,
    );

    assert!(matches!(result, Err(ReimbError::Cancelled)));
    assert!(!seen.contains(&100));
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(counters.terminated.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancelled_after_load_never_acquires_session() {
    let provider = ScriptedProvider::new(SAMPLE);
    let counters = Arc::clone(&provider.counters);
    let processor = FileProcessor::new(Arc::new(provider));
    let token = CancellationToken::new();
    let mut seen = Vec::new();

    let result = processor.process(
        &upload("scan.png"),
        |p| {
            seen.push(p);
            if p == 10 {
                token.cancel();
            }
        },
        &token,
    );

    assert!(matches!(result, Err(ReimbError::Cancelled)));
    assert_eq!(seen, vec![0, 10]);
    assert_eq!(counters.acquired.load(Ordering::SeqCst), 0);
    assert_eq!(counters.terminated.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unlabeled_text_yields_empty_form() {
    let (result, seen, _) = run(
        ScriptedProvider::new("just some words"),
        &upload("scan.png"),
    );
    let processed = result.unwrap();

    assert_eq!(seen.last(), Some(&100));
    assert!(processed.data.name.is_none());
    assert!(processed.data.total_cost.is_none());
    assert!(FieldId::ALL
        .iter()
        .all(|&f| processed.data.confidence_of(f) == 0.0));
}

#[test]
fn test_concurrent_files_are_independent() {
    let provider = ScriptedProvider::new(SAMPLE);
    let counters = Arc::clone(&provider.counters);
    let processor = FileProcessor::new(Arc::new(provider));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let processor = processor.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                let file = upload(&format!("scan_{i}.png"));
                let result = processor.process(&file, |p| seen.push(p), &CancellationToken::new());
                (result.map(|r| r.file_name), seen)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let (name, seen) = handle.join().unwrap();
        assert_eq!(name.unwrap(), format!("scan_{i}.png"));
        assert_eq!(seen.last(), Some(&100));
    }

    assert_eq!(counters.acquired.load(Ordering::SeqCst), 4);
    assert_eq!(counters.terminated.load(Ordering::SeqCst), 4);
}
