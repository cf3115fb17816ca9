//! End-to-end create/update cycles against scripted token sources.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use pretty_assertions::assert_eq;

use docstream_core::api::{
    accumulate, text_deltas, CancellationToken, CreateDocument, Document, DocumentCoordinator,
    DocumentError, DocumentKind, DocumentStore, HandlerOp, HandlerRegistry, HandlerRequest,
    LiveChannel, SourceEvent, StoreError, StreamDelta, StreamError, UpdateDocument,
};

#[derive(Default)]
struct RecordingStore {
    rows: Mutex<HashMap<String, Vec<Document>>>,
    saves: AtomicUsize,
    fail_saves: bool,
}

impl RecordingStore {
    fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    fn seed(&self, doc: Document) {
        self.rows
            .lock()
            .unwrap()
            .entry(doc.id.clone())
            .or_default()
            .push(doc);
    }

    fn save_calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn save_document(&self, document: &Document) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(StoreError::Backend("disk full".into()));
        }
        self.seed(document.clone());
        Ok(())
    }

    async fn load_document(&self, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(id)
            .and_then(|v| v.last().cloned()))
    }

    async fn list_versions(&self, id: &str) -> Result<Vec<Document>, StoreError> {
        Ok(self.rows.lock().unwrap().get(id).cloned().unwrap_or_default())
    }
}

/// Emits fixed source events and records how often it ran.
struct ScriptedOp {
    events: Vec<Result<SourceEvent, StreamError>>,
    calls: AtomicUsize,
    seen_existing: Mutex<Vec<Option<String>>>,
}

impl ScriptedOp {
    fn texts(parts: &[&str]) -> Arc<Self> {
        Self::events(
            parts
                .iter()
                .map(|p| Ok(SourceEvent::TextDelta(p.to_string())))
                .collect(),
        )
    }

    fn events(events: Vec<Result<SourceEvent, StreamError>>) -> Arc<Self> {
        Arc::new(Self {
            events,
            calls: AtomicUsize::new(0),
            seen_existing: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn clone_event(e: &Result<SourceEvent, StreamError>) -> Result<SourceEvent, StreamError> {
    match e {
        Ok(ev) => Ok(ev.clone()),
        Err(StreamError::Upstream(m)) => Err(StreamError::Upstream(m.clone())),
        Err(other) => Err(StreamError::Decode(other.to_string())),
    }
}

#[async_trait]
impl HandlerOp for ScriptedOp {
    async fn run(&self, request: HandlerRequest<'_>) -> Result<String, StreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_existing
            .lock()
            .unwrap()
            .push(request.existing_content.map(str::to_string));
        let events: Vec<_> = self.events.iter().map(clone_event).collect();
        accumulate(text_deltas(stream::iter(events)), request.channel, None).await
    }
}

/// Emits one delta then goes quiet, optionally bounded by an idle timeout.
struct StallingOp(Option<Duration>);

#[async_trait]
impl HandlerOp for StallingOp {
    async fn run(&self, request: HandlerRequest<'_>) -> Result<String, StreamError> {
        let source = stream::iter(vec![Ok(StreamDelta::TextDelta("partial".into()))])
            .chain(stream::pending());
        accumulate(source, request.channel, self.0).await
    }
}

fn stalling() -> Arc<StallingOp> {
    Arc::new(StallingOp(None))
}

fn coordinator(
    create: Arc<dyn HandlerOp>,
    update: Arc<dyn HandlerOp>,
    store: Arc<RecordingStore>,
) -> DocumentCoordinator {
    let registry = HandlerRegistry::builder()
        .register(DocumentKind::Text, create, update)
        .build();
    DocumentCoordinator::new(Arc::new(registry), store)
}

async fn drain(mut rx: tokio::sync::mpsc::Receiver<StreamDelta>) -> Vec<StreamDelta> {
    let mut out = Vec::new();
    while let Some(d) = rx.recv().await {
        out.push(d);
    }
    out
}

fn existing_doc(content: &str) -> Document {
    Document::created(
        "doc-1".into(),
        DocumentKind::Text,
        "Essay Workspace".into(),
        "user-1".into(),
        content.into(),
        chrono::Utc::now() - chrono::Duration::seconds(30),
    )
}

#[tokio::test]
async fn create_streams_control_then_content_then_finish() {
    let store = Arc::new(RecordingStore::default());
    let op = ScriptedOp::texts(&["Hello", " ", "world"]);
    let coord = coordinator(op.clone(), op.clone(), store.clone());

    let (channel, rx) = LiveChannel::bounded(64, false);
    let doc = coord
        .create_document(
            CreateDocument {
                kind: DocumentKind::Text,
                title: "Greeting".into(),
                owner_id: "user-1".into(),
            },
            &channel,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    drop(channel);

    let deltas = drain(rx).await;
    assert_eq!(
        deltas,
        vec![
            StreamDelta::Kind(DocumentKind::Text),
            StreamDelta::Id(doc.id.clone()),
            StreamDelta::Title("Greeting".into()),
            StreamDelta::TextDelta("Hello".into()),
            StreamDelta::TextDelta(" ".into()),
            StreamDelta::TextDelta("world".into()),
            StreamDelta::Finish,
        ]
    );

    assert_eq!(doc.content, "Hello world");
    assert_eq!(store.save_calls(), 1);
    let stored = store.load_document(&doc.id).await.unwrap().unwrap();
    assert_eq!(stored, doc);
    assert_eq!(stored.owner_id, "user-1");
}

#[tokio::test]
async fn create_does_not_persist_when_stream_fails() {
    let store = Arc::new(RecordingStore::default());
    let op = ScriptedOp::events(vec![
        Ok(SourceEvent::TextDelta("one".into())),
        Ok(SourceEvent::TextDelta("two".into())),
        Err(StreamError::Upstream("connection reset".into())),
    ]);
    let coord = coordinator(op.clone(), op, store.clone());

    let (channel, rx) = LiveChannel::bounded(64, false);
    let err = coord
        .create_document(
            CreateDocument {
                kind: DocumentKind::Text,
                title: "Broken".into(),
                owner_id: "user-1".into(),
            },
            &channel,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    drop(channel);

    assert!(matches!(err, DocumentError::Stream(StreamError::Upstream(_))));
    assert_eq!(store.save_calls(), 0);

    let deltas = drain(rx).await;
    let last = deltas.last().unwrap();
    assert!(matches!(last, StreamDelta::Error(msg) if msg.starts_with("stream_error")));
    assert!(!deltas.contains(&StreamDelta::Finish));
}

#[tokio::test]
async fn create_with_unregistered_kind_opens_nothing() {
    let store = Arc::new(RecordingStore::default());
    let op = ScriptedOp::texts(&["unused"]);
    let coord = coordinator(op.clone(), op.clone(), store.clone());

    let (channel, rx) = LiveChannel::bounded(8, false);
    let err = coord
        .create_document(
            CreateDocument {
                kind: DocumentKind::Sheet,
                title: "Budget".into(),
                owner_id: "user-1".into(),
            },
            &channel,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    drop(channel);

    assert!(matches!(err, DocumentError::UnsupportedKind(DocumentKind::Sheet)));
    assert_eq!(op.calls(), 0);
    assert_eq!(store.save_calls(), 0);
    let deltas = drain(rx).await;
    assert_eq!(deltas.len(), 1);
    assert!(matches!(&deltas[0], StreamDelta::Error(m) if m.starts_with("unsupported_kind")));
}

#[tokio::test]
async fn persistence_failure_is_reported_after_full_stream() {
    let store = Arc::new(RecordingStore::failing());
    let op = ScriptedOp::texts(&["complete"]);
    let coord = coordinator(op.clone(), op, store.clone());

    let (channel, rx) = LiveChannel::bounded(64, false);
    let err = coord
        .create_document(
            CreateDocument {
                kind: DocumentKind::Text,
                title: "T".into(),
                owner_id: "u".into(),
            },
            &channel,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    drop(channel);

    assert!(matches!(err, DocumentError::Persistence(_)));
    assert_eq!(store.save_calls(), 1);
    let deltas = drain(rx).await;
    assert!(deltas.contains(&StreamDelta::TextDelta("complete".into())));
    assert!(matches!(deltas.last(), Some(StreamDelta::Error(_))));
}

#[tokio::test]
async fn create_survives_live_viewer_disconnect() {
    let store = Arc::new(RecordingStore::default());
    let op = ScriptedOp::texts(&["a", "b", "c"]);
    let coord = coordinator(op.clone(), op, store.clone());

    let (channel, rx) = LiveChannel::bounded(1, false);
    drop(rx);
    let doc = coord
        .create_document(
            CreateDocument {
                kind: DocumentKind::Text,
                title: "Unwatched".into(),
                owner_id: "u".into(),
            },
            &channel,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(doc.content, "abc");
    assert_eq!(store.save_calls(), 1);
    assert!(channel.is_disconnected());
}

#[tokio::test]
async fn cancelled_create_persists_nothing() {
    let store = Arc::new(RecordingStore::default());
    let coord = coordinator(stalling(), stalling(), store.clone());
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let (channel, rx) = LiveChannel::bounded(64, false);
    let err = coord
        .create_document(
            CreateDocument {
                kind: DocumentKind::Text,
                title: "Stopped".into(),
                owner_id: "u".into(),
            },
            &channel,
            &cancel,
        )
        .await
        .unwrap_err();
    drop(channel);

    assert!(matches!(err, DocumentError::Cancelled));
    assert_eq!(store.save_calls(), 0);
    let deltas = drain(rx).await;
    assert_eq!(deltas.last(), Some(&StreamDelta::TextDelta("partial".into())));
}

#[tokio::test]
async fn update_missing_document_invokes_no_handler() {
    let store = Arc::new(RecordingStore::default());
    let op = ScriptedOp::texts(&["x"]);
    let coord = coordinator(op.clone(), op.clone(), store.clone());

    let err = coord
        .update_document(
            UpdateDocument {
                id: "missing".into(),
                description: "tighten it".into(),
            },
            &LiveChannel::detached(),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DocumentError::NotFound(ref id) if id == "missing"));
    assert_eq!(op.calls(), 0);
    assert_eq!(store.save_calls(), 0);
}

#[tokio::test]
async fn update_replaces_content_and_advances_timestamp() {
    let store = Arc::new(RecordingStore::default());
    let prior = existing_doc("draft");
    store.seed(prior.clone());

    let create = ScriptedOp::texts(&["unused"]);
    let update = ScriptedOp::texts(&["final"]);
    let coord = coordinator(create.clone(), update.clone(), store.clone());

    let (channel, rx) = LiveChannel::bounded(16, false);
    let doc = coord
        .update_document(
            UpdateDocument {
                id: prior.id.clone(),
                description: "make it final".into(),
            },
            &channel,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
    drop(channel);

    assert_eq!(doc.content, "final");
    assert!(doc.updated_at > prior.updated_at);
    assert_eq!(doc.created_at, prior.created_at);
    assert_eq!(doc.title, prior.title);
    assert_eq!(create.calls(), 0);
    assert_eq!(
        update.seen_existing.lock().unwrap().clone(),
        vec![Some("draft".to_string())]
    );

    let versions = store.list_versions(&prior.id).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].content, "draft");
    assert_eq!(versions[1].content, "final");

    assert_eq!(
        drain(rx).await,
        vec![
            StreamDelta::Clear,
            StreamDelta::TextDelta("final".into()),
            StreamDelta::Finish,
        ]
    );
}

#[tokio::test]
async fn concurrent_updates_to_one_id_are_serialized() {
    let store = Arc::new(RecordingStore::default());
    store.seed(existing_doc("v0"));

    let update = ScriptedOp::texts(&["next"]);
    let coord = Arc::new(coordinator(
        ScriptedOp::texts(&[]),
        update.clone(),
        store.clone(),
    ));

    let mut tasks = Vec::new();
    for i in 0..4 {
        let coord = coord.clone();
        tasks.push(tokio::spawn(async move {
            coord
                .update_document(
                    UpdateDocument {
                        id: "doc-1".into(),
                        description: format!("pass {i}"),
                    },
                    &LiveChannel::detached(),
                    &CancellationToken::new(),
                )
                .await
        }));
    }
    for t in tasks {
        t.await.unwrap().unwrap();
    }

    // each update observed the body persisted by the one before it
    let seen = update.seen_existing.lock().unwrap().clone();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen.iter().filter(|s| s.as_deref() == Some("v0")).count(), 1);

    let versions = store.list_versions("doc-1").await.unwrap();
    assert_eq!(versions.len(), 5);
    for pair in versions.windows(2) {
        assert!(pair[1].updated_at > pair[0].updated_at);
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_source_times_out_as_stream_error() {
    let store = Arc::new(RecordingStore::default());
    let op = Arc::new(StallingOp(Some(Duration::from_secs(30))));
    let coord = coordinator(op.clone(), op, store.clone());

    let (channel, rx) = LiveChannel::bounded(16, false);
    let err = coord
        .create_document(
            CreateDocument {
                kind: DocumentKind::Text,
                title: "Quiet".into(),
                owner_id: "u".into(),
            },
            &channel,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    drop(channel);

    assert!(matches!(
        err,
        DocumentError::Stream(StreamError::Timeout { idle_ms: 30_000 })
    ));
    assert_eq!(store.save_calls(), 0);

    let deltas = drain(rx).await;
    assert!(deltas.contains(&StreamDelta::TextDelta("partial".into())));
    assert!(!deltas.contains(&StreamDelta::Finish));
    assert_eq!(
        deltas.last(),
        Some(&StreamDelta::Error(
            "stream_error: token stream failed: no delta received within 30000ms".into()
        ))
    );
}

#[tokio::test]
async fn cancelled_updates_persist_nothing_whether_streaming_or_queued() {
    let store = Arc::new(RecordingStore::default());
    store.seed(existing_doc("draft"));
    let coord = Arc::new(coordinator(stalling(), stalling(), store.clone()));

    // first update takes the per-id lock and stalls mid-stream
    let streaming_cancel = CancellationToken::new();
    let (streaming_channel, mut streaming_rx) = LiveChannel::bounded(16, false);
    let streaming = {
        let coord = coord.clone();
        let cancel = streaming_cancel.clone();
        tokio::spawn(async move {
            coord
                .update_document(
                    UpdateDocument {
                        id: "doc-1".into(),
                        description: "first".into(),
                    },
                    &streaming_channel,
                    &cancel,
                )
                .await
        })
    };
    assert_eq!(streaming_rx.recv().await, Some(StreamDelta::Clear));
    assert_eq!(
        streaming_rx.recv().await,
        Some(StreamDelta::TextDelta("partial".into()))
    );

    // second update waits on the same id and is cancelled before it gets in
    let queued_cancel = CancellationToken::new();
    let trigger = queued_cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });
    let (queued_channel, queued_rx) = LiveChannel::bounded(16, false);
    let queued = coord
        .update_document(
            UpdateDocument {
                id: "doc-1".into(),
                description: "second".into(),
            },
            &queued_channel,
            &queued_cancel,
        )
        .await;
    drop(queued_channel);
    assert!(matches!(queued, Err(DocumentError::Cancelled)));
    assert!(drain(queued_rx).await.is_empty());

    streaming_cancel.cancel();
    let streamed = streaming.await.unwrap();
    assert!(matches!(streamed, Err(DocumentError::Cancelled)));
    assert!(drain(streaming_rx).await.is_empty());

    assert_eq!(store.save_calls(), 0);
    let versions = store.list_versions("doc-1").await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].content, "draft");
}
