//! Shared test doubles: a scripted gateway, a sequential id source, and a
//! virtual-clock scheduler.

use async_trait::async_trait;
use philovoid_core::error::GatewayError;
use philovoid_core::gateway::{FragmentStream, ModelGateway, SendOptions};
use philovoid_core::ids::IdGenerator;
use philovoid_core::knowledge::DocumentMetadata;
use philovoid_core::message::Message;
use philovoid_core::scheduler::{CancelToken, Scheduler};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Deterministic ids: `id-1`, `id-2`, …
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("id-{n}")
    }
}

/// A send recorded by the mock gateway, for assertions on what went over
/// the wire.
#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub prompt: String,
    pub history: Vec<Message>,
    pub options: SendOptions,
}

/// A scripted gateway. Each `send` pops the next stream script; each
/// `classify` pops the next classification result. Scripts exhausted means
/// an empty (immediately complete) stream and a generic classification.
pub struct MockGateway {
    streams: Mutex<VecDeque<StreamScript>>,
    classifications: Mutex<VecDeque<Result<DocumentMetadata, GatewayError>>>,
    sends: Mutex<Vec<RecordedSend>>,
}

enum StreamScript {
    /// The call itself fails before any fragment.
    Refuse(GatewayError),
    /// The stream yields these items in order.
    Items(Vec<Result<String, GatewayError>>),
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(VecDeque::new()),
            classifications: Mutex::new(VecDeque::new()),
            sends: Mutex::new(Vec::new()),
        }
    }

    /// Queue a stream that yields these fragments and completes.
    pub fn with_fragments(self, fragments: &[&str]) -> Self {
        self.streams.lock().unwrap().push_back(StreamScript::Items(
            fragments.iter().map(|f| Ok(f.to_string())).collect(),
        ));
        self
    }

    /// Queue a stream script with explicit items (fragments and/or a
    /// mid-stream error).
    pub fn with_stream(self, items: Vec<Result<String, GatewayError>>) -> Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(StreamScript::Items(items));
        self
    }

    /// Queue a send that fails before producing a stream.
    pub fn with_send_failure(self, error: GatewayError) -> Self {
        self.streams
            .lock()
            .unwrap()
            .push_back(StreamScript::Refuse(error));
        self
    }

    /// Queue a classification result.
    pub fn with_classification(self, result: Result<DocumentMetadata, GatewayError>) -> Self {
        self.classifications.lock().unwrap().push_back(result);
        self
    }

    pub fn sends(&self) -> Vec<RecordedSend> {
        self.sends.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(
        &self,
        prompt: &str,
        history: &[Message],
        options: SendOptions,
    ) -> Result<FragmentStream, GatewayError> {
        self.sends.lock().unwrap().push(RecordedSend {
            prompt: prompt.to_string(),
            history: history.to_vec(),
            options,
        });

        let script = self
            .streams
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(StreamScript::Items(Vec::new()));

        let items = match script {
            StreamScript::Refuse(error) => return Err(error),
            StreamScript::Items(items) => items,
        };

        let (tx, rx) = tokio::sync::mpsc::channel(items.len().max(1));
        tokio::spawn(async move {
            for item in items {
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });
        Ok(rx)
    }

    async fn classify(&self, _document_text: &str) -> Result<DocumentMetadata, GatewayError> {
        self.classifications
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(DocumentMetadata {
                    folder: "Mock".into(),
                    tags: Vec::new(),
                })
            })
    }
}

/// A scheduler with a virtual clock. Nothing fires until the test advances
/// time; due callbacks fire in deadline order.
pub struct ManualScheduler {
    inner: Arc<Mutex<ClockState>>,
}

struct ClockState {
    now: Duration,
    next_id: u64,
    queue: Vec<PendingCallback>,
}

struct PendingCallback {
    id: u64,
    due: Duration,
    callback: Box<dyn FnOnce() + Send>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ClockState {
                now: Duration::ZERO,
                next_id: 0,
                queue: Vec::new(),
            })),
        }
    }

    /// Number of callbacks still pending.
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    /// Advance the clock, firing every callback that comes due. Callbacks
    /// run outside the scheduler lock so they may schedule further
    /// callbacks (the motor's self-rescheduling relies on this).
    pub fn advance(&self, delta: Duration) {
        let target = self.inner.lock().unwrap().now + delta;
        loop {
            let next = {
                let mut state = self.inner.lock().unwrap();
                let due_index = state
                    .queue
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(_, p)| (p.due, p.id))
                    .map(|(i, _)| i);
                match due_index {
                    Some(i) => {
                        let pending = state.queue.remove(i);
                        state.now = pending.due;
                        Some(pending.callback)
                    }
                    None => {
                        state.now = target;
                        None
                    }
                }
            };
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> CancelToken {
        let mut state = self.inner.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.now + delay;
        state.queue.push(PendingCallback { id, due, callback });

        let inner = self.inner.clone();
        CancelToken::new(move || {
            inner.lock().unwrap().queue.retain(|p| p.id != id);
        })
    }
}
