//! In-memory transport channel and render surface doubles.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use termbridge_config::BridgeConfig;
use termbridge_session::{
    ChannelReader, ChannelWriter, RenderSurface, SessionHandle, SessionState, SurfaceError,
    TermSize, TransportChannel, TransportError,
};
use tokio::sync::{mpsc, watch};

pub const WAIT: Duration = Duration::from_secs(2);

pub fn config(queue_depth: u32) -> Arc<BridgeConfig> {
    let mut config = BridgeConfig::default();
    config.session.output_queue_depth = queue_depth;
    Arc::new(config)
}

/// Like [`config`], with a short flush deadline for stalled-surface cases.
pub fn config_with_flush(queue_depth: u32, flush_timeout_ms: u32) -> Arc<BridgeConfig> {
    let mut config = BridgeConfig::default();
    config.session.output_queue_depth = queue_depth;
    config.session.flush_timeout_ms = flush_timeout_ms;
    Arc::new(config)
}

/// Poll `check` until it holds, failing the test after [`WAIT`].
pub async fn eventually(what: &str, check: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !check() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub async fn wait_state(handle: &SessionHandle, state: SessionState) {
    let reached = tokio::time::timeout(WAIT, handle.wait_for(state))
        .await
        .unwrap_or(false);
    assert!(reached, "session never reached {state}");
}

// =============================================================================
// CHANNEL
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Start,
    Receive,
    Send(Vec<u8>),
    Resize(TermSize),
    Close,
}

/// Every call the bridge made on one channel, in order.
#[derive(Clone, Default)]
pub struct ChannelLog(Arc<Mutex<Vec<Call>>>);

impl ChannelLog {
    fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send(bytes) => Some(bytes),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn resizes(&self) -> Vec<TermSize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Resize(size) => Some(size),
                _ => None,
            })
            .collect()
    }

    pub fn receives(&self) -> usize {
        self.count(&Call::Receive)
    }

    pub fn closes(&self) -> usize {
        self.count(&Call::Close)
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.calls().iter().position(|c| c == call)
    }

    fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
}

#[derive(Default)]
struct Faults {
    reject_start: AtomicBool,
    fail_send: AtomicBool,
    stall_send: AtomicBool,
    fail_resize: AtomicBool,
}

type ReadResult = Result<Option<Vec<u8>>, TransportError>;

/// Test-side end of a [`ScriptedChannel`]: plays the remote shell.
pub struct Remote {
    reads: mpsc::UnboundedSender<ReadResult>,
    faults: Arc<Faults>,
    pub log: ChannelLog,
}

impl Remote {
    pub fn output(&self, bytes: &[u8]) {
        let _ = self.reads.send(Ok(Some(bytes.to_vec())));
    }

    pub fn eof(&self) {
        let _ = self.reads.send(Ok(None));
    }

    pub fn read_error(&self, message: &str) {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, message.to_string());
        let _ = self.reads.send(Err(err.into()));
    }

    pub fn reject_start(&self) {
        self.faults.reject_start.store(true, Ordering::SeqCst);
    }

    pub fn fail_sends(&self) {
        self.faults.fail_send.store(true, Ordering::SeqCst);
    }

    /// Sends are logged, then never complete.
    pub fn stall_sends(&self) {
        self.faults.stall_send.store(true, Ordering::SeqCst);
    }

    pub fn fail_resizes(&self) {
        self.faults.fail_resize.store(true, Ordering::SeqCst);
    }
}

pub struct ScriptedChannel {
    label: String,
    reads: mpsc::UnboundedReceiver<ReadResult>,
    faults: Arc<Faults>,
    log: ChannelLog,
}

pub fn channel(label: &str) -> (ScriptedChannel, Remote) {
    let (tx, rx) = mpsc::unbounded_channel();
    let faults = Arc::new(Faults::default());
    let log = ChannelLog::default();
    let channel = ScriptedChannel {
        label: label.to_string(),
        reads: rx,
        faults: Arc::clone(&faults),
        log: log.clone(),
    };
    let remote = Remote {
        reads: tx,
        faults,
        log,
    };
    (channel, remote)
}

#[async_trait]
impl TransportChannel for ScriptedChannel {
    fn label(&self) -> String {
        self.label.clone()
    }

    async fn start(&mut self) -> Result<(), TransportError> {
        self.log.push(Call::Start);
        if self.faults.reject_start.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("shell request denied".into()));
        }
        Ok(())
    }

    fn split(self: Box<Self>) -> (Box<dyn ChannelReader>, Box<dyn ChannelWriter>) {
        let reader = ScriptedReader {
            reads: self.reads,
            log: self.log.clone(),
        };
        let writer = ScriptedWriter {
            faults: self.faults,
            log: self.log,
        };
        (Box::new(reader), Box::new(writer))
    }
}

struct ScriptedReader {
    reads: mpsc::UnboundedReceiver<ReadResult>,
    log: ChannelLog,
}

#[async_trait]
impl ChannelReader for ScriptedReader {
    async fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        self.log.push(Call::Receive);
        match self.reads.recv().await {
            Some(result) => result,
            // Remote handle dropped: behave like an idle shell.
            None => std::future::pending().await,
        }
    }
}

struct ScriptedWriter {
    faults: Arc<Faults>,
    log: ChannelLog,
}

#[async_trait]
impl ChannelWriter for ScriptedWriter {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.faults.fail_send.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe").into());
        }
        self.log.push(Call::Send(data.to_vec()));
        if self.faults.stall_send.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn resize(&mut self, size: TermSize) -> Result<(), TransportError> {
        self.log.push(Call::Resize(size));
        if self.faults.fail_resize.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("window-change refused".into()));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.log.push(Call::Close);
        Ok(())
    }
}

// =============================================================================
// SURFACE
// =============================================================================

/// Records every write. Optionally slow, gated, or failing on one payload.
#[derive(Default)]
pub struct RecordingSurface {
    writes: Mutex<Vec<Vec<u8>>>,
    delay: Option<Duration>,
    gate: Option<watch::Receiver<bool>>,
    fail_on: Option<Vec<u8>>,
}

impl RecordingSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay: Some(delay),
            ..Default::default()
        })
    }

    /// Writes block until `true` is sent on the returned gate.
    pub fn gated() -> (Arc<Self>, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        let surface = Self {
            gate: Some(rx),
            ..Default::default()
        };
        (Arc::new(surface), tx)
    }

    pub fn failing_on(payload: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            fail_on: Some(payload.to_vec()),
            ..Default::default()
        })
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.writes.lock().unwrap().clone()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.writes().concat()
    }
}

#[async_trait]
impl RenderSurface for RecordingSurface {
    async fn write(&self, data: &[u8]) -> Result<(), SurfaceError> {
        if let Some(gate) = &self.gate {
            let mut gate = gate.clone();
            let _ = gate.wait_for(|open| *open).await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_on.as_deref() == Some(data) {
            return Err(SurfaceError::Rejected("renderer not ready".into()));
        }
        self.writes.lock().unwrap().push(data.to_vec());
        Ok(())
    }
}
