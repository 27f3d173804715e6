//! `TransportChannel` over a local PTY.
//!
//! A background thread reads the PTY master and feeds a bounded tokio
//! channel; when the bridge stops receiving, `blocking_send` parks the thread
//! and the shell blocks on its own writes. Input is written on the blocking
//! pool so a stalled shell cannot stall the runtime.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use async_trait::async_trait;
use portable_pty::{native_pty_system, Child, MasterPty, PtySize};
use termbridge_common::{TermSize, TransportError};
use termbridge_session::{ChannelReader, ChannelWriter, TransportChannel};
use tokio::sync::mpsc;

use super::spawn::ShellLaunch;

/// Chunks buffered between the reader thread and the session.
const PTY_READ_QUEUE: usize = 32;

/// `EIO`: what Linux returns from a master read once the shell side closed.
const EIO: i32 = 5;

type ReadResult = Result<Option<Vec<u8>>, TransportError>;

fn pty_size(size: TermSize) -> PtySize {
    PtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

// =============================================================================
// CHANNEL
// =============================================================================

struct PtyProcess {
    output_rx: mpsc::Receiver<ReadResult>,
    writer: Box<dyn Write + Send>,
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
}

/// A shell process that has not been started yet.
pub struct PtyChannel {
    launch: Arc<ShellLaunch>,
    process: Option<PtyProcess>,
}

impl PtyChannel {
    pub fn new(launch: Arc<ShellLaunch>) -> Self {
        Self {
            launch,
            process: None,
        }
    }
}

#[async_trait]
impl TransportChannel for PtyChannel {
    fn label(&self) -> String {
        self.launch.label()
    }

    async fn start(&mut self) -> Result<(), TransportError> {
        if self.process.is_some() {
            return Ok(());
        }
        self.process = Some(spawn(&self.launch)?);
        Ok(())
    }

    fn split(self: Box<Self>) -> (Box<dyn ChannelReader>, Box<dyn ChannelWriter>) {
        match self.process {
            Some(process) => (
                Box::new(PtyReader {
                    output_rx: Some(process.output_rx),
                }),
                Box::new(PtyWriter {
                    writer: Some(Arc::new(Mutex::new(process.writer))),
                    master: Some(process.master),
                    child: Some(process.child),
                }),
            ),
            None => (
                Box::new(PtyReader { output_rx: None }),
                Box::new(PtyWriter {
                    writer: None,
                    master: None,
                    child: None,
                }),
            ),
        }
    }
}

fn spawn(launch: &ShellLaunch) -> Result<PtyProcess, TransportError> {
    let pair = native_pty_system()
        .openpty(pty_size(TermSize::default()))
        .map_err(|e| TransportError::Rejected(format!("failed to open PTY: {e}")))?;

    let program = launch.program();
    let child = pair
        .slave
        .spawn_command(launch.command())
        .map_err(|e| TransportError::Rejected(format!("failed to spawn '{program}': {e}")))?;

    // Only the master is needed; holding the slave would hide EOF.
    drop(pair.slave);

    let writer = pair
        .master
        .take_writer()
        .map_err(|e| TransportError::Rejected(format!("failed to take PTY writer: {e}")))?;
    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| TransportError::Rejected(format!("failed to clone PTY reader: {e}")))?;

    let (tx, rx) = mpsc::channel(PTY_READ_QUEUE);
    spawn_reader(reader, launch.read_chunk_bytes(), tx)?;

    tracing::debug!(program = %program, pid = ?child.process_id(), "Shell spawned");

    Ok(PtyProcess {
        output_rx: rx,
        writer,
        master: pair.master,
        child,
    })
}

fn spawn_reader(
    mut reader: Box<dyn Read + Send>,
    chunk: usize,
    tx: mpsc::Sender<ReadResult>,
) -> io::Result<()> {
    thread::Builder::new()
        .name("pty-reader".to_string())
        .spawn(move || {
            let mut buf = vec![0u8; chunk.max(1)];
            loop {
                let result = match reader.read(&mut buf) {
                    Ok(0) => Ok(None),
                    Ok(n) => Ok(Some(buf[..n].to_vec())),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) if e.raw_os_error() == Some(EIO) => Ok(None),
                    Err(e) => Err(TransportError::Io(e)),
                };
                let last = !matches!(result, Ok(Some(_)));
                // Fails only once the session stopped listening.
                if tx.blocking_send(result).is_err() || last {
                    break;
                }
            }
            tracing::debug!("PTY reader finished");
        })
        .map(|_| ())
}

// =============================================================================
// HALVES
// =============================================================================

struct PtyReader {
    output_rx: Option<mpsc::Receiver<ReadResult>>,
}

#[async_trait]
impl ChannelReader for PtyReader {
    async fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let Some(rx) = self.output_rx.as_mut() else {
            return Err(TransportError::Closed);
        };
        match rx.recv().await {
            Some(result) => result,
            None => Ok(None),
        }
    }
}

struct PtyWriter {
    writer: Option<Arc<Mutex<Box<dyn Write + Send>>>>,
    master: Option<Box<dyn MasterPty + Send>>,
    child: Option<Box<dyn Child + Send + Sync>>,
}

#[async_trait]
impl ChannelWriter for PtyWriter {
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        let Some(writer) = self.writer.clone() else {
            return Err(TransportError::Closed);
        };
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
            writer.write_all(&data)?;
            writer.flush()
        })
        .await
        .map_err(io::Error::other)??;
        Ok(())
    }

    async fn resize(&mut self, size: TermSize) -> Result<(), TransportError> {
        let Some(master) = self.master.as_ref() else {
            return Err(TransportError::Closed);
        };
        master
            .resize(pty_size(size))
            .map_err(|e| TransportError::Rejected(format!("PTY resize failed: {e}")))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.writer = None;
        self.master = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if let Err(e) = child.kill() {
            tracing::debug!("PTY kill error (may already be dead): {e}");
        }
        // Reap the child so it does not linger as a zombie.
        match tokio::task::spawn_blocking(move || child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(code = status.exit_code(), "Shell exited"),
            Ok(Err(e)) => tracing::debug!("PTY wait error: {e}"),
            Err(e) => tracing::debug!("PTY wait task failed: {e}"),
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
