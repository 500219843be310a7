//! Completion multiplexer.
//!
//! Every watched child gets one monitoring task. The task collects the child's output
//! (reading both pipes while waiting, so a chatty command can never stall on a full pipe),
//! parks it for [`ProcessHandle::collect`], then reports a [`Completion`] on a channel shared
//! by all monitors. The dispatcher reads that channel through [`Multiplexer::next`].
use std::{
    fmt, io,
    process::{ExitStatus, Output},
};

use serde::Serialize;
use tokio::{
    process::Child,
    sync::{mpsc, oneshot},
};
use tracing::trace;

/// Ticket for a watched process.
///
/// Issued by the multiplexer rather than taken from the OS, so a pid recycled after
/// reaping can never alias an entry that is still outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(u64);

impl ProcessId {
    #[inline]
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// How a process ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Exit {
    /// Exited normally with this code.
    Code(i32),
    /// Killed by a signal (no exit code).
    Signaled,
    /// The status could not be collected.
    Lost(String),
}

impl Exit {
    #[inline]
    pub fn success(&self) -> bool {
        matches!(self, Exit::Code(0))
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            Exit::Code(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<ExitStatus> for Exit {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Exit::Code(code),
            None => Exit::Signaled,
        }
    }
}

impl From<&io::Result<Output>> for Exit {
    fn from(result: &io::Result<Output>) -> Self {
        match result {
            Ok(out) => Exit::from(out.status),
            Err(e) => Exit::Lost(e.to_string()),
        }
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Code(code) => write!(f, "exit code {code}"),
            Exit::Signaled => f.write_str("terminated by signal"),
            Exit::Lost(reason) => write!(f, "status lost: {reason}"),
        }
    }
}

/// A watched process has terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: ProcessId,
    pub exit: Exit,
}

/// Result of waiting on the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Completed(Completion),
    /// Nothing is outstanding; every watched process has been reported.
    Empty,
}

/// Owner's side of a watched process: its ticket and, once it ends, its output.
#[derive(Debug)]
pub struct ProcessHandle {
    id: ProcessId,
    pid: Option<u32>,
    output: oneshot::Receiver<io::Result<Output>>,
}

impl ProcessHandle {
    #[inline]
    pub fn id(&self) -> ProcessId {
        self.id
    }

    /// OS pid at spawn time, for logs only.
    #[inline]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the captured output. Resolves immediately once the completion was reported.
    pub async fn collect(self) -> io::Result<Output> {
        match self.output.await {
            Ok(result) => result,
            Err(_) => Err(io::Error::other("process monitor dropped before delivering output")),
        }
    }
}

pub struct Multiplexer {
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    next_id: u64,
    outstanding: usize,
}

impl Multiplexer {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            next_id: 1,
            outstanding: 0,
        }
    }

    /// Start monitoring `child`. Must be called from within a tokio runtime.
    pub fn watch(&mut self, child: Child) -> ProcessHandle {
        let id = ProcessId(self.next_id);
        self.next_id += 1;

        let pid = child.id();
        let (out_tx, out_rx) = oneshot::channel();
        let done = self.tx.clone();

        tokio::spawn(async move {
            let result = child.wait_with_output().await;
            let exit = Exit::from(&result);
            trace!(target: "nj.core.mux", %id, ?pid, %exit, "process exited");

            // Output first: by the time the completion is read, reclaim never waits.
            let _ = out_tx.send(result);
            let _ = done.send(Completion { id, exit });
        });

        self.outstanding += 1;
        ProcessHandle {
            id,
            pid,
            output: out_rx,
        }
    }

    /// Number of watched processes not yet returned by [`Multiplexer::next`].
    #[inline]
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Block until any outstanding process terminates, or return [`Next::Empty`] at once if none is.
    ///
    /// Completions come back in the order processes actually finish.
    pub async fn next(&mut self) -> Next {
        if self.outstanding == 0 {
            return Next::Empty;
        }
        match self.rx.recv().await {
            Some(completion) => {
                self.outstanding -= 1;
                Next::Completed(completion)
            }
            // We hold a sender ourselves, so the channel cannot close under us.
            None => {
                self.outstanding = 0;
                Next::Empty
            }
        }
    }
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}
