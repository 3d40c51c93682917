//! Background highlighting.
//!
//! [`HighlightQueue`] runs capture queries on one worker thread against a [`SyntaxSnapshot`]
//! and hands the resulting tokens back through [`HighlightQueue::drain`], which the editing
//! thread calls when it is ready to apply them. Each line has a single slot: submitting a new
//! request for a line cancels the previous one. Cancellation is checked before the query runs,
//! after it finishes and again when the result is drained.

use crate::highlighter::{HighlightToken, SyntaxHighlighter};
use crate::layer::SyntaxSnapshot;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use synedit_core::{ByteRange, LineChangeSet, LineId};
use tracing::{trace, warn};

/// Handle to a submitted highlight request.
#[derive(Debug, Clone)]
pub struct HighlightTask {
    line: LineId,
    cancelled: Arc<AtomicBool>,
}

impl HighlightTask {
    /// The line being highlighted.
    pub fn line(&self) -> LineId {
        self.line
    }

    /// Cancel the request. Its result will not be delivered.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the request was cancelled, explicitly or by a newer request for the same line.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// What became of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightOutcome {
    /// Tokens to apply to the line's styled text.
    Ready {
        /// The highlighted line.
        line: LineId,
        /// Tokens in application order.
        tokens: Vec<HighlightToken>,
    },
    /// The request was cancelled or superseded; nothing should be applied.
    Cancelled {
        /// The line of the request.
        line: LineId,
    },
}

impl HighlightOutcome {
    /// The line the outcome belongs to.
    pub fn line(&self) -> LineId {
        match self {
            Self::Ready { line, .. } | Self::Cancelled { line } => *line,
        }
    }
}

struct Job {
    line: LineId,
    byte_range: ByteRange,
    snapshot: SyntaxSnapshot,
    cancelled: Arc<AtomicBool>,
}

struct Finished {
    line: LineId,
    tokens: Option<Vec<HighlightToken>>,
    cancelled: Arc<AtomicBool>,
}

type Slots = Arc<Mutex<HashMap<LineId, Arc<AtomicBool>>>>;

/// A single-worker highlight queue.
pub struct HighlightQueue {
    jobs: Option<Sender<Job>>,
    finished: Receiver<Finished>,
    slots: Slots,
    worker: Option<JoinHandle<()>>,
}

impl HighlightQueue {
    /// Start a queue whose worker uses `highlighter`.
    pub fn new(highlighter: SyntaxHighlighter) -> Self {
        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        let (finished_tx, finished_rx) = unbounded::<Finished>();
        let worker = std::thread::Builder::new()
            .name("synedit-highlight".to_string())
            .spawn(move || run_worker(highlighter, jobs_rx, finished_tx));
        let (jobs, worker) = match worker {
            Ok(worker) => (Some(jobs_tx), Some(worker)),
            Err(err) => {
                warn!(
                    target: "synedit::highlight",
                    error = %err,
                    "failed to start highlight worker; requests will be cancelled"
                );
                (None, None)
            }
        };
        Self {
            jobs,
            finished: finished_rx,
            slots: Arc::new(Mutex::new(HashMap::new())),
            worker,
        }
    }

    /// Queue highlighting of `byte_range` for `line`, cancelling any earlier request for it.
    pub fn submit(
        &self,
        line: LineId,
        byte_range: ByteRange,
        snapshot: SyntaxSnapshot,
    ) -> HighlightTask {
        let cancelled = Arc::new(AtomicBool::new(false));
        if let Some(previous) = self.slots.lock().insert(line, Arc::clone(&cancelled)) {
            previous.store(true, Ordering::Release);
        }
        let task = HighlightTask {
            line,
            cancelled: Arc::clone(&cancelled),
        };
        let job = Job {
            line,
            byte_range,
            snapshot,
            cancelled,
        };
        let sent = self.jobs.as_ref().is_some_and(|jobs| jobs.send(job).is_ok());
        if !sent {
            task.cancel();
        }
        task
    }

    /// Cancel the pending request for every line the change set touches.
    pub fn cancel_lines(&self, changes: &LineChangeSet) {
        let slots = self.slots.lock();
        for line in changes
            .edited_lines()
            .iter()
            .chain(changes.removed_lines())
            .chain(changes.inserted_lines())
        {
            if let Some(cancelled) = slots.get(line) {
                cancelled.store(true, Ordering::Release);
            }
        }
    }

    /// Cancel every pending request.
    pub fn cancel_all(&self) {
        for cancelled in self.slots.lock().values() {
            cancelled.store(true, Ordering::Release);
        }
    }

    /// Outcomes that finished since the last call, without blocking.
    pub fn drain(&self) -> Vec<HighlightOutcome> {
        self.finished
            .try_iter()
            .map(|finished| self.publish(finished))
            .collect()
    }

    /// Wait up to `timeout` for the next outcome.
    pub fn next_outcome(&self, timeout: Duration) -> Option<HighlightOutcome> {
        match self.finished.recv_timeout(timeout) {
            Ok(finished) => Some(self.publish(finished)),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    fn publish(&self, finished: Finished) -> HighlightOutcome {
        {
            let mut slots = self.slots.lock();
            if slots
                .get(&finished.line)
                .is_some_and(|current| Arc::ptr_eq(current, &finished.cancelled))
            {
                slots.remove(&finished.line);
            }
        }
        match finished.tokens {
            Some(tokens) if !finished.cancelled.load(Ordering::Acquire) => {
                HighlightOutcome::Ready {
                    line: finished.line,
                    tokens,
                }
            }
            _ => HighlightOutcome::Cancelled {
                line: finished.line,
            },
        }
    }
}

impl Drop for HighlightQueue {
    fn drop(&mut self) {
        self.cancel_all();
        self.jobs = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!(target: "synedit::highlight", "highlight worker panicked");
        }
    }
}

impl std::fmt::Debug for HighlightQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightQueue")
            .field("pending", &self.slots.lock().len())
            .finish_non_exhaustive()
    }
}

fn run_worker(highlighter: SyntaxHighlighter, jobs: Receiver<Job>, finished: Sender<Finished>) {
    for job in jobs {
        let is_cancelled = || job.cancelled.load(Ordering::Acquire);
        let tokens = if is_cancelled() {
            None
        } else {
            let captures = job.snapshot.captures(job.byte_range);
            let tokens = highlighter.tokens(&captures, job.byte_range);
            (!is_cancelled()).then_some(tokens)
        };
        trace!(
            target: "synedit::highlight",
            line = ?job.line,
            cancelled = tokens.is_none(),
            "highlight request finished"
        );
        let result = Finished {
            line: job.line,
            tokens,
            cancelled: job.cancelled,
        };
        if finished.send(result).is_err() {
            break;
        }
    }
}
