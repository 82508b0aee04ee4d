//! Threaded interface for submitting and controlling inference runs.
//!
//! This module provides a minimal, thread-per-run runner that takes a
//! prepared set of facts and rules, drives a [`Session`] on a background
//! thread, and optionally streams newly asserted facts back to the caller.
//! It uses cooperative cancellation via an `Arc<AtomicBool>`, checked at
//! the cycle boundary the engine exposes; a cancelled run stops before its
//! next cycle, never in the middle of one.
//!
//! The goal is to keep threading concerns here without invasive changes to
//! the engine. Callers can submit runs and cancel them by id.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::agenda::Strategy;
use crate::construct::{Fact, RuleBase};
use crate::engine::{CycleOutcome, Halt, NullSink, Session};
use crate::error::Result;

/// Newly asserted facts stream out one per row, rendered to text.
#[derive(Debug, Clone)]
pub struct Row(pub String);

/// How many rows may sit unread before the producer blocks. Bounded so a
/// slow consumer backpressures the run instead of buffering it unboundedly.
const STREAM_BUFFER: usize = 64;

/// Cancellation token shared with the worker thread.
#[derive(Debug)]
pub struct CancelToken(Arc<AtomicBool>);
impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
    pub fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// Opaque run identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(u64);

/// What a finished (or cancelled) run amounted to.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// None when the run was cancelled before reaching a halt.
    pub halt: Option<Halt>,
    pub cycles: usize,
    pub cancelled: bool,
    pub memory_size: usize,
}

/// Handle to a running or completed inference run.
pub struct RunHandle {
    pub id: RunId,
    cancel: CancelToken,
    started: Instant,
    join: Option<JoinHandle<Result<RunSummary>>>,
    pub results: Option<Receiver<Row>>, // None when streaming is off
}
impl RunHandle {
    /// Request cancellation (cooperative). The worker observes it at its
    /// next cycle boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
    /// Wait for the run to finish and take its summary.
    pub fn join(mut self) -> Option<Result<RunSummary>> {
        self.join.take().and_then(|j| j.join().ok())
    }
    /// Elapsed time since submission.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Run submission options.
pub struct RunOptions {
    pub stream_results: bool,
    pub step_limit: Option<usize>,
}
impl Default for RunOptions {
    fn default() -> Self {
        Self {
            stream_results: true,
            step_limit: None,
        }
    }
}

/// Registry managing run lifecycles. Sessions stay exclusively owned by
/// their worker thread; the registry only holds cancellation tokens.
pub struct RunInterface {
    next_id: Mutex<u64>,
    active: Mutex<HashMap<RunId, CancelToken>>,
}

impl RunInterface {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(0),
            active: Mutex::new(HashMap::new()),
        }
    }

    fn allocate_id(&self) -> RunId {
        let mut g = self.next_id.lock().unwrap();
        *g += 1;
        RunId(*g)
    }

    /// Submit an inference run for execution on a background thread. When
    /// `options.stream_results` is true, a channel of newly asserted facts
    /// is returned on the handle.
    pub fn submit(
        &self,
        facts: Vec<Fact>,
        rule_base: Arc<RuleBase>,
        strategy: Strategy,
        options: RunOptions,
    ) -> RunHandle {
        let id = self.allocate_id();
        let cancel = CancelToken::new();
        self.active.lock().unwrap().insert(id, cancel.clone());

        let (tx, rx) = if options.stream_results {
            let (tx, rx) = mpsc::sync_channel(STREAM_BUFFER);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let cancel_for_thread = cancel.clone();
        let step_limit = options.step_limit;
        let join = std::thread::spawn(move || {
            let mut session = Session::new(facts, rule_base, strategy, step_limit);
            let mut sink = NullSink;
            let mut halt = None;
            let mut cancelled = false;
            loop {
                if cancel_for_thread.is_cancelled() {
                    cancelled = true;
                    break;
                }
                match session.cycle(&mut sink)? {
                    CycleOutcome::Halted(h) => {
                        halt = Some(h);
                        break;
                    }
                    CycleOutcome::Fired { asserted, .. } => {
                        if let Some(tx) = &tx {
                            for fact in asserted {
                                // a dropped receiver just means nobody is
                                // watching anymore
                                let _ = tx.send(Row(fact.to_string()));
                            }
                        }
                    }
                }
            }
            Ok(RunSummary {
                halt,
                cycles: session.fired_keys().len(),
                cancelled,
                memory_size: session.memory().len(),
            })
        });

        RunHandle {
            id,
            cancel,
            started: Instant::now(),
            join: Some(join),
            results: rx,
        }
    }

    /// Run to completion synchronously on the current thread, returning the
    /// session for follow-up queries (explanation, fired keys) along with
    /// the halt reason.
    pub fn run_sync(
        &self,
        facts: Vec<Fact>,
        rule_base: Arc<RuleBase>,
        strategy: Strategy,
        step_limit: Option<usize>,
    ) -> Result<(Session, Halt)> {
        let mut session = Session::new(facts, rule_base, strategy, step_limit);
        let halt = session.infer(&mut NullSink)?;
        Ok((session, halt))
    }

    /// Cancel a run by id.
    pub fn cancel(&self, id: RunId) -> bool {
        if let Some(tok) = self.active.lock().unwrap().get(&id) {
            tok.cancel();
            true
        } else {
            false
        }
    }
}

impl Default for RunInterface {
    fn default() -> Self {
        Self::new()
    }
}
