//! Delimiter buffer for reassembling fragmented protocol lines.
//!
//! The codec delivers text over a byte stream with no framing guarantees:
//! a single read may contain half a line, several lines, or a line split
//! across arbitrary fragment boundaries. [`DelimiterBuffer`] accepts those
//! fragments and emits complete delimiter-terminated lines, in arrival
//! order, to an injected [`LineSink`].
//!
//! # Concurrency
//!
//! `enqueue` may be called from any thread. Fragments are pushed onto a
//! FIFO queue under a mutex; a `draining` flag under the same lock ensures
//! at most one drain runs system-wide. If a drain is already running, the
//! enqueueing caller just leaves its fragment on the queue - the running
//! drain picks it up. Lines are emitted to the sink outside the lock.
//!
//! `clear` is a blocking, cooperative cancellation: it raises a `clearing`
//! flag and waits for any in-flight drain to observe it and stop before
//! discarding the backlog and the partial-line accumulator.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Receives each completed line from a [`DelimiterBuffer`].
///
/// Called synchronously from whichever thread is running the drain.
/// Implementations must not call [`DelimiterBuffer::clear`] reentrantly;
/// `clear` waits for the drain to finish and would deadlock on itself.
pub trait LineSink: Send + Sync {
    /// Handle one completed line, trimmed of its delimiter.
    fn on_line(&self, line: &str);
}

impl<F> LineSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn on_line(&self, line: &str) {
        self(line)
    }
}

/// Mutable buffer state, all guarded by one lock.
struct State {
    /// Fragments waiting to be drained, FIFO.
    queue: VecDeque<String>,
    /// Partial line accumulated across fragments, awaiting a delimiter.
    accum: String,
    /// True while a drain owns the queue.
    draining: bool,
    /// True while a clear is waiting; drains must stop consuming.
    clearing: bool,
}

/// Reassembles delimiter-terminated lines from arbitrary text fragments.
///
/// Has no protocol knowledge: it only splits on the configured delimiter.
/// Unterminated trailing text stays buffered until a future fragment
/// supplies the delimiter. No input is ever malformed.
pub struct DelimiterBuffer {
    state: Mutex<State>,
    /// Signalled whenever `draining` goes false.
    idle: Condvar,
    delimiter: char,
    /// Whether zero-length lines are passed to the sink.
    pass_empty: bool,
    sink: Arc<dyn LineSink>,
}

impl DelimiterBuffer {
    /// Create a buffer that splits on `delimiter` and suppresses empty lines.
    pub fn new(delimiter: char, sink: Arc<dyn LineSink>) -> Self {
        Self::with_options(delimiter, false, sink)
    }

    /// Create a buffer with explicit empty-line handling.
    pub fn with_options(delimiter: char, pass_empty: bool, sink: Arc<dyn LineSink>) -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                accum: String::new(),
                draining: false,
                clearing: false,
            }),
            idle: Condvar::new(),
            delimiter,
            pass_empty,
            sink,
        }
    }

    /// Queue a raw text fragment and drain any completed lines.
    ///
    /// If another thread is already draining, the fragment is left on the
    /// queue for that drain to pick up and this call returns immediately.
    pub fn enqueue(&self, fragment: &str) {
        {
            let mut state = self.lock();
            state.queue.push_back(fragment.to_string());

            if state.draining {
                return;
            }
            state.draining = true;
        }

        self.drain();
    }

    /// Discard all queued fragments and the partial-line accumulator.
    ///
    /// Blocks until any in-flight drain observes the clearing flag and
    /// stops; lines emitted before this call are unaffected. Must not be
    /// called from inside a [`LineSink`] callback.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.clearing = true;

        while state.draining {
            state = self
                .idle
                .wait(state)
                .unwrap_or_else(|poison| poison.into_inner());
        }

        state.queue.clear();
        state.accum.clear();
        state.clearing = false;
    }

    /// Number of characters buffered awaiting a delimiter.
    pub fn pending_len(&self) -> usize {
        self.lock().accum.len()
    }

    /// Whether nothing is buffered or queued.
    pub fn is_empty(&self) -> bool {
        let state = self.lock();
        state.accum.is_empty() && state.queue.is_empty()
    }

    /// Work through queued fragments, emitting completed lines to the sink.
    ///
    /// Caller must have set `draining` under the lock. Exactly one drain
    /// runs at a time, so the accumulator is only ever touched here.
    fn drain(&self) {
        loop {
            let fragment = {
                let mut state = self.lock();
                if state.clearing {
                    break;
                }
                match state.queue.pop_front() {
                    Some(fragment) => fragment,
                    None => break,
                }
            };

            let lines = {
                let mut state = self.lock();
                self.split_fragment(&mut state, &fragment)
            };

            for line in lines {
                self.sink.on_line(&line);
            }
        }

        let mut state = self.lock();
        state.draining = false;
        self.idle.notify_all();
    }

    /// Split one fragment on the delimiter, carrying partial text in the
    /// accumulator. A fragment may complete zero, one, or many lines.
    fn split_fragment(&self, state: &mut State, fragment: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = fragment;

        while let Some(index) = rest.find(self.delimiter) {
            state.accum.push_str(&rest[..index]);
            rest = &rest[index + self.delimiter.len_utf8()..];

            let line = std::mem::take(&mut state.accum);
            if self.pass_empty || !line.is_empty() {
                lines.push(line);
            }
        }

        state.accum.push_str(rest);
        lines
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}
