//! Gate: buffer while closed, release as one chunk on open
//!
//! A gate starts closed. Values put on its input while it is closed are
//! queued; opening the gate delivers the whole queue downstream as a single
//! [`Chunk`], in arrival order. While the gate is open each value passes
//! straight through as a one-element chunk.
//!
//! Output is always chunked so that everything admitted while the gate was
//! closed reaches downstream nodes together. A deduplicating converter
//! placed behind the gate, for example, sees all the duplicates that piled
//! up while waiting and can collapse them before delivery.
//!
//! ```text
//!            ┌────────────────┐
//!   In: T ──▶│ queue (closed) │──▶ Out: Vec<T>
//!            └────────────────┘
//!                    ▲
//!   State: Signal ───┘
//! ```
//!
//! The queue is unbounded. Callers bound how long a gate stays closed, not
//! how much it holds.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::pin::{HasInput, HasOutput, Input, OutputPin, bind};
use crate::transformer::{Stage, Transformer};

/// Group of values emitted together by a gate
pub type Chunk<T> = Vec<T>;

/// Control signal accepted on a gate's state pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Close the gate
    Close,
    /// Open the gate
    Open,
}

impl Signal {
    /// The opposite signal
    pub fn inverse(self) -> Self {
        match self {
            Self::Close => Self::Open,
            Self::Open => Self::Close,
        }
    }
}

/// Current state of a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    /// Values are queued
    #[default]
    Closed,
    /// Values pass through
    Open,
}

/// Queue and state of a gate
pub struct GateStage<T> {
    queue: RefCell<Vec<T>>,
    state: Cell<GateState>,
}

impl<T> GateStage<T> {
    /// Current state
    pub fn state(&self) -> GateState {
        self.state.get()
    }

    /// Number of queued values
    pub fn buffered(&self) -> usize {
        self.queue.borrow().len()
    }
}

impl<T: Clone> GateStage<T> {
    fn apply(&self, signal: Signal, out: &OutputPin<Chunk<T>>) -> Result<()> {
        match signal {
            Signal::Close => {
                if self.state.replace(GateState::Closed) == GateState::Open {
                    tracing::trace!("gate closed");
                }
                Ok(())
            }
            Signal::Open => {
                if self.state.replace(GateState::Open) == GateState::Closed {
                    tracing::trace!("gate opened");
                }
                self.flush(out)
            }
        }
    }

    fn flush(&self, out: &OutputPin<Chunk<T>>) -> Result<()> {
        let chunk = std::mem::take(&mut *self.queue.borrow_mut());
        if chunk.is_empty() {
            return Ok(());
        }
        tracing::trace!(values = chunk.len(), "flushing gate queue");
        out.emit(chunk)
    }
}

impl<T: Clone> Stage<T, Chunk<T>> for GateStage<T> {
    fn process(&self, value: T, out: &OutputPin<Chunk<T>>) -> Result<()> {
        match self.state.get() {
            GateState::Open => out.emit(vec![value]),
            GateState::Closed => {
                self.queue.borrow_mut().push(value);
                Ok(())
            }
        }
    }
}

impl<T> fmt::Debug for GateStage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateStage")
            .field("state", &self.state())
            .field("buffered", &self.buffered())
            .finish()
    }
}

/// A transformer from `T` to [`Chunk<T>`] with an open/close control pin
pub struct Gate<T> {
    inner: Transformer<T, Chunk<T>, GateStage<T>>,
    state: Input<Signal>,
}

impl<T: Clone + 'static> Gate<T> {
    /// Create a closed gate
    pub fn new() -> Self {
        let inner = Transformer::new(GateStage {
            queue: RefCell::new(Vec::new()),
            state: Cell::new(GateState::Closed),
        });
        let node = Rc::clone(&inner.node);
        let state = bind(move |signal: Signal| node.stage.apply(signal, &node.out));
        Self { inner, state }
    }
}

impl<T> Gate<T> {
    /// Control pin accepting [`Signal::Open`] and [`Signal::Close`]
    pub fn state(&self) -> Input<Signal> {
        Rc::clone(&self.state)
    }

    /// Whether the gate is currently open
    pub fn is_open(&self) -> bool {
        self.inner.stage().state() == GateState::Open
    }

    /// Number of values waiting for the gate to open
    pub fn buffered(&self) -> usize {
        self.inner.stage().buffered()
    }
}

impl<T: Clone + 'static> Default for Gate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> HasInput<T> for Gate<T> {
    fn input(&self) -> Input<T> {
        self.inner.input()
    }
}

impl<T> HasOutput<Chunk<T>> for Gate<T> {
    fn output(&self) -> &OutputPin<Chunk<T>> {
        self.inner.output()
    }
}

impl<T> fmt::Debug for Gate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("stage", self.inner.stage())
            .finish()
    }
}
