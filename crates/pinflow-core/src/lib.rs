//! pinflow Core Library
//!
//! This crate provides in-process dataflow wiring:
//! - Typed input and output pins with ordered fan-out
//! - Transformers: converters, filters and gates
//! - Actors terminating a branch of the graph
//! - Nestable open/close controllers for gates
//!
//! Everything runs synchronously on the caller's stack. A `put` on an input
//! pin returns once every downstream node has handled the value, and the
//! first error raised by a user function is returned from that `put`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────┐     ┌─────────┐     ┌─────────┐     ┌─────────┐
//! │  Input  │────▶│  Gate   │────▶│ Convert │────▶│  Actor  │
//! │   pin   │     │ (chunk) │     │ Filter  │     │ (sink)  │
//! └─────────┘     └─────────┘     └─────────┘     └─────────┘
//!                      ▲
//!               Signal │ (nestable opener / closer)
//! ```
//!
//! # Example
//!
//! ```rust
//! use pinflow_core::flow::{self, FlowConnect};
//! use pinflow_core::{GateControl, HasInput, HasOutput};
//!
//! let gate = flow::gate::<i32>();
//! gate.output().act(|chunk| {
//!     println!("released {:?}", chunk);
//!     Ok(())
//! });
//!
//! gate.input().put(1)?;
//! gate.input().put(2)?;
//! let _open = gate.state().opener()?; // releases [1, 2]
//! # Ok::<(), pinflow_core::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actor;
pub mod converter;
pub mod error;
pub mod filter;
pub mod flow;
pub mod gate;
pub mod nestable;
pub mod pin;
pub mod transformer;

pub use actor::Actor;
pub use converter::Converter;
pub use error::{Error, Result};
pub use filter::Filter;
pub use gate::{Chunk, Gate, Signal};
pub use nestable::{GateControl, NestableCloser, NestableOpener, SignalGuard};
pub use pin::{HasInput, HasOutput, Input, InputPin, OutputPin, bind, connect};
pub use transformer::{Stage, Transformer};
