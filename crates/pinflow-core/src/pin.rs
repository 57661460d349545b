//! Typed pins and connections
//!
//! An [`InputPin`] receives values; an [`OutputPin`] broadcasts every emitted
//! value to the input pins connected to it, in connection order.
//!
//! Delivery is a plain synchronous call chain: `emit` calls `put` on each
//! target before returning, and the first error stops the fan-out and is
//! handed back to whoever started the push.
//!
//! Connecting pins into a cycle is not detected. A cyclic graph recurses on
//! the caller's stack until it overflows.
//!
//! # Example
//!
//! ```rust
//! use pinflow_core::pin::{bind, OutputPin};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let out = OutputPin::new();
//! let sink = seen.clone();
//! out.connect(bind(move |v: i32| {
//!     sink.borrow_mut().push(v);
//!     Ok(())
//! }));
//! out.emit(7).unwrap();
//! assert_eq!(*seen.borrow(), vec![7]);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;

/// A receiver of values of type `T`
pub trait InputPin<T> {
    /// Deliver a value, running all downstream work before returning
    fn put(&self, value: T) -> Result<()>;
}

/// Shared handle to an input pin
pub type Input<T> = Rc<dyn InputPin<T>>;

/// Input pin that forwards every value to a function
pub struct BoundPin<F> {
    function: F,
}

impl<T, F> InputPin<T> for BoundPin<F>
where
    F: Fn(T) -> Result<()>,
{
    fn put(&self, value: T) -> Result<()> {
        (self.function)(value)
    }
}

/// Build an input pin whose `put` calls `function`
pub fn bind<T, F>(function: F) -> Input<T>
where
    T: 'static,
    F: Fn(T) -> Result<()> + 'static,
{
    Rc::new(BoundPin { function })
}

/// Fan-out broadcaster owned by the node that emits on it
pub struct OutputPin<T> {
    targets: RefCell<Vec<Input<T>>>,
}

impl<T> OutputPin<T> {
    /// Create an output pin with no connections
    pub fn new() -> Self {
        Self {
            targets: RefCell::new(Vec::new()),
        }
    }

    /// Append `input` to the target list
    ///
    /// Duplicates are allowed; a pin connected twice receives every value twice.
    pub fn connect(&self, input: Input<T>) {
        self.targets.borrow_mut().push(input);
    }

    /// Number of connected input pins
    pub fn target_count(&self) -> usize {
        self.targets.borrow().len()
    }
}

impl<T: Clone> OutputPin<T> {
    /// Deliver `value` to every connected input pin in connection order
    ///
    /// The target list is read once, up front: pins connected while the
    /// emit is running only see later emissions. The first failing target
    /// aborts delivery to the remaining ones.
    pub fn emit(&self, value: T) -> Result<()> {
        let targets: Vec<Input<T>> = self.targets.borrow().clone();
        let Some((last, rest)) = targets.split_last() else {
            return Ok(());
        };
        for target in rest {
            target.put(value.clone())?;
        }
        last.put(value)
    }
}

impl<T> Default for OutputPin<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OutputPin<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPin")
            .field("targets", &self.target_count())
            .finish()
    }
}

/// Connect `output` to `input`
pub fn connect<T>(output: &OutputPin<T>, input: Input<T>) {
    output.connect(input);
}

/// A node exposing an input pin
pub trait HasInput<T> {
    /// The node's data input pin
    fn input(&self) -> Input<T>;
}

/// A node exposing an output pin
pub trait HasOutput<T> {
    /// The node's output pin
    fn output(&self) -> &OutputPin<T>;
}
