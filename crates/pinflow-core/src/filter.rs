//! Filter: pass on the values a predicate accepts

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::pin::{HasInput, HasOutput, Input, OutputPin, bind};
use crate::transformer::{Stage, Transformer};

/// Shared filter predicate
pub type PredicateFn<T> = Rc<dyn Fn(&T) -> Result<bool>>;

/// Holds the current predicate
pub struct FilterStage<T> {
    predicate: RefCell<PredicateFn<T>>,
}

impl<T: Clone> Stage<T, T> for FilterStage<T> {
    fn process(&self, value: T, out: &OutputPin<T>) -> Result<()> {
        let predicate = Rc::clone(&self.predicate.borrow());
        if predicate(&value)? {
            out.emit(value)?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for FilterStage<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStage").finish_non_exhaustive()
    }
}

/// A transformer forwarding only values that satisfy a predicate
///
/// Filters hold no values, so replacing the predicate only affects values
/// put after the replacement.
pub struct Filter<T> {
    inner: Transformer<T, T, FilterStage<T>>,
    function: Input<PredicateFn<T>>,
}

impl<T: Clone + 'static> Filter<T> {
    /// Create a filter from a fallible predicate
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> Result<bool> + 'static,
    {
        let inner = Transformer::new(FilterStage {
            predicate: RefCell::new(Rc::new(predicate) as PredicateFn<T>),
        });
        let node = Rc::clone(&inner.node);
        let function = bind(move |p: PredicateFn<T>| {
            *node.stage.predicate.borrow_mut() = p;
            Ok(())
        });
        Self { inner, function }
    }

    /// Replace the predicate
    pub fn set_function<F>(&self, predicate: F) -> Result<()>
    where
        F: Fn(&T) -> Result<bool> + 'static,
    {
        self.function.put(Rc::new(predicate))
    }
}

impl<T> Filter<T> {
    /// Pin accepting a replacement predicate
    pub fn function(&self) -> Input<PredicateFn<T>> {
        Rc::clone(&self.function)
    }
}

impl<T: Clone + 'static> HasInput<T> for Filter<T> {
    fn input(&self) -> Input<T> {
        self.inner.input()
    }
}

impl<T> HasOutput<T> for Filter<T> {
    fn output(&self) -> &OutputPin<T> {
        self.inner.output()
    }
}

impl<T> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("out", self.inner.output())
            .finish()
    }
}
