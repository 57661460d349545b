//! Converter: map every input value to one output value
//!
//! The conversion function is given to the constructor and can be replaced
//! later through the [`Converter::function`] pin. A replacement applies to
//! the next value put on the converter; a conversion already running
//! completes with the function it started with.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::pin::{HasInput, HasOutput, Input, OutputPin, bind};
use crate::transformer::{Stage, Transformer};

/// Shared conversion function
pub type ConvertFn<I, O> = Rc<dyn Fn(I) -> Result<O>>;

/// Holds the current conversion function
pub struct ConvertStage<I, O> {
    function: RefCell<ConvertFn<I, O>>,
}

impl<I, O> ConvertStage<I, O> {
    fn current(&self) -> ConvertFn<I, O> {
        Rc::clone(&self.function.borrow())
    }

    fn set(&self, function: ConvertFn<I, O>) {
        *self.function.borrow_mut() = function;
    }
}

impl<I, O: Clone> Stage<I, O> for ConvertStage<I, O> {
    fn process(&self, value: I, out: &OutputPin<O>) -> Result<()> {
        let function = self.current();
        let converted = function(value)?;
        out.emit(converted)
    }
}

impl<I, O> fmt::Debug for ConvertStage<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertStage").finish_non_exhaustive()
    }
}

/// A transformer applying a function to each value
pub struct Converter<I, O> {
    inner: Transformer<I, O, ConvertStage<I, O>>,
    function: Input<ConvertFn<I, O>>,
}

impl<I, O> Converter<I, O>
where
    I: 'static,
    O: Clone + 'static,
{
    /// Create a converter from a fallible function
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(I) -> Result<O> + 'static,
    {
        let inner = Transformer::new(ConvertStage {
            function: RefCell::new(Rc::new(function) as ConvertFn<I, O>),
        });
        let node = Rc::clone(&inner.node);
        let function = bind(move |f: ConvertFn<I, O>| {
            node.stage.set(f);
            Ok(())
        });
        Self { inner, function }
    }

    /// Replace the conversion function
    pub fn set_function<F>(&self, function: F) -> Result<()>
    where
        F: Fn(I) -> Result<O> + 'static,
    {
        self.function.put(Rc::new(function))
    }
}

impl<I, O> Converter<I, O> {
    /// Pin accepting a replacement conversion function
    pub fn function(&self) -> Input<ConvertFn<I, O>> {
        Rc::clone(&self.function)
    }
}

impl<I, O> HasInput<I> for Converter<I, O>
where
    I: 'static,
    O: Clone + 'static,
{
    fn input(&self) -> Input<I> {
        self.inner.input()
    }
}

impl<I, O> HasOutput<O> for Converter<I, O> {
    fn output(&self) -> &OutputPin<O> {
        self.inner.output()
    }
}

impl<I, O> fmt::Debug for Converter<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("out", self.inner.output())
            .finish()
    }
}
