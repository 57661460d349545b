//! Transformer base
//!
//! A [`Transformer`] couples one input pin to one output pin through a
//! [`Stage`]. The input pin is bound when the transformer is built; every
//! value put on it is handed to the stage together with the output pin, and
//! the stage decides what (if anything) to emit.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::Result;
use crate::pin::{HasInput, HasOutput, Input, InputPin, OutputPin};

/// Per-node processing logic of a transformer
pub trait Stage<I, O> {
    /// Handle one input value, emitting on `out` zero or more times
    fn process(&self, value: I, out: &OutputPin<O>) -> Result<()>;
}

/// Stage and output pin shared between a transformer and its input pins
pub(crate) struct Node<I, O, S> {
    pub(crate) stage: S,
    pub(crate) out: OutputPin<O>,
    _input: PhantomData<fn(I)>,
}

impl<I, O, S> InputPin<I> for Node<I, O, S>
where
    S: Stage<I, O>,
{
    fn put(&self, value: I) -> Result<()> {
        self.stage.process(value, &self.out)
    }
}

/// A node with one input pin, one output pin and a processing stage
pub struct Transformer<I, O, S> {
    pub(crate) node: Rc<Node<I, O, S>>,
}

impl<I, O, S> Transformer<I, O, S>
where
    I: 'static,
    O: 'static,
    S: Stage<I, O> + 'static,
{
    /// Build a transformer around `stage`
    pub fn new(stage: S) -> Self {
        Self {
            node: Rc::new(Node {
                stage,
                out: OutputPin::new(),
                _input: PhantomData,
            }),
        }
    }
}

impl<I, O, S> Transformer<I, O, S> {
    /// The processing stage
    pub fn stage(&self) -> &S {
        &self.node.stage
    }
}

impl<I, O, S> HasInput<I> for Transformer<I, O, S>
where
    I: 'static,
    O: 'static,
    S: Stage<I, O> + 'static,
{
    fn input(&self) -> Input<I> {
        self.node.clone()
    }
}

impl<I, O, S> HasOutput<O> for Transformer<I, O, S> {
    fn output(&self) -> &OutputPin<O> {
        &self.node.out
    }
}

impl<I, O, S> Clone for Transformer<I, O, S> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<I, O, S: fmt::Debug> fmt::Debug for Transformer<I, O, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("stage", &self.node.stage)
            .field("out", &self.node.out)
            .finish()
    }
}
