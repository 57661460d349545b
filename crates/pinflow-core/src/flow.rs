//! Node factories and fluent wiring helpers
//!
//! The factories build unconnected nodes. [`FlowConnect`] builds a node and
//! connects it behind an existing output pin in one call:
//!
//! ```rust
//! use pinflow_core::flow::{self, ChunkConnect, FlowConnect};
//! use pinflow_core::{GateControl, HasInput, HasOutput};
//!
//! let gate = flow::gate::<u32>();
//! let dedup = gate.output().deduplicate();
//! dedup.output().act(|chunk| {
//!     assert_eq!(chunk, vec![1, 2]);
//!     Ok(())
//! });
//!
//! for v in [1, 2, 1, 2] {
//!     gate.input().put(v)?;
//! }
//! gate.state().open()?;
//! # Ok::<(), pinflow_core::Error>(())
//! ```

use std::collections::HashSet;
use std::hash::Hash;

use crate::actor::Actor;
use crate::converter::Converter;
use crate::error::Result;
use crate::filter::Filter;
use crate::gate::{Chunk, Gate};
use crate::pin::{HasInput, OutputPin};

/// Create a closed gate
pub fn gate<T: Clone + 'static>() -> Gate<T> {
    Gate::new()
}

/// Create a converter
pub fn convert<I, O, F>(function: F) -> Converter<I, O>
where
    I: 'static,
    O: Clone + 'static,
    F: Fn(I) -> Result<O> + 'static,
{
    Converter::new(function)
}

/// Create a filter
pub fn filter<T, F>(predicate: F) -> Filter<T>
where
    T: Clone + 'static,
    F: Fn(&T) -> Result<bool> + 'static,
{
    Filter::new(predicate)
}

/// Create an actor
pub fn act<T, F>(action: F) -> Actor<T>
where
    T: 'static,
    F: Fn(T) -> Result<()> + 'static,
{
    Actor::new(action)
}

/// Drop repeated values from a chunk, keeping first occurrences in order
pub fn distinct<T: Eq + Hash + Clone>(chunk: Chunk<T>) -> Chunk<T> {
    let mut seen = HashSet::with_capacity(chunk.len());
    chunk
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// Build a node and connect it behind an output pin
pub trait FlowConnect<T> {
    /// Connect a converter applying `function`
    fn convert<O, F>(&self, function: F) -> Converter<T, O>
    where
        O: Clone + 'static,
        F: Fn(T) -> Result<O> + 'static;

    /// Connect a filter applying `predicate`
    fn filter<F>(&self, predicate: F) -> Filter<T>
    where
        F: Fn(&T) -> Result<bool> + 'static;

    /// Connect an actor running `action`, returning this same output pin
    fn act<F>(&self, action: F) -> &Self
    where
        F: Fn(T) -> Result<()> + 'static;
}

impl<T: Clone + 'static> FlowConnect<T> for OutputPin<T> {
    fn convert<O, F>(&self, function: F) -> Converter<T, O>
    where
        O: Clone + 'static,
        F: Fn(T) -> Result<O> + 'static,
    {
        let converter = Converter::new(function);
        self.connect(converter.input());
        converter
    }

    fn filter<F>(&self, predicate: F) -> Filter<T>
    where
        F: Fn(&T) -> Result<bool> + 'static,
    {
        let filter = Filter::new(predicate);
        self.connect(filter.input());
        filter
    }

    fn act<F>(&self, action: F) -> &Self
    where
        F: Fn(T) -> Result<()> + 'static,
    {
        let actor = Actor::new(action);
        self.connect(actor.input());
        self
    }
}

/// Chunk-specific wiring helpers
pub trait ChunkConnect<T> {
    /// Connect a converter that removes duplicates from each chunk
    fn deduplicate(&self) -> Converter<Chunk<T>, Chunk<T>>;
}

impl<T: Eq + Hash + Clone + 'static> ChunkConnect<T> for OutputPin<Chunk<T>> {
    fn deduplicate(&self) -> Converter<Chunk<T>, Chunk<T>> {
        self.convert(|chunk| Ok(distinct(chunk)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::HasOutput;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_distinct_keeps_first_occurrence_order() {
        assert_eq!(distinct(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(distinct(Vec::<u8>::new()).is_empty());
    }

    #[test]
    fn test_act_returns_same_output_for_chaining() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let source = convert(|v: i32| Ok(v));
        let (a, b) = (log.clone(), log.clone());
        source
            .output()
            .act(move |v| {
                a.borrow_mut().push(("a", v));
                Ok(())
            })
            .act(move |v| {
                b.borrow_mut().push(("b", v));
                Ok(())
            });
        assert_eq!(source.output().target_count(), 2);

        source.input().put(9).unwrap();
        assert_eq!(*log.borrow(), vec![("a", 9), ("b", 9)]);
    }

    #[test]
    fn test_filter_from_output() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let source = convert(|v: i32| Ok(v * 2));
        let sink = log.clone();
        source
            .output()
            .filter(|v| Ok(*v > 4))
            .output()
            .act(move |v| {
                sink.borrow_mut().push(v);
                Ok(())
            });

        for v in 1..=4 {
            source.input().put(v).unwrap();
        }
        assert_eq!(*log.borrow(), vec![6, 8]);
    }

    #[test]
    fn test_deduplicate_behind_gate() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let entry = gate::<&str>();
        let sink = log.clone();
        let dedup = entry.output().deduplicate();
        dedup.output().act(move |chunk| {
            sink.borrow_mut().push(chunk);
            Ok(())
        });

        for v in ["a", "b", "a", "c", "b"] {
            entry.input().put(v).unwrap();
        }
        entry.state().put(crate::gate::Signal::Open).unwrap();
        assert_eq!(*log.borrow(), vec![vec!["a", "b", "c"]]);
    }
}
