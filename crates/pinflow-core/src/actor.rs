//! Actor: a sink that runs a side effect for every value

use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::pin::{HasInput, Input, bind};

/// A node with one input pin and no output
///
/// Used to terminate a branch of the graph. Errors from the action reach the
/// caller of `put` unchanged.
pub struct Actor<T> {
    input: Input<T>,
}

impl<T: 'static> Actor<T> {
    /// Create an actor from a fallible action
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(T) -> Result<()> + 'static,
    {
        Self {
            input: bind(action),
        }
    }
}

impl<T> HasInput<T> for Actor<T> {
    fn input(&self) -> Input<T> {
        Rc::clone(&self.input)
    }
}

impl<T> fmt::Debug for Actor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    #[test]
    fn test_actor_runs_action() {
        let total = Rc::new(Cell::new(0));
        let sum = total.clone();
        let actor = Actor::new(move |v: i32| {
            sum.set(sum.get() + v);
            Ok(())
        });
        actor.input().put(2).unwrap();
        actor.input().put(3).unwrap();
        assert_eq!(total.get(), 5);
    }

    #[test]
    fn test_actor_error_reaches_caller() {
        let actor = Actor::new(|_: ()| Err(Error::callback("side effect failed")));
        assert!(actor.input().put(()).is_err());
    }
}
