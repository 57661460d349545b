//! Nestable gate controllers
//!
//! Several independent callers may each need a gate open (or closed) for a
//! while. A nestable controller counts their requests and forwards a signal
//! to the gate's state pin only when the net demand changes:
//!
//! - [`NestableOpener`] forwards `Open` when its counter goes 0→1 and `Close`
//!   when it returns 1→0.
//! - [`NestableCloser`] is the mirror image, counting `Close` requests.
//!
//! A releasing signal that has no matching acquisition is a caller bug. It is
//! rejected with [`Error::UnbalancedSignal`] and the counter is left as it
//! was.
//!
//! [`GateControl::opener`] and [`GateControl::closer`] send a signal right
//! away and return a [`SignalGuard`] that sends the inverse exactly once.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::gate::Signal;
use crate::pin::{Input, InputPin};

/// Reference counter over one control pin
struct Nesting {
    kind: &'static str,
    acquire: Signal,
    depth: Cell<i64>,
    target: Input<Signal>,
}

impl Nesting {
    fn new(kind: &'static str, acquire: Signal, target: Input<Signal>) -> Self {
        Self {
            kind,
            acquire,
            depth: Cell::new(0),
            target,
        }
    }

    fn signal(&self, signal: Signal) -> Result<()> {
        let depth = self.depth.get();
        if signal == self.acquire {
            let next = depth
                .checked_add(1)
                .ok_or(Error::CounterOverflow { controller: self.kind })?;
            self.depth.set(next);
            tracing::trace!(controller = self.kind, depth = next, "nested acquire");
            if next == 1 {
                return self.target.put(signal);
            }
        } else {
            if depth == 0 {
                return Err(Error::UnbalancedSignal {
                    controller: self.kind,
                    signal,
                });
            }
            let next = depth - 1;
            self.depth.set(next);
            tracing::trace!(controller = self.kind, depth = next, "nested release");
            if next == 0 {
                return self.target.put(signal);
            }
        }
        Ok(())
    }
}

/// Counts `Open` requests; the gate stays open while any are outstanding
pub struct NestableOpener {
    nesting: Nesting,
}

impl NestableOpener {
    /// Wrap a gate's state pin
    pub fn new(target: Input<Signal>) -> Self {
        Self {
            nesting: Nesting::new("nestable opener", Signal::Open, target),
        }
    }

    /// Number of outstanding `Open` requests
    pub fn depth(&self) -> i64 {
        self.nesting.depth.get()
    }
}

impl InputPin<Signal> for NestableOpener {
    fn put(&self, signal: Signal) -> Result<()> {
        self.nesting.signal(signal)
    }
}

impl fmt::Debug for NestableOpener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestableOpener")
            .field("depth", &self.depth())
            .finish()
    }
}

/// Counts `Close` requests; the gate stays closed while any are outstanding
pub struct NestableCloser {
    nesting: Nesting,
}

impl NestableCloser {
    /// Wrap a gate's state pin
    pub fn new(target: Input<Signal>) -> Self {
        Self {
            nesting: Nesting::new("nestable closer", Signal::Close, target),
        }
    }

    /// Number of outstanding `Close` requests
    pub fn depth(&self) -> i64 {
        self.nesting.depth.get()
    }
}

impl InputPin<Signal> for NestableCloser {
    fn put(&self, signal: Signal) -> Result<()> {
        self.nesting.signal(signal)
    }
}

impl fmt::Debug for NestableCloser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestableCloser")
            .field("depth", &self.depth())
            .finish()
    }
}

/// Sends the inverse of an acquired signal when released
///
/// Call [`SignalGuard::release`] to observe the error of the releasing
/// signal. A guard dropped without release sends the signal from `Drop`
/// and can only log a failure.
#[must_use = "dropping the guard immediately sends the inverse signal"]
pub struct SignalGuard {
    pin: Option<Input<Signal>>,
    signal: Signal,
}

impl SignalGuard {
    /// Send the inverse signal now
    pub fn release(mut self) -> Result<()> {
        match self.pin.take() {
            Some(pin) => pin.put(self.signal),
            None => Ok(()),
        }
    }

    /// The signal this guard sends on release
    pub fn signal(&self) -> Signal {
        self.signal
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        if let Some(pin) = self.pin.take()
            && let Err(err) = pin.put(self.signal)
        {
            tracing::warn!(signal = ?self.signal, error = %err, "signal guard release failed");
        }
    }
}

impl fmt::Debug for SignalGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalGuard")
            .field("signal", &self.signal)
            .field("released", &self.pin.is_none())
            .finish()
    }
}

/// Convenience operations on a gate's state pin
pub trait GateControl {
    /// Send [`Signal::Open`]
    fn open(&self) -> Result<()>;

    /// Send [`Signal::Close`]
    fn close(&self) -> Result<()>;

    /// Wrap this pin in a [`NestableOpener`]
    fn nestable_opener(&self) -> Rc<NestableOpener>;

    /// Wrap this pin in a [`NestableCloser`]
    fn nestable_closer(&self) -> Rc<NestableCloser>;

    /// Open now, close when the returned guard is released
    fn opener(&self) -> Result<SignalGuard>;

    /// Close now, open when the returned guard is released
    fn closer(&self) -> Result<SignalGuard>;
}

impl GateControl for Input<Signal> {
    fn open(&self) -> Result<()> {
        self.put(Signal::Open)
    }

    fn close(&self) -> Result<()> {
        self.put(Signal::Close)
    }

    fn nestable_opener(&self) -> Rc<NestableOpener> {
        Rc::new(NestableOpener::new(Rc::clone(self)))
    }

    fn nestable_closer(&self) -> Rc<NestableCloser> {
        Rc::new(NestableCloser::new(Rc::clone(self)))
    }

    fn opener(&self) -> Result<SignalGuard> {
        guard(self, Signal::Open)
    }

    fn closer(&self) -> Result<SignalGuard> {
        guard(self, Signal::Close)
    }
}

fn guard(pin: &Input<Signal>, acquire: Signal) -> Result<SignalGuard> {
    pin.put(acquire)?;
    Ok(SignalGuard {
        pin: Some(Rc::clone(pin)),
        signal: acquire.inverse(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pin::bind;
    use std::cell::RefCell;

    fn recording_pin() -> (Input<Signal>, Rc<RefCell<Vec<Signal>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let pin = bind(move |s: Signal| {
            sink.borrow_mut().push(s);
            Ok(())
        });
        (pin, log)
    }

    #[test]
    fn test_counter_overflow_leaves_depth_unchanged() {
        let (pin, log) = recording_pin();
        let nesting = Nesting {
            kind: "nestable opener",
            acquire: Signal::Open,
            depth: Cell::new(i64::MAX),
            target: pin,
        };

        assert!(matches!(
            nesting.signal(Signal::Open),
            Err(Error::CounterOverflow {
                controller: "nestable opener"
            })
        ));
        assert_eq!(nesting.depth.get(), i64::MAX);
        assert!(log.borrow().is_empty());

        nesting.signal(Signal::Close).unwrap();
        assert_eq!(nesting.depth.get(), i64::MAX - 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_opener_forwards_on_edges_only() {
        let (pin, log) = recording_pin();
        let opener = pin.nestable_opener();

        opener.put(Signal::Open).unwrap();
        opener.put(Signal::Open).unwrap();
        assert_eq!(*log.borrow(), vec![Signal::Open]);
        assert_eq!(opener.depth(), 2);

        opener.put(Signal::Close).unwrap();
        assert_eq!(*log.borrow(), vec![Signal::Open]);
        opener.put(Signal::Close).unwrap();
        assert_eq!(*log.borrow(), vec![Signal::Open, Signal::Close]);
        assert_eq!(opener.depth(), 0);
    }

    #[test]
    fn test_closer_mirrors_opener() {
        let (pin, log) = recording_pin();
        let closer = pin.nestable_closer();

        closer.put(Signal::Close).unwrap();
        closer.put(Signal::Close).unwrap();
        closer.put(Signal::Open).unwrap();
        assert_eq!(*log.borrow(), vec![Signal::Close]);
        closer.put(Signal::Open).unwrap();
        assert_eq!(*log.borrow(), vec![Signal::Close, Signal::Open]);
    }

    #[test]
    fn test_unbalanced_release_is_rejected() {
        let (pin, log) = recording_pin();
        let opener = pin.nestable_opener();

        let err = opener.put(Signal::Close).unwrap_err();
        assert!(matches!(
            err,
            Error::UnbalancedSignal {
                signal: Signal::Close,
                ..
            }
        ));
        assert_eq!(opener.depth(), 0);
        assert!(log.borrow().is_empty());

        let closer = pin.nestable_closer();
        assert!(closer.put(Signal::Open).is_err());
        assert_eq!(closer.depth(), 0);
    }

    #[test]
    fn test_guard_release_sends_inverse_once() {
        let (pin, log) = recording_pin();
        let guard = pin.opener().unwrap();
        assert_eq!(guard.signal(), Signal::Close);
        guard.release().unwrap();
        assert_eq!(*log.borrow(), vec![Signal::Open, Signal::Close]);
    }

    #[test]
    fn test_guard_drop_sends_inverse() {
        let (pin, log) = recording_pin();
        {
            let _guard = pin.closer().unwrap();
            assert_eq!(*log.borrow(), vec![Signal::Close]);
        }
        assert_eq!(*log.borrow(), vec![Signal::Close, Signal::Open]);
    }

    #[test]
    fn test_guard_releases_during_unwind() {
        let (pin, log) = recording_pin();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = pin.opener().unwrap();
            panic!("operation failed");
        }));
        assert!(result.is_err());
        assert_eq!(*log.borrow(), vec![Signal::Open, Signal::Close]);
    }

    #[test]
    fn test_guard_over_nestable_opener() {
        let (pin, log) = recording_pin();
        let opener: Input<Signal> = pin.nestable_opener();

        let outer = opener.opener().unwrap();
        let inner = opener.opener().unwrap();
        inner.release().unwrap();
        assert_eq!(*log.borrow(), vec![Signal::Open]);
        outer.release().unwrap();
        assert_eq!(*log.borrow(), vec![Signal::Open, Signal::Close]);
    }
}
