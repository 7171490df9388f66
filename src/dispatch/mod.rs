pub(crate) mod chain;
pub(crate) mod pipeline;

use std::rc::Rc;

use crate::errors::HandlerError;

/// What a continuation carries back into a step machine.
#[derive(Debug)]
pub(crate) enum Signal {
    Continue,
    Error(HandlerError),
    /// Abandon the current route's remaining handlers and resume the layer
    /// loop with nothing in flight.
    SkipRoute,
}

/// A dispatch state machine: an ordered list of work plus a cursor, advanced
/// only through `step`. Implementations check their cancellation flag before
/// doing anything, so a continuation driven after completion is a no-op.
pub(crate) trait Stepper {
    fn step(self: Rc<Self>, signal: Signal);
}

/// The continuation a handler must drive to hand control back. One-shot by
/// construction: it is consumed by whichever of the three calls is made.
/// Holding it across asynchronous work is fine; the owning machine will not
/// advance until it fires.
pub struct Next {
    target: Rc<dyn Stepper>,
}

impl Next {
    pub(crate) fn new(target: Rc<dyn Stepper>) -> Self {
        Self { target }
    }

    /// Advance with no error in flight.
    pub fn ok(self) {
        self.target.step(Signal::Continue);
    }

    /// Advance carrying `error`; request handlers downstream are skipped
    /// until an error handler (or the terminal callback) consumes it.
    pub fn err(self, error: HandlerError) {
        self.target.step(Signal::Error(error));
    }

    /// Skip the rest of the current route's chain and continue with the
    /// next layer, clearing anything in flight.
    pub fn skip_route(self) {
        self.target.step(Signal::SkipRoute);
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Next")
    }
}
