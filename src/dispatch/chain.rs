use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::errors::HandlerError;
use crate::handler::Handler;
use crate::structures::Context;

use super::{Next, Signal, Stepper};

/// Runs one route's effective handler list in order with error-first
/// semantics. Exhaustion hands the outcome to the outer continuation.
pub(crate) struct HandlerChain {
    handlers: Vec<Handler>,
    ctx: Context,
    cursor: Cell<usize>,
    cancelled: Cell<bool>,
    generation: Cell<u64>,
    outer: RefCell<Option<Next>>,
}

impl HandlerChain {
    pub(crate) fn run(handlers: Vec<Handler>, ctx: Context, outer: Next) {
        let chain = Rc::new(Self {
            handlers,
            ctx,
            cursor: Cell::new(0),
            cancelled: Cell::new(false),
            generation: Cell::new(0),
            outer: RefCell::new(Some(outer)),
        });
        chain.step(Signal::Continue);
    }

    fn finish(&self, error: Option<HandlerError>) {
        self.cancelled.set(true);
        if let Some(next) = self.outer.borrow_mut().take() {
            match error {
                Some(err) => next.err(err),
                None => next.ok(),
            }
        }
    }
}

impl Stepper for HandlerChain {
    fn step(self: Rc<Self>, signal: Signal) {
        if self.cancelled.get() {
            return;
        }
        self.generation.set(self.generation.get() + 1);

        let mut error = match signal {
            Signal::Continue => None,
            Signal::Error(err) => Some(err),
            Signal::SkipRoute => {
                tracing::trace!("abandoning remainder of route chain");
                return self.finish(None);
            }
        };

        loop {
            let idx = self.cursor.get();
            self.cursor.set(idx + 1);

            let Some(handler) = self.handlers.get(idx) else {
                return self.finish(error);
            };

            match (handler, error.take()) {
                (Handler::Request(f), None) => {
                    let marker = self.generation.get();
                    let next = Next::new(self.clone());
                    if let Err(raised) = f(&self.ctx, next) {
                        if self.generation.get() == marker && !self.cancelled.get() {
                            error = Some(raised);
                            continue;
                        }
                        tracing::warn!(
                            error = %raised,
                            "handler returned an error after driving its continuation; dropping it"
                        );
                    }
                    return;
                }
                (Handler::Error(f), Some(current)) => {
                    let marker = self.generation.get();
                    let next = Next::new(self.clone());
                    if let Err(raised) = f(&current, &self.ctx, next) {
                        if self.generation.get() == marker && !self.cancelled.get() {
                            error = Some(raised);
                            continue;
                        }
                        tracing::warn!(
                            error = %raised,
                            "error handler returned an error after driving its continuation; dropping it"
                        );
                    }
                    return;
                }
                // Request handler while an error is in flight: step over it.
                (Handler::Request(_), Some(current)) => {
                    error = Some(current);
                }
                // Error handler with nothing in flight: step over it.
                (Handler::Error(_), None) => {}
            }
        }
    }
}
