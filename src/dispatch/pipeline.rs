use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;

use crate::errors::HandlerError;
use crate::handler::ParamHandler;
use crate::pattern::PatternKey;
use crate::structures::{Context, Params};

use super::{Next, Signal, Stepper};

/// How a parameter pipeline ended.
pub(crate) enum PipelineOutcome {
    /// Every processor ran clean; the route's own handlers may run.
    Proceed,
    Error(HandlerError),
    /// A processor asked to skip the route entirely.
    Skip,
}

pub(crate) type PipelineDone = Box<dyn FnOnce(PipelineOutcome)>;

struct ParamStep {
    name: String,
    value: String,
    callbacks: Vec<ParamHandler>,
}

/// Runs the registered processors for a matched route's captured parameters:
/// keys in pattern order, processors per key in registration order. Keys with
/// no captured value or no processors are dropped up front, which is what
/// makes the cursor walk below total.
pub(crate) struct ParamPipeline {
    steps: Vec<ParamStep>,
    ctx: Context,
    step_idx: Cell<usize>,
    callback_idx: Cell<usize>,
    cancelled: Cell<bool>,
    generation: Cell<u64>,
    done: RefCell<Option<PipelineDone>>,
}

impl ParamPipeline {
    pub(crate) fn run(
        keys: &[PatternKey],
        params: &Params,
        registry: &HashMap<String, Vec<ParamHandler>>,
        ctx: Context,
        done: PipelineDone,
    ) {
        let mut steps = Vec::new();
        for key in keys {
            let Some(value) = params.get(&key.name) else {
                continue;
            };
            let Some(callbacks) = registry.get(&key.name) else {
                continue;
            };
            if callbacks.is_empty() {
                continue;
            }
            steps.push(ParamStep {
                name: key.name.clone(),
                value: value.to_string(),
                callbacks: callbacks.clone(),
            });
        }

        let pipeline = Rc::new(Self {
            steps,
            ctx,
            step_idx: Cell::new(0),
            callback_idx: Cell::new(0),
            cancelled: Cell::new(false),
            generation: Cell::new(0),
            done: RefCell::new(Some(done)),
        });
        pipeline.step(Signal::Continue);
    }

    fn finish(&self, outcome: PipelineOutcome) {
        self.cancelled.set(true);
        if let Some(done) = self.done.borrow_mut().take() {
            done(outcome);
        }
    }
}

impl Stepper for ParamPipeline {
    fn step(self: Rc<Self>, signal: Signal) {
        if self.cancelled.get() {
            return;
        }
        self.generation.set(self.generation.get() + 1);

        match signal {
            Signal::Continue => {}
            Signal::Error(err) => return self.finish(PipelineOutcome::Error(err)),
            Signal::SkipRoute => return self.finish(PipelineOutcome::Skip),
        }

        loop {
            let step_idx = self.step_idx.get();
            let Some(step) = self.steps.get(step_idx) else {
                return self.finish(PipelineOutcome::Proceed);
            };

            let callback_idx = self.callback_idx.get();
            let Some(callback) = step.callbacks.get(callback_idx) else {
                self.step_idx.set(step_idx + 1);
                self.callback_idx.set(0);
                continue;
            };
            self.callback_idx.set(callback_idx + 1);

            let marker = self.generation.get();
            let next = Next::new(self.clone());
            if let Err(raised) = callback(&self.ctx, next, &step.value, &step.name) {
                if self.generation.get() == marker && !self.cancelled.get() {
                    return self.finish(PipelineOutcome::Error(raised));
                }
                tracing::warn!(
                    error = %raised,
                    "param processor returned an error after driving its continuation; dropping it"
                );
            }
            return;
        }
    }
}
