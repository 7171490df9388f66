use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hashbrown::HashMap;

use crate::dispatch::pipeline::{ParamPipeline, PipelineOutcome};
use crate::dispatch::{Next, Signal, Stepper};
use crate::enums::{HttpMethod, MethodSet};
use crate::errors::HandlerError;
use crate::handler::{Handler, ParamHandler};
use crate::path;
use crate::structures::{Context, Params};
use crate::types::{DoneFn, SharedRequest, SharedResponse};

use super::layer::{mount_view, MountEntry};

/// The per-request layer loop: mount entries plus a cursor, advanced one
/// entry at a time by `step`. Everything it walks is a snapshot taken when
/// `handle` was called; registration after that point affects later requests
/// only.
pub(crate) struct LayerMachine {
    entries: Vec<MountEntry>,
    registry: HashMap<String, Vec<ParamHandler>>,
    req: SharedRequest,
    res: SharedResponse,
    method: HttpMethod,
    /// Derived view handed down by an enclosing mount, used instead of the
    /// request URL as long as the URL is untouched.
    base_path: Option<String>,
    root_url: String,
    cursor: Cell<usize>,
    cancelled: Cell<bool>,
    generation: Cell<u64>,
    /// Methods gathered for the automatic OPTIONS answer, first-seen order.
    collected: RefCell<Vec<HttpMethod>>,
    seen: Cell<MethodSet>,
    done: RefCell<Option<DoneFn>>,
}

impl LayerMachine {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn run(
        entries: Vec<MountEntry>,
        registry: HashMap<String, Vec<ParamHandler>>,
        req: SharedRequest,
        res: SharedResponse,
        base_path: Option<String>,
        done: DoneFn,
    ) {
        let (method, root_url) = {
            let request = req.borrow();
            (request.method, request.url.clone())
        };

        let machine = Rc::new(Self {
            entries,
            registry,
            req,
            res,
            method,
            base_path,
            root_url,
            cursor: Cell::new(0),
            cancelled: Cell::new(false),
            generation: Cell::new(0),
            collected: RefCell::new(Vec::new()),
            seen: Cell::new(MethodSet::empty()),
            done: RefCell::new(Some(done)),
        });
        machine.step(Signal::Continue);
    }

    /// The path this iteration should match against. The enclosing mount's
    /// stripped view wins while the request URL is what it was at machine
    /// start; a handler that rewrote the URL takes over from there.
    fn layer_path(&self) -> String {
        let url = self.req.borrow().url.clone();
        if let Some(base) = &self.base_path {
            if url == self.root_url {
                return base.clone();
            }
        }
        let p = path::pathname(&url);
        if p.is_empty() {
            "/".to_string()
        } else {
            p.to_string()
        }
    }

    fn collect_methods(&self, methods: Vec<HttpMethod>) {
        let mut seen = self.seen.get();
        let mut collected = self.collected.borrow_mut();
        for method in methods {
            let flag = MethodSet::from(method);
            if !seen.contains(flag) {
                seen |= flag;
                collected.push(method);
            }
        }
        self.seen.set(seen);
    }

    fn finish(&self, error: Option<HandlerError>) {
        self.cancelled.set(true);
        let Some(done) = self.done.borrow_mut().take() else {
            return;
        };

        if let Some(err) = error {
            return done(Some(err));
        }

        // Automatic OPTIONS answer: only when at least one matching route
        // contributed methods. It bypasses the terminal callback entirely.
        if self.method == HttpMethod::Options {
            let collected = self.collected.borrow();
            if !collected.is_empty() {
                let body = collected
                    .iter()
                    .map(|method| method.as_str())
                    .collect::<Vec<_>>()
                    .join(",");
                tracing::debug!(allow = %body, "automatic OPTIONS response");
                let mut response = self.res.borrow_mut();
                response.set_header("Allow", body.clone());
                response.send(body);
                return;
            }
        }

        done(None)
    }

    fn enter_route(self: &Rc<Self>, route: &crate::route::Route, path: String, params: Params) {
        if self.method == HttpMethod::Options && !route.has_method(HttpMethod::Options) {
            self.collect_methods(route.supported_methods());
        }

        let ctx = Context::new(self.req.clone(), self.res.clone(), path, params.clone());
        let keys = route.keys_cloned();
        let machine = self.clone();
        let route = route.clone();
        let dispatch_ctx = ctx.clone();

        ParamPipeline::run(
            &keys,
            &params,
            &self.registry,
            ctx,
            Box::new(move |outcome| match outcome {
                PipelineOutcome::Proceed => route.dispatch(dispatch_ctx, Next::new(machine)),
                PipelineOutcome::Error(err) => Next::new(machine).err(err),
                PipelineOutcome::Skip => Next::new(machine).ok(),
            }),
        );
    }
}

impl Stepper for LayerMachine {
    fn step(self: Rc<Self>, signal: Signal) {
        if self.cancelled.get() {
            return;
        }
        self.generation.set(self.generation.get() + 1);

        let mut error = match signal {
            Signal::Continue | Signal::SkipRoute => None,
            Signal::Error(err) => Some(err),
        };

        loop {
            let idx = self.cursor.get();
            self.cursor.set(idx + 1);

            let Some(entry) = self.entries.get(idx) else {
                return self.finish(error);
            };
            let path = self.layer_path();

            match entry {
                MountEntry::Route { route } => match route.matches(&path) {
                    Ok(None) => {}
                    Err(raised) => {
                        // Malformed escapes surface as the in-flight error.
                        error = Some(raised);
                    }
                    Ok(Some(params)) => {
                        {
                            let mut request = self.req.borrow_mut();
                            request.params = params.clone();
                            request.route = Some(route.path());
                        }
                        if error.is_some() {
                            // Route layers are request handlers: stepped over
                            // while an error is in flight. The match still
                            // records its params and route on the request.
                            continue;
                        }
                        self.enter_route(route, path, params);
                        return;
                    }
                },
                MountEntry::Middleware { prefix, handler } => {
                    let Some(view) = mount_view(&path, prefix) else {
                        continue;
                    };

                    match (handler, error.take()) {
                        (Handler::Request(f), None) => {
                            tracing::trace!(prefix = %prefix, view = %view, "enter middleware");
                            let ctx = Context::new(
                                self.req.clone(),
                                self.res.clone(),
                                view,
                                Params::default(),
                            );
                            let marker = self.generation.get();
                            let next = Next::new(self.clone());
                            if let Err(raised) = f(&ctx, next) {
                                if self.generation.get() == marker && !self.cancelled.get() {
                                    error = Some(raised);
                                    continue;
                                }
                                tracing::warn!(
                                    error = %raised,
                                    "middleware returned an error after driving its continuation; dropping it"
                                );
                            }
                            return;
                        }
                        (Handler::Error(f), Some(current)) => {
                            let ctx = Context::new(
                                self.req.clone(),
                                self.res.clone(),
                                view,
                                Params::default(),
                            );
                            let marker = self.generation.get();
                            let next = Next::new(self.clone());
                            if let Err(raised) = f(&current, &ctx, next) {
                                if self.generation.get() == marker && !self.cancelled.get() {
                                    error = Some(raised);
                                    continue;
                                }
                                tracing::warn!(
                                    error = %raised,
                                    "error middleware returned an error after driving its continuation; dropping it"
                                );
                            }
                            return;
                        }
                        (Handler::Request(_), Some(current)) => {
                            error = Some(current);
                        }
                        (Handler::Error(_), None) => {}
                    }
                }
            }
        }
    }
}
