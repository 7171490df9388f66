use std::rc::Rc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::dispatch::Next;
use crate::enums::HTTP_METHODS;
use crate::errors::{HandlerError, RegistrationError, RegistrationResult};
use crate::handler::{Handler, Normalizer, ParamHandler, ParamNormalization};
use crate::pattern::PatternResult;
use crate::route::Route;
use crate::structures::Context;
use crate::types::{DispatchResult, DoneFn, SharedRequest, SharedResponse};

use super::layer::MountEntry;
use super::machine::LayerMachine;
use super::RouterOptions;

#[derive(Default)]
struct RouterState {
    entries: Vec<MountEntry>,
    params: HashMap<String, Vec<ParamHandler>>,
    normalizers: Vec<Normalizer>,
}

struct RouterInner {
    options: RouterOptions,
    state: RwLock<RouterState>,
}

/// The aggregate: an ordered list of mount entries plus the parameter
/// processor registry. Cheap to clone; clones share registration state.
#[derive(Clone)]
pub struct Router {
    inner: Rc<RouterInner>,
}

macro_rules! router_methods {
    ($($name:ident),+ $(,)?) => {
        $(
            pub fn $name<F>(&self, path: &str, f: F) -> PatternResult<&Self>
            where
                F: Fn(&Context, Next) -> DispatchResult + 'static,
            {
                self.route(path)?.$name(f);
                Ok(self)
            }
        )+
    };
}

impl Router {
    pub fn new(options: RouterOptions) -> Self {
        Self {
            inner: Rc::new(RouterInner {
                options,
                state: RwLock::new(RouterState::default()),
            }),
        }
    }

    /// Mounts prefix-matched middleware. The prefix needs only to lead the
    /// request path (on a `/` or `.` boundary); the handler's context path
    /// has the prefix stripped. A trailing slash on the prefix is dropped,
    /// so `mount("/", …)` sees every request.
    pub fn mount<F>(&self, prefix: &str, f: F) -> &Self
    where
        F: Fn(&Context, Next) -> DispatchResult + 'static,
    {
        self.push_middleware(prefix, Handler::request(f))
    }

    /// Mounts prefix-matched error middleware: it runs only while an error
    /// is in flight.
    pub fn mount_err<F>(&self, prefix: &str, f: F) -> &Self
    where
        F: Fn(&HandlerError, &Context, Next) -> DispatchResult + 'static,
    {
        self.push_middleware(prefix, Handler::error(f))
    }

    fn push_middleware(&self, prefix: &str, handler: Handler) -> &Self {
        let prefix = prefix.strip_suffix('/').unwrap_or(prefix).to_string();
        tracing::debug!(prefix = %prefix, "mount");
        self.inner
            .state
            .write()
            .entries
            .push(MountEntry::Middleware { prefix, handler });
        self
    }

    /// Creates a pattern-matched route at `path` and registers it as the next
    /// mount entry. The returned handle is for chaining per-method
    /// registrations.
    pub fn route(&self, path: &str) -> PatternResult<Route> {
        let route = Route::new(path, &self.inner.options.pattern_options())?;
        self.inner
            .state
            .write()
            .entries
            .push(MountEntry::Route {
                route: route.clone(),
            });
        Ok(route)
    }

    /// Registers `f` for every canonical method at `path`.
    pub fn all<F>(&self, path: &str, f: F) -> PatternResult<Route>
    where
        F: Fn(&Context, Next) -> DispatchResult + 'static,
    {
        let route = self.route(path)?;
        let handler = Handler::request(f);
        for method in HTTP_METHODS {
            route.push_handler(method, handler.clone());
        }
        Ok(route)
    }

    router_methods!(get, post, put, delete, patch, head, options, trace, connect);

    /// Registers a processor for the named parameter. A leading `:` on the
    /// name is tolerated. The processor first passes through every
    /// registered normalizer, in order; a normalizer may substitute a
    /// replacement or reject the definition outright.
    pub fn param<F>(&self, name: &str, f: F) -> RegistrationResult<&Self>
    where
        F: Fn(&Context, Next, &str, &str) -> DispatchResult + 'static,
    {
        let name = name.strip_prefix(':').unwrap_or(name);
        let mut handler: ParamHandler = Rc::new(f);

        let normalizers = self.inner.state.read().normalizers.clone();
        for normalizer in &normalizers {
            match normalizer(name, handler.clone()) {
                ParamNormalization::Keep => {}
                ParamNormalization::Replace(replacement) => handler = replacement,
                ParamNormalization::Reject(reason) => {
                    return Err(RegistrationError::InvalidParamDefinition {
                        name: name.to_string(),
                        reason,
                    });
                }
            }
        }

        self.inner
            .state
            .write()
            .params
            .entry(name.to_string())
            .or_default()
            .push(handler);
        Ok(self)
    }

    /// Registers a normalizer applied to every subsequent `param`
    /// registration.
    pub fn param_normalizer<F>(&self, f: F) -> &Self
    where
        F: Fn(&str, ParamHandler) -> ParamNormalization + 'static,
    {
        self.inner.state.write().normalizers.push(Rc::new(f));
        self
    }

    /// Top-level dispatch entry point. Walks the mount entries in
    /// registration order and calls `done` exactly once with the first
    /// unresolved error, or nothing — unless the automatic OPTIONS answer
    /// fires, which replaces `done` entirely.
    pub fn handle<D>(&self, req: SharedRequest, res: SharedResponse, done: D)
    where
        D: FnOnce(Option<HandlerError>) + 'static,
    {
        self.handle_scoped(req, res, None, Box::new(done));
    }

    pub(crate) fn handle_scoped(
        &self,
        req: SharedRequest,
        res: SharedResponse,
        base_path: Option<String>,
        done: DoneFn,
    ) {
        {
            let mut request = req.borrow_mut();
            if request.original_url.is_none() {
                request.original_url = Some(request.url.clone());
            }
            tracing::debug!(method = %request.method, url = %request.url, "dispatching");
        }

        let (entries, registry) = {
            let state = self.inner.state.read();
            (state.entries.clone(), state.params.clone())
        };

        LayerMachine::run(entries, registry, req, res, base_path, done);
    }

    /// Adapts this router into mountable middleware, for nesting under
    /// another router's prefix. The nested dispatch matches against the
    /// stripped view its mount derived.
    pub fn into_handler(self) -> impl Fn(&Context, Next) -> DispatchResult {
        move |ctx, next| {
            self.handle_scoped(
                ctx.shared_request().clone(),
                ctx.shared_response().clone(),
                Some(ctx.path().to_string()),
                Box::new(move |outcome| match outcome {
                    Some(err) => next.err(err),
                    None => next.ok(),
                }),
            );
            Ok(())
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("Router")
            .field("options", &self.inner.options)
            .field("entries", &state.entries.len())
            .field("params", &state.params.len())
            .finish()
    }
}
