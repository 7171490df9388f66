use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::dispatch::chain::HandlerChain;
use crate::dispatch::Next;
use crate::enums::HttpMethod;
use crate::errors::HandlerError;
use crate::handler::Handler;
use crate::path;
use crate::pattern::{KeyList, PathPattern, PatternOptions, PatternResult};
use crate::structures::{Context, Params};
use crate::types::DispatchResult;

struct MethodHandlers {
    method: HttpMethod,
    handlers: Vec<Handler>,
}

struct RouteState {
    path: String,
    pattern: PathPattern,
    /// Insertion order doubles as the order of the automatic `Allow` listing.
    methods: SmallVec<[MethodHandlers; 4]>,
    all: Vec<Handler>,
}

/// One registered path plus its handler lists. Cheap to clone; clones share
/// registration state with the router that created them, which is how
/// `router.route(path).get(…).post(…)` chains work.
#[derive(Clone)]
pub struct Route {
    inner: Rc<RefCell<RouteState>>,
}

macro_rules! route_methods {
    ($(($name:ident, $err_name:ident, $method:ident)),+ $(,)?) => {
        $(
            pub fn $name<F>(&self, f: F) -> &Self
            where
                F: Fn(&Context, Next) -> DispatchResult + 'static,
            {
                self.push_handler(HttpMethod::$method, Handler::request(f));
                self
            }

            pub fn $err_name<F>(&self, f: F) -> &Self
            where
                F: Fn(&HandlerError, &Context, Next) -> DispatchResult + 'static,
            {
                self.push_handler(HttpMethod::$method, Handler::error(f));
                self
            }
        )+
    };
}

impl Route {
    pub fn new(path: &str, options: &PatternOptions) -> PatternResult<Self> {
        tracing::debug!(path = %path, "new route");
        let pattern = PathPattern::compile(path, options)?;
        Ok(Self {
            inner: Rc::new(RefCell::new(RouteState {
                path: path.to_string(),
                pattern,
                methods: SmallVec::new(),
                all: Vec::new(),
            })),
        })
    }

    pub fn path(&self) -> String {
        self.inner.borrow().path.clone()
    }

    pub(crate) fn keys_cloned(&self) -> KeyList {
        self.inner.borrow().pattern.keys().iter().cloned().collect()
    }

    /// Checks this route against `candidate` and returns a fresh parameter
    /// map on a hit. Pure: repeated calls with the same path yield equal
    /// maps and nothing is stored on the route. A capture that fails to
    /// percent-decode is a `MalformedParam` error (HTTP 400 semantics).
    pub fn matches(&self, candidate: &str) -> Result<Option<Params>, HandlerError> {
        let state = self.inner.borrow();
        let Some(captures) = state.pattern.captures(candidate) else {
            return Ok(None);
        };

        let keys = state.pattern.keys();
        let mut params = Params::default();
        for (idx, capture) in captures.into_iter().enumerate() {
            let Some(raw) = capture else {
                continue;
            };
            let decoded = path::decode_component(&raw)
                .map_err(|_| HandlerError::MalformedParam { raw: raw.clone() })?;
            match keys.get(idx) {
                Some(key) => params.insert_named(key.name.clone(), decoded),
                None => params.push_positional(decoded),
            }
        }
        Ok(Some(params))
    }

    /// Runs this route's own chain: all-methods middleware first, then the
    /// handlers for the request method. HEAD borrows GET's handlers when it
    /// has none of its own. Chain exhaustion or an unconsumed error goes to
    /// `next`.
    pub fn dispatch(&self, ctx: Context, next: Next) {
        let method = {
            let req = ctx.request();
            req.method
        };

        let chain = {
            let state = self.inner.borrow();
            let mut chain = state.all.clone();
            let mut registered = state.handlers_for(method);
            if registered.is_none() && method == HttpMethod::Head {
                registered = state.handlers_for(HttpMethod::Get);
            }
            if let Some(handlers) = registered {
                chain.extend(handlers.iter().cloned());
            }
            chain
        };

        HandlerChain::run(chain, ctx, next);
    }

    /// Canonical tokens with at least one registered handler, in
    /// registration order. Feeds the automatic OPTIONS response.
    pub fn supported_methods(&self) -> Vec<HttpMethod> {
        self.inner
            .borrow()
            .methods
            .iter()
            .filter(|entry| !entry.handlers.is_empty())
            .map(|entry| entry.method)
            .collect()
    }

    pub fn has_method(&self, method: HttpMethod) -> bool {
        self.inner
            .borrow()
            .methods
            .iter()
            .any(|entry| entry.method == method)
    }

    /// Registers middleware that runs for every method, ahead of the
    /// per-method handlers.
    pub fn all<F>(&self, f: F) -> &Self
    where
        F: Fn(&Context, Next) -> DispatchResult + 'static,
    {
        self.inner.borrow_mut().all.push(Handler::request(f));
        self
    }

    pub fn all_err<F>(&self, f: F) -> &Self
    where
        F: Fn(&HandlerError, &Context, Next) -> DispatchResult + 'static,
    {
        self.inner.borrow_mut().all.push(Handler::error(f));
        self
    }

    pub(crate) fn push_handler(&self, method: HttpMethod, handler: Handler) {
        tracing::debug!(method = %method, path = %self.inner.borrow().path, "register handler");
        let mut state = self.inner.borrow_mut();
        if let Some(entry) = state.methods.iter_mut().find(|entry| entry.method == method) {
            entry.handlers.push(handler);
            return;
        }
        state.methods.push(MethodHandlers {
            method,
            handlers: vec![handler],
        });
    }

    route_methods!(
        (get, get_err, Get),
        (post, post_err, Post),
        (put, put_err, Put),
        (delete, delete_err, Delete),
        (patch, patch_err, Patch),
        (head, head_err, Head),
        (options, options_err, Options),
        (trace, trace_err, Trace),
        (connect, connect_err, Connect),
    );
}

impl RouteState {
    fn handlers_for(&self, method: HttpMethod) -> Option<&Vec<Handler>> {
        self.methods
            .iter()
            .find(|entry| entry.method == method)
            .map(|entry| &entry.handlers)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Route")
            .field("path", &state.path)
            .field("methods", &state.methods.len())
            .field("all", &state.all.len())
            .finish()
    }
}
