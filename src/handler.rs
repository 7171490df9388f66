use std::rc::Rc;

use crate::dispatch::Next;
use crate::errors::HandlerError;
use crate::structures::Context;
use crate::types::DispatchResult;

pub type RequestFn = dyn Fn(&Context, Next) -> DispatchResult;
pub type ErrorFn = dyn Fn(&HandlerError, &Context, Next) -> DispatchResult;

/// A parameter processor: `(ctx, next, value, name)`.
pub type ParamFn = dyn Fn(&Context, Next, &str, &str) -> DispatchResult;
pub type ParamHandler = Rc<ParamFn>;

/// A registered callback, tagged with its role at registration time. Request
/// handlers run only while no error is in flight; error handlers run only
/// while one is. The other kind is stepped over with the in-flight state
/// preserved.
#[derive(Clone)]
pub enum Handler {
    Request(Rc<RequestFn>),
    Error(Rc<ErrorFn>),
}

impl Handler {
    pub fn request<F>(f: F) -> Self
    where
        F: Fn(&Context, Next) -> DispatchResult + 'static,
    {
        Handler::Request(Rc::new(f))
    }

    pub fn error<F>(f: F) -> Self
    where
        F: Fn(&HandlerError, &Context, Next) -> DispatchResult + 'static,
    {
        Handler::Error(Rc::new(f))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Handler::Error(_))
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Request(_) => f.write_str("Handler::Request"),
            Handler::Error(_) => f.write_str("Handler::Error"),
        }
    }
}

/// What a parameter normalizer decides about a processor being registered.
pub enum ParamNormalization {
    /// Keep the processor as supplied.
    Keep,
    /// Substitute a replacement before it is stored.
    Replace(ParamHandler),
    /// Refuse the definition; registration fails with
    /// `RegistrationError::InvalidParamDefinition`.
    Reject(String),
}

pub type Normalizer = Rc<dyn Fn(&str, ParamHandler) -> ParamNormalization>;
