use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use hashbrown::HashMap;

use crate::enums::HttpMethod;
use crate::types::{SharedRequest, SharedResponse};

/// Parameters captured by a route match. Named captures live under their key
/// name; captures without a key are queued under integer indices starting at
/// zero. The two spaces are numbered independently.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Params {
    named: HashMap<String, String>,
    positional: Vec<String>,
}

impl Params {
    pub fn insert_named<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.named.insert(name.into(), value.into());
    }

    pub fn push_positional<V: Into<String>>(&mut self, value: V) {
        self.positional.push(value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positional.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.named.len() + self.positional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }
}

/// The request surface dispatch touches. The transport owns everything else.
#[derive(Debug)]
pub struct Request {
    pub method: HttpMethod,
    /// Working URL. Handlers may rewrite it; layers derive their own view of
    /// it and never write it back.
    pub url: String,
    /// Recorded once at the top of the first `handle` call.
    pub original_url: Option<String>,
    /// Captures of the most recently matched route layer.
    pub params: Params,
    /// Path of the most recently matched route layer.
    pub route: Option<String>,
}

impl Request {
    pub fn new<U: Into<String>>(method: HttpMethod, url: U) -> Self {
        Self {
            method,
            url: url.into(),
            original_url: None,
            params: Params::default(),
            route: None,
        }
    }

    pub fn into_shared(self) -> SharedRequest {
        Rc::new(RefCell::new(self))
    }
}

/// The response surface dispatch touches: a header slot and a one-shot body,
/// enough for the automatic OPTIONS answer. Transports adapt it outward.
#[derive(Debug, Default)]
pub struct Response {
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_header<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            slot.1 = value;
        } else {
            self.headers.push((name, value));
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn send<B: Into<String>>(&mut self, body: B) {
        self.body = Some(body.into());
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn is_sent(&self) -> bool {
        self.body.is_some()
    }

    pub fn into_shared(self) -> SharedResponse {
        Rc::new(RefCell::new(self))
    }
}

/// Per-layer view handed to a handler: the shared request/response cells plus
/// the path this layer sees (prefix-stripped for middleware mounts) and the
/// captures threaded from the match. Layers never share a mutable path field;
/// each gets its own derived copy.
#[derive(Debug, Clone)]
pub struct Context {
    req: SharedRequest,
    res: SharedResponse,
    path: String,
    params: Params,
}

impl Context {
    pub(crate) fn new(
        req: SharedRequest,
        res: SharedResponse,
        path: String,
        params: Params,
    ) -> Self {
        Self {
            req,
            res,
            path,
            params,
        }
    }

    pub fn request(&self) -> RefMut<'_, Request> {
        self.req.borrow_mut()
    }

    pub fn response(&self) -> RefMut<'_, Response> {
        self.res.borrow_mut()
    }

    /// The path as this layer sees it. For a middleware mounted at `/api`,
    /// a request to `/api/users` reads `/users` here.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn shared_request(&self) -> &SharedRequest {
        &self.req
    }

    pub fn shared_response(&self) -> &SharedResponse {
        &self.res
    }
}
