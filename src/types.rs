use std::cell::RefCell;
use std::rc::Rc;

use crate::errors::HandlerError;
use crate::structures::{Request, Response};

pub type SharedRequest = Rc<RefCell<Request>>;
pub type SharedResponse = Rc<RefCell<Response>>;

/// What a handler invocation produces synchronously. `Err` is folded into the
/// chain as an in-flight error, exactly as if the handler had driven
/// `Next::err` instead.
pub type DispatchResult = Result<(), HandlerError>;

/// Terminal continuation for one `handle` call.
pub type DoneFn = Box<dyn FnOnce(Option<HandlerError>)>;
