pub mod enums;
pub mod errors;
mod dispatch;
mod handler;
pub mod path;
pub mod pattern;
mod route;
mod router;
pub mod structures;
pub mod types;

pub use dispatch::Next;
pub use enums::{HttpMethod, MethodSet, HTTP_METHODS};
pub use errors::{HandlerError, RegistrationError, RegistrationResult};
pub use handler::{Handler, Normalizer, ParamHandler, ParamNormalization};
pub use pattern::{PathPattern, PatternError, PatternOptions, PatternResult};
pub use route::Route;
pub use router::{Router, RouterOptions, RouterOptionsBuilder};
pub use structures::{Context, Params, Request, Response};
pub use types::{DispatchResult, DoneFn, SharedRequest, SharedResponse};
