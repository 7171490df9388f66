mod compiler;
mod error;

pub use compiler::{KeyList, PathPattern, PatternKey, PatternOptions};
pub use error::{PatternError, PatternResult};
