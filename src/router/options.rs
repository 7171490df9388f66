use serde::{Deserialize, Serialize};

use crate::pattern::PatternOptions;

/// Router-wide matching switches, propagated into every route the router
/// creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouterOptions {
    /// Match letter case exactly. Off by default: `/Foo` hits `/foo`.
    pub case_sensitive: bool,
    /// Treat a trailing slash as significant. Off by default: `/foo/` hits
    /// `/foo`.
    pub strict_trailing_slash: bool,
}

impl RouterOptions {
    pub fn builder() -> RouterOptionsBuilder {
        RouterOptionsBuilder::default()
    }

    pub(crate) fn pattern_options(&self) -> PatternOptions {
        PatternOptions {
            sensitive: self.case_sensitive,
            strict: self.strict_trailing_slash,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RouterOptionsBuilder {
    options: RouterOptions,
}

impl RouterOptionsBuilder {
    pub fn case_sensitive(mut self, value: bool) -> Self {
        self.options.case_sensitive = value;
        self
    }

    pub fn strict_trailing_slash(mut self, value: bool) -> Self {
        self.options.strict_trailing_slash = value;
        self
    }

    pub fn build(self) -> RouterOptions {
        self.options
    }
}
