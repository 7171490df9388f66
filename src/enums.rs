use bitflags::bitflags;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Delete = 3,
    Patch = 4,
    Head = 5,
    Options = 6,
    Trace = 7,
    Connect = 8,
}

pub const HTTP_METHODS: [HttpMethod; 9] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Delete,
    HttpMethod::Patch,
    HttpMethod::Head,
    HttpMethod::Options,
    HttpMethod::Trace,
    HttpMethod::Connect,
];

impl HttpMethod {
    /// Canonical uppercase token, as it appears on the wire and in `Allow`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        HTTP_METHODS
            .iter()
            .copied()
            .find(|method| method.as_str().eq_ignore_ascii_case(token))
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Membership set over the canonical methods. Order-insensitive; ordered
    /// listings are kept in plain vectors alongside this guard.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MethodSet: u16 {
        const GET = 1 << 0;
        const POST = 1 << 1;
        const PUT = 1 << 2;
        const DELETE = 1 << 3;
        const PATCH = 1 << 4;
        const HEAD = 1 << 5;
        const OPTIONS = 1 << 6;
        const TRACE = 1 << 7;
        const CONNECT = 1 << 8;
    }
}

impl From<HttpMethod> for MethodSet {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => MethodSet::GET,
            HttpMethod::Post => MethodSet::POST,
            HttpMethod::Put => MethodSet::PUT,
            HttpMethod::Delete => MethodSet::DELETE,
            HttpMethod::Patch => MethodSet::PATCH,
            HttpMethod::Head => MethodSet::HEAD,
            HttpMethod::Options => MethodSet::OPTIONS,
            HttpMethod::Trace => MethodSet::TRACE,
            HttpMethod::Connect => MethodSet::CONNECT,
        }
    }
}
