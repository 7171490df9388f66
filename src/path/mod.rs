mod error;

pub use error::{DecodeError, DecodeResult};

use memchr::{memchr, memmem};

/// Splits an absolute-form request target into its scheme+host prefix and the
/// path-relative remainder. Origin-form targets come back unchanged with an
/// empty prefix. The `://` probe only looks at text before the query so a
/// scheme inside a query string does not count.
pub fn split_protohost(url: &str) -> (&str, &str) {
    let bytes = url.as_bytes();
    let search_end = memchr(b'?', bytes).unwrap_or(bytes.len());

    let Some(scheme_at) = memmem::find(&bytes[..search_end], b"://") else {
        return ("", url);
    };

    let host_start = scheme_at + 3;
    match memchr(b'/', &bytes[host_start..]) {
        Some(rel) => url.split_at(host_start + rel),
        // No path after the authority; everything is prefix.
        None => (url, ""),
    }
}

/// Path-only portion of a request URL: scheme+host prefix and query string
/// removed. An empty result is the caller's cue to treat the path as `/`.
pub fn pathname(url: &str) -> &str {
    let (_, rest) = split_protohost(url);
    match memchr(b'?', rest.as_bytes()) {
        Some(idx) => &rest[..idx],
        None => rest,
    }
}

/// Percent-decodes a captured path segment exactly once. `+` is left alone;
/// only `%XX` escapes are rewritten.
#[tracing::instrument(level = "trace", skip(value), fields(value_len = value.len() as u64))]
pub fn decode_component(value: &str) -> DecodeResult<String> {
    let bytes = value.as_bytes();
    if memchr(b'%', bytes).is_none() {
        return Ok(value.to_string());
    }

    let mut output = Vec::with_capacity(bytes.len());
    let mut idx = 0usize;
    while idx < bytes.len() {
        let byte = bytes[idx];
        if byte != b'%' {
            output.push(byte);
            idx += 1;
            continue;
        }

        if idx + 2 >= bytes.len() {
            return Err(DecodeError::InvalidPercentEncoding {
                input: value.to_string(),
                index: idx,
            });
        }
        let decoded = decode_hex_pair(bytes[idx + 1], bytes[idx + 2]).ok_or_else(|| {
            DecodeError::InvalidPercentEncoding {
                input: value.to_string(),
                index: idx,
            }
        })?;
        output.push(decoded);
        idx += 3;
    }

    String::from_utf8(output).map_err(|_| DecodeError::InvalidUtf8 {
        input: value.to_string(),
    })
}

fn decode_hex_pair(hi: u8, lo: u8) -> Option<u8> {
    fn val(byte: u8) -> Option<u8> {
        match byte {
            b'0'..=b'9' => Some(byte - b'0'),
            b'a'..=b'f' => Some(byte - b'a' + 10),
            b'A'..=b'F' => Some(byte - b'A' + 10),
            _ => None,
        }
    }

    Some(val(hi)? << 4 | val(lo)?)
}
