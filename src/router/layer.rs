use crate::handler::Handler;
use crate::route::Route;

/// One registered routing rule, tried strictly in registration order.
#[derive(Clone, Debug)]
pub(crate) enum MountEntry {
    /// Prefix-matched middleware. The layer view it receives has the prefix
    /// stripped.
    Middleware { prefix: String, handler: Handler },
    /// A pattern-matched route; its handler chain runs via dispatch.
    Route { route: Route },
}

/// Prefix test and view derivation for a middleware mount: the candidate
/// path must start with `prefix` (ASCII case-insensitively) followed by
/// end-of-path, `/` or `.`. Returns the stripped remainder with a leading
/// slash restored. An empty prefix (a root mount) passes everything through.
pub(crate) fn mount_view(path: &str, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return Some(path.to_string());
    }

    let head = path.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    match path.as_bytes().get(prefix.len()) {
        None | Some(b'/') | Some(b'.') => {}
        Some(_) => return None,
    }

    let stripped = &path[prefix.len()..];
    if stripped.starts_with('/') {
        Some(stripped.to_string())
    } else if stripped.is_empty() {
        Some("/".to_string())
    } else {
        Some(format!("/{stripped}"))
    }
}

#[cfg(test)]
mod tests {
    use super::mount_view;

    #[test]
    fn prefix_must_sit_on_a_boundary() {
        assert_eq!(mount_view("/api/users", "/api"), Some("/users".to_string()));
        assert_eq!(mount_view("/api", "/api"), Some("/".to_string()));
        assert_eq!(mount_view("/api.json", "/api"), Some("/.json".to_string()));
        assert_eq!(mount_view("/apiary", "/api"), None);
        assert_eq!(mount_view("/other", "/api"), None);
    }

    #[test]
    fn prefix_comparison_ignores_ascii_case() {
        assert_eq!(mount_view("/API/users", "/api"), Some("/users".to_string()));
    }

    #[test]
    fn root_mount_passes_the_path_through() {
        assert_eq!(mount_view("/anything", ""), Some("/anything".to_string()));
    }
}
