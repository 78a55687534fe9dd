//! URL derivation and pattern matching.
//!
//! # Responsibilities
//! - Classify source files (route, config, ignored)
//! - Derive URL patterns from file paths
//! - Match request paths against compiled patterns
//!
//! # Design Decisions
//! - `[name]` compiles to `{name}`: exactly one path segment
//! - `[...name]` compiles to `{*name}`: one or more trailing segments
//! - `/index` collapses to the directory URL; root is `/`
//! - No regex: segment-wise comparison keeps matching O(n)

use std::collections::HashMap;

/// Reserved basename for per-directory configuration modules.
pub const CONFIG_BASENAME: &str = "_config";

/// Extensions accepted for route files; extensionless names always pass.
const RECOGNIZED_EXTENSIONS: &[&str] = &["rs"];

/// Strip a trailing extension, if any.
pub fn strip_extension(rel: &str) -> &str {
    let basename_start = rel.rfind('/').map_or(0, |i| i + 1);
    match rel[basename_start..].rfind('.') {
        Some(dot) => &rel[..basename_start + dot],
        None => rel,
    }
}

fn basename(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

fn has_recognized_extension(rel: &str) -> bool {
    let name = basename(rel);
    match name.rfind('.') {
        Some(dot) => RECOGNIZED_EXTENSIONS.contains(&&name[dot + 1..]),
        None => true,
    }
}

/// True for the per-directory configuration module.
pub fn is_config_file(rel: &str) -> bool {
    strip_extension(basename(rel)) == CONFIG_BASENAME
}

/// True for an ordinary route module: not underscore-prefixed, not a
/// test/spec file, recognized extension (or none).
pub fn is_route_file(rel: &str) -> bool {
    let name = basename(rel);
    if name.starts_with('_') {
        return false;
    }
    if !has_recognized_extension(rel) {
        return false;
    }
    let stem = strip_extension(name);
    !(stem.ends_with(".test") || stem.ends_with(".spec") || stem.ends_with("_test"))
}

/// Derive a URL pattern from a route file path relative to the routes root.
pub fn url_from_file(rel: &str) -> String {
    let stem = strip_extension(rel);
    let mut segments: Vec<&str> = stem.split('/').filter(|s| !s.is_empty()).collect();

    if segments.last() == Some(&"index") {
        segments.pop();
    }

    let compiled: Vec<String> = segments.iter().map(|s| compile_segment(s)).collect();
    if compiled.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", compiled.join("/"))
    }
}

fn compile_segment(segment: &str) -> String {
    if let Some(inner) = segment.strip_prefix("[...").and_then(|s| s.strip_suffix(']')) {
        format!("{{*{inner}}}")
    } else if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        format!("{{{inner}}}")
    } else {
        segment.to_string()
    }
}

/// Normalize a concatenation of prefix parts and a derived path into a
/// pattern with exactly one leading slash and no trailing slash.
pub fn join(parts: &[&str]) -> String {
    let mut segments: Vec<String> = Vec::new();
    for part in parts {
        for segment in part.split('/').filter(|s| !s.is_empty()) {
            segments.push(compile_segment(segment));
        }
    }
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// Match a request path against a compiled pattern, extracting named
/// parameters. Returns None on any mismatch.
pub fn match_params(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_segs: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut params = HashMap::new();
    let mut i = 0;

    for (pi, pseg) in pattern_segs.iter().enumerate() {
        if let Some(name) = pseg.strip_prefix("{*").and_then(|s| s.strip_suffix('}')) {
            // trailing wildcard: one or more remaining segments
            if pi != pattern_segs.len() - 1 || i >= path_segs.len() {
                return None;
            }
            params.insert(name.to_string(), path_segs[i..].join("/"));
            return Some(params);
        }
        let actual = path_segs.get(i)?;
        if let Some(name) = pseg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            params.insert(name.to_string(), (*actual).to_string());
        } else if pseg != actual {
            return None;
        }
        i += 1;
    }

    if i == path_segs.len() {
        Some(params)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_file_maps_to_path() {
        assert_eq!(url_from_file("health.rs"), "/health");
        assert_eq!(url_from_file("health"), "/health");
    }

    #[test]
    fn test_index_collapses() {
        assert_eq!(url_from_file("index.rs"), "/");
        assert_eq!(url_from_file("index"), "/");
        assert_eq!(url_from_file("admin/index.rs"), "/admin");
    }

    #[test]
    fn test_bracket_segment_compiles_to_named_param() {
        assert_eq!(url_from_file("posts/[id].rs"), "/posts/{id}");
    }

    #[test]
    fn test_rest_bracket_compiles_to_wildcard() {
        assert_eq!(url_from_file("docs/[...slug].rs"), "/docs/{*slug}");
    }

    #[test]
    fn test_route_file_classification() {
        assert!(is_route_file("health.rs"));
        assert!(is_route_file("posts/[id]"));
        assert!(!is_route_file("_private.rs"));
        assert!(!is_route_file("api/_helpers.rs"));
        assert!(!is_route_file("health.test.rs"));
        assert!(!is_route_file("health.spec.rs"));
        assert!(!is_route_file("health_test.rs"));
        assert!(!is_route_file("notes.md"));
        assert!(!is_route_file("_config.rs"));
    }

    #[test]
    fn test_config_file_classification() {
        assert!(is_config_file("_config.rs"));
        assert!(is_config_file("admin/_config"));
        assert!(!is_config_file("config.rs"));
    }

    #[test]
    fn test_join_normalizes_slashes() {
        assert_eq!(join(&["", "/health"]), "/health");
        assert_eq!(join(&["/api/", "/v1", "users/"]), "/api/v1/users");
        assert_eq!(join(&["", ""]), "/");
        assert_eq!(join(&["/admin", "/"]), "/admin");
    }

    #[test]
    fn test_named_param_matches_exactly_one_segment() {
        let params = match_params("/posts/{id}", "/posts/42").unwrap();
        assert_eq!(params.get("id").map(String::as_str), Some("42"));
        assert!(match_params("/posts/{id}", "/posts").is_none());
        assert!(match_params("/posts/{id}", "/posts/1/2").is_none());
    }

    #[test]
    fn test_wildcard_matches_one_or_more_segments() {
        let params = match_params("/docs/{*slug}", "/docs/a/b/c").unwrap();
        assert_eq!(params.get("slug").map(String::as_str), Some("a/b/c"));
        let params = match_params("/docs/{*slug}", "/docs/a").unwrap();
        assert_eq!(params.get("slug").map(String::as_str), Some("a"));
        assert!(match_params("/docs/{*slug}", "/docs").is_none());
    }

    #[test]
    fn test_literal_segments_must_match() {
        assert!(match_params("/a/b", "/a/b").is_some());
        assert!(match_params("/a/b", "/a/c").is_none());
        assert!(match_params("/", "/").is_some());
    }
}
