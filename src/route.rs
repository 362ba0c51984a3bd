use indexmap::IndexSet;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `:id` or optional `:id?`
    static ref PARAM_SEGMENT: Regex = Regex::new(r"^:([A-Za-z_][A-Za-z0-9_]*)\??$").unwrap();

    /// Trailing catch-all, `*` or `*rest`
    static ref WILDCARD_SEGMENT: Regex = Regex::new(r"^\*([A-Za-z_][A-Za-z0-9_]*)?$").unwrap();
}

/// Path parameter names declared by a route pattern such as `/users/:id/*`.
pub fn extract_route_params(path: &str) -> IndexSet<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let mut params = IndexSet::new();

    for (i, segment) in segments.iter().enumerate() {
        if let Some(cap) = PARAM_SEGMENT.captures(segment) {
            params.insert(cap[1].to_string());
            continue;
        }
        if i + 1 == segments.len() {
            if let Some(cap) = WILDCARD_SEGMENT.captures(segment) {
                let name = cap.get(1).map_or("*", |m| m.as_str());
                params.insert(name.to_string());
            }
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(path: &str) -> Vec<String> {
        extract_route_params(path).into_iter().collect()
    }

    #[test]
    fn test_named_segments() {
        assert_eq!(names("/users/:id/posts/:postId"), vec!["id", "postId"]);
    }

    #[test]
    fn test_static_path_has_no_params() {
        assert!(names("/about/team").is_empty());
        assert!(names("/").is_empty());
    }

    #[test]
    fn test_trailing_wildcards() {
        assert_eq!(names("/docs/*"), vec!["*"]);
        assert_eq!(names("/docs/:section/*rest"), vec!["section", "rest"]);
    }

    #[test]
    fn test_wildcard_only_counts_when_trailing() {
        assert!(names("/a/*/b").is_empty());
    }

    #[test]
    fn test_optional_param() {
        assert_eq!(names("/search/:term?"), vec!["term"]);
    }
}
