//! RFC 6901 JSON Pointer construction.
//!
//! Paths are built as plain strings while walking; the root is `""`.

pub fn escape_token(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

pub fn join(base: &str, token: &str) -> String {
    format!("{}/{}", base, escape_token(token))
}

pub fn join_index(base: &str, index: usize) -> String {
    format!("{}/{}", base, index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_escapes_reserved_characters() {
        assert_eq!(join("/components", "a/b~c"), "/components/a~1b~0c");
        assert_eq!(join("", "view"), "/view");
        assert_eq!(join_index("/actions", 3), "/actions/3");
    }
}
