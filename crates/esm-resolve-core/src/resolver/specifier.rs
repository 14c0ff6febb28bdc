//! Specifier shape checks.

/// Scheme prefix of an already-resolved location.
pub const FILE_URL_PREFIX: &str = "file://";

/// `./x`, `../x`, and on Windows their backslash forms.
#[must_use]
pub fn is_relative_specifier(spec: &str) -> bool {
    spec.starts_with("./")
        || spec.starts_with("../")
        || (cfg!(windows) && (spec.starts_with(".\\") || spec.starts_with("..\\")))
}

/// Split a bare specifier into package name and subpath.
///
/// `lodash/fp` gives `("lodash", "fp")`, `@scope/pkg/sub` gives
/// `("@scope/pkg", "sub")`. The subpath is empty when absent. Returns `None`
/// for an empty specifier or one starting with `/`.
#[must_use]
pub fn parse_package_specifier(spec: &str) -> Option<(&str, &str)> {
    if spec.is_empty() || spec.starts_with('/') {
        return None;
    }

    // Scoped package: needs a non-empty scope and package segment
    if spec.starts_with('@') {
        if let Some((scope, rest)) = spec.split_once('/') {
            let pkg_len = rest.find('/').unwrap_or(rest.len());
            if scope.len() > 1 && pkg_len > 0 {
                let name_len = scope.len() + 1 + pkg_len;
                let sub = spec.get(name_len + 1..).unwrap_or("");
                return Some((&spec[..name_len], sub));
            }
        }
    }

    Some(spec.split_once('/').unwrap_or((spec, "")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_specifiers() {
        assert!(is_relative_specifier("./a.js"));
        assert!(is_relative_specifier("../a.js"));
        assert!(!is_relative_specifier(".a.js"));
        assert!(!is_relative_specifier("a/./b"));
        assert!(!is_relative_specifier("/abs"));
    }

    #[test]
    fn test_parse_package_specifier_simple() {
        assert_eq!(parse_package_specifier("lodash"), Some(("lodash", "")));
        assert_eq!(parse_package_specifier("lodash/fp"), Some(("lodash", "fp")));
        assert_eq!(
            parse_package_specifier("lodash/fp/map.js"),
            Some(("lodash", "fp/map.js"))
        );
    }

    #[test]
    fn test_parse_package_specifier_scoped() {
        assert_eq!(parse_package_specifier("@scope/pkg"), Some(("@scope/pkg", "")));
        assert_eq!(
            parse_package_specifier("@scope/pkg/sub/x"),
            Some(("@scope/pkg", "sub/x"))
        );
    }

    #[test]
    fn test_parse_package_specifier_degenerate_scopes() {
        assert_eq!(parse_package_specifier("@scope"), Some(("@scope", "")));
        assert_eq!(parse_package_specifier("@scope/"), Some(("@scope", "")));
        assert_eq!(parse_package_specifier("@/x"), Some(("@", "x")));
    }

    #[test]
    fn test_parse_package_specifier_invalid() {
        assert_eq!(parse_package_specifier(""), None);
        assert_eq!(parse_package_specifier("/abs/path"), None);
    }

    #[test]
    fn test_parse_imports_specifier() {
        assert_eq!(parse_package_specifier("#internal/x"), Some(("#internal", "x")));
    }
}
