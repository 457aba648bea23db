//! Shared naming utilities for Go identifiers.
//!
//! These functions derive names when the package index does not declare them.
//! A package's declared `name` always wins over [`package_name`].

/// Go keywords, which can never be used as identifiers
const KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface", "map",
    "package", "range", "return", "select", "struct", "switch", "type", "var",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// Derive a Go package name from an import path
///
/// Uses the last path segment; a major-version suffix (`v2`, `v3`, ...)
/// defers to the segment before it. Characters that cannot appear in an
/// identifier are dropped.
///
/// # Examples
/// ```
/// use weld_core::naming::package_name;
/// assert_eq!(package_name("app/db"), "db");
/// assert_eq!(package_name("github.com/go-chi/chi/v5"), "chi");
/// assert_eq!(package_name("gopkg.in/yaml.v3"), "yamlv3");
/// assert_eq!(package_name("github.com/lib/go-redis"), "goredis");
/// ```
pub fn package_name(import: &str) -> String {
    let segments: Vec<&str> = import
        .trim_matches('"')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let segment = match segments.as_slice() {
        [] => "",
        [only] => *only,
        [.., previous, last] if is_major_version(last) => *previous,
        [.., last] => *last,
    };

    sanitize_identifier(segment)
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Drop characters that cannot appear in an identifier and avoid keywords
pub fn sanitize_identifier(name: &str) -> String {
    let mut result: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();

    if result.is_empty() {
        return "pkg".to_string();
    }
    if result.chars().next().is_some_and(|c| c.is_numeric()) {
        result.insert(0, '_');
    }
    if is_keyword(&result) {
        result.push('_');
    }
    result
}

/// Convert PascalCase to camelCase for variable names
///
/// # Examples
/// ```
/// use weld_core::naming::to_camel_case;
/// assert_eq!(to_camel_case("Conn"), "conn");
/// assert_eq!(to_camel_case("ObjectMeta"), "objectMeta");
/// ```
pub fn to_camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// Variable name for a value of `type_name` declared in package `package`
///
/// Builtin types (empty package) get a `Value` suffix so they never shadow
/// the predeclared identifier.
///
/// # Examples
/// ```
/// use weld_core::naming::variable_name;
/// assert_eq!(variable_name("db", "Conn"), "dbConn");
/// assert_eq!(variable_name("", "string"), "stringValue");
/// ```
pub fn variable_name(package: &str, type_name: &str) -> String {
    if package.is_empty() {
        return format!("{}Value", to_camel_case(type_name));
    }
    let name = format!("{}{}", to_camel_case(package), type_name);
    if is_keyword(&name) {
        format!("{}_", name)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_name() {
        let cases = vec![
            ("app/db", "db"),
            ("\"app/db\"", "db"),
            ("context", "context"),
            ("net/http", "http"),
            ("github.com/go-chi/chi/v5", "chi"),
            ("example.com/v2", "examplecom"),
            ("app/type", "type_"),
            ("app/3d", "_3d"),
            ("", "pkg"),
        ];

        for (input, expected) in cases {
            assert_eq!(package_name(input), expected, "Package name mismatch for {}", input);
        }
    }

    #[test]
    fn test_to_camel_case() {
        assert_eq!(to_camel_case(""), "");
        assert_eq!(to_camel_case("Conn"), "conn");
        assert_eq!(to_camel_case("conn"), "conn");
        assert_eq!(to_camel_case("HTTPServer"), "hTTPServer");
    }

    #[test]
    fn test_variable_name() {
        assert_eq!(variable_name("db", "Conn"), "dbConn");
        assert_eq!(variable_name("http", "Server"), "httpServer");
        assert_eq!(variable_name("", "int"), "intValue");
        assert_eq!(variable_name("Web", "Handler"), "webHandler");
    }
}
