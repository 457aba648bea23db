//! Dependency identities used as resolution keys
//!
//! A dependency names a producible value: a type declared in an import path,
//! a value supplied by the caller of the generated function, or the builtin
//! `error` sentinel.
//!
//! ## Reference Formats
//!
//! - Quoted: `"app/db".Conn`
//! - Bare: `app/db.Conn`
//! - Indirect: `"app/db".*Conn` or `*"app/db".Conn`
//! - Builtin: `error`, `string` (package index files only)
//!
//! The import path and type name are split on the LAST `.`, so import paths
//! containing dots (`"gopkg.in/yaml.v3".Node`) are handled.
//!
//! ## Usage
//!
//! ```
//! use weld_core::dependency::TypeRef;
//!
//! let conn = TypeRef::parse_qualified("\"app/db\".*Conn").unwrap();
//! assert_eq!(conn.import(), "app/db");
//! assert_eq!(conn.name(), "Conn");
//! assert!(conn.is_pointer());
//! assert_eq!(conn.to_string(), "\"app/db\".*Conn");
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A type in a given import path, optionally behind a pointer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeRef {
    /// The import path (empty for builtin types)
    import: String,
    /// The type name (e.g., "Conn")
    name: String,
    /// Whether the value is held through a pointer
    pointer: bool,
}

impl TypeRef {
    pub fn new(import: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            import: import.into(),
            name: name.into(),
            pointer: false,
        }
    }

    pub fn pointer(import: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            pointer: true,
            ..Self::new(import, name)
        }
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new(String::new(), name)
    }

    pub fn error() -> Self {
        Self::builtin("error")
    }

    /// Parse a reference, accepting builtin types without an import path
    pub fn parse(reference: &str) -> Result<Self, CoreError> {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return Err(CoreError::MalformedReference(reference.to_string()));
        }

        let (mut pointer, rest) = match trimmed.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (import, mut name) = match rest.rfind('.') {
            Some(idx) => {
                let import = rest[..idx].trim().trim_matches('"');
                if import.is_empty() {
                    return Err(CoreError::MalformedReference(reference.to_string()));
                }
                (import, &rest[idx + 1..])
            }
            None => ("", rest),
        };

        if let Some(stripped) = name.strip_prefix('*') {
            pointer = true;
            name = stripped;
        }

        if name.is_empty() {
            return Err(CoreError::EmptyTypeName(reference.to_string()));
        }
        if !is_identifier(name) {
            return Err(CoreError::InvalidTypeName {
                reference: reference.to_string(),
                name: name.to_string(),
            });
        }

        Ok(Self {
            import: import.to_string(),
            name: name.to_string(),
            pointer,
        })
    }

    /// Parse a reference that must name an import path
    pub fn parse_qualified(reference: &str) -> Result<Self, CoreError> {
        let type_ref = Self::parse(reference)?;
        if type_ref.is_builtin() {
            return Err(CoreError::MalformedReference(reference.to_string()));
        }
        Ok(type_ref)
    }

    pub fn import(&self) -> &str {
        &self.import
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer
    }

    pub fn is_builtin(&self) -> bool {
        self.import.is_empty()
    }

    pub fn is_error(&self) -> bool {
        self.is_builtin() && !self.pointer && self.name == "error"
    }

    /// Exported Go identifiers start with an uppercase letter
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(|c| c.is_uppercase())
    }

    /// The same type without indirection
    pub fn base(&self) -> TypeRef {
        self.with_pointer(false)
    }

    pub fn with_pointer(&self, pointer: bool) -> TypeRef {
        TypeRef {
            pointer,
            ..self.clone()
        }
    }

    pub fn with_import(&self, import: impl Into<String>) -> TypeRef {
        TypeRef {
            import: import.into(),
            ..self.clone()
        }
    }

    /// Equal import path and type name, ignoring indirection
    pub fn same_base(&self, other: &TypeRef) -> bool {
        self.import == other.import && self.name == other.name
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let star = if self.pointer { "*" } else { "" };
        if self.is_builtin() {
            write!(f, "{}{}", star, self.name)
        } else {
            write!(f, "\"{}\".{}{}", self.import, star, self.name)
        }
    }
}

impl FromStr for TypeRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

/// A producible value requested by a function or a provider
///
/// Identity is the carried [`TypeRef`]: a `Param` and a `Type` naming the same
/// type compare equal, and `Error` only equals `Error`.
#[derive(Debug, Clone)]
pub enum Dependency {
    /// A value constructed by a provider
    Type(TypeRef),
    /// A value supplied by the caller of the generated function
    Param(TypeRef),
    /// The builtin error sentinel
    Error,
}

impl Dependency {
    pub fn type_ref(&self) -> Option<&TypeRef> {
        match self {
            Dependency::Type(t) | Dependency::Param(t) => Some(t),
            Dependency::Error => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Dependency::Error)
    }
}

impl From<TypeRef> for Dependency {
    fn from(type_ref: TypeRef) -> Self {
        if type_ref.is_error() {
            Dependency::Error
        } else {
            Dependency::Type(type_ref)
        }
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.type_ref() == other.type_ref()
    }
}

impl Eq for Dependency {}

impl Hash for Dependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_ref().hash(state);
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Type(t) | Dependency::Param(t) => write!(f, "{}", t),
            Dependency::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let cases = vec![
            ("\"app/db\".Conn", ("app/db", "Conn", false)),
            ("app/db.Conn", ("app/db", "Conn", false)),
            ("\"app/db\".*Conn", ("app/db", "Conn", true)),
            ("*\"app/db\".Conn", ("app/db", "Conn", true)),
            ("\"gopkg.in/yaml.v3\".Node", ("gopkg.in/yaml.v3", "Node", false)),
            ("net/http.*Server", ("net/http", "Server", true)),
            ("error", ("", "error", false)),
            ("*string", ("", "string", true)),
        ];

        for (input, (import, name, pointer)) in cases {
            let parsed = TypeRef::parse(input).unwrap();
            assert_eq!(parsed.import(), import, "Import mismatch for {}", input);
            assert_eq!(parsed.name(), name, "Name mismatch for {}", input);
            assert_eq!(parsed.is_pointer(), pointer, "Pointer mismatch for {}", input);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            TypeRef::parse(""),
            Err(CoreError::MalformedReference(_))
        ));
        assert!(matches!(
            TypeRef::parse("\"\".Conn"),
            Err(CoreError::MalformedReference(_))
        ));
        assert!(matches!(
            TypeRef::parse("app/db."),
            Err(CoreError::EmptyTypeName(_))
        ));
        assert!(matches!(
            TypeRef::parse("app/db.Conn-Pool"),
            Err(CoreError::InvalidTypeName { .. })
        ));
    }

    #[test]
    fn test_parse_qualified_requires_import() {
        assert!(matches!(
            TypeRef::parse_qualified("Conn"),
            Err(CoreError::MalformedReference(_))
        ));
        assert!(TypeRef::parse_qualified("app/db.Conn").is_ok());
    }

    #[test]
    fn test_display_round_trips() {
        for input in ["\"app/db\".*Conn", "\"app/log\".Logger", "error", "*int"] {
            let parsed = TypeRef::parse(input).unwrap();
            assert_eq!(parsed.to_string(), input);
            assert_eq!(TypeRef::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn test_identity_includes_indirection() {
        let value = TypeRef::new("app/db", "Conn");
        let pointer = TypeRef::pointer("app/db", "Conn");
        assert_ne!(value, pointer);
        assert!(value.same_base(&pointer));
        assert_eq!(pointer.base(), value);
    }

    #[test]
    fn test_dependency_identity() {
        let t = TypeRef::new("app/log", "Logger");
        assert_eq!(Dependency::Type(t.clone()), Dependency::Param(t.clone()));
        assert_ne!(Dependency::Type(t), Dependency::Error);
        assert_eq!(Dependency::from(TypeRef::error()), Dependency::Error);
    }

    #[test]
    fn test_serde_uses_reference_syntax() {
        let t: TypeRef = serde_json::from_str("\"\\\"app/db\\\".*Conn\"").unwrap();
        assert_eq!(t, TypeRef::pointer("app/db", "Conn"));
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            "\"\\\"app/db\\\".*Conn\""
        );
    }
}
