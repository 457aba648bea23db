//! Declared package metadata consulted by provider lookup
//!
//! This is the boundary with the source parser: whatever extracts exported
//! declarations from on-disk packages hands them over in this shape. The
//! `weld-parser` crate loads it from package index files.

use serde::{Deserialize, Serialize};

use crate::dependency::TypeRef;
use crate::naming;

/// Underlying kind of a declared type, used to pick its zero value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    #[default]
    Struct,
    Interface,
    Map,
    Slice,
    Func,
    Chan,
    String,
    Bool,
    Number,
}

impl TypeKind {
    /// Whether the zero value of this kind is `nil`
    pub fn is_nilable(self) -> bool {
        matches!(
            self,
            TypeKind::Interface | TypeKind::Map | TypeKind::Slice | TypeKind::Func | TypeKind::Chan
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(|c| c.is_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,
}

impl TypeDecl {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.push(FieldDecl::new(name, ty));
        self
    }

    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(|c| c.is_uppercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeRef>,
    #[serde(default)]
    pub results: Vec<TypeRef>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn with_param(mut self, param: TypeRef) -> Self {
        self.params.push(param);
        self
    }

    pub fn returning(mut self, result: TypeRef) -> Self {
        self.results.push(result);
        self
    }

    pub fn returning_error(self) -> Self {
        self.returning(TypeRef::error())
    }

    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(|c| c.is_uppercase())
    }

    /// The constructed type and whether the function can fail
    ///
    /// Only `T` and `(T, error)` result lists describe a constructor.
    pub fn constructs(&self) -> Option<(&TypeRef, bool)> {
        match self.results.as_slice() {
            [value] if !value.is_error() => Some((value, false)),
            [value, err] if !value.is_error() && err.is_error() => Some((value, true)),
            _ => None,
        }
    }
}

/// Exported declarations of one package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Canonical import path (e.g., "app/db")
    pub import: String,
    /// Declared package name, when it differs from the import path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

impl Package {
    pub fn new(import: impl Into<String>) -> Self {
        Self {
            import: import.into(),
            name: None,
            types: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    pub fn with_function(mut self, decl: FunctionDecl) -> Self {
        self.functions.push(decl);
        self
    }

    pub fn package_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| naming::package_name(&self.import))
    }

    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Attach this package's import path to unqualified exported type names
    ///
    /// Go builtin types are all lowercase, so an unqualified `*Conn` in the
    /// declarations of `app/db` can only mean `"app/db".*Conn`.
    pub fn qualify(mut self) -> Self {
        let import = self.import.clone();
        let qualify = |t: &mut TypeRef| {
            if t.is_builtin() && t.is_exported() {
                *t = t.with_import(import.as_str());
            }
        };

        for decl in &mut self.types {
            for field in &mut decl.fields {
                qualify(&mut field.ty);
            }
        }
        for decl in &mut self.functions {
            decl.params.iter_mut().for_each(qualify);
            decl.results.iter_mut().for_each(qualify);
        }
        self
    }
}

/// Source of package declarations for provider lookup
pub trait PackageSource {
    fn package(&self, import: &str) -> Option<&Package>;

    fn type_decl(&self, type_ref: &TypeRef) -> Option<&TypeDecl> {
        self.package(type_ref.import())?.type_decl(type_ref.name())
    }

    fn package_name(&self, import: &str) -> String {
        self.package(import)
            .map(Package::package_name)
            .unwrap_or_else(|| naming::package_name(import))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructs() {
        let conn = TypeRef::pointer("app/db", "Conn");

        let infallible = FunctionDecl::new("New").returning(conn.clone());
        assert_eq!(infallible.constructs(), Some((&conn, false)));

        let fallible = FunctionDecl::new("New").returning(conn.clone()).returning_error();
        assert_eq!(fallible.constructs(), Some((&conn, true)));

        let only_error = FunctionDecl::new("Close").returning_error();
        assert_eq!(only_error.constructs(), None);

        let two_values = FunctionDecl::new("Pair")
            .returning(conn.clone())
            .returning(conn);
        assert_eq!(two_values.constructs(), None);
    }

    #[test]
    fn test_qualify_local_types() {
        let package = Package::new("app/db")
            .with_type(TypeDecl::new("Pool", TypeKind::Struct).with_field("Conn", TypeRef::builtin("Conn")))
            .with_function(
                FunctionDecl::new("New")
                    .with_param(TypeRef::builtin("string"))
                    .returning(TypeRef::parse("*Conn").unwrap())
                    .returning_error(),
            )
            .qualify();

        let new = &package.functions[0];
        assert_eq!(new.params[0], TypeRef::builtin("string"));
        assert_eq!(new.results[0], TypeRef::pointer("app/db", "Conn"));
        assert_eq!(new.results[1], TypeRef::error());
        assert_eq!(package.types[0].fields[0].ty, TypeRef::new("app/db", "Conn"));
    }

    #[test]
    fn test_package_name_defaults_to_import() {
        assert_eq!(Package::new("app/db").package_name(), "db");
        assert_eq!(Package::new("app/db").named("database").package_name(), "database");
    }

    #[test]
    fn test_deserialize_package() {
        let json = r#"{
            "import": "app/db",
            "types": [{ "name": "Conn" }, { "name": "Querier", "kind": "interface" }],
            "functions": [{ "name": "New", "results": ["*Conn", "error"] }]
        }"#;
        let package: Package = serde_json::from_str(json).unwrap();
        let package = package.qualify();

        assert_eq!(package.types[0].kind, TypeKind::Struct);
        assert_eq!(package.types[1].kind, TypeKind::Interface);
        assert_eq!(
            package.functions[0].constructs(),
            Some((&TypeRef::pointer("app/db", "Conn"), true))
        );
    }
}
