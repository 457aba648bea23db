use std::fmt;

use thiserror::Error;

use crate::dependency::TypeRef;

/// Errors raised while building dependency identities and alias maps
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("dependency must have the form '<import>.<type>', got {0:?}")]
    MalformedReference(String),

    #[error("missing type name in {0:?}")]
    EmptyTypeName(String),

    #[error("invalid type name {name:?} in {reference:?}")]
    InvalidTypeName { reference: String, name: String },

    #[error("alias maps {0} to itself")]
    IdentityAlias(TypeRef),

    #[error("ambiguous alias for {from}: {first} or {second}")]
    AmbiguousAlias {
        from: TypeRef,
        first: TypeRef,
        second: TypeRef,
    },
}

/// Errors raised while resolving a function into a dependency graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectError {
    #[error("no provider for {dependency}{chain}")]
    NotFound { dependency: TypeRef, chain: Chain },

    #[error("unknown package {import:?} while resolving {dependency}{chain}")]
    UnknownPackage {
        import: String,
        dependency: TypeRef,
        chain: Chain,
    },

    #[error("ambiguous providers for {dependency}: {}{chain}", .candidates.join(", "))]
    Ambiguous {
        dependency: TypeRef,
        candidates: Vec<String>,
        chain: Chain,
    },

    #[error("dependency cycle: {}", join(.cycle))]
    Cycle { cycle: Vec<TypeRef> },

    #[error("alias cycle: {}", join(.cycle))]
    AliasCycle { cycle: Vec<TypeRef> },

    #[error("external {0} is declared but never used")]
    UnusedParam(TypeRef),

    #[error("external {0} is declared more than once")]
    DuplicateParam(TypeRef),

    #[error("error cannot be supplied as an external")]
    ErrorParam,

    #[error("error result is declared more than once")]
    DuplicateErrorResult,
}

/// The path of dependencies that led to a failing lookup, outermost first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain(Vec<TypeRef>);

impl Chain {
    pub fn new(path: Vec<TypeRef>) -> Self {
        Self(path)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn path(&self) -> &[TypeRef] {
        &self.0
    }
}

impl From<&[TypeRef]> for Chain {
    fn from(path: &[TypeRef]) -> Self {
        Self(path.to_vec())
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        write!(f, " (needed by {})", join(&self.0))
    }
}

fn join(path: &[TypeRef]) -> String {
    path.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
