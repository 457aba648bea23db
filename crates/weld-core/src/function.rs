//! The resolution request: which function to generate and what it must return

use std::collections::BTreeMap;

use crate::dependency::{Dependency, TypeRef};
use crate::error::{CoreError, InjectError};

/// Substitutions applied before a dependency is looked up
///
/// "When something asks for `from`, supply `to` instead." Keys map to exactly
/// one value and never to themselves; chains are followed at resolution time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases(BTreeMap<TypeRef, TypeRef>);

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: TypeRef, to: TypeRef) -> Result<(), CoreError> {
        if from == to {
            return Err(CoreError::IdentityAlias(from));
        }
        match self.0.get(&from) {
            Some(existing) if *existing == to => Ok(()),
            Some(existing) => Err(CoreError::AmbiguousAlias {
                first: existing.clone(),
                second: to,
                from,
            }),
            None => {
                self.0.insert(from, to);
                Ok(())
            }
        }
    }

    pub fn get(&self, from: &TypeRef) -> Option<&TypeRef> {
        self.0.get(from)
    }

    /// Follow the alias chain for `dependency` to a fixed point
    pub fn resolve(&self, dependency: &TypeRef) -> Result<TypeRef, InjectError> {
        let mut seen = vec![dependency.clone()];
        let mut current = dependency;
        while let Some(next) = self.0.get(current) {
            if seen.contains(next) {
                seen.push(next.clone());
                let start = seen.iter().position(|t| t == next).unwrap_or(0);
                return Err(InjectError::AliasCycle {
                    cycle: seen[start..].to_vec(),
                });
            }
            seen.push(next.clone());
            current = next;
        }
        Ok(current.clone())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeRef, &TypeRef)> {
        self.0.iter()
    }
}

/// A function to generate
#[derive(Debug, Clone, Default)]
pub struct Function {
    /// Name of the generated function (e.g., "Load")
    pub name: String,
    /// Import path of the package the function is generated into
    pub target: String,
    /// Values the generated function accepts, in declared order
    pub params: Vec<Dependency>,
    /// Values the generated function returns, in declared order
    pub results: Vec<Dependency>,
    pub aliases: Aliases,
    /// Construct each dependency once and reuse it across the function
    pub hoist: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, param: TypeRef) -> Self {
        self.params.push(Dependency::Param(param));
        self
    }

    pub fn with_result(mut self, result: TypeRef) -> Self {
        self.results.push(Dependency::from(result));
        self
    }

    pub fn with_error(mut self) -> Self {
        self.results.push(Dependency::Error);
        self
    }

    pub fn with_alias(mut self, from: TypeRef, to: TypeRef) -> Result<Self, CoreError> {
        self.aliases.insert(from, to)?;
        Ok(self)
    }

    pub fn hoisted(mut self, hoist: bool) -> Self {
        self.hoist = hoist;
        self
    }

    pub fn has_error_result(&self) -> bool {
        self.results.iter().any(Dependency::is_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(name: &str) -> TypeRef {
        TypeRef::new("app/x", name)
    }

    #[test]
    fn test_identity_alias_rejected() {
        let mut aliases = Aliases::new();
        assert_eq!(
            aliases.insert(t("A"), t("A")),
            Err(CoreError::IdentityAlias(t("A")))
        );
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_ambiguous_alias_rejected() {
        let mut aliases = Aliases::new();
        aliases.insert(t("I"), t("A")).unwrap();
        aliases.insert(t("I"), t("A")).unwrap();
        assert!(matches!(
            aliases.insert(t("I"), t("B")),
            Err(CoreError::AmbiguousAlias { .. })
        ));
        assert_eq!(aliases.get(&t("I")), Some(&t("A")));
    }

    #[test]
    fn test_resolve_follows_chain() {
        let mut aliases = Aliases::new();
        aliases.insert(t("A"), t("B")).unwrap();
        aliases.insert(t("B"), t("C")).unwrap();
        assert_eq!(aliases.resolve(&t("A")).unwrap(), t("C"));
        assert_eq!(aliases.resolve(&t("C")).unwrap(), t("C"));
    }

    #[test]
    fn test_resolve_detects_cycle() {
        let mut aliases = Aliases::new();
        aliases.insert(t("A"), t("B")).unwrap();
        aliases.insert(t("B"), t("C")).unwrap();
        aliases.insert(t("C"), t("B")).unwrap();

        let err = aliases.resolve(&t("A")).unwrap_err();
        assert_eq!(
            err,
            InjectError::AliasCycle {
                cycle: vec![t("B"), t("C"), t("B")]
            }
        );
    }

    #[test]
    fn test_function_builder() {
        let function = Function::new("Load", "app/web")
            .with_param(t("Config"))
            .with_result(t("Server"))
            .with_result(TypeRef::error())
            .hoisted(true);

        assert_eq!(function.params, vec![Dependency::Param(t("Config"))]);
        assert_eq!(function.results.len(), 2);
        assert!(function.has_error_result());
        assert!(function.hoist);
    }
}
