//! Structural properties of generated functions over random provider graphs

use std::collections::HashSet;

use proptest::prelude::*;
use weld_codegen::generate;
use weld_core::Injector;
use weld_test_fixtures::layered::layered;

/// Split `name := call(args)` or `name, err := call(args)` into name and args
fn binding(line: &str) -> Option<(&str, Vec<&str>)> {
    let (lhs, rhs) = line.trim().split_once(" := ")?;
    let name = lhs.trim_end_matches(", err");
    let args = rhs.split_once('(')?.1.trim_end_matches(')');
    let args = args
        .split(", ")
        .filter(|a| !a.is_empty())
        .map(|a| a.trim_start_matches(['&', '*']))
        .collect();
    Some((name, args))
}

proptest! {
    #[test]
    fn values_are_bound_before_use(spec in layered(), hoist in any::<bool>()) {
        let registry = spec.registry();
        let graph = Injector::new(&registry).load(&spec.function(hoist)).unwrap();
        let artifact = generate(&registry, &graph).unwrap();

        let mut bound = HashSet::new();
        for line in artifact.function.lines() {
            if let Some((name, args)) = binding(line) {
                for arg in args {
                    prop_assert!(bound.contains(arg), "{} used before it is bound", arg);
                }
                prop_assert!(bound.insert(name.to_string()), "{} bound twice", name);
            }
        }
        prop_assert_eq!(bound.len(), graph.providers().count());
    }

    #[test]
    fn every_fallible_call_is_checked(spec in layered(), hoist in any::<bool>()) {
        let registry = spec.registry();
        let graph = Injector::new(&registry).load(&spec.function(hoist)).unwrap();
        let function = generate(&registry, &graph).unwrap().function;

        let fallible = graph.providers().filter(|id| graph.node(*id).is_fallible()).count();
        prop_assert_eq!(function.matches("if err != nil {").count(), fallible);
        prop_assert_eq!(function.matches(", err := ").count(), fallible);
        prop_assert_eq!(function.matches('{').count(), function.matches('}').count());
    }
}
