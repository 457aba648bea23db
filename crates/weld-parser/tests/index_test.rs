//! Integration tests for index discovery and module resolution on disk

use pretty_assertions::assert_eq;
use weld_core::{Function, Injector, PackageSource};
use weld_parser::{Module, PackageIndex, ParserError};
use weld_test_fixtures::{val, TestModule, HTTP_SERVER_INDEX};

#[test]
fn test_discover_and_load() -> Result<(), Box<dyn std::error::Error>> {
    let module = TestModule::new("app");
    let yaml = module.write("internal/http.weld.yaml", HTTP_SERVER_INDEX);
    let json = module.write(
        "cache.weld.json",
        r#"{"packages": [{"import": "app/cache", "types": [{"name": "Store", "kind": "interface"}]}]}"#,
    );
    module.write("notes.yaml", "packages: []\n");

    let files = PackageIndex::discover(module.path());
    assert_eq!(files, vec![json, yaml]);

    let registry = PackageIndex::load_all(&files)?.into_registry()?;
    assert_eq!(registry.len(), 4);
    assert!(registry.package("app/cache").is_some());

    let function = Function::new("Load", "app/web")
        .with_result(val("app/http", "Server"))
        .with_error();
    let graph = Injector::new(&registry).load(&function)?;
    assert_eq!(graph.providers().count(), 3);
    Ok(())
}

#[test]
fn test_duplicate_across_files() -> Result<(), Box<dyn std::error::Error>> {
    let module = TestModule::new("app");
    let first = module.write("a.weld.yaml", HTTP_SERVER_INDEX);
    let second = module.write("b.weld.yml", "packages:\n  - import: app/db\n");

    let err = PackageIndex::load_all(&[first, second])?.into_registry().unwrap_err();
    assert_eq!(err.to_string(), "Package \"app/db\" is declared more than once");
    Ok(())
}

#[test]
fn test_invalid_index_file() {
    let module = TestModule::new("app");
    let toml = module.write("index.toml", "");
    assert!(matches!(
        PackageIndex::from_file(&toml),
        Err(ParserError::InvalidIndex { .. })
    ));

    let empty_import = module.write("bad.weld.yaml", "packages:\n  - import: \"\"\n");
    assert!(matches!(
        PackageIndex::from_file(&empty_import),
        Err(ParserError::InvalidIndex { .. })
    ));

    assert!(matches!(
        PackageIndex::from_file(&module.path().join("missing.weld.json")),
        Err(ParserError::Io(_))
    ));
}

#[test]
fn test_find_module_from_subdirectory() -> Result<(), Box<dyn std::error::Error>> {
    let module = TestModule::new("github.com/acme/shop");
    let nested = module.mkdir("web/db");

    let found = Module::find(&nested)?;
    assert_eq!(found.path(), "github.com/acme/shop");
    assert_eq!(found.dir(), module.path().canonicalize()?);

    let dir = found.directory("web/db");
    assert!(dir.is_dir());
    assert_eq!(found.resolve_import(&dir)?, "github.com/acme/shop/web/db");
    Ok(())
}

#[test]
fn test_module_without_directive() -> Result<(), Box<dyn std::error::Error>> {
    let module = TestModule::new("app");
    module.write("go.mod", "go 1.22\n");

    assert!(matches!(
        Module::find(module.path()),
        Err(ParserError::InvalidModule { .. })
    ));
    Ok(())
}

#[test]
fn test_module_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    // A go.mod in an ancestor of the temp dir would be found instead
    if dir.path().ancestors().any(|d| d.join("go.mod").is_file()) {
        return Ok(());
    }
    assert!(matches!(
        Module::find(dir.path()),
        Err(ParserError::ModuleNotFound(_))
    ));
    Ok(())
}
