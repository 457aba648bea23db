//! End-to-end tests for the `di` command against throwaway Go modules

use pretty_assertions::assert_eq;
use weld::{Command, Config};
use weld_core::{CoreError, InjectError, TypeRef};
use weld_parser::Module;
use weld_test_fixtures::{TestModule, HTTP_SERVER_INDEX};

const HTTP_SERVER_GO: &str = r#"// Code generated by weld. DO NOT EDIT.

package web

import (
	db "app/db"
	http "app/http"
	log "app/log"
)

func Load() (http.Server, error) {
	dbConn, err := db.New()
	if err != nil {
		return http.Server{}, err
	}
	logLogger := log.New()
	httpServer := http.NewServer(dbConn, logLogger)
	return *httpServer, nil
}
"#;

/// A module `app` with db, log, http and web directories and an index
fn app_module() -> TestModule {
    let module = TestModule::new("app");
    for dir in ["db", "log", "http", "web"] {
        module.mkdir(dir);
    }
    module.write("tools/http.weld.yaml", HTTP_SERVER_INDEX);
    module
}

fn command(module: &TestModule) -> Command {
    Command {
        name: "Load".to_string(),
        target: "web".to_string(),
        dependencies: vec!["http.Server".to_string()],
        dir: module.path().to_path_buf(),
        ..Command::default()
    }
}

#[test]
fn test_generates_http_server() -> Result<(), Box<dyn std::error::Error>> {
    let module = app_module();
    let generated = command(&module).run()?;

    assert_eq!(generated.output(), HTTP_SERVER_GO);
    assert!(generated.tree.is_none());
    Ok(())
}

#[test]
fn test_verbatim_and_directory_references_agree() -> Result<(), Box<dyn std::error::Error>> {
    let module = app_module();
    let mut verbatim = command(&module);
    verbatim.target = "\"app/web\"".to_string();
    verbatim.dependencies = vec!["\"app/http\".Server".to_string()];

    assert_eq!(verbatim.run()?.output(), HTTP_SERVER_GO);
    Ok(())
}

#[test]
fn test_run_from_subdirectory() -> Result<(), Box<dyn std::error::Error>> {
    let module = app_module();
    let mut command = command(&module);
    command.dir = module.path().join("web");

    assert_eq!(command.run()?.output(), HTTP_SERVER_GO);
    Ok(())
}

#[test]
fn test_to_import_path() -> Result<(), Box<dyn std::error::Error>> {
    let module = TestModule::new("github.com/acme/shop");
    module.mkdir("internal/db");
    let found = Module::find(module.path())?;
    let command = Command::default();

    assert_eq!(command.to_import_path(&found, "internal/db")?, "github.com/acme/shop/internal/db");
    assert_eq!(command.to_import_path(&found, "\"./internal/db\"")?, "github.com/acme/shop/internal/db");
    assert_eq!(command.to_import_path(&found, ".")?, "github.com/acme/shop");
    assert_eq!(command.to_import_path(&found, "net/http")?, "net/http");
    assert_eq!(
        command.to_dependency(&found, "*internal/db.Conn")?,
        TypeRef::pointer("github.com/acme/shop/internal/db", "Conn")
    );
    Ok(())
}

#[test]
fn test_build_function_appends_error() -> Result<(), Box<dyn std::error::Error>> {
    let module = app_module();
    let found = Module::find(module.path())?;
    let mut command = command(&module);
    command.externals = vec!["*log.Logger".to_string()];

    let function = command.build_function(&found, &Config::default())?;
    assert_eq!(function.target, "app/web");
    assert_eq!(function.params.len(), 1);
    assert_eq!(function.results.len(), 2);
    assert!(function.has_error_result());
    assert!(!function.hoist);

    command.dependencies.clear();
    let empty = command.build_function(&found, &Config::default())?;
    assert!(empty.results.is_empty());
    Ok(())
}

#[test]
fn test_external_is_passed_through() -> Result<(), Box<dyn std::error::Error>> {
    let module = app_module();
    let mut command = command(&module);
    command.externals = vec!["*log.Logger".to_string()];

    let source = command.run()?.output();
    assert!(source.contains("func Load(logLogger *log.Logger) (http.Server, error) {"));
    assert!(!source.contains("log.New()"));
    Ok(())
}

#[test]
fn test_unused_external_fails() {
    let module = app_module();
    let mut command = command(&module);
    command.dependencies = vec!["db.Conn".to_string()];
    command.externals = vec!["*log.Logger".to_string()];

    let err = command.run().unwrap_err();
    assert_eq!(
        err.downcast_ref::<InjectError>(),
        Some(&InjectError::UnusedParam(TypeRef::pointer("app/log", "Logger")))
    );
}

#[test]
fn test_malformed_reference() {
    let module = app_module();
    let mut command = command(&module);
    command.dependencies = vec!["Server".to_string()];

    let err = command.run().unwrap_err();
    assert_eq!(
        err.to_string(),
        "dependency must have the form '<import>.<type>', got \"Server\""
    );
}

#[test]
fn test_ambiguous_mapping() {
    let module = app_module();
    let mut command = command(&module);
    command.map = vec![
        ("db.Conn".to_string(), "db.Pool".to_string()),
        ("db.Conn".to_string(), "db.Replica".to_string()),
    ];

    let err = command.run().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<CoreError>(),
        Some(CoreError::AmbiguousAlias { .. })
    ));
}

#[test]
fn test_verbose_and_dot() -> Result<(), Box<dyn std::error::Error>> {
    let module = app_module();
    let mut command = command(&module);
    command.verbose = true;
    command.dot = true;

    let generated = command.run()?;
    let tree = generated.tree.as_deref().unwrap_or_default();
    assert!(tree.starts_with("Load in \"app/web\""));
    assert!(tree.contains("(fallible)"));

    let output = generated.output();
    assert!(output.starts_with("digraph {"));
    assert_eq!(generated.artifact.file(), HTTP_SERVER_GO);
    Ok(())
}

#[test]
fn test_config_paths_without_discovery() -> Result<(), Box<dyn std::error::Error>> {
    let module = TestModule::new("app");
    module.mkdir("web");
    module.write("tools/index/http.yaml", HTTP_SERVER_INDEX);
    module.write("broken.weld.yaml", "packages: [");
    module.write(
        "weld.toml",
        "[index]\npaths = [\"tools/index/http.yaml\"]\ndiscover = false\n\n[generate]\nhoist = true\n",
    );

    let mut command = command(&module);
    command.dependencies = vec!["\"app/http\".Server".to_string()];
    assert_eq!(command.run()?.output(), HTTP_SERVER_GO);

    let found = Module::find(module.path())?;
    let config = Config::load(found.dir())?;
    assert!(command.build_function(&found, &config)?.hoist);
    assert_eq!(command.index_files(&found, &config)?.len(), 1);
    Ok(())
}

#[test]
fn test_discovery_reports_broken_index() {
    let module = app_module();
    module.write("broken.weld.yaml", "packages: [");

    assert!(command(&module).run().is_err());
}

#[test]
fn test_explicit_index_is_not_loaded_twice() -> Result<(), Box<dyn std::error::Error>> {
    let module = app_module();
    let mut command = command(&module);
    command.index = vec![module.path().join("tools/http.weld.yaml")];

    let found = Module::find(module.path())?;
    assert_eq!(command.index_files(&found, &Config::default())?.len(), 1);
    assert_eq!(command.run()?.output(), HTTP_SERVER_GO);
    Ok(())
}
