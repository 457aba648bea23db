//! Test fixtures for weld
//!
//! Provides small provider graphs shaped like a typical Go service, the same
//! declarations as a package index document, and throwaway Go modules on disk.

use std::fs;
use std::path::{Path, PathBuf};

use weld_core::{FunctionDecl, Package, PackageRegistry, TypeDecl, TypeKind, TypeRef};

pub fn ptr(import: &str, name: &str) -> TypeRef {
    TypeRef::pointer(import, name)
}

pub fn val(import: &str, name: &str) -> TypeRef {
    TypeRef::new(import, name)
}

/// `db.New() (*Conn, error)`, `log.New() *Logger` and
/// `http.NewServer(*db.Conn, *log.Logger) *Server`
pub fn http_server() -> PackageRegistry {
    PackageRegistry::new()
        .with_package(
            Package::new("app/db")
                .with_type(TypeDecl::new("Conn", TypeKind::Struct))
                .with_function(FunctionDecl::new("New").returning(ptr("app/db", "Conn")).returning_error()),
        )
        .with_package(
            Package::new("app/log")
                .with_type(TypeDecl::new("Logger", TypeKind::Struct))
                .with_function(FunctionDecl::new("New").returning(ptr("app/log", "Logger"))),
        )
        .with_package(
            Package::new("app/http")
                .with_type(TypeDecl::new("Server", TypeKind::Struct))
                .with_function(
                    FunctionDecl::new("NewServer")
                        .with_param(ptr("app/db", "Conn"))
                        .with_param(ptr("app/log", "Logger"))
                        .returning(ptr("app/http", "Server")),
                ),
        )
}

/// [`http_server`] plus `audit.NewLog(db.Conn) *Log`, which takes the
/// connection by value while `http.NewServer` takes it by pointer
pub fn mixed_indirection() -> PackageRegistry {
    http_server().with_package(
        Package::new("app/audit")
            .with_type(TypeDecl::new("Log", TypeKind::Struct))
            .with_function(
                FunctionDecl::new("NewLog")
                    .with_param(val("app/db", "Conn"))
                    .returning(ptr("app/audit", "Log")),
            ),
    )
}

/// [`http_server`] plus consumers sharing the database connection
///
/// - `users.NewRepo(*db.Conn) *Repo`
/// - `app.App{Server *http.Server, Users *users.Repo, Name string}`
/// - `sessions.NewManager(cache.Store) *Manager`, where `cache.Store` is an
///   interface implemented by `*cache.Memory`
/// - `config.Config`, only ever supplied by the caller
pub fn web_app() -> PackageRegistry {
    let mut registry = http_server();
    for package in [
        Package::new("app/users")
            .with_type(TypeDecl::new("Repo", TypeKind::Struct))
            .with_function(
                FunctionDecl::new("NewRepo")
                    .with_param(ptr("app/db", "Conn"))
                    .returning(ptr("app/users", "Repo")),
            ),
        Package::new("app/app").with_type(
            TypeDecl::new("App", TypeKind::Struct)
                .with_field("Server", ptr("app/http", "Server"))
                .with_field("Users", ptr("app/users", "Repo"))
                .with_field("Name", TypeRef::builtin("string")),
        ),
        Package::new("app/cache")
            .with_type(TypeDecl::new("Store", TypeKind::Interface))
            .with_type(TypeDecl::new("Memory", TypeKind::Struct))
            .with_function(FunctionDecl::new("NewMemory").returning(ptr("app/cache", "Memory"))),
        Package::new("app/sessions")
            .with_type(TypeDecl::new("Manager", TypeKind::Struct))
            .with_function(
                FunctionDecl::new("NewManager")
                    .with_param(val("app/cache", "Store"))
                    .returning(ptr("app/sessions", "Manager")),
            ),
        Package::new("app/config").with_type(TypeDecl::new("Config", TypeKind::Struct)),
    ] {
        registry.register(package);
    }
    registry
}

/// `a.NewA(*b.B) *A` and `b.NewB(*a.A) *B`
pub fn cyclic() -> PackageRegistry {
    PackageRegistry::new()
        .with_package(
            Package::new("app/a")
                .with_type(TypeDecl::new("A", TypeKind::Struct))
                .with_function(FunctionDecl::new("NewA").with_param(ptr("app/b", "B")).returning(ptr("app/a", "A"))),
        )
        .with_package(
            Package::new("app/b")
                .with_type(TypeDecl::new("B", TypeKind::Struct))
                .with_function(FunctionDecl::new("NewB").with_param(ptr("app/a", "A")).returning(ptr("app/b", "B"))),
        )
}

/// The [`http_server`] declarations as a YAML package index
pub const HTTP_SERVER_INDEX: &str = r#"packages:
  - import: app/db
    types:
      - name: Conn
    functions:
      - name: New
        results: ["*Conn", error]
  - import: app/log
    types:
      - name: Logger
    functions:
      - name: New
        results: ["*Logger"]
  - import: app/http
    types:
      - name: Server
    functions:
      - name: NewServer
        params: ['"app/db".*Conn', '"app/log".*Logger']
        results: ["*Server"]
"#;

/// A throwaway Go module rooted in a temporary directory
pub struct TestModule {
    dir: tempfile::TempDir,
}

impl TestModule {
    /// Create a module whose `go.mod` declares `module`
    pub fn new(module: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), format!("module {}\n\ngo 1.22\n", module)).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }
}

/// Random acyclic provider graphs for property tests
///
/// Type `Ti` lives in `app/pi` and is built by `New`, which may only depend on
/// types with a lower index, so every generated registry is free of cycles.
pub mod layered {
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use weld_core::{Function, FunctionDecl, Package, PackageRegistry, TypeDecl, TypeKind, TypeRef};

    #[derive(Debug, Clone)]
    pub struct Layered {
        /// For each type: indices of its dependencies and whether `New` can fail
        pub types: Vec<(Vec<usize>, bool)>,
        pub results: Vec<usize>,
    }

    pub fn type_ref(i: usize) -> TypeRef {
        TypeRef::pointer(format!("app/p{}", i), format!("T{}", i))
    }

    pub fn layered() -> impl Strategy<Value = Layered> {
        (1usize..8).prop_flat_map(|n| {
            (
                prop::collection::vec((prop::collection::vec(any::<bool>(), n), any::<bool>()), n),
                prop::collection::vec(any::<bool>(), n),
            )
                .prop_map(move |(types, picked)| {
                    let types = types
                        .into_iter()
                        .enumerate()
                        .map(|(i, (mask, fallible))| {
                            let deps: Vec<usize> = (0..i).filter(|j| mask[*j]).collect();
                            (deps, fallible)
                        })
                        .collect();
                    let mut results: Vec<usize> = (0..n).filter(|i| picked[*i]).collect();
                    if results.is_empty() {
                        results.push(n - 1);
                    }
                    Layered { types, results }
                })
        })
    }

    impl Layered {
        pub fn registry(&self) -> PackageRegistry {
            self.types
                .iter()
                .enumerate()
                .map(|(i, (deps, fallible))| {
                    let mut new = FunctionDecl::new("New");
                    for dep in deps {
                        new = new.with_param(type_ref(*dep));
                    }
                    new = new.returning(type_ref(i));
                    if *fallible {
                        new = new.returning_error();
                    }
                    Package::new(format!("app/p{}", i))
                        .with_type(TypeDecl::new(format!("T{}", i), TypeKind::Struct))
                        .with_function(new)
                })
                .collect()
        }

        pub fn function(&self, hoist: bool) -> Function {
            self.results
                .iter()
                .fold(Function::new("Load", "app/web"), |f, i| f.with_result(type_ref(*i)))
                .hoisted(hoist)
        }

        /// Types transitively required by the results
        pub fn reachable(&self) -> BTreeSet<usize> {
            let mut seen = BTreeSet::new();
            let mut stack = self.results.clone();
            while let Some(i) = stack.pop() {
                if seen.insert(i) {
                    stack.extend(self.types[i].0.iter().copied());
                }
            }
            seen
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weld_core::PackageSource;

    #[test]
    fn fixtures_are_valid() {
        let registry = web_app();
        assert_eq!(registry.len(), 8);
        assert!(registry.package("app/sessions").is_some());
        assert_eq!(cyclic().len(), 2);
        assert_eq!(mixed_indirection().len(), 4);

        let module = TestModule::new("app");
        assert!(module.path().join("go.mod").exists());
        assert!(module.mkdir("db").is_dir());
    }
}
