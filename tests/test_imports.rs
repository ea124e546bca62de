//! Import handling: deduplication, cycles, failures and cross-source types.

use std::fs;

use compil::model::TypeRef;
use compil::{
    FileSourceProvider, MemorySourceProvider, MessageKind, Parse, ParseOptions, ParseSession,
    parse_str,
};
use tempfile::TempDir;

fn parse_root(provider: &MemorySourceProvider, root: &str) -> Parse {
    let id = provider.source_id(root).expect("root is known");
    ParseSession::new().with_provider(provider).parse_source(id)
}

fn kinds(parse: &Parse) -> Vec<MessageKind> {
    parse.messages.iter().map(|m| m.kind()).collect()
}

// ============================================================================
// STATEMENT SYNTAX
// ============================================================================

#[test]
fn test_import_without_source() {
    let parse = parse_str("import");
    assert_eq!(kinds(&parse), vec![MessageKind::ExpectImportSource]);
    assert_eq!((parse.messages[0].line(), parse.messages[0].column()), (1, 7));
    assert!(!parse.ok());
}

#[test]
fn test_import_without_semicolon() {
    let parse = parse_str("import \"blah\"");
    assert_eq!(kinds(&parse), vec![MessageKind::ExpectSemicolon]);
    assert_eq!((parse.messages[0].line(), parse.messages[0].column()), (1, 14));
}

#[test]
fn test_import_without_provider_warns() {
    let parse = parse_str("import \"blah\";");
    assert_eq!(kinds(&parse), vec![MessageKind::ImportWithoutSourceProvider]);
    assert_eq!((parse.messages[0].line(), parse.messages[0].column()), (1, 1));
    assert!(parse.ok());
    assert_eq!(parse.document.imports().len(), 1);
    assert!(parse.document.imports()[0].resolved.is_none());
}

#[test]
fn test_import_after_declaration_is_unknown_statement() {
    let parse = parse_str("structure A { }\nimport \"b\";");
    assert_eq!(kinds(&parse), vec![MessageKind::UnknownStatement]);
    assert_eq!(parse.messages[0].line(), 2);
}

// ============================================================================
// IMPORT GRAPH
// ============================================================================

#[test]
fn test_diamond_import_parses_shared_source_once() {
    let provider = MemorySourceProvider::new()
        .with_source("main", "import \"left\"; import \"right\"; structure Main { Shared s; }")
        .with_source("left", "import \"shared\"; structure Left { Shared s; }")
        .with_source("right", "import \"shared\"; structure Right { Shared s; }")
        .with_source("shared", "structure Shared { integer x; }");

    let parse = parse_root(&provider, "main");
    assert!(parse.ok(), "{:?}", parse.messages);
    assert!(parse.messages.is_empty());
    let shared: Vec<_> = parse
        .document
        .structures()
        .filter(|id| parse.document.structure(*id).name == "Shared")
        .collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(parse.document.declarations().len(), 4);
}

#[test]
fn test_self_import_succeeds() {
    let provider =
        MemorySourceProvider::new().with_source("self", "import \"self\"; structure S { }");
    let parse = parse_root(&provider, "self");
    assert!(parse.ok(), "{:?}", parse.messages);
    assert!(parse.document.find_structure("S").is_some());
}

#[test]
fn test_indirect_cycle_succeeds() {
    let provider = MemorySourceProvider::new()
        .with_source("a", "import \"b\"; structure A { B b; }")
        .with_source("b", "import \"a\"; structure B { A a; }");
    let parse = parse_root(&provider, "a");
    assert!(parse.ok(), "{:?}", parse.messages);
    let a = parse.document.find_structure("A").expect("A");
    let b = parse.document.find_structure("B").expect("B");
    let (_, field) = parse.document.structure(b).fields().next().expect("a");
    // A is declared after the import returns
    assert_eq!(field.ty, Some(TypeRef::Structure(a)));
    let (_, field) = parse.document.structure(a).fields().next().expect("b");
    assert_eq!(field.ty, Some(TypeRef::Structure(b)));
}

#[test]
fn test_type_from_later_sibling_import() {
    let provider = MemorySourceProvider::new()
        .with_source("main", "import \"first\"; import \"second\";")
        .with_source("first", "structure First { Second next; }")
        .with_source("second", "structure Second { integer x; }");
    let parse = parse_root(&provider, "main");
    assert!(parse.ok(), "{:?}", parse.messages);
    let first = parse.document.find_structure("First").expect("First");
    let second = parse.document.find_structure("Second").expect("Second");
    let (_, next) = parse.document.structure(first).fields().next().expect("next");
    assert_eq!(next.ty, Some(TypeRef::Structure(second)));
}

#[test]
fn test_unknown_type_in_import_points_at_import() {
    let provider = MemorySourceProvider::new()
        .with_source("main", "import \"lib\";\nstructure Main { }")
        .with_source("lib", "\nstructure Lib { Nowhere n; }");
    let parse = parse_root(&provider, "main");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnknownClassifierType);
    assert_eq!(errors[0].source().map(|s| s.value()), Some("lib"));
    assert_eq!((errors[0].line(), errors[0].column()), (2, 17));
}

#[test]
fn test_forward_name_prefers_own_package() {
    let provider = MemorySourceProvider::new()
        .with_source(
            "main",
            "import \"first\";\nimport \"second\";\npackage a;\nstructure T { }",
        )
        .with_source("first", "package a;\nstructure S { T t; }")
        .with_source("second", "package b;\nstructure T { }");
    let parse = parse_root(&provider, "main");
    assert!(parse.ok(), "{:?}", parse.messages);

    let document = &parse.document;
    let s = document.find_structure("S").expect("S");
    let (_, t) = document.structure(s).fields().next().expect("t");
    let Some(TypeRef::Structure(bound)) = t.ty else {
        panic!("t is not bound to a structure");
    };
    let package = document.structure(bound).package.clone().expect("package");
    assert_eq!(package.short_path().collect::<Vec<_>>(), vec!["a"]);
}

#[test]
fn test_forward_name_falls_back_to_other_package() {
    let provider = MemorySourceProvider::new()
        .with_source("main", "import \"first\";\nimport \"second\";\npackage a;")
        .with_source("first", "package a;\nstructure S { T t; }")
        .with_source("second", "package b;\nstructure T { }");
    let parse = parse_root(&provider, "main");
    assert!(parse.ok(), "{:?}", parse.messages);

    let document = &parse.document;
    let s = document.find_structure("S").expect("S");
    let t = document.find_structure("T").expect("T");
    let (_, field) = document.structure(s).fields().next().expect("t");
    assert_eq!(field.ty, Some(TypeRef::Structure(t)));
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
fn test_missing_import_stops_the_parse() {
    let provider = MemorySourceProvider::new()
        .with_source("main", "import \"nowhere\";\nstructure Main { }");
    let parse = parse_root(&provider, "main");
    assert_eq!(kinds(&parse), vec![MessageKind::SourceNotFound]);
    assert!(!parse.ok());
    assert!(parse.document.find_structure("Main").is_none());
}

#[test]
fn test_unopenable_import() {
    let mut provider = MemorySourceProvider::new().with_source("main", "import \"locked\";");
    provider.set_unopenable("locked");
    let parse = parse_root(&provider, "main");
    assert_eq!(kinds(&parse), vec![MessageKind::OpenSourceFailed]);
    assert!(!parse.ok());
}

#[test]
fn test_failure_in_nested_import_propagates() {
    let provider = MemorySourceProvider::new()
        .with_source("main", "import \"middle\"; structure Main { }")
        .with_source("middle", "import \"gone\"; structure Middle { }");
    let parse = parse_root(&provider, "main");
    assert_eq!(kinds(&parse), vec![MessageKind::SourceNotFound]);
    assert_eq!(parse.messages[0].source().map(|s| s.value()), Some("middle"));
    assert!(parse.document.find_structure("Main").is_none());
}

#[test]
fn test_unopenable_root() {
    let mut provider = MemorySourceProvider::new();
    provider.set_unopenable("root");
    let parse = parse_root(&provider, "root");
    assert_eq!(kinds(&parse), vec![MessageKind::OpenSourceFailed]);
    assert_eq!((parse.messages[0].line(), parse.messages[0].column()), (1, 1));
    assert!(!parse.ok());
}

#[test]
fn test_import_depth_limit() {
    let provider = MemorySourceProvider::new()
        .with_source("l0", "import \"l1\";")
        .with_source("l1", "import \"l2\";")
        .with_source("l2", "import \"l3\";")
        .with_source("l3", "structure Deep { }");

    let id = provider.source_id("l0").expect("l0");
    let parse = ParseSession::new()
        .with_options(ParseOptions::default().with_max_import_depth(2))
        .with_provider(&provider)
        .parse_source(id);
    assert_eq!(kinds(&parse), vec![MessageKind::ImportDepthExceeded]);
    assert!(!parse.ok());

    let id = provider.source_id("l0").expect("l0");
    let parse = ParseSession::new()
        .with_options(ParseOptions::default().with_max_import_depth(3))
        .with_provider(&provider)
        .parse_source(id);
    assert!(parse.ok(), "{:?}", parse.messages);
}

// ============================================================================
// PACKAGES
// ============================================================================

#[test]
fn test_package_elements_from_import_path() {
    let provider = MemorySourceProvider::new()
        .with_source("main", "import \"geo/shapes/point\";\nstructure Use { geo.shapes.Point p; }")
        .with_source("geo/shapes/point", "package *.*;\nstructure Point { integer x; }");
    let parse = parse_root(&provider, "main");
    assert!(parse.ok(), "{:?}", parse.messages);

    let point = parse.document.find_structure("Point").expect("Point");
    let package = parse.document.structure(point).package.clone().expect("package");
    assert_eq!(package.short_path().collect::<Vec<_>>(), vec!["geo", "shapes"]);
    assert!(package.short.iter().all(|e| e.inherited));
    // imported packages do not become the document package
    assert!(parse.document.package().is_none());
}

#[test]
fn test_package_element_without_import_path() {
    let parse = parse_str("package *.model;");
    assert_eq!(kinds(&parse), vec![MessageKind::UnresolvedPackageElement]);
    assert_eq!(
        parse.messages[0].param(compil::diagnostics::ParamKey::Position),
        Some("1")
    );
}

#[test]
fn test_package_with_levels() {
    let parse = parse_str("package app.model | com.example.app.model;\nenum E { a; }");
    assert!(parse.ok(), "{:?}", parse.messages);
    let package = parse.document.package().expect("package");
    assert_eq!(package.short_path().collect::<Vec<_>>(), vec!["app", "model"]);
    assert_eq!(
        package.levels_path().collect::<Vec<_>>(),
        vec!["com", "example", "app", "model"]
    );
}

#[test]
fn test_package_elements_from_sibling_file_import() {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("geo")).expect("mkdir");
    fs::write(
        dir.path().join("main.compil"),
        "import \"geo/point.compil\";\nstructure Use { geo.Shape shape; }\n",
    )
    .expect("write");
    fs::write(
        dir.path().join("geo/point.compil"),
        "import \"shape.compil\";\npackage *;\nstructure Point { integer x; }\n",
    )
    .expect("write");
    fs::write(
        dir.path().join("geo/shape.compil"),
        "package *;\nstructure Shape { integer sides; }\n",
    )
    .expect("write");

    let provider = FileSourceProvider::new().with_base_dir(dir.path());
    let root = provider.root("main.compil").expect("root");
    let parse = ParseSession::new().with_provider(&provider).parse_source(root);
    assert!(parse.ok(), "{:?}", parse.messages);

    for name in ["Point", "Shape"] {
        let id = parse.document.find_structure(name).expect(name);
        let package = parse.document.structure(id).package.clone().expect("package");
        assert_eq!(package.short_path().collect::<Vec<_>>(), vec!["geo"], "{name}");
    }
}
