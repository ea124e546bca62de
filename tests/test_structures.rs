//! Structures: inheritance, alters, overrides, upcopies and late-bound field
//! types.

use compil::model::{DefaultValue, Member, StructureId, TypeRef};
use compil::{Document, MessageKind, parse_str};
use rstest::rstest;

fn combined(document: &Document, id: StructureId) -> Vec<(String, Option<String>)> {
    document
        .combined_fields(id)
        .iter()
        .map(|c| {
            (
                c.field.name.value.to_string(),
                c.default.and_then(DefaultValue::value).map(str::to_string),
            )
        })
        .collect()
}

#[test]
fn test_alter_replaces_inherited_default() {
    let parse =
        parse_str("structure Base { integer x; } structure Derived inherit Base alter x = 7 { }");
    assert!(parse.ok(), "{:?}", parse.messages);
    let derived = parse.document.find_structure("Derived").expect("Derived");
    assert_eq!(
        combined(&parse.document, derived),
        vec![("x".to_string(), Some("7".to_string()))]
    );
}

#[test]
fn test_several_alters() {
    let parse = parse_str(
        "structure Base { integer x; string s; }\n\
         structure Derived inherit Base alter x = 1, s = \"two\" { boolean b; }",
    );
    assert!(parse.ok(), "{:?}", parse.messages);
    let derived = parse.document.find_structure("Derived").expect("Derived");
    assert_eq!(
        combined(&parse.document, derived),
        vec![
            ("x".to_string(), Some("1".to_string())),
            ("s".to_string(), Some("two".to_string())),
            ("b".to_string(), None),
        ]
    );
}

#[test]
fn test_alter_of_unknown_field() {
    let parse = parse_str("structure Base { integer x; } structure D inherit Base alter y = 1 { }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnknownBaseField);
    assert!(parse.document.find_structure("D").is_none());
}

#[rstest]
#[case(
    "enum Later { a; }\n\
     structure Base { Later x; }\n\
     structure D inherit Base alter x = \"str\" { }"
)]
#[case(
    "structure Base { Later x; }\n\
     structure D inherit Base alter x = \"str\" { }\n\
     enum Later { a; }"
)]
fn test_bad_alter_in_either_order(#[case] source: &str) {
    let parse = parse_str(source);
    let kinds: Vec<_> = parse.errors().map(|m| m.kind()).collect();
    assert_eq!(kinds, vec![MessageKind::ExpectValue], "{source}");
    assert!(parse.document.find_structure("D").is_none(), "{source}");
    assert!(parse.document.find_structure("Base").is_some(), "{source}");
}

#[test]
fn test_alter_of_late_bound_field() {
    let parse = parse_str(
        "structure Base { Later x; }\n\
         structure D inherit Base alter x = b { }\n\
         enum Later { a; b; }",
    );
    assert!(parse.ok(), "{:?}", parse.messages);
    let d = parse.document.find_structure("D").expect("D");
    assert_eq!(combined(&parse.document, d), vec![("x".to_string(), Some("b".to_string()))]);
}

#[test]
fn test_late_bound_bad_default_is_dropped() {
    let parse = parse_str("structure S { Later k = 1; integer i; }\nenum Later { a; }");
    let kinds: Vec<_> = parse.errors().map(|m| m.kind()).collect();
    assert_eq!(kinds, vec![MessageKind::ExpectValue]);
    let s = parse.document.find_structure("S").expect("S");
    assert_eq!(
        combined(&parse.document, s),
        vec![("k".to_string(), None), ("i".to_string(), None)]
    );
}

#[test]
fn test_forward_reference_resolves() {
    let parse = parse_str("structure A { B b; vector<B> many; } structure B { integer x; }");
    assert!(parse.ok(), "{:?}", parse.messages);
    let document = &parse.document;
    let a = document.find_structure("A").expect("A");
    let b = document.find_structure("B").expect("B");
    let types: Vec<_> = document.structure(a).fields().map(|(_, f)| f.ty).collect();
    assert_eq!(types[0], Some(TypeRef::Structure(b)));
    let Some(TypeRef::Template(many)) = types[1] else {
        panic!("many is not a template");
    };
    assert_eq!(document.template(many).parameter, Some(TypeRef::Structure(b)));
}

#[test]
fn test_unknown_field_type_reported_at_type_token() {
    let parse = parse_str("structure S { Missing m; integer i; }\nstructure T { }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnknownClassifierType);
    assert_eq!((errors[0].line(), errors[0].column()), (1, 15));
    assert!(parse.document.find_structure("T").is_some());
}

#[test]
fn test_unknown_qualified_type_reported_at_first_segment() {
    let parse = parse_str("structure S {\n  geo.Missing m;\n}");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnknownClassifierType);
    assert_eq!((errors[0].line(), errors[0].column()), (2, 3));

    let parse = parse_str("structure D inherit geo.Missing { }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnknownClassifierType);
    assert_eq!(errors[0].column(), 21);
}

#[test]
fn test_nested_enumeration_used_before_declaration() {
    let parse = parse_str("structure S { Kind k = b; enum Kind { a; b; } }");
    assert!(parse.ok(), "{:?}", parse.messages);
    let document = &parse.document;
    let s = document.find_structure("S").expect("S");
    let nested: Vec<_> = document.structure(s).nested_enumerations().collect();
    assert_eq!(nested.len(), 1);
    let (_, k) = document.structure(s).fields().next().expect("k");
    assert_eq!(k.ty, Some(TypeRef::Enumeration(nested[0])));
}

#[test]
fn test_late_bound_default_is_checked() {
    let parse = parse_str("structure S { Kind k = zz; enum Kind { a; b; } }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::ExpectValue);
    assert_eq!(errors[0].column(), 24);
}

#[test]
fn test_qualified_nested_enumeration() {
    let parse = parse_str(
        "structure Shape { enum Kind { round; square; } }\n\
         structure Tile { Shape.Kind kind = square; }",
    );
    assert!(parse.ok(), "{:?}", parse.messages);
}

#[test]
fn test_override_replaces_base_field() {
    let parse = parse_str(
        "structure Base { integer x; integer y; }\n\
         structure D inherit Base { override integer x = 3; }",
    );
    assert!(parse.ok(), "{:?}", parse.messages);
    let document = &parse.document;
    let base = document.find_structure("Base").expect("Base");
    let d = document.find_structure("D").expect("D");
    assert_eq!(
        combined(document, d),
        vec![("x".to_string(), Some("3".to_string())), ("y".to_string(), None)]
    );
    let x = document.find_field(base, "x").expect("x");
    assert!(document.is_overriden(d, x));
    // own fields come first
    let found = document.find_field(d, "x").expect("x");
    assert_eq!(found.structure, d);
}

#[test]
fn test_override_needs_base_field() {
    let parse = parse_str("structure Base { } structure D inherit Base { override integer x; }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnknownBaseField);
    assert_eq!(errors[0].column(), 47);
}

#[test]
fn test_shadowing_a_base_field_is_rejected() {
    let parse = parse_str("structure Base { integer x; } structure D inherit Base { integer x; }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::FieldShadowsBase);
    assert!(parse.document.find_structure("D").is_none());
}

#[test]
fn test_upcopy_from_ancestor() {
    let parse = parse_str(
        "structure A { } structure B inherit A { } structure C inherit B { upcopy from A; }",
    );
    assert!(parse.ok(), "{:?}", parse.messages);
    let document = &parse.document;
    let a = document.find_structure("A").expect("A");
    let c = document.find_structure("C").expect("C");
    assert!(document.is_recursively_inherit(c, a));
    let upcopy = document.structure(c).members.iter().find_map(|m| match m {
        Member::Upcopy(u) => Some(u.base),
        _ => None,
    });
    assert_eq!(upcopy, Some(a));
}

#[test]
fn test_upcopy_from_unrelated_structure() {
    let parse = parse_str("structure A { } structure B { upcopy from A; integer x; }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UpcopyFromNonAncestor);
    // the member is dropped, the structure survives
    let b = parse.document.find_structure("B").expect("B");
    assert_eq!(parse.document.structure(b).fields().count(), 1);
}

#[test]
fn test_upcopy_from_self() {
    let parse = parse_str("structure A { upcopy from A; }");
    assert_eq!(parse.errors().count(), 1);
    assert_eq!(
        parse.errors().next().map(|m| m.kind()),
        Some(MessageKind::UpcopyFromNonAncestor)
    );
}

#[test]
fn test_identification_is_inherited() {
    let parse = parse_str("structure A { identification; } structure B inherit A { }");
    assert!(parse.ok(), "{:?}", parse.messages);
    let b = parse.document.find_structure("B").expect("B");
    assert!(parse.document.has_runtime_identification(b));
}

#[test]
fn test_bad_operator() {
    let parse = parse_str("structure A { operator >; integer x; }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::ExpectAppropriateType);
    let a = parse.document.find_structure("A").expect("A");
    assert_eq!(parse.document.structure(a).fields().count(), 1);
}

#[test]
fn test_unclaimed_modifier() {
    let parse = parse_str("structure A { runtime integer x; }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnexpectedModifier);
    assert_eq!(errors[0].column(), 15);
}

#[test]
fn test_weak_reference_field() {
    let parse = parse_str("structure N { weak reference<N> up; }");
    assert!(parse.ok(), "{:?}", parse.messages);
    let n = parse.document.find_structure("N").expect("N");
    let (_, up) = parse.document.structure(n).fields().next().expect("up");
    let Some(TypeRef::Template(id)) = up.ty else {
        panic!("up is not a template");
    };
    assert!(parse.document.template(id).weak);
}
