//! Error recovery: one diagnostic per broken construct, the rest of the
//! source still parsed.

use compil::{MessageKind, Severity, parse_str};
use rstest::rstest;

#[test]
fn test_broken_declarations_do_not_cascade() {
    let parse = parse_str(
        "structure A { integer x }\n\
         structure B { integer y; }\n\
         enum C { one two; }\n\
         enum D { three; }",
    );
    let kinds: Vec<_> = parse.errors().map(|m| m.kind()).collect();
    assert_eq!(kinds, vec![MessageKind::ExpectSemicolon, MessageKind::ExpectSemicolon]);
    assert!(parse.document.find_structure("B").is_some());
    assert!(parse.document.find_enumeration("D").is_some());
}

#[test]
fn test_member_error_keeps_the_structure() {
    let parse = parse_str("structure A { integer = 3; string s; }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::ExpectStatementName);
    let a = parse.document.find_structure("A").expect("A");
    let names: Vec<_> = parse
        .document
        .structure(a)
        .fields()
        .map(|(_, f)| f.name.value.to_string())
        .collect();
    assert_eq!(names, vec!["s"]);
}

#[test]
fn test_unknown_top_level_statement() {
    let parse = parse_str("widget W { integer x; }\nstructure S { }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnknownStatement);
    assert_eq!(errors[0].param(compil::diagnostics::ParamKey::Context), Some("source"));
    assert!(parse.document.find_structure("S").is_some());
}

#[test]
fn test_missing_body() {
    let parse = parse_str("structure A;\nstructure B { }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::ExpectStatementBody);
    assert_eq!((errors[0].line(), errors[0].column()), (1, 12));
    assert!(parse.document.find_structure("A").is_none());
    assert!(parse.document.find_structure("B").is_some());
}

#[test]
fn test_unterminated_body() {
    let parse = parse_str("structure A { integer x;");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnexpectedEndOfInput);
    assert!(parse.document.declarations().is_empty());
}

#[test]
fn test_nested_braces_are_skipped_together() {
    let parse = parse_str("structure A { 12 { integer x; } integer y; }");
    let errors: Vec<_> = parse.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), MessageKind::UnexpectedToken);
    let a = parse.document.find_structure("A").expect("A");
    let names: Vec<_> = parse
        .document
        .structure(a)
        .fields()
        .map(|(_, f)| f.name.value.to_string())
        .collect();
    assert_eq!(names, vec!["y"]);
}

#[test]
fn test_misplaced_comments_only_warn() {
    let parse = parse_str("structure A {\n  integer x;\n  // trailing\n}\n// at the end");
    assert!(parse.ok(), "{:?}", parse.messages);
    let warnings: Vec<_> = parse.warnings().collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|m| m.kind() == MessageKind::MisplacedComment));
    assert_eq!(warnings[0].line(), 3);
    assert_eq!(warnings[1].line(), 5);
}

#[test]
fn test_messages_follow_source_order() {
    let parse = parse_str(
        "structure A { Missing m; }\n\
         enum B { x = y; }\n\
         structure C { integer i = \"no\"; }",
    );
    let lines: Vec<_> = parse.errors().map(|m| m.line()).collect();
    // unresolved names are reported once everything is parsed
    assert_eq!(lines, vec![2, 3, 1]);
    assert_eq!(parse.severity(), Some(Severity::Error));
}

#[rstest]
#[case("structure", MessageKind::ExpectStatementName)]
#[case("enum E", MessageKind::ExpectStatementBody)]
#[case("interface I { method }", MessageKind::ExpectStatementName)]
#[case("structure S { integer }", MessageKind::ExpectStatementName)]
#[case("structure S inherit { }", MessageKind::ExpectType)]
#[case("structure S { reference<integer x; }", MessageKind::ExpectToken)]
fn test_single_error_for_truncated_input(#[case] source: &str, #[case] kind: MessageKind) {
    let parse = parse_str(source);
    let kinds: Vec<_> = parse.errors().map(|m| m.kind()).collect();
    assert_eq!(kinds, vec![kind], "{source}");
}

#[test]
fn test_every_message_text_is_complete() {
    let parse = parse_str(
        "structure A { Missing m; operator >; integer x = \"s\"; }\n\
         widget W;\n\
         enum E { a = b; }\n\
         factory<A> F { }",
    );
    assert!(parse.errors().count() >= 4);
    for message in &parse.messages {
        assert!(!message.has_unresolved_placeholder(), "{}", message.text());
    }
}
