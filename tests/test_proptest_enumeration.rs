//! Property-based tests for enumeration numbering and parser robustness.
//!
//! Generates enumerations with arbitrary value lists, optionally with
//! composed values referring to earlier ones, and checks the assigned
//! integers against a direct computation. A second group feeds arbitrary
//! token soup to the parser and only requires that it terminates with a
//! consistent result.
#![cfg(feature = "proptest")]

use std::collections::BTreeSet;

use compil::parse_str;
use proptest::prelude::*;

// ============================================================================
// PROPTEST STRATEGIES
// ============================================================================

/// Distinct value names. The prefix keeps them clear of keywords.
fn arb_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,6}", 1..12)
        .prop_map(|names: BTreeSet<String>| names.into_iter().map(|n| format!("v_{n}")).collect())
}

/// A composed value: indices into the absolute values declared before it.
fn arb_composition() -> impl Strategy<Value = Vec<prop::sample::Index>> {
    prop::collection::vec(any::<prop::sample::Index>(), 1..4)
}

/// Fragments the parser has to survive in any order.
fn arb_fragment() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("structure"),
        Just("enum"),
        Just("interface"),
        Just("method"),
        Just("import"),
        Just("package"),
        Just("flags"),
        Just("A"),
        Just("integer"),
        Just("vector<"),
        Just(">"),
        Just("{"),
        Just("}"),
        Just(";"),
        Just("="),
        Just("|"),
        Just("."),
        Just("*"),
        Just("-->"),
        Just("\"text\""),
        Just("42"),
        Just("// note\n"),
    ]
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn absolute_values_are_consecutive(names in arb_names(), flags in any::<bool>()) {
        let source = format!(
            "enum E {} {{ {} }}",
            if flags { "flags" } else { "" },
            names.iter().map(|n| format!("{n};")).collect::<Vec<_>>().join(" ")
        );
        let parse = parse_str(&source);
        prop_assert!(parse.ok(), "{:?}", parse.messages);

        let id = parse.document.find_enumeration("E").expect("E");
        let enumeration = parse.document.enumeration(id);
        let start = if flags { 0 } else { 1 };
        for (offset, value) in enumeration.values.iter().enumerate() {
            prop_assert_eq!(value.value(), start + offset as i64);
        }
        prop_assert_eq!(enumeration.max_value(), start + names.len() as i64 - 1);
        prop_assert!(enumeration.values.iter().all(|v| flags || v.value() != 0));
    }

    #[test]
    fn composed_values_are_the_or_of_their_parts(
        names in arb_names(),
        composition in arb_composition(),
    ) {
        let parts: Vec<&String> = composition.iter().map(|i| i.get(&names)).collect();
        let source = format!(
            "enum E flags {{ {} all = {}; }}",
            names.iter().map(|n| format!("{n};")).collect::<Vec<_>>().join(" "),
            parts.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(" | ")
        );
        let parse = parse_str(&source);
        prop_assert!(parse.ok(), "{:?}", parse.messages);

        let id = parse.document.find_enumeration("E").expect("E");
        let enumeration = parse.document.enumeration(id);
        let expected = parts
            .iter()
            .filter_map(|p| enumeration.value(p))
            .fold(0, |acc, v| acc | v.value());
        prop_assert_eq!(enumeration.value("all").map(|v| v.value()), Some(expected));
    }

    #[test]
    fn parser_terminates_on_token_soup(fragments in prop::collection::vec(arb_fragment(), 0..40)) {
        let parse = parse_str(&fragments.join(" "));
        prop_assert_eq!(parse.ok(), parse.errors().next().is_none());
        for message in &parse.messages {
            prop_assert!(!message.has_unresolved_placeholder(), "{}", message.text());
        }
    }
}
