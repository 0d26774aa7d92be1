use proptest::prelude::*;
use resxlate::{Document, Error, Node, Parser, TokenKind, flatten, protect, sanitize};

fn word_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z ,.!?]{0,12}").expect("valid word regex")
}

fn protected_piece_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "%s", "%d", "%1$s", "%2$d", "%.2f", "%-3d", "%%", "{0}", "{12}", "\\n", "\\t", "\\'",
        "\\\"", "\\\\", "\\@", "\\?", "\\u00e9", "<b>", "</b>", "<br/>",
    ])
    .prop_map(str::to_string)
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![word_strategy(), protected_piece_strategy()],
        0..12,
    )
    .prop_map(|pieces| pieces.concat())
}

fn printf_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["%s", "%d", "%1$s", "%2$.1f", "%x", "%+d"]).prop_map(str::to_string)
}

fn element_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "<b>bold</b>",
        "<i>%d</i>",
        "<xliff:g id=\"n\">%1$s</xliff:g>",
        "<br/>",
        "<u>{0}</u>",
        "<![CDATA[<i>raw</i> %d]]>",
        "<!-- note -->",
    ])
    .prop_map(str::to_string)
}

fn xml_value_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![word_strategy(), element_strategy()], 1..8)
        .prop_map(|pieces| pieces.concat())
}

fn value_nodes(value: &str) -> Vec<Node> {
    let xml = format!("<resources><string name=\"s\">{}</string></resources>", value);
    let doc = Document::from_str(&xml).expect("generated value parses");
    doc.root()
        .and_then(|r| r.child_elements().next())
        .map(|s| s.children.clone())
        .expect("string element present")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn protect_then_unprotect_is_identity(text in text_strategy()) {
        let protected = protect(&text);
        let sent = protected.text().to_string();
        prop_assert_eq!(protected.unprotect(&sent).map_err(|e| TestCaseError::fail(e.to_string()))?, text);
    }

    #[test]
    fn k_printf_placeholders_give_k_tokens(
        pieces in prop::collection::vec((printf_strategy(), "[a-z]{1,6}"), 0..6)
    ) {
        let text: String = pieces.iter().map(|(ph, w)| format!("{} {} ", ph, w)).collect();
        let protected = protect(&text);
        prop_assert_eq!(protected.map().count_of(TokenKind::Printf), pieces.len());
        let payloads: Vec<String> = protected.map().iter().map(|e| e.payload.clone()).collect();
        let expected: Vec<String> = pieces.iter().map(|(ph, _)| ph.clone()).collect();
        prop_assert_eq!(payloads, expected);
    }

    #[test]
    fn sanitize_is_idempotent(text in "[a-zA-Z0-9 \\\\nu'\"@?]{0,24}") {
        let (once, _) = sanitize(&text);
        let (twice, report) = sanitize(&once);
        prop_assert_eq!(twice, once);
        prop_assert_eq!(report.fixed, 0);
    }

    #[test]
    fn sanitize_keeps_valid_escapes(
        pieces in prop::collection::vec(
            prop_oneof![
                "[a-z ]{0,6}",
                prop::sample::select(vec!["\\n", "\\t", "\\r", "\\b", "\\'", "\\\"", "\\\\", "\\@", "\\?", "\\u0041"])
                    .prop_map(str::to_string),
            ],
            0..10,
        )
    ) {
        let text = pieces.concat();
        let (out, report) = sanitize(&text);
        prop_assert_eq!(out, text);
        prop_assert_eq!(report.fixed, 0);
    }

    #[test]
    fn flatten_then_restore_is_identity(value in xml_value_strategy()) {
        let nodes = value_nodes(&value);
        let flat = flatten(&nodes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        let sent = flat.text().to_string();
        let restored = flat.restore(&sent).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(restored, nodes);
    }

    #[test]
    fn dropping_a_tag_token_fails_closed(
        value in xml_value_strategy(),
        which in any::<prop::sample::Index>(),
    ) {
        let nodes = value_nodes(&value);
        let flat = flatten(&nodes).map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assume!(!flat.tag_tokens().is_empty());
        let dropped = which.get(flat.tag_tokens()).clone();
        let sent = flat.text().replacen(&dropped, "", 1);
        let result = flat.restore(&sent);
        prop_assert!(matches!(result, Err(Error::RestoreMismatch(_))));
    }
}
