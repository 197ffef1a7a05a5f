//! Property tests for the inline token parser

use proptest::prelude::*;
use workroom_ops::tokens::parse_message;
use workroom_ops::TokenParseError;

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Ref { id: String, name: Option<String> },
    Op { task: String },
}

fn arb_segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        "[a-zA-Z0-9 .,!?]{0,12}".prop_map(Segment::Text),
        ("[a-z0-9-]{1,8}", proptest::option::of("[a-zA-Z ]{0,10}"))
            .prop_map(|(id, name)| Segment::Ref { id, name }),
        "[a-z0-9-]{1,8}".prop_map(|task| Segment::Op { task }),
    ]
}

fn render(segment: &Segment) -> String {
    match segment {
        Segment::Text(text) => text.clone(),
        Segment::Ref { id, name: None } => format!("[ref v:1 type:task id:{}]", id),
        Segment::Ref {
            id,
            name: Some(name),
        } => format!("[REF v:1 type:\"task\" id:{} name:\"{}\"]", id, name),
        Segment::Op { task } => {
            format!("[op v:2 type:update_task_status task:{} status:done]", task)
        }
    }
}

proptest! {
    /// Non-token text survives untouched; tokens become numbered placeholders
    #[test]
    fn llm_text_substitutes_placeholders(segments in prop::collection::vec(arb_segment(), 0..8)) {
        let raw: String = segments.iter().map(render).collect();
        let parsed = parse_message(&raw).unwrap();

        let mut expected = String::new();
        let (mut refs, mut ops) = (0, 0);
        for segment in &segments {
            match segment {
                Segment::Text(text) => expected.push_str(text),
                Segment::Ref { .. } => {
                    refs += 1;
                    expected.push_str(&format!("<<REF_{}>>", refs));
                }
                Segment::Op { .. } => {
                    ops += 1;
                    expected.push_str(&format!("<<OP_{}>>", ops));
                }
            }
        }

        prop_assert_eq!(&parsed.raw_text, &raw);
        prop_assert_eq!(&parsed.llm_text, &expected);
        prop_assert_eq!(parsed.references.len(), refs);
        prop_assert_eq!(parsed.operations.len(), ops);

        for (i, reference) in parsed.references.iter().enumerate() {
            prop_assert_eq!(&reference.placeholder, &format!("REF_{}", i + 1));
            prop_assert_eq!(&reference.entity_type, "task");
        }
        for (i, op) in parsed.operations.iter().enumerate() {
            prop_assert_eq!(&op.placeholder, &format!("OP_{}", i + 1));
        }
    }

    /// A malformed token anywhere fails the whole message
    #[test]
    fn malformed_token_fails_whole_parse(
        prefix in "[a-z ]{0,10}",
        suffix in "[a-z ]{0,10}",
        missing in 0usize..4,
    ) {
        let (token, field) = match missing {
            0 => ("[ref type:task id:t-1]", "v"),
            1 => ("[ref v:1 id:t-1]", "type"),
            2 => ("[ref v:1 type:task]", "id"),
            _ => ("[op v:1 type:update_task_status]", "arguments"),
        };
        let raw = format!("{}[ref v:1 type:task id:ok]{}{}", prefix, token, suffix);
        let err = parse_message(&raw).unwrap_err();
        prop_assert_eq!(err.field(), Some(field));
    }
}

#[test]
fn test_quoted_escapes() {
    let parsed = parse_message(r#"[ref v:1 type:task id:t-1 name:"say \"hi\""]"#).unwrap();
    assert_eq!(parsed.references[0].meta["name"], r#"say "hi""#);
}

#[test]
fn test_invalid_version_is_rejected() {
    let err = parse_message("[ref v:zero type:task id:t-1]").unwrap_err();
    assert!(matches!(err, TokenParseError::InvalidVersion { .. }));
    let err = parse_message("[ref v:0 type:task id:t-1]").unwrap_err();
    assert!(matches!(err, TokenParseError::InvalidVersion { .. }));
}
