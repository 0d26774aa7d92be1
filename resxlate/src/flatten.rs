//! Turns a value with child markup into one flat string and back.
//!
//! Child elements and comments of the value become element tokens in the flat
//! string; the original nodes are kept aside and put back verbatim on restore. The
//! content of a CDATA section is translated like ordinary text, fenced by a pair of
//! element tokens so it can be wrapped in a CDATA section again.

use crate::{
    document::{Node, node_to_xml_string},
    error::Error,
    protect::{ProtectedText, Segment, build_protected, protect_segments},
    tokenizer::TokenKind,
};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// What an element token stands for.
#[derive(Debug, Clone)]
enum Anchor {
    /// A child node, put back verbatim.
    Node(Node),
    /// Start of a CDATA section; the text up to the next anchor is its content.
    CDataStart,
    CDataEnd,
}

/// The flat, protected form of one value.
///
/// Consumed by exactly one [`FlattenResult::restore`] or [`FlattenResult::restore_with`].
#[derive(Debug)]
pub struct FlattenResult {
    protected: ProtectedText,
    tag_tokens: Vec<String>,
    anchors: Vec<Anchor>,
}

/// Flattens and protects the nodes of a value.
pub fn flatten(nodes: &[Node]) -> Result<FlattenResult, Error> {
    let source: String = nodes
        .iter()
        .filter_map(|n| match n {
            Node::Text(t) | Node::CData(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    let payloads = nodes
        .iter()
        .map(|n| match n {
            Node::Text(_) | Node::CData(_) => Ok(String::new()),
            other => node_to_xml_string(other),
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let (protected, (tag_tokens, anchors)) = build_protected(&source, |tokenizer| {
        let mut segments = Vec::new();
        let mut tag_tokens = Vec::new();
        let mut anchors = Vec::new();
        let mut place = |segments: &mut Vec<Segment>, payload: &str, anchor: Anchor| {
            let key = tokenizer.allocate(TokenKind::Element, payload);
            segments.push(Segment::Token(key.clone()));
            tag_tokens.push(key);
            anchors.push(anchor);
        };

        for (node, payload) in nodes.iter().zip(&payloads) {
            match node {
                Node::Text(t) => match segments.last_mut() {
                    Some(Segment::Raw(prev)) => prev.push_str(t),
                    _ => segments.push(Segment::Raw(t.clone())),
                },
                Node::CData(content) => {
                    place(&mut segments, CDATA_OPEN, Anchor::CDataStart);
                    if !content.is_empty() {
                        segments.push(Segment::Raw(content.clone()));
                    }
                    place(&mut segments, CDATA_CLOSE, Anchor::CDataEnd);
                }
                other => place(&mut segments, payload, Anchor::Node(other.clone())),
            }
        }

        let segments = protect_segments(segments, tokenizer);
        (segments, (tag_tokens, anchors))
    });

    Ok(FlattenResult {
        protected,
        tag_tokens,
        anchors,
    })
}

impl FlattenResult {
    /// The text to send to the translation service.
    pub fn text(&self) -> &str {
        self.protected.text()
    }

    /// Element tokens in document order.
    pub fn tag_tokens(&self) -> &[String] {
        &self.tag_tokens
    }

    /// Whether the value holds anything besides plain text.
    pub fn has_children(&self) -> bool {
        !self.anchors.is_empty()
    }

    /// Unprotects `translated` and rebuilds the value nodes around the original children.
    pub fn restore(self, translated: &str) -> Result<Vec<Node>, Error> {
        self.restore_with(translated, |text| text)
    }

    /// Like [`FlattenResult::restore`], running `fix` over the unprotected text before
    /// it is split around the children.
    pub fn restore_with<F>(self, translated: &str, fix: F) -> Result<Vec<Node>, Error>
    where
        F: FnOnce(String) -> String,
    {
        let text = fix(self.protected.unprotect(translated)?);

        for key in &self.tag_tokens {
            let count = text.matches(key.as_str()).count();
            if count != 1 {
                return Err(Error::restore_mismatch(format!(
                    "tag token {} occurs {} times, expected once",
                    key, count
                )));
            }
        }

        let mut segments = Vec::with_capacity(self.tag_tokens.len() + 1);
        let mut rest = text.as_str();
        for key in &self.tag_tokens {
            let Some(at) = rest.find(key.as_str()) else {
                return Err(Error::restore_mismatch(format!(
                    "tag token {} is out of order",
                    key
                )));
            };
            segments.push(&rest[..at]);
            rest = &rest[at + key.len()..];
        }
        segments.push(rest);

        let mut nodes = Vec::with_capacity(segments.len() + self.anchors.len());
        let mut segments = segments.into_iter();
        push_text(&mut nodes, segments.next().unwrap_or_default());
        for (anchor, tail) in self.anchors.into_iter().zip(segments) {
            match anchor {
                Anchor::Node(child) => {
                    nodes.push(child);
                    push_text(&mut nodes, tail);
                }
                Anchor::CDataStart => {
                    if tail.contains(CDATA_CLOSE) {
                        return Err(Error::restore_mismatch(
                            "translated CDATA content contains ]]>",
                        ));
                    }
                    nodes.push(Node::CData(tail.to_string()));
                }
                Anchor::CDataEnd => push_text(&mut nodes, tail),
            }
        }
        Ok(nodes)
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{document::Document, traits::Parser};

    fn value_of(xml: &str) -> Vec<Node> {
        let doc = Document::from_str(&format!("<resources>{}</resources>", xml)).unwrap();
        doc.root().unwrap().child_elements().next().unwrap().children.clone()
    }

    #[test]
    fn test_plain_value_has_no_tag_tokens() {
        let nodes = value_of(r#"<string name="s">Hello %s</string>"#);
        let flat = flatten(&nodes).unwrap();
        assert!(flat.tag_tokens().is_empty());
        assert!(!flat.has_children());
        assert_eq!(flat.text(), "Hello __PH0__");
        let sent = flat.text().to_string();
        assert_eq!(flat.restore(&sent).unwrap(), nodes);
    }

    #[test]
    fn test_markup_value_identity_restore() {
        let nodes = value_of(
            r#"<string name="msg">Hello %1$s, you have <b>%2$d</b> new messages</string>"#,
        );
        let flat = flatten(&nodes).unwrap();
        assert_eq!(flat.tag_tokens(), ["__TAG0__"]);
        assert_eq!(flat.text(), "Hello __PH1__, you have __TAG0__ new messages");
        let sent = flat.text().to_string();
        let restored = flat.restore(&sent).unwrap();
        assert_eq!(restored, nodes);
        let Node::Element(b) = &restored[1] else {
            panic!("expected <b> element");
        };
        assert_eq!(b.free_text(), "%2$d");
    }

    #[test]
    fn test_translated_text_lands_around_children() {
        let nodes = value_of(r#"<string name="s">Tap <b>here</b> to <i>continue</i>.</string>"#);
        let flat = flatten(&nodes).unwrap();
        let restored = flat
            .restore("Tippe __TAG0__ um __TAG1__ fortzufahren.")
            .unwrap();
        assert_eq!(restored.len(), 5);
        assert_eq!(restored[0], Node::Text("Tippe ".into()));
        assert_eq!(restored[1], nodes[1]);
        assert_eq!(restored[2], Node::Text(" um ".into()));
        assert_eq!(restored[3], nodes[3]);
        assert_eq!(restored[4], Node::Text(" fortzufahren.".into()));
    }

    #[test]
    fn test_restore_fails_closed_on_missing_token() {
        let nodes = value_of(r#"<string name="s">A <b>b</b> c <i>d</i></string>"#);
        let flat = flatten(&nodes).unwrap();
        assert_eq!(flat.tag_tokens().len(), 2);
        let err = flat.restore("A __TAG0__ c").unwrap_err();
        assert!(matches!(err, Error::RestoreMismatch(_)));
    }

    #[test]
    fn test_restore_rejects_duplicates_and_reordering() {
        let nodes = value_of(r#"<string name="s"><b>x</b> and <i>y</i></string>"#);
        let flat = flatten(&nodes).unwrap();
        assert!(matches!(
            flat.restore("__TAG0__ __TAG0__ __TAG1__"),
            Err(Error::RestoreMismatch(_))
        ));

        let flat = flatten(&nodes).unwrap();
        assert!(matches!(
            flat.restore("__TAG1__ und __TAG0__"),
            Err(Error::RestoreMismatch(_))
        ));
    }

    #[test]
    fn test_cdata_content_is_translated_and_comments_are_opaque() {
        let nodes = value_of(r#"<string name="s">See <![CDATA[<u>this</u>]]> now<!-- note --></string>"#);
        let flat = flatten(&nodes).unwrap();
        assert_eq!(flat.tag_tokens(), ["__TAG0__", "__TAG1__", "__TAG2__"]);
        assert_eq!(flat.text(), "See __TAG0____TAG3__this__TAG4____TAG1__ now__TAG2__");
        let restored = flat
            .restore("Siehe __TAG0____TAG3__das__TAG4____TAG1__ jetzt__TAG2__")
            .unwrap();
        assert_eq!(
            restored,
            vec![
                Node::Text("Siehe ".into()),
                Node::CData("<u>das</u>".into()),
                Node::Text(" jetzt".into()),
                nodes[3].clone(),
            ]
        );
    }

    #[test]
    fn test_cdata_only_value_round_trips() {
        let nodes = value_of(r#"<string name="c"><![CDATA[Use <u>offline</u> maps]]></string>"#);
        let flat = flatten(&nodes).unwrap();
        assert!(flat.text().contains("Use "));
        assert!(flat.text().contains(" maps"));
        let sent = flat.text().replace("Use ", "Nutze ").replace(" maps", " Karten");
        let restored = flat.restore(&sent).unwrap();
        assert_eq!(restored, vec![Node::CData("Nutze <u>offline</u> Karten".into())]);

        let empty = value_of(r#"<string name="e"><![CDATA[]]></string>"#);
        let flat = flatten(&empty).unwrap();
        let sent = flat.text().to_string();
        assert_eq!(flat.restore(&sent).unwrap(), empty);
    }

    #[test]
    fn test_cdata_terminator_in_translation_fails_closed() {
        let nodes = value_of(r#"<string name="c"><![CDATA[a]]></string>"#);
        let flat = flatten(&nodes).unwrap();
        let sent = flat.text().replace('a', "a]]>b");
        assert!(matches!(flat.restore(&sent), Err(Error::RestoreMismatch(_))));
    }

    #[test]
    fn test_restore_with_applies_fix_before_split() {
        let nodes = value_of(r#"<string name="s">a <b>b</b></string>"#);
        let flat = flatten(&nodes).unwrap();
        let restored = flat
            .restore_with("x\\y __TAG0__", |t| t.replace("\\y", "\\\\y"))
            .unwrap();
        assert_eq!(restored[0], Node::Text("x\\\\y ".into()));
    }
}
