//! Hides escapes, inline markup and placeholders from the translation service.
//!
//! Text is held as a list of segments. Each pass only looks at [`Segment::Raw`]
//! segments and replaces what it matches with [`Segment::Token`]s, so a later pass
//! never sees (and never re-matches) what an earlier pass consumed. The passes run in
//! a fixed order: escapes, inline markup, printf placeholders, brace placeholders.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::Error,
    tokenizer::{TokenKind, TokenMap, Tokenizer},
};

lazy_static! {
    static ref MARKUP_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref PRINTF_REGEX: Regex =
        Regex::new(r"%(?:\d+\$)?[-+# 0,(]*\d*(?:\.\d+)?[a-zA-Z]|%%").unwrap();
    static ref BRACE_REGEX: Regex = Regex::new(r"\{\d+\}").unwrap();
}

/// Characters that form a valid two-character backslash escape.
pub const SIMPLE_ESCAPES: [char; 9] = ['n', 't', 'r', 'b', '\'', '"', '\\', '@', '?'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Raw(String),
    /// A token key already placed in the text.
    Token(String),
}

/// A protected string together with the token table that produced it.
///
/// Consumed by [`ProtectedText::unprotect`]; the table never outlives its unit.
#[derive(Debug, PartialEq, Eq)]
pub struct ProtectedText {
    text: String,
    map: TokenMap,
}

impl ProtectedText {
    pub(crate) fn from_segments(segments: Vec<Segment>, tokenizer: Tokenizer) -> Self {
        let text = segments
            .into_iter()
            .map(|s| match s {
                Segment::Raw(t) | Segment::Token(t) => t,
            })
            .collect();
        ProtectedText {
            text,
            map: tokenizer.into_map(),
        }
    }

    /// The text to send to the translation service.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Every key occurs exactly once in the text.
    fn keys_are_unambiguous(&self) -> bool {
        self.map
            .iter()
            .all(|e| self.text.matches(e.key.as_str()).count() == 1)
    }

    pub fn map(&self) -> &TokenMap {
        &self.map
    }

    /// Substitutes every escape, markup and placeholder token back into `translated`.
    ///
    /// Each of those tokens must occur exactly once. Element tokens are left where
    /// they are for the restorer.
    pub fn unprotect(self, translated: &str) -> Result<String, Error> {
        let mut hits: Vec<(usize, &str, &str)> = Vec::new();
        for entry in self.map.iter().filter(|e| e.kind != TokenKind::Element) {
            let found: Vec<usize> = translated
                .match_indices(entry.key.as_str())
                .map(|(i, _)| i)
                .collect();
            match found.as_slice() {
                [at] => hits.push((*at, entry.key.as_str(), entry.payload.as_str())),
                [] => {
                    return Err(Error::restore_mismatch(format!(
                        "token {} ({}) missing from translation",
                        entry.key, entry.payload
                    )));
                }
                _ => {
                    return Err(Error::restore_mismatch(format!(
                        "token {} ({}) occurs {} times in translation",
                        entry.key,
                        entry.payload,
                        found.len()
                    )));
                }
            }
        }
        hits.sort_by_key(|(at, _, _)| *at);

        let mut out = String::with_capacity(translated.len());
        let mut cursor = 0;
        for (at, key, payload) in hits {
            if at < cursor {
                return Err(Error::restore_mismatch(format!(
                    "token {} overlaps another token",
                    key
                )));
            }
            out.push_str(&translated[cursor..at]);
            out.push_str(payload);
            cursor = at + key.len();
        }
        out.push_str(&translated[cursor..]);
        Ok(out)
    }
}

/// Protects a plain text value.
pub fn protect(text: &str) -> ProtectedText {
    let (protected, ()) = build_protected(text, |tokenizer| {
        let segments = protect_segments(vec![Segment::Raw(text.to_string())], tokenizer);
        (segments, ())
    });
    protected
}

/// Runs `build` with a fresh tokenizer until every key occurs exactly once in the
/// joined text.
///
/// Raw text next to a token can spell out a key of its own: `__PH1` followed by
/// `__ESC0__` contains `__PH1__`. Such a build is redone with keys numbered past the
/// previous attempt. The digits of a spelled-out key always come from `source`, so
/// the loop ends once the counter has moved past the numbers written there.
pub(crate) fn build_protected<T, F>(source: &str, mut build: F) -> (ProtectedText, T)
where
    F: FnMut(&mut Tokenizer) -> (Vec<Segment>, T),
{
    let mut first = 0;
    loop {
        let mut tokenizer = Tokenizer::starting_at(source, first);
        let (segments, extra) = build(&mut tokenizer);
        first = tokenizer.next_index();
        let protected = ProtectedText::from_segments(segments, tokenizer);
        if protected.keys_are_unambiguous() {
            return (protected, extra);
        }
    }
}

/// Runs every protection pass, in order, over the raw segments.
pub(crate) fn protect_segments(segments: Vec<Segment>, tokenizer: &mut Tokenizer) -> Vec<Segment> {
    let segments = escape_pass(segments, tokenizer);
    let segments = regex_pass(segments, &MARKUP_REGEX, TokenKind::Markup, tokenizer);
    let segments = regex_pass(segments, &PRINTF_REGEX, TokenKind::Printf, tokenizer);
    regex_pass(segments, &BRACE_REGEX, TokenKind::Brace, tokenizer)
}

/// Length in bytes of the valid escape starting at `rest` (which begins with `\`).
pub(crate) fn escape_len(rest: &str) -> Option<usize> {
    let mut chars = rest.chars().skip(1);
    match chars.next()? {
        c if SIMPLE_ESCAPES.contains(&c) => Some(2),
        'u' => {
            let hex = rest.get(2..6)?;
            hex.chars()
                .all(|c| c.is_ascii_hexdigit())
                .then_some(6)
        }
        _ => None,
    }
}

fn escape_pass(segments: Vec<Segment>, tokenizer: &mut Tokenizer) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let raw = match segment {
            Segment::Raw(raw) => raw,
            token => {
                out.push(token);
                continue;
            }
        };
        let mut start = 0;
        let mut i = 0;
        while let Some(offset) = raw[i..].find('\\') {
            let at = i + offset;
            match escape_len(&raw[at..]) {
                Some(len) => {
                    if at > start {
                        out.push(Segment::Raw(raw[start..at].to_string()));
                    }
                    let key = tokenizer.allocate(TokenKind::Escape, &raw[at..at + len]);
                    out.push(Segment::Token(key));
                    i = at + len;
                    start = i;
                }
                None => i = at + 1,
            }
        }
        if start < raw.len() {
            out.push(Segment::Raw(raw[start..].to_string()));
        }
    }
    out
}

fn regex_pass(
    segments: Vec<Segment>,
    regex: &Regex,
    kind: TokenKind,
    tokenizer: &mut Tokenizer,
) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());
    for segment in segments {
        let raw = match segment {
            Segment::Raw(raw) => raw,
            token => {
                out.push(token);
                continue;
            }
        };
        let mut last = 0;
        for m in regex.find_iter(&raw) {
            if m.start() > last {
                out.push(Segment::Raw(raw[last..m.start()].to_string()));
            }
            out.push(Segment::Token(tokenizer.allocate(kind, m.as_str())));
            last = m.end();
        }
        if last < raw.len() {
            out.push(Segment::Raw(raw[last..].to_string()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_round_trip() {
        let text = r#"Hello %1$s, <b>you</b> have {0} new\nmessages \u00e9 100%%"#;
        let protected = protect(text);
        let sent = protected.text().to_string();
        assert!(!sent.contains('%'));
        assert!(!sent.contains('\\'));
        assert!(!sent.contains('<'));
        assert!(!sent.contains('{'));
        assert_eq!(protected.unprotect(&sent).unwrap(), text);
    }

    #[test]
    fn test_pass_order_and_kinds() {
        let protected = protect(r"\n<i>%d{1}");
        assert_eq!(protected.text(), "__ESC0____TAG1____PH2____BR3__");
        let kinds: Vec<_> = protected.map().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Escape,
                TokenKind::Markup,
                TokenKind::Printf,
                TokenKind::Brace
            ]
        );
    }

    #[test]
    fn test_k_printf_placeholders_give_k_tokens() {
        let text = "%1$s sent %2$d files (%3$.2f MB) at %s, %-5d, %+d, % d";
        let protected = protect(text);
        assert_eq!(protected.map().count_of(TokenKind::Printf), 7);
        let payloads: Vec<_> = protected.map().iter().map(|e| e.payload.clone()).collect();
        assert_eq!(
            payloads,
            vec!["%1$s", "%2$d", "%3$.2f", "%s", "%-5d", "%+d", "% d"]
        );
        let sent = protected.text().to_string();
        assert_eq!(protected.unprotect(&sent).unwrap(), text);
    }

    #[test]
    fn test_double_percent_is_protected() {
        let protected = protect("50%% off");
        assert_eq!(protected.map().count_of(TokenKind::Printf), 1);
        assert_eq!(protected.map().iter().next().unwrap().payload, "%%");
    }

    #[test]
    fn test_escapes() {
        let protected = protect(r#"a\'b\"c\\d\@e\?f\tg\u00E9h"#);
        assert_eq!(protected.map().count_of(TokenKind::Escape), 7);

        // Unknown escapes and short unicode escapes stay raw text.
        let protected = protect(r"C:\Users\demo \u12");
        assert_eq!(protected.map().count_of(TokenKind::Escape), 0);
        assert_eq!(protected.text(), r"C:\Users\demo \u12");
    }

    #[test]
    fn test_double_backslash_consumes_both() {
        let protected = protect(r"a\\n");
        assert_eq!(protected.text(), "a__ESC0__n");
    }

    #[test]
    fn test_escapes_and_markup_together() {
        let text = r#"<b>bold</b> \"quoted\""#;
        let protected = protect(text);
        assert_eq!(protected.map().count_of(TokenKind::Escape), 2);
        assert_eq!(protected.map().count_of(TokenKind::Markup), 2);
        let sent = protected.text().to_string();
        assert_eq!(protected.unprotect(&sent).unwrap(), text);
    }

    #[test]
    fn test_reordered_tokens_are_restored() {
        let protected = protect("%1$s loves %2$s");
        let translated = "__PH1__ wird von __PH0__ geliebt";
        assert_eq!(
            protected.unprotect(translated).unwrap(),
            "%2$s wird von %1$s geliebt"
        );
    }

    #[test]
    fn test_missing_token_is_mismatch() {
        let protected = protect("Hello %s and %d");
        let err = protected.unprotect("Hallo __PH0__").unwrap_err();
        assert!(matches!(err, Error::RestoreMismatch(_)));
    }

    #[test]
    fn test_duplicated_token_is_mismatch() {
        let protected = protect("{0} items");
        let err = protected.unprotect("__BR0__ __BR0__ Artikel").unwrap_err();
        assert!(matches!(err, Error::RestoreMismatch(_)));
    }

    #[test]
    fn test_keys_avoid_source_collisions() {
        let text = "literal __PH0__ then %s";
        let protected = protect(text);
        assert_eq!(protected.text(), "literal __PH0__ then __PH1__");
        let sent = protected.text().to_string();
        assert_eq!(protected.unprotect(&sent).unwrap(), text);
    }

    #[test]
    fn test_keys_spelled_out_at_token_borders_are_avoided() {
        let text = r"__PH1\n %s";
        let protected = protect(text);
        let sent = protected.text().to_string();
        for entry in protected.map().iter() {
            assert_eq!(sent.matches(entry.key.as_str()).count(), 1, "{}", entry.key);
        }
        assert_eq!(protected.unprotect(&sent).unwrap(), text);

        let text = r"\nPH1__ %s";
        let protected = protect(text);
        let sent = protected.text().to_string();
        assert_eq!(protected.unprotect(&sent).unwrap(), text);
    }

    #[test]
    fn test_plain_text_is_untouched() {
        let protected = protect("Just words.");
        assert!(protected.map().is_empty());
        assert_eq!(protected.text(), "Just words.");
    }
}
