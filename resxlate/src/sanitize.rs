//! Backslash escape repair for Android string values.
//!
//! aapt rejects a lone backslash followed by anything other than a known escape
//! character, so translated text that introduces one (a Windows path, a stray `\U`)
//! would break the build. [`sanitize`] doubles such backslashes and leaves every
//! valid escape alone.

use serde::Serialize;
use std::ops::AddAssign;

use crate::{
    document::{Document, Node},
    protect::SIMPLE_ESCAPES,
    unit::{TranslatableUnit, UnitVisitor},
};

/// How many backslash sequences were corrected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EscapeFixReport {
    pub fixed: usize,
}

impl AddAssign for EscapeFixReport {
    fn add_assign(&mut self, rhs: Self) {
        self.fixed += rhs.fixed;
    }
}

/// Repairs invalid backslash sequences in `text`.
///
/// Scans runs of backslashes left to right:
/// - a run of two or more is already escaped and kept;
/// - a single backslash before `n t r b ' " \ @ ?` or `u` plus four hex digits is kept;
/// - any other single backslash (including one at the very end) is doubled.
///
/// The result is stable: sanitizing it again changes nothing.
pub fn sanitize(text: &str) -> (String, EscapeFixReport) {
    let mut report = EscapeFixReport::default();
    if !text.contains('\\') {
        return (text.to_string(), report);
    }

    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&c| c == '\\').count();
        if run >= 2 {
            out.extend(std::iter::repeat_n('\\', run));
            i += run;
            continue;
        }

        match chars.get(i + 1) {
            None => {
                out.push_str("\\\\");
                report.fixed += 1;
                i += 1;
            }
            Some(&c) if SIMPLE_ESCAPES.contains(&c) => {
                out.push('\\');
                out.push(c);
                i += 2;
            }
            Some(&'u') if is_hex4(&chars[i + 2..]) => {
                out.push('\\');
                out.extend(&chars[i + 1..i + 6]);
                i += 6;
            }
            Some(&c) => {
                out.push_str("\\\\");
                out.push(c);
                report.fixed += 1;
                i += 2;
            }
        }
    }
    (out, report)
}

/// Cleans text that came back from a translation service: `\r\n` line endings
/// become `\n`, then invalid escapes are repaired as by [`sanitize`].
pub fn fix_service_text(text: &str) -> (String, EscapeFixReport) {
    if text.contains("\r\n") {
        sanitize(&text.replace("\r\n", "\n"))
    } else {
        sanitize(text)
    }
}

fn is_hex4(rest: &[char]) -> bool {
    rest.len() >= 4 && rest[..4].iter().all(char::is_ascii_hexdigit)
}

/// Sanitizes the text of every unit in `doc`, including text nested in child markup.
pub fn sanitize_document(doc: &mut Document) -> EscapeFixReport {
    let mut visitor = SanitizeVisitor::default();
    doc.walk_units(&mut visitor);
    visitor.report
}

#[derive(Default)]
struct SanitizeVisitor {
    report: EscapeFixReport,
}

impl UnitVisitor for SanitizeVisitor {
    fn visit_unit(&mut self, mut unit: TranslatableUnit<'_>) {
        sanitize_nodes(unit.value_mut(), &mut self.report);
    }
}

fn sanitize_nodes(nodes: &mut [Node], report: &mut EscapeFixReport) {
    for node in nodes {
        match node {
            Node::Text(text) => {
                let (fixed, r) = sanitize(text);
                if r.fixed > 0 {
                    *text = fixed;
                    *report += r;
                }
            }
            Node::Element(e) => sanitize_nodes(&mut e.children, report),
            _ => {}
        }
    }
}
