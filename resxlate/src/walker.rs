//! Per-unit translation driver.
//!
//! [`ResourceWalker`] visits every unit of a document, applies the skip rules, and
//! runs eligible units through flatten/protect → translate → unprotect → sanitize →
//! restore. A unit's nodes are replaced only once the whole value has validated;
//! anything that goes wrong leaves the source value in place and is reported.

use std::{
    collections::HashSet,
    fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    cache::MemoCache,
    document::{Document, Node},
    error::Error,
    flatten::flatten,
    sanitize::{EscapeFixReport, fix_service_text},
    service::TranslationService,
    unit::{TranslatableUnit, UnitKind, UnitVisitor},
};

/// Why a unit was left untouched without calling the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// `translatable="false"` on the unit or its container.
    Untranslatable,
    /// Empty or whitespace-only value.
    Blank,
    /// The value contains `://`.
    Url,
    /// The unit name is in the skip set.
    Named,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Untranslatable => write!(f, "marked untranslatable"),
            SkipReason::Blank => write!(f, "blank value"),
            SkipReason::Url => write!(f, "contains a URL"),
            SkipReason::Named => write!(f, "name in skip list"),
        }
    }
}

/// Evaluates the skip rules, in order, for one unit.
pub fn skip_reason(unit: &TranslatableUnit<'_>, skip_names: &HashSet<String>) -> Option<SkipReason> {
    if !unit.is_translatable() {
        return Some(SkipReason::Untranslatable);
    }
    let text = unit.element().text_content();
    if text.trim().is_empty() {
        return Some(SkipReason::Blank);
    }
    if text.contains("://") {
        return Some(SkipReason::Url);
    }
    if skip_names.contains(unit.name()) {
        return Some(SkipReason::Named);
    }
    None
}

/// One unit that kept its source value because the pipeline failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: String,
    pub kind: UnitKind,
    pub reason: String,
}

/// Counters for one document translated into one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WalkReport {
    pub total: usize,
    pub translated: usize,
    pub skipped: usize,
    pub escape_fixes: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<UnitFailure>,
}

impl WalkReport {
    pub fn merge(&mut self, other: &WalkReport) {
        self.total += other.total;
        self.translated += other.translated;
        self.skipped += other.skipped;
        self.escape_fixes += other.escape_fixes;
        self.failures.extend(other.failures.iter().cloned());
    }
}

/// Translates the units of a document into one target locale.
pub struct ResourceWalker<'a, S: ?Sized> {
    service: &'a S,
    cache: &'a mut MemoCache,
    source: &'a str,
    target: &'a str,
    skip_names: &'a HashSet<String>,
    report: WalkReport,
}

impl<'a, S: TranslationService + ?Sized> ResourceWalker<'a, S> {
    pub fn new(
        service: &'a S,
        cache: &'a mut MemoCache,
        source: &'a str,
        target: &'a str,
        skip_names: &'a HashSet<String>,
    ) -> Self {
        ResourceWalker {
            service,
            cache,
            source,
            target,
            skip_names,
            report: WalkReport::default(),
        }
    }

    /// Returns a translated copy of `doc`; `doc` itself is never modified.
    pub fn translate(mut self, doc: &Document) -> (Document, WalkReport) {
        let mut out = doc.clone();
        out.walk_units(&mut self);
        (out, self.report)
    }

    fn translate_value(&mut self, nodes: &[Node]) -> Result<(Vec<Node>, EscapeFixReport), Error> {
        let flat = flatten(nodes)?;
        let response = self
            .cache
            .translate(self.service, flat.text(), self.source, self.target)?;
        let mut fixes = EscapeFixReport::default();
        let restored = flat.restore_with(&response, |text| {
            let (clean, report) = fix_service_text(&text);
            fixes += report;
            clean
        })?;
        Ok((restored, fixes))
    }
}

impl<S: TranslationService + ?Sized> UnitVisitor for ResourceWalker<'_, S> {
    fn visit_unit(&mut self, mut unit: TranslatableUnit<'_>) {
        self.report.total += 1;
        let label = unit.label();

        if let Some(reason) = skip_reason(&unit, self.skip_names) {
            debug!(unit = %label, %reason, "skipped");
            self.report.skipped += 1;
            return;
        }

        match self.translate_value(unit.value()) {
            Ok((nodes, fixes)) => {
                if fixes.fixed > 0 {
                    debug!(unit = %label, fixed = fixes.fixed, "repaired escapes");
                }
                unit.replace_value(nodes);
                self.report.translated += 1;
                self.report.escape_fixes += fixes.fixed;
            }
            Err(e) => {
                warn!(unit = %label, locale = self.target, error = %e, "kept source value");
                self.report.failures.push(UnitFailure {
                    unit: label,
                    kind: unit.kind(),
                    reason: e.to_string(),
                });
            }
        }
    }
}
