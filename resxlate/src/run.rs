//! One translation run: every input file into every target locale.
//!
//! Input files are parsed once. A file that fails to parse, is not a `<resources>`
//! document, or cannot be written is reported and skipped; the run itself only fails
//! on an invalid configuration, before anything is written.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    cache::{CacheStats, MemoCache},
    config::RunConfig,
    document::Document,
    error::Error,
    service::TranslationService,
    traits::Parser,
    walker::{ResourceWalker, WalkReport},
};

/// What happened to one input file for one locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Written,
    /// Translated but not written (dry run).
    Checked,
    /// Left out by the `skip_files` list.
    Skipped,
    /// Root element is not `<resources>`.
    NotResources,
    /// Nothing localizable left after filtering; no file written.
    NoLocalizable,
    /// Could not be read, parsed or written; see [`FileOutcome::error`].
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub input: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub units: WalkReport,
}

impl FileOutcome {
    fn new(input: &Path, status: FileStatus) -> Self {
        FileOutcome {
            input: input.to_path_buf(),
            output: None,
            status,
            error: None,
            units: WalkReport::default(),
        }
    }

    fn failed(input: &Path, error: String) -> Self {
        FileOutcome {
            error: Some(error),
            ..FileOutcome::new(input, FileStatus::Failed)
        }
    }
}

/// An input file after loading.
enum Source {
    Skipped,
    Unreadable(String),
    Loaded(Document),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleSummary {
    pub locale: String,
    pub totals: WalkReport,
    pub files: Vec<FileOutcome>,
}

impl LocaleSummary {
    pub fn failed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files
            .iter()
            .filter(|f| f.status == FileStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub source_locale: String,
    pub service: String,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub base_files: Vec<PathBuf>,
    /// Base copies that could not be written.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_base_files: Vec<FileOutcome>,
    pub locales: Vec<LocaleSummary>,
    pub cache: CacheStats,
}

impl RunReport {
    /// True when any unit or file failed in any locale, or a base copy failed.
    pub fn has_failures(&self) -> bool {
        !self.failed_base_files.is_empty()
            || self
                .locales
                .iter()
                .any(|l| !l.totals.failures.is_empty() || l.failed_files().next().is_some())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Translate and report without writing any file.
    pub dry_run: bool,
}

/// Translates `inputs` into every target locale of `config`.
pub fn run<S: TranslationService + ?Sized>(
    config: &RunConfig,
    inputs: &[PathBuf],
    service: &S,
    options: RunOptions,
) -> Result<RunReport, Error> {
    let mut config = config.clone();
    config.validate()?;
    let skip_names = config.skip_name_set();

    let sources: Vec<(&PathBuf, Source)> = inputs
        .iter()
        .map(|input| {
            if config.skips_file(input) {
                debug!(file = %input.display(), "skipped by skip_files");
                return (input, Source::Skipped);
            }
            match load_source(input, &config) {
                Ok(doc) => (input, Source::Loaded(doc)),
                Err(e) => {
                    warn!(file = %input.display(), error = %e, "cannot read resource file");
                    (input, Source::Unreadable(e.to_string()))
                }
            }
        })
        .collect();

    let mut report = RunReport {
        source_locale: config.source_locale.clone(),
        service: service.name().to_string(),
        dry_run: options.dry_run,
        base_files: Vec::new(),
        failed_base_files: Vec::new(),
        locales: Vec::new(),
        cache: CacheStats::default(),
    };

    if let Some(base) = &config.write_base {
        for (input, source) in &sources {
            let Source::Loaded(doc) = source else {
                continue;
            };
            if !doc.is_resources() || !doc.has_localizable() {
                continue;
            }
            let path = config.output_path(input, base);
            if options.dry_run {
                continue;
            }
            match write_document(doc.clone(), &path) {
                Ok(()) => report.base_files.push(path),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "cannot write base copy");
                    report.failed_base_files.push(FileOutcome {
                        output: Some(path),
                        ..FileOutcome::failed(input, e.to_string())
                    });
                }
            }
        }
    }

    let mut cache = MemoCache::new();
    for target in &config.target_locales {
        info!(locale = %target, files = sources.len(), "translating");
        let mut summary = LocaleSummary {
            locale: target.clone(),
            totals: WalkReport::default(),
            files: Vec::with_capacity(sources.len()),
        };

        for (input, source) in &sources {
            let outcome = match source {
                Source::Skipped => FileOutcome::new(input, FileStatus::Skipped),
                Source::Unreadable(reason) => FileOutcome::failed(input, reason.clone()),
                Source::Loaded(doc) if !doc.is_resources() => {
                    debug!(file = %input.display(), "not a resources document");
                    FileOutcome::new(input, FileStatus::NotResources)
                }
                Source::Loaded(doc) if !doc.has_localizable() => {
                    FileOutcome::new(input, FileStatus::NoLocalizable)
                }
                Source::Loaded(doc) => {
                    let walker = ResourceWalker::new(
                        service,
                        &mut cache,
                        &config.source_locale,
                        target,
                        &skip_names,
                    );
                    let (translated, units) = walker.translate(doc);
                    let path = config.output_path(input, target);
                    let (status, error) = if options.dry_run {
                        (FileStatus::Checked, None)
                    } else {
                        match write_document(translated, &path) {
                            Ok(()) => (FileStatus::Written, None),
                            Err(e) => {
                                warn!(file = %path.display(), error = %e, "cannot write output");
                                (FileStatus::Failed, Some(e.to_string()))
                            }
                        }
                    };
                    info!(
                        locale = %target,
                        file = %input.display(),
                        translated = units.translated,
                        total = units.total,
                        failures = units.failures.len(),
                        "file done"
                    );
                    FileOutcome {
                        input: input.to_path_buf(),
                        output: Some(path),
                        status,
                        error,
                        units,
                    }
                }
            };
            summary.totals.merge(&outcome.units);
            summary.files.push(outcome);
        }
        report.locales.push(summary);
    }

    report.cache = cache.stats();
    Ok(report)
}

fn load_source(input: &Path, config: &RunConfig) -> Result<Document, Error> {
    let mut doc = Document::read_from(input)?;
    if config.localizable_only {
        let removed = doc.retain_localizable();
        if removed > 0 {
            debug!(file = %input.display(), removed, "dropped non-localizable resources");
        }
    }
    Ok(doc)
}

fn write_document(mut doc: Document, path: &Path) -> Result<(), Error> {
    doc.ensure_declaration();
    doc.write_to(path)
}
