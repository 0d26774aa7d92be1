//! Run configuration.
//!
//! A [`RunConfig`] is usually deserialized from a `resxlate.toml` file and then
//! patched with command-line overrides. [`RunConfig::validate`] must pass before any
//! file is read or written.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::warn;
use unic_langid::LanguageIdentifier;

use crate::error::Error;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000";
pub const DEFAULT_DELAY_MS: u64 = 50;
pub const DEFAULT_OUTPUT_DIR: &str = "values-{locale}";
pub const LOCALE_PLACEHOLDER: &str = "{locale}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Locale of the input files, as the translation service knows it.
    pub source_locale: String,
    pub target_locales: Vec<String>,
    /// Unit names that are never sent to the service.
    pub skip_names: Vec<String>,
    /// Input file names (not paths) to leave out of the run.
    pub skip_files: Vec<String>,
    pub endpoint: String,
    /// Pause after each service request.
    pub delay_ms: u64,
    /// Write only `string`, `string-array` and `plurals` resources.
    pub localizable_only: bool,
    /// Output directory template; `{locale}` is replaced with the target locale.
    /// Relative templates are resolved against the parent of each input file's
    /// directory, so `res/values/strings.xml` lands in `res/values-de/strings.xml`.
    pub output_dir: String,
    /// When set, an untranslated copy of each input is written for this locale too.
    pub write_base: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            source_locale: String::new(),
            target_locales: Vec::new(),
            skip_names: vec!["app_name".to_string()],
            skip_files: Vec::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            delay_ms: DEFAULT_DELAY_MS,
            localizable_only: true,
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            write_base: None,
        }
    }
}

impl RunConfig {
    pub fn new(source_locale: impl Into<String>, target_locales: Vec<String>) -> Self {
        RunConfig {
            source_locale: source_locale.into(),
            target_locales,
            ..Default::default()
        }
    }

    /// Normalizes and checks the configuration.
    ///
    /// Locale codes are trimmed and parsed as BCP 47 identifiers. Duplicate targets
    /// and targets equal to the source locale are dropped (the latter with a
    /// warning); an empty target list is an error.
    pub fn validate(&mut self) -> Result<(), Error> {
        self.source_locale = self.source_locale.trim().to_string();
        if self.source_locale.is_empty() {
            return Err(Error::configuration("source locale is missing"));
        }
        check_locale(&self.source_locale)?;

        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(self.target_locales.len());
        for target in &self.target_locales {
            let target = target.trim();
            if target.is_empty() || !seen.insert(target.to_string()) {
                continue;
            }
            check_locale(target)?;
            if same_locale(target, &self.source_locale) {
                warn!(locale = target, "target equals source locale, dropped");
                continue;
            }
            targets.push(target.to_string());
        }
        if targets.is_empty() {
            return Err(Error::configuration(
                "no target locale left to translate into",
            ));
        }
        self.target_locales = targets;

        if let Some(base) = &self.write_base {
            check_locale(base.trim())?;
        }

        let outputs = self.target_locales.len() + usize::from(self.write_base.is_some());
        if outputs > 1 && !self.output_dir.contains(LOCALE_PLACEHOLDER) {
            return Err(Error::configuration(format!(
                "output_dir '{}' must contain {} when writing several locales",
                self.output_dir, LOCALE_PLACEHOLDER
            )));
        }
        Ok(())
    }

    pub fn skip_name_set(&self) -> HashSet<String> {
        self.skip_names.iter().map(|s| s.trim().to_string()).collect()
    }

    pub fn skips_file(&self, input: &Path) -> bool {
        input
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| self.skip_files.iter().any(|s| s == name))
    }

    /// Where the `locale` version of `input` is written.
    pub fn output_path(&self, input: &Path, locale: &str) -> PathBuf {
        let dir = PathBuf::from(self.output_dir.replace(LOCALE_PLACEHOLDER, locale));
        let dir = if dir.is_absolute() {
            dir
        } else {
            let base = input
                .parent()
                .and_then(Path::parent)
                .unwrap_or_else(|| Path::new(""));
            base.join(dir)
        };
        match input.file_name() {
            Some(name) => dir.join(name),
            None => dir,
        }
    }
}

fn check_locale(code: &str) -> Result<LanguageIdentifier, Error> {
    code.replace('_', "-")
        .parse::<LanguageIdentifier>()
        .map_err(|e| Error::configuration(format!("invalid locale '{}': {}", code, e)))
}

fn same_locale(a: &str, b: &str) -> bool {
    match (check_locale(a), check_locale(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.eq_ignore_ascii_case(b),
    }
}
