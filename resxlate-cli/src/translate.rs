use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::ValueEnum;
use resxlate::{
    FileStatus, IdentityService, Paced, RunConfig, RunOptions, RunReport, TranslationService, run,
};
use serde_json::json;
use tracing::debug;

use crate::libretranslate::LibreTranslate;
use crate::validation::{
    validate_endpoint, validate_file_path, validate_input_file, validate_language_code,
    validate_output_path,
};

pub const DEFAULT_CONFIG_FILE: &str = "resxlate.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceKind {
    /// A LibreTranslate server at the configured endpoint
    Libretranslate,
    /// Returns every value unchanged
    Identity,
}

#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub inputs: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub source: Option<String>,
    pub targets: Vec<String>,
    pub endpoint: Option<String>,
    pub delay_ms: Option<u64>,
    pub out_dir: Option<String>,
    pub skip_names: Vec<String>,
    pub skip_files: Vec<String>,
    pub write_base: Option<String>,
    pub all_resources: bool,
    pub service: Option<ServiceKind>,
    pub check_endpoint: bool,
    pub report_json: Option<PathBuf>,
    pub strict: bool,
    pub dry_run: bool,
}

impl TranslateOptions {
    /// Dry runs default to the identity service so they never need a server.
    pub fn service_kind(&self) -> ServiceKind {
        self.service.unwrap_or(if self.dry_run {
            ServiceKind::Identity
        } else {
            ServiceKind::Libretranslate
        })
    }
}

/// Reads `path`, or `resxlate.toml` in the working directory when no path is given
/// and that file exists. Otherwise starts from the defaults.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, String> {
    let path = match path {
        Some(p) => {
            validate_file_path(p)?;
            p.to_path_buf()
        }
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.is_file() {
                return Ok(RunConfig::default());
            }
            default
        }
    };
    debug!(file = %path.display(), "loading configuration");
    let text = std::fs::read_to_string(&path)
        .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
    toml::from_str(&text).map_err(|e| format!("Invalid config '{}': {}", path.display(), e))
}

/// Applies command-line overrides on top of the file configuration.
fn apply_overrides(config: &mut RunConfig, opts: &TranslateOptions) {
    if let Some(source) = &opts.source {
        config.source_locale = source.clone();
    }
    if !opts.targets.is_empty() {
        config.target_locales = opts.targets.clone();
    }
    if let Some(endpoint) = &opts.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(delay) = opts.delay_ms {
        config.delay_ms = delay;
    }
    if let Some(out_dir) = &opts.out_dir {
        config.output_dir = out_dir.clone();
    }
    if !opts.skip_names.is_empty() {
        config.skip_names = opts.skip_names.clone();
    }
    if !opts.skip_files.is_empty() {
        config.skip_files = opts.skip_files.clone();
    }
    if opts.write_base.is_some() {
        config.write_base = opts.write_base.clone();
    }
    if opts.all_resources {
        config.localizable_only = false;
    }
}

fn write_report(path: &Path, opts: &TranslateOptions, report: &RunReport) -> Result<(), String> {
    let payload = json!({
        "inputs": opts.inputs,
        "strict": opts.strict,
        "dry_run": opts.dry_run,
        "source_locale": report.source_locale,
        "service": report.service,
        "base_files": report.base_files,
        "failed_base_files": report.failed_base_files,
        "cache": report.cache,
        "locales": report.locales,
    });

    let text = serde_json::to_string_pretty(&payload)
        .map_err(|e| format!("Failed to serialize report JSON: {}", e))?;
    std::fs::write(path, text)
        .map_err(|e| format!("Failed to write report JSON '{}': {}", path.display(), e))
}

fn print_summary(report: &RunReport) {
    for path in &report.base_files {
        println!("Base copy written: {}", path.display());
    }
    for file in &report.failed_base_files {
        println!(
            "Base copy failed for {}: {}",
            file.input.display(),
            file.error.as_deref().unwrap_or("unknown error")
        );
    }
    for locale in &report.locales {
        let totals = &locale.totals;
        println!(
            "{}: {}/{} translated ({} skipped, {} escape fixes)",
            locale.locale, totals.translated, totals.total, totals.skipped, totals.escape_fixes
        );
        for file in &locale.files {
            match file.status {
                FileStatus::Failed => println!(
                    "  failed file {}: {}",
                    file.input.display(),
                    file.error.as_deref().unwrap_or("unknown error")
                ),
                FileStatus::NotResources => {
                    println!("  not a resources file: {}", file.input.display())
                }
                _ => {}
            }
            for failure in &file.units.failures {
                println!(
                    "  failed {} {} in {}: {}",
                    failure.kind,
                    failure.unit,
                    file.input.display(),
                    failure.reason
                );
            }
        }
    }
    println!(
        "Cache: {} hits, {} misses",
        report.cache.hits, report.cache.misses
    );
}

fn failure_counts(report: &RunReport) -> (usize, usize) {
    let base = report.failed_base_files.len();
    report.locales.iter().fold((0, base), |(units, files), l| {
        (
            units + l.totals.failures.len(),
            files + l.failed_files().count(),
        )
    })
}

pub fn run_translate_command(opts: TranslateOptions) -> Result<(), String> {
    if opts.inputs.is_empty() {
        return Err("No input files given".to_string());
    }
    for input in &opts.inputs {
        validate_input_file(input)?;
    }
    if let Some(report_path) = &opts.report_json {
        validate_output_path(report_path)?;
    }

    let mut config = load_config(opts.config.as_deref())?;
    apply_overrides(&mut config, &opts);
    validate_language_code(&config.source_locale)
        .map_err(|e| format!("Source locale: {}", e))?;
    for target in &config.target_locales {
        validate_language_code(target).map_err(|e| format!("Target locale: {}", e))?;
    }

    let service: Box<dyn TranslationService> = match opts.service_kind() {
        ServiceKind::Identity => Box::new(IdentityService),
        ServiceKind::Libretranslate => {
            validate_endpoint(&config.endpoint)?;
            let client = LibreTranslate::new(&config.endpoint).map_err(|e| e.to_string())?;
            if opts.check_endpoint {
                let languages = client.languages().map_err(|e| e.to_string())?;
                let codes: Vec<&str> = languages.iter().map(|l| l.code.as_str()).collect();
                println!("Service available. Languages: {}", codes.join(", "));
            }
            Box::new(Paced::new(client, Duration::from_millis(config.delay_ms)))
        }
    };

    let report = run(
        &config,
        &opts.inputs,
        &service,
        RunOptions {
            dry_run: opts.dry_run,
        },
    )
    .map_err(|e| e.to_string())?;

    print_summary(&report);

    if let Some(report_path) = &opts.report_json {
        write_report(report_path, &opts, &report)?;
        println!("Report JSON written: {}", report_path.display());
    }

    if opts.dry_run {
        println!("Dry-run mode: no files were written");
    }

    if opts.strict && report.has_failures() {
        let (units, files) = failure_counts(&report);
        return Err(format!(
            "Translation policy failure (failed_units={}, failed_files={})",
            units, files
        ));
    }
    Ok(())
}

/// Checks that the service answers and prints the languages it offers.
pub fn run_languages_command(config: Option<PathBuf>, endpoint: Option<String>) -> Result<(), String> {
    let mut cfg = load_config(config.as_deref())?;
    if let Some(endpoint) = endpoint {
        cfg.endpoint = endpoint;
    }
    validate_endpoint(&cfg.endpoint)?;
    let client = LibreTranslate::new(&cfg.endpoint).map_err(|e| e.to_string())?;
    let languages = client.languages().map_err(|e| e.to_string())?;
    println!("Service available at {}", client.endpoint());
    for language in languages {
        println!("  {}\t{}", language.code, language.name);
    }
    Ok(())
}
