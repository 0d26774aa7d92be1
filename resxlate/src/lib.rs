#![forbid(unsafe_code)]
//! Structure-preserving machine translation of Android `strings.xml` resources.
//!
//! Values are sent to a translation service with everything the service must not
//! touch (printf and brace placeholders, inline markup, backslash escapes, child
//! elements) replaced by opaque tokens. The answer is only accepted when every token
//! comes back exactly once; otherwise the unit keeps its source value and the
//! failure is reported.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use resxlate::{IdentityService, RunConfig, RunOptions, run};
//!
//! let config = RunConfig::new("en", vec!["de".to_string(), "fr".to_string()]);
//! let inputs = vec!["app/src/main/res/values/strings.xml".into()];
//! let report = run(&config, &inputs, &IdentityService, RunOptions::default())?;
//! for locale in &report.locales {
//!     println!("{}: {}/{}", locale.locale, locale.totals.translated, locale.totals.total);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Pipeline
//!
//! For every translatable unit: [`flatten`] (child markup to tokens) and
//! [`protect`] (escapes, markup, placeholders to tokens), translate through the
//! [`MemoCache`], unprotect, [`sanitize`], restore. See [`ResourceWalker`].

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod flatten;
pub mod protect;
pub mod run;
pub mod sanitize;
pub mod service;
pub mod tokenizer;
pub mod traits;
pub mod unit;
pub mod walker;

pub use crate::{
    cache::{CacheStats, MemoCache},
    config::RunConfig,
    document::{Document, Element, Node},
    error::Error,
    flatten::{FlattenResult, flatten},
    protect::{ProtectedText, protect},
    run::{FileOutcome, FileStatus, LocaleSummary, RunOptions, RunReport, run},
    sanitize::{EscapeFixReport, fix_service_text, sanitize, sanitize_document},
    service::{IdentityService, Paced, TranslationService},
    tokenizer::{TokenKind, TokenMap, Tokenizer},
    traits::Parser,
    unit::{TranslatableUnit, UnitKind, UnitVisitor},
    walker::{ResourceWalker, SkipReason, UnitFailure, WalkReport},
};
