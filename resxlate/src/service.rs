//! The translation service seam.
//!
//! The core never talks HTTP itself: it hands protected text to a
//! [`TranslationService`] and validates whatever comes back. Implementations live
//! wherever their transport does (the CLI ships a LibreTranslate client).

use std::{thread, time::Duration};

use tracing::trace;

use crate::error::Error;

/// A blocking text translator.
///
/// Implementations must return the service's answer verbatim. Any token loss or
/// damage is detected downstream and turned into a per-unit failure.
pub trait TranslationService {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, Error>;

    /// Short name used in logs and reports.
    fn name(&self) -> &str;
}

impl<T: TranslationService + ?Sized> TranslationService for &T {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, Error> {
        (**self).translate(text, source, target)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: TranslationService + ?Sized> TranslationService for Box<T> {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, Error> {
        (**self).translate(text, source, target)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Returns its input unchanged. Used for dry runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityService;

impl TranslationService for IdentityService {
    fn translate(&self, text: &str, _source: &str, _target: &str) -> Result<String, Error> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "identity"
    }
}

/// Sleeps for a fixed delay after every call to the inner service, successful or not.
#[derive(Debug, Clone)]
pub struct Paced<S> {
    inner: S,
    delay: Duration,
}

impl<S: TranslationService> Paced<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Paced { inner, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: TranslationService> TranslationService for Paced<S> {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, Error> {
        let result = self.inner.translate(text, source, target);
        if !self.delay.is_zero() {
            trace!(delay_ms = self.delay.as_millis() as u64, "pacing");
            thread::sleep(self.delay);
        }
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
