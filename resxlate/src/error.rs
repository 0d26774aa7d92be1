//! All error types for the resxlate crate.
//!
//! Document-level variants (`XmlParse`, `InvalidResource`, `Io`) make a whole file
//! fail; `Service` and `RestoreMismatch` only ever fail a single unit; `Configuration`
//! aborts a run before anything is written.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid resource: {0}")]
    InvalidResource(String),

    #[error("translation service error: {message}")]
    Service {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("restore mismatch: {0}")]
    RestoreMismatch(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Creates a new service error with optional source error
    pub fn service(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Service {
            message: message.into(),
            source,
        }
    }

    pub fn restore_mismatch(message: impl Into<String>) -> Self {
        Error::RestoreMismatch(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    /// True for failures that invalidate a whole document rather than one unit.
    pub fn is_document_failure(&self) -> bool {
        matches!(
            self,
            Error::XmlParse(_) | Error::Io(_) | Error::InvalidResource(_)
        )
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(value: quick_xml::events::attributes::AttrError) -> Self {
        Error::InvalidResource(value.to_string())
    }
}
