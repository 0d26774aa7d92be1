//! Blocking client for a LibreTranslate server.

use std::time::Duration;

use resxlate::{Error, TranslationService};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: Option<String>,
    error: Option<String>,
}

/// One entry of `GET /languages`.
#[derive(Debug, Clone, Deserialize)]
pub struct Language {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

pub struct LibreTranslate {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl LibreTranslate {
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        let endpoint = endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(Error::configuration("endpoint cannot be empty"));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("resxlate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::service("failed to create HTTP client", Some(Box::new(e))))?;
        Ok(LibreTranslate { endpoint, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Lists the languages the server can translate. Fails when the list is empty,
    /// which is what a server still downloading its models answers.
    pub fn languages(&self) -> Result<Vec<Language>, Error> {
        let url = format!("{}/languages", self.endpoint);
        let languages: Vec<Language> = self
            .client
            .get(&url)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| Error::service(format!("GET {} failed", url), Some(Box::new(e))))?;
        if languages.is_empty() {
            return Err(Error::service(
                format!("{} answered but returned no languages", url),
                None,
            ));
        }
        info!(count = languages.len(), "translation service is up");
        Ok(languages)
    }
}

impl TranslationService for LibreTranslate {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, Error> {
        let url = format!("{}/translate", self.endpoint);
        debug!(chars = text.len(), source, locale = target, "POST /translate");
        let response = self
            .client
            .post(&url)
            .json(&TranslateRequest {
                q: text,
                source,
                target,
                format: "text",
            })
            .send()
            .map_err(|e| Error::service(format!("POST {} failed", url), Some(Box::new(e))))?;

        let status = response.status();
        let body: TranslateResponse = response.json().map_err(|e| {
            Error::service(
                format!("unreadable answer from {} ({})", url, status),
                Some(Box::new(e)),
            )
        })?;
        if let Some(message) = body.error {
            return Err(Error::service(format!("{}: {}", status, message), None));
        }
        if !status.is_success() {
            return Err(Error::service(format!("{} from {}", status, url), None));
        }
        body.translated_text
            .ok_or_else(|| Error::service("answer has no translatedText", None))
    }

    fn name(&self) -> &str {
        "libretranslate"
    }
}
