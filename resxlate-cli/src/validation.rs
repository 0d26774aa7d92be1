use std::path::Path;
use unic_langid::LanguageIdentifier;

/// Validate file path exists and is readable
pub fn validate_file_path(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("File does not exist: {}", path.display()));
    }

    if !path.is_file() {
        return Err(format!("Path is not a file: {}", path.display()));
    }

    Ok(())
}

/// Input resources must be XML files
pub fn validate_input_file(path: &Path) -> Result<(), String> {
    validate_file_path(path)?;
    let is_xml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    if !is_xml {
        return Err(format!(
            "Not an XML resource file: {}. Expected a .xml file",
            path.display()
        ));
    }
    Ok(())
}

/// Validate output directory exists or can be created
pub fn validate_output_path(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Cannot create output directory: {}", e))?;
        }
    }

    Ok(())
}

/// Validate language code format using unic-langid, accepting Android's `pt_BR` form
pub fn validate_language_code(lang: &str) -> Result<(), String> {
    let lang = lang.trim();
    if lang.is_empty() {
        return Err("Language code cannot be empty".to_string());
    }

    lang.replace('_', "-")
        .parse::<LanguageIdentifier>()
        .map(|_| ())
        .map_err(|_| {
            format!(
                "Invalid language code format: {}. Expected valid BCP 47 language identifier",
                lang
            )
        })
}

/// Validate an endpoint URL
pub fn validate_endpoint(endpoint: &str) -> Result<(), String> {
    let endpoint = endpoint.trim();
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(())
    } else {
        Err(format!(
            "Invalid endpoint: {}. Expected an http:// or https:// URL",
            endpoint
        ))
    }
}
