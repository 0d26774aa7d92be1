use std::path::PathBuf;

use resxlate::{Document, Parser, sanitize_document};
use tracing::info;

use crate::validation::validate_input_file;

/// Repairs invalid backslash escapes in place. With `check`, files are only
/// reported and an error is returned when any of them needs fixing.
pub fn run_sanitize_command(files: Vec<PathBuf>, check: bool) -> Result<(), String> {
    if files.is_empty() {
        return Err("No input files given".to_string());
    }
    for file in &files {
        validate_input_file(file)?;
    }

    let mut needing_fixes = 0;
    for file in &files {
        let mut doc = Document::read_from(file)
            .map_err(|e| format!("Failed to read '{}': {}", file.display(), e))?;
        let report = sanitize_document(&mut doc);
        info!(file = %file.display(), fixed = report.fixed, "sanitized");
        if report.fixed == 0 {
            println!("{}: clean", file.display());
            continue;
        }
        needing_fixes += 1;
        if check {
            println!("{}: {} escape(s) need fixing", file.display(), report.fixed);
        } else {
            doc.write_to(file)
                .map_err(|e| format!("Failed to write '{}': {}", file.display(), e))?;
            println!("{}: fixed {} escape(s)", file.display(), report.fixed);
        }
    }

    if check && needing_fixes > 0 {
        return Err(format!("{} file(s) contain invalid escapes", needing_fixes));
    }
    Ok(())
}
