use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn resxlate_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("resxlate"));
    cmd.current_dir(dir.path());
    cmd
}

const STRINGS_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="app_name">HikeTrack</string>
    <string name="greeting">Hello %1$s, you have <b>%2$d</b> new messages</string>
    <string name="export_path">Saved to C:\Users\demo</string>
    <color name="accent">#FF5722</color>
</resources>
"#;

/// Writes `res/values/strings.xml` and returns its path.
fn stage(dir: &TempDir) -> PathBuf {
    let values = dir.path().join("res").join("values");
    fs::create_dir_all(&values).unwrap();
    let input = values.join("strings.xml");
    fs::write(&input, STRINGS_XML).unwrap();
    input
}

#[test]
fn test_dry_run_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    let input = stage(&dir);

    let output = resxlate_cmd(&dir)
        .args([
            "translate",
            input.to_str().unwrap(),
            "--source",
            "en",
            "--targets",
            "de,fr",
            "--dry-run",
        ])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "CLI failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("de: 2/3 translated (1 skipped, 2 escape fixes)"));
    assert!(stdout.contains("fr: 2/3 translated"));
    assert!(stdout.contains("Dry-run mode: no files were written"));
    assert!(!dir.path().join("res").join("values-de").exists());
    assert!(!dir.path().join("res").join("values-fr").exists());
}

#[test]
fn test_identity_translation_writes_locale_folder() {
    let dir = TempDir::new().unwrap();
    let input = stage(&dir);

    let output = resxlate_cmd(&dir)
        .args([
            "translate",
            input.to_str().unwrap(),
            "-s",
            "en",
            "-t",
            "de",
            "--service",
            "identity",
        ])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "CLI failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let written =
        fs::read_to_string(dir.path().join("res").join("values-de").join("strings.xml")).unwrap();
    assert!(written.contains(r#"<string name="app_name">HikeTrack</string>"#));
    assert!(written.contains("Hello %1$s, you have <b>%2$d</b> new messages"));
    assert!(written.contains(r"Saved to C:\\Users\\demo"));
    assert!(!written.contains("accent"));
}

#[test]
fn test_config_file_and_report_json() {
    let dir = TempDir::new().unwrap();
    let input = stage(&dir);
    fs::write(
        dir.path().join("resxlate.toml"),
        "source_locale = \"en\"\ntarget_locales = [\"es\"]\nskip_names = [\"app_name\", \"greeting\"]\ndelay_ms = 0\n",
    )
    .unwrap();
    let report = dir.path().join("reports").join("run.json");

    let output = resxlate_cmd(&dir)
        .args([
            "translate",
            input.to_str().unwrap(),
            "--service",
            "identity",
            "--report-json",
            report.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "CLI failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["source_locale"], "en");
    assert_eq!(json["service"], "identity");
    assert_eq!(json["locales"][0]["locale"], "es");
    assert_eq!(json["locales"][0]["totals"]["skipped"], 2);
    assert_eq!(json["locales"][0]["totals"]["translated"], 1);
    assert_eq!(json["locales"][0]["files"][0]["status"], "written");
}

#[test]
fn test_strict_fails_on_broken_file() {
    let dir = TempDir::new().unwrap();
    let input = stage(&dir);
    let broken = dir.path().join("res").join("values").join("broken.xml");
    fs::write(&broken, "<resources><string name=\"a\">unclosed").unwrap();

    let lenient = resxlate_cmd(&dir)
        .args([
            "translate",
            input.to_str().unwrap(),
            broken.to_str().unwrap(),
            "-s",
            "en",
            "-t",
            "de",
            "--dry-run",
        ])
        .output()
        .unwrap();
    assert!(lenient.status.success());
    assert!(String::from_utf8_lossy(&lenient.stdout).contains("failed file"));

    let strict = resxlate_cmd(&dir)
        .args([
            "translate",
            input.to_str().unwrap(),
            broken.to_str().unwrap(),
            "-s",
            "en",
            "-t",
            "de",
            "--dry-run",
            "--strict",
        ])
        .output()
        .unwrap();
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("failed_files=1"));
}

#[test]
fn test_strict_fails_when_base_copy_cannot_be_written() {
    let dir = TempDir::new().unwrap();
    let input = stage(&dir);
    fs::write(dir.path().join("res").join("values-en"), "not a directory").unwrap();
    let args = [
        "translate",
        input.to_str().unwrap(),
        "-s",
        "en",
        "-t",
        "de",
        "--service",
        "identity",
        "--write-base",
        "en",
    ];

    let lenient = resxlate_cmd(&dir).args(args).output().unwrap();
    assert!(lenient.status.success());
    assert!(String::from_utf8_lossy(&lenient.stdout).contains("Base copy failed for"));

    let strict = resxlate_cmd(&dir).args(args).arg("--strict").output().unwrap();
    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("failed_files=1"));
}

#[test]
fn test_invalid_configuration_is_an_error() {
    let dir = TempDir::new().unwrap();
    let input = stage(&dir);

    let output = resxlate_cmd(&dir)
        .args(["translate", input.to_str().unwrap(), "-s", "en", "-t", "en", "--dry-run"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_missing_input_is_an_error() {
    let dir = TempDir::new().unwrap();
    let output = resxlate_cmd(&dir)
        .args(["translate", "nope/strings.xml", "-s", "en", "-t", "de", "--dry-run"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("File does not exist"));
}
