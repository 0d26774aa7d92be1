use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn resxlate_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("resxlate"))
}

#[test]
fn test_sanitize_fixes_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("strings.xml");
    fs::write(
        &file,
        "<resources>\n    <string name=\"path\">C:\\Users\\demo</string>\n    <string name=\"ok\">Line\\nbreak</string>\n</resources>\n",
    )
    .unwrap();

    let output = resxlate_cmd()
        .args(["sanitize", file.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "CLI failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("fixed 2 escape(s)"));
    let fixed = fs::read_to_string(&file).unwrap();
    assert!(fixed.contains(r"C:\\Users\\demo"));
    assert!(fixed.contains(r"Line\nbreak"));
}

#[test]
fn test_sanitize_check_does_not_write() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("strings.xml");
    let original = "<resources><string name=\"path\">C:\\Users\\demo</string></resources>";
    fs::write(&file, original).unwrap();

    let output = resxlate_cmd()
        .args(["sanitize", "--check", file.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("contain invalid escapes"));
    assert_eq!(fs::read_to_string(&file).unwrap(), original);
}

#[test]
fn test_sanitize_clean_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("strings.xml");
    fs::write(&file, "<resources><string name=\"a\">Don\\'t</string></resources>").unwrap();

    let output = resxlate_cmd()
        .args(["sanitize", "--check", file.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("clean"));
}
