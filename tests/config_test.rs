use std::fs;
use std::path::{Path, PathBuf};
use stempelwerk::config::Settings;
use stempelwerk::error::Error;
use stempelwerk::splitter::LineEnding;
use tempfile::TempDir;

const MINIMAL: &str = r#"{
    "root_dir": "project",
    "template_dir": "10-templates/",
    "output_dir": "20-output/"
}"#;

#[test]
fn test_defaults() {
    let settings = Settings::parse(MINIMAL, false, "/configs").unwrap();

    assert_eq!(settings.root_dir, PathBuf::from("/configs/project"));
    assert_eq!(settings.template_dir, PathBuf::from("/configs/project/10-templates"));
    assert_eq!(settings.output_dir, PathBuf::from("/configs/project/20-output"));
    assert_eq!(settings.last_run_file, PathBuf::from("/configs/project/.last_run"));
    assert!(settings.included_file_names.is_empty());
    assert!(settings.stencil_dir_name.is_empty());
    assert!(!settings.create_directories);
    assert!(!settings.jinja_options.trim_blocks);
    assert_eq!(settings.markers.new_file(), "### New file:");
    assert_eq!(settings.markers.content(), "### Content:");
    assert_eq!(settings.executable_suffixes, vec![".sh".to_string()]);
    assert!(settings.global_namespace.is_empty());
}

#[test]
fn test_yaml_and_aliases() {
    let content = r#"
root_dir: /srv/code
template_dir: templates
output_dir: out
included_suffixes:
  - "*.sql.jinja"
stencil_dir_name: " stencils "
jinja_options:
  trim_blocks: true
  lstrip_blocks: true
custom_modules: [add_filters]
last_run_file: state/last
marker_new_file: "@@file"
marker_content: "@@body"
newline: crlf
newline_overrides:
  txt: lf
"#;
    let settings = Settings::parse(content, true, "/ignored").unwrap();

    assert_eq!(settings.root_dir, PathBuf::from("/srv/code"));
    assert_eq!(settings.included_file_names, vec!["*.sql.jinja".to_string()]);
    assert_eq!(settings.stencil_dir_name, "stencils");
    assert!(settings.jinja_options.trim_blocks && settings.jinja_options.lstrip_blocks);
    assert_eq!(settings.custom_modules, vec!["add_filters".to_string()]);
    assert_eq!(settings.last_run_file, PathBuf::from("/srv/code/state/last"));
    assert_eq!(settings.markers.new_file(), "@@file");
    assert_eq!(settings.line_endings.for_path(Path::new("a.sql")), LineEnding::CrLf);
    assert_eq!(settings.line_endings.for_path(Path::new("a.txt")), LineEnding::Lf);
    assert_eq!(settings.line_endings.for_path(Path::new("a.sh")), LineEnding::Lf);
}

#[test]
fn test_unknown_key_is_rejected() {
    let content = r#"{
        "root_dir": ".",
        "template_dir": "t",
        "output_dir": "o",
        "tempalte_dir": "typo"
    }"#;
    assert!(matches!(Settings::parse(content, false, "."), Err(Error::ConfigError(_))));
}

#[test]
fn test_missing_required_key() {
    let content = r#"{ "root_dir": ".", "template_dir": "t" }"#;
    assert!(matches!(Settings::parse(content, false, "."), Err(Error::ConfigError(_))));
}

#[test]
fn test_invalid_markers() {
    let equal = r###"{
        "root_dir": ".", "template_dir": "t", "output_dir": "o",
        "marker_new_file": "##", "marker_content": "##"
    }"###;
    assert!(matches!(Settings::parse(equal, false, "."), Err(Error::ConfigError(_))));

    let empty = r#"{
        "root_dir": ".", "template_dir": "t", "output_dir": "o",
        "marker_content": ""
    }"#;
    assert!(matches!(Settings::parse(empty, false, "."), Err(Error::ConfigError(_))));
}

#[test]
fn test_unknown_newline() {
    let content = r#"{
        "root_dir": ".", "template_dir": "t", "output_dir": "o",
        "newline": "cr"
    }"#;
    assert!(matches!(Settings::parse(content, false, "."), Err(Error::ConfigError(_))));
}

#[test]
fn test_load_creates_directories() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.json");
    fs::write(&config_path, MINIMAL).unwrap();

    let settings = Settings::load(&config_path, Some(r#"{"answer": 42}"#)).unwrap();

    assert!(temp_dir.path().join("project/10-templates").is_dir());
    assert!(temp_dir.path().join("project/20-output").is_dir());
    assert_eq!(settings.global_namespace.get("answer"), Some(&serde_json::json!(42)));
}

#[test]
fn test_load_globals_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.json");
    let globals_path = temp_dir.path().join("globals.json");
    fs::write(&config_path, MINIMAL).unwrap();
    fs::write(&globals_path, r#"{"NO_cast": false}"#).unwrap();

    let settings = Settings::load(&config_path, globals_path.to_str()).unwrap();
    assert_eq!(settings.global_namespace.get("NO_cast"), Some(&serde_json::json!(false)));
}

#[test]
fn test_load_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = Settings::load(temp_dir.path().join("missing.json"), None);
    assert!(matches!(result, Err(Error::ConfigNotFoundError { .. })));
}

#[test]
fn test_load_globals_must_be_object() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("settings.json");
    let globals_path = temp_dir.path().join("globals.json");
    fs::write(&config_path, MINIMAL).unwrap();
    fs::write(&globals_path, "[1, 2, 3]").unwrap();

    let result = Settings::load(&config_path, globals_path.to_str());
    assert!(matches!(result, Err(Error::ConfigError(_))));
}
