use super::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file
}

#[test]
fn test_format_from_extension() {
    assert_eq!(ConfigFormat::from_path(Path::new("orgs.json")), ConfigFormat::Json);
    assert_eq!(ConfigFormat::from_path(Path::new("orgs.TOML")), ConfigFormat::Toml);
    assert_eq!(ConfigFormat::from_path(Path::new("orgs.yml")), ConfigFormat::Yaml);
    assert_eq!(ConfigFormat::from_path(Path::new("orgs")), ConfigFormat::Yaml);
}

#[test]
fn test_load_yaml_file() {
    let file = write_config(
        ".yaml",
        "orgs:\n  acme:\n    admins: [alice]\n    members: [bob]\n",
    );

    let config = load_config(file.path()).expect("Failed to load");
    let acme = config.org("acme").expect("acme is declared");

    assert_eq!(acme.admins, vec!["alice"]);
    assert_eq!(acme.members, vec!["bob"]);
}

#[test]
fn test_load_json_file() {
    let file = write_config(".json", r#"{"orgs": {"acme": {"admins": ["alice"]}}}"#);

    let config = load_config(file.path()).expect("Failed to load");
    assert_eq!(config.orgs.len(), 1);
}

#[test]
fn test_load_toml_file() {
    let file = write_config(
        ".toml",
        r#"
[orgs.acme]
admins = ["alice"]
company = "Acme"

[orgs.acme.repos.website]
private = false
"#,
    );

    let config = load_config(file.path()).expect("Failed to load");
    let acme = config.org("acme").expect("acme is declared");

    assert_eq!(acme.metadata.company.as_deref(), Some("Acme"));
    assert_eq!(acme.repos["website"].private, Some(false));
}

#[test]
fn test_missing_file_is_reported() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("absent.yaml");

    let result = load_config(&path);

    assert!(matches!(result, Err(ConfigurationError::FileNotFound { .. })));
}

#[test]
fn test_parse_error_names_the_format() {
    let result = parse_config("orgs: [unclosed", ConfigFormat::Yaml);

    match result {
        Err(ConfigurationError::ParseError { format, .. }) => assert_eq!(format, "YAML"),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_unknown_repo_field_fails_parse() {
    let yaml = "orgs:\n  acme:\n    repos:\n      site:\n        privat: true\n";

    let result = parse_config(yaml, ConfigFormat::Yaml);

    assert!(matches!(result, Err(ConfigurationError::ParseError { .. })));
}
