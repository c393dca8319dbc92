use rowguard_core::config::GuardConfig;
use rowguard_core::logging;
use rowguard_core::{
    AccessContext, AccessContextValue, AccessValue, CompileError, CompileErrorKind, ConfigError,
    Error, Explain, ExplainLevel, LogLevel, ResourceRange,
};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn load_full_configuration_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[compiler]
strict_variables = false
max_value_depth = 4
subject_variable = "subjectId"

[engine]
default_resource_range = "SELF_AND_CHILDREN"

[logging]
level = "DEBUG"
"#
    )
    .unwrap();

    let config = GuardConfig::load(Some(file.path())).unwrap();
    assert!(!config.compiler.strict_variables);
    assert_eq!(config.compiler.max_value_depth, 4);
    assert_eq!(config.compiler.subject_variable, "subjectId");
    assert_eq!(
        config.engine.default_resource_range,
        ResourceRange::SelfAndChildren
    );
    assert_eq!(config.logging.level, LogLevel::Debug);

    logging::init(&config.logging);
    assert!(!logging::init(&config.logging));
}

#[test]
fn invalid_configuration_is_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[compiler]\nmax_value_depth = 0").unwrap();

    let err = GuardConfig::load(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let root: Error = err.into();
    assert!(root.to_string().contains("max_value_depth"));
}

#[test]
fn access_context_from_json() {
    let ctx: AccessContextValue = serde_json::from_str(
        r#"{
            "subject_id": "u-1",
            "attributes": {
                "deptIds": [10, 11],
                "region": "eu",
                "limit": 2.5,
                "admin": false,
                "manager": null
            }
        }"#,
    )
    .unwrap();

    assert_eq!(ctx.subject_id(), Some("u-1"));
    assert_eq!(
        ctx.attribute("deptIds"),
        Some(&AccessValue::Array(vec![10.into(), 11.into()]))
    );
    assert_eq!(ctx.attribute("limit"), Some(&AccessValue::Float(2.5)));
    assert_eq!(ctx.attribute("admin"), Some(&AccessValue::Bool(false)));
    assert_eq!(ctx.attribute("manager"), Some(&AccessValue::Null));
    assert_eq!(ctx.attribute("missing"), None);
}

#[test]
fn compile_error_converts_into_root_error() {
    let mut explain = Explain::new();
    explain.info("rule priority 1 compiled");
    explain.error("variable 'x' is not present in the access context");

    let err = CompileError::new(CompileErrorKind::MissingVariable("x".to_string()), explain);
    assert_eq!(err.explain().at_level(ExplainLevel::Error).count(), 1);

    let root: Error = err.into();
    assert!(matches!(root, Error::Compile(_)));
    assert!(root.to_string().contains("'x'"));
}
