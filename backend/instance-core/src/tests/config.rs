// Unit tests for InstanceConfig defaults, validation and persistence

use crate::config::InstanceConfig;
use crate::error::ConfigError;
use crate::{DEFAULT_ENDPOINT_NAME, DEFAULT_MAX_MESSAGE_SIZE, MAX_MESSAGE_SIZE_LIMIT};

use tempfile::TempDir;

/// **VALUE**: Verifies a missing config file yields defaults instead of an error.
///
/// **WHY THIS MATTERS**: First launch on a fresh machine has no config. Failing there
/// would block every launch from becoming parent.
///
/// **BUG THIS CATCHES**: Would catch `load()` treating `NotFound` as a read error.
#[test]
fn given_missing_config_file_when_loaded_then_returns_defaults() {
    // GIVEN: An empty config directory
    let dir = TempDir::new().unwrap();

    // WHEN: Loading
    let config = InstanceConfig::load(dir.path()).expect("missing file should load defaults");

    // THEN: Defaults
    assert_eq!(config, InstanceConfig::default());
    assert_eq!(config.endpoint_name, DEFAULT_ENDPOINT_NAME);
    assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
}

/// **VALUE**: Verifies save followed by load returns the same values.
///
/// **WHY THIS MATTERS**: Parent and child must resolve the same endpoint from the file.
///
/// **BUG THIS CATCHES**: Would catch a serde rename or a field skipped on save.
#[test]
fn given_saved_config_when_loaded_then_values_preserved() {
    // GIVEN: A customised config saved to disk
    let dir = TempDir::new().unwrap();
    let config = InstanceConfig {
        endpoint_name: "songmanager_beta".to_string(),
        max_message_size: 1024,
        ..InstanceConfig::default()
    };
    config.save(dir.path()).unwrap();

    // WHEN: Loading it back
    let loaded = InstanceConfig::load(dir.path()).unwrap();

    // THEN: Same values, and no temp file left behind
    assert_eq!(loaded, config);
    assert!(!dir.path().join("config.json.tmp").exists());
}

/// **VALUE**: Verifies fields absent from the JSON fall back to their defaults.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[serde(default)]` on a field.
#[test]
fn given_partial_json_when_loaded_then_missing_fields_defaulted() {
    // GIVEN: A config that only sets the endpoint name
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{ "endpoint_name": "custom_slot" }"#,
    )
    .unwrap();

    // WHEN: Loading
    let config = InstanceConfig::load(dir.path()).unwrap();

    // THEN: Name applied, rest defaulted
    assert_eq!(config.endpoint_name, "custom_slot");
    assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    assert_eq!(config.version, 1);
}

/// **VALUE**: Verifies a corrupted file is reported, not silently replaced.
///
/// **BUG THIS CATCHES**: Would catch `load()` returning defaults for invalid JSON, which
/// could point two builds at different endpoints without anyone noticing.
#[test]
fn given_corrupted_json_when_loaded_then_returns_parse_error() {
    // GIVEN: Garbage in config.json
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();

    // WHEN: Loading
    let result = InstanceConfig::load(dir.path());

    // THEN: ParseError
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}

/// **VALUE**: Verifies capacity bounds are enforced.
///
/// **WHY THIS MATTERS**: Zero would make every initialize fail; a huge value would make
/// the parent allocate a large buffer for nothing.
///
/// **BUG THIS CATCHES**: Would catch an inclusive/exclusive mix-up at the limit.
#[test]
fn given_out_of_range_capacity_when_validated_then_returns_validation_error() {
    for max_message_size in [0, MAX_MESSAGE_SIZE_LIMIT + 1] {
        let config = InstanceConfig {
            max_message_size,
            ..InstanceConfig::default()
        };
        assert!(
            matches!(config.validate(), Err(ConfigError::Invalid { .. })),
            "{max_message_size} should be rejected"
        );
    }

    let at_limit = InstanceConfig {
        max_message_size: MAX_MESSAGE_SIZE_LIMIT,
        ..InstanceConfig::default()
    };
    assert!(at_limit.validate().is_ok());
}

/// **VALUE**: Verifies a path separator inside the endpoint name is refused.
///
/// **BUG THIS CATCHES**: Would catch a path separator sneaking into the endpoint name and
/// escaping the runtime directory.
#[test]
fn given_endpoint_name_with_separator_when_validated_then_returns_validation_error() {
    for name in ["a/../escape", "songs/rpc", r"songs\rpc"] {
        let config = InstanceConfig {
            endpoint_name: name.to_string(),
            ..InstanceConfig::default()
        };

        let error = config.validate().unwrap_err();

        assert!(matches!(error, ConfigError::Invalid { .. }), "{name}");
        assert!(error.to_string().contains("invalid character"), "{name}: {error}");
    }
}

/// **VALUE**: Verifies a relative path that starts with a dot is refused as a hidden name.
///
/// **BUG THIS CATCHES**: Would catch `..` resolving the socket one directory up.
#[test]
fn given_endpoint_name_starting_with_dot_when_validated_then_returns_validation_error() {
    let config = InstanceConfig {
        endpoint_name: "../escape".to_string(),
        ..InstanceConfig::default()
    };

    let error = config.validate().unwrap_err();

    assert!(matches!(error, ConfigError::Invalid { .. }));
    assert!(error.to_string().contains("cannot start with '.'"), "{error}");
}

/// **VALUE**: Verifies unknown future versions are refused.
#[test]
fn given_future_version_when_validated_then_returns_validation_error() {
    let config = InstanceConfig {
        version: 2,
        ..InstanceConfig::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid { .. })
    ));
}

/// **VALUE**: Verifies invalid configs are never written.
///
/// **BUG THIS CATCHES**: Would catch `save()` skipping validation.
#[test]
fn given_invalid_config_when_saved_then_nothing_written() {
    let dir = TempDir::new().unwrap();
    let config = InstanceConfig {
        max_message_size: 0,
        ..InstanceConfig::default()
    };

    assert!(config.save(dir.path()).is_err());
    assert!(!dir.path().join("config.json").exists());
}
