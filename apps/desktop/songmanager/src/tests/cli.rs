// Unit tests for command line parsing

use crate::cli::Cli;
use crate::logger::DEFAULT_LOG_LEVEL;

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

/// **VALUE**: Verifies payload words are forwarded as one space-joined message.
///
/// **WHY THIS MATTERS**: The shell splits a file path with spaces into several words;
/// the parent must see the original path.
///
/// **BUG THIS CATCHES**: Would catch joining without separators or sending only the
/// first word.
#[test]
fn given_several_payload_words_when_parsed_then_joined_with_spaces() {
    // GIVEN: A command line with a split path
    let cli = Cli::try_parse_from(["songmanager", "/songs/My", "Level.zip"]).unwrap();

    // WHEN: Building the payload
    let payload = cli.payload_bytes();

    // THEN: Words joined by one space
    assert_eq!(payload, b"/songs/My Level.zip");
}

/// **VALUE**: Verifies a bare launch sends an empty payload.
///
/// **WHY THIS MATTERS**: Launching from the start menu should still bring the running
/// window forward, which happens on any delivered message.
#[test]
fn given_no_payload_when_parsed_then_payload_is_empty() {
    let cli = Cli::try_parse_from(["songmanager"]).unwrap();

    assert!(cli.payload.is_empty());
    assert!(cli.payload_bytes().is_empty());
    assert!(cli.config.is_none());
    assert!(cli.endpoint.is_none());
    assert!(cli.max_message_size.is_none());
}

/// **VALUE**: Verifies every override flag is parsed alongside the payload.
///
/// **BUG THIS CATCHES**: Would catch a renamed long flag that silently stops overriding
/// the config file.
#[test]
fn given_override_flags_when_parsed_then_fields_set() {
    let cli = Cli::try_parse_from([
        "songmanager",
        "--config",
        "/tmp/sm",
        "--endpoint",
        "songmanager_beta",
        "--max-message-size",
        "1024",
        "--log-level",
        "warn",
        "song.zip",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("/tmp/sm")));
    assert_eq!(cli.endpoint.as_deref(), Some("songmanager_beta"));
    assert_eq!(cli.max_message_size, Some(1024));
    assert_eq!(cli.log_level_filter().unwrap(), LevelFilter::Warn);
    assert_eq!(cli.payload, vec!["song.zip".to_string()]);
}

/// **VALUE**: Verifies log level parsing falls back to the build default and rejects junk.
///
/// **BUG THIS CATCHES**: Would catch an unknown level silently becoming `Off`.
#[test]
fn given_log_level_when_resolved_then_default_or_error() {
    let default = Cli::try_parse_from(["songmanager"]).unwrap();
    let invalid = Cli::try_parse_from(["songmanager", "--log-level", "loud"]).unwrap();

    assert_eq!(default.log_level_filter().unwrap(), DEFAULT_LOG_LEVEL);

    let err = invalid.log_level_filter().unwrap_err();
    assert!(err.to_string().starts_with("Config Error: Invalid log level 'loud'"));
}

/// **VALUE**: Verifies a non-numeric capacity is rejected by the parser.
#[test]
fn given_non_numeric_max_message_size_when_parsed_then_fails() {
    let result = Cli::try_parse_from(["songmanager", "--max-message-size", "lots"]);

    assert!(result.is_err());
}
