use crate::ErrorLocation;
use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` captures file, line, and column.
///
/// **WHY THIS MATTERS**: Every coordinator and config error embeds an `ErrorLocation`.
/// If it captures the wrong position, a failed `initialize` in the field points nowhere.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` stops being propagated or
/// if the line/column fields get swapped.
#[test]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: Current caller location
    // WHEN: Creating ErrorLocation from caller
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should capture this file and a real position
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert_eq!(location.line, 15, "Should capture correct line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies the `[file:line:column]` rendering used at the end of error messages.
///
/// **WHY THIS MATTERS**: Log lines from a child launch and the parent are compared side by
/// side; a stable format keeps them greppable.
///
/// **BUG THIS CATCHES**: Would catch a Display change that drops brackets or a field.
#[test]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation::caller();

    // WHEN: Formatting as string
    let formatted = location.to_string();

    // THEN: Should produce "[file:line:column]"
    assert!(formatted.starts_with('['), "Should start with '['");
    assert!(formatted.ends_with(']'), "Should end with ']'");
    assert_eq!(
        formatted.matches(':').count(),
        2,
        "Should separate file, line and column with two colons"
    );
    assert!(formatted.contains(&location.line.to_string()));
}

/// **VALUE**: Verifies `file_name()` strips directories on both separator styles.
///
/// **WHY THIS MATTERS**: The Windows build reports `\`-separated paths; the Unix build `/`.
///
/// **BUG THIS CATCHES**: Would catch a split on only one separator.
#[test]
fn given_nested_paths_when_file_name_called_then_returns_last_component() {
    // GIVEN: Locations with Unix and Windows style paths
    let unix = ErrorLocation {
        file: "backend/instance-core/src/coordinator.rs",
        line: 1,
        column: 1,
    };
    let windows = ErrorLocation {
        file: "backend\\instance-core\\src\\coordinator.rs",
        line: 1,
        column: 1,
    };

    // WHEN / THEN: Only the file name is returned
    assert_eq!(unix.file_name(), "coordinator.rs");
    assert_eq!(windows.file_name(), "coordinator.rs");
}

/// **VALUE**: Verifies that `caller()` honours `#[track_caller]`.
///
/// **WHY THIS MATTERS**: Error constructors in instance-core are `#[track_caller]`; the
/// location must be the call site, not the helper body.
///
/// **BUG THIS CATCHES**: Would catch removing `#[track_caller]` from `caller()`.
#[test]
fn given_track_caller_helper_when_caller_used_then_reports_call_site() {
    #[track_caller]
    fn helper() -> ErrorLocation {
        ErrorLocation::caller()
    }

    // GIVEN / WHEN: Capturing through a tracked helper
    let expected_line = line!() + 1;
    let location = helper();

    // THEN: The reported line is the call line in this test
    assert_eq!(location.line, expected_line);
}
