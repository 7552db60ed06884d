//! Error helper module for user-friendly error messages
//!
//! Turns lookup misses and library errors into messages with suggestions
//! and the next command to try.

use colored::*;

use crate::error::{LibraryError, StorageError};
use crate::lookup::LookupError;
use crate::matching::suggest;

/// Format an "id or name not found" error with fuzzy suggestions
pub fn format_not_found(entity: &str, query: &str, candidates: &[String]) -> String {
    let mut message = format!("Error: No {} matches '{}'\n\n", entity, query)
        .red()
        .to_string();

    let suggestions = suggest(query, candidates, 3);
    if !suggestions.is_empty() {
        message.push_str(&"Did you mean one of these?\n".yellow().to_string());
        for candidate in suggestions {
            message.push_str(&format!("  - {}\n", candidate));
        }
        message.push('\n');
    }

    let list_command = if entity == "folder" { "prepo ls" } else { "prepo find" };
    message.push_str(&format!(
        "Try '{}' to see what is available.\n",
        list_command.cyan()
    ));

    message
}

/// Format an ambiguous prefix or name
pub fn format_ambiguous(entity: &str, query: &str, matches: &[String]) -> String {
    let mut message = format!("Error: '{}' matches more than one {}\n\n", query, entity)
        .red()
        .to_string();
    for m in matches.iter().take(8) {
        message.push_str(&format!("  - {}\n", m));
    }
    message.push_str("\nUse a longer id prefix to pick one.\n");
    message
}

/// Format an unknown subcommand with the closest known one
pub fn format_command_typo(command: &str, available_commands: &[&str]) -> String {
    let mut message = format!("Error: Unknown command '{}'\n\n", command)
        .red()
        .to_string();

    let known: Vec<String> = available_commands.iter().map(|c| c.to_string()).collect();
    if let Some(best) = suggest(command, &known, 1).first() {
        message.push_str(&format!("Did you mean '{}'?\n\n", best).yellow().to_string());
    }

    message.push_str("Available commands:\n");
    for cmd in available_commands {
        message.push_str(&format!("  {}\n", cmd));
    }
    message.push_str(&format!(
        "\nRun '{}' for more information\n",
        "prepo --help".cyan()
    ));

    message
}

/// A short hint on how to recover from a library error, if there is one
pub fn hint_for(error: &LibraryError) -> Option<String> {
    match error {
        LibraryError::Validation(_) => {
            Some("Names must not be blank and prompt text must not be empty.".to_string())
        }
        LibraryError::NotFound { entity, .. } if *entity == "version" => Some(format!(
            "List the available versions with '{}'.",
            "prepo versions <prompt>".cyan()
        )),
        LibraryError::NotFound { .. } => None,
        LibraryError::Cycle { .. } => Some(
            "A folder cannot be moved into itself or one of its subfolders.".to_string(),
        ),
        LibraryError::Storage(StorageError::Malformed { path, .. }) => Some(format!(
            "The library file {:?} could not be read. Fix or move it aside and retry.",
            path
        )),
        LibraryError::Storage(_) => {
            Some("Check that the library directory is writable.".to_string())
        }
    }
}

/// Render any command error, adding a hint for library errors
pub fn format_error(error: &anyhow::Error) -> String {
    if let Some(lookup) = error.downcast_ref::<LookupError>() {
        return match lookup {
            LookupError::NotFound {
                entity,
                query,
                candidates,
            } => format_not_found(entity, query, candidates),
            LookupError::Ambiguous {
                entity,
                query,
                matches,
            } => format_ambiguous(entity, query, matches),
        };
    }

    let mut message = format!("Error: {}", error).red().to_string();
    if let Some(hint) = error.downcast_ref::<LibraryError>().and_then(hint_for) {
        message.push('\n');
        message.push_str(&hint.yellow().to_string());
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_close_candidates() {
        colored::control::set_override(false);
        let candidates = vec!["Commit message".to_string(), "Debug".to_string()];

        let message = format_not_found("prompt", "comit", &candidates);
        assert!(message.contains("No prompt matches 'comit'"));
        assert!(message.contains("Commit message"));
        assert!(!message.contains("Debug"));
    }

    #[test]
    fn test_cycle_errors_get_a_hint() {
        let error = LibraryError::Cycle {
            folder_id: "a".to_string(),
            target_id: "b".to_string(),
        };
        assert!(hint_for(&error).unwrap().contains("subfolders"));
        assert!(hint_for(&LibraryError::folder_not_found("x")).is_none());
    }

    #[test]
    fn test_command_typo_suggests_closest() {
        colored::control::set_override(false);
        let message = format_command_typo("fnd", &["ls", "find", "top"]);
        assert!(message.contains("Did you mean 'find'?"));
        assert!(message.contains("prepo --help"));
    }

    #[test]
    fn test_lookup_errors_render_suggestions() {
        colored::control::set_override(false);
        let error = anyhow::Error::new(LookupError::NotFound {
            entity: "folder",
            query: "wrk".to_string(),
            candidates: vec!["Work".to_string()],
        });

        let message = format_error(&error);
        assert!(message.contains("No folder matches 'wrk'"));
        assert!(message.contains("Work"));
        assert!(message.contains("prepo ls"));
    }

    #[test]
    fn test_format_error_downcasts_library_errors() {
        colored::control::set_override(false);
        let error = anyhow::Error::new(LibraryError::validation("folder name must not be empty"));

        let message = format_error(&error);
        assert!(message.contains("folder name must not be empty"));
        assert!(message.contains("must not be blank"));
    }
}
