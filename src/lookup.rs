//! Resolve user-typed references to folder and prompt ids
//!
//! A reference is tried, in order, as a full id, a case-insensitive exact
//! name, then an id prefix. Misses carry the candidate names so callers can
//! print suggestions.

use thiserror::Error;

use crate::library::Library;

/// Shortest id prefix accepted
pub const MIN_PREFIX_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no {entity} matches '{query}'")]
    NotFound {
        entity: &'static str,
        query: String,
        candidates: Vec<String>,
    },

    #[error("'{query}' matches more than one {entity}")]
    Ambiguous {
        entity: &'static str,
        query: String,
        /// `name (short id)` labels of the matches
        matches: Vec<String>,
    },
}

struct Entry<'a> {
    id: &'a str,
    name: &'a str,
}

pub fn resolve_prompt(library: &Library, query: &str) -> Result<String, LookupError> {
    let entries: Vec<Entry> = library
        .prompts()
        .prompts()
        .iter()
        .map(|p| Entry {
            id: &p.id,
            name: &p.name,
        })
        .collect();
    resolve("prompt", &entries, query)
}

pub fn resolve_folder(library: &Library, query: &str) -> Result<String, LookupError> {
    let entries: Vec<Entry> = library
        .folders()
        .folders()
        .iter()
        .map(|f| Entry {
            id: &f.id,
            name: &f.name,
        })
        .collect();
    resolve("folder", &entries, query)
}

/// Short form of an id for display
pub fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn resolve(entity: &'static str, entries: &[Entry], query: &str) -> Result<String, LookupError> {
    let query = query.trim();

    if let Some(entry) = entries.iter().find(|e| e.id == query) {
        return Ok(entry.id.to_string());
    }

    let by_name: Vec<&Entry> = entries
        .iter()
        .filter(|e| e.name.to_lowercase() == query.to_lowercase())
        .collect();
    if let Some(id) = single(entity, query, &by_name)? {
        return Ok(id);
    }

    if query.len() >= MIN_PREFIX_LEN {
        let by_prefix: Vec<&Entry> = entries.iter().filter(|e| e.id.starts_with(query)).collect();
        if let Some(id) = single(entity, query, &by_prefix)? {
            return Ok(id);
        }
    }

    Err(LookupError::NotFound {
        entity,
        query: query.to_string(),
        candidates: entries.iter().map(|e| e.name.to_string()).collect(),
    })
}

fn single(entity: &'static str, query: &str, found: &[&Entry]) -> Result<Option<String>, LookupError> {
    match found {
        [] => Ok(None),
        [only] => Ok(Some(only.id.to_string())),
        many => Err(LookupError::Ambiguous {
            entity,
            query: query.to_string(),
            matches: many
                .iter()
                .map(|e| format!("{} ({})", e.name, short_id(e.id)))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use std::time::Duration;

    fn library() -> Library {
        Library::open(MemoryStore::new(), Duration::ZERO).unwrap()
    }

    #[test]
    fn test_resolves_full_id_name_and_prefix() {
        let mut library = library();
        let prompt = library.create_prompt("Code Review", "text", None).unwrap();

        assert_eq!(resolve_prompt(&library, &prompt.id).unwrap(), prompt.id);
        assert_eq!(resolve_prompt(&library, "code review").unwrap(), prompt.id);
        assert_eq!(resolve_prompt(&library, &prompt.id[..6]).unwrap(), prompt.id);
    }

    #[test]
    fn test_short_prefix_is_not_accepted() {
        let mut library = library();
        let folder = library.create_folder("Work", None).unwrap();

        let err = resolve_folder(&library, &folder.id[..2]).unwrap_err();
        assert!(matches!(err, LookupError::NotFound { .. }));
    }

    #[test]
    fn test_duplicate_names_are_ambiguous() {
        let mut library = library();
        library.create_folder("Drafts", None).unwrap();
        let parent = library.create_folder("Work", None).unwrap();
        library.create_folder("Drafts", Some(&parent.id)).unwrap();

        match resolve_folder(&library, "drafts").unwrap_err() {
            LookupError::Ambiguous { matches, .. } => assert_eq!(matches.len(), 2),
            other => panic!("expected ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn test_miss_carries_candidate_names() {
        let mut library = library();
        library.create_prompt("Summarize", "text", None).unwrap();

        match resolve_prompt(&library, "sumarize").unwrap_err() {
            LookupError::NotFound { candidates, .. } => {
                assert_eq!(candidates, vec!["Summarize".to_string()])
            }
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn test_short_id_handles_short_input() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789"), "01234567");
    }
}
