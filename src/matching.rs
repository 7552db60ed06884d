//! Search and suggestion helpers for prompts
//!
//! Two distinct policies live here:
//! - [`name_then_text`]: the library's search contract. Prompts whose name
//!   contains the query (case-insensitive) win outright; only when no name
//!   matches does the search fall back to the prompt text. The two sets are
//!   never merged.
//! - [`suggest`]: fuzzy "did you mean" ranking used by the CLI when an id or
//!   name cannot be resolved.

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use crate::models::Prompt;

/// Name-first, text-fallback substring search, preserving input order.
///
/// The query is matched as given, whitespace included. An empty query
/// matches every prompt.
pub fn name_then_text<'a>(prompts: &'a [Prompt], query: &str) -> Vec<&'a Prompt> {
    if query.is_empty() {
        return prompts.iter().collect();
    }
    let needle = query.to_lowercase();

    let by_name: Vec<&Prompt> = prompts
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle))
        .collect();
    if !by_name.is_empty() {
        return by_name;
    }

    prompts
        .iter()
        .filter(|p| p.text.to_lowercase().contains(&needle))
        .collect()
}

/// Rank `candidates` against `query` by fuzzy score, best first.
pub fn suggest<'a>(query: &str, candidates: &'a [String], limit: usize) -> Vec<&'a String> {
    let matcher = SkimMatcherV2::default();
    let mut scored: Vec<(&String, i64)> = candidates
        .iter()
        .filter_map(|c| matcher.fuzzy_match(c, query).map(|score| (c, score)))
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().take(limit).map(|(c, _)| c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PromptVersion;
    use chrono::Utc;

    fn prompt(name: &str, text: &str) -> Prompt {
        Prompt {
            id: name.to_lowercase(),
            name: name.to_string(),
            text: text.to_string(),
            folder_id: None,
            usage_count: 0,
            versions: vec![PromptVersion {
                version: 1,
                name: name.to_string(),
                text: text.to_string(),
                timestamp: Utc::now(),
            }],
            current_version: 1,
            last_used_at: None,
        }
    }

    fn names(found: &[&Prompt]) -> Vec<String> {
        found.iter().map(|p| p.name.clone()).collect()
    }

    #[test]
    fn test_name_matches_win_over_text_matches() {
        let prompts = vec![
            prompt("Foo summary", "summarize this"),
            prompt("Review", "look for foo bugs"),
            prompt("FOOTER", "page footer"),
        ];

        let found = name_then_text(&prompts, "Foo");
        assert_eq!(names(&found), vec!["Foo summary", "FOOTER"]);
    }

    #[test]
    fn test_falls_back_to_text_when_no_name_matches() {
        let prompts = vec![
            prompt("Alpha", "contains XYZ123 token"),
            prompt("Beta", "nothing here"),
        ];

        let found = name_then_text(&prompts, "xyz123");
        assert_eq!(names(&found), vec!["Alpha"]);
        assert!(name_then_text(&prompts, "absent").is_empty());
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let prompts = vec![prompt("Alpha", "a"), prompt("Beta", "b")];
        assert_eq!(name_then_text(&prompts, "").len(), 2);
    }

    #[test]
    fn test_whitespace_in_query_is_significant() {
        let prompts = vec![prompt("Foobar", "x"), prompt("Other", "say foo now")];

        assert_eq!(names(&name_then_text(&prompts, "foo ")), vec!["Other"]);
        assert_eq!(names(&name_then_text(&prompts, "  ")), Vec::<String>::new());
        assert_eq!(names(&name_then_text(&prompts, "foo")), vec!["Foobar"]);
    }

    #[test]
    fn test_suggest_ranks_closest_first() {
        let candidates = vec![
            "code-review".to_string(),
            "commit-message".to_string(),
            "debug".to_string(),
        ];

        let suggestions = suggest("comit", &candidates, 3);
        assert_eq!(suggestions.first().map(|s| s.as_str()), Some("commit-message"));
        assert!(!suggestions.iter().any(|s| s.as_str() == "debug"));
    }
}
