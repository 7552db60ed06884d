//! Prompt records with append-only version history and usage counters
//!
//! Every content change appends a version; nothing ever rewrites or drops
//! an existing entry. Restoring an old version copies its content into a new
//! version, so version numbers only grow and `current_version` always names
//! the last entry.

use chrono::{DateTime, Utc};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::error::{LibraryError, LibraryResult};
use crate::folder_tree::FolderView;
use crate::matching;
use crate::models::{Prompt, PromptVersion};

#[derive(Debug, Clone, Default)]
pub struct PromptStore {
    prompts: Vec<Prompt>,
    /// Repeated usages inside this window count once; zero disables it
    usage_cooldown: Duration,
}

impl PromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load stored prompts, seeding missing histories and fixing dangling
    /// `current_version` pointers. Top-level content that disagrees with the
    /// current version is kept and recorded as a new latest version.
    pub fn from_prompts(prompts: Vec<Prompt>) -> Self {
        let mut prompts = prompts;
        for prompt in &mut prompts {
            if prompt.versions.is_empty() {
                warn!(prompt_id = %prompt.id, "Prompt has no history, seeding version 1");
                prompt.versions.push(PromptVersion {
                    version: 1,
                    name: prompt.name.clone(),
                    text: prompt.text.clone(),
                    timestamp: Utc::now(),
                });
            }
            if prompt.current().is_none() || prompt.current_version != prompt.latest_version() {
                let latest = prompt.latest_version();
                warn!(
                    prompt_id = %prompt.id,
                    current_version = prompt.current_version,
                    latest,
                    "Prompt version pointer out of range, resetting to latest"
                );
                prompt.current_version = latest;
            }
            let in_sync = prompt
                .current()
                .is_some_and(|v| v.name == prompt.name && v.text == prompt.text);
            if !in_sync {
                warn!(
                    prompt_id = %prompt.id,
                    current_version = prompt.current_version,
                    "Prompt content differs from its current version, recording it as a new version"
                );
                let (name, text) = (prompt.name.clone(), prompt.text.clone());
                append_version(prompt, name, text);
            }
        }

        Self {
            prompts,
            usage_cooldown: Duration::ZERO,
        }
    }

    pub fn with_usage_cooldown(mut self, cooldown: Duration) -> Self {
        self.usage_cooldown = cooldown;
        self
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    /// Create a prompt with its first version
    pub fn create(
        &mut self,
        name: &str,
        text: &str,
        folder_id: Option<&str>,
        folders: &dyn FolderView,
    ) -> LibraryResult<Prompt> {
        let (name, text) = validate_content(name, text)?;
        if let Some(folder) = folder_id {
            if !folders.contains_folder(folder) {
                return Err(LibraryError::folder_not_found(folder));
            }
        }

        let prompt = Prompt {
            id: Uuid::new_v4().to_string(),
            name: name.clone(),
            text: text.clone(),
            folder_id: folder_id.map(str::to_string),
            usage_count: 0,
            versions: vec![PromptVersion {
                version: 1,
                name,
                text,
                timestamp: Utc::now(),
            }],
            current_version: 1,
            last_used_at: None,
        };
        self.prompts.push(prompt.clone());
        Ok(prompt)
    }

    /// Append a new version with the given content
    pub fn edit(&mut self, id: &str, name: &str, text: &str) -> LibraryResult<Prompt> {
        let index = self.index_of(id)?;
        let (name, text) = validate_content(name, text)?;
        append_version(&mut self.prompts[index], name, text);
        Ok(self.prompts[index].clone())
    }

    /// Append a new version copying the content of `version`.
    /// The historical entry itself is left untouched.
    pub fn restore(&mut self, id: &str, version: u32) -> LibraryResult<Prompt> {
        let index = self.index_of(id)?;
        let source = self.prompts[index]
            .version(version)
            .cloned()
            .ok_or_else(|| LibraryError::NotFound {
                entity: "version",
                id: format!("{}@{}", id, version),
            })?;

        append_version(&mut self.prompts[index], source.name, source.text);
        Ok(self.prompts[index].clone())
    }

    /// File a prompt under `folder_id` (root when `None`)
    pub fn move_to(
        &mut self,
        id: &str,
        folder_id: Option<&str>,
        folders: &dyn FolderView,
    ) -> LibraryResult<Prompt> {
        let index = self.index_of(id)?;
        if let Some(folder) = folder_id {
            if !folders.contains_folder(folder) {
                return Err(LibraryError::folder_not_found(folder));
            }
        }

        self.prompts[index].folder_id = folder_id.map(str::to_string);
        Ok(self.prompts[index].clone())
    }

    pub fn record_usage(&mut self, id: &str) -> LibraryResult<Prompt> {
        self.record_usage_at(id, Utc::now())
    }

    /// Count one usage at `now`, unless the previous counted usage is still
    /// inside the cooldown window.
    pub fn record_usage_at(&mut self, id: &str, now: DateTime<Utc>) -> LibraryResult<Prompt> {
        let index = self.index_of(id)?;
        let cooling_down = self.within_cooldown(&self.prompts[index], now);

        let prompt = &mut self.prompts[index];
        if !cooling_down {
            prompt.usage_count += 1;
            prompt.last_used_at = Some(now);
        }
        Ok(prompt.clone())
    }

    /// Remove a prompt together with its history
    pub fn delete(&mut self, id: &str) -> LibraryResult<Prompt> {
        let index = self.index_of(id)?;
        Ok(self.prompts.remove(index))
    }

    /// Name-first, text-fallback search; see [`matching::name_then_text`]
    pub fn search(&self, query: &str) -> Vec<Prompt> {
        matching::name_then_text(&self.prompts, query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Prompts filed directly under `folder_id` (root when `None`), or under
    /// it and any folder below it when `include_descendants` is set.
    pub fn list_by_folder(
        &self,
        folder_id: Option<&str>,
        include_descendants: bool,
        folders: &dyn FolderView,
    ) -> LibraryResult<Vec<Prompt>> {
        let scope = folder_scope(folder_id, include_descendants, folders)?;
        Ok(self
            .prompts
            .iter()
            .filter(|p| scope.contains(&p.folder_id))
            .cloned()
            .collect())
    }

    pub fn count_in_folder(
        &self,
        folder_id: Option<&str>,
        include_descendants: bool,
        folders: &dyn FolderView,
    ) -> LibraryResult<usize> {
        let scope = folder_scope(folder_id, include_descendants, folders)?;
        Ok(self
            .prompts
            .iter()
            .filter(|p| scope.contains(&p.folder_id))
            .count())
    }

    /// Used prompts, most used first; ties keep insertion order
    pub fn most_used(&self, limit: Option<usize>) -> Vec<Prompt> {
        let mut used: Vec<Prompt> = self
            .prompts
            .iter()
            .filter(|p| p.usage_count > 0)
            .cloned()
            .collect();
        used.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
        if let Some(limit) = limit {
            used.truncate(limit);
        }
        used
    }

    /// Move every prompt filed under `from` to `to`; returns how many moved
    pub fn reassign_folder(&mut self, from: &str, to: Option<&str>) -> usize {
        let mut moved = 0;
        for prompt in &mut self.prompts {
            if prompt.folder_id.as_deref() == Some(from) {
                prompt.folder_id = to.map(str::to_string);
                moved += 1;
            }
        }
        moved
    }

    fn index_of(&self, id: &str) -> LibraryResult<usize> {
        self.prompts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| LibraryError::prompt_not_found(id))
    }

    fn within_cooldown(&self, prompt: &Prompt, now: DateTime<Utc>) -> bool {
        if self.usage_cooldown.is_zero() {
            return false;
        }
        match prompt.last_used_at {
            Some(last) => now
                .signed_duration_since(last)
                .to_std()
                .map_or(true, |elapsed| elapsed < self.usage_cooldown),
            None => false,
        }
    }
}

fn append_version(prompt: &mut Prompt, name: String, text: String) {
    let number = prompt.latest_version() + 1;
    prompt.versions.push(PromptVersion {
        version: number,
        name: name.clone(),
        text: text.clone(),
        timestamp: Utc::now(),
    });
    prompt.name = name;
    prompt.text = text;
    prompt.current_version = number;
}

fn validate_content(name: &str, text: &str) -> LibraryResult<(String, String)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LibraryError::validation("prompt name must not be empty"));
    }
    if text.is_empty() {
        return Err(LibraryError::validation("prompt text must not be empty"));
    }
    Ok((name.to_string(), text.to_string()))
}

/// Folder ids (with `None` for root) a folder query covers
fn folder_scope(
    folder_id: Option<&str>,
    include_descendants: bool,
    folders: &dyn FolderView,
) -> LibraryResult<HashSet<Option<String>>> {
    if let Some(id) = folder_id {
        if !folders.contains_folder(id) {
            return Err(LibraryError::folder_not_found(id));
        }
    }

    let mut scope = HashSet::new();
    scope.insert(folder_id.map(str::to_string));
    if !include_descendants {
        return Ok(scope);
    }

    let mut queue = VecDeque::from([folder_id.map(str::to_string)]);
    while let Some(current) = queue.pop_front() {
        for child in folders.child_folder_ids(current.as_deref()) {
            let child = Some(child);
            if scope.insert(child.clone()) {
                queue.push_back(child);
            }
        }
    }
    Ok(scope)
}
