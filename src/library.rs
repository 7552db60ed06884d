//! The prompt library: folders and prompts behind one repository object
//!
//! `Library` is the only way to mutate the record set. Every mutation is
//! all-or-nothing: it runs against the in-memory model, then the resulting
//! snapshot is saved. If either step fails the previous state is restored
//! and the error returned unchanged.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::error::LibraryResult;
use crate::folder_tree::{Direction, FolderTree};
use crate::logging::log_library_operation;
use crate::models::{Folder, Prompt, Snapshot};
use crate::prompt_store::PromptStore;
use crate::storage::RecordStore;

pub struct Library {
    folders: FolderTree,
    prompts: PromptStore,
    store: Box<dyn RecordStore>,
}

impl Library {
    /// Load the library from `store`, repairing inconsistent records.
    ///
    /// Prompts filed under folders that no longer exist are moved to root.
    pub fn open(store: impl RecordStore + 'static, usage_cooldown: Duration) -> LibraryResult<Self> {
        let snapshot = store.load()?;
        let folders = FolderTree::from_folders(snapshot.folders);
        let mut prompts =
            PromptStore::from_prompts(snapshot.prompts).with_usage_cooldown(usage_cooldown);

        let missing: HashSet<String> = prompts
            .prompts()
            .iter()
            .filter_map(|p| p.folder_id.clone())
            .filter(|id| !folders.contains(id))
            .collect();
        for folder_id in missing {
            let moved = prompts.reassign_folder(&folder_id, None);
            warn!(folder_id = %folder_id, moved, "Prompts filed under missing folder moved to root");
        }

        Ok(Self {
            folders,
            prompts,
            store: Box::new(store),
        })
    }

    /// Current folders and prompts
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            folders: self.folders.folders().to_vec(),
            prompts: self.prompts.prompts().to_vec(),
        }
    }

    pub fn folders(&self) -> &FolderTree {
        &self.folders
    }

    pub fn prompts(&self) -> &PromptStore {
        &self.prompts
    }

    pub fn get_folder(&self, id: &str) -> Option<&Folder> {
        self.folders.get(id)
    }

    pub fn get_prompt(&self, id: &str) -> Option<&Prompt> {
        self.prompts.get(id)
    }

    pub fn list_children(&self, parent_id: Option<&str>) -> Vec<Folder> {
        self.folders.list_children(parent_id)
    }

    pub fn is_descendant(&self, candidate_id: &str, ancestor_id: &str) -> bool {
        self.folders.is_descendant(candidate_id, ancestor_id)
    }

    pub fn list_by_folder(
        &self,
        folder_id: Option<&str>,
        include_descendants: bool,
    ) -> LibraryResult<Vec<Prompt>> {
        self.prompts
            .list_by_folder(folder_id, include_descendants, &self.folders)
    }

    pub fn count_in_folder(
        &self,
        folder_id: Option<&str>,
        include_descendants: bool,
    ) -> LibraryResult<usize> {
        self.prompts
            .count_in_folder(folder_id, include_descendants, &self.folders)
    }

    pub fn search(&self, query: &str) -> Vec<Prompt> {
        self.prompts.search(query)
    }

    pub fn most_used(&self, limit: Option<usize>) -> Vec<Prompt> {
        self.prompts.most_used(limit)
    }

    // === Folder mutations ===

    pub fn create_folder(&mut self, name: &str, parent_id: Option<&str>) -> LibraryResult<Folder> {
        self.commit("folder.create", parent_id, |folders, _| {
            folders.create(name, parent_id)
        })
    }

    pub fn rename_folder(&mut self, id: &str, name: &str) -> LibraryResult<Folder> {
        self.commit("folder.rename", Some(id), |folders, _| folders.rename(id, name))
    }

    /// Delete a folder; its child folders and prompts move up to its parent
    pub fn delete_folder(&mut self, id: &str) -> LibraryResult<()> {
        self.commit("folder.delete", Some(id), |folders, prompts| {
            let parent = folders.delete(id)?;
            prompts.reassign_folder(id, parent.as_deref());
            Ok(())
        })
    }

    pub fn move_folder(&mut self, id: &str, parent_id: Option<&str>) -> LibraryResult<Folder> {
        self.commit("folder.move", Some(id), |folders, _| {
            folders.move_to(id, parent_id)
        })
    }

    pub fn reorder_folder(&mut self, id: &str, position: usize) -> LibraryResult<()> {
        self.commit("folder.reorder", Some(id), |folders, _| {
            folders.reorder(id, position)
        })
    }

    pub fn shift_folder(&mut self, id: &str, direction: Direction) -> LibraryResult<()> {
        self.commit("folder.shift", Some(id), |folders, _| folders.shift(id, direction))
    }

    pub fn move_folder_up(&mut self, id: &str) -> LibraryResult<()> {
        self.shift_folder(id, Direction::Up)
    }

    pub fn move_folder_down(&mut self, id: &str) -> LibraryResult<()> {
        self.shift_folder(id, Direction::Down)
    }

    pub fn reorder_siblings(
        &mut self,
        parent_id: Option<&str>,
        ordered_ids: &[String],
    ) -> LibraryResult<()> {
        self.commit("folder.reorder_siblings", parent_id, |folders, _| {
            folders.reorder_siblings(parent_id, ordered_ids)
        })
    }

    pub fn toggle_folder(&mut self, id: &str) -> LibraryResult<Folder> {
        self.commit("folder.toggle", Some(id), |folders, _| folders.toggle_expanded(id))
    }

    pub fn set_folder_expanded(&mut self, id: &str, expanded: bool) -> LibraryResult<Folder> {
        self.commit("folder.expand", Some(id), |folders, _| {
            folders.set_expanded(id, expanded)
        })
    }

    // === Prompt mutations ===

    pub fn create_prompt(
        &mut self,
        name: &str,
        text: &str,
        folder_id: Option<&str>,
    ) -> LibraryResult<Prompt> {
        self.commit("prompt.create", folder_id, |folders, prompts| {
            prompts.create(name, text, folder_id, &*folders)
        })
    }

    pub fn edit_prompt(&mut self, id: &str, name: &str, text: &str) -> LibraryResult<Prompt> {
        self.commit("prompt.edit", Some(id), |_, prompts| prompts.edit(id, name, text))
    }

    pub fn restore_prompt(&mut self, id: &str, version: u32) -> LibraryResult<Prompt> {
        self.commit("prompt.restore", Some(id), |_, prompts| {
            prompts.restore(id, version)
        })
    }

    pub fn move_prompt(&mut self, id: &str, folder_id: Option<&str>) -> LibraryResult<Prompt> {
        self.commit("prompt.move", Some(id), |folders, prompts| {
            prompts.move_to(id, folder_id, &*folders)
        })
    }

    pub fn record_usage(&mut self, id: &str) -> LibraryResult<Prompt> {
        self.commit("prompt.usage", Some(id), |_, prompts| prompts.record_usage(id))
    }

    pub fn delete_prompt(&mut self, id: &str) -> LibraryResult<()> {
        self.commit("prompt.delete", Some(id), |_, prompts| {
            prompts.delete(id).map(|_| ())
        })
    }

    fn commit<T>(
        &mut self,
        operation: &str,
        entity_id: Option<&str>,
        apply: impl FnOnce(&mut FolderTree, &mut PromptStore) -> LibraryResult<T>,
    ) -> LibraryResult<T> {
        let started = Instant::now();
        let folders_before = self.folders.clone();
        let prompts_before = self.prompts.clone();

        let result = apply(&mut self.folders, &mut self.prompts).and_then(|value| {
            self.store.save(&self.snapshot())?;
            Ok(value)
        });

        if result.is_err() {
            self.folders = folders_before;
            self.prompts = prompts_before;
        }

        log_library_operation(
            operation,
            entity_id,
            result.as_ref().err(),
            started.elapsed().as_millis() as u64,
        );
        result
    }
}
