//! Folder hierarchy: a parent-pointer forest with ordered siblings
//!
//! Folders are kept as flat records referencing their parent by id. Each
//! sibling group (folders sharing a parent) is ranked by `order`; groups are
//! kept compact (`0..n`) so appending with `order = sibling count` never
//! collides. Ties on load are broken by id.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use tracing::warn;
use uuid::Uuid;

use crate::error::{LibraryError, LibraryResult};
use crate::models::Folder;

/// Read-only view of the folder set, used by queries that join prompts
/// against folders.
pub trait FolderView {
    fn contains_folder(&self, id: &str) -> bool;

    /// Direct children of `parent_id` (root when `None`), in display order
    fn child_folder_ids(&self, parent_id: Option<&str>) -> Vec<String>;
}

/// Direction for single-step sibling moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Default)]
pub struct FolderTree {
    folders: Vec<Folder>,
}

impl FolderTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from stored records, repairing dangling parents and
    /// parent loops by moving the affected folders to root.
    pub fn from_folders(folders: Vec<Folder>) -> Self {
        let mut tree = Self { folders };
        tree.repair();
        tree
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Create a folder at the end of its sibling group
    pub fn create(&mut self, name: &str, parent_id: Option<&str>) -> LibraryResult<Folder> {
        let name = validate_name(name)?;
        if let Some(parent) = parent_id {
            if !self.contains(parent) {
                return Err(LibraryError::folder_not_found(parent));
            }
        }

        let folder = Folder {
            id: Uuid::new_v4().to_string(),
            name,
            parent_id: parent_id.map(str::to_string),
            order: self.sibling_count(parent_id),
            expanded: true,
        };
        self.folders.push(folder.clone());
        Ok(folder)
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> LibraryResult<Folder> {
        let index = self.index_of(id)?;
        let name = validate_name(new_name)?;
        self.folders[index].name = name;
        Ok(self.folders[index].clone())
    }

    /// Remove a folder, handing its direct children to its own parent.
    ///
    /// Returns the former parent so prompts filed under the deleted folder
    /// can be reassigned to the same place.
    pub fn delete(&mut self, id: &str) -> LibraryResult<Option<String>> {
        let index = self.index_of(id)?;
        let removed = self.folders.remove(index);
        let parent = removed.parent_id;

        let children = self.sorted_siblings(Some(id));
        self.compact_group(parent.as_deref());

        let mut next = self.sibling_count(parent.as_deref());
        for child in children {
            self.folders[child].parent_id = parent.clone();
            self.folders[child].order = next;
            next += 1;
        }

        Ok(parent)
    }

    /// Reparent a folder, appending it to the new sibling group.
    ///
    /// Moving a folder under itself or one of its descendants fails with
    /// `Cycle` and leaves the tree untouched. Moving to the current parent
    /// is a no-op.
    pub fn move_to(&mut self, id: &str, new_parent_id: Option<&str>) -> LibraryResult<Folder> {
        let index = self.index_of(id)?;

        if let Some(target) = new_parent_id {
            if !self.contains(target) {
                return Err(LibraryError::folder_not_found(target));
            }
            if target == id || self.is_descendant(target, id) {
                return Err(LibraryError::Cycle {
                    folder_id: id.to_string(),
                    target_id: target.to_string(),
                });
            }
        }

        let old_parent = self.folders[index].parent_id.clone();
        if old_parent.as_deref() == new_parent_id {
            return Ok(self.folders[index].clone());
        }

        let order = self.sibling_count(new_parent_id);
        let folder = &mut self.folders[index];
        folder.parent_id = new_parent_id.map(str::to_string);
        folder.order = order;
        let moved = folder.clone();

        self.compact_group(old_parent.as_deref());
        Ok(moved)
    }

    pub fn move_up(&mut self, id: &str) -> LibraryResult<()> {
        self.shift(id, Direction::Up)
    }

    pub fn move_down(&mut self, id: &str) -> LibraryResult<()> {
        self.shift(id, Direction::Down)
    }

    /// Swap a folder with its neighbour in the sibling group.
    /// No-op at the first/last position.
    pub fn shift(&mut self, id: &str, direction: Direction) -> LibraryResult<()> {
        let index = self.index_of(id)?;
        let parent = self.folders[index].parent_id.clone();
        let mut siblings = self.sorted_siblings(parent.as_deref());

        let position = siblings
            .iter()
            .position(|&i| i == index)
            .ok_or_else(|| LibraryError::folder_not_found(id))?;
        let neighbour = match direction {
            Direction::Up => position.checked_sub(1),
            Direction::Down => Some(position + 1).filter(|&p| p < siblings.len()),
        };

        if let Some(neighbour) = neighbour {
            siblings.swap(position, neighbour);
            self.assign_orders(&siblings);
        }
        Ok(())
    }

    /// Place a folder at `position` within its sibling group (clamped to the
    /// group size) and renumber the group.
    pub fn reorder(&mut self, id: &str, position: usize) -> LibraryResult<()> {
        let index = self.index_of(id)?;
        let parent = self.folders[index].parent_id.clone();

        let mut siblings = self.sorted_siblings(parent.as_deref());
        siblings.retain(|&i| i != index);
        let position = position.min(siblings.len());
        siblings.insert(position, index);

        self.assign_orders(&siblings);
        Ok(())
    }

    /// Bulk reorder: `ordered_ids` must list exactly the children of
    /// `parent_id`; each gets `order` equal to its index.
    pub fn reorder_siblings(
        &mut self,
        parent_id: Option<&str>,
        ordered_ids: &[String],
    ) -> LibraryResult<()> {
        if let Some(parent) = parent_id {
            if !self.contains(parent) {
                return Err(LibraryError::folder_not_found(parent));
            }
        }

        let expected = self.sibling_count(parent_id) as usize;
        if ordered_ids.len() != expected {
            return Err(LibraryError::validation(format!(
                "expected {} folder ids for this group, got {}",
                expected,
                ordered_ids.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut indices = Vec::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            let index = self.index_of(id)?;
            if self.folders[index].parent_id.as_deref() != parent_id {
                return Err(LibraryError::validation(format!(
                    "folder '{}' does not belong to this group",
                    id
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(LibraryError::validation(format!(
                    "folder '{}' listed more than once",
                    id
                )));
            }
            indices.push(index);
        }

        self.assign_orders(&indices);
        Ok(())
    }

    /// Direct children of `parent_id` (root when `None`), sorted by order
    pub fn list_children(&self, parent_id: Option<&str>) -> Vec<Folder> {
        self.sorted_siblings(parent_id)
            .into_iter()
            .map(|i| self.folders[i].clone())
            .collect()
    }

    /// True when `ancestor_id` appears on the parent chain of `candidate_id`.
    /// A folder is not its own descendant.
    pub fn is_descendant(&self, candidate_id: &str, ancestor_id: &str) -> bool {
        let mut current = self.parent_of(candidate_id);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor_id {
                return true;
            }
            steps += 1;
            if steps > self.folders.len() {
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }

    /// Every folder below `id`, breadth-first
    pub fn descendant_ids(&self, id: &str) -> LibraryResult<Vec<String>> {
        if !self.contains(id) {
            return Err(LibraryError::folder_not_found(id));
        }

        let mut seen: HashSet<String> = HashSet::new();
        let mut found = Vec::new();
        let mut queue = VecDeque::from([id.to_string()]);
        while let Some(current) = queue.pop_front() {
            for child in self.child_folder_ids(Some(&current)) {
                if seen.insert(child.clone()) {
                    found.push(child.clone());
                    queue.push_back(child);
                }
            }
        }
        Ok(found)
    }

    pub fn set_expanded(&mut self, id: &str, expanded: bool) -> LibraryResult<Folder> {
        let index = self.index_of(id)?;
        self.folders[index].expanded = expanded;
        Ok(self.folders[index].clone())
    }

    pub fn toggle_expanded(&mut self, id: &str) -> LibraryResult<Folder> {
        let expanded = self.get(id).map(|f| !f.expanded);
        match expanded {
            Some(expanded) => self.set_expanded(id, expanded),
            None => Err(LibraryError::folder_not_found(id)),
        }
    }

    fn index_of(&self, id: &str) -> LibraryResult<usize> {
        self.folders
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| LibraryError::folder_not_found(id))
    }

    fn parent_of(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(|f| f.parent_id.as_deref())
    }

    fn sibling_count(&self, parent_id: Option<&str>) -> u32 {
        self.folders
            .iter()
            .filter(|f| f.parent_id.as_deref() == parent_id)
            .count() as u32
    }

    /// Indices of a sibling group, sorted by (order, id)
    fn sorted_siblings(&self, parent_id: Option<&str>) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .folders
            .iter()
            .enumerate()
            .filter(|(_, f)| f.parent_id.as_deref() == parent_id)
            .map(|(i, _)| i)
            .collect();
        indices.sort_by(|&a, &b| {
            let (fa, fb) = (&self.folders[a], &self.folders[b]);
            fa.order.cmp(&fb.order).then_with(|| fa.id.cmp(&fb.id))
        });
        indices
    }

    fn assign_orders(&mut self, indices: &[usize]) {
        for (rank, &index) in indices.iter().enumerate() {
            self.folders[index].order = rank as u32;
        }
    }

    fn compact_group(&mut self, parent_id: Option<&str>) {
        let siblings = self.sorted_siblings(parent_id);
        self.assign_orders(&siblings);
    }

    fn repair(&mut self) {
        let ids: HashSet<String> = self.folders.iter().map(|f| f.id.clone()).collect();
        for folder in &mut self.folders {
            let dangling = folder
                .parent_id
                .as_ref()
                .is_some_and(|parent| !ids.contains(parent));
            if dangling {
                warn!(
                    folder_id = %folder.id,
                    parent_id = ?folder.parent_id,
                    "Folder parent missing, moving to root"
                );
                folder.parent_id = None;
            }
        }

        for index in 0..self.folders.len() {
            if self.parent_chain_loops(index) {
                warn!(folder_id = %self.folders[index].id, "Folder parent chain loops, moving to root");
                self.folders[index].parent_id = None;
            }
        }

        let mut parents: Vec<Option<String>> = Vec::new();
        for folder in &self.folders {
            if !parents.contains(&folder.parent_id) {
                parents.push(folder.parent_id.clone());
            }
        }
        for parent in parents {
            self.compact_group(parent.as_deref());
        }
    }

    fn parent_chain_loops(&self, index: usize) -> bool {
        let start = self.folders[index].id.as_str();
        let mut seen = HashSet::new();
        let mut current = self.folders[index].parent_id.as_deref();
        while let Some(id) = current {
            if id == start {
                return true;
            }
            if !seen.insert(id) {
                return false;
            }
            current = self.parent_of(id);
        }
        false
    }
}

impl FolderView for FolderTree {
    fn contains_folder(&self, id: &str) -> bool {
        self.contains(id)
    }

    fn child_folder_ids(&self, parent_id: Option<&str>) -> Vec<String> {
        self.sorted_siblings(parent_id)
            .into_iter()
            .map(|i| self.folders[i].id.clone())
            .collect()
    }
}

fn validate_name(name: &str) -> LibraryResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::validation("folder name must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(id: &str, parent: Option<&str>, order: u32) -> Folder {
        Folder {
            id: id.to_string(),
            name: id.to_uppercase(),
            parent_id: parent.map(str::to_string),
            order,
            expanded: true,
        }
    }

    fn names(folders: &[Folder]) -> Vec<String> {
        folders.iter().map(|f| f.name.clone()).collect()
    }

    #[test]
    fn test_create_appends_to_sibling_group() {
        let mut tree = FolderTree::new();
        let a = tree.create("A", None).unwrap();
        let b = tree.create("B", None).unwrap();
        let child = tree.create("Child", Some(&a.id)).unwrap();

        assert_eq!(a.order, 0);
        assert_eq!(b.order, 1);
        assert_eq!(child.order, 0);
        assert_eq!(child.parent_id.as_deref(), Some(a.id.as_str()));
        assert!(child.expanded);
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let mut tree = FolderTree::new();
        let err = tree.create("   ", None).unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_create_with_unknown_parent_fails() {
        let mut tree = FolderTree::new();
        let err = tree.create("A", Some("missing")).unwrap_err();
        assert!(matches!(err, LibraryError::NotFound { .. }));
    }

    #[test]
    fn test_rename_trims_and_validates() {
        let mut tree = FolderTree::new();
        let a = tree.create("A", None).unwrap();

        let renamed = tree.rename(&a.id, "  Work  ").unwrap();
        assert_eq!(renamed.name, "Work");
        assert!(matches!(
            tree.rename(&a.id, ""),
            Err(LibraryError::Validation(_))
        ));
        assert!(matches!(
            tree.rename("nope", "X"),
            Err(LibraryError::NotFound { .. })
        ));
        assert!(matches!(
            tree.rename("nope", ""),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_reparents_children_to_grandparent() {
        let mut tree = FolderTree::from_folders(vec![
            folder("root", None, 0),
            folder("f", Some("root"), 0),
            folder("sibling", Some("root"), 1),
            folder("c1", Some("f"), 0),
            folder("c2", Some("f"), 1),
            folder("g", Some("c1"), 0),
        ]);

        let parent = tree.delete("f").unwrap();
        assert_eq!(parent.as_deref(), Some("root"));
        assert!(!tree.contains("f"));

        let children = tree.list_children(Some("root"));
        assert_eq!(names(&children), vec!["SIBLING", "C1", "C2"]);
        assert_eq!(
            children.iter().map(|f| f.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        // Grandchildren keep their own parent
        assert_eq!(tree.get("g").unwrap().parent_id.as_deref(), Some("c1"));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_delete_root_folder_moves_children_to_root() {
        let mut tree = FolderTree::from_folders(vec![
            folder("a", None, 0),
            folder("b", Some("a"), 0),
        ]);

        assert_eq!(tree.delete("a").unwrap(), None);
        assert_eq!(tree.get("b").unwrap().parent_id, None);
        assert!(matches!(tree.delete("a"), Err(LibraryError::NotFound { .. })));
    }

    #[test]
    fn test_move_into_self_or_descendant_is_cycle() {
        let mut tree = FolderTree::from_folders(vec![
            folder("a", None, 0),
            folder("b", Some("a"), 0),
            folder("c", Some("b"), 0),
        ]);
        let before = tree.folders().to_vec();

        assert!(matches!(tree.move_to("a", Some("a")), Err(LibraryError::Cycle { .. })));
        assert!(matches!(tree.move_to("a", Some("c")), Err(LibraryError::Cycle { .. })));
        assert_eq!(tree.folders(), before.as_slice());
    }

    #[test]
    fn test_move_appends_and_compacts_old_group() {
        let mut tree = FolderTree::from_folders(vec![
            folder("a", None, 0),
            folder("b", None, 1),
            folder("c", None, 2),
            folder("x", Some("c"), 0),
        ]);

        let moved = tree.move_to("a", Some("c")).unwrap();
        assert_eq!(moved.parent_id.as_deref(), Some("c"));
        assert_eq!(moved.order, 1);
        assert!(!tree.is_descendant("c", "a"));
        assert!(tree.is_descendant("a", "c"));

        let root = tree.list_children(None);
        assert_eq!(names(&root), vec!["B", "C"]);
        assert_eq!(root.iter().map(|f| f.order).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_move_to_root_and_same_parent() {
        let mut tree = FolderTree::from_folders(vec![
            folder("a", None, 0),
            folder("b", Some("a"), 0),
        ]);

        let unchanged = tree.move_to("b", Some("a")).unwrap();
        assert_eq!(unchanged.order, 0);

        let moved = tree.move_to("b", None).unwrap();
        assert_eq!(moved.parent_id, None);
        assert_eq!(moved.order, 1);
        assert!(matches!(
            tree.move_to("b", Some("missing")),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_move_down_swaps_with_next_sibling() {
        let mut tree = FolderTree::from_folders(vec![
            folder("first", None, 0),
            folder("second", None, 1),
            folder("third", None, 2),
        ]);

        tree.move_down("first").unwrap();
        assert_eq!(tree.get("first").unwrap().order, 1);
        assert_eq!(tree.get("second").unwrap().order, 0);
        assert_eq!(tree.get("third").unwrap().order, 2);

        let before = tree.folders().to_vec();
        tree.move_down("third").unwrap();
        assert_eq!(tree.folders(), before.as_slice());
    }

    #[test]
    fn test_move_up_at_top_is_noop() {
        let mut tree = FolderTree::from_folders(vec![
            folder("first", None, 0),
            folder("second", None, 1),
        ]);

        tree.move_up("first").unwrap();
        assert_eq!(tree.get("first").unwrap().order, 0);

        tree.move_up("second").unwrap();
        assert_eq!(names(&tree.list_children(None)), vec!["SECOND", "FIRST"]);
    }

    #[test]
    fn test_reorder_to_position() {
        let mut tree = FolderTree::from_folders(vec![
            folder("a", None, 0),
            folder("b", None, 1),
            folder("c", None, 2),
        ]);

        tree.reorder("c", 0).unwrap();
        assert_eq!(names(&tree.list_children(None)), vec!["C", "A", "B"]);

        tree.reorder("c", 99).unwrap();
        assert_eq!(names(&tree.list_children(None)), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_reorder_siblings_assigns_index_orders() {
        let mut tree = FolderTree::from_folders(vec![
            folder("a", None, 0),
            folder("b", None, 1),
            folder("c", None, 2),
        ]);

        let ids = vec!["c".to_string(), "a".to_string(), "b".to_string()];
        tree.reorder_siblings(None, &ids).unwrap();
        assert_eq!(names(&tree.list_children(None)), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_reorder_siblings_rejects_partial_or_foreign_lists() {
        let mut tree = FolderTree::from_folders(vec![
            folder("a", None, 0),
            folder("b", None, 1),
            folder("x", Some("a"), 0),
        ]);
        let before = tree.folders().to_vec();

        let partial = vec!["a".to_string()];
        assert!(matches!(
            tree.reorder_siblings(None, &partial),
            Err(LibraryError::Validation(_))
        ));
        let foreign = vec!["a".to_string(), "x".to_string()];
        assert!(matches!(
            tree.reorder_siblings(None, &foreign),
            Err(LibraryError::Validation(_))
        ));
        let duplicated = vec!["a".to_string(), "a".to_string()];
        assert!(matches!(
            tree.reorder_siblings(None, &duplicated),
            Err(LibraryError::Validation(_))
        ));
        assert_eq!(tree.folders(), before.as_slice());
    }

    #[test]
    fn test_list_children_breaks_order_ties_by_id() {
        let tree = FolderTree::from_folders(vec![
            folder("b", None, 0),
            folder("a", None, 0),
            folder("c", None, 5),
        ]);

        let root = tree.list_children(None);
        assert_eq!(names(&root), vec!["A", "B", "C"]);
        assert_eq!(root.iter().map(|f| f.order).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_repair_moves_dangling_and_looping_folders_to_root() {
        let tree = FolderTree::from_folders(vec![
            folder("orphan", Some("gone"), 0),
            folder("x", Some("y"), 0),
            folder("y", Some("x"), 0),
        ]);

        assert_eq!(tree.get("orphan").unwrap().parent_id, None);
        // One link of the loop is cut, the other survives
        assert_eq!(tree.get("x").unwrap().parent_id, None);
        assert_eq!(tree.get("y").unwrap().parent_id.as_deref(), Some("x"));
        assert!(!tree.is_descendant("x", "x"));
    }

    #[test]
    fn test_descendant_ids_and_expansion_toggle() {
        let mut tree = FolderTree::from_folders(vec![
            folder("a", None, 0),
            folder("b", Some("a"), 0),
            folder("c", Some("b"), 0),
            folder("d", Some("a"), 1),
        ]);

        let mut ids = tree.descendant_ids("a").unwrap();
        ids.sort();
        assert_eq!(ids, vec!["b", "c", "d"]);
        assert!(tree.descendant_ids("c").unwrap().is_empty());

        let collapsed = tree.toggle_expanded("a").unwrap();
        assert!(!collapsed.expanded);
        assert!(tree.toggle_expanded("a").unwrap().expanded);
    }
}
