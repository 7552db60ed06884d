// Folder commands and the `ls` tree view

use anyhow::Result;
use colored::*;
use std::time::Instant;

use promptrepo::lookup::{resolve_folder, short_id};
use promptrepo::{Folder, Library, LibraryResult};

use crate::cli::FolderCommands;

pub fn handle_ls(library: &Library, with_prompts: bool, start: Instant) -> Result<()> {
    if library.folders().is_empty() && library.prompts().is_empty() {
        println!(
            "  Nothing here yet. Start with: {} or {}",
            "prepo folder new <name>".bold(),
            "prepo new <name> <text>".bold()
        );
        return Ok(());
    }

    print!("{}", render_tree(library, with_prompts)?);
    eprintln!("{}", format!("({}ms)", start.elapsed().as_millis()).dimmed());
    Ok(())
}

/// Folder tree with `[direct/nested]` prompt counts.
///
/// Collapsed folders show a `+` marker and hide what is below them.
pub fn render_tree(library: &Library, with_prompts: bool) -> LibraryResult<String> {
    let mut out = String::new();
    for folder in library.list_children(None) {
        render_folder(library, &folder, 0, with_prompts, &mut out)?;
    }

    let unfiled = library.list_by_folder(None, false)?;
    if !unfiled.is_empty() {
        out.push_str(&format!("{} [{}]\n", "(unfiled)".dimmed(), unfiled.len()));
        if with_prompts {
            for prompt in &unfiled {
                out.push_str(&format!("  - {}  {}\n", prompt.name, short_id(&prompt.id).dimmed()));
            }
        }
    }
    Ok(out)
}

fn render_folder(
    library: &Library,
    folder: &Folder,
    depth: usize,
    with_prompts: bool,
    out: &mut String,
) -> LibraryResult<()> {
    let indent = "  ".repeat(depth);
    let children = library.list_children(Some(&folder.id));
    let direct = library.count_in_folder(Some(&folder.id), false)?;
    let nested = library.count_in_folder(Some(&folder.id), true)?;

    let marker = if folder.expanded || children.is_empty() {
        " "
    } else {
        "+"
    };
    out.push_str(&format!(
        "{}{} {} [{}/{}]  {}\n",
        indent,
        marker,
        folder.name.bold(),
        direct,
        nested,
        short_id(&folder.id).dimmed()
    ));

    if !folder.expanded {
        return Ok(());
    }

    for child in &children {
        render_folder(library, child, depth + 1, with_prompts, out)?;
    }
    if with_prompts {
        for prompt in library.list_by_folder(Some(&folder.id), false)? {
            out.push_str(&format!(
                "{}    - {}  {}\n",
                indent,
                prompt.name,
                short_id(&prompt.id).dimmed()
            ));
        }
    }
    Ok(())
}

pub fn handle_folder(library: &mut Library, action: &FolderCommands, start: Instant) -> Result<()> {
    match action {
        FolderCommands::New { name, parent } => {
            let parent_id = parent
                .as_deref()
                .map(|p| resolve_folder(library, p))
                .transpose()?;
            let folder = library.create_folder(name, parent_id.as_deref())?;
            println!(
                "Created folder '{}' ({}) in {}ms",
                folder.name.green(),
                short_id(&folder.id),
                start.elapsed().as_millis()
            );
        }
        FolderCommands::Rename { folder, name } => {
            let id = resolve_folder(library, folder)?;
            let renamed = library.rename_folder(&id, name)?;
            println!("Renamed folder to '{}'", renamed.name.green());
        }
        FolderCommands::Rm { folder } => {
            let id = resolve_folder(library, folder)?;
            let name = folder_label(library, &id);
            library.delete_folder(&id)?;
            println!("Deleted folder '{}'; its contents moved up one level", name);
        }
        FolderCommands::Mv { folder, parent } => {
            let id = resolve_folder(library, folder)?;
            let parent_id = parent
                .as_deref()
                .map(|p| resolve_folder(library, p))
                .transpose()?;
            let moved = library.move_folder(&id, parent_id.as_deref())?;
            let target = match &moved.parent_id {
                Some(parent_id) => folder_label(library, parent_id),
                None => "root".to_string(),
            };
            println!("Moved folder '{}' to {}", moved.name.green(), target);
        }
        FolderCommands::Up { folder } => {
            let id = resolve_folder(library, folder)?;
            library.move_folder_up(&id)?;
            print_siblings(library, &id);
        }
        FolderCommands::Down { folder } => {
            let id = resolve_folder(library, folder)?;
            library.move_folder_down(&id)?;
            print_siblings(library, &id);
        }
        FolderCommands::Reorder { folder, position } => {
            let id = resolve_folder(library, folder)?;
            library.reorder_folder(&id, *position)?;
            print_siblings(library, &id);
        }
        FolderCommands::Sort { folders, parent } => {
            let parent_id = parent
                .as_deref()
                .map(|p| resolve_folder(library, p))
                .transpose()?;
            let ids = folders
                .iter()
                .map(|f| resolve_folder(library, f))
                .collect::<Result<Vec<_>, _>>()?;
            library.reorder_siblings(parent_id.as_deref(), &ids)?;
            if let Some(first) = ids.first() {
                print_siblings(library, first);
            }
        }
        FolderCommands::Toggle { folder } => {
            let id = resolve_folder(library, folder)?;
            let toggled = library.toggle_folder(&id)?;
            let state = if toggled.expanded { "expanded" } else { "collapsed" };
            println!("Folder '{}' is now {}", toggled.name.green(), state);
        }
    }
    Ok(())
}

fn folder_label(library: &Library, id: &str) -> String {
    library
        .get_folder(id)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| id.to_string())
}

/// Print the sibling group of `id` in its new order
fn print_siblings(library: &Library, id: &str) {
    let parent_id = library.get_folder(id).and_then(|f| f.parent_id.clone());
    let names: Vec<String> = library
        .list_children(parent_id.as_deref())
        .into_iter()
        .map(|f| {
            if f.id == id {
                f.name.green().to_string()
            } else {
                f.name
            }
        })
        .collect();
    println!("Order: {}", names.join(", "));
}
