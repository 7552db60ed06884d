// Prompt commands: new, show, use, edit, versions, restore, mv, rm, find, top

use anyhow::{bail, Context, Result};
use colored::*;
use is_terminal::IsTerminal;
use std::io::Read;
use std::time::Instant;

use promptrepo::lookup::{resolve_folder, resolve_prompt, short_id};
use promptrepo::{Library, LibraryError, Prompt};

const PREVIEW_CHARS: usize = 100;

/// Text from the argument, or from stdin when it is piped
fn read_text(arg: Option<&str>) -> Result<String> {
    if let Some(text) = arg {
        return Ok(text.to_string());
    }

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        bail!("No text given. Pass it as an argument or pipe it on stdin");
    }
    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .context("Failed to read text from stdin")?;
    Ok(buffer)
}

pub fn handle_new(
    library: &mut Library,
    name: &str,
    text: Option<&str>,
    folder: Option<&str>,
    start: Instant,
) -> Result<()> {
    let folder_id = folder.map(|f| resolve_folder(library, f)).transpose()?;
    let text = read_text(text)?;
    let prompt = library.create_prompt(name, &text, folder_id.as_deref())?;
    println!(
        "Created prompt '{}' ({}) in {}ms",
        prompt.name.green(),
        short_id(&prompt.id),
        start.elapsed().as_millis()
    );
    Ok(())
}

pub fn handle_show(library: &Library, prompt: &str, at: Option<u32>) -> Result<()> {
    let id = resolve_prompt(library, prompt)?;
    let prompt = library
        .get_prompt(&id)
        .ok_or_else(|| LibraryError::prompt_not_found(id.as_str()))?;

    let (version, text) = match at {
        Some(number) => {
            let version = prompt
                .version(number)
                .ok_or_else(|| LibraryError::NotFound {
                    entity: "version",
                    id: format!("{}@{}", prompt.id, number),
                })?;
            (version.version, version.text.as_str())
        }
        None => (prompt.current_version, prompt.text.as_str()),
    };

    if std::io::stdout().is_terminal() {
        println!(
            "{}  {}",
            prompt.name.bold(),
            format!(
                "v{} of {}, used {} times, in {}",
                version,
                prompt.latest_version(),
                prompt.usage_count,
                folder_path(library, prompt.folder_id.as_deref())
            )
            .dimmed()
        );
        println!();
    }
    println!("{}", text);
    Ok(())
}

pub fn handle_use(library: &mut Library, prompt: &str) -> Result<()> {
    let id = resolve_prompt(library, prompt)?;
    let used = library.record_usage(&id)?;
    print!("{}", used.text);
    if std::io::stdout().is_terminal() {
        println!();
        eprintln!("{}", format!("used {} times", used.usage_count).dimmed());
    }
    Ok(())
}

pub fn handle_edit(
    library: &mut Library,
    prompt: &str,
    text: Option<&str>,
    name: Option<&str>,
) -> Result<()> {
    let id = resolve_prompt(library, prompt)?;
    let current = library
        .get_prompt(&id)
        .cloned()
        .ok_or_else(|| LibraryError::prompt_not_found(id.as_str()))?;

    // Renaming alone keeps the current text
    let text = match (text, name) {
        (None, Some(_)) if std::io::stdin().is_terminal() => current.text.clone(),
        (text, _) => read_text(text)?,
    };
    let name = name.unwrap_or(&current.name);

    let edited = library.edit_prompt(&id, name, &text)?;
    println!(
        "Saved '{}' as version {}",
        edited.name.green(),
        edited.current_version
    );
    Ok(())
}

pub fn handle_versions(library: &Library, prompt: &str) -> Result<()> {
    let id = resolve_prompt(library, prompt)?;
    let prompt = library
        .get_prompt(&id)
        .ok_or_else(|| LibraryError::prompt_not_found(id.as_str()))?;
    print!("{}", render_versions(prompt));
    Ok(())
}

/// Version history, newest first, with the current version marked
pub fn render_versions(prompt: &Prompt) -> String {
    let mut out = format!("Versions of '{}':\n", prompt.name.bold());
    for version in prompt.versions.iter().rev() {
        let marker = if version.version == prompt.current_version {
            "*"
        } else {
            " "
        };
        let preview: String = version.text.lines().next().unwrap_or("").chars().take(60).collect();
        out.push_str(&format!(
            "{} v{:<3} {}  {:<20} {}\n",
            marker,
            version.version,
            version
                .timestamp
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .dimmed(),
            version.name,
            preview
        ));
    }
    out
}

pub fn handle_restore(library: &mut Library, prompt: &str, version: u32) -> Result<()> {
    let id = resolve_prompt(library, prompt)?;
    let restored = library.restore_prompt(&id, version)?;
    println!(
        "Restored v{} of '{}' as version {}",
        version,
        restored.name.green(),
        restored.current_version
    );
    Ok(())
}

pub fn handle_mv(library: &mut Library, prompt: &str, folder: Option<&str>) -> Result<()> {
    let id = resolve_prompt(library, prompt)?;
    let folder_id = folder.map(|f| resolve_folder(library, f)).transpose()?;
    let moved = library.move_prompt(&id, folder_id.as_deref())?;
    println!(
        "Moved '{}' to {}",
        moved.name.green(),
        folder_path(library, moved.folder_id.as_deref())
    );
    Ok(())
}

pub fn handle_rm(library: &mut Library, prompt: &str) -> Result<()> {
    let id = resolve_prompt(library, prompt)?;
    let name = library
        .get_prompt(&id)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| id.clone());
    library.delete_prompt(&id)?;
    println!("Deleted prompt '{}'", name);
    Ok(())
}

pub fn handle_find(library: &Library, query: &str, start: Instant) -> Result<()> {
    let results = library.search(query);
    if results.is_empty() {
        println!("No prompts match '{}'", query);
        return Ok(());
    }

    print!("{}", render_prompt_list(library, &results));
    eprintln!(
        "{}",
        format!("{} found ({}ms)", results.len(), start.elapsed().as_millis()).dimmed()
    );
    Ok(())
}

pub fn handle_top(library: &Library, limit: usize) -> Result<()> {
    let used = library.most_used(Some(limit));
    if used.is_empty() {
        println!("No prompt has been used yet. Try: {}", "prepo use <prompt>".bold());
        return Ok(());
    }

    for (rank, prompt) in used.iter().enumerate() {
        println!(
            "{:>3}. {:<24} {:>5}x  {}",
            rank + 1,
            prompt.name.bold(),
            prompt.usage_count,
            folder_path(library, prompt.folder_id.as_deref()).dimmed()
        );
    }
    Ok(())
}

/// One line per prompt: name, folder path, preview
pub fn render_prompt_list(library: &Library, prompts: &[Prompt]) -> String {
    let mut out = String::new();
    for prompt in prompts {
        out.push_str(&format!(
            "{}  {}  {}\n    {}\n",
            prompt.name.bold(),
            short_id(&prompt.id).dimmed(),
            folder_path(library, prompt.folder_id.as_deref()).cyan(),
            prompt.preview(PREVIEW_CHARS).replace('\n', " ")
        ));
    }
    out
}

/// `Parent/Child` path of a folder, or `(unfiled)` for root
pub fn folder_path(library: &Library, folder_id: Option<&str>) -> String {
    let mut names = Vec::new();
    let mut current = folder_id.map(str::to_string);
    while let Some(id) = current {
        match library.get_folder(&id) {
            Some(folder) if names.len() <= library.folders().len() => {
                names.push(folder.name.clone());
                current = folder.parent_id.clone();
            }
            _ => break,
        }
    }

    if names.is_empty() {
        return "(unfiled)".to_string();
    }
    names.reverse();
    names.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptrepo::MemoryStore;
    use std::time::Duration;

    fn library() -> Library {
        colored::control::set_override(false);
        Library::open(MemoryStore::new(), Duration::ZERO).unwrap()
    }

    #[test]
    fn test_folder_path() {
        let mut library = library();
        let work = library.create_folder("Work", None).unwrap();
        let drafts = library.create_folder("Drafts", Some(&work.id)).unwrap();

        assert_eq!(folder_path(&library, Some(&drafts.id)), "Work/Drafts");
        assert_eq!(folder_path(&library, None), "(unfiled)");
    }

    #[test]
    fn test_render_versions_marks_current() {
        let mut library = library();
        let prompt = library.create_prompt("Review", "first", None).unwrap();
        library.edit_prompt(&prompt.id, "Review", "second").unwrap();
        let restored = library.restore_prompt(&prompt.id, 1).unwrap();

        let rendered = render_versions(&restored);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("* v3"));
        assert!(lines[1].ends_with("first"));
        assert!(lines[3].starts_with("  v1"));
    }

    #[test]
    fn test_prompt_commands_with_arguments() {
        let mut library = library();
        let start = Instant::now();
        library.create_folder("Work", None).unwrap();

        handle_new(&mut library, "Review", Some("Review this"), Some("work"), start).unwrap();
        handle_use(&mut library, "review").unwrap();
        handle_edit(&mut library, "Review", Some("Review this carefully"), None).unwrap();
        handle_restore(&mut library, "Review", 1).unwrap();

        let prompt = library.search("review").remove(0);
        assert_eq!(prompt.usage_count, 1);
        assert_eq!(prompt.current_version, 3);
        assert_eq!(prompt.text, "Review this");

        handle_mv(&mut library, "Review", None).unwrap();
        assert_eq!(library.get_prompt(&prompt.id).unwrap().folder_id, None);

        handle_rm(&mut library, "Review").unwrap();
        assert!(library.prompts().is_empty());
    }

    #[test]
    fn test_unknown_prompt_is_a_lookup_error() {
        let mut library = library();
        let err = handle_use(&mut library, "missing").unwrap_err();
        assert!(err
            .downcast_ref::<promptrepo::lookup::LookupError>()
            .is_some());
    }

    #[test]
    fn test_prompt_list_shows_folder_and_preview() {
        let mut library = library();
        let work = library.create_folder("Work", None).unwrap();
        let prompt = library
            .create_prompt("Review", "line one\nline two", Some(&work.id))
            .unwrap();

        let rendered = render_prompt_list(&library, &[prompt]);
        assert!(rendered.contains("Work"));
        assert!(rendered.contains("line one line two"));
    }
}
