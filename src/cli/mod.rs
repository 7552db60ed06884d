//! Command-line interface definitions and parsing
//!
//! Defines the CLI structure using Clap, including all commands, subcommands,
//! and their associated arguments and options.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "prepo")]
#[command(version)]
#[command(about = "promptrepo - folders and versioned prompts from the terminal")]
#[command(after_help = "COMMANDS BY CATEGORY:

BROWSING:
  ls, l           Show the folder tree with prompt counts
  find, f         Search prompts by name, then by text
  top             Most used prompts

PROMPTS:
  new, n          Create a prompt
  show, s         Print a prompt
  use, u          Print a prompt and count the usage
  edit, e         Save a new version of a prompt
  versions        Show version history
  restore         Restore an earlier version as the newest one
  mv              Move a prompt to another folder
  rm              Delete a prompt

FOLDERS:
  folder          Create, rename, move, reorder and delete folders

Prompts and folders can be named by full id, unique id prefix or name.

EXAMPLES:
  prepo folder new Work
  prepo new \"Code review\" \"Review this diff\" -f Work
  git diff | prepo edit \"Code review\"
  prepo use \"code review\" | pbcopy

Run 'prepo COMMAND --help' for more information on a command.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the folder tree with direct and nested prompt counts
    #[command(alias = "l")]
    Ls {
        /// List the prompts under each folder
        #[arg(short = 'p', long = "prompts")]
        prompts: bool,
    },
    /// Create a prompt (text from the argument or stdin)
    #[command(alias = "n")]
    New {
        name: String,
        text: Option<String>,
        /// Folder to file the prompt under
        #[arg(short = 'f', long = "folder")]
        folder: Option<String>,
    },
    /// Print a prompt
    #[command(alias = "s")]
    Show {
        prompt: String,
        /// Print this version instead of the current one
        #[arg(long = "at", value_name = "VERSION")]
        at: Option<u32>,
    },
    /// Print a prompt's text and count the usage
    #[command(alias = "u")]
    Use { prompt: String },
    /// Save a new version (text from the argument or stdin)
    #[command(alias = "e")]
    Edit {
        prompt: String,
        text: Option<String>,
        /// New name for the prompt
        #[arg(short = 'n', long = "name")]
        name: Option<String>,
    },
    /// Show version history
    Versions { prompt: String },
    /// Restore an earlier version as the newest one
    Restore { prompt: String, version: u32 },
    /// Move a prompt to a folder, or to root when no folder is given
    Mv {
        prompt: String,
        folder: Option<String>,
    },
    /// Delete a prompt
    Rm { prompt: String },
    /// Search prompts by name, falling back to text
    #[command(alias = "f")]
    Find { query: String },
    /// Most used prompts
    Top {
        #[arg(short = 'n', long = "limit", default_value_t = 10)]
        limit: usize,
    },
    /// Manage folders
    Folder {
        #[command(subcommand)]
        action: FolderCommands,
    },
}

#[derive(Subcommand)]
pub enum FolderCommands {
    /// Create a folder
    New {
        name: String,
        /// Parent folder (root when omitted)
        #[arg(short = 'p', long = "parent")]
        parent: Option<String>,
    },
    /// Rename a folder
    Rename { folder: String, name: String },
    /// Delete a folder; its subfolders and prompts move to its parent
    Rm { folder: String },
    /// Move a folder under another one, or to root when no parent is given
    Mv {
        folder: String,
        parent: Option<String>,
    },
    /// Move a folder one place up among its siblings
    Up { folder: String },
    /// Move a folder one place down among its siblings
    Down { folder: String },
    /// Put a folder at a position (0-based) among its siblings
    Reorder { folder: String, position: usize },
    /// Set the full order of a sibling group
    Sort {
        /// Folders in their new order
        #[arg(required = true, num_args = 1..)]
        folders: Vec<String>,
        /// Parent of the group (root when omitted)
        #[arg(short = 'p', long = "parent")]
        parent: Option<String>,
    },
    /// Collapse or expand a folder in tree listings
    Toggle { folder: String },
}

impl Commands {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Ls { .. } => "ls",
            Commands::New { .. } => "new",
            Commands::Show { .. } => "show",
            Commands::Use { .. } => "use",
            Commands::Edit { .. } => "edit",
            Commands::Versions { .. } => "versions",
            Commands::Restore { .. } => "restore",
            Commands::Mv { .. } => "mv",
            Commands::Rm { .. } => "rm",
            Commands::Find { .. } => "find",
            Commands::Top { .. } => "top",
            Commands::Folder { action } => match action {
                FolderCommands::New { .. } => "folder new",
                FolderCommands::Rename { .. } => "folder rename",
                FolderCommands::Rm { .. } => "folder rm",
                FolderCommands::Mv { .. } => "folder mv",
                FolderCommands::Up { .. } => "folder up",
                FolderCommands::Down { .. } => "folder down",
                FolderCommands::Reorder { .. } => "folder reorder",
                FolderCommands::Sort { .. } => "folder sort",
                FolderCommands::Toggle { .. } => "folder toggle",
            },
        }
    }
}

/// Top-level command names and aliases, for typo suggestions
pub const COMMAND_NAMES: &[&str] = &[
    "ls", "l", "new", "n", "show", "s", "use", "u", "edit", "e", "versions", "restore", "mv",
    "rm", "find", "f", "top", "folder",
];
