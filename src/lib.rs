//! promptrepo - a personal prompt library with nested folders and version history
//!
//! Prompts live in an ordered folder tree. Every edit of a prompt appends a
//! version, restoring an old version appends another, and usage counts feed
//! a "most used" view. The whole library is one JSON document on disk.
//!
//! # Quick Start
//!
//! ```no_run
//! use promptrepo::{Library, Settings, Storage};
//!
//! let storage = Storage::new()?;
//! storage.init()?;
//! let settings = Settings::load(&storage.config_path())?;
//!
//! let mut library = Library::open(storage.file_store(), settings.usage.cooldown())?;
//! let work = library.create_folder("Work", None)?;
//! let review = library.create_prompt("Review", "Review this diff", Some(&work.id))?;
//! library.edit_prompt(&review.id, "Review", "Review this diff carefully")?;
//! library.restore_prompt(&review.id, 1)?;
//!
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Modules
//!
//! - [`folder_tree`]: folder hierarchy, ordering and cycle checks
//! - [`prompt_store`]: prompts, versions, usage and search
//! - [`library`]: both of the above behind all-or-nothing persistence
//! - [`storage`]: on-disk layout and record stores
//! - [`server`]: HTTP JSON API (feature `server`)

pub mod config;
pub mod error;
pub mod error_help;
pub mod folder_tree;
pub mod library;
pub mod logging;
pub mod lookup;
pub mod matching;
pub mod models;
pub mod prompt_store;
pub mod storage;

#[cfg(feature = "server")]
pub mod server;

pub use config::{ServerSettings, Settings, UsageSettings};
pub use error::{LibraryError, LibraryResult, StorageError};
pub use folder_tree::{Direction, FolderTree, FolderView};
pub use library::Library;
pub use logging::{init_logging, log_command_execution, log_library_operation, LogConfig, LogFormat};
pub use models::{Folder, Prompt, PromptVersion, Snapshot};
pub use prompt_store::PromptStore;
pub use storage::{JsonFileStore, MemoryStore, RecordStore, Storage};
