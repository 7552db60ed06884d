pub mod folders;
pub mod prompts;

pub use folders::{handle_folder, handle_ls};
pub use prompts::{
    handle_edit, handle_find, handle_mv, handle_new, handle_restore, handle_rm, handle_show,
    handle_top, handle_use, handle_versions,
};
