use anyhow::Result;
use clap::Parser;
use std::env;
use std::time::Instant;

use promptrepo::{error_help, init_logging, log_command_execution, Library, LogConfig, Settings, Storage};

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    // .env is optional
    dotenvy::dotenv().ok();

    let start = Instant::now();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if let clap::error::ErrorKind::InvalidSubcommand = e.kind() {
                if let Some(cmd) = env::args().nth(1) {
                    eprintln!("{}", error_help::format_command_typo(&cmd, cli::COMMAND_NAMES));
                    std::process::exit(1);
                }
            }
            e.exit();
        }
    };

    // Only initialize logging if explicitly requested via env var
    let _log_guard = if env::var("PROMPTREPO_LOG_LEVEL").is_ok() {
        match init_logging(LogConfig::from_env()) {
            Ok(guard) => guard,
            Err(e) => {
                eprintln!("{}", error_help::format_error(&e));
                None
            }
        }
    } else {
        None
    };

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        let _ = Cli::command().print_help();
        return;
    };

    let result = run(&command, start);
    log_command_execution(command.name(), start.elapsed().as_millis() as u64, &result);

    if let Err(e) = result {
        eprintln!("{}", error_help::format_error(&e));
        std::process::exit(1);
    }
}

fn run(command: &Commands, start: Instant) -> Result<()> {
    let storage = Storage::new()?;
    storage.init()?;
    let settings = Settings::load(&storage.config_path())?;
    let mut library = Library::open(storage.file_store(), settings.usage.cooldown())?;

    match command {
        Commands::Ls { prompts } => commands::handle_ls(&library, *prompts, start),
        Commands::New { name, text, folder } => commands::handle_new(
            &mut library,
            name,
            text.as_deref(),
            folder.as_deref(),
            start,
        ),
        Commands::Show { prompt, at } => commands::handle_show(&library, prompt, *at),
        Commands::Use { prompt } => commands::handle_use(&mut library, prompt),
        Commands::Edit { prompt, text, name } => {
            commands::handle_edit(&mut library, prompt, text.as_deref(), name.as_deref())
        }
        Commands::Versions { prompt } => commands::handle_versions(&library, prompt),
        Commands::Restore { prompt, version } => {
            commands::handle_restore(&mut library, prompt, *version)
        }
        Commands::Mv { prompt, folder } => {
            commands::handle_mv(&mut library, prompt, folder.as_deref())
        }
        Commands::Rm { prompt } => commands::handle_rm(&mut library, prompt),
        Commands::Find { query } => commands::handle_find(&library, query, start),
        Commands::Top { limit } => commands::handle_top(&library, *limit),
        Commands::Folder { action } => commands::handle_folder(&mut library, action, start),
    }
}
