use anyhow::{Context, Result};

use promptrepo::{init_logging, server, Library, LogConfig, Settings, Storage};

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let _log_guard = init_logging(LogConfig::from_env_or("info"))?;

    let storage = Storage::new()?;
    storage.init()?;
    let settings = Settings::load(&storage.config_path())?;
    let store = storage.file_store();
    tracing::info!(data = ?store.path(), "Opening prompt library");
    let library = Library::open(store, settings.usage.cooldown())?;

    println!(
        "promptrepo API listening on http://{}",
        settings.bind_address()
    );
    server::run(library, &settings)
        .await
        .with_context(|| format!("Server failed on {}", settings.bind_address()))
}
