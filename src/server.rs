//! HTTP JSON API over a shared [`Library`]
//!
//! Every handler takes the library lock for the duration of one operation.
//! Mutations run on the blocking thread pool since each one saves to disk.
//! Errors are returned as `{"error": kind, "message": text}` with a status
//! code derived from the error kind.

use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::config::Settings;
use crate::error::{LibraryError, StorageError};
use crate::folder_tree::Direction;
use crate::library::Library;

pub type SharedLibrary = web::Data<Mutex<Library>>;

#[derive(Debug)]
pub enum ApiError {
    Library(LibraryError),
    /// Request body or query string could not be decoded
    BadRequest(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Library(e) => write!(f, "{}", e),
            ApiError::BadRequest(message) => write!(f, "{}", message),
        }
    }
}

impl From<LibraryError> for ApiError {
    fn from(error: LibraryError) -> Self {
        ApiError::Library(error)
    }
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Library(e) => e.kind(),
            ApiError::BadRequest(_) => "validation",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Library(LibraryError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Library(LibraryError::NotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Library(LibraryError::Cycle { .. }) => StatusCode::CONFLICT,
            ApiError::Library(LibraryError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}

type ApiResult = Result<HttpResponse, ApiError>;

fn lock(state: &Mutex<Library>) -> Result<MutexGuard<'_, Library>, ApiError> {
    state.lock().map_err(|_| {
        ApiError::Library(LibraryError::Storage(StorageError::Unavailable(
            "library lock poisoned by an earlier failure".to_string(),
        )))
    })
}

async fn mutate<T, F>(state: SharedLibrary, operation: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Library) -> Result<T, LibraryError> + Send + 'static,
    T: Send + 'static,
{
    web::block(move || {
        let mut library = lock(&state)?;
        operation(&mut library).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Library(LibraryError::Storage(StorageError::Unavailable(e.to_string()))))?
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFolderBody {
    name: String,
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RenameFolderBody {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveFolderBody {
    #[serde(default)]
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderFolderBody {
    new_order: usize,
}

#[derive(Debug, Deserialize)]
struct ShiftFolderBody {
    direction: Direction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderSiblingsBody {
    #[serde(default)]
    parent_id: Option<String>,
    folder_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderPromptsQuery {
    #[serde(default)]
    include_descendants: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePromptBody {
    name: String,
    text: String,
    #[serde(default)]
    folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditPromptBody {
    name: String,
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RestoreBody {
    version_number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovePromptBody {
    #[serde(default)]
    folder_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Deserialize)]
struct MostUsedQuery {
    limit: Option<usize>,
}

async fn get_data(state: SharedLibrary) -> ApiResult {
    let library = lock(&state)?;
    Ok(HttpResponse::Ok().json(library.snapshot()))
}

// === Folders ===

async fn create_folder(state: SharedLibrary, body: web::Json<CreateFolderBody>) -> ApiResult {
    let body = body.into_inner();
    let folder = mutate(state, move |library| {
        library.create_folder(&body.name, body.parent_id.as_deref())
    })
    .await?;
    Ok(HttpResponse::Created().json(folder))
}

async fn rename_folder(
    state: SharedLibrary,
    path: web::Path<String>,
    body: web::Json<RenameFolderBody>,
) -> ApiResult {
    let (id, body) = (path.into_inner(), body.into_inner());
    let folder = mutate(state, move |library| library.rename_folder(&id, &body.name)).await?;
    Ok(HttpResponse::Ok().json(folder))
}

async fn delete_folder(state: SharedLibrary, path: web::Path<String>) -> ApiResult {
    let id = path.into_inner();
    mutate(state, move |library| library.delete_folder(&id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn move_folder(
    state: SharedLibrary,
    path: web::Path<String>,
    body: web::Json<MoveFolderBody>,
) -> ApiResult {
    let (id, body) = (path.into_inner(), body.into_inner());
    let folder = mutate(state, move |library| {
        library.move_folder(&id, body.parent_id.as_deref())
    })
    .await?;
    Ok(HttpResponse::Ok().json(folder))
}

async fn reorder_folder(
    state: SharedLibrary,
    path: web::Path<String>,
    body: web::Json<ReorderFolderBody>,
) -> ApiResult {
    let (id, new_order) = (path.into_inner(), body.new_order);
    mutate(state, move |library| library.reorder_folder(&id, new_order)).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn shift_folder(
    state: SharedLibrary,
    path: web::Path<String>,
    body: web::Json<ShiftFolderBody>,
) -> ApiResult {
    let (id, direction) = (path.into_inner(), body.direction);
    mutate(state, move |library| library.shift_folder(&id, direction)).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn toggle_folder(state: SharedLibrary, path: web::Path<String>) -> ApiResult {
    let id = path.into_inner();
    let folder = mutate(state, move |library| library.toggle_folder(&id)).await?;
    Ok(HttpResponse::Ok().json(folder))
}

async fn reorder_siblings(
    state: SharedLibrary,
    body: web::Json<ReorderSiblingsBody>,
) -> ApiResult {
    let body = body.into_inner();
    mutate(state, move |library| {
        library.reorder_siblings(body.parent_id.as_deref(), &body.folder_ids)
    })
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn folder_prompts(
    state: SharedLibrary,
    path: web::Path<String>,
    query: web::Query<FolderPromptsQuery>,
) -> ApiResult {
    let library = lock(&state)?;
    let prompts = library.list_by_folder(Some(path.as_str()), query.include_descendants)?;
    Ok(HttpResponse::Ok().json(prompts))
}

// === Prompts ===

async fn create_prompt(state: SharedLibrary, body: web::Json<CreatePromptBody>) -> ApiResult {
    let body = body.into_inner();
    let prompt = mutate(state, move |library| {
        library.create_prompt(&body.name, &body.text, body.folder_id.as_deref())
    })
    .await?;
    Ok(HttpResponse::Created().json(prompt))
}

async fn search_prompts(state: SharedLibrary, query: web::Query<SearchQuery>) -> ApiResult {
    let library = lock(&state)?;
    Ok(HttpResponse::Ok().json(library.search(&query.query)))
}

async fn most_used(state: SharedLibrary, query: web::Query<MostUsedQuery>) -> ApiResult {
    let library = lock(&state)?;
    Ok(HttpResponse::Ok().json(library.most_used(query.limit)))
}

async fn get_prompt(state: SharedLibrary, path: web::Path<String>) -> ApiResult {
    let library = lock(&state)?;
    let prompt = library
        .get_prompt(&path)
        .ok_or_else(|| LibraryError::prompt_not_found(path.as_str()))?;
    Ok(HttpResponse::Ok().json(prompt))
}

async fn edit_prompt(
    state: SharedLibrary,
    path: web::Path<String>,
    body: web::Json<EditPromptBody>,
) -> ApiResult {
    let (id, body) = (path.into_inner(), body.into_inner());
    let prompt = mutate(state, move |library| {
        library.edit_prompt(&id, &body.name, &body.text)
    })
    .await?;
    Ok(HttpResponse::Ok().json(prompt))
}

async fn delete_prompt(state: SharedLibrary, path: web::Path<String>) -> ApiResult {
    let id = path.into_inner();
    mutate(state, move |library| library.delete_prompt(&id)).await?;
    Ok(HttpResponse::NoContent().finish())
}

async fn restore_prompt(
    state: SharedLibrary,
    path: web::Path<String>,
    body: web::Json<RestoreBody>,
) -> ApiResult {
    let (id, version) = (path.into_inner(), body.version_number);
    let prompt = mutate(state, move |library| library.restore_prompt(&id, version)).await?;
    Ok(HttpResponse::Ok().json(prompt))
}

async fn move_prompt(
    state: SharedLibrary,
    path: web::Path<String>,
    body: web::Json<MovePromptBody>,
) -> ApiResult {
    let (id, body) = (path.into_inner(), body.into_inner());
    let prompt = mutate(state, move |library| {
        library.move_prompt(&id, body.folder_id.as_deref())
    })
    .await?;
    Ok(HttpResponse::Ok().json(prompt))
}

async fn record_usage(state: SharedLibrary, path: web::Path<String>) -> ApiResult {
    let id = path.into_inner();
    let prompt = mutate(state, move |library| library.record_usage(&id)).await?;
    Ok(HttpResponse::Ok().json(prompt))
}

/// Register the API routes and extractor error handlers.
///
/// The library itself must be supplied by the caller as `SharedLibrary`
/// app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| ApiError::BadRequest(err.to_string()).into()),
    )
    .route("/api/data", web::get().to(get_data))
    // Static segments before `{id}` so they are not captured as ids
    .route("/api/folders/reorder", web::post().to(reorder_siblings))
    .route("/api/folders", web::post().to(create_folder))
    .route("/api/folders/{id}", web::put().to(rename_folder))
    .route("/api/folders/{id}", web::delete().to(delete_folder))
    .route("/api/folders/{id}/move", web::post().to(move_folder))
    .route("/api/folders/{id}/reorder", web::post().to(reorder_folder))
    .route("/api/folders/{id}/shift", web::post().to(shift_folder))
    .route("/api/folders/{id}/toggle", web::post().to(toggle_folder))
    .route("/api/folders/{id}/prompts", web::get().to(folder_prompts))
    .route("/api/prompts/search", web::get().to(search_prompts))
    .route("/api/prompts/most-used", web::get().to(most_used))
    .route("/api/prompts", web::post().to(create_prompt))
    .route("/api/prompts/{id}", web::get().to(get_prompt))
    .route("/api/prompts/{id}", web::put().to(edit_prompt))
    .route("/api/prompts/{id}", web::delete().to(delete_prompt))
    .route("/api/prompts/{id}/restore", web::post().to(restore_prompt))
    .route("/api/prompts/{id}/move", web::post().to(move_prompt))
    .route("/api/prompts/{id}/usage", web::post().to(record_usage));
}

/// Serve the API until shutdown
pub async fn run(library: Library, settings: &Settings) -> std::io::Result<()> {
    let state: SharedLibrary = web::Data::new(Mutex::new(library));
    let address = settings.bind_address();
    info!(address = %address, "Starting promptrepo API server");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&address)?
    .run()
    .await
}
