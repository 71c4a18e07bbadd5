use axum::{
    Json, Router,
    body::Body,
    extract::{DefaultBodyLimit, FromRef, Multipart, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{Html, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::config::Config;
use crate::downloader::{self, XLSX_CONTENT_TYPE};
use crate::error::AppError;
use crate::filter;
use crate::loader;
use crate::session::{MemorySessionStore, SESSION_COOKIE, SessionData, SessionId, SessionStore};
use crate::storage::UploadDir;

/// Content types accepted by the upload endpoint
pub const ALLOWED_CONTENT_TYPES: [&str; 2] = [
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
];

/// Multipart field carrying the uploaded spreadsheet
pub const FILE_FIELD: &str = "file";

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);
const MIN_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    sessions: Arc<dyn SessionStore>,
    uploads: UploadDir,
    key: Key,
}

impl AppState {
    /// Build the state from a configuration, creating the upload directory
    pub async fn new(config: Config) -> std::io::Result<Self> {
        let uploads = UploadDir::open(&config.upload_dir).await?;
        let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new(config.session_ttl));
        let key = signing_key(config.secret_key.as_deref());

        Ok(AppState {
            config: Arc::new(config),
            sessions,
            uploads,
            key,
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

fn signing_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) if secret.len() >= MIN_SECRET_LEN => Key::derive_from(secret.as_bytes()),
        Some(_) => {
            log::warn!(
                "SECRET_KEY is shorter than {} bytes, using a random signing key",
                MIN_SECRET_LEN
            );
            Key::generate()
        }
        None => {
            log::warn!("SECRET_KEY is not set, sessions will not survive a restart");
            Key::generate()
        }
    }
}

#[derive(Serialize)]
struct UploadResponse {
    headers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FilterRequest {
    columns: Vec<String>,
    #[serde(rename = "fileName")]
    file_name: String,
}

impl FilterRequest {
    fn validate(self) -> Result<(Vec<String>, String), AppError> {
        if self.columns.is_empty() {
            return Err(AppError::NoColumnsRequested);
        }

        let file_name = self.file_name.trim();
        if file_name.is_empty() {
            return Err(AppError::InvalidFileName);
        }

        Ok((self.columns, file_name.to_string()))
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let static_dir = ServeDir::new(&state.config.static_dir);
    let upload_limit = state.config.upload_limit_bytes;

    Router::new()
        .route("/", get(serve_index))
        .route("/upload", post(upload_file))
        .route("/filter", post(filter_file))
        .nest_service("/static", static_dir)
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = config.bind_addr;

    // Setup app state
    let state = AppState::new(config).await?;
    spawn_session_purger(Arc::clone(&state.sessions));

    let app = router(state);

    // Start server
    let listener = TcpListener::bind(bind_addr).await?;
    log::info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_session_purger(sessions: Arc<dyn SessionStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired();
            if purged > 0 {
                log::debug!("Purged {} expired sessions", purged);
            }
        }
    });
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

fn is_spreadsheet_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

fn session_from(jar: &SignedCookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::parse(cookie.value()))
}

fn session_cookie(id: &SessionId) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn upload_file(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut multipart: Multipart,
) -> Result<(SignedCookieJar, Json<UploadResponse>), AppError> {
    let mut stored = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // A file input left empty still sends a part, with no filename
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        let content_type = field.content_type().map(str::to_string);
        if !content_type.as_deref().is_some_and(is_spreadsheet_type) {
            return Err(AppError::UnsupportedFileType(content_type));
        }

        let bytes = field.bytes().await?;
        let stored_name = state
            .uploads
            .store(&original_name, &bytes)
            .await
            .map_err(AppError::upload)?;
        log::info!("Stored upload {} ({} bytes)", stored_name, bytes.len());

        stored = Some(stored_name);
        break;
    }

    let stored_name = stored.ok_or(AppError::NoFileUploaded)?;
    state
        .uploads
        .schedule_cleanup(stored_name.clone(), state.config.cleanup_delay);

    let path = state.uploads.path_of(&stored_name);
    let parsed = tokio::task::spawn_blocking(move || loader::load_first_sheet(path))
        .await
        .map_err(AppError::upload)
        .and_then(|result| result.map_err(AppError::upload));

    let grid = match parsed {
        Ok(grid) => grid,
        Err(err) => {
            discard_upload(&state.uploads, &stored_name).await;
            return Err(err);
        }
    };
    let headers = grid.header_names();

    let session_id = session_from(&jar).unwrap_or_else(|| {
        let id = SessionId::generate();
        log::debug!("Created session {}", id);
        id
    });
    state.sessions.set(
        session_id.clone(),
        SessionData {
            uploaded_file: Some(stored_name),
        },
    );

    Ok((
        jar.add(session_cookie(&session_id)),
        Json(UploadResponse { headers }),
    ))
}

async fn filter_file(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    payload: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidBody(rejection.body_text()))?;
    let (columns, file_name) = request.validate()?;

    let stored_name = session_from(&jar)
        .and_then(|id| state.sessions.get(&id))
        .and_then(|data| data.uploaded_file)
        .ok_or(AppError::NoFileUploaded)?;

    if !state.uploads.exists(&stored_name).await {
        return Err(AppError::UploadedFileNotFound);
    }

    let path = state.uploads.path_of(&stored_name);
    let selected = columns.len();
    let buffer = tokio::task::spawn_blocking(move || export_columns(&path, &columns))
        .await
        .map_err(AppError::filter)??;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, XLSX_CONTENT_TYPE)
        .header(
            header::CONTENT_DISPOSITION,
            downloader::content_disposition(&file_name),
        )
        .body(Body::from(buffer))
        .map_err(AppError::filter)?;

    log::info!(
        "Exported {} requested columns from {} as {}.xlsx",
        selected,
        stored_name,
        file_name
    );
    discard_upload(&state.uploads, &stored_name).await;

    Ok(response)
}

fn export_columns(path: &Path, columns: &[String]) -> Result<Vec<u8>, AppError> {
    let grid = loader::load_first_sheet(path).map_err(AppError::filter)?;
    let filtered = filter::select_columns(&grid, columns)?;
    downloader::to_xlsx(&filtered).map_err(AppError::filter)
}

async fn discard_upload(uploads: &UploadDir, stored_name: &str) {
    if let Err(e) = uploads.delete_if_exists(stored_name).await {
        log::warn!("Error deleting uploaded file {}: {}", stored_name, e);
    }
}
