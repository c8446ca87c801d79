use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Path, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{Html, IntoResponse, Response};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::ReaderStream;
use tracing::{error, info, warn};

use super::AppState;
use super::session::{Session, SessionStore};
use super::templates::{error_page, format_size, index_page, result_page};
use super::upload::{UploadedFile, process_batch, validate_batch};
use crate::error::Error;
use crate::logging::ACCESS_TARGET;

/// Errors rendered as a user-facing HTML page
#[derive(Debug)]
pub enum WebError {
    App(Error),
    Multipart(MultipartError),
    NotFound,
    NothingProcessed(Vec<(String, String)>),
    RequestTooLarge { limit: usize },
}

impl From<Error> for WebError {
    fn from(e: Error) -> Self {
        WebError::App(e)
    }
}

impl From<std::io::Error> for WebError {
    fn from(e: std::io::Error) -> Self {
        WebError::App(Error::Io(e))
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, failures) = match self {
            WebError::App(e) => {
                let status = match &e {
                    Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    Error::FileTooLarge { .. } | Error::TooManyFiles { .. } => {
                        StatusCode::PAYLOAD_TOO_LARGE
                    }
                    Error::MissingArgument { .. } | Error::InvalidArgument { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if !e.is_client_error() {
                    error!(error = %e, "Request failed");
                }
                let message = match e {
                    Error::MissingArgument { .. } => "No files selected".to_string(),
                    other => other.to_string(),
                };
                (status, message, Vec::new())
            }
            WebError::Multipart(e) => (e.status(), e.body_text(), Vec::new()),
            WebError::NotFound => (StatusCode::NOT_FOUND, "File not found".to_string(), Vec::new()),
            WebError::RequestTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!(
                    "Upload too large: a request may carry at most {} in total",
                    format_size(limit as u64)
                ),
                Vec::new(),
            ),
            WebError::NothingProcessed(failures) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "No files were successfully processed".to_string(),
                failures,
            ),
        };
        (status, Html(error_page(&message, &failures))).into_response()
    }
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let cfg = &state.config;
    Html(index_page(
        cfg.max_files,
        cfg.max_file_bytes,
        state.pipeline.params().canvas_size,
    ))
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "stickerpro",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// The body limit surfaces as a multipart read error; name the limit for the user.
fn read_error(e: MultipartError, limit: usize) -> WebError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(limit, "Upload rejected: request body over the limit");
        WebError::RequestTooLarge { limit }
    } else {
        WebError::Multipart(e)
    }
}

pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, WebError> {
    let limit = state.config.max_request_bytes;
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| read_error(e, limit))?
    {
        let Some(name) = field.file_name().map(str::to_owned) else {
            continue;
        };
        // Browsers send an empty part when no file was chosen
        if name.is_empty() {
            continue;
        }
        let bytes = field.bytes().await.map_err(|e| read_error(e, limit))?;
        files.push(UploadedFile {
            name,
            bytes: bytes.to_vec(),
        });
        if files.len() > state.config.max_files {
            break;
        }
    }

    if let Err(e) = validate_batch(&files, &state.config) {
        warn!(error = %e, "Upload rejected");
        return Err(e.into());
    }

    let session = state.sessions.create()?;
    info!("Session {}: processing {} file(s)", session.id, files.len());

    let pipeline = state.pipeline.clone();
    let job_session = session.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        process_batch(&pipeline, &job_session, files)
    })
    .await
    .map_err(|e| Error::Processing(format!("worker failed: {e}")))?;

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            let _ = state.sessions.purge(&session);
            return Err(e.into());
        }
    };

    match &outcome.archive {
        Some(archive) => Ok(Html(result_page(
            &session.id.to_string(),
            archive,
            outcome.outputs.len(),
            &outcome.failures,
        ))
        .into_response()),
        None => {
            if let Err(e) = state.sessions.purge(&session) {
                warn!(error = %e, "Could not purge empty session {}", session.id);
            }
            Err(WebError::NothingProcessed(outcome.failures))
        }
    }
}

/// An archive being sent; the session is purged once the response body is dropped.
struct ClaimedArchive {
    file: tokio::fs::File,
    sessions: Arc<SessionStore>,
    session: Session,
}

impl AsyncRead for ClaimedArchive {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.file).poll_read(cx, buf)
    }
}

impl Drop for ClaimedArchive {
    fn drop(&mut self) {
        let sessions = self.sessions.clone();
        let session = self.session.clone();
        let purge = move || {
            if let Err(e) = sessions.purge(&session) {
                warn!(error = %e, "Could not purge session {}", session.id);
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(purge);
            }
            Err(_) => purge(),
        }
    }
}

/// Stream the session archive once, then purge the session.
pub async fn download(
    State(state): State<AppState>,
    Path((session_id, filename)): Path<(String, String)>,
) -> Result<Response, WebError> {
    let session = state.sessions.open(&session_id).ok_or(WebError::NotFound)?;
    if filename != session.archive_name() {
        return Err(WebError::NotFound);
    }

    // Claim the archive by renaming it; a concurrent second download finds nothing.
    let claimed = session.output_dir.join(format!("{filename}.sending"));
    match tokio::fs::rename(session.archive_path(), &claimed).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(WebError::NotFound),
        Err(e) => return Err(e.into()),
    }
    let file = tokio::fs::File::open(&claimed).await?;
    let len = file.metadata().await?.len();

    info!("Session {}: sending archive ({} bytes)", session.id, len);
    let body = Body::from_stream(ReaderStream::new(ClaimedArchive {
        file,
        sessions: state.sessions.clone(),
        session,
    }));
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_LENGTH, len.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(req).await;

    info!(
        target: ACCESS_TARGET,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );
    response
}
