//! Request handlers for the file manager routes.
//!
//! Every handler clears client-supplied paths through the shared
//! [`PathGuard`] before touching the filesystem. Form-driven routes (upload,
//! create folder) answer with a redirect back to the directory page carrying
//! a message; the others answer with a status code and plain text.

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Form, Multipart, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use log::{debug, error, info, warn};
use std::io;
use tokio_util::io::ReaderStream;

use crate::error::handlers::handle_error;
use crate::error::{FileManagerError, GuardError, MutateError};
use crate::protocol::commands::{
    BrowseQuery, CreateFolderForm, EntryQuery, UPLOAD_FILE_FIELD, UPLOAD_PATH_FIELD, non_empty,
    upload_base_name,
};
use crate::protocol::render::{ListingPage, render_listing};
use crate::protocol::responses::{
    download_headers, error_response, failure_response, page_url, redirect_error,
    redirect_success,
};
use crate::server::SharedState;
use crate::storage::filesystem::{directory_exists, entry_exists};
use crate::storage::{PathGuard, ValidatedPath, list_directory};
use crate::transfer::{archive_body, spawn_upload};

/// Runs filesystem work on the blocking pool and flattens its error.
async fn run_blocking<T, E, F>(work: F) -> Result<T, FileManagerError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<FileManagerError> + Send + 'static,
{
    tokio::task::spawn_blocking(work).await?.map_err(Into::into)
}

/// Nothing there, including a path that runs through a file
fn is_missing(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

/// Validates the `path` half of an entry request and hands back the name
fn entry_parent<'q>(
    guard: &PathGuard,
    query: &'q EntryQuery,
) -> Result<(ValidatedPath, &'q str), Response> {
    let (dir, name) = query.parts().ok_or_else(|| {
        error_response(StatusCode::BAD_REQUEST, "Missing file or path parameter")
    })?;

    let dir = guard
        .validate_existing(dir)
        .map_err(|e| failure_response(e.into()))?;
    Ok((dir, name))
}

/// GET `/`: the directory page
pub async fn browse(State(state): State<SharedState>, Query(query): Query<BrowseQuery>) -> Response {
    let guard = state.guard();

    let current = match non_empty(&query.path) {
        None => guard.root_path(),
        Some(candidate) => match guard.validate(candidate) {
            Ok(path) => path,
            Err(e) => {
                warn!("Redirecting to root: {}", e);
                return Redirect::to(&page_url(&guard.root_path().to_string_lossy()))
                    .into_response();
            }
        },
    };

    if !directory_exists(current.as_path()) {
        return match entry_exists(current.as_path()) {
            Ok(true) => error_response(
                StatusCode::BAD_REQUEST,
                &format!("Not a directory: {}", current),
            ),
            Ok(false) => failure_response(GuardError::NotFound(current.to_string_lossy()).into()),
            Err(e) => failure_response(e.into()),
        };
    }

    let dir = current.clone();
    let entries = match run_blocking(move || list_directory(&dir)).await {
        Ok(entries) => entries,
        Err(e) => return failure_response(e),
    };

    let page = render_listing(ListingPage {
        root: guard.root(),
        current: &current,
        entries,
        error: non_empty(&query.error),
        success: non_empty(&query.success),
    });
    Html(page.into_string()).into_response()
}

/// GET `/download`: a file as-is, a folder as a streamed ZIP
pub async fn download(
    State(state): State<SharedState>,
    Query(query): Query<EntryQuery>,
) -> Response {
    let guard = state.guard();
    let target = match entry_parent(guard, &query) {
        Ok((dir, name)) => match guard.validate_child(&dir, name) {
            Ok(target) => target,
            Err(e) => return failure_response(e.into()),
        },
        Err(response) => return response,
    };

    let metadata = match tokio::fs::metadata(target.as_path()).await {
        Ok(metadata) => metadata,
        Err(e) if is_missing(&e) => {
            return failure_response(GuardError::NotFound(target.to_string_lossy()).into());
        }
        Err(e) => return failure_response(e.into()),
    };

    let name = target.file_name().unwrap_or_else(|| "download".to_string());

    if metadata.is_dir() {
        info!("Streaming folder {} as ZIP", target);
        let headers = download_headers(&format!("{name}.zip"), "application/zip");
        return (headers, archive_body(target)).into_response();
    }

    let file = match tokio::fs::File::open(target.as_path()).await {
        Ok(file) => file,
        Err(e) if is_missing(&e) => {
            return failure_response(GuardError::NotFound(target.to_string_lossy()).into());
        }
        Err(e) => return failure_response(e.into()),
    };

    info!("Sending file {} ({} bytes)", target, metadata.len());
    (
        download_headers(&name, "application/octet-stream"),
        [(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()))],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

/// POST `/upload`: multipart form with a `path` field followed by a `file` field
pub async fn upload(State(state): State<SharedState>, mut multipart: Multipart) -> Response {
    let mut dir_param: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to parse multipart form: {}", e);
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("Failed to parse form: {e}"),
                );
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(UPLOAD_PATH_FIELD) => match field.text().await {
                Ok(text) => dir_param = Some(text),
                Err(e) => {
                    warn!("Failed to read path field: {}", e);
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        &format!("Failed to parse form: {e}"),
                    );
                }
            },
            Some(UPLOAD_FILE_FIELD) => {
                return receive_file(&state, dir_param.as_deref(), field).await;
            }
            other => debug!("Ignoring form field {:?}", other),
        }
    }

    let dir = dir_param
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| state.guard().root_path().to_string_lossy());
    redirect_error(&dir, "Upload error: no file was submitted")
}

async fn receive_file(
    state: &SharedState,
    dir_param: Option<&str>,
    mut field: Field<'_>,
) -> Response {
    let guard = state.guard();
    let root = guard.root_path().to_string_lossy();

    let dir = match dir_param.filter(|d| !d.trim().is_empty()) {
        Some(candidate) => match guard.validate(candidate) {
            Ok(dir) => dir,
            Err(e) => {
                warn!("Upload rejected: {}", e);
                return redirect_error(&root, "Invalid path or access denied");
            }
        },
        None => {
            info!("Form path is empty, falling back to root {}", root);
            guard.root_path()
        }
    };
    let dir_text = dir.to_string_lossy();

    let mutator = state.mutator.clone();
    let target_dir = dir.clone();
    if let Err(e) = run_blocking(move || mutator.ensure_directory_exists(&target_dir)).await {
        handle_error(&e);
        return redirect_error(
            &dir_text,
            &format!("Cannot access or create directory {}: {}", dir, e),
        );
    }

    let Some(original_name) = field.file_name().map(str::to_string) else {
        return redirect_error(&dir_text, "Upload error: missing file name");
    };
    let Some(base_name) = upload_base_name(&original_name) else {
        return redirect_error(&dir_text, "Invalid file path");
    };
    let dest = match guard.validate_child(&dir, base_name) {
        Ok(dest) => dest,
        Err(e) => {
            warn!("Upload destination rejected: {}", e);
            return redirect_error(&dir_text, "Invalid file path");
        }
    };

    let (sender, writer) = spawn_upload(state.mutator.clone(), dest);
    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                // The writer only hangs up after a failure, reported below
                if sender.send(Ok(chunk)).await.is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                let _ = sender.send(Err(io::Error::other(e.to_string()))).await;
                break;
            }
        }
    }
    drop(sender);

    match writer.await.map_err(FileManagerError::from) {
        Ok(Ok(bytes)) => {
            let message = format!(
                "File '{}' uploaded successfully to {}",
                original_name, dir_text
            );
            info!("Upload successful: {} ({} bytes)", message, bytes);
            redirect_success(&dir_text, &message)
        }
        Ok(Err(e)) => {
            let message = match &e {
                MutateError::Write(_, cause) => format!("Upload error: {cause}"),
                other => other.to_string(),
            };
            handle_error(&FileManagerError::from(e));
            redirect_error(&dir_text, &message)
        }
        Err(e) => {
            handle_error(&e);
            redirect_error(&dir_text, &e.to_string())
        }
    }
}

/// DELETE `/delete`. A symlink is removed as the link, never its target.
pub async fn delete(State(state): State<SharedState>, Query(query): Query<EntryQuery>) -> Response {
    let guard = state.guard();
    let target = match entry_parent(guard, &query) {
        Ok((dir, name)) => match guard.validate_child_entry(&dir, name) {
            Ok(target) => target,
            Err(e) => return failure_response(e.into()),
        },
        Err(response) => return response,
    };

    let mutator = state.mutator.clone();
    match run_blocking(move || mutator.delete_entry(&target)).await {
        Ok(()) => (StatusCode::OK, "Deleted successfully").into_response(),
        Err(e) => failure_response(e),
    }
}

/// POST `/create-folder`
pub async fn create_folder(
    State(state): State<SharedState>,
    Form(form): Form<CreateFolderForm>,
) -> Response {
    let guard = state.guard();

    let Some(candidate) = non_empty(&form.path) else {
        return redirect_error("", "Missing path");
    };
    let dir = match guard.validate(candidate) {
        Ok(dir) => dir,
        Err(e) => {
            warn!("Create folder rejected: {}", e);
            return redirect_error(
                &guard.root_path().to_string_lossy(),
                "Invalid path or access denied",
            );
        }
    };
    let dir_text = dir.to_string_lossy();

    let requested = non_empty(&form.folder_name).map(str::to_string);
    let mutator = state.mutator.clone();
    let parent = dir.clone();
    match run_blocking(move || mutator.create_folder(&parent, requested.as_deref())).await {
        Ok(name) => redirect_success(&dir_text, &format!("Folder '{}' created successfully", name)),
        Err(FileManagerError::Guard(e)) => {
            warn!("Folder path rejected: {}", e);
            redirect_error(&dir_text, "Invalid folder path")
        }
        Err(e) => {
            error!("Create folder in {} failed: {}", dir, e);
            let message = match &e {
                FileManagerError::Mutate(MutateError::Create(_, cause)) => {
                    format!("Failed to create folder: {cause}")
                }
                other => format!("Failed to create folder: {other}"),
            };
            redirect_error(&dir_text, &message)
        }
    }
}
