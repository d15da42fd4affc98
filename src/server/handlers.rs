use super::archive::{is_jpeg, zip_directory};
use super::{AppState, ServeError};
use crate::domain::model::SessionLayout;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::io::ErrorKind;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub csv: Option<String>,
    pub photos: usize,
    pub bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct SessionDetail {
    pub id: String,
    pub files: Vec<FileInfo>,
}

/// Rejects anything that could step outside the data root.
pub fn check_segment(kind: &str, value: &str) -> Result<(), ServeError> {
    let unsafe_segment = value.is_empty()
        || value.starts_with('.')
        || value.contains('/')
        || value.contains('\\')
        || value.contains("..");
    if unsafe_segment {
        return Err(ServeError::InvalidInput(format!("bad {} '{}'", kind, value)));
    }
    Ok(())
}

async fn list_files(dir: &std::path::Path) -> Result<Vec<FileInfo>, ServeError> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            files.push(FileInfo {
                name: entry.file_name().to_string_lossy().into_owned(),
                bytes: metadata.len(),
            });
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

async fn session_dir(state: &AppState, id: &str) -> Result<PathBuf, ServeError> {
    check_segment("session id", id)?;
    if !SessionLayout::is_session_id(id) {
        return Err(ServeError::NotFound(format!("session {}", id)));
    }
    let dir = state.root.join(id);
    match tokio::fs::metadata(&dir).await {
        Ok(m) if m.is_dir() => Ok(dir),
        Ok(_) => Err(ServeError::NotFound(format!("session {}", id))),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ServeError::NotFound(format!("session {}", id)))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "gps-logger",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionInfo>>, ServeError> {
    let mut entries = match tokio::fs::read_dir(state.root.as_path()).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Json(Vec::new())),
        Err(e) => return Err(e.into()),
    };

    let mut sessions = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let id = entry.file_name().to_string_lossy().into_owned();
        if !entry.file_type().await?.is_dir() || !SessionLayout::is_session_id(&id) {
            continue;
        }

        let files = list_files(&entry.path()).await?;
        let csv_name = SessionLayout::new(id.as_str()).csv_name();
        sessions.push(SessionInfo {
            csv: files.iter().any(|f| f.name == csv_name).then_some(csv_name),
            photos: files.iter().filter(|f| is_jpeg(&f.name)).count(),
            bytes: files.iter().map(|f| f.bytes).sum(),
            id,
        });
    }

    // ids are zero-padded timestamps, so name order is time order
    sessions.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(Json(sessions))
}

pub async fn session_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, ServeError> {
    let dir = session_dir(&state, &id).await?;
    let files = list_files(&dir).await?;
    Ok(Json(SessionDetail { id, files }))
}

fn content_type(name: &str) -> &'static str {
    if name.to_ascii_lowercase().ends_with(".csv") {
        "text/csv; charset=utf-8"
    } else if is_jpeg(name) {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}

fn attachment(content_type: &str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

pub async fn download_file(
    State(state): State<AppState>,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, ServeError> {
    let dir = session_dir(&state, &id).await?;
    check_segment("file name", &name)?;

    let path = dir.join(&name);
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::IsADirectory => {
            return Err(ServeError::NotFound(format!("{}/{}", id, name)))
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("⬇️ Serving {}/{} ({} bytes)", id, name, data.len());
    Ok(attachment(content_type(&name), &name, data))
}

pub async fn download_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ServeError> {
    let dir = session_dir(&state, &id).await?;

    let data = tokio::task::spawn_blocking(move || zip_directory(&dir))
        .await
        .map_err(|e| ServeError::Storage(std::io::Error::other(e)))??;

    tracing::info!("📦 Serving archive of {} ({} bytes)", id, data.len());
    Ok(attachment("application/zip", &format!("{}.zip", id), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_segment() {
        assert!(check_segment("id", "190704.130509").is_ok());
        assert!(check_segment("name", "190704.130509-1.jpg").is_ok());
        assert!(check_segment("id", "").is_err());
        assert!(check_segment("id", "..").is_err());
        assert!(check_segment("id", ".hidden").is_err());
        assert!(check_segment("name", "a/b").is_err());
        assert!(check_segment("name", "a\\b").is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("gpsdata.x.csv"), "text/csv; charset=utf-8");
        assert_eq!(content_type("x-1.jpg"), "image/jpeg");
        assert_eq!(content_type("notes.txt"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_health_check() {
        let Json(value) = health_check().await;
        assert_eq!(value["status"], "ok");
        assert_eq!(value["service"], "gps-logger");
    }
}
