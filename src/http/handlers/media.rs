use crate::http::error::HandlerErr;
use crate::http::types::AppState;
use actix_web::{web, HttpResponse};
use std::path::{Component, Path, PathBuf};

fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Resolves a request path under the media root. Only plain name segments
/// are accepted.
fn resolve_media_path(root: &Path, rel: &str) -> Option<PathBuf> {
    let rel = Path::new(rel);
    if rel.as_os_str().is_empty() {
        return None;
    }
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(rel))
}

pub async fn serve(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    let rel = path.into_inner();
    let Some(file) = resolve_media_path(&state.media_root(), &rel) else {
        return HandlerErr::not_found("media file").response();
    };
    let read_path = file.clone();
    let read = web::block(move || -> std::io::Result<Option<Vec<u8>>> {
        match std::fs::metadata(&read_path) {
            Ok(meta) if meta.is_file() => std::fs::read(&read_path).map(Some),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await;
    match read {
        Ok(Ok(Some(bytes))) => HttpResponse::Ok()
            .content_type(content_type_for(&file))
            .body(bytes),
        Ok(Ok(None)) => HandlerErr::not_found("media file").response(),
        Ok(Err(e)) => HandlerErr::io(e).response(),
        Err(e) => HandlerErr::new("internal", e.to_string()).response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_parent_and_absolute_segments() {
        let root = Path::new("/ws/media");
        assert_eq!(
            resolve_media_path(root, "photos/a.png"),
            Some(PathBuf::from("/ws/media/photos/a.png"))
        );
        assert_eq!(resolve_media_path(root, "../recordbook.sqlite3"), None);
        assert_eq!(resolve_media_path(root, "photos/../../x"), None);
        assert_eq!(resolve_media_path(root, "/etc/passwd"), None);
        assert_eq!(resolve_media_path(root, ""), None);
    }

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.bin")), "application/octet-stream");
    }
}
