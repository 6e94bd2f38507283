use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Response, StatusCode};
use std::path::{Component, Path, PathBuf};

// Maps the captured url suffix onto the served root, refusing anything that
// would walk out of it.
fn map_path(root: &Path, url_path: &str) -> Option<PathBuf> {
  let mut mapped = root.to_path_buf();
  for component in Path::new(url_path.trim_start_matches('/')).components() {
    match component {
      Component::Normal(segment) => mapped.push(segment),
      Component::CurDir => {}
      _ => return None,
    }
  }
  Some(mapped)
}

fn content_type(path: &Path) -> &'static str {
  match path
    .extension()
    .and_then(|ext| ext.to_str())
    .unwrap_or("")
    .to_ascii_lowercase()
    .as_str()
  {
    "html" | "htm" => "text/html; charset=utf-8",
    "css" => "text/css",
    "js" => "application/javascript",
    "json" => "application/json",
    "txt" => "text/plain; charset=utf-8",
    "svg" => "image/svg+xml",
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "ico" => "image/x-icon",
    "wasm" => "application/wasm",
    _ => "application/octet-stream",
  }
}

fn not_found() -> Response<Body> {
  let mut response = Response::new(Body::empty());
  *response.status_mut() = StatusCode::NOT_FOUND;
  response
}

/// Serves the file at `url_path` below `root`, replying 404 when the path
/// is invalid, missing, or not a regular file.
pub(crate) async fn serve(root: &Path, url_path: &str) -> Response<Body> {
  let path = match map_path(root, url_path) {
    Some(path) => path,
    None => return not_found(),
  };

  match tokio::fs::read(&path).await {
    Ok(contents) => {
      let mut response = Response::new(Body::from(contents));
      response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type(&path)),
      );
      response
    }
    Err(err) => {
      tracing::trace!(path = %path.display(), %err, "static file miss");
      not_found()
    }
  }
}
