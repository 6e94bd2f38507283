use crate::router::{method_wild, Handler, Router};

use http::Method;
use std::path::PathBuf;

/// A registration façade that prefixes every route with a path prefix.
///
/// Groups own no routing state: every call goes straight to the underlying
/// [`Router`] with the concatenated path.
///
/// ```rust,no_run
/// # use hyper::{Body, Request, Response};
/// # async fn users(_: Request<Body>) -> Result<Response<Body>, hyper::Error> {
/// #   Ok(Response::new(Body::empty()))
/// # }
/// let mut router = radixmux::Router::new();
/// let mut v1 = router.group("/v1");
/// v1.get("/users/{name}", users); // registers GET /v1/users/{name}
/// ```
pub struct Group<'r> {
  router: &'r mut Router,
  prefix: String,
}

fn validate_prefix(prefix: &str) {
  if prefix.is_empty() || !prefix.starts_with('/') {
    panic!("group path must begin with '/' in path '{}'", prefix);
  }
  if prefix != "/" && prefix.ends_with('/') {
    panic!("group path must not end with a trailing slash in path '{}'", prefix);
  }
}

impl<'r> Group<'r> {
  pub(crate) fn new(router: &'r mut Router, prefix: &str) -> Group<'r> {
    validate_prefix(prefix);
    Group {
      router,
      prefix: prefix.to_string(),
    }
  }

  /// Returns a nested group below this one. A prefix of exactly `/`
  /// returns the same scope.
  pub fn group(&mut self, prefix: &str) -> Group<'_> {
    if prefix == "/" {
      return Group {
        router: &mut *self.router,
        prefix: self.prefix.clone(),
      };
    }

    validate_prefix(prefix);
    Group {
      router: &mut *self.router,
      prefix: format!("{}{}", self.prefix, prefix),
    }
  }

  fn join(&self, path: &str) -> String {
    if path.is_empty() || !path.starts_with('/') {
      panic!("path must begin with '/' in path '{}'", path);
    }
    if self.prefix == "/" {
      path.to_string()
    } else {
      format!("{}{}", self.prefix, path)
    }
  }

  /// Registers a handler for the given method below the group prefix.
  pub fn handle<H>(&mut self, method: Method, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    let full = self.join(path);
    self.router.handle(method, &full, handler);
  }

  /// Registers a handler for GET requests below the group prefix.
  pub fn get<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::GET, path, handler);
  }

  /// Registers a handler for HEAD requests below the group prefix.
  pub fn head<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::HEAD, path, handler);
  }

  /// Registers a handler for POST requests below the group prefix.
  pub fn post<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::POST, path, handler);
  }

  /// Registers a handler for PUT requests below the group prefix.
  pub fn put<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::PUT, path, handler);
  }

  /// Registers a handler for PATCH requests below the group prefix.
  pub fn patch<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::PATCH, path, handler);
  }

  /// Registers a handler for DELETE requests below the group prefix.
  pub fn delete<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::DELETE, path, handler);
  }

  /// Registers a handler for CONNECT requests below the group prefix.
  pub fn connect<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::CONNECT, path, handler);
  }

  /// Registers a handler for OPTIONS requests below the group prefix.
  pub fn options<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::OPTIONS, path, handler);
  }

  /// Registers a handler for TRACE requests below the group prefix.
  pub fn trace<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::TRACE, path, handler);
  }

  /// Registers a handler for requests of any method below the group
  /// prefix.
  pub fn any<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(method_wild(), path, handler);
  }

  /// Serves files below the group prefix; see [`Router::serve_files`].
  pub fn serve_files(&mut self, path: &str, root: impl Into<PathBuf>) {
    let full = self.join(path);
    self.router.serve_files(&full, root);
  }
}
