use crate::files;
use crate::group::Group;
use crate::params::{Param, Params};
use crate::path::clean_path;
use crate::pattern;
use crate::tree::Tree;

use futures::future::{BoxFuture, Future, FutureExt};
use http::header::{HeaderValue, ALLOW, LOCATION};
use http::{Method, StatusCode};
use hyper::service::Service;
use hyper::{Body, Request, Response};
use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::task::{Context, Poll};

static METHOD_WILD: Lazy<Method> =
  Lazy::new(|| Method::from_bytes(b"*").expect("'*' is a valid method token"));

static MATCHED_ROUTE_PATH_PARAM: Lazy<String> = Lazy::new(|| {
  // randomized per process so handlers cannot collide with it by accident
  let nonce = RandomState::new().build_hasher().finish();
  format!("__matchedRoutePath::{:016x}__", nonce)
});

/// Returns the wild method `*`. Routes registered under it answer requests
/// of any method.
pub fn method_wild() -> Method {
  METHOD_WILD.clone()
}

/// Returns the parameter name under which the raw path of the matched route
/// is stored when [`Router::save_matched_route_path`] is enabled.
pub fn matched_route_path_param() -> &'static str {
  &MATCHED_ROUTE_PATH_PARAM
}

type HandlerResult = Result<Response<Body>, hyper::Error>;

/// An asynchronous request handler.
///
/// Implemented for every `Fn(Request<Body>)` returning a future of a hyper
/// response, plain `async fn`s included.
pub trait Handler {
  fn handle(&self, req: Request<Body>) -> BoxFuture<'static, HandlerResult>;
}

impl<F, R> Handler for F
where
  F: Fn(Request<Body>) -> R,
  R: Future<Output = HandlerResult> + Send + 'static,
{
  fn handle(&self, req: Request<Body>) -> BoxFuture<'static, HandlerResult> {
    Box::pin(self(req))
  }
}

/// A shared, type-erased [`Handler`], the form the router stores. One
/// handler may back several registrations, optional parameters expand into
/// more than one route.
pub type RouteHandler = Arc<dyn Handler + Send + Sync>;

/// Receives the request method, path and panic payload of a handler that
/// panicked, and produces the response to send in its place.
pub type PanicHandler =
  Box<dyn Fn(&Method, &str, Box<dyn Any + Send>) -> Response<Body> + Send + Sync>;

/// Returns the captured value for `key` on this request, if any.
pub fn user_value<'r>(req: &'r Request<Body>, key: &str) -> Option<&'r str> {
  req.extensions().get::<Params>()?.by_name(key)
}

/// Returns all parameters captured for this request.
pub fn user_values(req: &Request<Body>) -> Option<&Params> {
  req.extensions().get::<Params>()
}

// Fixed tree slots; custom methods are appended lazily from index 10 on.
const WILD: usize = 9;

/// A high performance HTTP request router.
///
/// The router owns one radix tree per request method and dispatches each
/// request to the handler registered for its method and path, capturing
/// path parameters along the way. See the crate documentation for the
/// pattern syntax.
pub struct Router {
  trees: Vec<Option<Tree<RouteHandler>>>,
  custom_methods: HashMap<Method, usize>,
  registered: HashMap<Method, Vec<String>>,
  global_allowed: String,
  tree_mutable: bool,

  /// Enables automatic redirection if the current route can't be matched
  /// but a handler for the path with (without) the trailing slash exists.
  /// For example if `/foo/` is requested but a route only exists for
  /// `/foo`, the client is redirected to `/foo` with status code 301 for
  /// GET requests and 308 for all other methods.
  pub redirect_trailing_slash: bool,

  /// If enabled, the router tries to fix the request path if no handler is
  /// registered for it. First superfluous elements like `..` or `//` are
  /// removed, then a case-insensitive lookup of the cleaned path is made.
  /// If a handler can be found, the router redirects to the corrected path
  /// with status code 301 for GET requests and 308 for all other methods.
  /// For example `/FOO` and `/..//Foo` could be redirected to `/foo`.
  /// `redirect_trailing_slash` is independent of this option.
  pub redirect_fixed_path: bool,

  /// If enabled, the router checks whether another method is allowed for a
  /// route the current request cannot be matched against, and answers with
  /// 405 and an `Allow` header. Otherwise the request is delegated to the
  /// not-found handling.
  pub handle_method_not_allowed: bool,

  /// If enabled, the router automatically replies to OPTIONS requests.
  /// Custom OPTIONS handlers take priority over automatic replies.
  pub handle_options: bool,

  /// If enabled, the raw path of the matched route is stored on the
  /// request under [`matched_route_path_param`] before the handler runs.
  pub save_matched_route_path: bool,

  /// Called when no matching route is found; replies 404 by default.
  pub not_found: Option<RouteHandler>,

  /// Called when a request cannot be routed and
  /// `handle_method_not_allowed` is enabled. The `Allow` header is set on
  /// the response. Replies 405 by default.
  pub method_not_allowed: Option<RouteHandler>,

  /// Called on automatic OPTIONS requests when `handle_options` is
  /// enabled and no OPTIONS handler exists for the path. The `Allow`
  /// header is set on the response.
  pub global_options: Option<RouteHandler>,

  /// Catches panics from handlers and produces the response instead of
  /// letting the panic propagate to the server loop.
  pub panic_handler: Option<PanicHandler>,
}

impl Default for Router {
  fn default() -> Self {
    Router::new()
  }
}

impl Router {
  /// Returns a new router. Path auto-correction, trailing slashes
  /// included, is enabled by default.
  pub fn new() -> Router {
    Router {
      trees: (0..10).map(|_| None).collect(),
      custom_methods: HashMap::new(),
      registered: HashMap::new(),
      global_allowed: String::new(),
      tree_mutable: false,
      redirect_trailing_slash: true,
      redirect_fixed_path: true,
      handle_method_not_allowed: true,
      handle_options: true,
      save_matched_route_path: false,
      not_found: None,
      method_not_allowed: None,
      global_options: None,
      panic_handler: None,
    }
  }

  fn method_index(&self, method: &Method) -> Option<usize> {
    let index = match method.as_str() {
      "GET" => 0,
      "HEAD" => 1,
      "POST" => 2,
      "PUT" => 3,
      "PATCH" => 4,
      "DELETE" => 5,
      "CONNECT" => 6,
      "OPTIONS" => 7,
      "TRACE" => 8,
      "*" => WILD,
      _ => return self.custom_methods.get(method).copied(),
    };
    Some(index)
  }

  /// Allows updating the handler of an already registered route in place.
  ///
  /// Disabled by default. Intended for the setup phase only; flipping it
  /// while serving is unsupported.
  pub fn mutable(&mut self, mutable: bool) {
    self.tree_mutable = mutable;
    for tree in self.trees.iter_mut().flatten() {
      tree.mutable = mutable;
    }
  }

  /// Returns all registered raw patterns grouped by method, in
  /// registration order.
  pub fn list(&self) -> &HashMap<Method, Vec<String>> {
    &self.registered
  }

  /// Returns a new [`Group`] prefixing every registration with `prefix`.
  pub fn group(&mut self, prefix: &str) -> Group<'_> {
    Group::new(self, prefix)
  }

  /// Registers a handler for the given method and path.
  ///
  /// This is the generic entry also covering custom, non-standard methods;
  /// for the common methods the shortcuts like [`Router::get`] exist.
  ///
  /// # Panics
  ///
  /// Registration errors are programmer errors: an invalid path, a
  /// malformed pattern or a conflicting route panic during setup.
  pub fn handle<H>(&mut self, method: Method, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle_route(method, path, Arc::new(handler));
  }

  fn handle_route(&mut self, method: Method, path: &str, handler: RouteHandler) {
    if path.is_empty() || !path.starts_with('/') {
      panic!("path must begin with '/' in path '{}'", path);
    }

    tracing::debug!(%method, path, "registering route");

    self
      .registered
      .entry(method.clone())
      .or_default()
      .push(path.to_string());

    let index = match self.method_index(&method) {
      Some(index) => index,
      None => {
        let index = self.trees.len();
        self.trees.push(None);
        self.custom_methods.insert(method, index);
        index
      }
    };

    if self.trees[index].is_none() {
      let mut tree = Tree::new();
      tree.mutable = self.tree_mutable;
      self.trees[index] = Some(tree);
      // a previously-unseen method got its first route
      self.global_allowed = self.allowed("*", None);
    }

    let handler = if self.save_matched_route_path {
      save_matched_route_path(path.to_string(), handler)
    } else {
      handler
    };

    let expansions = match pattern::optional_paths(path) {
      Ok(expansions) => expansions,
      Err(err) => panic!("{}", err),
    };

    let tree = self.trees[index].as_mut().expect("tree allocated above");
    let inserted = if expansions.is_empty() {
      tree.add(path, handler)
    } else {
      expansions
        .iter()
        .try_for_each(|expansion| tree.add(expansion, Arc::clone(&handler)))
    };

    if let Err(err) = inserted {
      panic!("{}", err);
    }
  }

  /// Registers a handler for GET requests.
  pub fn get<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::GET, path, handler);
  }

  /// Registers a handler for HEAD requests.
  pub fn head<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::HEAD, path, handler);
  }

  /// Registers a handler for POST requests.
  pub fn post<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::POST, path, handler);
  }

  /// Registers a handler for PUT requests.
  pub fn put<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::PUT, path, handler);
  }

  /// Registers a handler for PATCH requests.
  pub fn patch<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::PATCH, path, handler);
  }

  /// Registers a handler for DELETE requests.
  pub fn delete<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::DELETE, path, handler);
  }

  /// Registers a handler for CONNECT requests.
  pub fn connect<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::CONNECT, path, handler);
  }

  /// Registers a handler for OPTIONS requests.
  pub fn options<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::OPTIONS, path, handler);
  }

  /// Registers a handler for TRACE requests.
  pub fn trace<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(Method::TRACE, path, handler);
  }

  /// Registers a handler under the wild method `*`, invoked for requests
  /// of any method. Use only for routes where the method does not matter.
  pub fn any<H>(&mut self, path: &str, handler: H)
  where
    H: Handler + Send + Sync + 'static,
  {
    self.handle(method_wild(), path, handler);
  }

  /// Serves files from the given file system root.
  ///
  /// The path must end with `/{filepath:*}`; files are then served from
  /// the local path `root/<filepath>`. For example with a root of `/etc`
  /// and a captured `filepath` of `passwd`, the local file `/etc/passwd`
  /// would be served.
  pub fn serve_files(&mut self, path: &str, root: impl Into<PathBuf>) {
    const SUFFIX: &str = "/{filepath:*}";
    if !path.ends_with(SUFFIX) {
      panic!("path must end with {} in path '{}'", SUFFIX, path);
    }

    let root: Arc<PathBuf> = Arc::new(root.into());
    self.get(path, move |req: Request<Body>| {
      let root = Arc::clone(&root);
      async move {
        let filepath = user_value(&req, "filepath").unwrap_or("").to_string();
        Ok(files::serve(root.as_path(), &filepath).await)
      }
    });
  }

  /// Manual lookup of a method + path combination, e.g. to build a
  /// framework around the router. Returns the handler and the captured
  /// parameters; when no handler is found, the boolean recommends a
  /// redirection to the same path with the trailing slash flipped.
  pub fn lookup(&self, method: &Method, path: &str) -> (Option<&RouteHandler>, Params, bool) {
    if let Some(tree) = self.method_index(method).and_then(|i| self.trees[i].as_ref()) {
      let (handler, params, tsr) = tree.get(path);
      if handler.is_some() || tsr {
        return (handler, params, tsr);
      }
    }

    if let Some(tree) = self.trees[WILD].as_ref() {
      return tree.get(path);
    }

    (None, Params::default(), false)
  }

  // Computes the Allow header value for a path by probing every registered
  // method's tree, skipping OPTIONS and the requesting method. For the
  // server-wide "*" a cached value is returned; the cache is refreshed
  // whenever a previously-unseen method gets its first route.
  fn allowed(&self, path: &str, req_method: Option<&Method>) -> String {
    let mut allowed: Vec<String> = Vec::new();

    if path == "*" || path == "/*" {
      match req_method {
        // no method is used internally to refresh the cache
        None => {
          for method in self.registered.keys() {
            if method != Method::OPTIONS {
              allowed.push(method.to_string());
            }
          }
        }
        Some(_) => return self.global_allowed.clone(),
      }
    } else {
      for method in self.registered.keys() {
        if Some(method) == req_method || method == Method::OPTIONS {
          continue;
        }

        let handler = self
          .method_index(method)
          .and_then(|i| self.trees[i].as_ref())
          .and_then(|tree| tree.get(path).0);
        if handler.is_some() {
          allowed.push(method.to_string());
        }
      }
    }

    if allowed.is_empty() {
      return String::new();
    }

    allowed.push(Method::OPTIONS.to_string());
    allowed.sort();
    allowed.join(", ")
  }

  fn try_redirect(
    &self,
    tree: &Tree<RouteHandler>,
    tsr: bool,
    method: &Method,
    path: &str,
    query: Option<&str>,
  ) -> Option<Response<Body>> {
    // Moved Permanently for GET; Permanent Redirect keeps the method and
    // body on replay
    let code = if method == Method::GET {
      StatusCode::MOVED_PERMANENTLY
    } else {
      StatusCode::PERMANENT_REDIRECT
    };

    if tsr && self.redirect_trailing_slash {
      let mut location = if path.len() > 1 && path.ends_with('/') {
        path[..path.len() - 1].to_string()
      } else {
        format!("{}/", path)
      };
      if let Some(query) = query {
        location.push('?');
        location.push_str(query);
      }

      tracing::debug!(%method, path, %location, "trailing slash redirect");
      return Some(redirect(code, &location));
    }

    // try to fix the request path
    if self.redirect_fixed_path {
      if let Some(mut location) =
        tree.find_case_insensitive(&clean_path(path), self.redirect_trailing_slash)
      {
        if let Some(query) = query {
          location.push('?');
          location.push_str(query);
        }

        tracing::debug!(%method, path, %location, "fixed path redirect");
        return Some(redirect(code, &location));
      }
    }

    None
  }

  async fn invoke(
    &self,
    handler: &RouteHandler,
    params: Params,
    mut req: Request<Body>,
    method: &Method,
    path: &str,
  ) -> HandlerResult {
    req.extensions_mut().insert(params);

    let panic_handler = match &self.panic_handler {
      Some(panic_handler) => panic_handler,
      None => return handler.handle(req).await,
    };

    // the guard covers both the handler call and the returned future
    let future = match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(req))) {
      Ok(future) => future,
      Err(payload) => {
        tracing::error!(%method, path, "handler panicked");
        return Ok(panic_handler(method, path, payload));
      }
    };
    match AssertUnwindSafe(future).catch_unwind().await {
      Ok(result) => result,
      Err(payload) => {
        tracing::error!(%method, path, "handler panicked");
        Ok(panic_handler(method, path, payload))
      }
    }
  }

  /// Dispatches the request to the handler registered for its method and
  /// path, or produces the appropriate redirect, OPTIONS, 405 or 404
  /// response.
  pub async fn serve(&self, req: Request<Body>) -> HandlerResult {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if let Some(tree) = self.method_index(&method).and_then(|i| self.trees[i].as_ref()) {
      let (handler, params, tsr) = tree.get(&path);
      if let Some(handler) = handler {
        return self.invoke(handler, params, req, &method, &path).await;
      }
      if method != Method::CONNECT && path != "/" {
        if let Some(response) = self.try_redirect(tree, tsr, &method, &path, req.uri().query()) {
          return Ok(response);
        }
      }
    }

    // the wild tree answers for every request method
    if let Some(tree) = self.trees[WILD].as_ref() {
      let (handler, params, tsr) = tree.get(&path);
      if let Some(handler) = handler {
        return self.invoke(handler, params, req, &method, &path).await;
      }
      if method != Method::CONNECT && path != "/" {
        if let Some(response) = self.try_redirect(tree, tsr, &method, &path, req.uri().query()) {
          return Ok(response);
        }
      }
    }

    if self.handle_options && method == Method::OPTIONS {
      let allow = self.allowed(&path, Some(&method));
      if !allow.is_empty() {
        let mut response = match &self.global_options {
          Some(handler) => {
            self
              .invoke(handler, Params::default(), req, &method, &path)
              .await?
          }
          None => Response::new(Body::empty()),
        };
        set_allow(&mut response, &allow);
        return Ok(response);
      }
    } else if self.handle_method_not_allowed {
      let allow = self.allowed(&path, Some(&method));
      if !allow.is_empty() {
        let mut response = match &self.method_not_allowed {
          Some(handler) => {
            self
              .invoke(handler, Params::default(), req, &method, &path)
              .await?
          }
          None => {
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::METHOD_NOT_ALLOWED;
            response
          }
        };
        set_allow(&mut response, &allow);
        return Ok(response);
      }
    }

    tracing::trace!(%method, %path, "no route matched");
    match &self.not_found {
      Some(handler) => {
        self
          .invoke(handler, Params::default(), req, &method, &path)
          .await
      }
      None => {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NOT_FOUND;
        Ok(response)
      }
    }
  }

  /// Converts the router into a hyper service.
  ///
  /// ```rust,no_run
  /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
  /// let router = radixmux::Router::new();
  ///
  /// hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
  ///   .serve(router.into_service())
  ///   .await?;
  /// # Ok(())
  /// # }
  /// ```
  pub fn into_service(self) -> MakeRouterService {
    MakeRouterService(RouterService(Arc::new(self)))
  }
}

fn save_matched_route_path(route: String, inner: RouteHandler) -> RouteHandler {
  Arc::new(move |mut req: Request<Body>| {
    let entry = Param::new(matched_route_path_param(), &route);
    match req.extensions_mut().get_mut::<Params>() {
      Some(params) => params.0.push(entry),
      None => {
        req.extensions_mut().insert(Params(vec![entry]));
      }
    }
    inner.handle(req)
  })
}

fn redirect(code: StatusCode, location: &str) -> Response<Body> {
  let mut response = Response::new(Body::empty());
  *response.status_mut() = code;
  if let Ok(value) = HeaderValue::from_str(location) {
    response.headers_mut().insert(LOCATION, value);
  }
  response
}

fn set_allow(response: &mut Response<Body>, allow: &str) {
  if let Ok(value) = HeaderValue::from_str(allow) {
    response.headers_mut().insert(ALLOW, value);
  }
}

/// A hyper service dispatching every request to a shared [`Router`].
#[derive(Clone)]
pub struct RouterService(pub Arc<Router>);

impl Service<Request<Body>> for RouterService {
  type Response = Response<Body>;
  type Error = hyper::Error;
  type Future = BoxFuture<'static, HandlerResult>;

  fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
    Poll::Ready(Ok(()))
  }

  fn call(&mut self, req: Request<Body>) -> Self::Future {
    let router = Arc::clone(&self.0);
    Box::pin(async move { router.serve(req).await })
  }
}

/// The make-service producing a [`RouterService`] per connection.
pub struct MakeRouterService(pub RouterService);

impl<T> Service<T> for MakeRouterService {
  type Response = RouterService;
  type Error = hyper::Error;
  type Future = BoxFuture<'static, Result<RouterService, hyper::Error>>;

  fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
    Poll::Ready(Ok(()))
  }

  fn call(&mut self, _: T) -> Self::Future {
    let service = self.0.clone();
    Box::pin(async move { Ok(service) })
  }
}
