#![deny(rust_2018_idioms)]

//! `radixmux` is a lightweight high performance HTTP request router.
//!
//! The router matches incoming requests by method and path. If a handler is
//! registered for this path and method, the router delegates the request to
//! it. A compressing dynamic trie (radix tree) structure is used for
//! efficient matching, with one tree per request method.
//!
//! ```rust,no_run
//! use radixmux::{Router, user_value};
//! use hyper::{Body, Request, Response};
//!
//! async fn index(_: Request<Body>) -> Result<Response<Body>, hyper::Error> {
//!   Ok(Response::new("Hello, World!".into()))
//! }
//!
//! async fn hello(req: Request<Body>) -> Result<Response<Body>, hyper::Error> {
//!   let name = user_value(&req, "name").unwrap_or("stranger");
//!   Ok(Response::new(format!("Hello, {}", name).into()))
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!   let mut router = Router::new();
//!   router.get("/", index);
//!   router.get("/hello/{name}", hello);
//!
//!   hyper::Server::bind(&([127, 0, 0, 1], 3000).into())
//!     .serve(router.into_service())
//!     .await
//!     .unwrap();
//! }
//! ```
//!
//! The registered path can contain dynamic segments:
//!
//! ```text
//! Syntax              Type
//! {name}              named parameter
//! {name:[a-z]+}       named parameter validated by a regular expression
//! {name?}             optional parameter (expands into two registrations)
//! {name:*}            catch-all parameter, must end the path
//! ```
//!
//! Named parameters match anything until the next `/` or the path end:
//!
//! ```text
//! Path: /blog/{category}/{post}
//!
//!  /blog/rust/request-routers            match: category="rust", post="request-routers"
//!  /blog/rust/request-routers/           no match, but the router would redirect
//!  /blog/rust/                           no match
//! ```
//!
//! Catch-all parameters match everything from their position to the path
//! end, so they must always be the final element:
//!
//! ```text
//! Path: /static/{filepath:*}
//!
//!  /static/                              match: filepath=""
//!  /static/js/main.js                    match: filepath="js/main.js"
//! ```
//!
//! Because the tree only supports explicit matches, a request resolves to
//! exactly one route or none: registering `/users/admin` next to
//! `/users/{name}` is fine and the static route always wins for
//! `/users/admin`, but a second wildcard at the same position is a
//! registration conflict.
//!
//! Captured values are attached to the request and read back with
//! [`user_value`] or [`user_values`]. Besides path parameters the router
//! gives you trailing-slash and case-correcting redirects, automatic
//! `OPTIONS` and `405` responses with an `Allow` header, per-method route
//! listings, route groups, and static file serving.

mod error;
mod files;
mod group;
mod params;
mod path;
mod pattern;
mod router;
mod tree;

pub use error::InsertError;
pub use group::Group;
pub use params::{Param, Params};
pub use path::clean_path;
pub use router::{
  matched_route_path_param, method_wild, user_value, user_values, Handler, MakeRouterService,
  PanicHandler, RouteHandler, Router, RouterService,
};
pub use tree::Tree;
