use std::fmt;

/// Represents errors that can occur when registering a new route.
///
/// These are programmer errors: [`Router`](crate::Router) escalates them to
/// panics during setup, they are never surfaced as HTTP responses.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum InsertError {
  /// The path is empty or does not begin with `/`.
  BadPrefix {
    /// The offending path.
    path: String,
  },
  /// The pattern is malformed: an unbalanced brace, an empty or duplicate
  /// parameter name, a misplaced catch-all, or a regular expression that
  /// does not compile.
  InvalidPattern {
    /// The offending path.
    path: String,
    /// What exactly is wrong with it.
    detail: String,
  },
  /// Attempted to insert a wildcard that is incompatible with a wildcard
  /// already registered at the same position.
  Conflict {
    /// The path that failed to insert.
    path: String,
    /// The existing wildcard it conflicts with.
    with: String,
  },
  /// The exact path already has a handler and the tree is not mutable.
  DuplicateHandler {
    /// The path that is already taken.
    path: String,
  },
}

impl fmt::Display for InsertError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::BadPrefix { path } => {
        write!(f, "path must begin with '/' in path '{}'", path)
      }
      Self::InvalidPattern { path, detail } => {
        write!(f, "invalid pattern '{}': {}", path, detail)
      }
      Self::Conflict { path, with } => {
        write!(
          f,
          "new path '{}' conflicts with existing wildcard '{}'",
          path, with
        )
      }
      Self::DuplicateHandler { path } => {
        write!(f, "a handler is already registered for path '{}'", path)
      }
    }
  }
}

impl std::error::Error for InsertError {}
