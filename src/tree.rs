use crate::error::InsertError;
use crate::params::{Param, Params};
use crate::pattern::{self, WildKind};

use regex::Regex;
use std::mem;
use std::str;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
  Root,
  Static,
  Param,
}

/// A catch-all terminal, stored on the node owning the preceding prefix.
/// It binds the entire remaining path, `""` included.
#[derive(Debug)]
struct CatchAll<T> {
  key: String,
  handler: T,
}

// A node in the radix tree. Static children are ordered by priority, the
// number of handlers reachable through them; wildcard children follow in
// registration order.
#[derive(Debug)]
struct Node<T> {
  kind: NodeKind,
  prefix: Vec<u8>,
  handler: Option<T>,
  indices: Vec<u8>,
  children: Vec<Box<Node<T>>>,
  wild_children: Vec<Box<Node<T>>>,
  catch_all: Option<CatchAll<T>>,
  param_keys: Vec<String>,
  param_regex: Option<Regex>,
  priority: u32,
}

impl<T> Default for Node<T> {
  fn default() -> Self {
    Node {
      kind: NodeKind::Static,
      prefix: Vec::new(),
      handler: None,
      indices: Vec::new(),
      children: Vec::new(),
      wild_children: Vec::new(),
      catch_all: None,
      param_keys: Vec::new(),
      param_regex: None,
      priority: 0,
    }
  }
}

/// The deepest catch-all passed during a descent, remembered so a failed
/// match below it can still resolve to the catch-all.
struct Fallback<'t, 'p, T> {
  catch_all: &'t CatchAll<T>,
  remainder: &'p [u8],
  captured: usize,
}

fn longest_common_prefix(a: &[u8], b: &[u8]) -> usize {
  a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

impl<T> Node<T> {
  // Splits the node at `i`: the node keeps prefix[..i] and a single child
  // carries the remainder together with everything the node owned.
  fn split(&mut self, i: usize) {
    let child = Box::new(Node {
      kind: NodeKind::Static,
      prefix: self.prefix[i..].to_vec(),
      handler: self.handler.take(),
      indices: mem::take(&mut self.indices),
      children: mem::take(&mut self.children),
      wild_children: mem::take(&mut self.wild_children),
      catch_all: self.catch_all.take(),
      param_keys: Vec::new(),
      param_regex: None,
      priority: self.priority,
    });

    self.indices = vec![child.prefix[0]];
    self.prefix.truncate(i);
    self.children = vec![child];
  }

  // Keeps static children ordered by descending subtree priority. An
  // insertion sort is enough, trees are small and registration is one-shot.
  fn sort_children(&mut self) {
    for i in 1..self.children.len() {
      let mut j = i;
      while j > 0 && self.children[j - 1].priority < self.children[j].priority {
        self.children.swap(j - 1, j);
        self.indices.swap(j - 1, j);
        j -= 1;
      }
    }
  }

  // Inserts the remaining `path` below this node; the node's own prefix has
  // already been consumed by the caller.
  fn insert(&mut self, path: &[u8], full: &str, value: T, mutable: bool) -> Result<(), InsertError> {
    self.priority += 1;

    if path.is_empty() {
      if self.handler.is_some() && !mutable {
        return Err(InsertError::DuplicateHandler {
          path: full.to_string(),
        });
      }
      self.handler = Some(value);
      return Ok(());
    }

    if path[0] == b'{' {
      return self.insert_wild(path, full, value, mutable);
    }

    let end = pattern::find_wildcard(path).unwrap_or(path.len());
    let first = path[0];

    if let Some(i) = self.indices.iter().position(|&b| b == first) {
      let child = &mut self.children[i];
      let common = longest_common_prefix(&child.prefix, path);
      if common < child.prefix.len() {
        child.split(common);
      }
      let res = child.insert(&path[common..], full, value, mutable);
      self.sort_children();
      return res;
    }

    // no child shares the first byte, attach the literal run as a new child
    let mut child = Box::new(Node::default());
    child.prefix = path[..end].to_vec();
    child.insert(&path[end..], full, value, mutable)?;
    self.indices.push(first);
    self.children.push(child);
    self.sort_children();
    Ok(())
  }

  fn insert_wild(
    &mut self,
    path: &[u8],
    full: &str,
    value: T,
    mutable: bool,
  ) -> Result<(), InsertError> {
    let wild = pattern::parse_wild(path, full)?;

    match wild.kind {
      WildKind::CatchAll => {
        if let Some(catch_all) = &mut self.catch_all {
          if catch_all.key != wild.keys[0] {
            return Err(InsertError::Conflict {
              path: full.to_string(),
              with: format!("{{{}:*}}", catch_all.key),
            });
          }
          if !mutable {
            return Err(InsertError::DuplicateHandler {
              path: full.to_string(),
            });
          }
          catch_all.handler = value;
          return Ok(());
        }

        self.catch_all = Some(CatchAll {
          key: wild.keys.into_iter().next().unwrap_or_default(),
          handler: value,
        });
        Ok(())
      }
      WildKind::Param => {
        let rest = &path[wild.len..];

        // the same wildcard may already be registered; a different one at
        // the same position becomes a sibling tried in registration order
        if let Some(child) = self
          .wild_children
          .iter_mut()
          .find(|c| c.prefix == wild.raw.as_bytes())
        {
          return child.insert(rest, full, value, mutable);
        }

        let mut child = Box::new(Node::default());
        child.kind = NodeKind::Param;
        child.prefix = wild.raw.clone().into_bytes();
        child.param_keys = wild.keys;
        child.param_regex = wild.pattern;
        child.insert(rest, full, value, mutable)?;
        self.wild_children.push(child);
        Ok(())
      }
    }
  }

  // true when a child with the literal prefix "/" can terminate the path
  fn slash_child_has_handler(&self) -> bool {
    self
      .indices
      .iter()
      .position(|&b| b == b'/')
      .map_or(false, |i| {
        let child = &self.children[i];
        child.prefix == b"/" && (child.handler.is_some() || child.catch_all.is_some())
      })
  }

  // Walks the remaining `path`; the node's own prefix has already been
  // consumed for static nodes, while param nodes consume a path segment
  // here. Returns the handler and a TSR (trailing slash redirect) hint.
  fn walk<'t, 'p>(
    &'t self,
    path: &'p [u8],
    params: &mut Params,
    fallback: &mut Option<Fallback<'t, 'p, T>>,
  ) -> (Option<&'t T>, bool) {
    let rest = match self.kind {
      NodeKind::Param => {
        let end = pattern::segment_end(path);
        let segment = &path[..end];
        if segment.is_empty() {
          return (None, false);
        }

        match &self.param_regex {
          Some(re) => {
            let segment = match str::from_utf8(segment) {
              Ok(s) => s,
              Err(_) => return (None, false),
            };
            match re.captures(segment) {
              Some(caps) => {
                for (i, key) in self.param_keys.iter().enumerate() {
                  let value = caps.get(i + 1).map_or("", |m| m.as_str());
                  params.push(Param::new(key, value));
                }
              }
              // a rejected segment is a plain miss; the router never
              // falls back to a static sibling
              None => return (None, false),
            }
          }
          None => {
            let value = str::from_utf8(segment).unwrap_or("");
            params.push(Param::new(&self.param_keys[0], value));
          }
        }

        if end == path.len() {
          if let Some(handler) = &self.handler {
            return (Some(handler), false);
          }
          // a handler for this path plus a trailing slash exists
          return (None, self.slash_child_has_handler());
        }
        &path[end..]
      }
      _ => {
        // the caller only descends once the whole prefix matches
        if path.len() == self.prefix.len() {
          if let Some(handler) = &self.handler {
            return (Some(handler), false);
          }
          // only a catch-all accepts the empty suffix
          if let Some(catch_all) = &self.catch_all {
            params.push(Param::new(&catch_all.key, ""));
            return (Some(&catch_all.handler), false);
          }
          // reached by consuming a trailing '/': the path without it has
          // a wildcard route
          if self.kind != NodeKind::Root && self.prefix == b"/" && !self.wild_children.is_empty()
          {
            return (None, true);
          }
          return (None, self.slash_child_has_handler());
        }
        &path[self.prefix.len()..]
      }
    };

    // remember the deepest catch-all, a failed descent resolves to it
    if let Some(catch_all) = &self.catch_all {
      *fallback = Some(Fallback {
        catch_all,
        remainder: rest,
        captured: params.len(),
      });
    }

    let mut tsr = false;

    // a static child is committed to as soon as its whole prefix matches;
    // otherwise the wildcards get their chance
    if let Some(i) = self.indices.iter().position(|&b| b == rest[0]) {
      let child = &self.children[i];
      if rest.starts_with(&child.prefix) {
        return child.walk(rest, params, fallback);
      }
      // the registered path has exactly one trailing '/' more
      tsr = child.prefix.len() == rest.len() + 1
        && child.prefix[rest.len()] == b'/'
        && child.prefix.starts_with(rest)
        && (child.handler.is_some() || child.catch_all.is_some());
    }

    for wild in &self.wild_children {
      let captured = params.len();
      let (handler, hint) = wild.walk(rest, params, fallback);
      if handler.is_some() {
        return (handler, false);
      }
      params.truncate(captured);
      tsr |= hint;
    }

    tsr |= rest == b"/" && self.handler.is_some();
    (None, tsr)
  }

  // Case-insensitive walk writing the canonical spelling to `canonical`.
  // Parameters are copied through from the request without capture.
  fn walk_insensitive(&self, path: &[u8], canonical: &mut Vec<u8>, fix: bool) -> bool {
    let rest = match self.kind {
      NodeKind::Param => {
        let end = pattern::segment_end(path);
        let segment = &path[..end];
        if segment.is_empty() {
          return false;
        }
        if let Some(re) = &self.param_regex {
          match str::from_utf8(segment) {
            Ok(s) if re.is_match(s) => {}
            _ => return false,
          }
        }
        canonical.extend_from_slice(segment);

        if end == path.len() {
          if self.handler.is_some() {
            return true;
          }
          if fix && self.slash_child_has_handler() {
            canonical.push(b'/');
            return true;
          }
          return false;
        }
        &path[end..]
      }
      _ => {
        if path.len() < self.prefix.len()
          || !path[..self.prefix.len()].eq_ignore_ascii_case(&self.prefix)
        {
          // the canonical path has exactly one trailing '/' more
          if fix
            && self.prefix.len() == path.len() + 1
            && self.prefix[path.len()] == b'/'
            && path.eq_ignore_ascii_case(&self.prefix[..path.len()])
            && (self.handler.is_some() || self.catch_all.is_some())
          {
            canonical.extend_from_slice(&self.prefix);
            return true;
          }
          return false;
        }

        canonical.extend_from_slice(&self.prefix);

        if path.len() == self.prefix.len() {
          if self.handler.is_some() || self.catch_all.is_some() {
            return true;
          }
          if fix && self.slash_child_has_handler() {
            canonical.push(b'/');
            return true;
          }
          return false;
        }
        &path[self.prefix.len()..]
      }
    };

    // both the lowercase and the uppercase spelling may exist as children,
    // try every candidate and roll the buffer back in between
    let fold = rest[0].to_ascii_lowercase();
    for (i, &index) in self.indices.iter().enumerate() {
      if index.to_ascii_lowercase() == fold {
        let len = canonical.len();
        if self.children[i].walk_insensitive(rest, canonical, fix) {
          return true;
        }
        canonical.truncate(len);
      }
    }

    for wild in &self.wild_children {
      let len = canonical.len();
      if wild.walk_insensitive(rest, canonical, fix) {
        return true;
      }
      canonical.truncate(len);
    }

    if self.catch_all.is_some() {
      canonical.extend_from_slice(rest);
      return true;
    }

    fix && rest == b"/" && self.handler.is_some()
  }

  #[cfg(test)]
  fn check_priorities(&self) -> u32 {
    let mut priority = 0;
    for child in self.children.iter().chain(self.wild_children.iter()) {
      priority += child.check_priorities();
    }
    if self.handler.is_some() {
      priority += 1;
    }
    if self.catch_all.is_some() {
      priority += 1;
    }

    assert_eq!(
      self.priority,
      priority,
      "priority mismatch for node '{}'",
      String::from_utf8_lossy(&self.prefix)
    );
    priority
  }
}

/// A per-method routes storage: a compressed prefix tree mapping paths to
/// handlers.
///
/// ```rust
/// # fn main() -> Result<(), radixmux::InsertError> {
/// let mut tree = radixmux::Tree::new();
/// tree.add("/home", "Welcome!")?;
/// tree.add("/users/{id}", "A User")?;
///
/// let (handler, params, _) = tree.get("/users/7");
/// assert_eq!(handler, Some(&"A User"));
/// assert_eq!(params.by_name("id"), Some("7"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Tree<T> {
  root: Node<T>,
  /// If enabled, adding a route that already exists replaces its handler
  /// instead of failing.
  pub mutable: bool,
}

impl<T> Default for Tree<T> {
  fn default() -> Self {
    Tree::new()
  }
}

impl<T> Tree<T> {
  /// Returns an empty routes storage.
  pub fn new() -> Tree<T> {
    let mut root = Node::default();
    root.kind = NodeKind::Root;
    Tree {
      root,
      mutable: false,
    }
  }

  /// Registers a handler for the given path.
  ///
  /// The path must begin with `/` and may contain `{name}`, `{name:REGEX}`
  /// and terminal `{name:*}` segments. Optional parameters must be expanded
  /// before insertion, the way [`Router`](crate::Router) does it.
  ///
  /// Not concurrency-safe.
  pub fn add(&mut self, path: &str, value: T) -> Result<(), InsertError> {
    if path.is_empty() || !path.starts_with('/') {
      return Err(InsertError::BadPrefix {
        path: path.to_string(),
      });
    }
    pattern::validate(path)?;

    self.root.insert(path.as_bytes(), path, value, self.mutable)
  }

  /// Returns the handler registered for the given path together with the
  /// captured parameters. When no handler is found, the boolean is a TSR
  /// (trailing slash redirect) recommendation: a handler exists for the
  /// path with the opposite trailing slash.
  pub fn get<'t>(&'t self, path: &str) -> (Option<&'t T>, Params, bool) {
    let mut params = Params::default();
    let mut fallback = None;

    let (handler, tsr) = self.root.walk(path.as_bytes(), &mut params, &mut fallback);
    if handler.is_some() {
      return (handler, params, false);
    }

    // the deepest catch-all passed on the way down swallows the remainder
    if let Some(fb) = fallback {
      params.truncate(fb.captured);
      params.push(Param::new(
        &fb.catch_all.key,
        str::from_utf8(fb.remainder).unwrap_or(""),
      ));
      return (Some(&fb.catch_all.handler), params, false);
    }

    // "/" can never be fixed by flipping a trailing slash
    (None, params, tsr && path != "/")
  }

  /// Makes a case-insensitive lookup of the given path and returns the
  /// case-corrected, registered spelling on success. With
  /// `fix_trailing_slash` a missing or superfluous trailing `/` is repaired
  /// as well. Parameters keep the request spelling; no capture is
  /// performed.
  pub fn find_case_insensitive(&self, path: &str, fix_trailing_slash: bool) -> Option<String> {
    let mut canonical = Vec::with_capacity(path.len() + 1);
    if self
      .root
      .walk_insensitive(path.as_bytes(), &mut canonical, fix_trailing_slash)
    {
      String::from_utf8(canonical).ok()
    } else {
      None
    }
  }
}
