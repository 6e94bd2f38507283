use crate::error::InsertError;

use regex::Regex;
use std::str;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WildKind {
  Param,
  CatchAll,
}

/// The wildcard portion of a path segment, parsed from the first `{` up to
/// the end of the segment.
///
/// A segment that mixes literal text with one or more `{...}` tokens is
/// compiled into a single anchored regex with one capture group per token;
/// a lone `{name}` stays regex-free and is matched by scanning to the next
/// `/` instead.
pub(crate) struct WildSpan {
  /// The raw span text, e.g. `{version:V[0-9]}_{name:[a-z]+}_sufix`.
  pub raw: String,
  /// Parameter names, in capture order.
  pub keys: Vec<String>,
  pub kind: WildKind,
  /// Compiled segment regex, when the span is regex-constrained or mixes
  /// literals with tokens.
  pub pattern: Option<Regex>,
  /// Bytes consumed from the pattern.
  pub len: usize,
}

/// A single `{...}` token.
struct Token {
  name: String,
  re: Option<String>,
  optional: bool,
  /// Index just past the closing `}`.
  end: usize,
}

fn invalid(path: &str, detail: impl Into<String>) -> InsertError {
  InsertError::InvalidPattern {
    path: path.to_string(),
    detail: detail.into(),
  }
}

/// Returns the index of the next `/`, or the length of `path`.
pub(crate) fn segment_end(path: &[u8]) -> usize {
  path
    .iter()
    .position(|&b| b == b'/')
    .unwrap_or_else(|| path.len())
}

/// Returns the index of the first wildcard token in `path`.
pub(crate) fn find_wildcard(path: &[u8]) -> Option<usize> {
  path.iter().position(|&b| b == b'{')
}

fn parse_token(path: &[u8], start: usize, full: &str) -> Result<Token, InsertError> {
  let mut depth = 1;
  let mut colon = None;
  let mut i = start + 1;

  while i < path.len() {
    match path[i] {
      b'{' => depth += 1,
      b'}' => {
        depth -= 1;
        if depth == 0 {
          let name_end = colon.unwrap_or(i);
          let mut name = &path[start + 1..name_end];
          let re = colon.map(|c| {
            str::from_utf8(&path[c + 1..i])
              .expect("pattern is valid utf-8")
              .to_string()
          });

          let mut optional = false;
          if let [rest @ .., b'?'] = name {
            optional = true;
            name = rest;
          }

          if name.is_empty() {
            return Err(invalid(full, "parameters must have a non-empty name"));
          }
          if !name
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'-')
          {
            return Err(invalid(
              full,
              format!(
                "invalid parameter name '{}'",
                String::from_utf8_lossy(name)
              ),
            ));
          }
          if re.as_deref() == Some("") {
            return Err(invalid(full, "parameters must not have an empty expression"));
          }

          return Ok(Token {
            name: String::from_utf8_lossy(name).into_owned(),
            re,
            optional,
            end: i + 1,
          });
        }
      }
      b':' if depth == 1 && colon.is_none() => colon = Some(i),
      b'/' => return Err(invalid(full, "parameters must not contain '/'")),
      _ => {}
    }
    i += 1;
  }

  Err(invalid(full, "unbalanced brace"))
}

/// Parses the wildcard span starting at `path[0]` (which must be `{`).
pub(crate) fn parse_wild(path: &[u8], full: &str) -> Result<WildSpan, InsertError> {
  let end = segment_end(path);

  let mut keys = Vec::new();
  let mut source = String::from("^");
  let mut tokens = 0;
  let mut mixed = false;
  let mut constrained = false;
  let mut i = 0;

  while i < end {
    if path[i] == b'{' {
      let token = parse_token(path, i, full)?;
      if token.optional {
        return Err(invalid(
          full,
          "optional parameters must be expanded before insertion",
        ));
      }

      if token.re.as_deref() == Some("*") {
        if tokens > 0 || i > 0 {
          return Err(invalid(
            full,
            "catch-all parameters must be the only wildcard in a segment",
          ));
        }
        if token.end < path.len() {
          return Err(invalid(
            full,
            "catch-all parameters are only allowed at the end of the path",
          ));
        }

        let raw = str::from_utf8(&path[..token.end])
          .expect("pattern is valid utf-8")
          .to_string();
        return Ok(WildSpan {
          raw,
          keys: vec![token.name],
          kind: WildKind::CatchAll,
          pattern: None,
          len: token.end,
        });
      }

      constrained |= token.re.is_some();
      source.push('(');
      source.push_str(token.re.as_deref().unwrap_or("[^/]+"));
      source.push(')');
      keys.push(token.name);
      tokens += 1;
      i = token.end;
    } else if path[i] == b'}' {
      return Err(invalid(full, "unbalanced brace"));
    } else {
      let run = path[i..end]
        .iter()
        .position(|&b| b == b'{' || b == b'}')
        .map_or(end, |p| i + p);
      let literal = str::from_utf8(&path[i..run]).expect("pattern is valid utf-8");
      source.push_str(&regex::escape(literal));
      mixed = true;
      i = run;
    }
  }

  let raw = str::from_utf8(&path[..end])
    .expect("pattern is valid utf-8")
    .to_string();

  // a lone {name} is matched by scanning to the next '/', everything else
  // needs the compiled segment regex
  let pattern = if tokens == 1 && !mixed && !constrained {
    None
  } else {
    source.push('$');
    let re = Regex::new(&source).map_err(|e| invalid(full, e.to_string()))?;
    Some(re)
  };

  Ok(WildSpan {
    raw,
    keys,
    kind: WildKind::Param,
    pattern,
    len: end,
  })
}

/// Validates the shape of a full (already expanded) pattern: balanced
/// braces, well-formed parameter names, unique names, wildcards in one
/// segment separated by literal text, catch-all terminal and starting its
/// own segment.
pub(crate) fn validate(path: &str) -> Result<(), InsertError> {
  let bytes = path.as_bytes();
  let mut seen: Vec<String> = Vec::new();
  let mut last_end = None;
  let mut i = 0;

  while i < bytes.len() {
    match bytes[i] {
      b'{' => {
        // back-to-back wildcards have no defined split point
        if last_end == Some(i) {
          return Err(invalid(
            path,
            "wildcards in the same segment must be separated by literal text",
          ));
        }

        let token = parse_token(bytes, i, path)?;
        if seen.contains(&token.name) {
          return Err(invalid(
            path,
            format!("duplicate parameter name '{}'", token.name),
          ));
        }
        if token.re.as_deref() == Some("*") {
          if token.end != bytes.len() {
            return Err(invalid(
              path,
              "catch-all parameters are only allowed at the end of the path",
            ));
          }
          if i > 0 && bytes[i - 1] != b'/' {
            return Err(invalid(path, "no '/' before catch-all"));
          }
        }
        seen.push(token.name);
        last_end = Some(token.end);
        i = token.end;
      }
      b'}' => return Err(invalid(path, "unbalanced brace")),
      _ => i += 1,
    }
  }

  Ok(())
}

/// Expands a pattern containing optional parameters into the list of
/// non-optional patterns to register, in order of increasing length.
///
/// `/v1/users/{name}/{surname?}` expands to `/v1/users/{name}` and
/// `/v1/users/{name}/{surname}`; each further optional extends the chain.
/// Returns an empty list when the pattern has no optional parameters.
pub(crate) fn optional_paths(path: &str) -> Result<Vec<String>, InsertError> {
  if !path.contains('?') {
    return Ok(Vec::new());
  }

  struct Segment {
    /// The segment with every `?` marker stripped.
    included: String,
    /// The segment with its optional tokens removed, when literal text or
    /// non-optional tokens remain.
    excluded: Option<String>,
    optional: bool,
  }

  let mut segments: Vec<Segment> = Vec::new();

  for seg in path.split('/').skip(1) {
    let bytes = seg.as_bytes();
    let mut included = String::new();
    let mut excluded = String::new();
    let mut optional = false;
    let mut i = 0;

    while i < bytes.len() {
      match bytes[i] {
        b'{' => {
          let token = parse_token(bytes, i, path)?;
          if token.optional {
            optional = true;
            included.push('{');
            included.push_str(&token.name);
            if let Some(re) = &token.re {
              included.push(':');
              included.push_str(re);
            }
            included.push('}');
          } else {
            included.push_str(&seg[i..token.end]);
            excluded.push_str(&seg[i..token.end]);
          }
          i = token.end;
        }
        b'}' => return Err(invalid(path, "unbalanced brace")),
        _ => {
          let run = bytes[i..]
            .iter()
            .position(|&b| b == b'{' || b == b'}')
            .map_or(bytes.len(), |p| i + p);
          included.push_str(&seg[i..run]);
          excluded.push_str(&seg[i..run]);
          i = run;
        }
      }
    }

    let excluded = if optional && !excluded.is_empty() {
      Some(excluded)
    } else {
      None
    };
    segments.push(Segment {
      included,
      excluded,
      optional,
    });
  }

  let count = segments.iter().filter(|s| s.optional).count();
  if count == 0 {
    return Ok(Vec::new());
  }

  // progressive chain: variant i keeps the first i optional parameters
  let mut paths = Vec::with_capacity(count + 1);
  for take in 0..=count {
    let mut variant = String::new();
    let mut taken = 0;

    for segment in &segments {
      if segment.optional {
        taken += 1;
        if taken > take {
          if let Some(rest) = &segment.excluded {
            variant.push('/');
            variant.push_str(rest);
          }
          continue;
        }
      }
      variant.push('/');
      variant.push_str(&segment.included);
    }

    if variant.is_empty() {
      variant.push('/');
    }
    if !paths.contains(&variant) {
      paths.push(variant);
    }
  }

  Ok(paths)
}
