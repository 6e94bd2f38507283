use std::ops::Index;

/// A single URL parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
  pub key: String,
  pub value: String,
}

impl Param {
  pub fn new(key: &str, value: &str) -> Param {
    Param {
      key: key.to_string(),
      value: value.to_string(),
    }
  }
}

/// The ordered list of parameters captured by a route match, as attached to
/// the request by the router.
///
/// The list is ordered, the first URL parameter is also the first entry, so
/// it is safe to read values by index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params(pub Vec<Param>);

impl Params {
  /// Returns the value of the first parameter whose key matches the given
  /// name.
  pub fn by_name(&self, name: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|param| param.key == name)
      .map(|param| param.value.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// Iterates over the captured `(key, value)` pairs in capture order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|p| (p.key.as_str(), p.value.as_str()))
  }

  pub(crate) fn push(&mut self, p: Param) {
    self.0.push(p);
  }

  pub(crate) fn truncate(&mut self, len: usize) {
    self.0.truncate(len);
  }
}

impl Index<usize> for Params {
  type Output = str;

  fn index(&self, i: usize) -> &Self::Output {
    &self.0[i].value
  }
}
