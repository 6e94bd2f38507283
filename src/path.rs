/// Returns the canonical URL version of the given path, eliminating `.` and
/// `..` elements.
///
/// The following rules are applied iteratively until no further processing
/// can be done:
///
/// 1. Replace multiple slashes with a single slash.
/// 2. Eliminate each `.` path name element (the current directory).
/// 3. Eliminate each inner `..` path name element (the parent directory)
///    along with the non-`..` element that precedes it.
/// 4. Eliminate `..` elements that begin a rooted path: that is, replace
///    `/..` by `/` at the beginning of a path.
///
/// A trailing slash is preserved; the empty string becomes `/`. The result
/// never escapes above the root.
pub fn clean_path(p: &str) -> String {
  if p.is_empty() {
    return "/".to_string();
  }

  let src = p.as_bytes();
  let n = src.len();
  let mut out: Vec<u8> = Vec::with_capacity(n + 1);
  out.push(b'/');

  let mut trailing = n > 1 && src[n - 1] == b'/';
  let mut r = usize::from(src[0] == b'/');

  while r < n {
    if src[r] == b'/' {
      // empty element, the trailing slash is re-appended at the end
      r += 1;
      continue;
    }

    let start = r;
    while r < n && src[r] != b'/' {
      r += 1;
    }

    match &src[start..r] {
      b"." => {
        if r == n {
          trailing = true;
        }
      }
      b".." => {
        // drop the previous element, never above the root
        while out.len() > 1 && out[out.len() - 1] != b'/' {
          out.pop();
        }
        if out.len() > 1 {
          out.pop();
        }
      }
      element => {
        if out.len() > 1 {
          out.push(b'/');
        }
        out.extend_from_slice(element);
      }
    }
  }

  if trailing && out.len() > 1 {
    out.push(b'/');
  }

  // elements are copied whole from the input, the result stays valid utf-8
  String::from_utf8(out).unwrap()
}

#[cfg(test)]
mod tests {
  use super::*;

  // (path, result)
  fn clean_tests() -> Vec<(&'static str, &'static str)> {
    vec![
      // Already clean
      ("/", "/"),
      ("/abc", "/abc"),
      ("/a/b/c", "/a/b/c"),
      ("/abc/", "/abc/"),
      ("/a/b/c/", "/a/b/c/"),
      // missing root
      ("", "/"),
      ("a/", "/a/"),
      ("abc", "/abc"),
      ("abc/def", "/abc/def"),
      ("a/b/c", "/a/b/c"),
      // Remove doubled slash
      ("//", "/"),
      ("/abc//", "/abc/"),
      ("/abc/def//", "/abc/def/"),
      ("/a/b/c//", "/a/b/c/"),
      ("/abc//def//ghi", "/abc/def/ghi"),
      ("//abc", "/abc"),
      ("///abc", "/abc"),
      ("//abc//", "/abc/"),
      // Remove . elements
      (".", "/"),
      ("./", "/"),
      ("/abc/./def", "/abc/def"),
      ("/./abc/def", "/abc/def"),
      ("/abc/.", "/abc/"),
      // Remove .. elements
      ("..", "/"),
      ("../", "/"),
      ("../../", "/"),
      ("../..", "/"),
      ("../../abc", "/abc"),
      ("/abc/def/ghi/../jkl", "/abc/def/jkl"),
      ("/abc/def/../ghi/../jkl", "/abc/jkl"),
      ("/abc/def/..", "/abc"),
      ("/abc/def/../..", "/"),
      ("/abc/def/../../..", "/"),
      ("/abc/def/../../../ghi/jkl/../../../mno", "/mno"),
      // Combinations
      ("abc/./../def", "/def"),
      ("abc//./../def", "/def"),
      ("abc/../../././../def", "/def"),
    ]
  }

  #[test]
  fn clean() {
    for (path, want) in clean_tests() {
      assert_eq!(clean_path(path), want, "clean_path({:?})", path);
      // cleaning is idempotent
      assert_eq!(clean_path(want), want, "clean_path({:?})", want);
    }
  }

  #[test]
  fn clean_long() {
    for i in 1..1234 {
      let element = "a".repeat(i);
      let want = format!("/{}", element);

      assert_eq!(clean_path(&want), want);
      assert_eq!(clean_path(&element), want);
      assert_eq!(clean_path(&format!("//{}", element)), want);
      assert_eq!(clean_path(&format!("//{}/b/..", element)), want);
    }
  }
}
