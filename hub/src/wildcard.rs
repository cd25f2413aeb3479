//! Glob-style wildcard patterns compiled to anchored matchers.
//!
//! Supported syntax:
//!
//! - `*` matches any run of characters (including none).
//! - `?` matches exactly one character.
//! - `[abc]`, `[a-z]` match one character of a class; `[!abc]` negates it.
//! - With escaping enabled (the default), `\*`, `\?` and `\\` match the
//!   literal character. Any other backslash is itself literal.
//!
//! In file-path mode `*` and `?` never cross a `/` or `\` separator, and a
//! lone `*` is no longer a match-all shortcut.

use crate::error::PatternError;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

/// Options controlling how a pattern is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchOptions {
  /// Treat `\*`, `\?` and `\\` as escaped literals.
  pub escape: bool,
  pub case_sensitive: bool,
  /// Keep `*` and `?` from matching path separators.
  pub file_path: bool,
}

impl Default for MatchOptions {
  fn default() -> Self {
    Self {
      escape: true,
      case_sensitive: true,
      file_path: false,
    }
  }
}

impl MatchOptions {
  pub fn escape(mut self, escape: bool) -> Self {
    self.escape = escape;
    self
  }

  pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
    self.case_sensitive = case_sensitive;
    self
  }

  pub fn file_path(mut self, file_path: bool) -> Self {
    self.file_path = file_path;
    self
  }
}

#[derive(Debug, Clone)]
enum Matcher {
  Any,
  Regex(Regex),
}

/// A compiled wildcard pattern.
///
/// Compilation validates the pattern once; [`is_match`](Wildcard::is_match)
/// is then a pure test that never fails.
#[derive(Debug, Clone)]
pub struct Wildcard {
  pattern: String,
  matcher: Matcher,
}

impl Wildcard {
  /// Compiles `pattern` with the default [`MatchOptions`].
  pub fn new(pattern: &str) -> Result<Self, PatternError> {
    Self::with_options(pattern, MatchOptions::default())
  }

  pub fn with_options(pattern: &str, options: MatchOptions) -> Result<Self, PatternError> {
    if pattern == "*" && !options.file_path {
      return Ok(Self {
        pattern: pattern.to_owned(),
        matcher: Matcher::Any,
      });
    }

    let source = translate(pattern, &options)?;
    let regex = RegexBuilder::new(&source)
      .case_insensitive(!options.case_sensitive)
      .dot_matches_new_line(true)
      .build()
      .map_err(|e| PatternError::Regex {
        pattern: pattern.to_owned(),
        reason: e.to_string(),
      })?;

    Ok(Self {
      pattern: pattern.to_owned(),
      matcher: Matcher::Regex(regex),
    })
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  pub fn is_match(&self, text: &str) -> bool {
    match &self.matcher {
      Matcher::Any => true,
      Matcher::Regex(regex) => regex.is_match(text),
    }
  }
}

/// One-shot match with default options.
///
/// ```
/// use fibre_hub::match_wildcard;
///
/// assert!(match_wildcard("a*c", "abc").unwrap());
/// assert!(!match_wildcard("a?c", "ac").unwrap());
/// ```
pub fn match_wildcard(pattern: &str, text: &str) -> Result<bool, PatternError> {
  match_wildcard_with(pattern, text, MatchOptions::default())
}

pub fn match_wildcard_with(
  pattern: &str,
  text: &str,
  options: MatchOptions,
) -> Result<bool, PatternError> {
  Wildcard::with_options(pattern, options).map(|w| w.is_match(text))
}

/// Returns true if `text` would be treated as a pattern by the event registry.
pub(crate) fn is_pattern(text: &str) -> bool {
  text.contains('*')
}

fn translate(pattern: &str, options: &MatchOptions) -> Result<String, PatternError> {
  let (any_run, any_one) = if options.file_path {
    (r"[^/\\]*", r"[^/\\]")
  } else {
    (".*", ".")
  };

  let chars: Vec<char> = pattern.chars().collect();
  let mut out = String::with_capacity(pattern.len() + 8);
  out.push('^');

  let mut i = 0;
  while i < chars.len() {
    let c = chars[i];
    match c {
      '\\' if options.escape && matches!(chars.get(i + 1), Some('\\' | '*' | '?')) => {
        push_literal(&mut out, chars[i + 1]);
        i += 2;
        continue;
      }
      '*' => out.push_str(any_run),
      '?' => out.push_str(any_one),
      '[' => {
        i = translate_class(&chars, i, pattern, &mut out)?;
        continue;
      }
      _ => push_literal(&mut out, c),
    }
    i += 1;
  }

  out.push('$');
  Ok(out)
}

// Translates the class starting at `chars[start] == '['` and returns the index
// just past its closing bracket. A `]` right after `[` or `[!` is a member.
fn translate_class(
  chars: &[char],
  start: usize,
  pattern: &str,
  out: &mut String,
) -> Result<usize, PatternError> {
  let mut i = start + 1;
  let negated = chars.get(i) == Some(&'!');
  if negated {
    i += 1;
  }

  let body_start = i;
  if chars.get(i) == Some(&']') {
    i += 1;
  }
  while i < chars.len() && chars[i] != ']' {
    i += 1;
  }
  if i >= chars.len() {
    return Err(PatternError::UnterminatedClass(pattern.to_owned()));
  }
  let body = &chars[body_start..i];

  out.push('[');
  if negated {
    out.push('^');
  }
  let mut j = 0;
  while j < body.len() {
    push_class_char(out, body[j]);
    if body.get(j + 1) == Some(&'-') && j + 2 < body.len() {
      out.push('-');
      push_class_char(out, body[j + 2]);
      j += 3;
    } else {
      j += 1;
    }
  }
  out.push(']');

  Ok(i + 1)
}

// Class members are emitted as code points so no character is read as class
// syntax (`-`, `&&`, `--`, `~~`, nested `[`).
fn push_class_char(out: &mut String, c: char) {
  out.push_str(&format!("\\x{{{:X}}}", c as u32));
}

fn push_literal(out: &mut String, c: char) {
  let mut buf = [0u8; 4];
  out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}
